//! Gemini API連携モジュール
//!
//! 1回の generateContent 呼び出しで画像を解析し、応答テキストを返す。
//! リトライはしない。

use super::encoder::EncodedImage;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
};
use crate::config::Config;
use crate::error::{DefectError, Result};
use defect_detective_common::{build_prompt, SYSTEM_INSTRUCTION, USER_INSTRUCTION};
use reqwest::StatusCode;
use std::time::Duration;

/// 漏洩キーとしてブロックされた場合の応答に含まれる文言
const LEAKED_KEY_MARKER: &str = "reported as leaked";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
    max_output_tokens: u32,
}

impl GeminiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| DefectError::Config(format!("HTTPクライアントを構築できません: {}", e)))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            endpoint: format!("{}/models/{}:generateContent", config.api_base, config.model),
            max_output_tokens: config.max_output_tokens,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// プロンプト（テキスト）と画像の2パートからなるリクエストを構築
    pub fn build_request(&self, image: &EncodedImage) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![
                    Part::Text {
                        text: build_prompt(SYSTEM_INSTRUCTION, USER_INSTRUCTION),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.data.clone(),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: self.max_output_tokens,
            },
        }
    }

    /// 画像を送信して応答テキストを取得
    ///
    /// APIキーが未設定の場合は通信前に `MissingApiKey` を返す
    pub async fn generate(&self, image: &EncodedImage) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or(DefectError::MissingApiKey)?;
        let request = self.build_request(image);

        tracing::debug!(endpoint = %self.endpoint, mime_type = %image.mime_type, "calling Gemini");

        // URLにキーが含まれるため、エラーメッセージからは除く
        let response = self
            .http
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| DefectError::UpstreamUnreachable(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DefectError::UpstreamUnreachable(e.without_url().to_string()))?;

        tracing::debug!(status = status.as_u16(), bytes = body.len(), "Gemini responded");

        interpret_response(status, &body)
    }
}

/// ステータスと本文から応答テキストまたはエラーを決める
pub fn interpret_response(status: StatusCode, body: &str) -> Result<String> {
    if status == StatusCode::FORBIDDEN && body.contains(LEAKED_KEY_MARKER) {
        return Err(DefectError::CredentialRevoked);
    }

    if !status.is_success() {
        return Err(DefectError::Upstream {
            status: status.as_u16(),
            body: body.to_string(),
        });
    }

    let value: serde_json::Value = serde_json::from_str(body).map_err(|_| DefectError::Upstream {
        status: status.as_u16(),
        body: body.to_string(),
    })?;

    let text = serde_json::from_value::<GenerateContentResponse>(value.clone())
        .ok()
        .and_then(|r| r.first_candidate_text());

    match text {
        Some(text) => Ok(text),
        // 想定外の形はエラーにせずJSONのまま返す
        None => Ok(serde_json::to_string(&value)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> GeminiClient {
        let config = Config::from_lookup(|key| match key {
            "GEMINI_API_KEY" => Some("test-key".to_string()),
            "GEMINI_MAX_OUTPUT_TOKENS" => Some("256".to_string()),
            _ => None,
        })
        .unwrap();
        GeminiClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            test_client().endpoint(),
            "https://generativelanguage.googleapis.com/v1/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_build_request() {
        let image = EncodedImage {
            mime_type: "image/jpeg".to_string(),
            data: "/9j/4AAQ".to_string(),
        };
        let json = serde_json::to_value(test_client().build_request(&image)).unwrap();
        let parts = &json["contents"][0]["parts"];
        assert!(parts[0]["text"]
            .as_str()
            .unwrap()
            .ends_with("Return JSON response only."));
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(json["generationConfig"]["maxOutputTokens"], 256);
    }

    #[test]
    fn test_leaked_key() {
        let body = r#"{"error": {"code": 403, "message": "Your API key was reported as leaked. Please use another API key."}}"#;
        let err = interpret_response(StatusCode::FORBIDDEN, body).unwrap_err();
        assert!(matches!(err, DefectError::CredentialRevoked));
        assert!(err.to_string().contains("generate a new API key"));
    }

    #[test]
    fn test_forbidden_without_marker_is_upstream() {
        let err = interpret_response(StatusCode::FORBIDDEN, "permission denied").unwrap_err();
        assert!(matches!(err, DefectError::Upstream { status: 403, .. }));
    }

    #[test]
    fn test_server_error() {
        let err = interpret_response(StatusCode::SERVICE_UNAVAILABLE, "overloaded").unwrap_err();
        match err {
            DefectError::Upstream { status, body } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_success_text() {
        let body = r#"{"candidates": [{"content": {"parts": [{"text": "{\"total_defects\": 0}"}]}}]}"#;
        assert_eq!(
            interpret_response(StatusCode::OK, body).unwrap(),
            r#"{"total_defects": 0}"#
        );
    }

    #[test]
    fn test_unexpected_shape_falls_back_to_json() {
        let body = r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#;
        let text = interpret_response(StatusCode::OK, body).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["promptFeedback"]["blockReason"], "SAFETY");
    }

    #[test]
    fn test_candidates_wrong_type_falls_back_to_json() {
        let text = interpret_response(StatusCode::OK, r#"{"candidates": "none"}"#).unwrap();
        assert_eq!(text, r#"{"candidates":"none"}"#);
    }

    #[test]
    fn test_non_json_success_body() {
        let err = interpret_response(StatusCode::OK, "<html>").unwrap_err();
        assert!(matches!(err, DefectError::Upstream { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_missing_api_key_checked_first() {
        let config = Config::from_lookup(|key| match key {
            // 接続できないアドレス: キー確認が先なら通信は発生しない
            "GEMINI_API_BASE" => Some("http://127.0.0.1:9".to_string()),
            _ => None,
        })
        .unwrap();
        let client = GeminiClient::new(&config).unwrap();
        let image = EncodedImage {
            mime_type: "image/png".to_string(),
            data: String::new(),
        };
        assert!(matches!(
            client.generate(&image).await,
            Err(DefectError::MissingApiKey)
        ));
    }
}
