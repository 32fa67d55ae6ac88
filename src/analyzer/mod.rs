pub mod encoder;
pub mod gemini;
pub mod types;

pub use defect_detective_common::{AnalysisResult, DefectRecord, ParsedAnalysis};
pub use encoder::{encode_image, mime_type_for_path, EncodedImage};
pub use gemini::GeminiClient;

use crate::error::Result;
use crate::store::AnalysisStore;
use chrono::Utc;
use defect_detective_common::parse_model_reply;
use std::sync::Arc;

/// 解析対象のアップロード
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// エンコード → Gemini呼び出し → パース → 保存
pub struct AnalysisPipeline {
    client: GeminiClient,
    store: Arc<AnalysisStore>,
}

impl AnalysisPipeline {
    pub fn new(client: GeminiClient, store: Arc<AnalysisStore>) -> Self {
        Self { client, store }
    }

    pub fn store(&self) -> &Arc<AnalysisStore> {
        &self.store
    }

    /// 解析のみ（保存しない）
    pub async fn analyze(&self, upload: Upload) -> Result<AnalysisResult> {
        let image = encode_image(&upload.bytes, upload.content_type.as_deref())?;

        tracing::info!(
            filename = %upload.filename,
            mime_type = %image.mime_type,
            bytes = upload.bytes.len(),
            "analyzing image"
        );

        let reply = self.client.generate(&image).await?;
        let parsed = interpret_reply(&reply);

        Ok(AnalysisResult::from_parsed(
            uuid::Uuid::new_v4().to_string(),
            upload.filename,
            Utc::now(),
            parsed,
            Some(image.data),
        ))
    }

    /// 解析して保存
    pub async fn run(&self, upload: Upload) -> Result<AnalysisResult> {
        let result = self.analyze(upload).await?;
        let result = self
            .with_store(move |store| store.save(&result).map(|_| result))
            .await?;

        tracing::info!(
            id = %result.id,
            total_defects = result.total_defects,
            "analysis stored"
        );

        Ok(result)
    }

    /// 新しい順に最大 `limit` 件
    pub async fn history(&self, limit: usize) -> Result<Vec<AnalysisResult>> {
        self.with_store(move |store| store.list_recent(limit)).await
    }

    pub async fn find(&self, id: String) -> Result<AnalysisResult> {
        self.with_store(move |store| store.get_by_id(&id)).await
    }

    /// SQLite呼び出しはブロッキングスレッドで実行する
    async fn with_store<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&AnalysisStore) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(&store)).await?
    }
}

/// モデル応答を解釈する。パースできない場合はセンチネルに置き換える
pub fn interpret_reply(reply: &str) -> ParsedAnalysis {
    match parse_model_reply(reply) {
        Ok(parsed) => parsed,
        Err(e) => {
            tracing::warn!(error = %e, "model reply could not be parsed, using sentinel record");
            ParsedAnalysis::analysis_error()
        }
    }
}
