//! 解析結果の型定義
//!
//! サーバーとCLIで共有される型:
//! - DefectRecord: モデルが報告した欠陥1件
//! - ParsedAnalysis: モデル応答のパース結果
//! - AnalysisResult: 永続化・返却される最終結果

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// 欠陥1件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectRecord {
    pub defect_type: String,

    /// 0〜100
    #[serde(deserialize_with = "lenient_f64")]
    pub confidence: f64,

    /// "Low" | "Medium" | "High" | "Unknown"（値は検証しない）
    pub severity: String,

    pub description: String,
}

/// モデル応答のパース結果
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAnalysis {
    pub defects_found: Vec<DefectRecord>,
    /// モデル自身の件数。defects_found.len() と一致するとは限らない
    pub total_defects: u32,
}

impl ParsedAnalysis {
    /// パース不能時に使うセンチネル
    pub fn analysis_error() -> Self {
        Self {
            defects_found: vec![DefectRecord {
                defect_type: "Analysis Error".to_string(),
                confidence: 50.0,
                severity: "Unknown".to_string(),
                description: "Could not parse AI response properly".to_string(),
            }],
            total_defects: 1,
        }
    }
}

/// 解析結果（1アップロードにつき1件）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub id: String,

    pub filename: String,

    #[serde(with = "upload_time")]
    pub upload_time: DateTime<Utc>,

    pub total_defects: u32,

    #[serde(default)]
    pub defects_found: Vec<DefectRecord>,

    #[serde(default = "default_true")]
    pub analysis_complete: bool,

    /// Base64エンコード済み画像（旧フィールド名 image_base64 も受け付ける）
    #[serde(default, alias = "image_base64")]
    pub image_encoded: Option<String>,
}

impl AnalysisResult {
    pub fn from_parsed(
        id: String,
        filename: String,
        upload_time: DateTime<Utc>,
        parsed: ParsedAnalysis,
        image_encoded: Option<String>,
    ) -> Self {
        Self {
            id,
            filename,
            upload_time,
            total_defects: parsed.total_defects,
            defects_found: parsed.defects_found,
            analysis_complete: true,
            image_encoded,
        }
    }
}

fn default_true() -> bool {
    true
}

/// 数値または数値文字列を f64 として受け付ける
fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = serde_json::Value::deserialize(deserializer)?;
    if let Some(n) = value.as_f64() {
        return Ok(n);
    }
    if let Some(s) = value.as_str() {
        return s
            .trim()
            .trim_end_matches('%')
            .parse::<f64>()
            .map_err(|_| D::Error::custom(format!("invalid number: {}", s)));
    }
    Err(D::Error::custom(format!("expected number, got {}", value)))
}

/// upload_time のシリアライズ形式
///
/// 書き込みは常に RFC 3339 UTC（マイクロ秒固定）で、文字列比較が時系列順と一致する。
/// 読み込みは以下を受け付ける:
/// - RFC 3339 文字列
/// - オフセットなしの ISO-8601 文字列（UTCとみなす）
/// - エポックミリ秒の整数
/// - `{"$date": ...}` 形式
pub mod upload_time {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};
    use serde_json::Value;

    use crate::error::{Error, Result};

    pub fn format(ts: &DateTime<Utc>) -> String {
        ts.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    pub fn parse_value(value: &Value) -> Result<DateTime<Utc>> {
        match value {
            Value::String(s) => parse_str(s),
            Value::Number(n) => n
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .ok_or_else(|| Error::Timestamp(format!("invalid epoch millis: {}", n))),
            Value::Object(map) => {
                if let Some(inner) = map.get("$date") {
                    return parse_value(inner);
                }
                if let Some(Value::String(s)) = map.get("$numberLong") {
                    let millis = s
                        .parse::<i64>()
                        .map_err(|_| Error::Timestamp(format!("invalid $numberLong: {}", s)))?;
                    return DateTime::<Utc>::from_timestamp_millis(millis)
                        .ok_or_else(|| Error::Timestamp(format!("out of range: {}", millis)));
                }
                Err(Error::Timestamp(format!("unsupported timestamp object: {}", value)))
            }
            other => Err(Error::Timestamp(format!("unsupported timestamp: {}", other))),
        }
    }

    fn parse_str(s: &str) -> Result<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.with_timezone(&Utc));
        }
        for pattern in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(s, pattern) {
                return Ok(naive.and_utc());
            }
        }
        Err(Error::Timestamp(format!("unrecognized timestamp: {}", s)))
    }

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format(ts))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        parse_value(&value).map_err(serde::de::Error::custom)
    }
}
