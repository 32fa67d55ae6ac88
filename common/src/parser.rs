//! モデル応答パーサー
//!
//! モデルの応答テキストからコードフェンスを取り除き、
//! 欠陥リストをパースする

use serde::Deserialize;
use serde_json::Value;

use crate::error::MalformedModelOutput;
use crate::types::{DefectRecord, ParsedAnalysis};

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

#[derive(Deserialize)]
struct ModelReply {
    #[serde(default)]
    defects_found: Vec<DefectRecord>,
    #[serde(default)]
    total_defects: Option<Value>,
}

/// 先頭の ```json と末尾の ``` を取り除く
///
/// # Examples
/// ```
/// use defect_detective_common::strip_code_fence;
///
/// let reply = "```json\n{\"total_defects\": 0}\n```";
/// assert_eq!(strip_code_fence(reply).trim(), "{\"total_defects\": 0}");
/// ```
pub fn strip_code_fence(response: &str) -> &str {
    let mut text = response.trim();
    if let Some(rest) = text.strip_prefix(FENCE_OPEN) {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix(FENCE_CLOSE) {
        text = rest;
    }
    text
}

/// モデル応答をパース
///
/// - `defects_found` がなければ空リスト
/// - `total_defects` がなければ `defects_found` の件数
///
/// # Returns
/// * `Ok(ParsedAnalysis)` - パース成功
/// * `Err(MalformedModelOutput)` - JSONでない、またはオブジェクト形式でない
pub fn parse_model_reply(response: &str) -> Result<ParsedAnalysis, MalformedModelOutput> {
    let json_str = strip_code_fence(response);

    let value: Value = serde_json::from_str(json_str)
        .map_err(|e| MalformedModelOutput::new(format!("invalid JSON: {}", e)))?;

    if !value.is_object() {
        return Err(MalformedModelOutput::new("top-level value is not an object"));
    }

    let reply: ModelReply = serde_json::from_value(value)
        .map_err(|e| MalformedModelOutput::new(format!("unexpected shape: {}", e)))?;

    let total_defects = match reply.total_defects {
        None | Some(Value::Null) => reply.defects_found.len() as u32,
        Some(raw) => count_from_value(&raw)
            .ok_or_else(|| MalformedModelOutput::new(format!("invalid total_defects: {}", raw)))?,
    };

    Ok(ParsedAnalysis {
        defects_found: reply.defects_found,
        total_defects,
    })
}

fn count_from_value(value: &Value) -> Option<u32> {
    if let Some(n) = value.as_u64() {
        return u32::try_from(n).ok();
    }
    // 2.0 のような整数値の浮動小数も受け付ける
    let f = value.as_f64()?;
    if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
        return Some(f as u32);
    }
    None
}
