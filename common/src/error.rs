//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("Timestamp error: {0}")]
    Timestamp(String),
}

/// モデル出力が期待する形式でなかったことを表す
///
/// パイプラインの境界でセンチネルレコードに置き換えられ、
/// クライアントへは返されない。
#[derive(Error, Debug, Clone, PartialEq)]
#[error("malformed model output: {reason}")]
pub struct MalformedModelOutput {
    pub reason: String,
}

impl MalformedModelOutput {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_timestamp() {
        let error = Error::Timestamp("not a date".to_string());
        assert_eq!(format!("{}", error), "Timestamp error: not a date");
    }

    #[test]
    fn test_malformed_display() {
        let error = MalformedModelOutput::new("expected value at line 1 column 1");
        let display = format!("{}", error);
        assert!(display.starts_with("malformed model output"));
        assert!(display.contains("line 1 column 1"));
    }
}
