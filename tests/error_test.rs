//! エラーハンドリングテスト

use defect_detective::analyzer::encode_image;
use defect_detective::error::DefectError;

/// 画像以外は InvalidInput
#[test]
fn test_encode_non_image() {
    for content_type in [Some("text/plain"), Some("application/pdf"), Some(""), None] {
        let result = encode_image(b"data", content_type);
        assert!(
            matches!(result, Err(DefectError::InvalidInput(_))),
            "content_type: {:?}",
            content_type
        );
    }
}

/// DefectErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        DefectError::InvalidInput("Only image files are supported".to_string()),
        DefectError::Config("テスト設定エラー".to_string()),
        DefectError::MissingApiKey,
        DefectError::CredentialRevoked,
        DefectError::Upstream { status: 502, body: "bad gateway".to_string() },
        DefectError::UpstreamUnreachable("connection refused".to_string()),
        DefectError::NotFound("Analysis not found".to_string()),
        DefectError::LockPoisoned,
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "エラーメッセージが空: {:?}", err);
    }
}

/// 漏洩キーのメッセージは再発行を案内する
#[test]
fn test_credential_revoked_message() {
    let display = DefectError::CredentialRevoked.to_string();
    assert!(display.contains("reported as leaked"));
    assert!(display.contains("generate a new API key"));
    assert!(display.contains("GEMINI_API_KEY"));
}

/// 上流エラーにはステータスと本文が含まれる
#[test]
fn test_upstream_message() {
    let display = DefectError::Upstream { status: 429, body: "quota exceeded".to_string() }.to_string();
    assert!(display.contains("429"));
    assert!(display.contains("quota exceeded"));
}

/// IOエラーからの変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: DefectError = io_err.into();

    assert!(matches!(err, DefectError::Io(_)));
    assert!(format!("{}", err).contains("IO"));
}

/// JSONエラーからの変換
#[test]
fn test_json_error_conversion() {
    let json_err = serde_json::from_str::<serde_json::Value>("{ invalid }").unwrap_err();
    let err: DefectError = json_err.into();

    assert!(matches!(err, DefectError::JsonParse(_)));
}

/// ブロッキングタスクの失敗からの変換
#[tokio::test]
async fn test_join_error_conversion() {
    let join_err = tokio::task::spawn_blocking(|| panic!("store thread crashed"))
        .await
        .unwrap_err();
    let err: DefectError = join_err.into();

    assert!(matches!(err, DefectError::Task(_)));
}
