//! アップロード画像の検証とBase64エンコード

use crate::error::{DefectError, Result};
use base64::Engine;
use std::path::Path;

/// Gemini の inlineData に渡す形式
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    pub mime_type: String,
    pub data: String,
}

/// 拡張子 → MIMEタイプ
const IMAGE_EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("heic", "image/heic"),
];

/// 画像であることを確認してBase64エンコード
///
/// content-type が `image/` で始まらない（または未指定の）場合は `InvalidInput`
pub fn encode_image(bytes: &[u8], content_type: Option<&str>) -> Result<EncodedImage> {
    let mime_type = content_type.unwrap_or_default();
    if !mime_type.starts_with("image/") {
        return Err(DefectError::InvalidInput(
            "Only image files are supported".to_string(),
        ));
    }

    Ok(EncodedImage {
        mime_type: mime_type.to_string(),
        data: base64::engine::general_purpose::STANDARD.encode(bytes),
    })
}

/// ローカルファイルの拡張子からMIMEタイプを推定（CLI用）
pub fn mime_type_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    IMAGE_EXTENSIONS
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, mime)| *mime)
        .unwrap_or("application/octet-stream")
}
