use crate::error::{DefectError, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8001";
const MEMORY_DATABASE: &str = ":memory:";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_name: String,
    pub api_key: Option<String>,
    pub model: String,
    pub api_base: String,
    pub timeout_seconds: u64,
    pub max_output_tokens: u32,
    pub bind_addr: SocketAddr,
}

/// 保存先
#[derive(Debug, Clone, PartialEq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl Config {
    /// 環境変数から読み込む（.env があれば先に読み込む）
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー参照関数から構築
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.into());
        let bind_addr = SocketAddr::from_str(&bind_raw)
            .map_err(|e| DefectError::Config(format!("BIND_ADDR が不正です ({}): {}", bind_raw, e)))?;

        Ok(Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| "sqlite://.".into()),
            database_name: get("DB_NAME").unwrap_or_else(|| "defect_detective".into()),
            // APIキーの欠如は解析呼び出し時にエラーにする
            api_key: get("GEMINI_API_KEY"),
            model: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
            api_base: get("GEMINI_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.into()),
            timeout_seconds: parse_or("GEMINI_TIMEOUT_SECONDS", get("GEMINI_TIMEOUT_SECONDS"), 40)?,
            max_output_tokens: parse_or("GEMINI_MAX_OUTPUT_TOKENS", get("GEMINI_MAX_OUTPUT_TOKENS"), 512)?,
            bind_addr,
        })
    }

    pub fn get_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or(DefectError::MissingApiKey)
    }

    /// DATABASE_URL と DB_NAME からファイルパスを決める
    pub fn database_location(&self) -> DatabaseLocation {
        let url = self.database_url.trim();
        if url == MEMORY_DATABASE || url == "sqlite://:memory:" {
            return DatabaseLocation::Memory;
        }
        let dir = url.strip_prefix("sqlite://").unwrap_or(url);
        let dir = if dir.is_empty() { "." } else { dir };
        DatabaseLocation::File(PathBuf::from(dir).join(format!("{}.sqlite3", self.database_name)))
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|_| DefectError::Config(format!("{} が不正です: {}", key, v))),
    }
}
