use thiserror::Error;

#[derive(Error, Debug)]
pub enum DefectError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("設定エラー: {0}")]
    Config(String),

    #[error("GEMINI_API_KEY is not set in the environment. Please set a valid Gemini API key.")]
    MissingApiKey,

    #[error(
        "LLM provider (Gemini) blocked the API key because it was reported as leaked. \
         Please generate a new API key and update GEMINI_API_KEY in your environment."
    )]
    CredentialRevoked,

    #[error("Analysis failed while calling LLM: upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Analysis failed while calling LLM: {0}")]
    UpstreamUnreachable(String),

    #[error("{0}")]
    NotFound(String),

    #[error("ストレージエラー: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("ストレージのロックが壊れています")]
    LockPoisoned,

    #[error("バックグラウンド処理エラー: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DefectError>;
