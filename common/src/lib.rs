//! Defect Detective Common Library
//!
//! サーバーとCLIで共有される型・プロンプト・レスポンスパーサー

pub mod types;
pub mod error;
pub mod parser;
pub mod prompts;

pub use types::{AnalysisResult, DefectRecord, ParsedAnalysis};
pub use error::{Error, MalformedModelOutput, Result};
pub use parser::{parse_model_reply, strip_code_fence};
pub use prompts::{build_prompt, SYSTEM_INSTRUCTION, USER_INSTRUCTION};
