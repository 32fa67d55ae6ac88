pub mod error;
pub mod handlers;
pub mod router;
pub mod server;

use std::sync::Arc;

use crate::analyzer::AnalysisPipeline;

pub use router::build_router;
pub use server::serve;

/// ハンドラー共有状態
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
}

impl AppState {
    pub fn new(pipeline: AnalysisPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}
