//! 解析結果ストア
//!
//! 解析結果をJSONドキュメントとしてSQLiteに保存する。
//! 追加と参照のみで、更新・削除はない。

use crate::config::DatabaseLocation;
use crate::error::{DefectError, Result};
use defect_detective_common::types::upload_time;
use defect_detective_common::AnalysisResult;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS analyses (
    id          TEXT PRIMARY KEY,
    upload_time TEXT NOT NULL,
    document    TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_analyses_upload_time ON analyses (upload_time);
";

pub struct AnalysisStore {
    conn: Mutex<Connection>,
}

impl AnalysisStore {
    pub fn open(location: &DatabaseLocation) -> Result<Self> {
        match location {
            DatabaseLocation::Memory => Self::open_in_memory(),
            DatabaseLocation::File(path) => Self::open_path(path),
        }
    }

    /// ファイルを開く（親ディレクトリがなければ作成）
    pub fn open_path(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        tracing::info!(path = %path.display(), "opened analysis store");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DefectError::LockPoisoned)
    }

    /// 解析結果を追加
    pub fn save(&self, result: &AnalysisResult) -> Result<()> {
        let document = serde_json::to_string(result)?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO analyses (id, upload_time, document) VALUES (?1, ?2, ?3)",
            params![result.id, upload_time::format(&result.upload_time), document],
        )?;
        Ok(())
    }

    /// 新しい順に最大 `limit` 件
    pub fn list_recent(&self, limit: usize) -> Result<Vec<AnalysisResult>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT document FROM analyses ORDER BY upload_time DESC, rowid DESC LIMIT ?1",
        )?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let documents = stmt
            .query_map(params![limit], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        documents.iter().map(|doc| decode(doc)).collect()
    }

    /// IDで取得
    pub fn get_by_id(&self, id: &str) -> Result<AnalysisResult> {
        let conn = self.lock()?;
        let document: Option<String> = conn
            .query_row(
                "SELECT document FROM analyses WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        match document {
            Some(doc) => decode(&doc),
            None => Err(DefectError::NotFound("Analysis not found".to_string())),
        }
    }

    /// 保存件数
    pub fn count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM analyses", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

fn decode(document: &str) -> Result<AnalysisResult> {
    Ok(serde_json::from_str(document)?)
}
