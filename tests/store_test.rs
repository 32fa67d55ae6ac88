//! 解析結果ストアのテスト
//!
//! ファイルへの保存・再読み込みと取得順序を検証

use chrono::{Duration, TimeZone, Utc};
use defect_detective::analyzer::{AnalysisResult, DefectRecord};
use defect_detective::config::DatabaseLocation;
use defect_detective::error::DefectError;
use defect_detective::store::AnalysisStore;
use tempfile::tempdir;

fn result_at(id: &str, seconds: i64) -> AnalysisResult {
    AnalysisResult {
        id: id.to_string(),
        filename: format!("{}.png", id),
        upload_time: Utc.with_ymd_and_hms(2024, 1, 10, 8, 0, 0).unwrap() + Duration::seconds(seconds),
        total_defects: 1,
        defects_found: vec![DefectRecord {
            defect_type: "Corrosion".to_string(),
            confidence: 64.5,
            severity: "Low".to_string(),
            description: "Light surface rust".to_string(),
        }],
        analysis_complete: true,
        image_encoded: Some("aGVsbG8=".to_string()),
    }
}

/// 空のストア
#[test]
fn test_store_empty() {
    let store = AnalysisStore::open_in_memory().expect("ストア作成失敗");
    assert_eq!(store.count().unwrap(), 0);
    assert!(store.list_recent(10).unwrap().is_empty());
}

/// 保存して再度開いても同じ内容が読める
#[test]
fn test_store_save_and_reopen() {
    let dir = tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("nested").join("defects.sqlite3");

    {
        let store = AnalysisStore::open(&DatabaseLocation::File(path.clone())).expect("ストア作成失敗");
        store.save(&result_at("first", 0)).expect("保存失敗");
    }

    assert!(path.exists());
    let store = AnalysisStore::open_path(&path).expect("再オープン失敗");
    let loaded = store.get_by_id("first").expect("取得失敗");
    assert_eq!(loaded, result_at("first", 0));
}

/// 新しい順に limit 件
#[test]
fn test_list_recent_order_and_limit() {
    let store = AnalysisStore::open_in_memory().unwrap();
    for (id, seconds) in [("t2", 2), ("t0", 0), ("t4", 4), ("t1", 1), ("t3", 3)] {
        store.save(&result_at(id, seconds)).unwrap();
    }

    let ids: Vec<String> = store
        .list_recent(3)
        .unwrap()
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["t4", "t3", "t2"]);

    assert_eq!(store.list_recent(100).unwrap().len(), 5);
    assert!(store.list_recent(0).unwrap().is_empty());
}

/// 同時刻の場合は後から保存したものが先
#[test]
fn test_list_recent_same_timestamp() {
    let store = AnalysisStore::open_in_memory().unwrap();
    store.save(&result_at("older", 0)).unwrap();
    store.save(&result_at("newer", 0)).unwrap();

    let results = store.list_recent(2).unwrap();
    assert_eq!(results[0].id, "newer");
    assert_eq!(results[1].id, "older");
}

/// サブ秒の差も順序に反映される
#[test]
fn test_list_recent_subsecond_order() {
    let store = AnalysisStore::open_in_memory().unwrap();
    let mut early = result_at("early", 0);
    let mut late = result_at("late", 0);
    early.upload_time = early.upload_time + Duration::microseconds(900);
    late.upload_time = late.upload_time + Duration::milliseconds(1);
    store.save(&late).unwrap();
    store.save(&early).unwrap();

    let results = store.list_recent(2).unwrap();
    assert_eq!(results[0].id, "late");
}

/// 存在しないID
#[test]
fn test_get_by_id_not_found() {
    let store = AnalysisStore::open_in_memory().unwrap();
    store.save(&result_at("exists", 0)).unwrap();

    let err = store.get_by_id("missing").unwrap_err();
    assert!(matches!(err, DefectError::NotFound(_)));
}

/// 画像なしの結果も保存できる
#[test]
fn test_save_without_image() {
    let store = AnalysisStore::open_in_memory().unwrap();
    let mut result = result_at("no-image", 0);
    result.image_encoded = None;
    store.save(&result).unwrap();

    assert!(store.get_by_id("no-image").unwrap().image_encoded.is_none());
}
