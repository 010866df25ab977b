//! JSON output layout on disk.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use pulse::domain::models::{DeferredReport, GroupInfo, RunResult, Subject, SubjectKey};
use pulse::infrastructure::output::{JsonResultStore, RETRY_RESULTS_FILE};
use pulse::services::{EventSink, FetchOrchestrator, PlatformRegistry, ResultAggregator};
use pulse::{FetchError, HarvestError, ResultStore};

fn sample_result() -> RunResult {
    let mut aggregator = ResultAggregator::new();
    let mut info: GroupInfo = group("1", "A");
    info.sub_group_id = Some("3".into());
    aggregator.record(&info, &Subject::new("7", "Wang"), posts("weibo", &["hello"]));
    aggregator.into_run_result()
}

#[tokio::test]
async fn test_prepare_creates_timestamped_run_dir() {
    let root = temp_dir();
    let store = JsonResultStore::new(root.path());

    let run_dir = store.prepare().await.unwrap();

    assert!(run_dir.is_dir());
    let name = run_dir.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("Processed_"), "{name}");
    assert_eq!(name.len(), "Processed_YYYYmmdd_HHMMSS".len());
}

#[tokio::test]
async fn test_persist_writes_group_files() {
    let root = temp_dir();
    let store = JsonResultStore::new(root.path());
    let run_dir = store.prepare().await.unwrap();

    store
        .persist(&run_dir, &sample_result(), &DeferredReport::default())
        .await
        .unwrap();

    let file = run_dir.join("org_1").join("A").join("3.json");
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&file).unwrap()).unwrap();
    assert_eq!(json["groupInfo"]["orgId"], "1");
    assert_eq!(json["groupInfo"]["subGroupId"], "3");
    assert_eq!(json["subjectPosts"]["7Wang"][0]["text"], "hello");
    assert!(!run_dir.join(RETRY_RESULTS_FILE).exists(), "empty deferred report is not written");
}

#[tokio::test]
async fn test_subgroup_and_underscore_group_get_separate_files() {
    let root = temp_dir();
    let store = JsonResultStore::new(root.path());
    let run_dir = store.prepare().await.unwrap();

    let mut aggregator = ResultAggregator::new();
    let mut with_sub = group("1", "A");
    with_sub.sub_group_id = Some("1".into());
    aggregator.record(&with_sub, &Subject::new("7", "Wang"), posts("weibo", &["sub"]));
    aggregator.record(&group("1", "A_1"), &Subject::new("8", "Li"), posts("weibo", &["flat"]));
    let result = aggregator.into_run_result();

    store
        .persist(&run_dir, &result, &DeferredReport::default())
        .await
        .unwrap();

    let read = |path: std::path::PathBuf| -> serde_json::Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    };
    let org_dir = run_dir.join("org_1");
    assert_eq!(read(org_dir.join("A").join("1.json"))["subjectPosts"]["7Wang"][0]["text"], "sub");
    assert_eq!(read(org_dir.join("A_1.json"))["subjectPosts"]["8Li"][0]["text"], "flat");
}

#[tokio::test]
async fn test_persist_refuses_org_id_outside_run_dir() {
    let root = temp_dir();
    let store = JsonResultStore::new(root.path());
    let run_dir = store.prepare().await.unwrap();

    let mut aggregator = ResultAggregator::new();
    aggregator.record(&group("../../x", "A"), &Subject::new("7", "Wang"), posts("weibo", &["a"]));

    let err = store
        .persist(&run_dir, &aggregator.into_run_result(), &DeferredReport::default())
        .await
        .unwrap_err();
    assert!(matches!(err, HarvestError::Persist(_)));
    assert!(!root.path().join("x").exists());
}

#[tokio::test]
async fn test_persist_writes_retry_results_when_present() {
    let root = temp_dir();
    let store = JsonResultStore::new(root.path());
    let run_dir = store.prepare().await.unwrap();

    let mut deferred = DeferredReport::default();
    deferred.record(SubjectKey::new("7", "Wang"), posts("qzone", &["late"]));
    store.persist(&run_dir, &RunResult::default(), &deferred).await.unwrap();

    let json: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(run_dir.join(RETRY_RESULTS_FILE)).unwrap(),
    )
    .unwrap();
    assert_eq!(json["7Wang"][0]["text"], "late");
}

#[tokio::test]
async fn test_stopped_run_still_persists_partial_results() {
    let root = temp_dir();
    let weibo = Arc::new(ScriptedClient::always(
        "weibo",
        Err(FetchError::RateLimited("429".into())),
    ));
    let qzone = Arc::new(ScriptedClient::always("qzone", Ok(posts("qzone", &["kept"]))));
    let orch = Arc::new(FetchOrchestrator::new(
        fast_config(&["weibo", "qzone"], Duration::from_secs(3600)),
        PlatformRegistry::new()
            .with_client(as_client(&weibo))
            .with_client(as_client(&qzone)),
        fast_controller(&["weibo", "qzone"]),
        Arc::new(JsonResultStore::new(root.path())),
    ));

    let subject = Subject::new("1", "X")
        .with_platform_id("weibo", "555")
        .with_platform_id("qzone", "888");
    let runner = Arc::clone(&orch);
    let handle = tokio::spawn(async move {
        runner
            .run(vec![entry("1", "A", vec![subject])], EventSink::disconnected())
            .await
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    orch.stop();
    let report = handle.await.unwrap().unwrap();

    let file = report.run_dir.join("org_1").join("A.json");
    let json: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(file).unwrap()).unwrap();
    assert_eq!(json["subjectPosts"]["1X"][0]["text"], "kept");
    assert_eq!(json["subjectPosts"]["1X"].as_array().map(Vec::len), Some(1));
    assert!(!report.run_dir.join(RETRY_RESULTS_FILE).exists());
}
