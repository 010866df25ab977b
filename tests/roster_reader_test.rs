//! Reading roster directories from disk.

mod common;

use std::fs;

use common::temp_dir;
use pulse::domain::errors::RosterError;
use pulse::infrastructure::roster::FileRosterReader;
use pulse::RosterReader;

const GROUP_A: &str = r"
orgId: '1'
groupId: A
subjects:
  - id: '7'
    name: Wang
    platformIds:
      weibo: '555'
      qzone: '888'
";

#[test]
fn test_reads_files_in_name_order() {
    let dir = temp_dir();
    fs::write(dir.path().join("b.json"), r#"{"orgId":"2","groupId":"B","subjects":[]}"#).unwrap();
    fs::write(dir.path().join("a.yaml"), GROUP_A).unwrap();
    fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

    let sources = FileRosterReader::new(dir.path()).read().unwrap();

    assert_eq!(sources.len(), 2);
    assert!(sources[0].origin.ends_with("a.yaml"));
    let first = sources[0].entry.as_ref().unwrap();
    assert_eq!(first.group.org_id, "1");
    assert_eq!(first.subjects[0].external_id("qzone"), Some("888"));
    assert_eq!(sources[1].entry.as_ref().unwrap().group.group_id, "B");
}

#[test]
fn test_file_with_entry_list_yields_one_source_per_entry() {
    let dir = temp_dir();
    let path = dir.path().join("all.yaml");
    fs::write(
        &path,
        "- orgId: '1'\n  groupId: A\n- orgId: '1'\n  groupId: B\n  subGroupId: '2'\n",
    )
    .unwrap();

    let sources = FileRosterReader::new(&path).read().unwrap();

    assert_eq!(sources.len(), 2);
    assert!(sources[1].origin.ends_with("all.yaml#1"));
    assert_eq!(sources[1].entry.as_ref().unwrap().group.group_key(), "B/2");
}

#[test]
fn test_bad_file_is_reported_not_fatal() {
    let dir = temp_dir();
    fs::write(dir.path().join("a.yaml"), GROUP_A).unwrap();
    fs::write(dir.path().join("b.yaml"), "orgId: [unterminated").unwrap();
    fs::write(
        dir.path().join("c.yaml"),
        "orgId: ''\ngroupId: C\n",
    )
    .unwrap();

    let sources = FileRosterReader::new(dir.path()).read().unwrap();

    assert_eq!(sources.len(), 3);
    assert!(sources[0].entry.is_ok());
    assert!(matches!(sources[1].entry, Err(RosterError::Malformed { .. })));
    assert!(matches!(
        sources[2].entry,
        Err(RosterError::MissingField { ref field, .. }) if field == "orgId"
    ));
}

#[test]
fn test_missing_directory_is_an_error() {
    let dir = temp_dir();
    let reader = FileRosterReader::new(dir.path().join("absent"));
    assert!(reader.read().is_err());
}
