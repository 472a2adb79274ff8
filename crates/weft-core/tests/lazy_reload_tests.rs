//! Read-refresh / write-through access shared by several holders

use serde_json::json;
use weft_core::CoreError;
use weft_model::{JobId, Scope};
use weft_test_utils::{in_memory_config, FileFixture};

#[test]
fn second_holder_observes_first_holders_write() {
    let fixture = FileFixture::new();
    let node = fixture
        .data
        .create_and_set(&in_memory_config("foo", Scope::Scenario), Some("s1"))
        .unwrap();

    let (other, _) = fixture.reopen();
    let mut first = fixture.data.synced(node.clone());
    let mut second = other.synced(node);

    first.set_property("name", "updated").unwrap();
    assert_eq!(second.property("name").unwrap(), Some(json!("updated")));
}

#[test]
fn write_is_visible_through_get_immediately() {
    let fixture = FileFixture::new();
    let node = fixture
        .data
        .create_and_set(&in_memory_config("foo", Scope::Scenario), None)
        .unwrap();

    let mut synced = fixture.data.synced(node.clone());
    synced.set_edition_in_progress(true).unwrap();

    let stored = fixture.data.get(&node).unwrap().unwrap();
    assert!(stored.edition_in_progress());
}

#[test]
fn edits_by_the_manager_reach_stale_handles() {
    let fixture = FileFixture::new();
    let node = fixture
        .data
        .create_and_set(&in_memory_config("foo", Scope::Scenario), None)
        .unwrap();
    let mut handle = fixture.data.synced(node.clone());
    assert!(!handle.is_ready_for_reading().unwrap());

    fixture
        .data
        .write(&node, &json!([1]), Some(JobId::from("JOB_write_1")))
        .unwrap();

    assert!(handle.snapshot().job_ids().is_empty());
    assert_eq!(handle.job_ids().unwrap(), vec![JobId::from("JOB_write_1")]);
    assert!(handle.last_edition_date().unwrap().is_some());
    assert!(handle.is_ready_for_reading().unwrap());
}

#[test]
fn reading_a_deleted_node_fails() {
    let fixture = FileFixture::new();
    let node = fixture
        .data
        .create_and_set(&in_memory_config("foo", Scope::Scenario), None)
        .unwrap();
    let mut handle = fixture.data.synced(node.clone());

    fixture.data.delete(&node).unwrap();
    let err = handle.properties().unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, CoreError::Repository(_)));
}

#[test]
fn remove_property_writes_through() {
    let fixture = FileFixture::new();
    let config = in_memory_config("foo", Scope::Scenario).with_property("obsolete", true);
    let node = fixture.data.create_and_set(&config, None).unwrap();
    let mut handle = fixture.data.synced(node.clone());

    assert_eq!(handle.remove_property("obsolete").unwrap(), Some(json!(true)));
    let stored = fixture.data.load(&node).unwrap();
    assert!(stored.properties().get("obsolete").is_none());
}

#[test]
fn setter_on_stale_handle_keeps_a_later_write() {
    let fixture = FileFixture::new();
    let node = fixture
        .data
        .create_and_set(&in_memory_config("foo", Scope::Scenario), None)
        .unwrap();
    let mut handle = fixture.data.synced(node.clone());

    fixture
        .data
        .write(&node, &json!([1]), Some(JobId::from("JOB_write_1")))
        .unwrap();
    handle.set_edition_in_progress(false).unwrap();

    let stored = fixture.data.load(&node).unwrap();
    assert_eq!(stored.job_ids(), [JobId::from("JOB_write_1")].as_slice());
    assert!(stored.last_edition_date().is_some());
    assert_eq!(fixture.data.read(&node).unwrap(), json!([1]));
}
