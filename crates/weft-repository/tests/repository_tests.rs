//! Behaviour shared by every repository backing

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use weft_repository::{FileRepository, MemoryRepository, Model, Repository, RepositoryError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Record {
    id: String,
    name: String,
    properties: BTreeMap<String, serde_json::Value>,
}

impl Model for Record {
    const KIND: &'static str = "record";

    fn model_id(&self) -> &str {
        &self.id
    }
}

fn record(id: &str, name: &str) -> Record {
    Record {
        id: id.to_string(),
        name: name.to_string(),
        properties: BTreeMap::new(),
    }
}

fn check_save_then_load(repo: &dyn Repository<Record>) {
    let mut original = record("r1", "first");
    original
        .properties
        .insert("path".into(), serde_json::json!("data.csv"));
    repo.save(&original).unwrap();

    assert_eq!(repo.load("r1").unwrap(), original);
    assert!(repo.exists("r1").unwrap());
}

fn check_save_replaces(repo: &dyn Repository<Record>) {
    repo.save(&record("r1", "first")).unwrap();
    repo.save(&record("r1", "second")).unwrap();

    assert_eq!(repo.load("r1").unwrap().name, "second");
    assert_eq!(repo.get_all().unwrap().len(), 1);
}

fn check_load_missing(repo: &dyn Repository<Record>) {
    let err = repo.load("nope").unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(
        err,
        RepositoryError::ModelNotFound { kind: "record", ref id } if id == "nope"
    ));
}

fn check_delete(repo: &dyn Repository<Record>) {
    repo.save(&record("r1", "a")).unwrap();
    repo.save(&record("r2", "b")).unwrap();

    repo.delete("r1").unwrap();
    assert!(!repo.exists("r1").unwrap());
    assert!(repo.exists("r2").unwrap());
    assert!(repo.delete("r1").unwrap_err().is_not_found());
}

fn check_delete_all(repo: &dyn Repository<Record>) {
    for i in 0..5 {
        repo.save(&record(&format!("r{i}"), "x")).unwrap();
    }
    repo.delete_all().unwrap();
    assert!(repo.get_all().unwrap().is_empty());

    repo.save(&record("again", "x")).unwrap();
    assert_eq!(repo.get_all().unwrap().len(), 1);
}

fn check_get_all_sorted(repo: &dyn Repository<Record>) {
    for id in ["b", "c", "a"] {
        repo.save(&record(id, id)).unwrap();
    }
    let ids: Vec<_> = repo.get_all().unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
}

macro_rules! backing_tests {
    ($($name:ident => $check:ident),* $(,)?) => {
        mod memory {
            use super::*;
            $(
                #[test]
                fn $name() {
                    $check(&MemoryRepository::<Record>::new());
                }
            )*
        }

        mod file {
            use super::*;
            $(
                #[test]
                fn $name() {
                    let root = tempfile::tempdir().unwrap();
                    $check(&FileRepository::<Record>::new(root.path()));
                }
            )*
        }
    };
}

backing_tests! {
    save_then_load => check_save_then_load,
    save_replaces => check_save_replaces,
    load_missing_is_not_found => check_load_missing,
    delete_removes_single_model => check_delete,
    delete_all_empties_kind => check_delete_all,
    get_all_is_sorted => check_get_all_sorted,
}

#[test]
fn file_repository_survives_reopen() {
    let root = tempfile::tempdir().unwrap();
    {
        let repo = FileRepository::<Record>::new(root.path());
        repo.save(&record("durable", "kept")).unwrap();
    }

    let reopened = FileRepository::<Record>::new(root.path());
    assert_eq!(reopened.load("durable").unwrap().name, "kept");
}

#[test]
fn kinds_do_not_share_storage() {
    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Other {
        id: String,
    }

    impl Model for Other {
        const KIND: &'static str = "other";

        fn model_id(&self) -> &str {
            &self.id
        }
    }

    let root = tempfile::tempdir().unwrap();
    let records = FileRepository::<Record>::new(root.path());
    let others = FileRepository::<Other>::new(root.path());

    records.save(&record("shared", "r")).unwrap();
    others.save(&Other { id: "shared".into() }).unwrap();
    others.delete_all().unwrap();

    assert!(records.exists("shared").unwrap());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_file_repository_preserves_records(
        id in "[A-Za-z0-9_-]{1,32}",
        name in ".{0,64}",
        value in any::<i64>(),
    ) {
        let root = tempfile::tempdir().unwrap();
        let repo = FileRepository::<Record>::new(root.path());

        let mut original = record(&id, &name);
        original.properties.insert("n".into(), serde_json::json!(value));
        repo.save(&original).unwrap();

        prop_assert_eq!(repo.load(&id).unwrap(), original);
    }
}
