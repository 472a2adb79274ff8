//! Core service lifecycle and configuration wiring

use std::sync::Arc;
use weft_core::{Core, CoreError};
use weft_model::{Config, CoreSection, DataNodeConfig, RepositoryType, Scope};
use weft_test_utils::init_tracing;

fn filesystem_config(folder: &std::path::Path) -> Arc<Config> {
    let config = Config::new();
    config
        .set_core(
            CoreSection::new()
                .with_storage_folder(folder)
                .with_repository_type(RepositoryType::Filesystem),
        )
        .unwrap();
    Arc::new(config)
}

#[test]
fn core_cannot_run_twice() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let core = Core::new(filesystem_config(dir.path())).unwrap();

    core.run().unwrap();
    assert!(core.is_running());
    assert!(matches!(core.run(), Err(CoreError::CoreServiceAlreadyRunning)));

    core.stop();
    assert!(!core.is_running());
}

#[test]
fn running_core_blocks_configuration_updates() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let config = filesystem_config(dir.path());
    let core = Core::new(Arc::clone(&config)).unwrap();

    core.run().unwrap();
    let err: CoreError = config
        .add_data_node(DataNodeConfig::new("late").unwrap())
        .unwrap_err()
        .into();
    assert!(matches!(err, CoreError::ConfigurationUpdateBlocked));

    core.stop();
    assert!(config.add_data_node(DataNodeConfig::new("late").unwrap()).is_ok());
}

#[test]
fn configuration_file_drives_core() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let document = format!(
        r#"
[core]
storage_folder = "{}"
repository_type = "filesystem"

[data_nodes.sales]
storage_type = "pickle"
scope = "GLOBAL"
default_data = [1, 2, 3]

[data_nodes.report]
storage_type = "in_memory"
scope = "SCENARIO"

[tasks.summarize]
function = "reports::summarize"
inputs = ["sales"]
outputs = ["report"]
"#,
        dir.path().display().to_string().replace('\\', "/")
    );
    let config = Arc::new(Config::new());
    config.load_str(&document).unwrap();

    let core = Core::new(Arc::clone(&config)).unwrap();
    core.run().unwrap();

    let task_config = config.task("summarize").unwrap();
    let task = core
        .task_manager()
        .get_or_create(&task_config, Some("scenario_1"), None)
        .unwrap();
    assert_eq!(task.scope(), Scope::Global);

    let sales = task.resolve("sales").unwrap();
    assert_eq!(
        core.data_manager().read(sales).unwrap(),
        serde_json::json!([1, 2, 3])
    );
    assert!(dir.path().join("data_node").is_dir());
    assert!(dir.path().join("task").is_dir());
    core.stop();

    // A second core over the same folder sees the same entities
    let again = Core::new(config).unwrap();
    let resolved = again
        .task_manager()
        .get_or_create(&task_config, Some("scenario_2"), None)
        .unwrap();
    assert_eq!(resolved.id(), task.id());
}
