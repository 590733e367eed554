//! Initialisation: connect phase followed by the substitution pass

use cc_model::{Action, Attributes, DataSource, DataStore, IoManager, IoType, Payload};
use cc_plugin::{ActionRegistry, PluginError, PluginManager};
use cc_template::SubstitutionError;
use cc_test_utils::{env, memory_registry, memory_store, sample_env, sample_payload};
use pretty_assertions::assert_eq;

fn build(payload: Payload) -> Result<PluginManager, PluginError> {
    PluginManager::builder()
        .with_payload(payload)
        .with_store_registry(memory_registry())
        .with_action_registry(ActionRegistry::new())
        .with_environment(sample_env())
        .build()
}

#[test]
fn templates_resolved_after_init() {
    let manager = build(sample_payload()).unwrap();

    let terrain = manager.get_input_data_source("terrain").unwrap();
    assert_eq!(terrain.path("default"), Some("base/terrain.tif"));
    assert_eq!(manager.payload().io.attributes.get_str("event"), Some("7"));

    let action_io = manager.action_io(0).unwrap();
    let results = action_io.get_output_data_source("results").unwrap();
    assert_eq!(results.path("default"), Some("alt/7/results.csv"));
    assert_eq!(results.path("member"), Some("alt/members/{VAR::member}.csv"));

    assert!(manager.get_store("FFRD").unwrap().is_connected());
}

#[test]
fn unset_env_halts_initialisation() {
    let payload = Payload::new(
        IoManager::new().with_attributes(Attributes::new().with("bucket", "{ENV::NOT_SET_ANYWHERE}")),
        vec![Action::new("compute")],
    );

    let err = build(payload).unwrap_err();
    let PluginError::Substitution(inner) = err else {
        panic!("expected substitution error");
    };
    assert!(matches!(
        inner.root_cause(),
        SubstitutionError::MissingEnv { name, .. } if name == "NOT_SET_ANYWHERE"
    ));
}

#[test]
fn missing_attribute_in_action_path_halts() {
    let payload = Payload::new(
        IoManager::new().with_store(memory_store("FFRD")),
        vec![Action::new("compute").with_io(
            IoManager::new().with_input(DataSource::new("grid", "FFRD").with_path("default", "{ATTR::nope}/g.tif")),
        )],
    );

    let err = build(payload).unwrap_err();
    assert!(err.to_string().contains("action compute"));
}

#[test]
fn unknown_store_type_halts() {
    let payload = Payload::new(IoManager::new().with_store(DataStore::new("FFRD", "S3")), Vec::new());

    let err = build(payload).unwrap_err();
    assert!(matches!(err, PluginError::Connect(ref e) if e.store() == "FFRD"));
}

#[test]
fn action_store_shadows_job_store() {
    let payload = Payload::new(
        IoManager::new().with_store(memory_store("FFRD")),
        vec![Action::new("compute").with_io(IoManager::new().with_store(
            memory_store("FFRD").with_params(Attributes::new().with("root", "/action")),
        ))],
    );
    let manager = build(payload).unwrap();

    assert_eq!(manager.get_store("FFRD").unwrap().root(), "/");
    let action_io = manager.action_io(0).unwrap();
    assert_eq!(action_io.get_store("FFRD").unwrap().root(), "/action");
}

#[test]
fn descriptor_from_json() {
    let descriptor = r#"{
        "attributes": {"scenario": "{ENV::SCENARIO}", "members": 3},
        "stores": [{"name": "FFRD", "store_type": "MEMORY", "params": {"root": "/sims"}}],
        "inputs": [{"name": "terrain", "store_name": "FFRD", "paths": {"default": "{ATTR::scenario}/t.tif"}}],
        "outputs": [],
        "actions": [{
            "name": "compute",
            "type": "compute",
            "description": "runs the model",
            "attributes": {"member_count": "{ATTR::members}"},
            "stores": [],
            "inputs": [],
            "outputs": [{"name": "out", "store_name": "FFRD", "paths": {"default": "{ATTR::scenario}/{ATTR::member_count}.csv"}}]
        }]
    }"#;

    let manager = PluginManager::builder()
        .with_payload(Payload::from_json_str(descriptor).unwrap())
        .with_store_registry(memory_registry())
        .with_action_registry(ActionRegistry::new())
        .with_environment(env(&[("SCENARIO", "wet")]))
        .build()
        .unwrap();

    assert_eq!(
        manager.get_absolute_path("FFRD", "terrain", "default").unwrap(),
        "/sims/wet/t.tif"
    );
    let action_io = manager.action_io(0).unwrap();
    assert_eq!(
        action_io.get_data_source(IoType::Any, "out").unwrap().path("default"),
        Some("wet/3.csv")
    );
    assert_eq!(manager.payload().actions[0].action_type, "compute");
}
