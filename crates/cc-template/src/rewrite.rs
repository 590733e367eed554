//! In-place rewriting of attribute structures, data sources and payloads

use crate::engine::Substitutor;
use crate::env::Environment;
use crate::error::SubstitutionError;
use cc_model::{AttrValue, Attributes, DataSource, IoManager, Payload};

/// Rewrite every template-capable value of `attributes`, depth first
///
/// String leaves and string-sequence elements are rewritten, nested maps
/// recurse, all other values are left alone.
///
/// # Errors
/// Returns the first `SubstitutionError`, located by attribute name.
pub fn substitute_attributes(
    attributes: &mut Attributes,
    sub: &Substitutor<'_>,
) -> Result<(), SubstitutionError> {
    for (name, value) in attributes.iter_mut() {
        rewrite_value(value, sub).map_err(|e| e.at(format!("attribute {name}")))?;
    }
    Ok(())
}

fn rewrite_value(value: &mut AttrValue, sub: &Substitutor<'_>) -> Result<(), SubstitutionError> {
    match value {
        AttrValue::Str(s) => *s = sub.substitute(s)?,
        AttrValue::Strings(items) => {
            for item in items.iter_mut() {
                *item = sub.substitute(item)?;
            }
        }
        AttrValue::Map(map) => substitute_attributes(map, sub)?,
        _ => {}
    }
    Ok(())
}

/// Rewrite a data source's name, paths and data paths
///
/// ATTR resolution is always enabled here, against `attributes`.
///
/// # Errors
/// Returns the first `SubstitutionError`, located by data-source name and
/// path key.
pub fn substitute_paths(
    source: &mut DataSource,
    env: &dyn Environment,
    attributes: &Attributes,
) -> Result<(), SubstitutionError> {
    let sub = Substitutor::new(env).with_attributes(attributes);
    let location = format!("data source {}", source.name);

    source.name = sub.substitute(&source.name).map_err(|e| e.at(&location))?;

    for (key, path) in &mut source.paths {
        *path = sub
            .substitute(path)
            .map_err(|e| e.at(format!("{location} path {key}")))?;
    }
    for (key, path) in &mut source.data_paths {
        *path = sub
            .substitute(path)
            .map_err(|e| e.at(format!("{location} data path {key}")))?;
    }
    Ok(())
}

fn substitute_sources(io: &mut IoManager, env: &dyn Environment, attributes: &Attributes) -> Result<(), SubstitutionError> {
    for source in io.inputs.iter_mut().chain(io.outputs.iter_mut()) {
        substitute_paths(source, env, attributes)?;
    }
    Ok(())
}

/// Run the full initialisation pass over a payload
///
/// 1. job attributes: ENV only (a map never resolves ATTR against itself
///    while it is being rewritten)
/// 2. job inputs/outputs: ATTR against the job attributes
/// 3. per action, attributes: ATTR against job ∪ action (action wins), taken
///    as a snapshot before rewriting
/// 4. per action, inputs/outputs: ATTR against job ∪ rewritten action
///
/// # Errors
/// Returns the first `SubstitutionError`; the payload may be partially
/// rewritten and must not be used further.
pub fn substitute_payload(payload: &mut Payload, env: &dyn Environment) -> Result<(), SubstitutionError> {
    substitute_attributes(&mut payload.io.attributes, &Substitutor::new(env))
        .map_err(|e| e.at("job"))?;

    let job_attributes = payload.io.attributes.clone();
    substitute_sources(&mut payload.io, env, &job_attributes).map_err(|e| e.at("job"))?;

    for action in &mut payload.actions {
        let location = format!("action {}", action.name);

        let snapshot = job_attributes.merged(&action.io.attributes);
        let sub = Substitutor::new(env).with_attributes(&snapshot);
        substitute_attributes(&mut action.io.attributes, &sub).map_err(|e| e.at(&location))?;

        let combined = job_attributes.merged(&action.io.attributes);
        substitute_sources(&mut action.io, env, &combined).map_err(|e| e.at(&location))?;

        tracing::debug!(action = %action.name, "substituted action templates");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cc_model::Action;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env() -> HashMap<String, String> {
        [
            ("TESTV3".to_string(), "98765432".to_string()),
            ("V5TEST1".to_string(), "this is a test".to_string()),
            ("CC_EVENT_NUMBER".to_string(), "42".to_string()),
        ]
        .into()
    }

    fn sample_attributes() -> Attributes {
        Attributes::new()
            .with("val1", 1_i64)
            .with("val2", "two")
            .with("val3", "this is a {ENV::TESTV3}")
            .with("val4", "this is {ATTR::testv4} ok?")
            .with("testv4", "LOREM IPSUM")
            .with(
                "val5",
                Attributes::new()
                    .with("v5test1", "test 1 of val5")
                    .with("v5test2", "this is a test of {ENV::V5TEST1}")
                    .with(
                        "v5test3",
                        vec![
                            "v5t3-1{ENV::TESTV3}-ok".to_string(),
                            "v5t3-2{ENV::TESTV3}-ok".to_string(),
                        ],
                    ),
            )
    }

    fn expected(val4: &str) -> Attributes {
        Attributes::new()
            .with("val1", 1_i64)
            .with("val2", "two")
            .with("val3", "this is a 98765432")
            .with("val4", val4)
            .with("testv4", "LOREM IPSUM")
            .with(
                "val5",
                Attributes::new()
                    .with("v5test1", "test 1 of val5")
                    .with("v5test2", "this is a test of this is a test")
                    .with(
                        "v5test3",
                        vec!["v5t3-198765432-ok".to_string(), "v5t3-298765432-ok".to_string()],
                    ),
            )
    }

    #[test]
    fn attributes_env_only() {
        let env = env();
        let mut attrs = sample_attributes();

        substitute_attributes(&mut attrs, &Substitutor::new(&env)).unwrap();
        assert_eq!(attrs, expected("this is {ATTR::testv4} ok?"));
    }

    #[test]
    fn attributes_with_attr_enabled() {
        let env = env();
        let snapshot = sample_attributes();
        let mut attrs = sample_attributes();

        substitute_attributes(&mut attrs, &Substitutor::new(&env).with_attributes(&snapshot)).unwrap();
        assert_eq!(attrs, expected("this is LOREM IPSUM ok?"));
    }

    #[test]
    fn nested_error_is_located() {
        let env = HashMap::new();
        let mut attrs = Attributes::new().with("outer", Attributes::new().with("inner", "{ENV::GONE}"));

        let err = substitute_attributes(&mut attrs, &Substitutor::new(&env)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "attribute outer: attribute inner: missing environment parameter GONE in {ENV::GONE}"
        );
    }

    #[test]
    fn paths_rewrite_name_paths_and_data_paths() {
        let env = env();
        let attrs = Attributes::new().with("scenario", "alt").with("run", 3_i64);
        let mut ds = DataSource::new("out-{ATTR::scenario}", "FFRD")
            .with_path("default", "runs/{ENV::CC_EVENT_NUMBER}/{ATTR::scenario}.csv")
            .with_path("later", "runs/{VAR::member}.csv")
            .with_data_path("table", "run_{ATTR::run}");

        substitute_paths(&mut ds, &env, &attrs).unwrap();

        assert_eq!(ds.name, "out-alt");
        assert_eq!(ds.path("default"), Some("runs/42/alt.csv"));
        assert_eq!(ds.path("later"), Some("runs/{VAR::member}.csv"));
        assert_eq!(ds.data_path("table"), Some("run_3"));
    }

    #[test]
    fn payload_scoping_rules() {
        let env = env();
        let mut payload = Payload::new(
            IoManager::new()
                .with_attributes(
                    Attributes::new()
                        .with("scenario", "base")
                        .with("event", "{ENV::CC_EVENT_NUMBER}")
                        .with("self_ref", "{ATTR::scenario}"),
                )
                .with_input(DataSource::new("terrain", "FFRD").with_path("default", "{ATTR::scenario}/t.tif")),
            vec![Action::new("compute").with_io(
                IoManager::new()
                    .with_attributes(
                        Attributes::new()
                            .with("scenario", "alt")
                            .with("label", "{ATTR::scenario}-{ATTR::event}"),
                    )
                    .with_output(
                        DataSource::new("results", "FFRD")
                            .with_path("default", "{ATTR::scenario}/{ATTR::event}/r.csv"),
                    ),
            )],
        );

        substitute_payload(&mut payload, &env).unwrap();

        // job attributes never resolve ATTR against themselves
        assert_eq!(payload.io.attributes.get_str("self_ref"), Some("{ATTR::scenario}"));
        assert_eq!(payload.io.attributes.get_str("event"), Some("42"));
        assert_eq!(payload.io.inputs[0].path("default"), Some("base/t.tif"));

        let action = &payload.actions[0];
        // action values win over job values
        assert_eq!(action.io.attributes.get_str("label"), Some("alt-42"));
        assert_eq!(action.io.outputs[0].path("default"), Some("alt/42/r.csv"));
    }

    #[test]
    fn payload_error_names_action() {
        let env = env();
        let mut payload = Payload::new(
            IoManager::new(),
            vec![Action::new("compute").with_io(
                IoManager::new().with_input(DataSource::new("terrain", "FFRD").with_path("default", "{ATTR::missing}")),
            )],
        );

        let err = substitute_payload(&mut payload, &env).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("action compute: data source terrain path default"));
        assert!(matches!(err.root_cause(), SubstitutionError::MissingAttr { .. }));
    }
}
