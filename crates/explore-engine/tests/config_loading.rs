//! Loading dimension configs from disk

use explore_engine::{ConfigError, ExplorationConfig, RegistryError, TurnKind};
use pretty_assertions::assert_eq;
use std::io::Write;
use std::path::PathBuf;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../demos")
        .join(name)
}

fn write_temp(suffix: &str, body: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(body.as_bytes()).unwrap();
    file
}

#[test]
fn loads_toml_from_disk() {
    let file = write_temp(
        ".toml",
        r#"
item_type = "campaign"

[engine]
max_answer_chars = 500

[[dimensions]]
key = "goal"
label = "Goal"

[[dimensions]]
key = "channel"
label = "Channel"
"#,
    );

    let config = ExplorationConfig::from_path(file.path()).unwrap();
    assert_eq!(config.item_type, "campaign");
    assert_eq!(config.engine.max_answer_chars, 500);
    assert!(config.engine.trim_answers);

    let registry = config.registry().unwrap();
    let keys: Vec<_> = registry.dimensions().iter().map(|d| d.key.as_str()).collect();
    assert_eq!(keys, vec!["goal", "channel"]);
    assert_eq!(registry.get("channel").unwrap().order, 1);
}

#[test]
fn loads_yaml_from_disk() {
    let file = write_temp(
        ".yml",
        "item_type: persona\nseed_questions:\n  - Who is this for?\ndimensions:\n  - key: goals\n    label: Goals\n",
    );

    let config = ExplorationConfig::from_path(file.path()).unwrap();
    let registry = config.registry().unwrap();
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.seed_questions(), ["Who is this for?".to_string()]);
}

#[test]
fn unknown_extension_is_rejected() {
    let file = write_temp(".json", "{}");
    let err = ExplorationConfig::from_path(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat(_)));
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");
    let err = ExplorationConfig::from_path(&path).unwrap_err();
    match err {
        ConfigError::Io { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("expected Io error, got {other:?}"),
    }
}

#[test]
fn duplicate_keys_fail_registry_validation() {
    let file = write_temp(
        ".toml",
        "item_type = \"x\"\n[[dimensions]]\nkey = \"a\"\nlabel = \"A\"\n[[dimensions]]\nkey = \"a\"\nlabel = \"Again\"\n",
    );
    let config = ExplorationConfig::from_path(file.path()).unwrap();
    assert!(matches!(
        config.registry(),
        Err(RegistryError::DuplicateKey(ref k)) if k == "a"
    ));
}

#[test]
fn bundled_demos_are_valid() {
    let brand = ExplorationConfig::from_path(demo("brand_asset.toml")).unwrap();
    assert_eq!(brand.registry().unwrap().len(), 5);
    assert_eq!(brand.engine.hidden_turn_kinds, vec![TurnKind::Feedback]);

    for name in ["product.yaml", "persona.yaml"] {
        let config = ExplorationConfig::from_path(demo(name)).unwrap();
        assert!(!config.registry().unwrap().is_empty(), "{name}");
    }
}
