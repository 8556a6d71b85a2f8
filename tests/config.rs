use std::collections::BTreeMap;
use std::fs;

use nodeploy::Config;
use nodeploy::error::DeployError;
use proptest::prelude::*;

fn key_strategy() -> impl Strategy<Value = String> {
    "[A-Z][A-Z0-9_]{0,15}"
}

fn value_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9/:._-]{0,20}"
}

/// Render one entry with optional quoting and padding.
fn render_line(key: &str, value: &str, quoted: bool, pad: usize) -> String {
    let spaces = " ".repeat(pad);
    if quoted {
        format!("{spaces}{key}{spaces}={spaces}\"{value}\"{spaces}")
    } else {
        format!("{spaces}{key}={spaces}{value}")
    }
}

proptest! {
    /// Entries match the non-comment, non-blank lines exactly.
    #[test]
    fn well_formed_text_round_trips(
        entries in prop::collection::btree_map(key_strategy(), value_strategy(), 0..12),
        quoted in any::<bool>(),
        pad in 0usize..3,
    ) {
        let mut text = String::from("# generated\n\n");
        for (k, v) in &entries {
            text.push_str(&render_line(k, v, quoted, pad));
            text.push_str("\n# between entries\n   \n");
        }

        let config = Config::parse(&text).unwrap();

        let parsed: BTreeMap<String, String> = config
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        prop_assert_eq!(parsed, entries);
    }

    /// Loading the same source twice yields equal mappings.
    #[test]
    fn parsing_is_deterministic(
        entries in prop::collection::vec((key_strategy(), value_strategy()), 0..12),
    ) {
        let text: String = entries
            .iter()
            .map(|(k, v)| format!("{k}={v}\n"))
            .collect();

        prop_assert_eq!(Config::parse(&text).unwrap(), Config::parse(&text).unwrap());
    }

    /// Any non-blank, non-comment line without `=` is rejected.
    #[test]
    fn line_without_equals_is_rejected(
        bad in "[a-z][a-z ]{0,19}",
        before in prop::collection::btree_map(key_strategy(), value_strategy(), 0..4),
    ) {
        let mut text: String = before.iter().map(|(k, v)| format!("{k}={v}\n")).collect();
        text.push_str(&bad);

        match Config::parse(&text) {
            Err(DeployError::MalformedConfig { line, content }) => {
                prop_assert_eq!(line, before.len() + 1);
                prop_assert_eq!(content, bad.trim());
            }
            other => prop_assert!(false, "expected malformed config, got {:?}", other),
        }
    }
}

#[test]
fn load_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app.conf");
    fs::write(
        &path,
        "# Application\nAPP_NAME_GITHUB=\"site\"\nAPP_NAME_PM2=web\n\nPORT = 3000\n",
    )
    .unwrap();

    let config = Config::load(&path).unwrap();

    assert_eq!(config.len(), 3);
    assert_eq!(config.get("APP_NAME_GITHUB"), Some("site"));
    assert_eq!(config.get("PORT"), Some("3000"));
    assert_eq!(Config::load(&path).unwrap(), config);
}

#[test]
fn load_missing_file() {
    let dir = tempfile::tempdir().unwrap();

    let err = Config::load(&dir.path().join("absent.conf")).unwrap_err();

    assert!(matches!(err, DeployError::Precondition(_)));
}

#[test]
fn serializes_as_flat_json_object() {
    let config = Config::parse("B=2\nA=1").unwrap();

    let json = serde_json::to_string(&config).unwrap();

    assert_eq!(json, r#"{"B":"2","A":"1"}"#);
}
