use codepin_engine::config::Config;
use codepin_engine::pipeline::{parse_model_output, validate_project, Publisher};
use codepin_engine::storage::MemoryStore;
use proptest::prelude::*;
use sdk::errors::PipelineError;
use sdk::types::ProjectFile;
use serde_json::{json, Value};
use std::sync::Arc;

fn project_file() -> impl Strategy<Value = (String, String)> {
    ("[a-z]{1,12}\\.(js|mjs|json)", "[ -~\n]{0,80}")
}

// Wrapping a valid object in brace-free prose does not change what is parsed
proptest! {
    #[test]
    fn test_prose_wrapped_output_parses_like_bare_output(
        files in prop::collection::vec(project_file(), 1..6),
        prefix in "[a-zA-Z0-9 .,:!\n`]{0,60}",
        suffix in "[a-zA-Z0-9 .,:!\n`]{0,60}",
    ) {
        let value = json!({
            "projectFiles": files
                .iter()
                .map(|(name, content)| json!({"name": name, "content": content}))
                .collect::<Vec<_>>()
        });
        let bare = serde_json::to_string(&value).unwrap();
        let wrapped = format!("{}{}{}", prefix, bare, suffix);

        let parsed_bare = parse_model_output(&bare).unwrap();
        let parsed_wrapped = parse_model_output(&wrapped).unwrap();

        prop_assert_eq!(&parsed_bare, &parsed_wrapped);
        prop_assert_eq!(parsed_wrapped, value);
    }
}

// The parser either returns a value or a parse error that keeps the input
proptest! {
    #[test]
    fn test_parser_failures_keep_raw_output(raw in "\\PC{0,200}") {
        match parse_model_output(&raw) {
            Ok(_) => {}
            Err(PipelineError::Parse { raw: kept, .. }) => prop_assert_eq!(kept, raw),
            Err(other) => prop_assert!(false, "unexpected error: {:?}", other),
        }
    }
}

fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-z.]{0,10}".prop_map(Value::String),
    ]
}

fn json_value() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::hash_map("name|content|projectFiles|x", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

// Validation is total: arbitrary JSON is accepted or rejected with a schema error
proptest! {
    #[test]
    fn test_validator_rejects_only_with_schema_errors(value in json_value()) {
        match validate_project(&value) {
            Ok(project) => {
                prop_assert!(!project.is_empty());
                for file in project.files() {
                    prop_assert!(!file.name.trim().is_empty());
                }
            }
            Err(PipelineError::Schema(_)) => {}
            Err(other) => prop_assert!(false, "unexpected error: {:?}", other),
        }
    }
}

// Publishing N files always yields N + 1 receipts, README first
proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]
    #[test]
    fn test_publish_returns_one_receipt_per_file_plus_readme(
        files in prop::collection::vec(project_file(), 1..8),
        folder in "[a-z-]{1,16}",
    ) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let files: Vec<ProjectFile> = files
            .into_iter()
            .map(|(name, content)| ProjectFile::new(name, content))
            .collect();
        let publisher = Publisher::new(Arc::new(MemoryStore::new()));

        let receipts = runtime
            .block_on(publisher.publish(&Publisher::readme(&folder), &files))
            .unwrap();

        prop_assert_eq!(receipts.len(), files.len() + 1);
        prop_assert_eq!(receipts[0].name.as_str(), "README.md");
        for (receipt, file) in receipts[1..].iter().zip(&files) {
            prop_assert_eq!(&receipt.name, &file.name);
        }
    }
}

proptest! {
    #[test]
    fn test_config_parsing_round_trip(
        log_level in "error|warn|info|debug|trace",
        backend in "pinata|memory",
        temperature in 0.0..=2.0f32,
        max_tokens in 1..=32768u32,
        owner_key in "[a-z]{1,12}",
    ) {
        let mut config = Config::default_config();
        config.core.log_level = log_level;
        config.storage.backend = backend;
        config.generation.temperature = temperature;
        config.generation.max_tokens = max_tokens;
        config.manifest.owner_key = owner_key;

        let toml_string = toml::to_string(&config).expect("Failed to serialize Config to string");
        let parsed: Config = toml::from_str(&toml_string).expect("Failed to deserialize TOML to Config");

        prop_assert_eq!(config.core.log_level, parsed.core.log_level);
        prop_assert_eq!(config.storage.backend, parsed.storage.backend);
        prop_assert_eq!(config.generation.temperature, parsed.generation.temperature);
        prop_assert_eq!(config.generation.max_tokens, parsed.generation.max_tokens);
        prop_assert_eq!(config.manifest.owner_key, parsed.manifest.owner_key);
    }
}
