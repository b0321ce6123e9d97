use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use confbind::{Config, ConfigError, EnvProvider, Field, Shape};
use serde::Deserialize;
use tempfile::TempDir;

#[derive(Debug, Deserialize)]
struct AppConfig {
    database: Database,
    #[serde(rename = "api-key")]
    api_key: String,
    debug: bool,
    port: u16,
    retries: Vec<i32>,
    nickname: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Database {
    url: String,
    timeout: Duration,
}

fn env(vars: &[(&str, &str)]) -> EnvProvider {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    EnvProvider::with_lookup(move |name| vars.get(name).cloned())
}

fn fields(config: Config) -> Config {
    config
        .with_field(Field::of::<String>("database.url"))
        .with_field(Field::of::<Duration>("database.timeout").with_default("5s"))
        .with_field(Field::of::<String>("api-key"))
        .with_field(Field::of::<bool>("debug").with_default("false"))
        .with_field(Field::of::<u16>("port").with_default("8080"))
        .with_field(Field::of::<Vec<i32>>("retries").with_default("1,2,3"))
        .with_field(Field::of::<String>("nickname").optional())
}

#[test]
fn test_build_layers_all_sources() {
    let dir = TempDir::new().unwrap();
    let dotenv = dir.path().join(".env");
    fs::write(
        &dotenv,
        "# defaults for local runs\n\
         DATABASE_URL=postgres://dotenv/db\n\
         API_KEY=\"secret-key\"\n\
         DEBUG=true\n\
         PORT=7000\n",
    )
    .unwrap();

    let config: AppConfig = fields(
        Config::builder()
            .with_dotenv(&dotenv)
            .with_provider(env(&[("PORT", "7500"), ("DATABASE_TIMEOUT", "1m30s")]))
            .with_args(["app", "--database.url", "postgres://args/db"]),
    )
    .build()
    .unwrap();

    assert_eq!(config.database.url, "postgres://args/db");
    assert_eq!(config.database.timeout, Duration::from_secs(90));
    assert_eq!(config.api_key, "secret-key");
    assert!(config.debug);
    assert_eq!(config.port, 7500);
    assert_eq!(config.retries, vec![1, 2, 3]);
    assert_eq!(config.nickname, None);
}

#[test]
fn test_build_reports_every_problem() {
    let err = fields(
        Config::builder()
            .with_dotenv("/nonexistent/.env")
            .with_args(["--port=70000", "--debug=maybe"]),
    )
    .build::<AppConfig>()
    .unwrap_err();

    let keys: Vec<String> = err
        .into_errors()
        .into_iter()
        .map(|e| match e {
            ConfigError::Convert { key, .. } | ConfigError::Missing { key } => key,
            other => panic!("unexpected error: {other}"),
        })
        .collect();
    assert_eq!(keys, ["database.url", "api-key", "debug", "port"]);
}

#[test]
fn test_build_type_mismatch_is_deserialize_error() {
    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Wrong {
        port: String,
    }

    let err = Config::builder()
        .with_args(["--port=80"])
        .field("port", Shape::U16)
        .build::<Wrong>()
        .unwrap_err();
    assert!(matches!(err, ConfigError::DeserializeError(_)));
}
