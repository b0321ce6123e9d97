//! Run with `cargo run --example dotenv`, or point at another file with
//! `cargo run --example dotenv -- --dotenv=demos/custom.env`.

use std::time::Duration;

use confbind::{Config, Field};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct AppConfig {
    database: DatabaseSection,
    api: ApiSection,
    debug: bool,
    port: u16,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct DatabaseSection {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiSection {
    key: String,
}

fn main() -> Result<(), confbind::Error> {
    let config: AppConfig = Config::builder()
        .with_process_defaults()
        .with_field(Field::of::<String>("database.url"))
        .with_field(Field::of::<String>("api.key"))
        .with_field(Field::of::<bool>("debug").with_default("false"))
        .with_field(Field::of::<u16>("port").with_default("8080"))
        .with_field(Field::of::<Duration>("timeout").with_default("30s"))
        .build()?;

    println!("Configuration loaded:");
    println!("  Database URL: {}", config.database.url);
    println!("  API Key: {}", config.api.key);
    println!("  Debug: {}", config.debug);
    println!("  Port: {}", config.port);
    println!("  Timeout: {:?}", config.timeout);

    Ok(())
}
