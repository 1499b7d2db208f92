// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use sortyx::{
    api::{start_server, AppState},
    config::ServerConfig,
};
use std::env;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    println!("🚀 Starting Sortyx waste classifier...\n");
    println!("📦 BUILD VERSION: {}", sortyx::version::VERSION);
    println!("📅 Build Date: {}", sortyx::version::BUILD_DATE);
    println!();

    // SORTYX_CONFIG points at a TOML file; otherwise SORTYX_* variables apply
    let config = match env::var("SORTYX_CONFIG") {
        Ok(path) => {
            println!("📄 Loading configuration from {}", path);
            ServerConfig::from_file(&path)?
        }
        Err(_) => ServerConfig::from_env()?,
    };

    println!("⚙️  Profile: {}", config.profile);
    println!("   Listen address: {}", config.listen_addr);
    println!("   Response shape: {:?}", config.response_shape);
    println!("   Input size: {}", config.input_size);
    println!(
        "   Strict validation: {}",
        if config.strict_validation { "ENABLED" } else { "disabled" }
    );

    println!("🧠 Loading classifier...");
    let pipeline = match config.build_pipeline() {
        Ok(pipeline) => pipeline,
        Err(e) => {
            eprintln!("❌ Failed to initialize classifier: {:#}", e);
            std::process::exit(1);
        }
    };
    println!("✅ Classifier ready: {}", pipeline.classifier_name());
    match pipeline.chat_model_name() {
        Some(model) => println!("✅ Chat model: {} at {}", model, config.chat.endpoint),
        None => println!("ℹ️  Chat model disabled"),
    }
    println!();

    start_server(AppState::new(config, pipeline)).await
}
