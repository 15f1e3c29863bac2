// SPDX-FileCopyrightText: 2026 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Lead Guard CLI
//!
//! Submits one lead through the full guard pipeline against a live lead API.
//! Useful for smoke-testing a deployment with the CAPTCHA provider's test
//! keys.
//!
//! ## Configuration
//!
//! Loaded from the environment (a `.env` file is honoured):
//!
//! - `LEAD_GUARD_API_BASE`: lead API base URL (default: http://localhost:8000/api/)
//! - `LEAD_GUARD_MAX_ATTEMPTS`: attempts before the lock trips (default: 5)
//! - `LEAD_GUARD_BLOCK_DURATION_MS`: lock length (default: 60000)
//! - `LEAD_GUARD_STORAGE_PATH`: local storage file (default: .lead-guard-storage.json)
//! - `LEAD_GUARD_WORKSHOP_PRICE` / `LEAD_GUARD_CURRENCY`: payment step amount

use clap::Parser;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lead_guard::{
    backend::HttpBackend,
    captcha::StaticCaptcha,
    config::Config,
    storage::FileStore,
    throttle::SubmissionThrottler,
    validator::LeadForm,
    SubmissionPipeline,
};

#[derive(Parser)]
#[command(name = "lead-guard", about = "Submit a workshop lead through the submission guard")]
struct Args {
    /// Full name
    #[arg(long)]
    name: String,

    /// Email address
    #[arg(long)]
    email: String,

    /// Phone number, separators allowed
    #[arg(long)]
    phone: String,

    /// Accept data processing
    #[arg(long)]
    consent: bool,

    /// CAPTCHA token to present (provider test token for staging)
    #[arg(long, env = "LEAD_GUARD_CAPTCHA_TOKEN")]
    captcha_token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().json())
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::INFO.into())
                .from_env_lossy(),
        )
        .init();

    let args = Args::parse();

    let config = Config::from_env();
    info!(
        api_base = %config.submission.api_base,
        max_attempts = config.throttle.max_attempts,
        block_duration_ms = config.throttle.block_duration_ms,
        storage = %config.throttle.storage_path.display(),
        "Starting lead submission"
    );

    let store = Arc::new(FileStore::new(config.throttle.storage_path.clone()));
    let throttler = SubmissionThrottler::new(config.throttle.clone(), store);
    let backend = Arc::new(HttpBackend::new(&config.submission)?);
    let captcha = Arc::new(match args.captcha_token {
        Some(token) => StaticCaptcha::new(token),
        None => StaticCaptcha::unavailable(),
    });

    let pipeline = SubmissionPipeline::new(throttler, backend, captcha, &config);

    let form = LeadForm {
        name: args.name,
        email: args.email,
        phone_number: args.phone,
        consent: args.consent,
        website: String::new(),
    };

    let Some(outcome) = pipeline.submit(&form).await else {
        anyhow::bail!("submission produced no outcome");
    };

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    eprintln!("{}", outcome.message());

    if let Some(request) = pipeline.payment_request().await {
        println!("{}", serde_json::to_string_pretty(&request)?);
    }

    Ok(())
}
