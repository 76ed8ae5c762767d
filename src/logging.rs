//! # Structured Logging Module
//!
//! Environment-aware structured logging through `tracing-subscriber`, plus
//! helpers that emit uniform events for source and cloud operations.

use crate::cloud::CloudProvider;
use crate::config::LoggingConfig;
use chrono::Utc;
use std::fmt::Display;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific defaults
pub fn init_structured_logging() {
    init_logging_with(&LoggingConfig::default());
}

/// Initialize logging; only the first call in a process has an effect
pub fn init_logging_with(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let log_level = config
            .level
            .clone()
            .unwrap_or_else(|| get_log_level(&environment).to_string());

        let console_layer = if config.json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(EnvFilter::new(log_level.clone()))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(environment != "production")
                .with_filter(EnvFilter::new(log_level.clone()))
                .boxed()
        };

        // A global subscriber may already be installed by the embedding application
        if tracing_subscriber::registry()
            .with(console_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            pid = std::process::id(),
            environment = %environment,
            level = %log_level,
            json = config.json,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Get current environment from environment variables
fn get_environment() -> String {
    std::env::var("MIGRATOR_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log structured data for source lifecycle operations
pub fn log_source_operation(
    operation: &str,
    source_name: &str,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        source = %source_name,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "📋 SOURCE_OPERATION"
    );
}

/// Log the outcome of a cloud provider operation
pub fn log_cloud_operation<T, E: Display>(
    operation: &str,
    provider: CloudProvider,
    subject: &str,
    result: &Result<T, E>,
) {
    match result {
        Ok(_) => tracing::info!(
            operation = %operation,
            provider = %provider,
            subject = %subject,
            timestamp = %Utc::now().to_rfc3339(),
            "☁️ CLOUD_OPERATION"
        ),
        Err(error) => tracing::error!(
            operation = %operation,
            provider = %provider,
            subject = %subject,
            error = %error,
            timestamp = %Utc::now().to_rfc3339(),
            "❌ CLOUD_OPERATION"
        ),
    }
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}
