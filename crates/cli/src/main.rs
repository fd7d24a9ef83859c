use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vetter_cli::config::CliConfig;
use vetter_core::ValidatorConfig;

/// Validate a JSON document against a rule schema.
#[derive(Debug, Parser)]
#[command(name = "vetter", version)]
struct Args {
    /// Schema file declaring aliases, record types and field rules.
    #[arg(long, value_name = "PATH")]
    schema: PathBuf,

    /// JSON document to validate.
    #[arg(long, value_name = "PATH")]
    input: PathBuf,

    /// Record type of the document (overrides the schema file's "root").
    #[arg(long, value_name = "TYPE")]
    root: Option<String>,
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // --- Tracing ---
    let config = CliConfig::from_env();
    let filter = tracing_subscriber::EnvFilter::try_new(&config.log_filter)
        .unwrap_or_else(|_| vetter_cli::config::DEFAULT_LOG_FILTER.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(
            config
                .log_json
                .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!config.log_json)
                .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
        .init();

    // --- Validation ---
    let validator_config = ValidatorConfig::from_env();
    tracing::debug!(
        required_struct = validator_config.required_struct,
        field_fail_fast = validator_config.field_fail_fast,
        "Loaded validator configuration"
    );

    let violations = match vetter_cli::check_files(
        &args.schema,
        &args.input,
        args.root.as_deref(),
        validator_config,
    ) {
        Ok(violations) => violations,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "Validation aborted");
            eprintln!("error: {err:#}");
            return ExitCode::from(2);
        }
    };

    match serde_json::to_string_pretty(&violations) {
        Ok(out) => println!("{out}"),
        Err(err) => {
            eprintln!("error: failed to encode violations: {err}");
            return ExitCode::from(2);
        }
    }

    if violations.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
