use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;

use mail_triage::config::TriageConfig;
use mail_triage::intake;
use mail_triage::llm::create_provider;
use mail_triage::pipeline::{ConsoleNotifier, Workflow};

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional; real environment variables win.
    let dotenv_loaded = dotenvy::dotenv().is_ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if dotenv_loaded {
        tracing::debug!("Loaded .env");
    }

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every run succeeded.
async fn run() -> anyhow::Result<bool> {
    let config = TriageConfig::from_env().context("invalid configuration")?;

    eprintln!("📬 mail-triage v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "   Model: {} ({})",
        config.llm.model,
        config.llm.backend.as_str()
    );
    eprintln!(
        "   Rules: {}",
        if config.rules_enabled { "on" } else { "off" }
    );

    let llm = create_provider(&config.llm).context("failed to create LLM provider")?;
    let notifier = Arc::new(ConsoleNotifier::stdout(&config.prompts.reviewer));
    let workflow = Workflow::from_config(&config, llm, notifier)
        .context("invalid MAIL_TRIAGE_TRUSTED_SENDERS pattern")?;

    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();

    if paths.is_empty() {
        let email = intake::read_email_stdin().await?;
        workflow.run(email).await?;
        return Ok(true);
    }

    let mut all_ok = true;
    let mut emails = Vec::with_capacity(paths.len());
    for path in &paths {
        match intake::read_email_file(path).await {
            Ok(email) => emails.push(email),
            Err(e) => {
                eprintln!("Error: {e}");
                all_ok = false;
            }
        }
    }

    for result in workflow.run_batch(emails).await {
        if let Err(e) = result {
            eprintln!("Error: {e}");
            all_ok = false;
        }
    }
    Ok(all_ok)
}
