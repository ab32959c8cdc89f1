//! Run command implementation.

use crate::cli::RunArgs;
use crate::config::AppConfig;
use crate::error::{CliError, Result};
use crate::input::{parse_notes, read_source};
use crate::output::Formatter;
use crate::providers::{build_service, build_store};
use inbox_pipeline::Pipeline;
use tracing::{info, warn};

/// Execute the run command.
pub async fn execute_run(args: RunArgs, config: &AppConfig, formatter: &Formatter) -> Result<()> {
    let notes = parse_notes(&read_source(&args.input)?)?;

    let mut inbox = config.inbox.clone();
    if let Some(concurrency) = args.concurrency {
        if concurrency == 0 {
            return Err(CliError::InvalidInput(
                "Concurrency must be greater than 0".to_string(),
            ));
        }
        inbox.pipeline.concurrency = concurrency;
    }

    let service = build_service(config)?;
    let store = build_store(config, args.dry_run)?;
    let pipeline = Pipeline::new(service, store, &inbox)?;

    info!(notes = notes.len(), concurrency = inbox.pipeline.concurrency, "Starting batch");
    let result = pipeline
        .run_until(notes, async {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling batch");
            }
        })
        .await;

    println!("{}", formatter.format_result(&result)?);
    if result.metrics.cancelled > 0 {
        eprintln!(
            "{}",
            formatter.warning(&format!("{} note(s) cancelled", result.metrics.cancelled))
        );
    }
    if args.dry_run {
        eprintln!("{}", formatter.info("Dry run: nothing was written to the task store"));
    }
    Ok(())
}
