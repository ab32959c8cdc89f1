//! Inbox Agent CLI - turn captured notes into ranked tasks.

use clap::Parser;
use inbox_cli::cli::ConfigAction;
use inbox_cli::commands;
use inbox_cli::{AppConfig, Cli, Command, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(&cli);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing based on CLI flags.
fn init_tracing(cli: &Cli) {
    let filter = match cli.verbose {
        0 => "warn,inbox=info",
        1 => "info,inbox=debug",
        _ => "debug,inbox=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    if cli.log_json {
        builder.json().init();
    } else {
        builder.with_target(false).init();
    }
}

async fn run(cli: Cli) -> inbox_cli::Result<()> {
    // `config init` must work even when the existing file is broken
    let config = match &cli.command {
        Command::Config(args) if matches!(args.action, ConfigAction::Init { .. }) => {
            AppConfig::default()
        }
        _ => AppConfig::load(cli.config.as_deref())?,
    };

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Command::Run(args) => commands::execute_run(args, &config, &formatter).await?,
        Command::Check(args) => commands::execute_check(args, &config, &formatter).await?,
        Command::Tasks(args) => commands::execute_tasks(args, &config, &formatter).await?,
        Command::Config(args) => {
            commands::execute_config(args, &config, cli.config.as_deref(), &formatter).await?
        }
    }

    Ok(())
}
