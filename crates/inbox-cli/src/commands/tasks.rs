//! Tasks command implementation.

use crate::cli::TasksArgs;
use crate::config::AppConfig;
use crate::error::Result;
use crate::output::Formatter;
use crate::providers::open_store;
use inbox_domain::{TaskQuery, TaskStore};

/// Execute the tasks command.
pub async fn execute_tasks(args: TasksArgs, config: &AppConfig, formatter: &Formatter) -> Result<()> {
    let query = build_query(args);
    let store = open_store(config)?;
    let tasks = store.query(&query).await?;

    println!("{}", formatter.format_tasks(&tasks)?);
    Ok(())
}

fn build_query(args: TasksArgs) -> TaskQuery {
    TaskQuery {
        project: args.project,
        min_priority: args.min_priority.map(Into::into),
        limit: args.limit,
        ..Default::default()
    }
}
