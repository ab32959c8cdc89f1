//! Check command implementation.

use crate::cli::CheckArgs;
use crate::config::AppConfig;
use crate::error::Result;
use crate::output::Formatter;
use crate::providers::build_service;
use inbox_domain::RawNote;
use inbox_gatekeeper::Gatekeeper;
use inbox_processor::{MetadataProcessor, RankingProcessor};
use std::sync::Arc;

/// Execute the check command.
///
/// Routes, ranks and gates one note. Nothing is enriched or stored.
pub async fn execute_check(args: CheckArgs, config: &AppConfig, formatter: &Formatter) -> Result<()> {
    let inbox = &config.inbox;
    let service = build_service(config)?;

    let metadata = MetadataProcessor::new(
        Arc::clone(&service),
        inbox.metadata.clone(),
        inbox.retry.clone(),
    );
    let ranking = RankingProcessor::new(service, inbox.ranking.clone(), inbox.retry.clone());
    let gatekeeper = Gatekeeper::new(inbox.gate);

    let note = RawNote::new(crate::input::content_id(&args.text), args.text, 0);
    let classified = metadata
        .classify(&note, &inbox.pipeline.known_projects)
        .await?;
    let ranked = ranking.rank(&classified).await?;
    let decision = gatekeeper.evaluate(&ranked);

    println!("{}", formatter.format_check(&ranked, &decision)?);
    Ok(())
}
