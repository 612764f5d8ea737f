use crate::catalog;
use crate::error::Result;
use crate::github::StarSource;
use crate::models::{Descriptor, SyncOutcome, SyncSummary};
use colored::*;
use std::ops::Range;
use std::path::PathBuf;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};
use url::Url;

/// Upper bound on repositories per GraphQL request.
pub const MAX_BATCH_SIZE: usize = 50;

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub root: PathBuf,
    pub api_url: Url,
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub dry_run: bool,
}

/// Contiguous index ranges of at most `size` items covering `0..len`.
pub fn partition(len: usize, size: usize) -> Vec<Range<usize>> {
    let size = size.max(1);
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}

/// Compare one descriptor against its fetched count and persist a change.
pub fn apply_count(descriptor: &mut Descriptor, fetched: u64, dry_run: bool) -> SyncOutcome {
    if !descriptor.stars_differ(fetched) {
        return SyncOutcome::Unchanged(fetched);
    }

    let from = descriptor.stored_stars().and_then(|v| v.as_u64());
    if dry_run {
        return SyncOutcome::WouldUpdate { from, to: fetched };
    }

    descriptor.set_stars(fetched);
    match catalog::write_descriptor(descriptor) {
        Ok(()) => SyncOutcome::Updated { from, to: fetched },
        Err(e) => {
            error!(
                slug = %descriptor.slug,
                path = %descriptor.path.display(),
                error = %e,
                "Failed to write descriptor"
            );
            SyncOutcome::WriteFailed
        }
    }
}

fn report(slug: &str, outcome: &SyncOutcome) {
    let previous = |from: &Option<u64>| {
        from.map(|n| n.to_string()).unwrap_or_else(|| "none".to_string())
    };

    match outcome {
        SyncOutcome::Updated { from, to } => {
            println!(
                "  {} {}: {} → {}",
                "✅".green(),
                slug.bold(),
                previous(from),
                to.to_string().green()
            );
        }
        SyncOutcome::WouldUpdate { from, to } => {
            println!(
                "  {} {}: {} → {} (dry run)",
                "📝".yellow(),
                slug.bold(),
                previous(from),
                to.to_string().yellow()
            );
        }
        SyncOutcome::Unchanged(stars) => {
            println!("  {} {}: unchanged ({})", "·".dimmed(), slug, stars);
        }
        SyncOutcome::WriteFailed => {
            println!("  {} {}: write failed", "❌".red(), slug.bold());
        }
    }
}

/// Scan, load, query and rewrite the whole catalog.
///
/// Only an unreadable catalog root is returned as an error; every other
/// failure is logged and counted in the summary.
pub async fn run_sync(config: &SyncConfig, source: &dyn StarSource) -> Result<SyncSummary> {
    let slugs = catalog::scan_slugs(&config.root)?;
    let mut descriptors = catalog::load_descriptors(&config.root, &slugs);

    let mut summary = SyncSummary {
        scanned: slugs.len(),
        loaded: descriptors.len(),
        skipped_descriptors: slugs.len() - descriptors.len(),
        ..Default::default()
    };

    println!(
        "📊 Loaded {} of {} projects from {}",
        summary.loaded,
        summary.scanned,
        config.root.display()
    );

    let batches = partition(descriptors.len(), config.batch_size);
    summary.batches = batches.len();
    let total = batches.len();

    for (index, range) in batches.into_iter().enumerate() {
        let number = index + 1;
        let batch = &mut descriptors[range];
        println!("\n{} {}/{} ({} projects)", "Batch".bold().cyan(), number, total, batch.len());

        let resolved = source.fetch_batch(batch).await;
        match resolved {
            Ok(result) if result.counts.len() == batch.len() => {
                for (descriptor, fetched) in batch.iter_mut().zip(result.counts) {
                    let outcome = apply_count(descriptor, fetched, config.dry_run);
                    report(&descriptor.slug, &outcome);
                    summary.record(&outcome);
                }
            }
            Ok(result) => {
                error!(
                    batch = number,
                    expected = batch.len(),
                    got = result.counts.len(),
                    "Star source returned a misaligned batch, skipping"
                );
                summary.failed_batches += 1;
            }
            Err(e) => {
                error!(batch = number, error = %e, "Batch query failed, skipping");
                println!("  {} batch {} skipped: {}", "❌".red(), number, e);
                summary.failed_batches += 1;
            }
        }

        if number < total && !config.batch_delay.is_zero() {
            sleep(config.batch_delay).await;
        }
    }

    if summary.failed_batches > 0 {
        warn!(failed = summary.failed_batches, "Some batches were skipped");
    }
    info!(
        updated = summary.updated,
        unchanged = summary.unchanged,
        failed_batches = summary.failed_batches,
        "Star sync finished"
    );

    Ok(summary)
}
