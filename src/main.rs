use clap::Parser;
use colored::*;
use github_star_sync::cli::Cli;
use github_star_sync::github::GitHubClient;
use github_star_sync::sync::run_sync;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Credential check happens before touching the catalog
    let (config, token) = cli.into_config()?;

    println!("{}", "GitHub Star Sync".bold().green());
    println!("{}\n", "=".repeat(50).dimmed());

    if config.dry_run {
        println!("{}", "Dry run: no files will be written".yellow());
    }

    let client = GitHubClient::with_endpoint(token, config.api_url.clone())?;
    let summary = run_sync(&config, &client).await?;

    println!("\n📊 Summary:");
    println!("Projects scanned: {} ({} skipped)", summary.scanned, summary.skipped_descriptors);
    println!("Batches: {} ({} failed)", summary.batches, summary.failed_batches);
    println!(
        "{} updated, {} unchanged, {} write failures",
        summary.updated.to_string().green(),
        summary.unchanged,
        summary.failed_descriptors
    );

    Ok(())
}
