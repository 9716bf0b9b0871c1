use anyhow::{bail, Context, Result};
use console::{style, Emoji};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::Confirm;
use std::time::Duration;

use crate::config::AppConfig;
use crate::services::provisioning::{inspect, ClearOutcome, Provisioner};
use crate::services::qdrant::{QdrantClient, RetryConfig};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[X] ");
static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");
static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "");

/// Ask before destroying stored vectors. Non-interactive runs need `--yes`.
fn confirm_provision(collection: &str, url: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        bail!("Refusing to reprovision '{collection}' without --yes in a non-interactive session");
    }

    let answer = Confirm::new(&format!(
        "Delete and recreate collection '{collection}' at {url}? All stored vectors will be lost."
    ))
    .with_default(false)
    .prompt()?;

    Ok(answer)
}

pub async fn handle_provision_command(config: &AppConfig, yes: bool) -> Result<()> {
    let qdrant = &config.qdrant;

    if !yes && !confirm_provision(&qdrant.collection, &qdrant.url)? {
        println!("{}", style("Aborted. Nothing was changed.").dim());
        return Ok(());
    }

    let client = QdrantClient::new(qdrant).context("Invalid vector store configuration")?;
    let lock_dir = config.lock_dir()?;
    let mut provisioner = Provisioner::new(&client, qdrant)
        .with_retry(RetryConfig::from(&config.retry))
        .with_lock(&lock_dir)
        .context("Provisioning not started")?;

    println!(
        "{}{} {} ({} dims, {})",
        ROCKET,
        style("Provisioning").bold(),
        style(&qdrant.collection).cyan(),
        qdrant.vector_size,
        qdrant.distance
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    spinner.set_message(format!("Checking vector store health at {}", qdrant.url));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let health = provisioner.check_health().await;
    spinner.finish_and_clear();
    if let Err(e) = health {
        println!("{}{}", CROSS, style("Vector store health check failed").red());
        return Err(e).context("Provisioning aborted before any change");
    }
    println!("{}Vector store is healthy", CHECK);

    match provisioner.clear_existing().await? {
        ClearOutcome::Deleted => println!("{}Deleted existing collection", CHECK),
        ClearOutcome::NotPresent => println!("{}No existing collection", CHECK),
        ClearOutcome::Failed { message } => println!(
            "{}Could not delete existing collection, continuing: {}",
            WARNING,
            style(message).dim()
        ),
    }

    if let Err(e) = provisioner.create().await {
        println!("{}{}", CROSS, style("Collection creation failed").red());
        return Err(e).context(format!("Failed to create collection '{}'", qdrant.collection));
    }
    println!(
        "{}Created collection {}",
        CHECK,
        style(&qdrant.collection).green().bold()
    );

    Ok(())
}

pub async fn handle_inspect_command(config: &AppConfig) -> Result<()> {
    let qdrant = &config.qdrant;
    let client = QdrantClient::new(qdrant).context("Invalid vector store configuration")?;

    let report = inspect(&client, qdrant).await.map_err(|e| {
        let message = e.user_message();
        anyhow::Error::new(e).context(message)
    })?;

    println!("{} at {}", style(&report.collection).bold(), style(&qdrant.url).dim());

    if !report.exists() {
        println!("  {}{}", CROSS, style("does not exist").red());
    } else {
        if let Some(params) = report.vector_params {
            println!("  size: {}, distance: {}", params.size, params.distance);
        } else {
            println!("  {}", style("named vectors (not a single unnamed vector)").yellow());
        }
        if let Some(points) = report.points_count {
            println!("  points: {points}");
        }
        if let Some(status) = &report.status {
            println!("  status: {status}");
        }

        if report.matches_expected() {
            println!("  {}matches expected configuration", CHECK);
        } else {
            println!(
                "  {}expected size {} with {} distance",
                WARNING, report.expected.size, report.expected.distance
            );
        }
    }

    println!("All collections: {}", report.all_collections.join(", "));
    Ok(())
}
