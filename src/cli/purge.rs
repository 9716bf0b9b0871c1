use anyhow::{Context, Result};
use chrono::NaiveDate;
use console::{style, Emoji};

use crate::config::AppConfig;
use crate::database::{preview_purge, purge_by_date, DatabaseManager, PurgeReport};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static WARNING: Emoji<'_, '_> = Emoji("⚠️  ", "[!] ");

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{raw}', expected YYYY-MM-DD"))
}

pub async fn handle_purge_command(config: &AppConfig, date: &str, dry_run: bool) -> Result<()> {
    let date = parse_date(date)?;

    let db = DatabaseManager::connect(&config.database)
        .await
        .context("Failed to connect to PostgreSQL")?;

    let report = if dry_run {
        preview_purge(db.pool(), date)
            .await
            .context("Failed to count rows for purge")?
    } else {
        purge_by_date(db.pool(), date)
            .await
            .with_context(|| format!("Failed to purge rows created on {date}"))?
    };

    print_report(&report);

    db.close().await;
    Ok(())
}

fn print_report(report: &PurgeReport) {
    let verb = if report.dry_run { "Would delete" } else { "Deleted" };
    let date = report
        .date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "-".to_string());

    if report.is_empty() {
        println!("{}Nothing created on {}", CHECK, style(date).cyan());
        return;
    }

    println!("{}{} rows created on {}:", CHECK, verb, style(&date).cyan());
    println!("  • {} reviews", style(report.reviews_deleted).bold());
    println!("  • {} products", style(report.products_deleted).bold());

    if report.cascaded_reviews > 0 {
        println!(
            "{}{} reviews from other dates are removed by the cascade foreign key",
            WARNING,
            style(report.cascaded_reviews).yellow().bold()
        );
    }
}
