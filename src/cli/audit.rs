use anyhow::{Context, Result};
use chrono::Local;
use console::{style, Emoji};
use std::path::Path;

use crate::config::AppConfig;
use crate::database::{DatabaseManager, ProductRepository};
use crate::models::load_dump;
use crate::services::audit::{find_duplicate_reviews, find_missing_products, render_insert_sql};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static MAGNIFYING_GLASS: Emoji<'_, '_> = Emoji("🔍 ", "");
static MEMO: Emoji<'_, '_> = Emoji("📝 ", "");

const EXAMPLE_LIMIT: usize = 5;
const PREVIEW_CHARS: usize = 50;

pub async fn handle_duplicates_command(dump: &Path) -> Result<()> {
    let products =
        load_dump(dump).with_context(|| format!("Failed to read dump: {}", dump.display()))?;
    let report = find_duplicate_reviews(&products);

    println!("Total reviews:     {}", style(report.total_reviews).bold());
    println!("Unique reviews:    {}", style(report.unique_reviews).bold());
    println!("Redundant reviews: {}", style(report.redundant_reviews()).bold());
    println!("Duplicate groups:  {}", style(report.groups.len()).bold());

    if !report.has_duplicates() {
        println!("{}No duplicates", CHECK);
        return Ok(());
    }

    println!();
    println!("Examples (first {EXAMPLE_LIMIT}):");
    for (i, group) in report.groups.iter().take(EXAMPLE_LIMIT).enumerate() {
        let preview: String = group.key.contents.chars().take(PREVIEW_CHARS).collect();
        println!("{}. Product: {}", i + 1, style(&group.key.product_no).cyan());
        println!("   Content: {preview}...");
        println!("   Date: {}", group.key.registered_at);
        println!("   Occurrences: {}", style(group.occurrences).yellow());
    }

    Ok(())
}

pub async fn handle_missing_products_command(
    config: &AppConfig,
    dump: &Path,
    output: &Path,
) -> Result<()> {
    let products =
        load_dump(dump).with_context(|| format!("Failed to read dump: {}", dump.display()))?;
    println!("Dump products: {}", products.len());

    let db = DatabaseManager::connect(&config.database)
        .await
        .context("Failed to connect to PostgreSQL")?;
    let existing = ProductRepository::new(&db)
        .product_nos()
        .await
        .context("Failed to read existing products")?;
    db.close().await;
    println!("Database products: {}", existing.len());

    println!("{}Looking for missing products...", MAGNIFYING_GLASS);
    let missing = find_missing_products(&products, &existing);
    if missing.is_empty() {
        println!("{}Every dump product is in the database", CHECK);
        return Ok(());
    }

    for (i, product) in missing.iter().enumerate() {
        println!("{:3}. [{}] {}", i + 1, style(&product.product_no).cyan(), product.name);
    }

    let sql = render_insert_sql(&missing, Local::now());
    std::fs::write(output, sql)
        .with_context(|| format!("Failed to write SQL script: {}", output.display()))?;

    println!();
    println!(
        "{}Wrote {} INSERT statement(s) to {}",
        MEMO,
        missing.len(),
        style(output.display()).green()
    );
    println!(
        "  Review it, then apply with: {}",
        style(format!(
            "psql {} < {}",
            config.database.display_url(),
            output.display()
        ))
        .cyan()
    );

    Ok(())
}
