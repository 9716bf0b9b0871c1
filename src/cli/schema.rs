use anyhow::{Context, Result};
use console::{style, Emoji};

use crate::config::AppConfig;
use crate::database::{ensure_schema, schema_status, DatabaseManager, SchemaOptions, TextSearchIndex};

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static CROSS: Emoji<'_, '_> = Emoji("✗ ", "[X] ");
static HAMMER: Emoji<'_, '_> = Emoji("🔨 ", "");

pub async fn handle_apply_command(
    config: &AppConfig,
    cascade_fk: bool,
    text_search: TextSearchIndex,
) -> Result<()> {
    println!(
        "{}{} {}",
        HAMMER,
        style("Applying schema to").bold(),
        style(config.database.display_url()).cyan()
    );

    let db = DatabaseManager::connect(&config.database)
        .await
        .context("Failed to connect to PostgreSQL")?;

    let options = SchemaOptions::default()
        .with_text_search(text_search)
        .with_cascade_foreign_key(cascade_fk)
        .with_schema(config.database.schema.clone());

    let report = ensure_schema(db.pool(), &options)
        .await
        .context("Failed to apply schema")?;

    for table in &report.created_tables {
        println!("  {}created table {}", CHECK, style(table).green());
    }
    for table in &report.existing_tables {
        println!("  {}table {} already exists", CHECK, style(table).dim());
    }
    for view in &report.views_replaced {
        println!("  {}view {}", CHECK, style(view).green());
    }
    println!(
        "  {} statements, text search: {}, cascade FK: {}",
        report.statements_executed,
        text_search,
        if cascade_fk { "on" } else { "off" }
    );

    db.close().await;
    Ok(())
}

pub async fn handle_status_command(config: &AppConfig) -> Result<()> {
    let db = DatabaseManager::connect(&config.database)
        .await
        .context("Failed to connect to PostgreSQL")?;

    let status = schema_status(db.pool())
        .await
        .context("Failed to read schema status")?;

    println!("{}", style(config.database.display_url()).bold());
    if let Some(schema) = db.schema() {
        println!("  schema: {}", style(schema).cyan());
    }

    println!();
    println!("Tables:");
    for (table, rows) in &status.tables {
        match rows {
            Some(count) => println!("  {}{:<28} {} rows", CHECK, table, style(count).green()),
            None => println!("  {}{:<28} {}", CROSS, table, style("missing").red()),
        }
    }

    println!("Views:");
    for (view, exists) in &status.views {
        if *exists {
            println!("  {}{}", CHECK, view);
        } else {
            println!("  {}{:<28} {}", CROSS, view, style("missing").red());
        }
    }

    println!(
        "Cascade foreign key: {}",
        if status.cascade_foreign_key {
            style("installed").yellow()
        } else {
            style("not installed").dim()
        }
    );

    db.close().await;
    Ok(())
}
