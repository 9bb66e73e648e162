// dqd/src/commands/plan.rs
//
// USE CASE: Show what a run would execute, without touching the database.

use comfy_table::{Table, presets::UTF8_FULL};
use std::path::PathBuf;

use dqd_core::application::expand;
use dqd_core::domain::ports::CatalogueLoader;
use dqd_core::infrastructure::config::catalogue_loader;

use super::{exit_with, load_config};

pub fn execute(project_dir: PathBuf, exclude: Vec<String>) -> anyhow::Result<()> {
    let config = load_config(&project_dir, exclude)?;
    let loader = catalogue_loader(&project_dir, &config.catalogue_path);

    let catalogue = match loader.load() {
        Ok(c) => c,
        Err(e) => exit_with("Could not load the catalogue", e),
    };
    let batches = match expand(&catalogue, &config.engine) {
        Ok(b) => b,
        Err(e) => exit_with("Catalogue integrity error", e.into()),
    };

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["#", "Check", "Level", "Category", "Instances"]);
    for (i, batch) in batches.iter().enumerate() {
        table.add_row(vec![
            (i + 1).to_string(),
            batch.check.check_name.clone(),
            batch.check.check_level.clone(),
            batch.check.kahn_category.clone(),
            batch.len().to_string(),
        ]);
    }

    let total: usize = batches.iter().map(|b| b.len()).sum();
    println!("📝 Execution Plan for {}", config.name);
    println!("{table}");
    println!(
        "   {} checks, {} instances ({} tables excluded)",
        batches.len(),
        total,
        config.engine.tables_to_exclude.len()
    );
    Ok(())
}
