//! The `rtscore validate` command.

use std::path::PathBuf;

use anyhow::Result;

use rtscore_core::parser;

pub fn execute(drill_set_path: PathBuf) -> Result<()> {
    let sets = parser::load_drill_sets(&drill_set_path)?;
    anyhow::ensure!(
        !sets.is_empty(),
        "no drill sets found in {}",
        drill_set_path.display()
    );

    let mut total_warnings = 0;

    for set in &sets {
        println!("Drill set: {} ({} drills)", set.name, set.drills.len());

        let warnings = parser::validate_drill_set(set);
        for w in &warnings {
            let prefix = w
                .drill_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All drill sets valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
