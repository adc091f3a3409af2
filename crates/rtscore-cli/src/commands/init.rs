//! The `rtscore init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("rtscore.toml").exists() {
        println!("rtscore.toml already exists, skipping.");
    } else {
        std::fs::write("rtscore.toml", SAMPLE_CONFIG)?;
        println!("Created rtscore.toml");
    }

    std::fs::create_dir_all("drill-sets")?;
    let example_path = std::path::Path::new("drill-sets/example.toml");
    if example_path.exists() {
        println!("drill-sets/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_DRILL_SET)?;
        println!("Created drill-sets/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Record transcripts for the drills in drill-sets/example.toml");
    println!("  2. Run: rtscore validate --drill-set drill-sets/example.toml");
    println!("  3. Run: rtscore run --drill-set drill-sets/example.toml");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# rtscore configuration

# trainee = "${USER}"
parallelism = 4
feedback_timeout_secs = 20
max_feedback_retries = 2
retry_delay_ms = 500

[defaults.easy]
wer_threshold = 40.0
filler_penalty = 0.5
max_allowed_fillers = 3
pause_tolerance = 3.0

[defaults.medium]
wer_threshold = 25.0
filler_penalty = 1.0
max_allowed_fillers = 2
pause_tolerance = 2.0

[defaults.hard]
wer_threshold = 15.0
filler_penalty = 2.0
max_allowed_fillers = 0
pause_tolerance = 1.0
"#;

const EXAMPLE_DRILL_SET: &str = r#"[drill_set]
id = "example"
name = "Example Drill Set"
description = "Two ground movement calls to get started"
default_difficulty = "easy"

[[drills]]
id = "fuel-run"
name = "Request fuel run"
description = "You are REDCROSS 1 at the medical bay and need to reach the fuel area."
expected = "SHEPHARD, REDCROSS 1, at Medical Bay, request clearance to proceed to Fuel Area via Service Road ONE."
transcript = "Shepherd, um, Red Cross one, at medical bay, request clearance to proceed to fuel area via service road one."
tags = ["clearance"]

[drills.context]
expected_receiver = "SHEPHARD"
expected_sender = "REDCROSS 1"

[[drills]]
id = "runway-crossing"
name = "Request runway crossing"
description = "You are UNIT 4 holding short of the runway."
expected = "TOWER, UNIT 4, holding at Taxiway B, request cross Runway 27."
difficulty = "medium"
tags = ["runway"]

[drills.context]
expected_receiver = "TOWER"
expected_sender = "UNIT 4"
"#;
