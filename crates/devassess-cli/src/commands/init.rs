//! The `devassess init` command.

use std::path::Path;

use anyhow::Result;

use devassess_client::config::{starter_config, CONFIG_FILE};

pub fn execute() -> Result<()> {
    if Path::new(CONFIG_FILE).exists() {
        println!("{CONFIG_FILE} already exists, skipping.");
    } else {
        std::fs::write(CONFIG_FILE, starter_config())?;
        println!("Created {CONFIG_FILE}");
    }

    println!("\nNext steps:");
    println!("  1. Set backend and api_base_url in {CONFIG_FILE}");
    println!("  2. Run: devassess login --name \"Your Name\" --email you@example.com");
    println!("  3. Run: devassess challenges");

    Ok(())
}
