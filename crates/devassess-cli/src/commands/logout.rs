//! The `devassess logout` command.

use std::path::PathBuf;

use anyhow::Result;

use super::Context;

pub fn execute(config: Option<PathBuf>) -> Result<()> {
    let ctx = Context::open(config.as_deref())?;
    match ctx.session.candidate() {
        Some(candidate) => {
            ctx.session.logout();
            println!("Logged out {}", candidate.email);
        }
        None => println!("No active session."),
    }
    Ok(())
}
