//! The `devassess finalize` command.

use std::path::PathBuf;

use anyhow::Result;

use devassess_core::{ApiError, Prompter};

use super::{session_error, Context, StdinPrompter};

const CONFIRM_FINALIZE: &str =
    "Submit the whole assessment? You cannot change any answer afterwards.";

pub async fn execute(yes: bool, config: Option<PathBuf>) -> Result<()> {
    let ctx = Context::open(config.as_deref())?;
    if ctx.session.candidate().is_none() {
        return Err(session_error(ApiError::NoSession));
    }

    let state = ctx.session.state();
    if !state.challenges.is_empty() {
        println!(
            "Completed {} of {} challenges.",
            state.completed_count(),
            state.challenges.len()
        );
    }
    if !yes && !StdinPrompter.confirm(CONFIRM_FINALIZE) {
        println!("Finalization cancelled.");
        return Ok(());
    }

    let receipt = ctx.session.finalize_assessment().await?;
    println!("{} (submission {})", receipt.message, receipt.submission_id);

    Ok(())
}
