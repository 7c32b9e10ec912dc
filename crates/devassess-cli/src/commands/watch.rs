//! The `devassess watch` command.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::oneshot;

use devassess_core::clock::{format_hms, Countdown};
use devassess_core::ApiError;

use super::{session_error, Context};

pub async fn execute(auto_submit: bool, config: Option<PathBuf>) -> Result<()> {
    let ctx = Context::open(config.as_deref())?;
    let candidate = ctx
        .session
        .candidate()
        .ok_or_else(|| session_error(ApiError::NoSession))?;

    let (expired_tx, expired_rx) = oneshot::channel::<()>();
    let period = Duration::from_millis(ctx.config.tick_interval_ms.max(1));
    let countdown = Countdown::spawn(
        ctx.session.clock().clone(),
        candidate.started_at,
        candidate.time_limit,
        period,
        |remaining| {
            print!("\rTime remaining: {}", format_hms(Some(remaining)));
            let _ = std::io::stdout().flush();
        },
        move || async move {
            let _ = expired_tx.send(());
        },
    );

    tokio::select! {
        _ = expired_rx => {}
        _ = tokio::signal::ctrl_c() => {
            countdown.cancel();
            println!("\nStopped watching. The timer keeps running.");
            return Ok(());
        }
    }

    println!("\nTime is up.");
    if !auto_submit {
        println!("Run: devassess finalize");
        return Ok(());
    }

    let drafts = ctx.session.state().submissions.len();
    println!("Submitting saved drafts ({drafts}) and finalizing...");
    let receipt = ctx.session.auto_submit_on_expiry().await?;
    println!("{} (submission {})", receipt.message, receipt.submission_id);

    Ok(())
}
