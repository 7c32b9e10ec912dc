//! The `devassess status` command.

use std::path::PathBuf;

use anyhow::Result;

use devassess_core::clock::{format_hms, Clock};
use devassess_core::model::SessionInfo;

use super::Context;

pub fn execute(json: bool, config: Option<PathBuf>) -> Result<()> {
    let ctx = Context::open(config.as_deref())?;
    let Some(candidate) = ctx.session.candidate() else {
        if json {
            println!("null");
        } else {
            println!("No active session. Run: devassess login");
        }
        return Ok(());
    };
    let info = SessionInfo::from_candidate(&candidate, ctx.session.clock().now());
    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }
    let state = ctx.session.state();

    println!("Candidate:  {} <{}>", info.name, info.email);
    match &state.assessment {
        Some(a) => println!("Assessment: {} ({})", a.title, info.assessment_id),
        None => println!("Assessment: {}", info.assessment_id),
    }
    println!(
        "Started:    {}",
        info.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("Time limit: {} min", info.time_limit);
    if info.is_expired {
        println!("Remaining:  expired");
    } else {
        println!(
            "Remaining:  {}",
            format_hms(Some(info.remaining_time_seconds))
        );
    }
    if !state.challenges.is_empty() {
        println!(
            "Completed:  {} of {}",
            state.completed_count(),
            state.challenges.len()
        );
    }

    Ok(())
}
