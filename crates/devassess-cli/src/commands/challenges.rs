//! The `devassess challenges` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use devassess_core::clock::format_hms;
use devassess_core::model::Challenge;
use devassess_core::routes::Route;
use devassess_core::AssessmentState;

use super::Context;

pub async fn execute(assessment: Option<String>, config: Option<PathBuf>) -> Result<()> {
    let ctx = Context::open(config.as_deref())?;
    let assessment_id = ctx.assessment_id(assessment);
    ctx.enter(&Route::challenges(&assessment_id))?;

    let assessment = match ctx.session.state().assessment {
        Some(a) if a.id == assessment_id => a,
        _ => ctx.session.load_assessment(&assessment_id).await?,
    };
    let challenges = ctx.session.load_challenges().await?;
    let state = ctx.session.state();

    println!("{}", assessment.title);
    if !assessment.description.is_empty() {
        println!("{}", assessment.description);
    }
    println!();

    if challenges.is_empty() {
        println!("No challenges available for this assessment.");
        return Ok(());
    }
    print_table(&challenges, &state);

    println!(
        "\nCompleted {} of {}",
        state.completed_count(),
        challenges.len()
    );
    println!(
        "Time remaining: {}",
        format_hms(ctx.session.remaining_seconds())
    );

    Ok(())
}

fn print_table(challenges: &[Challenge], state: &AssessmentState) {
    let mut table = Table::new();
    table.set_header(vec!["#", "ID", "Title", "Type", "Time", "Status"]);

    for (i, challenge) in challenges.iter().enumerate() {
        let time = challenge
            .time_limit
            .map(|m| format!("{m} min"))
            .unwrap_or_else(|| "-".to_string());
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&challenge.id),
            Cell::new(&challenge.title),
            Cell::new(challenge.kind()),
            Cell::new(time),
            Cell::new(status_label(state, &challenge.id)),
        ]);
    }

    println!("{table}");
}

fn status_label(state: &AssessmentState, challenge_id: &str) -> &'static str {
    if state.is_completed(challenge_id) {
        "Completed"
    } else if state.submission(challenge_id).is_some() {
        "Draft saved"
    } else {
        "Not started"
    }
}
