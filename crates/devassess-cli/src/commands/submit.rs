//! The `devassess submit` command.

use std::path::PathBuf;

use anyhow::Result;

use devassess_core::challenge::SubmitMode;
use devassess_core::model::Answer;
use devassess_core::routes::Route;
use devassess_core::scoring::score_answers;
use devassess_core::traits::AlwaysConfirm;
use devassess_core::{Prompter, SubmitOutcome};

use super::show::print_score;
use super::{session_error, Context, PayloadArgs, StdinPrompter};

pub async fn execute(
    challenge_id: String,
    payload: PayloadArgs,
    yes: bool,
    config: Option<PathBuf>,
) -> Result<()> {
    let ctx = Context::open(config.as_deref())?;
    let assessment_id = ctx.assessment_id(None);
    ctx.enter(&Route::challenge(&assessment_id, &challenge_id))?;

    let opened = ctx
        .session
        .open_challenge(&challenge_id)
        .await
        .map_err(session_error)?;
    let answer = if payload.is_empty() {
        opened.answer
    } else {
        payload.apply(&opened.challenge, opened.answer)?
    };

    let prompter: &dyn Prompter = if yes { &AlwaysConfirm } else { &StdinPrompter };
    let outcome = ctx
        .session
        .submit_challenge(&challenge_id, answer.clone(), SubmitMode::Manual, prompter)
        .await
        .map_err(session_error)?;

    let receipt = match outcome {
        SubmitOutcome::Cancelled => {
            println!("Submission cancelled.");
            return Ok(());
        }
        SubmitOutcome::Submitted(receipt) => receipt,
    };
    println!("{} (submission {})", receipt.message, receipt.submission_id);

    if let Answer::MultipleChoice { answers } = &answer {
        print_score(&score_answers(opened.challenge.questions(), answers));
    }

    let state = ctx.session.state();
    if !state.challenges.is_empty() && state.completed_count() == state.challenges.len() {
        println!("\nAll challenges completed. Run: devassess finalize");
    }

    Ok(())
}
