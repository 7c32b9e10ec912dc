//! The `devassess draft` command.

use std::path::PathBuf;

use anyhow::Result;

use devassess_core::routes::Route;

use super::{session_error, Context, PayloadArgs};

pub async fn execute(
    challenge_id: String,
    payload: PayloadArgs,
    config: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        !payload.is_empty(),
        "nothing to save; pass --file, --answer or --choice"
    );
    let ctx = Context::open(config.as_deref())?;
    let assessment_id = ctx.assessment_id(None);
    ctx.enter(&Route::challenge(&assessment_id, &challenge_id))?;

    let opened = ctx
        .session
        .open_challenge(&challenge_id)
        .await
        .map_err(session_error)?;
    anyhow::ensure!(
        !opened.completed,
        "challenge {challenge_id} has already been submitted"
    );

    let answer = payload.apply(&opened.challenge, opened.answer)?;
    ctx.session.save_draft(&challenge_id, answer)?;
    println!("Draft saved for {challenge_id}");

    Ok(())
}
