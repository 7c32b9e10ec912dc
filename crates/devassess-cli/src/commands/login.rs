//! The `devassess login` command.

use std::path::PathBuf;

use anyhow::Result;

use devassess_core::clock::format_hms;
use devassess_core::routes::Route;

use super::{session_error, Context};

pub async fn execute(
    name: String,
    email: String,
    assessment: Option<String>,
    config: Option<PathBuf>,
) -> Result<()> {
    let ctx = Context::open(config.as_deref())?;
    let assessment_id = assessment.unwrap_or_else(|| ctx.config.default_assessment_id.clone());

    let assessment = ctx.session.load_assessment(&assessment_id).await?;
    let candidate = ctx
        .session
        .authenticate_candidate(&name, &email, &assessment_id)
        .await
        .map_err(session_error)?;

    let next = Route::login(&assessment_id).resolve(|id| ctx.session.has_valid_session(id));
    ctx.session.load_challenges().await?;

    println!(
        "Logged in as {} <{}> for \"{}\"",
        candidate.name, candidate.email, assessment.title
    );
    println!(
        "Time remaining: {}",
        format_hms(ctx.session.remaining_seconds())
    );
    if let Route::ChallengeList { .. } = next {
        println!("\nNext: devassess challenges");
    }

    Ok(())
}
