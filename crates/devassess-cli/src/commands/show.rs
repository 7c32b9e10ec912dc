//! The `devassess show` command.

use std::path::PathBuf;

use anyhow::Result;

use devassess_core::model::{Answer, Challenge};
use devassess_core::routes::Route;
use devassess_core::scoring::{score_answers, ScoreSummary};

use super::{session_error, Context};

pub async fn execute(challenge_id: String, config: Option<PathBuf>) -> Result<()> {
    let ctx = Context::open(config.as_deref())?;
    let assessment_id = ctx.assessment_id(None);
    ctx.enter(&Route::challenge(&assessment_id, &challenge_id))?;

    let opened = ctx
        .session
        .open_challenge(&challenge_id)
        .await
        .map_err(session_error)?;
    let challenge = &opened.challenge;

    println!("{} ({})", challenge.title, challenge.id);
    match challenge.time_limit {
        Some(minutes) => println!("Type: {} | Time: {minutes} min", challenge.kind()),
        None => println!("Type: {}", challenge.kind()),
    }
    if opened.completed {
        println!("Status: submitted (read-only)");
    }
    if !challenge.description.is_empty() {
        println!("\n{}", challenge.description);
    }
    if !challenge.instructions.is_empty() {
        println!("\nInstructions:\n{}", challenge.instructions);
    }

    print_answer(challenge, &opened.answer);

    if opened.completed {
        if let Answer::MultipleChoice { answers } = &opened.answer {
            print_score(&score_answers(challenge.questions(), answers));
        }
    }

    Ok(())
}

fn print_answer(challenge: &Challenge, answer: &Answer) {
    match answer {
        Answer::Code { files, language } => {
            println!("\nLanguage: {language}");
            for (path, content) in files {
                println!("\n--- {path} ---");
                println!("{content}");
            }
        }
        Answer::OpenEnded { answer } => {
            println!("\nAnswer:");
            if answer.trim().is_empty() {
                println!("(empty)");
            } else {
                println!("{answer}");
            }
        }
        Answer::MultipleChoice { answers } => {
            for (i, question) in challenge.questions().iter().enumerate() {
                println!("\n{}. [{}] {}", i + 1, question.id, question.question);
                let selected = answers.get(&question.id);
                for option in &question.options {
                    let mark = if selected == Some(&option.id) { "x" } else { " " };
                    println!("   [{mark}] {}) {}", option.id, option.text);
                }
            }
            println!(
                "\nAnswered {} of {}",
                answers.len(),
                challenge.questions().len()
            );
        }
    }
}

/// Print the local score of a multiple-choice submission.
pub fn print_score(summary: &ScoreSummary) {
    if summary.total_questions == 0 {
        return;
    }
    println!(
        "\nScore: {}/{} ({}%)",
        summary.correct_count, summary.total_questions, summary.percentage
    );
    for result in &summary.results {
        let verdict = if result.is_correct { "correct" } else { "wrong" };
        let selected = result.selected.as_deref().unwrap_or("-");
        println!(
            "  {}: {selected} ({verdict}, answer {})",
            result.question_id, result.correct_answer
        );
        if let Some(explanation) = &result.explanation {
            println!("     {explanation}");
        }
    }
}
