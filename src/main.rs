use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};

use campus_assess::api::{AssessmentApi, HttpAssessmentApi};
use campus_assess::config::Config;
use campus_assess::errors::SessionResult;
use campus_assess::ledger::JsonFileLedger;
use campus_assess::models::domain::{AttemptResult, Phase};
use campus_assess::models::dto::GenerateAssessmentRequest;
use campus_assess::services::{AssessmentSession, SubmitOutcome};

/// Terminal driver for one assessment attempt.
///
///   campus-assess <domain> <difficulty> [question-count]   AI-generated
///   campus-assess                                          first assigned
#[tokio::main]
async fn main() -> SessionResult<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let api: Arc<dyn AssessmentApi> = Arc::new(HttpAssessmentApi::new(&config)?);
    let ledger = Arc::new(JsonFileLedger::open(&config.ledger_path)?);

    let mut session = AssessmentSession::new(api.clone(), ledger);

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [domain, difficulty, rest @ ..] => {
            let number_of_questions = rest
                .first()
                .and_then(|n| n.parse().ok())
                .unwrap_or(5);
            session
                .generate(GenerateAssessmentRequest {
                    domain: domain.clone(),
                    difficulty: difficulty.clone(),
                    number_of_questions,
                })
                .await?;
        }
        _ => {
            let mut assigned = api.fetch_assigned().await?;
            if assigned.is_empty() {
                println!("No assigned assessments.");
                return Ok(());
            }
            session.load_assigned(assigned.remove(0))?;
        }
    }

    let assessment = session.assessment().expect("assessment was just loaded");
    println!(
        "'{}': {} questions, {} seconds. Press enter to start.",
        assessment.title,
        assessment.questions.len(),
        assessment.duration_seconds
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let _ = lines.next_line().await;
    session.start().await?;
    render_question(&session);

    let mut awaiting_confirmation = false;
    while session.phase() == Phase::Active || session.phase() == Phase::Submitting {
        tokio::select! {
            ticked = session.next_tick() => {
                // No timer means the attempt left Active for good.
                if !ticked {
                    break;
                }
                match session.tick().await {
                    Ok(Some(SubmitOutcome::Completed)) => break,
                    Ok(_) => {
                        if session.remaining_seconds() % 30 == 0 {
                            println!("[{}s remaining]", session.remaining_seconds());
                        }
                    }
                    Err(e) => eprintln!("Submission failed: {}", e),
                }
            }
            line = lines.next_line() => {
                let Ok(Some(input)) = line else { break };
                if let Err(e) = handle_input(
                    &mut session,
                    input.trim(),
                    &mut awaiting_confirmation,
                ).await {
                    eprintln!("{}", e);
                }
            }
        }
    }

    if let Some(result) = session.result() {
        render_result(result);
    }
    Ok(())
}

async fn handle_input(
    session: &mut AssessmentSession,
    input: &str,
    awaiting_confirmation: &mut bool,
) -> SessionResult<()> {
    if *awaiting_confirmation {
        *awaiting_confirmation = false;
        if input.eq_ignore_ascii_case("yes") {
            session.submit_confirmed().await?;
        } else {
            println!("Submission cancelled, timer still running.");
        }
        return Ok(());
    }

    match input {
        "n" => {
            session.next_question()?;
            render_question(session);
        }
        "p" => {
            session.previous_question()?;
            render_question(session);
        }
        "submit" => match session.submit().await? {
            SubmitOutcome::ConfirmationRequired(n) => {
                println!("{} unanswered, submit anyway? (yes/no)", n);
                *awaiting_confirmation = true;
            }
            _ => {}
        },
        other => match other.parse::<usize>() {
            Ok(choice) if choice >= 1 => {
                session.select_answer(choice - 1)?;
                session.next_question()?;
                render_question(session);
            }
            _ => println!("Commands: 1-4 answer, n/p navigate, submit"),
        },
    }
    Ok(())
}

fn render_question(session: &AssessmentSession) {
    let Some(question) = session.current_question() else {
        return;
    };
    let index = session.attempt().current_question_index;
    println!(
        "\nQ{} of {}: {}",
        index + 1,
        session.attempt().answers.len(),
        question.text
    );
    for (i, option) in question.options.iter().enumerate() {
        println!("  {}. {}", i + 1, option);
    }
}

fn render_result(result: &AttemptResult) {
    println!(
        "\nScore: {}/{} ({}%)",
        result.score,
        result.total_marks,
        result.percentage_display()
    );
    for (i, feedback) in result.feedback.iter().enumerate() {
        let marker = if feedback.is_correct { "+" } else { "-" };
        println!("{} Q{}: {}", marker, i + 1, feedback.question_text);
        println!("    your answer: {}", feedback.selected_option_text);
        if !feedback.is_correct {
            println!("    correct: {}", feedback.correct_option_text);
        }
        if !feedback.explanation.is_empty() {
            println!("    {}", feedback.explanation);
        }
    }
}
