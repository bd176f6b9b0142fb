use colored::Colorize;
use docquiz_core::confetti::ConfettiOptions;
use docquiz_core::quiz::{
    parse_questions, AnswerMap, GradingResult, QuestionKind, QuizFeedback, QuizQuestion,
    QuizSession, ScoreTier, Verdict,
};
use docquiz_core::reward::{RewardOutcome, CELEBRATION_PARTICLES};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::api::ApiClient;
use crate::effects::{fire_confetti, NullSurface, RewardIndicator, TerminalSurface};
use crate::prelude::{eprintln, println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "quiz")]
#[command(about = "Generate and take document quizzes")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Generate a quiz from the document's summary
    #[clap(name = "generate")]
    Generate(GenerateOptions),

    /// Answer a document's quiz and submit it for grading
    #[clap(name = "take")]
    Take(TakeOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct GenerateOptions {
    /// Document ID
    pub id: String,

    /// Generate multiple choice questions only
    #[arg(long)]
    pub mcq: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct TakeOptions {
    /// Document ID
    pub id: String,

    /// JSON file mapping question index to answer, e.g. {"0": "Paris"}
    #[arg(short, long)]
    pub answers: Option<std::path::PathBuf>,

    /// Skip the celebration effect
    #[arg(long)]
    pub no_confetti: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let api = ApiClient::from_global(&global)?;

    match app.command {
        Commands::Generate(options) => generate(&api, options).await,
        Commands::Take(options) => take(&api, options).await,
    }
}

async fn generate(api: &ApiClient, options: GenerateOptions) -> Result<()> {
    let document = api.get_document(&options.id).await?;
    if !document.has_summary() {
        return Err(Error::Rejected(
            "Please generate a summary first before creating a quiz.".to_string(),
        )
        .into());
    }

    let spinner = new_spinner("Generating...");
    let result = api.generate_quiz(&options.id, options.mcq).await;
    spinner.finish_and_clear();

    let questions = parse_questions(&result?);
    log::info!(
        "Generated {} questions for document {}",
        questions.len(),
        options.id
    );

    if options.json {
        println!("{}", serde_json::to_string_pretty(&questions)?);
    } else {
        anstream::print!("{}", format_questions(&questions));
    }
    Ok(())
}

/// Read answers from a JSON object keyed by question index
fn load_answers(path: &std::path::Path) -> Result<AnswerMap> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read answers from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Answers in {} must map indices to strings", path.display()))
}

/// Accept either an option number (1-based) or the option text itself
fn resolve_choice(options: &[String], input: &str) -> String {
    input
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| options.get(i))
        .cloned()
        .unwrap_or_else(|| input.to_string())
}

async fn prompt(lines: &mut Lines<BufReader<Stdin>>, message: &str) -> Result<Option<String>> {
    anstream::print!("{message}");
    std::io::Write::flush(&mut std::io::stdout())?;
    Ok(lines.next_line().await?)
}

async fn answer_interactively(
    session: &mut QuizSession,
    lines: &mut Lines<BufReader<Stdin>>,
) -> Result<()> {
    let questions = session.questions().to_vec();
    for question in &questions {
        println!("{}", format_question(question));
        if !question.is_answerable() {
            continue;
        }

        loop {
            let Some(input) = prompt(lines, "> ").await? else {
                return Ok(());
            };
            let input = input.trim_end_matches(['\r', '\n']);
            if input.is_empty() {
                break;
            }

            let answer = match &question.kind {
                QuestionKind::MultipleChoice { options, .. } => resolve_choice(options, input),
                _ => input.to_string(),
            };
            if let Err(e) = question.check_choice(&answer) {
                eprintln!("{}", e.to_string().red());
                continue;
            }
            session.set_answer(question.index, answer)?;
            break;
        }
        println!();
    }
    Ok(())
}

/// Store answers from a file, returning the indices that had to be ignored
fn apply_answers_file(session: &mut QuizSession, path: &std::path::Path) -> Result<Vec<usize>> {
    let answers = load_answers(path)?;
    Ok(session.apply_answers(&answers)?)
}

/// Whether a reply to a yes/no prompt means yes. End of input means no.
fn confirmed(reply: Option<&str>) -> bool {
    reply
        .map(|r| r.trim().to_ascii_lowercase())
        .is_some_and(|r| r == "y" || r == "yes")
}

/// Balance after grading: the refreshed profile when it could be read, else
/// whatever the grading response reported.
fn balance_after(refreshed: Option<i64>, reported: Option<i64>) -> Option<i64> {
    refreshed.or(reported)
}

/// Reward signals for one submission. Without both snapshots there is no delta to show.
fn reward_for(before: Option<i64>, after: Option<i64>, percentage: f64) -> RewardOutcome {
    match (before, after) {
        (Some(before), Some(after)) => RewardOutcome::new(before, after, percentage),
        _ => RewardOutcome::new(0, 0, percentage),
    }
}

async fn current_balance(api: &ApiClient) -> Option<i64> {
    match api.profile().await {
        Ok(profile) => Some(profile.coins),
        Err(e) => {
            log::warn!("Could not read reward balance: {e}");
            None
        }
    }
}

/// Submit until it succeeds or the user gives up. Only interactive runs are asked to retry.
async fn submit(
    api: &ApiClient,
    session: &mut QuizSession,
    stdin: &mut Lines<BufReader<Stdin>>,
    interactive: bool,
) -> Result<GradingResult> {
    loop {
        let submission = session.begin_submit()?;
        let spinner = new_spinner("Submitting...");
        let response = api.save_score(&submission).await;
        spinner.finish_and_clear();

        match response {
            Ok(result) => return Ok(result),
            Err(e) => {
                session.fail_submit();
                eprintln!("{}", e.to_string().red());
                if !interactive {
                    return Err(e);
                }
                let reply = prompt(stdin, "Retry submission? [y/N] ").await?;
                if !confirmed(reply.as_deref()) {
                    return Err(e);
                }
            }
        }
    }
}

/// Show the indicator and the celebration together and wait for both to finish
async fn play_reward(reward: RewardOutcome, confetti_enabled: bool) -> Result<()> {
    let text = reward.indicator_text();

    let (indicator, confetti) = if reward.celebrate && confetti_enabled {
        let options = ConfettiOptions::with_count(CELEBRATION_PARTICLES)?;
        match TerminalSurface::detect() {
            Some(surface) => {
                // The overlay covers the main screen, so it draws the indicator itself.
                let indicator = text.map(RewardIndicator::on_overlay);
                let surface = match &indicator {
                    Some(indicator) => surface.with_caption(indicator.caption()),
                    None => surface,
                };
                (indicator, Some(fire_confetti(options, surface)))
            }
            None => (
                text.map(RewardIndicator::show),
                Some(fire_confetti(options, NullSurface)),
            ),
        }
    } else {
        (text.map(RewardIndicator::show), None)
    };

    if let Some(confetti) = confetti {
        confetti.finished().await?;
    }
    if let Some(indicator) = indicator {
        indicator.dismissed().await;
    }
    Ok(())
}

#[derive(Serialize)]
struct TakeOutput<'a> {
    feedback: &'a QuizFeedback,
    reward: RewardOutcome,
}

async fn take(api: &ApiClient, options: TakeOptions) -> Result<()> {
    let document = api.get_document(&options.id).await?;
    let questions = document.questions();
    if questions.is_empty() {
        println!("No quiz available. Generate one from the document page.");
        return Ok(());
    }

    let mut session = QuizSession::new(&document.id, questions);
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let interactive = options.answers.is_none();

    loop {
        match &options.answers {
            Some(path) => {
                for index in apply_answers_file(&mut session, path)? {
                    log::warn!("Ignoring answer for question {index}");
                    eprintln!(
                        "{}",
                        format!("Question {} cannot be answered; its answer was ignored", index + 1)
                            .yellow()
                    );
                }
            }
            None => {
                println!("{}\n", format!("{} quiz", document.original_name).bold());
                answer_interactively(&mut session, &mut stdin).await?;
            }
        }

        let before = current_balance(api).await;
        let result = submit(api, &mut session, &mut stdin, interactive).await?;

        let percentage = result.percentage;
        let reported = result.reward_balance_after;
        let feedback = session.complete_submit(result)?;

        let after = balance_after(current_balance(api).await, reported);
        let reward = reward_for(before, after, percentage);

        if options.json {
            let output = TakeOutput {
                feedback: &feedback,
                reward,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        anstream::print!("{}", format_feedback(session.questions(), &feedback));
        play_reward(reward, !options.no_confetti).await?;

        if !interactive {
            return Ok(());
        }
        let reply = prompt(&mut stdin, "Take the quiz again? [y/N] ").await?;
        if !confirmed(reply.as_deref()) {
            return Ok(());
        }
        session.reopen()?;
    }
}

/// Prompt and options for one question
pub fn format_question(question: &QuizQuestion) -> String {
    let mut output = format!(
        "{} {}\n",
        format!("Question {}:", question.index + 1).bold(),
        question.prompt
    );

    match &question.kind {
        QuestionKind::MultipleChoice { options, .. } => {
            for (i, option) in options.iter().enumerate() {
                output.push_str(&format!("  {}. {option}\n", i + 1));
            }
        }
        QuestionKind::ShortAnswer { .. } => {
            output.push_str(&format!("  {}\n", "(short answer)".bright_black()));
        }
        QuestionKind::Unanswerable { reason } => {
            output.push_str(&format!(
                "  {}\n",
                format!("This question cannot be answered: {reason}").yellow()
            ));
        }
    }
    output
}

pub fn format_questions(questions: &[QuizQuestion]) -> String {
    questions
        .iter()
        .map(format_question)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Per-item verdicts followed by the authoritative score
pub fn format_feedback(questions: &[QuizQuestion], feedback: &QuizFeedback) -> String {
    let mut output = String::new();

    for (question, item) in questions.iter().zip(&feedback.items) {
        output.push_str(&format!(
            "{} {}\n",
            format!("Question {}:", question.index + 1).bold(),
            question.prompt
        ));
        if !item.submitted.is_empty() {
            output.push_str(&format!("  Your answer: {}\n", item.submitted));
        }
        let message = match item.verdict {
            Verdict::Correct => item.message.green(),
            Verdict::Incorrect => item.message.red(),
            Verdict::NotGradable => item.message.yellow(),
        };
        output.push_str(&format!("  {message}\n\n"));
    }

    let score = match feedback.tier {
        ScoreTier::Success => feedback.score_line().green().bold(),
        ScoreTier::Info => feedback.score_line().cyan().bold(),
    };
    output.push_str(&format!("{score}\n"));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use docquiz_core::quiz::score;
    use std::io::Write;

    fn plain() {
        colored::control::set_override(false);
    }

    fn questions() -> Vec<QuizQuestion> {
        parse_questions(&[
            serde_json::json!({"type": "mcq", "question": "2+2?", "options": ["3", "4"], "correctAnswer": "4"}),
            serde_json::json!({"type": "short", "question": "Capital of France?", "answer": "paris"}),
        ])
    }

    #[test]
    fn test_resolve_choice_by_number_or_text() {
        let options = vec!["red".to_string(), "blue".to_string()];
        assert_eq!(resolve_choice(&options, "2"), "blue");
        assert_eq!(resolve_choice(&options, "red"), "red");
        assert_eq!(resolve_choice(&options, "0"), "0");
        assert_eq!(resolve_choice(&options, "9"), "9");
    }

    #[test]
    fn test_load_answers_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"0": "4", "1": "Paris"}}"#).unwrap();

        let answers = load_answers(file.path()).unwrap();
        assert_eq!(answers.get(0), Some("4"));
        assert_eq!(answers.get(1), Some("Paris"));
        assert_eq!(answers.get(2), None);
    }

    #[test]
    fn test_load_answers_rejects_non_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"["4", "Paris"]"#).unwrap();
        assert!(load_answers(file.path()).is_err());
    }

    #[test]
    fn test_answers_file_never_blocks_submission() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"0": "four", "1": "anything"}}"#).unwrap();

        let questions = parse_questions(&[
            serde_json::json!({"type": "mcq", "question": "2+2?", "options": ["3", "4"], "correctAnswer": "4"}),
            serde_json::json!({"type": "short", "question": "No reference"}),
        ]);
        let mut session = QuizSession::new("doc", questions);

        let skipped = apply_answers_file(&mut session, file.path()).unwrap();
        assert_eq!(skipped, vec![1]);

        let submission = session.begin_submit().unwrap();
        assert_eq!(submission.answers[&0], "four");
        assert_eq!(submission.answers[&1], "");
    }

    // ============================================================================
    // Submission decisions
    // ============================================================================

    #[test]
    fn test_confirmed_replies() {
        assert!(confirmed(Some("y")));
        assert!(confirmed(Some(" Yes \n")));
        assert!(!confirmed(Some("n")));
        assert!(!confirmed(Some("")));
        assert!(!confirmed(None));
    }

    #[test]
    fn test_balance_after_prefers_refreshed_profile() {
        assert_eq!(balance_after(Some(15), Some(12)), Some(15));
        assert_eq!(balance_after(None, Some(12)), Some(12));
        assert_eq!(balance_after(None, None), None);
    }

    #[test]
    fn test_reward_needs_both_snapshots() {
        let reward = reward_for(Some(10), Some(15), 85.0);
        assert_eq!(reward.delta, 5);
        assert!(reward.show_indicator);
        assert!(reward.celebrate);

        let reward = reward_for(None, Some(15), 85.0);
        assert_eq!(reward.delta, 0);
        assert!(!reward.show_indicator);
        assert!(reward.celebrate);

        let reward = reward_for(Some(10), None, 50.0);
        assert!(!reward.show_indicator);
        assert!(!reward.celebrate);
    }

    // ============================================================================
    // Rendering
    // ============================================================================

    #[test]
    fn test_format_question_variants() {
        plain();
        let qs = questions();
        let mcq = format_question(&qs[0]);
        assert!(mcq.starts_with("Question 1: 2+2?\n"));
        assert!(mcq.contains("  2. 4\n"));
        assert!(format_question(&qs[1]).contains("(short answer)"));
    }

    #[test]
    fn test_format_feedback_shows_backend_score() {
        plain();
        let qs = questions();
        let answers: AnswerMap = [(0, "4".to_string()), (1, " Paris ".to_string())]
            .into_iter()
            .collect();
        let result = GradingResult {
            obtained: 1.5,
            total: 2.0,
            percentage: 75.0,
            reward_balance_after: None,
        };
        let output = format_feedback(&qs, &score(&qs, &answers, &result));
        assert_eq!(output.matches("Correct!").count(), 2);
        assert!(output.ends_with("Your Score: 75%\n"));
    }
}
