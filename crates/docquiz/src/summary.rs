use colored::Colorize;
use docquiz_core::quiz::{parse_questions, QuizQuestion};
use docquiz_core::summary::{segment, SegmentedSummary};
use serde::Serialize;

use crate::api::ApiClient;
use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "summary")]
#[command(about = "Generate or edit a document summary")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// Ask the service to (re)generate the summary
    #[clap(name = "generate")]
    Generate(GenerateOptions),

    /// Replace the summary with your own text
    #[clap(name = "edit")]
    Edit(EditOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct RenderOptions {
    /// Show the key points instead of collapsing them
    #[arg(long)]
    pub expand_points: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct GenerateOptions {
    /// Document ID
    pub id: String,

    /// Also generate a quiz from the new summary
    #[arg(long)]
    pub with_quiz: bool,

    #[clap(flatten)]
    pub render: RenderOptions,
}

#[derive(Debug, clap::Args, Clone)]
#[group(required = true, multiple = false, id = "source")]
pub struct EditSource {
    /// New summary text
    #[arg(long)]
    pub text: Option<String>,

    /// File containing the new summary
    #[arg(long)]
    pub file: Option<std::path::PathBuf>,
}

#[derive(Debug, clap::Args, Clone)]
pub struct EditOptions {
    /// Document ID
    pub id: String,

    #[clap(flatten)]
    pub source: EditSource,

    #[clap(flatten)]
    pub render: RenderOptions,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let api = ApiClient::from_global(&global)?;

    match app.command {
        Commands::Generate(options) => generate(&api, options).await,
        Commands::Edit(options) => edit(&api, options).await,
    }
}

async fn generate(api: &ApiClient, options: GenerateOptions) -> Result<()> {
    if options.with_quiz {
        return generate_with_quiz(api, options).await;
    }

    let spinner = new_spinner("Generating...");
    let result = api.generate_summary(&options.id).await;
    spinner.finish_and_clear();

    let summary = result?;
    log::info!("Generated summary for document {}", options.id);
    output_summary(&segment(&summary), &options.render)
}

#[derive(Serialize)]
struct SummaryWithQuiz {
    summary: SegmentedSummary,
    quiz: Vec<QuizQuestion>,
}

async fn generate_with_quiz(api: &ApiClient, options: GenerateOptions) -> Result<()> {
    let spinner = new_spinner("Generating...");
    let result = api.generate_both(&options.id).await;
    spinner.finish_and_clear();

    let (summary, quiz) = result?;
    let output = SummaryWithQuiz {
        summary: segment(&summary),
        quiz: parse_questions(&quiz),
    };
    log::info!(
        "Generated summary and {} questions for document {}",
        output.quiz.len(),
        options.id
    );

    if options.render.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        anstream::print!(
            "{}\n{}",
            format_summary(&output.summary, options.render.expand_points),
            crate::quiz::format_questions(&output.quiz)
        );
    }
    Ok(())
}

async fn edit(api: &ApiClient, options: EditOptions) -> Result<()> {
    let text = match (&options.source.text, &options.source.file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => return Err(eyre!("Either --text or --file is required")),
    };

    let saved = api.save_summary(&options.id, &text).await?;
    // Segment what the service stored, not what was sent.
    output_summary(&segment(&saved), &options.render)
}

fn output_summary(summary: &SegmentedSummary, render: &RenderOptions) -> Result<()> {
    if render.json {
        println!("{}", serde_json::to_string_pretty(summary)?);
    } else {
        anstream::print!("{}", format_summary(summary, render.expand_points));
    }
    Ok(())
}

/// Executive paragraph followed by the key points section, if there is one
pub fn format_summary(summary: &SegmentedSummary, expand_points: bool) -> String {
    let mut output = format!("{}\n", summary.executive);

    if !summary.has_key_points() {
        return output;
    }

    output.push('\n');
    if expand_points {
        output.push_str(&format!("{}\n", "Key Points".bold().cyan()));
        for point in &summary.key_points {
            output.push_str(&format!("  • {point}\n"));
        }
    } else {
        output.push_str(&format!(
            "{} {}\n",
            format!("Key Points ({})", summary.key_points.len()).bold().cyan(),
            "[collapsed, pass --expand-points to show]".bright_black()
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_format_summary_without_points() {
        plain();
        let output = format_summary(&segment("One. Two."), false);
        assert_eq!(output, "One. Two\n");
    }

    #[test]
    fn test_format_summary_collapsed_by_default() {
        plain();
        let output = format_summary(&segment("Lead. Key points include: a, b"), false);
        assert!(output.contains("Key Points (2)"));
        assert!(!output.contains("• a"));
    }

    #[test]
    fn test_format_summary_expanded() {
        plain();
        let output = format_summary(&segment("Lead. Key points include: a, b"), true);
        assert!(output.starts_with("Lead.\n"));
        assert!(output.contains("  • a\n"));
        assert!(output.contains("  • b\n"));
    }
}
