use colored::Colorize;
use docquiz_core::documents::{format_date, format_file_size, is_pdf_path, Document};

use crate::api::ApiClient;
use crate::prelude::{println, *};

#[derive(Debug, clap::Parser)]
#[command(name = "docs")]
#[command(about = "List, upload and inspect documents")]
pub struct App {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, clap::Subcommand)]
pub enum Commands {
    /// List uploaded documents
    #[clap(name = "list")]
    List(ListOptions),

    /// Upload a PDF document
    #[clap(name = "upload")]
    Upload(UploadOptions),

    /// Show a document with its summary and quiz
    #[clap(name = "show")]
    Show(ShowOptions),
}

#[derive(Debug, clap::Args, Clone)]
pub struct ListOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct UploadOptions {
    /// Path to the PDF file
    pub path: std::path::PathBuf,
}

#[derive(Debug, clap::Args, Clone)]
pub struct ShowOptions {
    /// Document ID
    pub id: String,

    #[clap(flatten)]
    pub render: crate::summary::RenderOptions,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let api = ApiClient::from_global(&global)?;

    match app.command {
        Commands::List(options) => list(&api, options).await,
        Commands::Upload(options) => upload(&api, options).await,
        Commands::Show(options) => show(&api, options).await,
    }
}

async fn list(api: &ApiClient, options: ListOptions) -> Result<()> {
    let documents = api.list_documents().await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&documents)?);
        return Ok(());
    }

    if documents.is_empty() {
        println!("No documents uploaded yet.");
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "ID".bold().cyan(),
        "Name".bold().cyan(),
        "Uploaded".bold().cyan(),
        "Size".bold().cyan(),
        "Summary".bold().cyan(),
        "Quiz".bold().cyan()
    ]);
    for doc in &documents {
        table.add_row(prettytable::row![
            doc.id.green(),
            doc.original_name.bright_white(),
            format_date(doc.uploaded_at()).bright_black(),
            doc.size.map(format_file_size).unwrap_or_default(),
            yes_no(doc.has_summary()),
            yes_no(doc.has_quiz())
        ]);
    }
    table.printstd();

    Ok(())
}

fn yes_no(value: bool) -> colored::ColoredString {
    if value {
        "yes".green()
    } else {
        "no".bright_black()
    }
}

/// Reject anything that is not a PDF before contacting the service
fn check_upload(path: &std::path::Path) -> Result<(), Error> {
    if is_pdf_path(path) {
        Ok(())
    } else {
        Err(Error::Rejected("Please upload a PDF file".to_string()))
    }
}

async fn upload(api: &ApiClient, options: UploadOptions) -> Result<()> {
    check_upload(&options.path)?;

    let spinner = new_spinner("Uploading...");
    let result = api.upload(&options.path).await;
    spinner.finish_and_clear();
    result?;

    log::info!("Uploaded {}", options.path.display());
    println!("{}", "Document uploaded successfully".green());
    Ok(())
}

async fn show(api: &ApiClient, options: ShowOptions) -> Result<()> {
    let document = api.get_document(&options.id).await?;

    if options.render.json {
        println!("{}", serde_json::to_string_pretty(&document)?);
        return Ok(());
    }

    anstream::print!("{}", format_document(&document, options.render.expand_points));
    Ok(())
}

/// Header, summary and quiz questions of one document
pub fn format_document(document: &Document, expand_points: bool) -> String {
    let mut output = format!(
        "{}\n{} {}\n\n",
        document.original_name.bold(),
        "Uploaded:".bright_black(),
        format_date(document.uploaded_at())
    );

    output.push_str(&format!("{}\n", "Summary".bold().underline()));
    match document.segmented_summary() {
        Some(summary) => {
            output.push_str(&crate::summary::format_summary(&summary, expand_points));
        }
        None => output.push_str(&format!(
            "{}\n",
            "No summary available. Generate one with `docquiz summary generate`.".bright_black()
        )),
    }

    output.push('\n');
    output.push_str(&format!("{}\n", "Quiz".bold().underline()));
    let questions = document.questions();
    if questions.is_empty() {
        output.push_str(&format!(
            "{}\n",
            "No quiz available. Generate one with `docquiz quiz generate`.".bright_black()
        ));
    } else {
        output.push_str(&crate::quiz::format_questions(&questions));
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
    fn test_check_upload_accepts_pdf() {
        assert!(check_upload(std::path::Path::new("notes.PDF")).is_ok());
    }

    #[test]
    fn test_check_upload_rejects_other_files() {
        let err = check_upload(std::path::Path::new("notes.docx")).unwrap_err();
        assert_eq!(err.to_string(), "Please upload a PDF file");
    }

    #[test]
    fn test_format_document_without_summary_or_quiz() {
        plain();
        let document = Document {
            id: "d1".to_string(),
            original_name: "notes.pdf".to_string(),
            ..Default::default()
        };

        let output = format_document(&document, false);
        assert!(output.starts_with("notes.pdf\n"));
        assert!(output.contains("No summary available"));
        assert!(output.contains("No quiz available"));
    }

    #[test]
    fn test_format_document_with_summary_and_quiz() {
        plain();
        let document = Document {
            id: "d1".to_string(),
            original_name: "notes.pdf".to_string(),
            summary: Some("Lead. Key points: a, b".to_string()),
            quiz: Some(vec![serde_json::json!({
                "type": "mcq",
                "question": "Pick one",
                "options": ["a", "b"],
                "correctAnswer": "a"
            })]),
            ..Default::default()
        };

        let output = format_document(&document, true);
        assert!(output.contains("  • a\n"));
        assert!(output.contains("Question 1: Pick one"));
    }
}
