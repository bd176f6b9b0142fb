use colored::Colorize;
use docquiz_core::dashboard::{build_dashboard, score_history, DashboardStats, Profile};
use docquiz_core::reward::Milestone;

use crate::api::ApiClient;
use crate::prelude::{println, *};

#[derive(Debug, clap::Args, Clone)]
pub struct ProfileOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, clap::Args, Clone)]
pub struct DashboardOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn milestone_label(milestone: Milestone) -> colored::ColoredString {
    match milestone {
        Milestone::Gold => milestone.label().yellow().bold(),
        Milestone::Silver => milestone.label().white().bold(),
        Milestone::Bronze => milestone.label().red(),
        Milestone::New => milestone.label().bright_black(),
    }
}

fn format_score(score: Option<f64>) -> String {
    score
        .map(|s| format!("{}%", s.round()))
        .unwrap_or_else(|| "-".to_string())
}

pub async fn run_profile(options: ProfileOptions, global: crate::Global) -> Result<()> {
    let api = ApiClient::from_global(&global)?;
    let (profile, documents) = futures::try_join!(api.profile(), api.list_documents())?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
        return Ok(());
    }

    print_profile(&profile);

    let history = score_history(&profile.scores, &documents);
    println!();
    if history.is_empty() {
        println!("{}", "No quizzes taken yet.".bright_black());
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "Document".bold().cyan(),
        "Score".bold().cyan(),
        "Date".bold().cyan()
    ]);
    for item in &history {
        table.add_row(prettytable::row![
            item.document_name.bright_white(),
            format_score(item.score).green(),
            item.date.bright_black()
        ]);
    }
    table.printstd();

    Ok(())
}

fn print_profile(profile: &Profile) {
    let mut table = new_table();
    table.add_row(prettytable::row![
        "Username".bold().cyan(),
        profile.username.bright_white()
    ]);
    table.add_row(prettytable::row![
        "Email".bold().cyan(),
        profile.email.bright_black()
    ]);
    table.add_row(prettytable::row![
        "Coins".bold().cyan(),
        profile.coins.to_string().yellow()
    ]);
    table.add_row(prettytable::row![
        "Milestone".bold().cyan(),
        milestone_label(profile.milestone())
    ]);
    table.printstd();
}

pub async fn run_dashboard(options: DashboardOptions, global: crate::Global) -> Result<()> {
    let api = ApiClient::from_global(&global)?;
    let (documents, profile) = futures::try_join!(api.list_documents(), api.profile())?;

    let stats = build_dashboard(&documents, &profile.scores);
    log::debug!(
        "Dashboard built from {} documents and {} scores",
        documents.len(),
        profile.scores.len()
    );

    if options.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    print_dashboard(&stats);
    Ok(())
}

fn print_dashboard(stats: &DashboardStats) {
    let mut totals = new_table();
    totals.add_row(prettytable::row![
        "Documents".bold().cyan(),
        "Summaries".bold().cyan(),
        "Quizzes".bold().cyan(),
        "Average Score".bold().cyan()
    ]);
    totals.add_row(prettytable::row![
        stats.total_documents.to_string().bright_white(),
        stats.total_summaries.to_string().bright_white(),
        stats.total_quizzes.to_string().bright_white(),
        format!("{}%", stats.average_score).green()
    ]);
    totals.printstd();

    println!("\n{}", "Recent Activity".bold());
    if stats.recent_activity.is_empty() {
        println!("{}", "No documents uploaded yet.".bright_black());
    } else {
        let mut table = new_table();
        for item in &stats.recent_activity {
            table.add_row(prettytable::row![
                item.name.bright_white(),
                item.action.yellow(),
                item.date.bright_black()
            ]);
        }
        table.printstd();
    }

    println!("\n{}", "Score History".bold());
    if stats.score_history.is_empty() {
        println!("{}", "No quizzes taken yet.".bright_black());
    } else {
        let mut table = new_table();
        for item in &stats.score_history {
            table.add_row(prettytable::row![
                item.document_name.bright_white(),
                format_score(item.score).green(),
                item.date.bright_black()
            ]);
        }
        table.printstd();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(Some(66.6)), "67%");
        assert_eq!(format_score(Some(100.0)), "100%");
        assert_eq!(format_score(None), "-");
    }

    #[test]
    fn test_milestone_label_text() {
        colored::control::set_override(false);
        assert_eq!(milestone_label(Milestone::Gold).to_string(), Milestone::Gold.label());
        assert_eq!(milestone_label(Milestone::New).to_string(), Milestone::New.label());
    }
}
