use crate::prelude::*;
use clap::Parser;

mod api;
mod confetti;
mod docs;
mod effects;
mod error;
mod prelude;
mod profile;
mod quiz;
mod summary;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Summarize uploaded documents, take their quizzes and track your rewards"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Base URL of the document service
    #[clap(long, env = "DOCQUIZ_API_URL", global = true)]
    api_url: Option<String>,

    /// Bearer token for the document service
    #[clap(long, env = "DOCQUIZ_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Whether to display additional information.
    #[clap(long, env = "DOCQUIZ_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// List, upload and inspect documents
    Docs(crate::docs::App),

    /// Generate or edit a document summary
    Summary(crate::summary::App),

    /// Generate and take document quizzes
    Quiz(crate::quiz::App),

    /// Show your reward balance, milestone and quiz history
    Profile(crate::profile::ProfileOptions),

    /// Overview of documents, summaries, quizzes and scores
    Dashboard(crate::profile::DashboardOptions),

    /// Play the celebration effect
    Confetti(crate::confetti::ConfettiArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Docs(sub_app) => crate::docs::run(sub_app, app.global).await,
        SubCommands::Summary(sub_app) => crate::summary::run(sub_app, app.global).await,
        SubCommands::Quiz(sub_app) => crate::quiz::run(sub_app, app.global).await,
        SubCommands::Profile(options) => crate::profile::run_profile(options, app.global).await,
        SubCommands::Dashboard(options) => {
            crate::profile::run_dashboard(options, app.global).await
        }
        SubCommands::Confetti(args) => crate::confetti::run(args).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
