use crate::prelude::{eprintln, *};
use clap::Parser;
use codacy_semgrep_core::codacy::{Provider, SEMGREP_TOOL_UUID};
use codacy_semgrep_core::selection::parse_language_list;
use color_eyre::owo_colors::OwoColorize;
use std::path::PathBuf;

mod client;
mod convert;
mod error;
mod export;
mod patterns;
mod prelude;
mod prompt;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Generate a Semgrep configuration from the patterns enabled in a Codacy coding standard"
)]
pub struct App {
    /// Codacy organization name (prompted for when omitted)
    #[clap(long)]
    organization: Option<String>,

    /// Git provider of the organization: gh, ghe, bb or gl (prompted for when omitted)
    #[clap(long)]
    provider: Option<Provider>,

    /// UUID of the Codacy tool to export (defaults to Semgrep)
    #[clap(long, default_value = SEMGREP_TOOL_UUID)]
    tool: String,

    /// Output file name
    #[clap(long, default_value = "semgrep_config.yaml")]
    output: PathBuf,

    /// Coding standard id or name (prompted for when omitted)
    #[clap(long)]
    coding_standard: Option<String>,

    /// Comma-separated languages to include (prompted for when omitted)
    #[clap(long)]
    languages: Option<String>,

    /// Maximum number of pattern pages to fetch
    #[clap(long, default_value_t = patterns::DEFAULT_MAX_PAGES, value_parser = parse_max_pages)]
    max_pages: usize,

    /// Codacy API token
    #[clap(long, env = "CODACY_API_TOKEN", hide_env_values = true)]
    api_token: Option<String>,

    /// Codacy API base URL
    #[clap(long, env = "CODACY_API_BASE_URL")]
    base_url: Option<String>,
}

impl App {
    fn run_options(&self) -> convert::RunOptions {
        convert::RunOptions {
            provider: self.provider,
            organization: self.organization.clone(),
            coding_standard: self.coding_standard.clone(),
            tool_uuid: self.tool.clone(),
            languages: self.languages.as_deref().map(parse_language_list),
            output: self.output.clone(),
            max_pages: self.max_pages,
            show_progress: true,
        }
    }
}

fn parse_max_pages(value: &str) -> std::result::Result<usize, String> {
    match value.parse::<usize>() {
        Ok(pages) if pages > 0 => Ok(pages),
        _ => Err(f!("expected a positive number of pages, got '{}'", value)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    // A missing token is fatal before anything touches the network.
    let config = client::CodacyConfig::new(app.base_url.clone(), app.api_token.clone())?;
    let api = client::HttpCodacyApi::new(&config)?;
    log::debug!("Using Codacy API at {}", config.base_url);

    let mut prompter = prompt::TerminalPrompter;
    if let Err(err) = convert::run(&api, &mut prompter, app.run_options()).await {
        eprintln!("{}", report_error(&err));
    }

    Ok(())
}

/// API failures get a one-line cause chain, anything else the full report.
fn report_error(err: &color_eyre::eyre::Report) -> String {
    if err.downcast_ref::<Error>().is_some_and(Error::is_api) {
        f!("{} {:#}", "Error accessing Codacy API:".red(), err)
    } else {
        f!("{} {:?}", "An error occurred:".red(), err)
    }
}
