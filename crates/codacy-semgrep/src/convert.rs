use crate::client::{list_coding_standards, list_tools, CodacyApi};
use crate::export::write_config;
use crate::patterns::fetch_all_patterns;
use crate::prelude::{println, *};
use crate::prompt::{ask_organization, select_coding_standard, select_languages, select_provider, Prompter};
use codacy_semgrep_core::codacy::{
    distinct_languages, filter_enabled, find_coding_standard, find_tool_by_uuid, PatternQuery,
    Provider,
};
use codacy_semgrep_core::selection::display_language;
use codacy_semgrep_core::semgrep::build_config;
use color_eyre::owo_colors::OwoColorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

/// Everything the conversion needs besides the API and the operator
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Provider; prompted for when `None`
    pub provider: Option<Provider>,
    /// Organization name; prompted for when `None`
    pub organization: Option<String>,
    /// Coding standard id or name; prompted for when `None`
    pub coding_standard: Option<String>,
    /// UUID of the tool whose patterns are exported
    pub tool_uuid: String,
    /// Lower-cased languages to include; prompted for when `None`
    pub languages: Option<BTreeSet<String>>,
    /// Destination of the Semgrep configuration
    pub output: PathBuf,
    /// Upper bound on pattern pages
    pub max_pages: usize,
    /// Show spinners while waiting on the API
    pub show_progress: bool,
}

/// Result of a conversion run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The configuration was written
    Written { path: PathBuf, rules: usize },
    /// The requested tool is not part of the coding standard; nothing was written
    ToolNotFound,
}

fn start_spinner(show: bool, message: &str) -> Result<ProgressBar> {
    if !show {
        return Ok(ProgressBar::hidden());
    }

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

fn start_page_counter(show: bool) -> Result<ProgressBar> {
    if !show {
        return Ok(ProgressBar::hidden());
    }

    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} Fetching patterns: {pos} pages ({msg})")?,
    );
    bar.enable_steady_tick(Duration::from_millis(100));
    Ok(bar)
}

/// Run the whole conversion: pick a coding standard and tool, fetch its
/// patterns and write the Semgrep configuration
pub async fn run(
    api: &impl CodacyApi,
    prompter: &mut impl Prompter,
    options: RunOptions,
) -> Result<Outcome> {
    // 1. Provider and organization
    let provider = match options.provider {
        Some(provider) => provider,
        None => select_provider(prompter)?,
    };
    println!("\nUsing provider: {}", provider.display_name().bold());

    let organization = match options.organization {
        Some(organization) => organization,
        None => ask_organization(prompter)?,
    };
    println!("Using organization: {}", organization.bold());

    // 2. Coding standard
    let spinner = start_spinner(options.show_progress, "Fetching coding standards...")?;
    let standards = list_coding_standards(api, provider, &organization).await;
    spinner.finish_and_clear();
    let standards = standards?;

    if standards.is_empty() {
        return Err(Error::NoCodingStandards(organization).into());
    }
    println!("Fetched {} coding standards", standards.len());

    let standard = match &options.coding_standard {
        Some(needle) => find_coding_standard(&standards, needle)
            .ok_or_else(|| Error::CodingStandardNotFound(needle.clone()))?,
        None => select_coding_standard(prompter, &standards)?,
    };
    println!(
        "\nSelected coding standard: {} (ID: {})",
        standard.name.bold(),
        standard.id
    );

    // 3. Tool
    let spinner = start_spinner(options.show_progress, "Fetching tools for coding standard...")?;
    let tools = list_tools(api, provider, &organization, &standard.id).await;
    spinner.finish_and_clear();
    let tools = tools?;
    println!("Found {} tools for the coding standard", tools.len());

    let Some(tool) = find_tool_by_uuid(&tools, &options.tool_uuid) else {
        println!(
            "{}",
            f!("Tool with UUID '{}' not found. Available tools:", options.tool_uuid).yellow()
        );
        let mut table = new_table();
        table.add_row(prettytable::row!["Name".bold().cyan(), "UUID".bold().cyan()]);
        for tool in &tools {
            table.add_row(prettytable::row![
                tool.name.as_deref().unwrap_or("Unknown"),
                tool.uuid
            ]);
        }
        table.printstd();
        return Ok(Outcome::ToolNotFound);
    };
    println!(
        "\nSelected tool: {} (UUID: {})",
        tool.name.as_deref().unwrap_or("Unknown").bold(),
        tool.uuid
    );

    // 4. Patterns
    let query = PatternQuery {
        provider,
        organization: organization.clone(),
        coding_standard_id: standard.id.clone(),
        tool_uuid: tool.uuid.clone(),
    };
    let counter = start_page_counter(options.show_progress)?;
    let patterns = fetch_all_patterns(api, &query, options.max_pages, Some(&counter)).await;
    counter.finish_and_clear();
    let patterns = patterns?;
    println!("Found {} patterns in total", patterns.len());

    let enabled = filter_enabled(patterns);
    println!("Found {} enabled patterns", enabled.len());

    // 5. Languages
    let available = distinct_languages(&enabled);
    let selected = match &options.languages {
        Some(requested) => {
            let selected: BTreeSet<String> = requested
                .iter()
                .filter(|language| available.contains(language))
                .cloned()
                .collect();
            for ignored in requested.difference(&selected) {
                log::warn!("Language '{}' is not used by any enabled pattern", ignored);
            }
            selected
        }
        None => select_languages(prompter, &available)?,
    };

    if selected.is_empty() {
        println!(
            "{}",
            "No languages selected, the configuration will contain no rules.".yellow()
        );
    } else {
        let names: Vec<String> = selected.iter().map(|l| display_language(l)).collect();
        println!("Selected languages: {}", names.join(", "));
    }

    // 6. Semgrep configuration
    let config = build_config(&enabled, &selected);
    write_config(&config, &options.output)?;

    println!(
        "\nSemgrep configuration has been saved to {}",
        options.output.display().bold()
    );
    println!(
        "Total rules added to config file: {}",
        config.rules.len().to_string().bold()
    );

    Ok(Outcome::Written {
        path: options.output,
        rules: config.rules.len(),
    })
}
