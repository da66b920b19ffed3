use crate::prelude::{println, *};
use codacy_semgrep_core::codacy::{CodingStandard, Provider};
use codacy_semgrep_core::selection::{
    display_language, parse_multi_selection, parse_single_selection,
};
use color_eyre::owo_colors::OwoColorize;
use std::collections::BTreeSet;

/// Source of operator answers
pub trait Prompter {
    /// Show `question` and return the answer without its line terminator
    fn ask(&mut self, question: &str) -> Result<String>;
}

/// [`Prompter`] reading answers from stdin
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn ask(&mut self, question: &str) -> Result<String> {
        use std::io::{BufRead, Write};

        anstream::print!("{}", question);
        std::io::stdout().flush().context("Failed to flush stdout")?;

        let mut line = String::new();
        let read = std::io::stdin()
            .lock()
            .read_line(&mut line)
            .context("Failed to read from stdin")?;

        if read == 0 {
            return Err(Error::InputClosed.into());
        }

        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

/// Ask for a provider code until a valid one is entered
pub fn select_provider(prompter: &mut impl Prompter) -> Result<Provider> {
    println!("\nAvailable providers:");
    for provider in Provider::ALL {
        println!("  {}: {}", provider.code().bold(), provider.display_name());
    }

    loop {
        let answer = prompter.ask("\nEnter the provider code (gh/ghe/bb/gl): ")?;
        match answer.parse::<Provider>() {
            Ok(provider) => return Ok(provider),
            Err(_) => println!("{}", "Invalid provider. Please try again.".yellow()),
        }
    }
}

/// Ask for the Codacy organization name
pub fn ask_organization(prompter: &mut impl Prompter) -> Result<String> {
    loop {
        let answer = prompter.ask("Enter the Codacy organization name: ")?;
        let organization = answer.trim();
        if !organization.is_empty() {
            return Ok(organization.to_string());
        }
    }
}

/// List the coding standards and ask for one by number
pub fn select_coding_standard<'a>(
    prompter: &mut impl Prompter,
    standards: &'a [CodingStandard],
) -> Result<&'a CodingStandard> {
    println!("\nAvailable coding standards:");
    for (i, standard) in standards.iter().enumerate() {
        let mut tags = Vec::new();
        if standard.is_default == Some(true) {
            tags.push("default");
        }
        if standard.is_draft == Some(true) {
            tags.push("draft");
        }

        if tags.is_empty() {
            println!("{}. {}", i + 1, standard.name);
        } else {
            println!("{}. {} ({})", i + 1, standard.name, tags.join(", ").dimmed());
        }
    }

    loop {
        let answer =
            prompter.ask("\nEnter the number of the coding standard you want to use: ")?;
        match parse_single_selection(&answer, standards.len()) {
            Ok(index) => return Ok(&standards[index]),
            Err(err) => println!("{}", err.yellow()),
        }
    }
}

/// List the languages and ask for a comma-separated selection
///
/// Invalid entries are ignored; an answer with no valid entry asks again.
pub fn select_languages(
    prompter: &mut impl Prompter,
    available: &[String],
) -> Result<BTreeSet<String>> {
    if available.is_empty() {
        return Ok(BTreeSet::new());
    }

    println!("\nAvailable languages:");
    for (i, language) in available.iter().enumerate() {
        println!("{}. {}", i + 1, display_language(language));
    }

    loop {
        let answer = prompter.ask(
            "\nEnter the numbers of the languages you want to include (comma-separated, or 'all'): ",
        )?;
        let indices = parse_multi_selection(&answer, available.len());
        if !indices.is_empty() {
            return Ok(indices.into_iter().map(|i| available[i].clone()).collect());
        }
        println!("{}", "Select at least one language.".yellow());
    }
}

/// [`Prompter`] replaying fixed answers for tests
#[cfg(test)]
pub mod scripted {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Debug, Default)]
    pub struct ScriptedPrompter {
        answers: VecDeque<String>,
        pub questions: Vec<String>,
    }

    impl ScriptedPrompter {
        pub fn new(answers: &[&str]) -> Self {
            Self {
                answers: answers.iter().map(|a| a.to_string()).collect(),
                questions: Vec::new(),
            }
        }
    }

    impl Prompter for ScriptedPrompter {
        fn ask(&mut self, question: &str) -> Result<String> {
            self.questions.push(question.to_string());
            self.answers
                .pop_front()
                .ok_or_else(|| Error::InputClosed.into())
        }
    }
}
