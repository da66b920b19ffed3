//! Parsing of operator input for the interactive prompts

use std::collections::BTreeSet;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Please enter a valid number.")]
    NotANumber,

    #[error("Invalid selection. Please try again.")]
    OutOfRange,
}

/// Parse a 1-based choice from a numbered list of `len` entries
///
/// Returns the 0-based index of the chosen entry.
pub fn parse_single_selection(input: &str, len: usize) -> Result<usize, SelectionError> {
    let choice: usize = input
        .trim()
        .parse()
        .map_err(|_| SelectionError::NotANumber)?;

    if (1..=len).contains(&choice) {
        Ok(choice - 1)
    } else {
        Err(SelectionError::OutOfRange)
    }
}

/// Parse comma-separated 1-based choices from a numbered list of `len` entries
///
/// Tokens that are not numbers or fall outside the list are ignored. The word
/// `all` selects every entry. Returns sorted, distinct 0-based indices.
pub fn parse_multi_selection(input: &str, len: usize) -> Vec<usize> {
    if input.trim().eq_ignore_ascii_case("all") {
        return (0..len).collect();
    }

    input
        .split(',')
        .filter_map(|token| token.trim().parse::<usize>().ok())
        .filter(|choice| (1..=len).contains(choice))
        .map(|choice| choice - 1)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Parse a comma-separated list of language names into a lower-cased set
pub fn parse_language_list(input: &str) -> BTreeSet<String> {
    input
        .split(',')
        .map(|language| language.trim().to_lowercase())
        .filter(|language| !language.is_empty())
        .collect()
}

/// Language name as shown to the operator ("python" -> "Python")
pub fn display_language(language: &str) -> String {
    let mut chars = language.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
