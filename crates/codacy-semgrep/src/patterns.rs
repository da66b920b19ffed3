use crate::client::{get, CodacyApi};
use crate::prelude::*;
use codacy_semgrep_core::codacy::{Page, Pattern, PatternQuery};
use indicatif::ProgressBar;

/// Default upper bound on the number of pattern pages fetched in one run
pub const DEFAULT_MAX_PAGES: usize = 1000;

/// Fetch every pattern of a tool, following pagination cursors
///
/// Pages are requested until the service stops returning a cursor. Patterns keep
/// the order in which the service returned them. Fails with
/// [`Error::PaginationLimit`] if more than `max_pages` pages would be needed.
pub async fn fetch_all_patterns(
    api: &impl CodacyApi,
    query: &PatternQuery,
    max_pages: usize,
    progress: Option<&ProgressBar>,
) -> Result<Vec<Pattern>> {
    let mut patterns = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0;

    loop {
        if pages == max_pages {
            return Err(Error::PaginationLimit(max_pages).into());
        }

        let path = query.page_path(cursor.as_deref());
        let page: Page<Pattern> = get(api, &path)
            .await
            .with_context(|| format!("Failed to fetch patterns (page {})", pages + 1))?;
        pages += 1;

        log::debug!(
            "Fetched pattern page {} with {} patterns",
            pages,
            page.data.len()
        );

        cursor = page.next_cursor().map(str::to_string);
        patterns.extend(page.data);

        if let Some(bar) = progress {
            bar.inc(1);
            bar.set_message(format!("{} patterns", patterns.len()));
        }

        if cursor.is_none() {
            break;
        }
    }

    Ok(patterns)
}
