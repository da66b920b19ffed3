use crate::prelude::*;
use codacy_semgrep_core::semgrep::{render_config, SemgrepConfig};
use std::fs;
use std::path::Path;

/// Write the Semgrep configuration to `path`, replacing any existing file
pub fn write_config(config: &SemgrepConfig, path: &Path) -> Result<()> {
    let contents = render_config(config)?;

    fs::write(path, contents)
        .with_context(|| format!("Failed to write Semgrep config to {}", path.display()))?;

    log::debug!(
        "Wrote {} rules to {}",
        config.rules.len(),
        path.display()
    );

    Ok(())
}
