//! The one value that outlives the process: last session's highscore.

use std::path::Path;

use crate::error::GameError;

const PREFIX: &str = "Last session's highscore was ";

pub fn format_line(score: u32) -> String {
    format!("{PREFIX}{score}.\n")
}

/// Read the previous session's highscore.  A missing or unreadable file
/// just means starting from zero.
pub fn load(path: &Path) -> u32 {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|text| parse_line(&text))
        .unwrap_or(0)
}

pub fn parse_line(text: &str) -> Option<u32> {
    let text = text.trim();
    text.strip_prefix(PREFIX)
        .unwrap_or(text)
        .trim_end_matches('.')
        .parse()
        .ok()
}

pub fn save(path: &Path, score: u32) -> Result<(), GameError> {
    std::fs::write(path, format_line(score)).map_err(|source| GameError::HighScore {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("highscore {score} saved to {}", path.display());
    Ok(())
}
