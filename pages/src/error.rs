use std::path::PathBuf;

use thiserror::Error;
use wikitext::ParseError;

#[derive(Debug, Error)]
pub enum PageError {
    /// The page's markup could not be parsed. `content` is the text that was
    /// parsed, so the errors' spans can be shown against it.
    #[error("{page}: {} markup error(s)", .errors.len())]
    Parse {
        page: String,
        content: String,
        errors: Vec<ParseError>,
    },

    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("page not found: {0}")]
    NotFound(String),
}
