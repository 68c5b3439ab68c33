//! Loading a wiki for one command, and the `.test.wiki` runner.

pub mod test_runner;

use std::path::Path;
use std::sync::Arc;

use pages::{PageError, WikiPage, find_page, load_tree};
use wikitext::VariableSource;

/// A page looked up in a tree loaded for one command.
///
/// Pages hold their parents weakly, so the root travels with the page.
pub struct OpenPage {
    pub root: Arc<dyn WikiPage>,
    pub page: Arc<dyn WikiPage>,
}

/// Load the wiki under `dir` and look up `page` by full name (`""` is the
/// root).
pub fn open_page(
    dir: &Path,
    page: &str,
    host: Arc<dyn VariableSource>,
) -> Result<OpenPage, PageError> {
    let root: Arc<dyn WikiPage> = load_tree(dir, host)?;
    let page = find_page(&root, page)?;
    Ok(OpenPage { root, page })
}
