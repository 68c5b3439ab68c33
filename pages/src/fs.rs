//! Loading a page tree from a directory.
//!
//! `Name.wiki` holds the markup of page `Name`; a directory `Name/` holds its
//! children. `_root.wiki` in the top directory holds the root's own markup.
//! Either half of a page may be missing.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};
use wikitext::VariableSource;

use crate::error::PageError;
use crate::page::{PageData, WikiPage};
use crate::wikitext_page::WikitextPage;

pub const PAGE_EXTENSION: &str = "wiki";
pub const ROOT_CONTENT_FILE: &str = "_root.wiki";

#[derive(Default)]
struct PageFiles {
    content: Option<PathBuf>,
    children: Option<PathBuf>,
}

/// Build the tree stored under `dir`. The root is named after the directory.
pub fn load_tree(dir: &Path, variable_source: Arc<dyn VariableSource>) -> Result<Arc<WikitextPage>, PageError> {
    let name = dir
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("root")
        .to_string();
    let root_file = dir.join(ROOT_CONTENT_FILE);
    let content = if root_file.is_file() {
        read_page(&root_file)?
    } else {
        String::new()
    };

    let root = WikitextPage::root(name, PageData::new(content), variable_source);
    load_children(&root, dir)?;
    debug!(dir = %dir.display(), pages = count(&root), "loaded page tree");
    Ok(root)
}

fn load_children(page: &Arc<WikitextPage>, dir: &Path) -> Result<(), PageError> {
    let mut found: BTreeMap<String, PageFiles> = BTreeMap::new();

    let entries = std::fs::read_dir(dir).map_err(|source| PageError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let path = entry
            .map_err(|source| PageError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();

        if path.is_dir() {
            if let Some(name) = page_name(path.file_name().and_then(|n| n.to_str())) {
                found.entry(name).or_default().children = Some(path);
            }
        } else if path.extension().and_then(|e| e.to_str()) == Some(PAGE_EXTENSION) {
            if let Some(name) = page_name(path.file_stem().and_then(|n| n.to_str())) {
                found.entry(name).or_default().content = Some(path);
            }
        }
    }

    for (name, files) in found {
        let content = match &files.content {
            Some(file) => read_page(file)?,
            None => String::new(),
        };
        let child = WikitextPage::child_of(page, name, PageData::new(content));
        if let Some(sub_dir) = &files.children {
            load_children(&child, sub_dir)?;
        }
    }
    Ok(())
}

/// Names that cannot be addressed by a wiki path are skipped.
fn page_name(name: Option<&str>) -> Option<String> {
    let name = name?;
    if name.is_empty() || name.starts_with(['.', '_']) {
        return None;
    }
    if name.contains('.') {
        warn!(name, "skipping file: page names cannot contain '.'");
        return None;
    }
    Some(name.to_string())
}

fn read_page(path: &Path) -> Result<String, PageError> {
    std::fs::read_to_string(path).map_err(|source| PageError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn count(page: &Arc<WikitextPage>) -> usize {
    fn walk(page: &Arc<dyn WikiPage>) -> usize {
        1 + page.children().iter().map(walk).sum::<usize>()
    }
    let page: Arc<dyn WikiPage> = page.clone();
    walk(&page)
}
