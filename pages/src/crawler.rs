//! Walking the page tree: full names, path resolution, ancestor search.

use std::sync::Arc;

use crate::error::PageError;
use crate::page::WikiPage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    /// `A.B`: a sibling of the current page, then down.
    Relative,
    /// `.A.B`: from the root.
    Absolute,
    /// `<A.B`: from the nearest ancestor named `A`.
    Backward,
    /// `>A.B` or `^A.B`: from the current page.
    SubPage,
}

/// A parsed wiki word path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiPagePath {
    kind: PathKind,
    names: Vec<String>,
}

impl WikiPagePath {
    /// `None` for an empty path or one with an empty segment.
    pub fn parse(path: &str) -> Option<Self> {
        let (kind, rest) = match path.chars().next()? {
            '.' => (PathKind::Absolute, &path[1..]),
            '<' => (PathKind::Backward, &path[1..]),
            '>' | '^' => (PathKind::SubPage, &path[1..]),
            _ => (PathKind::Relative, path),
        };
        let names: Vec<String> = rest.split('.').map(str::to_string).collect();
        if names.iter().any(String::is_empty) {
            return None;
        }
        Some(WikiPagePath { kind, names })
    }

    pub fn kind(&self) -> PathKind {
        self.kind
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Dotted names from below the root down to `page`; empty for the root.
pub fn full_name(page: &dyn WikiPage) -> String {
    if page.is_root() {
        return String::new();
    }
    let mut names = vec![page.name().to_string()];
    let mut parent = page.parent();
    while let Some(current) = parent {
        if current.is_root() {
            break;
        }
        names.push(current.name().to_string());
        parent = current.parent();
    }
    names.reverse();
    names.join(".")
}

pub fn root_of(page: &Arc<dyn WikiPage>) -> Arc<dyn WikiPage> {
    let mut current = page.clone();
    while let Some(parent) = current.parent() {
        current = parent;
    }
    current
}

/// Nearest page named `name`, starting with `page` itself and walking up.
pub fn find_ancestor(page: &Arc<dyn WikiPage>, name: &str) -> Option<Arc<dyn WikiPage>> {
    let mut current = Some(page.clone());
    while let Some(candidate) = current {
        if !candidate.is_root() && candidate.name() == name {
            return Some(candidate);
        }
        current = candidate.parent();
    }
    None
}

/// The page a path starts from, and the names left to walk down.
fn base_of<'p>(
    page: &Arc<dyn WikiPage>,
    path: &'p WikiPagePath,
) -> Option<(Arc<dyn WikiPage>, &'p [String])> {
    match path.kind {
        PathKind::Absolute => Some((root_of(page), &path.names[..])),
        PathKind::SubPage => Some((page.clone(), &path.names[..])),
        PathKind::Backward => {
            let (first, rest) = path.names.split_first()?;
            Some((find_ancestor(page, first)?, rest))
        }
        PathKind::Relative => {
            let base = page.parent().unwrap_or_else(|| page.clone());
            Some((base, &path.names[..]))
        }
    }
}

/// The page `path` points at, seen from `page`.
pub fn resolve(page: &Arc<dyn WikiPage>, path: &WikiPagePath) -> Option<Arc<dyn WikiPage>> {
    let (base, names) = base_of(page, path)?;
    names
        .iter()
        .try_fold(base, |current, name| current.child(name))
}

/// Full name of the page `path` points at, whether or not it exists.
pub fn target_full_name(page: &Arc<dyn WikiPage>, path: &WikiPagePath) -> Option<String> {
    let (base, names) = base_of(page, path)?;
    let mut full = full_name(&*base);
    for name in names {
        if !full.is_empty() {
            full.push('.');
        }
        full.push_str(name);
    }
    Some(full)
}

/// Look a page up by its full name, starting from the root of `page`'s tree.
/// An empty name is the root itself.
pub fn find_page(page: &Arc<dyn WikiPage>, full_name: &str) -> Result<Arc<dyn WikiPage>, PageError> {
    let root = root_of(page);
    let full_name = full_name.trim_start_matches('.');
    if full_name.is_empty() {
        return Ok(root);
    }
    full_name
        .split('.')
        .try_fold(root, |current, name| current.child(name))
        .ok_or_else(|| PageError::NotFound(full_name.to_string()))
}
