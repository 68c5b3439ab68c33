use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use thiserror::Error;

/// Why an `!include` target could not be produced.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct IncludeNotFound {
    pub reason: String,
}

impl IncludeNotFound {
    pub fn new(reason: impl Into<String>) -> Self {
        IncludeNotFound {
            reason: reason.into(),
        }
    }
}

/// Read-only view of a page, as seen by the parser.
///
/// This is the only way the syntax engine learns anything about the page it
/// is rendering: its identity, its content, its properties and how wiki
/// words written on it map onto other pages. Implementations never mutate
/// the page behind them.
pub trait SourcePage: Send + Sync {
    /// Local page name. Ad-hoc pages have none.
    fn name(&self) -> Option<String>;

    /// Dotted name from the root, e.g. `FrontPage.SubPage`.
    fn full_name(&self) -> String;

    /// Path of the page's parent, without a leading dot (`FrontPage` for
    /// `FrontPage.SubPage`).
    fn path(&self) -> Option<String>;

    /// Absolute wiki path of the page (`.FrontPage.SubPage`).
    fn full_path(&self) -> Option<String>;

    fn content(&self) -> String;

    fn has_property(&self, key: &str) -> bool;

    /// String value of a property. Map-typed properties read as absent here.
    fn property(&self, key: &str) -> Option<String>;

    /// Nested map-typed property.
    fn property_map(&self, _key: &str) -> Option<BTreeMap<String, String>> {
        None
    }

    fn children(&self) -> Vec<Arc<dyn SourcePage>>;

    /// Whether the page a wiki word points at exists.
    fn target_exists(&self, wiki_word_path: &str) -> bool;

    /// Absolute path of the page a wiki word points at, whether it exists or not.
    fn make_full_path_of_target(&self, wiki_word_path: &str) -> Option<String>;

    /// Absolute path of the nearest ancestor called `target_name`.
    fn find_parent_path(&self, target_name: &str) -> Option<String>;

    fn find_included_page(&self, page_name: &str) -> Result<Arc<dyn SourcePage>, IncludeNotFound>;
}

/// Orders two pages by name. Nameless pages sort first.
pub fn by_name(a: &dyn SourcePage, b: &dyn SourcePage) -> Ordering {
    a.name().cmp(&b.name())
}
