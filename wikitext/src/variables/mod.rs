//! Symbol sources: everything that can answer "what is `${NAME}`?".
//!
//! A page resolves its variables through a [`CompositeVariableSource`]: an
//! ordered list of sources where the first one that knows the name wins.

pub mod cache;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use crate::source_page::SourcePage;

pub use cache::ResolutionCache;

/// Built-in variable holding the name of the page being rendered.
pub const PAGE_NAME: &str = "PAGE_NAME";
/// Built-in variable holding the URL path of the page being rendered.
pub const PAGE_PATH: &str = "PAGE_PATH";

/// Something that can resolve a variable name to its raw value.
pub trait VariableSource: Send + Sync {
    fn find_variable(&self, name: &str) -> Option<String>;

    /// Present when the source also knows variables passed on the request URL.
    fn as_url_variables(&self) -> Option<&dyn UrlVariables> {
        None
    }

    /// Present when the source also knows application-level variables.
    fn as_application_variables(&self) -> Option<&dyn ApplicationVariables> {
        None
    }
}

/// Capability: variables supplied through the request URL.
pub trait UrlVariables {
    fn find_url_variable(&self, name: &str) -> Option<String>;
}

/// Capability: variables describing the running application.
pub trait ApplicationVariables {
    fn find_application_variable(&self, name: &str) -> Option<String>;
}

/// A fixed name to value map.
#[derive(Debug, Clone, Default)]
pub struct MapVariableSource {
    variables: HashMap<String, String>,
}

impl MapVariableSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(name.into(), value.into());
    }
}

impl FromIterator<(String, String)> for MapVariableSource {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        MapVariableSource {
            variables: iter.into_iter().collect(),
        }
    }
}

impl VariableSource for MapVariableSource {
    fn find_variable(&self, name: &str) -> Option<String> {
        self.variables.get(name).cloned()
    }
}

/// Ordered, short-circuiting chain of sources.
#[derive(Clone)]
pub struct CompositeVariableSource {
    sources: Vec<Arc<dyn VariableSource>>,
}

impl CompositeVariableSource {
    pub fn new(sources: Vec<Arc<dyn VariableSource>>) -> Self {
        CompositeVariableSource { sources }
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl VariableSource for CompositeVariableSource {
    fn find_variable(&self, name: &str) -> Option<String> {
        self.sources.iter().enumerate().find_map(|(index, source)| {
            let found = source.find_variable(name);
            if found.is_some() {
                trace!(name, source = index, "variable resolved");
            }
            found
        })
    }
}

/// Application-scope variables of the host source, if it has any.
pub struct ApplicationVariableSource {
    host: Arc<dyn VariableSource>,
}

impl ApplicationVariableSource {
    pub fn new(host: Arc<dyn VariableSource>) -> Self {
        ApplicationVariableSource { host }
    }
}

impl VariableSource for ApplicationVariableSource {
    fn find_variable(&self, name: &str) -> Option<String> {
        self.host
            .as_application_variables()
            .and_then(|app| app.find_application_variable(name))
    }
}

/// Variables that come from the page itself: its identity and its properties.
pub struct PageVariableSource {
    page: Arc<dyn SourcePage>,
}

impl PageVariableSource {
    pub fn new(page: Arc<dyn SourcePage>) -> Self {
        PageVariableSource { page }
    }
}

impl VariableSource for PageVariableSource {
    fn find_variable(&self, name: &str) -> Option<String> {
        match name {
            PAGE_NAME => self.page.name(),
            PAGE_PATH => self.page.path(),
            _ => self.page.property(name),
        }
    }
}

/// Request URL variables. Only answers when the host source supports them.
pub struct UserVariableSource {
    host: Arc<dyn VariableSource>,
}

impl UserVariableSource {
    pub fn new(host: Arc<dyn VariableSource>) -> Self {
        UserVariableSource { host }
    }
}

impl VariableSource for UserVariableSource {
    fn find_variable(&self, name: &str) -> Option<String> {
        self.host
            .as_url_variables()
            .and_then(|url| url.find_url_variable(name))
    }
}
