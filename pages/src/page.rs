use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock, Weak};

use tracing::warn;
use wikitext::SyntaxTree;

use crate::error::PageError;

/// A property stored on a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Text(String),
    Map(BTreeMap<String, String>),
}

/// What storage keeps for a page: its markup and its properties.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageData {
    pub content: String,
    pub properties: BTreeMap<String, PropertyValue>,
}

impl PageData {
    pub fn new(content: impl Into<String>) -> Self {
        PageData {
            content: content.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties
            .insert(key.into(), PropertyValue::Text(value.into()));
        self
    }

    pub fn with_property_map(mut self, key: impl Into<String>, map: BTreeMap<String, String>) -> Self {
        self.properties.insert(key.into(), PropertyValue::Map(map));
        self
    }

    /// String-valued property.
    pub fn property(&self, key: &str) -> Option<&str> {
        match self.properties.get(key)? {
            PropertyValue::Text(value) => Some(value),
            PropertyValue::Map(_) => None,
        }
    }

    pub fn property_map(&self, key: &str) -> Option<&BTreeMap<String, String>> {
        match self.properties.get(key)? {
            PropertyValue::Map(map) => Some(map),
            PropertyValue::Text(_) => None,
        }
    }
}

/// A node in the page tree.
pub trait WikiPage: Send + Sync {
    fn name(&self) -> &str;

    /// `None` for the root, and for a page whose parent no longer exists.
    fn parent(&self) -> Option<Arc<dyn WikiPage>>;

    fn is_root(&self) -> bool;

    /// Snapshot of the stored content and properties.
    fn data(&self) -> PageData;

    /// Children, ordered by name.
    fn children(&self) -> Vec<Arc<dyn WikiPage>>;

    fn child(&self, name: &str) -> Option<Arc<dyn WikiPage>> {
        self.children().into_iter().find(|child| child.name() == name)
    }

    /// Register `child` under this page, replacing a child of the same name.
    fn attach_child(&self, child: Arc<dyn WikiPage>);

    fn html(&self) -> Result<String, PageError>;

    /// Rendered value of a variable as seen from this page.
    fn variable(&self, name: &str) -> Result<Option<String>, PageError>;

    /// Present for pages written in wiki markup.
    fn as_wikitext(&self) -> Option<&dyn Wikitext> {
        None
    }
}

/// A page that exposes its own parsed markup.
pub trait Wikitext {
    fn syntax_tree(&self) -> Result<Arc<SyntaxTree>, PageError>;
}

/// Tree bookkeeping shared by every kind of page.
pub(crate) struct PageNode {
    name: String,
    parent: Option<Weak<dyn WikiPage>>,
    children: RwLock<Vec<Arc<dyn WikiPage>>>,
    data: RwLock<PageData>,
}

impl PageNode {
    pub(crate) fn new(name: String, parent: Option<Weak<dyn WikiPage>>, data: PageData) -> Self {
        PageNode {
            name,
            parent,
            children: RwLock::new(Vec::new()),
            data: RwLock::new(data),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub(crate) fn parent(&self) -> Option<Arc<dyn WikiPage>> {
        let parent = self.parent.as_ref()?.upgrade();
        if parent.is_none() {
            warn!(page = %self.name, "parent page no longer exists");
        }
        parent
    }

    pub(crate) fn data(&self) -> PageData {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_data(&self, data: PageData) {
        *self.data.write().unwrap_or_else(PoisonError::into_inner) = data;
    }

    pub(crate) fn set_content(&self, content: String) {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .content = content;
    }

    pub(crate) fn children(&self) -> Vec<Arc<dyn WikiPage>> {
        self.children
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn attach_child(&self, child: Arc<dyn WikiPage>) {
        let mut children = self.children.write().unwrap_or_else(PoisonError::into_inner);
        children.retain(|existing| existing.name() != child.name());
        let at = children.partition_point(|existing| existing.name() < child.name());
        children.insert(at, child);
    }
}
