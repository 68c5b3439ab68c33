//! Pages written in wiki markup, parsed once on first use.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::{debug, trace, warn};
use wikitext::variables::{ApplicationVariableSource, PageVariableSource, UserVariableSource};
use wikitext::{
    CompositeVariableSource, Parser, ParsingPage, ResolutionCache, SourcePage, SyntaxTree,
    VariableSource,
};

use crate::crawler;
use crate::error::PageError;
use crate::page::{PageData, PageNode, WikiPage, Wikitext};
use crate::source_page::WikiSourcePage;

enum ParseState {
    Unbuilt,
    /// The tree owns the parse context it was built with, so the two are
    /// always replaced together.
    Built(Arc<SyntaxTree>),
}

/// A markup page that builds its syntax tree lazily and keeps it until
/// [`WikitextPage::reset_cache`] is called.
pub struct WikitextPage {
    node: PageNode,
    variable_source: Arc<dyn VariableSource>,
    me: Weak<WikitextPage>,
    state: Mutex<ParseState>,
}

impl WikitextPage {
    fn build(
        name: impl Into<String>,
        parent: Option<Weak<dyn WikiPage>>,
        data: PageData,
        variable_source: Arc<dyn VariableSource>,
    ) -> Arc<Self> {
        let name = name.into();
        Arc::new_cyclic(|me| WikitextPage {
            node: PageNode::new(name, parent, data),
            variable_source,
            me: me.clone(),
            state: Mutex::new(ParseState::Unbuilt),
        })
    }

    /// The root of a tree, resolving unknown variables through `variable_source`.
    pub fn root(
        name: impl Into<String>,
        data: PageData,
        variable_source: Arc<dyn VariableSource>,
    ) -> Arc<Self> {
        Self::build(name, None, data, variable_source)
    }

    /// A child sharing its parent's host variable source.
    pub fn child_of(parent: &Arc<WikitextPage>, name: impl Into<String>, data: PageData) -> Arc<Self> {
        let source = parent.variable_source.clone();
        let parent: Arc<dyn WikiPage> = parent.clone();
        Self::child_of_with_source(&parent, name, data, source)
    }

    /// A child of any kind of page, with its own host variable source.
    pub fn child_of_with_source(
        parent: &Arc<dyn WikiPage>,
        name: impl Into<String>,
        data: PageData,
        variable_source: Arc<dyn VariableSource>,
    ) -> Arc<Self> {
        let child = Self::build(name, Some(Arc::downgrade(parent)), data, variable_source);
        parent.attach_child(child.clone());
        child
    }

    pub fn variable_source(&self) -> &Arc<dyn VariableSource> {
        &self.variable_source
    }

    pub fn full_name(&self) -> String {
        crawler::full_name(self)
    }

    /// The page's syntax tree, parsing the content on first use.
    ///
    /// Concurrent callers wait for a single parse. A failed parse is not
    /// remembered; the next call tries again.
    pub fn syntax_tree(&self) -> Result<Arc<SyntaxTree>, PageError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let ParseState::Built(tree) = &*state {
            return Ok(tree.clone());
        }

        let content = self.node.data().content;
        let parsing_page = Arc::new(make_parsing_page(self));
        let tree = Parser::new()
            .parse(&content, parsing_page)
            .map_err(|errors| PageError::Parse {
                page: self.full_name(),
                content: content.clone(),
                errors,
            })?;
        debug!(page = %self.full_name(), symbols = tree.symbols().len(), "parsed page");

        let tree = Arc::new(tree);
        *state = ParseState::Built(tree.clone());
        Ok(tree)
    }

    /// Drop the built tree; the next access parses again.
    pub fn reset_cache(&self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(*state, ParseState::Built(_)) {
            debug!(page = %self.full_name(), "discarding parsed page");
        }
        *state = ParseState::Unbuilt;
    }

    /// Replace the stored content. A tree that is already built is kept.
    pub fn set_content(&self, content: impl Into<String>) {
        self.node.set_content(content.into());
    }

    /// Replace content and properties. A tree that is already built is kept.
    pub fn set_data(&self, data: PageData) {
        self.node.set_data(data);
    }

    /// Store new data and discard the built tree.
    pub fn commit(&self, data: PageData) {
        self.node.set_data(data);
        self.reset_cache();
    }

    fn weak_self(&self) -> Weak<dyn WikiPage> {
        self.me.clone()
    }
}

impl WikiPage for WikitextPage {
    fn name(&self) -> &str {
        self.node.name()
    }

    fn parent(&self) -> Option<Arc<dyn WikiPage>> {
        self.node.parent()
    }

    fn is_root(&self) -> bool {
        self.node.is_root()
    }

    fn data(&self) -> PageData {
        self.node.data()
    }

    fn children(&self) -> Vec<Arc<dyn WikiPage>> {
        self.node.children()
    }

    fn attach_child(&self, child: Arc<dyn WikiPage>) {
        self.node.attach_child(child);
    }

    fn html(&self) -> Result<String, PageError> {
        Ok(self.syntax_tree()?.to_html())
    }

    fn variable(&self, name: &str) -> Result<Option<String>, PageError> {
        let tree = self.syntax_tree()?;
        let Some(raw) = tree.find_variable(name) else {
            return Ok(None);
        };
        let value = Parser::variable_definition()
            .parse(&raw, tree.parsing_page().clone())
            .map_err(|errors| PageError::Parse {
                page: self.full_name(),
                content: raw.clone(),
                errors,
            })?;
        Ok(Some(value.to_html()))
    }

    fn as_wikitext(&self) -> Option<&dyn Wikitext> {
        Some(self)
    }
}

impl Wikitext for WikitextPage {
    fn syntax_tree(&self) -> Result<Arc<SyntaxTree>, PageError> {
        WikitextPage::syntax_tree(self)
    }
}

/// The parse context of `page`, with its variable chain:
/// application variables, page built-ins and properties, URL variables,
/// values recorded while parsing, the parent page, then the host source.
pub fn make_parsing_page(page: &WikitextPage) -> ParsingPage {
    let host = page.variable_source.clone();
    let source_page: Arc<dyn SourcePage> = Arc::new(WikiSourcePage::from_weak(page.weak_self()));
    let cache = Arc::new(ResolutionCache::new());

    let chain = CompositeVariableSource::new(vec![
        Arc::new(ApplicationVariableSource::new(host.clone())),
        Arc::new(PageVariableSource::new(source_page.clone())),
        Arc::new(UserVariableSource::new(host.clone())),
        cache.clone(),
        Arc::new(ParentPageVariableSource::new(page.weak_self())),
        host,
    ]);

    ParsingPage::with_variable_source(source_page, Arc::new(chain), cache)
}

/// Resolves variables through the parent page, as the parent sees them.
pub struct ParentPageVariableSource {
    page: Weak<dyn WikiPage>,
}

impl ParentPageVariableSource {
    pub fn new(page: Weak<dyn WikiPage>) -> Self {
        ParentPageVariableSource { page }
    }
}

impl VariableSource for ParentPageVariableSource {
    fn find_variable(&self, name: &str) -> Option<String> {
        let page = self.page.upgrade()?;
        if page.is_root() {
            return None;
        }
        let parent = page.parent()?;
        trace!(page = page.name(), parent = parent.name(), name, "asking parent page");

        match parent.as_wikitext() {
            Some(wikitext) => match wikitext.syntax_tree() {
                Ok(tree) => tree.find_variable(name),
                Err(err) => {
                    warn!(parent = parent.name(), %err, "parent page does not parse");
                    None
                }
            },
            None => match parent.variable(name) {
                Ok(value) => value,
                Err(err) => {
                    warn!(parent = parent.name(), %err, "parent page variable lookup failed");
                    None
                }
            },
        }
    }
}
