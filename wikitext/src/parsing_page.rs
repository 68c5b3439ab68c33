use std::sync::Arc;

use crate::source_page::SourcePage;
use crate::variables::{ResolutionCache, VariableSource};

/// Everything the parser needs to know about the page it is working on.
///
/// Binds one page's facade, the chain its variables resolve through and the
/// cache that remembers what was defined or looked up while parsing it.
/// Built once per parse; never reused after the page's tree is discarded.
pub struct ParsingPage {
    page: Arc<dyn SourcePage>,
    variable_source: Arc<dyn VariableSource>,
    cache: Arc<ResolutionCache>,
}

impl ParsingPage {
    /// A context whose only variables are the ones defined while parsing.
    pub fn new(page: Arc<dyn SourcePage>) -> Self {
        let cache = Arc::new(ResolutionCache::new());
        ParsingPage {
            page,
            variable_source: cache.clone(),
            cache,
        }
    }

    /// `cache` is expected to be one of the links of `variable_source`.
    pub fn with_variable_source(
        page: Arc<dyn SourcePage>,
        variable_source: Arc<dyn VariableSource>,
        cache: Arc<ResolutionCache>,
    ) -> Self {
        ParsingPage {
            page,
            variable_source,
            cache,
        }
    }

    /// Context for content included into this page: links resolve against
    /// the included page, variables keep resolving against the includer.
    pub fn for_include(&self, page: Arc<dyn SourcePage>) -> Self {
        ParsingPage {
            page,
            variable_source: self.variable_source.clone(),
            cache: self.cache.clone(),
        }
    }

    pub fn page(&self) -> &Arc<dyn SourcePage> {
        &self.page
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Look a variable up through the chain, remembering the answer.
    pub fn find_variable(&self, name: &str) -> Option<String> {
        let value = self.variable_source.find_variable(name)?;
        self.cache.record(name, &value);
        Some(value)
    }

    pub fn put_variable(&self, name: &str, value: &str) {
        self.cache.record(name, value);
    }
}
