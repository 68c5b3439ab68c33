//! Rendering of markup that does not live on any page, such as the text of
//! a generated value or a table cell.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::parser::{ParseError, Parser};
use crate::parsing_page::ParsingPage;
use crate::source_page::{IncludeNotFound, SourcePage};

/// Full name reported by ad-hoc pages.
pub const FRAGMENT_FULL_NAME: &str = "fullname";

/// A stand-in page for ad-hoc markup.
///
/// Every part that is not configured answers as absent: no name, no path,
/// no children, no properties, no include target. Wiki words exist only
/// when a target path is configured, and then all of them point at it.
#[derive(Clone, Default)]
pub struct FragmentPage {
    content: String,
    properties: BTreeMap<String, String>,
    included_page: Option<Arc<dyn SourcePage>>,
    target_path: Option<String>,
}

impl FragmentPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn with_included_page(mut self, page: Arc<dyn SourcePage>) -> Self {
        self.included_page = Some(page);
        self
    }

    pub fn with_target_path(mut self, path: impl Into<String>) -> Self {
        self.target_path = Some(path.into());
        self
    }
}

impl SourcePage for FragmentPage {
    fn name(&self) -> Option<String> {
        None
    }

    fn full_name(&self) -> String {
        FRAGMENT_FULL_NAME.to_string()
    }

    fn path(&self) -> Option<String> {
        None
    }

    fn full_path(&self) -> Option<String> {
        None
    }

    fn content(&self) -> String {
        self.content.clone()
    }

    fn has_property(&self, key: &str) -> bool {
        self.properties.contains_key(key)
    }

    fn property(&self, key: &str) -> Option<String> {
        self.properties.get(key).cloned()
    }

    fn children(&self) -> Vec<Arc<dyn SourcePage>> {
        Vec::new()
    }

    fn target_exists(&self, _wiki_word_path: &str) -> bool {
        self.target_path.is_some()
    }

    fn make_full_path_of_target(&self, _wiki_word_path: &str) -> Option<String> {
        self.target_path.clone()
    }

    fn find_parent_path(&self, _target_name: &str) -> Option<String> {
        None
    }

    fn find_included_page(&self, _page_name: &str) -> Result<Arc<dyn SourcePage>, IncludeNotFound> {
        self.included_page
            .clone()
            .ok_or_else(|| IncludeNotFound::new("missing"))
    }
}

/// Render `markup` to HTML on a throwaway page configured by `page`.
pub fn translate_fragment(markup: &str, page: FragmentPage) -> Result<String, Vec<ParseError>> {
    let page: Arc<dyn SourcePage> = Arc::new(page.with_content(markup));
    let parsing_page = Arc::new(ParsingPage::new(page));
    let tree = Parser::new().parse(markup, parsing_page)?;
    Ok(tree.to_html())
}
