use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use wikitext::source_page::by_name;
use wikitext::{IncludeNotFound, SourcePage};

use crate::crawler::{self, WikiPagePath};
use crate::page::WikiPage;

/// The parser's view of a page in the tree.
///
/// Holds the page weakly: a page's parse context must not keep the page
/// alive. Once the page is gone every question answers as absent.
pub struct WikiSourcePage {
    page: Weak<dyn WikiPage>,
}

impl WikiSourcePage {
    pub fn new(page: &Arc<dyn WikiPage>) -> Self {
        WikiSourcePage {
            page: Arc::downgrade(page),
        }
    }

    pub(crate) fn from_weak(page: Weak<dyn WikiPage>) -> Self {
        WikiSourcePage { page }
    }

    fn page(&self) -> Option<Arc<dyn WikiPage>> {
        self.page.upgrade()
    }
}

impl SourcePage for WikiSourcePage {
    fn name(&self) -> Option<String> {
        self.page().map(|page| page.name().to_string())
    }

    fn full_name(&self) -> String {
        self.page()
            .map(|page| crawler::full_name(&*page))
            .unwrap_or_default()
    }

    fn path(&self) -> Option<String> {
        let page = self.page()?;
        Some(
            page.parent()
                .map(|parent| crawler::full_name(&*parent))
                .unwrap_or_default(),
        )
    }

    fn full_path(&self) -> Option<String> {
        self.page().map(|page| format!(".{}", crawler::full_name(&*page)))
    }

    fn content(&self) -> String {
        self.page()
            .map(|page| page.data().content)
            .unwrap_or_default()
    }

    fn has_property(&self, key: &str) -> bool {
        self.page()
            .is_some_and(|page| page.data().properties.contains_key(key))
    }

    fn property(&self, key: &str) -> Option<String> {
        self.page()?.data().property(key).map(str::to_string)
    }

    fn property_map(&self, key: &str) -> Option<BTreeMap<String, String>> {
        self.page()?.data().property_map(key).cloned()
    }

    fn children(&self) -> Vec<Arc<dyn SourcePage>> {
        let mut children: Vec<Arc<dyn SourcePage>> = self
            .page()
            .map(|page| page.children())
            .unwrap_or_default()
            .iter()
            .map(|child| Arc::new(WikiSourcePage::new(child)) as Arc<dyn SourcePage>)
            .collect();
        children.sort_by(|a, b| by_name(a.as_ref(), b.as_ref()));
        children
    }

    fn target_exists(&self, wiki_word_path: &str) -> bool {
        let (Some(page), Some(path)) = (self.page(), WikiPagePath::parse(wiki_word_path)) else {
            return false;
        };
        crawler::resolve(&page, &path).is_some()
    }

    fn make_full_path_of_target(&self, wiki_word_path: &str) -> Option<String> {
        let page = self.page()?;
        let path = WikiPagePath::parse(wiki_word_path)?;
        crawler::target_full_name(&page, &path)
    }

    fn find_parent_path(&self, target_name: &str) -> Option<String> {
        let page = self.page()?;
        crawler::find_ancestor(&page, target_name).map(|ancestor| crawler::full_name(&*ancestor))
    }

    fn find_included_page(&self, page_name: &str) -> Result<Arc<dyn SourcePage>, IncludeNotFound> {
        let page = self
            .page()
            .ok_or_else(|| IncludeNotFound::new("including page no longer exists"))?;
        let path = WikiPagePath::parse(page_name)
            .ok_or_else(|| IncludeNotFound::new(format!("invalid page name: {}", page_name)))?;
        let included = crawler::resolve(&page, &path)
            .ok_or_else(|| IncludeNotFound::new(format!("page {} not found", page_name)))?;
        Ok(Arc::new(WikiSourcePage::new(&included)))
    }
}
