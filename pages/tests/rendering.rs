use std::sync::Arc;

use pages::{PageData, WikiPage, WikiPagePath, WikiSourcePage, WikitextPage, find_page};
use pretty_assertions::assert_eq;
use wikitext::{MapVariableSource, SourcePage, VariableSource};

fn host() -> Arc<dyn VariableSource> {
    Arc::new(MapVariableSource::new())
}

/// Root
///   FrontPage
///     SubPage
///       DeepPage
///   OtherPage
struct Tree {
    root: Arc<WikitextPage>,
    front: Arc<WikitextPage>,
    sub: Arc<WikitextPage>,
    deep: Arc<WikitextPage>,
    other: Arc<WikitextPage>,
}

fn tree() -> Tree {
    let root = WikitextPage::root("Root", PageData::new(""), host());
    let front = WikitextPage::child_of(&root, "FrontPage", PageData::new(""));
    let sub = WikitextPage::child_of(&front, "SubPage", PageData::new(""));
    let deep = WikitextPage::child_of(&sub, "DeepPage", PageData::new(""));
    let other = WikitextPage::child_of(&root, "OtherPage", PageData::new("other text"));
    Tree {
        root,
        front,
        sub,
        deep,
        other,
    }
}

fn facade(page: &Arc<WikitextPage>) -> WikiSourcePage {
    let page: Arc<dyn WikiPage> = page.clone();
    WikiSourcePage::new(&page)
}

fn render(page: &Arc<WikitextPage>, content: &str) -> String {
    page.commit(PageData::new(content));
    page.html().unwrap()
}

#[test]
fn path_kinds() {
    assert!(WikiPagePath::parse("").is_none());
    assert!(WikiPagePath::parse("A..B").is_none());
    assert!(WikiPagePath::parse(".").is_none());
    assert_eq!(
        WikiPagePath::parse("<FrontPage.SubPage").unwrap().names(),
        &["FrontPage".to_string(), "SubPage".to_string()]
    );
}

#[test]
fn facade_identity() {
    let tree = tree();
    let sub = facade(&tree.sub);
    assert_eq!(sub.name().as_deref(), Some("SubPage"));
    assert_eq!(sub.full_name(), "FrontPage.SubPage");
    assert_eq!(sub.path().as_deref(), Some("FrontPage"));
    assert_eq!(sub.full_path().as_deref(), Some(".FrontPage.SubPage"));
    assert_eq!(facade(&tree.root).full_name(), "");
    assert_eq!(facade(&tree.front).path().as_deref(), Some(""));
    assert_eq!(facade(&tree.deep).path().as_deref(), Some("FrontPage.SubPage"));

    let children: Vec<_> = facade(&tree.root)
        .children()
        .iter()
        .filter_map(|child| child.name())
        .collect();
    assert_eq!(children, vec!["FrontPage", "OtherPage"]);
}

#[test]
fn facade_properties() {
    let tree = tree();
    let mut map = std::collections::BTreeMap::new();
    map.insert("key".to_string(), "value".to_string());
    tree.other.commit(
        PageData::new("")
            .with_property("Suite", "true")
            .with_property_map("Help", map.clone()),
    );

    let other = facade(&tree.other);
    assert!(other.has_property("Suite"));
    assert!(other.has_property("Help"));
    assert_eq!(other.property("Suite").as_deref(), Some("true"));
    assert_eq!(other.property("Help"), None);
    assert_eq!(other.property_map("Help"), Some(map));
}

#[test]
fn target_resolution() {
    let tree = tree();
    let sub = facade(&tree.sub);

    assert!(!sub.target_exists("DeepPage"));
    assert!(sub.target_exists(">DeepPage"));
    assert!(sub.target_exists("^DeepPage"));
    assert!(sub.target_exists(".OtherPage"));
    assert!(sub.target_exists("<FrontPage.SubPage.DeepPage"));
    assert!(!sub.target_exists("<NoSuchPage"));

    assert_eq!(sub.make_full_path_of_target(">NewPage").as_deref(), Some("FrontPage.SubPage.NewPage"));
    assert_eq!(sub.make_full_path_of_target("SiblingPage").as_deref(), Some("FrontPage.SiblingPage"));
    assert_eq!(sub.make_full_path_of_target(".OtherPage").as_deref(), Some("OtherPage"));
    assert_eq!(facade(&tree.deep).find_parent_path("FrontPage").as_deref(), Some("FrontPage"));
    assert_eq!(facade(&tree.deep).find_parent_path("OtherPage"), None);
}

#[test]
fn wiki_word_links() {
    let tree = tree();
    assert_eq!(
        render(&tree.front, "See OtherPage."),
        "<p>See <a href=\"OtherPage\">OtherPage</a>.</p>\n"
    );
    assert_eq!(
        render(&tree.front, "See >SubPage."),
        "<p>See <a href=\"FrontPage.SubPage\">&gt;SubPage</a>.</p>\n"
    );
    assert_eq!(
        render(&tree.front, "See MissingPage."),
        "<p>See MissingPage<a title=\"create page\" href=\"MissingPage?edit&amp;nonExistent=true\">[?]</a>.</p>\n"
    );
}

#[test]
fn include_renders_in_the_includers_context() {
    let tree = tree();
    tree.other.commit(PageData::new("included ${COLOR} on ${PAGE_NAME}"));
    let html = render(&tree.front, "!define COLOR {red}\n!include OtherPage");
    assert_eq!(
        html,
        "<span class=\"meta\">variable defined: COLOR=red</span>\n\
         <div class=\"included\">\n<p>included red on FrontPage</p>\n</div>\n"
    );
}

#[test]
fn seamless_include() {
    let tree = tree();
    assert_eq!(render(&tree.front, "!include -seamless .OtherPage"), "<p>other text</p>\n");
}

#[test]
fn included_wiki_words_resolve_from_the_included_page() {
    let tree = tree();
    tree.sub.commit(PageData::new(">DeepPage"));
    assert_eq!(
        render(&tree.other, "!include -seamless .FrontPage.SubPage"),
        "<p><a href=\"FrontPage.SubPage.DeepPage\">&gt;DeepPage</a></p>\n"
    );
}

#[test]
fn include_not_found() {
    let tree = tree();
    assert_eq!(
        render(&tree.front, "!include NoSuchPage"),
        "<span class=\"error\">page include failed: page NoSuchPage not found</span>"
    );
}

#[test]
fn include_loop() {
    let tree = tree();
    tree.other.commit(PageData::new("!include FrontPage"));
    let html = render(&tree.front, "!include OtherPage");
    assert_eq!(
        html,
        "<div class=\"included\">\n<span class=\"error\">circular include of FrontPage</span></div>\n"
    );
}

#[test]
fn find_page_by_full_name() {
    let tree = tree();
    let root: Arc<dyn WikiPage> = tree.root.clone();
    assert_eq!(find_page(&root, "FrontPage.SubPage.DeepPage").unwrap().name(), "DeepPage");
    assert_eq!(find_page(&root, ".OtherPage").unwrap().name(), "OtherPage");
    assert!(find_page(&root, "").unwrap().is_root());
    assert!(find_page(&root, "FrontPage.Nope").is_err());
}

#[test]
fn attach_replaces_same_name() {
    let tree = tree();
    WikitextPage::child_of(&tree.root, "OtherPage", PageData::new("replacement"));
    let root: Arc<dyn WikiPage> = tree.root.clone();
    let names: Vec<_> = root.children().iter().map(|c| c.name().to_string()).collect();
    assert_eq!(names, vec!["FrontPage", "OtherPage"]);
    assert_eq!(root.child("OtherPage").unwrap().html().unwrap(), "<p>replacement</p>\n");
}

#[test]
fn definitions_from_included_pages_are_known_before_rendering() {
    let tree = tree();
    tree.other.commit(PageData::new("!define X {inc}"));
    tree.front.commit(PageData::new("${X}\n\n!include -seamless OtherPage"));

    assert_eq!(tree.front.variable("X").unwrap().as_deref(), Some("inc"));
    let first = tree.front.html().unwrap();
    let second = tree.front.html().unwrap();
    assert_eq!(first, "<p>inc</p>\n<span class=\"meta\">variable defined: X=inc</span>\n");
    assert_eq!(first, second);
    assert_eq!(tree.front.variable("X").unwrap().as_deref(), Some("inc"));
}

#[test]
fn later_definitions_on_the_page_win_over_included_ones() {
    let tree = tree();
    tree.other.commit(PageData::new("!define X {inc}"));
    tree.front.commit(PageData::new("!include -seamless OtherPage\n!define X {own}\n${X}"));

    let first = tree.front.html().unwrap();
    assert!(first.ends_with("<p>own</p>\n"), "{}", first);
    assert_eq!(tree.front.html().unwrap(), first);
}
