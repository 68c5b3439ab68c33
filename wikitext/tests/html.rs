use std::collections::BTreeMap;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use wikitext::{
    FragmentPage, IncludeNotFound, Parser, ParsingPage, SourcePage, translate_fragment,
};

/// A named page with fixed content that includes copies of itself.
#[derive(Clone)]
struct NamedPage {
    name: String,
    content: String,
}

impl NamedPage {
    fn new(name: &str, content: &str) -> Arc<dyn SourcePage> {
        Arc::new(NamedPage {
            name: name.into(),
            content: content.into(),
        })
    }
}

impl SourcePage for NamedPage {
    fn name(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn full_name(&self) -> String {
        self.name.clone()
    }

    fn path(&self) -> Option<String> {
        Some(self.name.clone())
    }

    fn full_path(&self) -> Option<String> {
        Some(format!(".{}", self.name))
    }

    fn content(&self) -> String {
        self.content.clone()
    }

    fn has_property(&self, _key: &str) -> bool {
        false
    }

    fn property(&self, _key: &str) -> Option<String> {
        None
    }

    fn property_map(&self, _key: &str) -> Option<BTreeMap<String, String>> {
        None
    }

    fn children(&self) -> Vec<Arc<dyn SourcePage>> {
        Vec::new()
    }

    fn target_exists(&self, _wiki_word_path: &str) -> bool {
        false
    }

    fn make_full_path_of_target(&self, _wiki_word_path: &str) -> Option<String> {
        None
    }

    fn find_parent_path(&self, _target_name: &str) -> Option<String> {
        None
    }

    fn find_included_page(&self, page_name: &str) -> Result<Arc<dyn SourcePage>, IncludeNotFound> {
        if page_name == self.name {
            Ok(Arc::new(self.clone()))
        } else {
            Err(IncludeNotFound::new(format!("no page {}", page_name)))
        }
    }
}

fn render(markup: &str) -> String {
    translate_fragment(markup, FragmentPage::new()).expect("render failed")
}

#[test]
fn paragraph() {
    assert_eq!(render("some markup"), "<p>some markup</p>\n");
}

#[test]
fn markdown_formatting() {
    assert_eq!(
        render("# Title\n\n*one* and **two**"),
        "<h1>Title</h1>\n<p><em>one</em> and <strong>two</strong></p>\n"
    );
}

#[test]
fn raw_html_is_escaped() {
    assert_eq!(
        render("a <b>bold</b> claim"),
        "<p>a &lt;b&gt;bold&lt;/b&gt; claim</p>\n"
    );
}

#[test]
fn define_then_reference() {
    assert_eq!(
        render("!define X {1}\n${X}\n"),
        "<span class=\"meta\">variable defined: X=1</span>\n<p>1</p>\n"
    );
}

#[test]
fn reference_before_define() {
    assert_eq!(
        render("${X}\n\n!define X {late}\n"),
        "<p>late</p>\n<span class=\"meta\">variable defined: X=late</span>\n"
    );
}

#[test]
fn value_is_markdown() {
    assert_eq!(
        render("!define X {bold}\n**${X}**"),
        "<span class=\"meta\">variable defined: X=bold</span>\n<p><strong>bold</strong></p>\n"
    );
}

#[test]
fn nested_references_expand() {
    let html = render("!define A {x${B}y}\n!define B {mid}\n${A}");
    assert!(html.ends_with("<p>xmidy</p>\n"), "{}", html);
}

#[test]
fn nested_undefined_reference_stays_literal() {
    let html = render("!define A {x${NOPE}y}\n${A}");
    assert!(html.ends_with("<p>x${NOPE}y</p>\n"), "{}", html);
}

#[test]
fn undefined_variable() {
    assert_eq!(
        render("${NOPE}"),
        "<p><span class=\"meta\">undefined variable: NOPE</span></p>\n"
    );
}

#[test]
fn undefined_variable_in_code() {
    assert_eq!(render("`${NOPE}`"), "<p><code>${NOPE}</code></p>\n");
}

#[test]
fn circular_reference() {
    let html = render("!define A {${B}}\n!define B {${A}}\n${A}");
    assert!(
        html.contains("<span class=\"error\">circular variable reference: A</span>"),
        "{}",
        html
    );
}

#[test]
fn self_reference() {
    let html = render("!define A {again ${A}}\n${A}");
    assert!(
        html.contains("<span class=\"error\">circular variable reference: A</span>"),
        "{}",
        html
    );
}

#[test]
fn variable_definition_mode_escapes_everything() {
    let context = Arc::new(ParsingPage::new(Arc::new(FragmentPage::new())));
    context.put_variable("X", "<i>");
    let tree = Parser::variable_definition()
        .parse("a<b ${X} FrontPage", context)
        .expect("parse failed");
    assert_eq!(tree.to_html(), "a&lt;b &lt;i&gt; FrontPage");
}

#[test]
fn missing_wiki_word_target() {
    assert_eq!(
        render("SomePage"),
        "<p>SomePage<a title=\"create page\" href=\"SomePage?edit&amp;nonExistent=true\">[?]</a></p>\n"
    );
}

#[test]
fn wiki_word_with_target() {
    let html = translate_fragment(
        "See SomePage.",
        FragmentPage::new().with_target_path("TargetPage"),
    )
    .expect("render failed");
    assert_eq!(html, "<p>See <a href=\"TargetPage\">SomePage</a>.</p>\n");
}

#[test]
fn include() {
    let page = FragmentPage::new().with_included_page(NamedPage::new("IncludedPage", "inner ${X}"));
    let html = translate_fragment("!define X {1}\n!include IncludedPage", page).expect("render failed");
    assert_eq!(
        html,
        "<span class=\"meta\">variable defined: X=1</span>\n\
         <div class=\"included\">\n<p>inner 1</p>\n</div>\n"
    );
}

#[test]
fn seamless_include() {
    let page = FragmentPage::new().with_included_page(NamedPage::new("IncludedPage", "inner"));
    let html = translate_fragment("!include -seamless IncludedPage", page).expect("render failed");
    assert_eq!(html, "<p>inner</p>\n");
}

#[test]
fn include_not_found() {
    assert_eq!(
        render("!include NothingHere"),
        "<span class=\"error\">page include failed: missing</span>"
    );
}

#[test]
fn include_loop() {
    let page = FragmentPage::new().with_included_page(NamedPage::new("LoopPage", "!include LoopPage"));
    let html = translate_fragment("!include LoopPage", page).expect("render failed");
    assert_eq!(
        html,
        "<div class=\"included\">\n<span class=\"error\">circular include of LoopPage</span></div>\n"
    );
}
