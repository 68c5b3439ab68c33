//! Rendering of syntax trees to HTML.
//!
//! Markup runs are assembled into one Markdown string per run, with variable
//! values spliced in as text and generated HTML (links, diagnostics) standing
//! in as placeholders. The Markdown is rendered by pulldown-cmark and the
//! placeholders are swapped back for their HTML on the event stream, which
//! is also where raw HTML typed by authors gets escaped.

use std::sync::Arc;

use pulldown_cmark::{Event, Options, Parser as CmarkParser, Tag, TagEnd, TextMergeStream};
use tracing::warn;

use crate::parser::Parser;
use crate::parsing_page::ParsingPage;
use crate::symbol::{Included, Inline, Symbol, SymbolSet, SyntaxTree};

const PLACEHOLDER_OPEN: char = '\u{F8F0}';
const PLACEHOLDER_CLOSE: char = '\u{F8F1}';

/// Render a tree parsed with either symbol set.
pub fn render(tree: &SyntaxTree) -> String {
    let mut renderer = HtmlRenderer::new(tree.parsing_page().clone());
    match tree.symbol_set() {
        SymbolSet::Full => renderer.render_tree(tree),
        SymbolSet::VariableDefinition => renderer.render_expanded(tree.symbols()),
    }
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Outcome of expanding one `${NAME}`.
enum Expansion {
    Value(String),
    Undefined,
    /// The name (re)appeared while its own value was being expanded.
    Circular(String),
}

struct HtmlRenderer {
    parsing_page: Arc<ParsingPage>,
    /// Variables whose values are being expanded, innermost last.
    expanding: Vec<String>,
}

impl HtmlRenderer {
    fn new(parsing_page: Arc<ParsingPage>) -> Self {
        HtmlRenderer {
            parsing_page,
            expanding: Vec::new(),
        }
    }

    fn render_tree(&mut self, tree: &SyntaxTree) -> String {
        let mut html = String::new();
        let mut includes = 0;
        for symbol in tree.symbols() {
            match symbol {
                Symbol::Markup(inlines) => html.push_str(&self.render_markup(inlines)),
                Symbol::Define { name, value, .. } => {
                    html.push_str(&format!(
                        "<span class=\"meta\">variable defined: {}={}</span>\n",
                        escape_html(name),
                        escape_html(value)
                    ));
                }
                Symbol::Include { seamless, .. } => {
                    html.push_str(&self.render_include(tree.included(includes), *seamless));
                    includes += 1;
                }
            }
        }
        html
    }

    /// Restricted mode: text only, escaped, with references expanded.
    fn render_expanded(&mut self, symbols: &[Symbol]) -> String {
        let mut html = String::new();
        for symbol in symbols {
            let Symbol::Markup(inlines) = symbol else {
                continue;
            };
            for inline in inlines {
                match inline {
                    Inline::Text(text) | Inline::WikiWord { path: text, .. } => {
                        html.push_str(&escape_html(text))
                    }
                    Inline::Variable { name, .. } => match self.expand_variable(name) {
                        Expansion::Value(value) => html.push_str(&escape_html(&value)),
                        Expansion::Undefined => html.push_str(&undefined_variable(name)),
                        Expansion::Circular(name) => html.push_str(&circular_variable(&name)),
                    },
                }
            }
        }
        html
    }

    fn render_markup(&mut self, inlines: &[Inline]) -> String {
        let mut markdown = String::new();
        let mut fragments = Fragments::default();

        for inline in inlines {
            match inline {
                Inline::Text(text) => markdown.push_str(text),
                Inline::Variable { name, .. } => match self.expand_variable(name) {
                    Expansion::Value(value) => markdown.push_str(&value),
                    Expansion::Undefined => markdown
                        .push_str(&fragments.push(undefined_variable(name), format!("${{{}}}", name))),
                    Expansion::Circular(circular) => markdown.push_str(
                        &fragments.push(circular_variable(&circular), format!("${{{}}}", name)),
                    ),
                },
                Inline::WikiWord { path, .. } => {
                    markdown.push_str(&fragments.push(self.wiki_word(path), path.clone()))
                }
            }
        }

        fragments.render_markdown(&markdown)
    }

    /// Resolve `name` and expand the references inside its value, as text.
    /// Undefined references nested in a value are left as written.
    fn expand_variable(&mut self, name: &str) -> Expansion {
        if self.expanding.iter().any(|n| n == name) {
            warn!(name, chain = ?self.expanding, "circular variable reference");
            return Expansion::Circular(name.to_string());
        }

        let Some(raw) = self.parsing_page.find_variable(name) else {
            return Expansion::Undefined;
        };
        let tree = match Parser::variable_definition().parse(&raw, self.parsing_page.clone()) {
            Ok(tree) => tree,
            Err(_) => return Expansion::Value(raw),
        };

        self.expanding.push(name.to_string());
        let mut text = String::new();
        let mut outcome = None;
        for inline in tree.symbols().iter().flat_map(|symbol| match symbol {
            Symbol::Markup(inlines) => inlines.as_slice(),
            _ => &[][..],
        }) {
            match inline {
                Inline::Text(t) | Inline::WikiWord { path: t, .. } => text.push_str(t),
                Inline::Variable { name: nested, .. } => match self.expand_variable(nested) {
                    Expansion::Value(value) => text.push_str(&value),
                    Expansion::Undefined => text.push_str(&format!("${{{}}}", nested)),
                    circular @ Expansion::Circular(_) => {
                        outcome = Some(circular);
                        break;
                    }
                },
            }
        }
        self.expanding.pop();

        outcome.unwrap_or(Expansion::Value(text))
    }

    fn wiki_word(&self, path: &str) -> String {
        let page = self.parsing_page.page();
        let href = page
            .make_full_path_of_target(path)
            .unwrap_or_else(|| path.to_string());
        if page.target_exists(path) {
            format!("<a href=\"{}\">{}</a>", escape_html(&href), escape_html(path))
        } else {
            format!(
                "{}<a title=\"create page\" href=\"{}?edit&amp;nonExistent=true\">[?]</a>",
                escape_html(path),
                escape_html(&href)
            )
        }
    }

    fn render_include(&mut self, included: Option<&Included>, seamless: bool) -> String {
        let tree = match included {
            Some(Included::Page(tree)) => tree,
            Some(Included::Failed(message)) => return error(message),
            None => return error("page include failed"),
        };

        let outer = std::mem::replace(&mut self.parsing_page, tree.parsing_page().clone());
        let body = self.render_tree(tree);
        self.parsing_page = outer;

        if seamless {
            body
        } else {
            format!("<div class=\"included\">\n{}</div>\n", body)
        }
    }
}

fn undefined_variable(name: &str) -> String {
    format!(
        "<span class=\"meta\">undefined variable: {}</span>",
        escape_html(name)
    )
}

fn circular_variable(name: &str) -> String {
    error(&format!("circular variable reference: {}", name))
}

fn error(message: &str) -> String {
    format!("<span class=\"error\">{}</span>", escape_html(message))
}

/// Generated HTML waiting to be put back into the Markdown output.
#[derive(Default)]
struct Fragments {
    /// `(html, plain text)` per placeholder; the text is used where HTML
    /// cannot go, such as inside code.
    entries: Vec<(String, String)>,
}

impl Fragments {
    fn push(&mut self, html: String, text: String) -> String {
        self.entries.push((html, text));
        format!(
            "{}{}{}",
            PLACEHOLDER_OPEN,
            self.entries.len() - 1,
            PLACEHOLDER_CLOSE
        )
    }

    fn render_markdown(&self, markdown: &str) -> String {
        let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
        let mut events = Vec::new();
        let mut in_code_block = false;

        for event in TextMergeStream::new(CmarkParser::new_ext(markdown, options)) {
            match event {
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code_block = true;
                    events.push(Event::Start(Tag::CodeBlock(kind)));
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    events.push(Event::End(TagEnd::CodeBlock));
                }
                Event::Text(text) | Event::Html(text) | Event::InlineHtml(text) => {
                    if in_code_block {
                        events.push(Event::Text(self.plain_text(&text).into()));
                    } else {
                        self.substitute(&text, &mut events);
                    }
                }
                Event::Code(code) => events.push(Event::Code(self.plain_text(&code).into())),
                other => events.push(other),
            }
        }

        let mut html = String::new();
        pulldown_cmark::html::push_html(&mut html, events.into_iter());
        html
    }

    /// Split `text` at placeholders into escaped text and generated HTML.
    fn substitute<'e>(&self, text: &str, events: &mut Vec<Event<'e>>) {
        let mut rest = text;
        while let Some((before, index, after)) = self.next_placeholder(rest) {
            if !before.is_empty() {
                events.push(Event::Text(before.to_string().into()));
            }
            events.push(Event::InlineHtml(self.entries[index].0.clone().into()));
            rest = after;
        }
        if !rest.is_empty() {
            events.push(Event::Text(rest.to_string().into()));
        }
    }

    fn plain_text(&self, text: &str) -> String {
        let mut plain = String::new();
        let mut rest = text;
        while let Some((before, index, after)) = self.next_placeholder(rest) {
            plain.push_str(before);
            plain.push_str(&self.entries[index].1);
            rest = after;
        }
        plain.push_str(rest);
        plain
    }

    fn next_placeholder<'t>(&self, text: &'t str) -> Option<(&'t str, usize, &'t str)> {
        let open = text.find(PLACEHOLDER_OPEN)?;
        let digits_start = open + PLACEHOLDER_OPEN.len_utf8();
        let close = text[digits_start..].find(PLACEHOLDER_CLOSE)? + digits_start;
        let index = text[digits_start..close]
            .parse::<usize>()
            .ok()
            .filter(|i| *i < self.entries.len())?;
        Some((
            &text[..open],
            index,
            &text[close + PLACEHOLDER_CLOSE.len_utf8()..],
        ))
    }
}
