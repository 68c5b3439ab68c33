use std::ops::Range;
use std::sync::Arc;

use crate::html;
use crate::parsing_page::ParsingPage;

/// Which symbols the parser recognises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymbolSet {
    /// Directives, variable references, wiki words and Markdown.
    #[default]
    Full,
    /// Only `${NAME}` references; everything else is literal text.
    /// Used to expand the raw value of a variable.
    VariableDefinition,
}

/// A block-level symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    /// A run of Markdown text with embedded inline symbols.
    Markup(Vec<Inline>),
    /// `!define NAME {value}`. `value` is kept raw, unexpanded.
    Define {
        name: String,
        value: String,
        span: Range<usize>,
    },
    /// `!include [-seamless] PageName`
    Include {
        page: String,
        seamless: bool,
        span: Range<usize>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(String),
    /// `${NAME}`
    Variable { name: String, span: Range<usize> },
    /// A link to another page, e.g. `FrontPage.SubPage` or `<ParentPage.SubPage`.
    WikiWord { path: String, span: Range<usize> },
}

/// What an `!include` turned into when the including page was parsed.
pub enum Included {
    /// The included page's tree, parsed in a context derived from the
    /// includer's.
    Page(SyntaxTree),
    /// The include could not be honoured; the message is shown in its place.
    Failed(String),
}

/// A parsed page (or variable value), bound to the context it was parsed in.
///
/// Holding the `ParsingPage` inside the tree means the two are always
/// built, cached and thrown away together.
pub struct SyntaxTree {
    symbols: Vec<Symbol>,
    symbol_set: SymbolSet,
    parsing_page: Arc<ParsingPage>,
    /// One entry per `Symbol::Include`, in document order.
    includes: Vec<Included>,
}

impl SyntaxTree {
    pub(crate) fn new(
        symbols: Vec<Symbol>,
        symbol_set: SymbolSet,
        parsing_page: Arc<ParsingPage>,
        includes: Vec<Included>,
    ) -> Self {
        SyntaxTree {
            symbols,
            symbol_set,
            parsing_page,
            includes,
        }
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn symbol_set(&self) -> SymbolSet {
        self.symbol_set
    }

    pub fn parsing_page(&self) -> &Arc<ParsingPage> {
        &self.parsing_page
    }

    /// The resolved form of the `index`-th `!include` of this tree.
    pub fn included(&self, index: usize) -> Option<&Included> {
        self.includes.get(index)
    }

    /// Raw value of `name` as seen from this page, through its whole
    /// resolution chain.
    pub fn find_variable(&self, name: &str) -> Option<String> {
        self.parsing_page.find_variable(name)
    }

    /// Raw value of the last `!define` of `name` written on this page itself.
    pub fn definition(&self, name: &str) -> Option<&str> {
        self.symbols.iter().rev().find_map(|symbol| match symbol {
            Symbol::Define {
                name: defined,
                value,
                ..
            } if defined == name => Some(value.as_str()),
            _ => None,
        })
    }

    pub fn to_html(&self) -> String {
        html::render(self)
    }
}

impl std::fmt::Debug for SyntaxTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxTree")
            .field("symbols", &self.symbols)
            .field("symbol_set", &self.symbol_set)
            .field("page", &self.parsing_page.page().full_name())
            .field("includes", &self.includes.len())
            .finish()
    }
}
