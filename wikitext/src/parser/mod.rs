pub mod error;
mod inline;
mod structural;

pub use error::ParseError;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::parsing_page::ParsingPage;
use crate::symbol::{Included, Symbol, SymbolSet, SyntaxTree};

/// Maximum nesting of `!include`.
pub const MAX_INCLUDE_DEPTH: usize = 8;

/// Parser entry point.
#[derive(Debug, Clone, Copy, Default)]
pub struct Parser {
    symbols: SymbolSet,
}

impl Parser {
    /// Parser for full page markup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parser that only expands `${NAME}` references.
    pub fn variable_definition() -> Self {
        Self::with_symbols(SymbolSet::VariableDefinition)
    }

    pub fn with_symbols(symbols: SymbolSet) -> Self {
        Parser { symbols }
    }

    /// Parse `source` in the context of `parsing_page`.
    ///
    /// Every `!define` met on the way is recorded into the context's cache,
    /// and every `!include` is resolved and parsed in place, so the finished
    /// tree sees all definitions in document order. Rendering the tree later
    /// records nothing new.
    pub fn parse(
        &self,
        source: &str,
        parsing_page: Arc<ParsingPage>,
    ) -> Result<SyntaxTree, Vec<ParseError>> {
        let mut including = vec![parsing_page.page().full_name()];
        self.parse_in(source, parsing_page, &mut including)
    }

    /// `including` holds the full names of the pages being parsed, the
    /// outermost first.
    fn parse_in(
        &self,
        source: &str,
        parsing_page: Arc<ParsingPage>,
        including: &mut Vec<String>,
    ) -> Result<SyntaxTree, Vec<ParseError>> {
        let symbols = match self.symbols {
            SymbolSet::Full => structural::parse_symbols(source)?,
            SymbolSet::VariableDefinition => {
                vec![Symbol::Markup(inline::parse_inlines(source, 0, false))]
            }
        };

        let mut includes = Vec::new();
        for symbol in &symbols {
            match symbol {
                Symbol::Define { name, value, .. } => parsing_page.put_variable(name, value),
                Symbol::Include { page, .. } => {
                    includes.push(self.include(page, &parsing_page, including))
                }
                Symbol::Markup(_) => {}
            }
        }

        debug!(
            page = %parsing_page.page().full_name(),
            symbols = symbols.len(),
            includes = includes.len(),
            mode = ?self.symbols,
            "parsed"
        );
        Ok(SyntaxTree::new(symbols, self.symbols, parsing_page, includes))
    }

    fn include(
        &self,
        page_name: &str,
        parsing_page: &ParsingPage,
        including: &mut Vec<String>,
    ) -> Included {
        let included = match parsing_page.page().find_included_page(page_name) {
            Ok(page) => page,
            Err(missing) => return Included::Failed(format!("page include failed: {}", missing)),
        };

        let key = included.full_name();
        if including.contains(&key) || including.len() > MAX_INCLUDE_DEPTH {
            warn!(page = %key, chain = ?including, "include loop");
            return Included::Failed(format!("circular include of {}", page_name));
        }

        let context = Arc::new(parsing_page.for_include(included.clone()));
        including.push(key);
        let parsed = self.parse_in(&included.content(), context, including);
        including.pop();

        match parsed {
            Ok(tree) => Included::Page(tree),
            Err(errors) => Included::Failed(format!(
                "page include failed: {} has {} markup error(s)",
                page_name,
                errors.len()
            )),
        }
    }
}

/// Whether `name` is a legal variable name.
pub(crate) fn is_variable_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
}
