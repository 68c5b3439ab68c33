pub mod fragment;
pub mod html;
pub mod parser;
pub mod parsing_page;
pub mod source_page;
pub mod symbol;
pub mod variables;

pub use fragment::{FragmentPage, translate_fragment};
pub use parser::{ParseError, Parser};
pub use parsing_page::ParsingPage;
pub use source_page::{IncludeNotFound, SourcePage};
pub use symbol::{Included, Inline, Symbol, SymbolSet, SyntaxTree};
pub use variables::{
    ApplicationVariables, CompositeVariableSource, MapVariableSource, ResolutionCache,
    UrlVariables, VariableSource,
};
