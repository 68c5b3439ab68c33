pub mod crawler;
pub mod error;
pub mod fs;
pub mod page;
pub mod source_page;
pub mod static_page;
pub mod system_variables;
pub mod wikitext_page;

pub use crawler::{WikiPagePath, find_page};
pub use error::PageError;
pub use fs::load_tree;
pub use page::{PageData, PropertyValue, WikiPage, Wikitext};
pub use source_page::WikiSourcePage;
pub use static_page::StaticPage;
pub use system_variables::{SystemVariableSource, UrlPathVariableSource};
pub use wikitext_page::{ParentPageVariableSource, WikitextPage, make_parsing_page};
