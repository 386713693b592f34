pub use crate::diagnostics::{CqnError, ErrorContext, ErrorType, RelatedLabel};
pub use crate::query::{AttributeOrder, ObjectType, ParseResult, Query, QueryOptions};
pub use crate::translate::{QueryTranslator, Translation, Translator};

pub mod attribute;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod query;
pub mod syntax;
pub mod translate;
pub mod value;
