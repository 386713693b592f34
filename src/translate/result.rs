use crate::{
    diagnostics::SourceArc,
    err_ctx,
    query::{AttributeOrder, ParseResult, Query, QueryOptions},
    syntax::{Span, Spanned},
    CqnError, ErrorContext,
};

use super::{composite::labelled, order::options_for};

/// The completed state of a translation.
///
/// Only a finished `Translator` produces one, so results can never be read while the
/// traversal is still collecting.
#[derive(Debug)]
pub struct Translation {
    roots: Vec<Spanned<Query>>,
    orders: Vec<AttributeOrder>,
    encountered: usize,
    converted: usize,
    source: Option<SourceArc>,
}

impl Translation {
    pub(crate) fn new(
        roots: Vec<Spanned<Query>>,
        orders: Vec<AttributeOrder>,
        encountered: usize,
        converted: usize,
        source: Option<SourceArc>,
    ) -> Self {
        Self {
            roots,
            orders,
            encountered,
            converted,
            source,
        }
    }

    /// The single top-level query. Any other number of top-level queries is an arity
    /// violation.
    pub fn root_query(&self) -> Result<&Query, CqnError> {
        match self.roots.as_slice() {
            [root] => Ok(&root.value),
            roots => Err(self.root_arity_error(roots)),
        }
    }

    /// Ordering options, empty when the expression had no ordering clause.
    pub fn query_options(&self) -> QueryOptions {
        options_for(&self.orders)
    }

    pub fn encountered(&self) -> usize {
        self.encountered
    }

    pub fn converted(&self) -> usize {
        self.converted
    }

    pub fn into_result(mut self) -> Result<ParseResult, CqnError> {
        let options = self.query_options();
        match <[Spanned<Query>; 1]>::try_from(std::mem::take(&mut self.roots)) {
            Ok([root]) => Ok(ParseResult {
                query: root.value,
                options,
            }),
            Err(roots) => Err(self.root_arity_error(&roots)),
        }
    }

    fn root_arity_error(&self, roots: &[Spanned<Query>]) -> CqnError {
        let span = match (roots.first(), roots.last()) {
            (Some(first), Some(last)) => Span::new(first.span.start, last.span.end),
            _ => Span::default(),
        };
        let ctx = ErrorContext::with_source_and_span(self.source.clone(), span);
        let ctx = if roots.is_empty() {
            ctx.help("the expression must contain a query")
        } else {
            labelled(ctx, roots).help("combine top-level queries with 'and' or 'or'")
        };
        err_ctx!(
            ArityViolation,
            ctx,
            "expected exactly one top-level query, found {}",
            roots.len()
        )
    }
}
