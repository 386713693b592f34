use crate::{
    attribute::Capability,
    query::{AttributeOrder, QueryOptions},
    syntax::{ParseNode, Token},
    CqnError,
};

use super::TranslationEnv;

/// The only direction token that sorts descending. Matching is exact.
pub const DESCENDING: &str = "descending";

/// Accumulates the terms of ordering clauses in declaration order.
#[derive(Debug, Default)]
pub struct OrderClauseCollector {
    orders: Vec<AttributeOrder>,
}

impl OrderClauseCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect(&mut self, env: &TranslationEnv<'_>, node: &ParseNode) -> Result<(), CqnError> {
        for term in &node.order_terms {
            let attribute = env.resolve(&term.attribute, Capability::Ordered, node.span)?;
            let descending = is_descending(term.direction.as_ref());
            self.orders.push(AttributeOrder::new(attribute, descending));
        }
        tracing::debug!(terms = node.order_terms.len(), total = self.orders.len(), "collected ordering clause");
        Ok(())
    }

    pub fn into_orders(self) -> Vec<AttributeOrder> {
        self.orders
    }
}

pub fn is_descending(direction: Option<&Token>) -> bool {
    direction.is_some_and(|token| token.text == DESCENDING)
}

/// Empty options when no terms were collected.
pub fn options_for(orders: &[AttributeOrder]) -> QueryOptions {
    if orders.is_empty() {
        QueryOptions::none()
    } else {
        QueryOptions::order_by(orders.to_vec())
    }
}
