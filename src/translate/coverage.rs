use crate::{err_ctx, syntax::ParseNode, CqnError};

use super::TranslationEnv;

/// Counts query constructs seen against query nodes produced.
///
/// The counters only diverge when a construct has no handler, so a mismatch at any
/// checkpoint means part of the expression would otherwise be dropped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoverageValidator {
    encountered: usize,
    converted: usize,
}

impl CoverageValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn encounter(&mut self) {
        self.encountered += 1;
    }

    pub fn convert(&mut self) {
        debug_assert!(self.converted < self.encountered);
        self.converted += 1;
    }

    pub fn encountered(&self) -> usize {
        self.encountered
    }

    pub fn converted(&self) -> usize {
        self.converted
    }

    pub fn is_complete(&self) -> bool {
        self.encountered == self.converted
    }

    pub fn check(&self, env: &TranslationEnv<'_>, node: &ParseNode) -> Result<(), CqnError> {
        if self.is_complete() {
            return Ok(());
        }
        tracing::warn!(
            kind = %node.kind,
            encountered = self.encountered,
            converted = self.converted,
            "query construct left unconverted"
        );
        Err(err_ctx!(
            IncompleteTranslation,
            env.context(node.span)
                .help("every query construct needs a registered handler"),
            "no conversion for '{}' ({} queries encountered, {} converted)",
            node.kind,
            self.encountered,
            self.converted
        ))
    }
}
