//! # Diagnostics
//!
//! This module defines the unified, `miette`-based error type for the translator. Every
//! failure of a translation attempt is a `CqnError`: the variant says what kind of failure
//! it is, the `ErrorContext` says where in the filter expression it happened, and an
//! optional chained cause keeps the collaborator error (attribute resolution, value
//! conversion, file decoding) that triggered it.
//!
//! # Error Construction Macros
//!
//! - **Use `err_msg!` for message-only errors.**
//!   - `err_msg!(Config, "Failed to read {}", path)`
//!
//! - **Use `err_ctx!` when a context is at hand.**
//!   - `err_ctx!(ArityViolation, ctx, "'not' takes exactly one query, found {}", n)`
//!
//! Both take the variant name first, then `format!`-style arguments. Attach a cause with
//! [`CqnError::caused_by`].

use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceCode};
use thiserror::Error;

use crate::syntax::Span;

pub type SourceArc = Arc<NamedSource<String>>;

type ErrorCause = Option<Box<dyn std::error::Error + Send + Sync + 'static>>;

/// Type-safe error classification that corresponds to `CqnError` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Attribute name not found in the registry
    UnknownAttribute,
    /// Attribute exists but its value type lacks the required capability
    AttributeCapabilityMismatch,
    /// A literal token could not be converted to the attribute's value type
    MalformedValue,
    /// A scope or the root closed with the wrong number of queries
    ArityViolation,
    /// `all`/`none` named a different object type than the translator's
    ObjectTypeMismatch,
    /// A query construct was encountered but never converted
    IncompleteTranslation,
    /// A parse node lacks a token its kind requires
    MalformedNode,
    /// Schema or parse-tree files could not be loaded
    Config,
}

impl ErrorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorType::UnknownAttribute => "UnknownAttribute",
            ErrorType::AttributeCapabilityMismatch => "AttributeCapabilityMismatch",
            ErrorType::MalformedValue => "MalformedValue",
            ErrorType::ArityViolation => "ArityViolation",
            ErrorType::ObjectTypeMismatch => "ObjectTypeMismatch",
            ErrorType::IncompleteTranslation => "IncompleteTranslation",
            ErrorType::MalformedNode => "MalformedNode",
            ErrorType::Config => "Config",
        }
    }

    /// Diagnostic code suffix, rendered as `cqn::<suffix>`.
    fn code_suffix(&self) -> &'static str {
        match self {
            ErrorType::UnknownAttribute => "unknown_attribute",
            ErrorType::AttributeCapabilityMismatch => "capability_mismatch",
            ErrorType::MalformedValue => "malformed_value",
            ErrorType::ArityViolation => "arity",
            ErrorType::ObjectTypeMismatch => "object_type",
            ErrorType::IncompleteTranslation => "incomplete_translation",
            ErrorType::MalformedNode => "malformed_node",
            ErrorType::Config => "config",
        }
    }
}

impl std::str::FromStr for ErrorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            ErrorType::UnknownAttribute,
            ErrorType::AttributeCapabilityMismatch,
            ErrorType::MalformedValue,
            ErrorType::ArityViolation,
            ErrorType::ObjectTypeMismatch,
            ErrorType::IncompleteTranslation,
            ErrorType::MalformedNode,
            ErrorType::Config,
        ]
        .into_iter()
        .find(|t| t.as_str() == s)
        .ok_or_else(|| format!("unknown error type '{s}'"))
    }
}

impl std::fmt::Display for ErrorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single additional label for multi-span diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct RelatedLabel {
    pub span: Span,
    pub label: String,
}

/// Minimal, composable error context for diagnostics.
#[derive(Debug, Default)]
pub struct ErrorContext {
    /// The filter expression the error points into (if any).
    pub source: Option<SourceArc>,
    /// The primary span for this error (if any).
    pub span: Option<Span>,
    /// An optional help message.
    pub help: Option<String>,
    /// Additional labeled spans, e.g. the surplus children of a `not`.
    pub related: Vec<RelatedLabel>,
}

impl ErrorContext {
    /// Returns an empty error context (no source, span, or help).
    pub fn none() -> Self {
        Self::default()
    }

    /// Creates a context with only a span.
    pub fn with_span(span: Span) -> Self {
        Self {
            span: Some(span),
            ..Self::default()
        }
    }

    /// Creates a context with both source and span.
    pub fn with_source_and_span(source: Option<SourceArc>, span: Span) -> Self {
        Self {
            source,
            span: Some(span),
            ..Self::default()
        }
    }

    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn related(mut self, span: Span, label: impl Into<String>) -> Self {
        self.related.push(RelatedLabel {
            span,
            label: label.into(),
        });
        self
    }
}

/// Unified error type for every translation failure mode.
#[derive(Debug, Error)]
pub enum CqnError {
    #[error("Unknown attribute: {message}")]
    UnknownAttribute {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Attribute capability mismatch: {message}")]
    AttributeCapabilityMismatch {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Malformed value: {message}")]
    MalformedValue {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Arity violation: {message}")]
    ArityViolation {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Object type mismatch: {message}")]
    ObjectTypeMismatch {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Incomplete translation: {message}")]
    IncompleteTranslation {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Malformed parse node: {message}")]
    MalformedNode {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
    #[error("Configuration error: {message}")]
    Config {
        message: String,
        ctx: ErrorContext,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
    },
}

impl CqnError {
    fn parts(&self) -> (&String, &ErrorContext) {
        match self {
            CqnError::UnknownAttribute { message, ctx, .. }
            | CqnError::AttributeCapabilityMismatch { message, ctx, .. }
            | CqnError::MalformedValue { message, ctx, .. }
            | CqnError::ArityViolation { message, ctx, .. }
            | CqnError::ObjectTypeMismatch { message, ctx, .. }
            | CqnError::IncompleteTranslation { message, ctx, .. }
            | CqnError::MalformedNode { message, ctx, .. }
            | CqnError::Config { message, ctx, .. } => (message, ctx),
        }
    }

    fn source_mut(&mut self) -> &mut ErrorCause {
        match self {
            CqnError::UnknownAttribute { source, .. }
            | CqnError::AttributeCapabilityMismatch { source, .. }
            | CqnError::MalformedValue { source, .. }
            | CqnError::ArityViolation { source, .. }
            | CqnError::ObjectTypeMismatch { source, .. }
            | CqnError::IncompleteTranslation { source, .. }
            | CqnError::MalformedNode { source, .. }
            | CqnError::Config { source, .. } => source,
        }
    }

    /// Returns the type-safe error classification for this error.
    pub fn error_type(&self) -> ErrorType {
        match self {
            CqnError::UnknownAttribute { .. } => ErrorType::UnknownAttribute,
            CqnError::AttributeCapabilityMismatch { .. } => ErrorType::AttributeCapabilityMismatch,
            CqnError::MalformedValue { .. } => ErrorType::MalformedValue,
            CqnError::ArityViolation { .. } => ErrorType::ArityViolation,
            CqnError::ObjectTypeMismatch { .. } => ErrorType::ObjectTypeMismatch,
            CqnError::IncompleteTranslation { .. } => ErrorType::IncompleteTranslation,
            CqnError::MalformedNode { .. } => ErrorType::MalformedNode,
            CqnError::Config { .. } => ErrorType::Config,
        }
    }

    pub fn message(&self) -> &str {
        self.parts().0
    }

    pub fn context(&self) -> &ErrorContext {
        self.parts().1
    }

    /// Primary span of the offending node, when one is known.
    pub fn span(&self) -> Option<Span> {
        self.context().span
    }

    /// Chains the collaborator error that caused this one.
    pub fn caused_by(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
        *self.source_mut() = Some(Box::new(cause));
        self
    }
}

impl Diagnostic for CqnError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(format!(
            "cqn::{}",
            self.error_type().code_suffix()
        )))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        self.context()
            .help
            .as_ref()
            .map(|h| Box::new(h) as Box<dyn std::fmt::Display + 'a>)
    }

    fn source_code(&self) -> Option<&dyn SourceCode> {
        self.context()
            .source
            .as_ref()
            .map(|s| s.as_ref() as &dyn SourceCode)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let (message, ctx) = self.parts();
        // Spans are meaningless without the text they index into.
        ctx.source.as_ref()?;
        let mut labels = Vec::new();
        if let Some(span) = ctx.span {
            labels.push(LabeledSpan::new(
                Some(message.clone()),
                span.start,
                span.label_len(),
            ));
        }
        for rel in &ctx.related {
            labels.push(LabeledSpan::new(
                Some(rel.label.clone()),
                rel.span.start,
                rel.span.label_len(),
            ));
        }
        if labels.is_empty() {
            None
        } else {
            Some(Box::new(labels.into_iter()))
        }
    }
}

/// Converts a source string into an `Arc<NamedSource<String>>` for use in error contexts.
pub fn to_error_source<S: AsRef<str>>(name: &str, source: S) -> SourceArc {
    Arc::new(NamedSource::new(name, source.as_ref().to_string()))
}

/// Constructs a `CqnError` variant with a formatted message and no context.
#[macro_export]
macro_rules! err_msg {
    ($variant:ident, $($arg:tt)+) => {
        $crate::CqnError::$variant {
            message: format!($($arg)+),
            ctx: $crate::ErrorContext::none(),
            source: None,
        }
    };
}

/// Constructs a `CqnError` variant with a formatted message and a prepared `ErrorContext`.
#[macro_export]
macro_rules! err_ctx {
    ($variant:ident, $ctx:expr, $($arg:tt)+) => {
        $crate::CqnError::$variant {
            message: format!($($arg)+),
            ctx: $ctx,
            source: None,
        }
    };
}
