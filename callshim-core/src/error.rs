//! Error types for callshim.
//!
//! Resolution and construction errors are raised eagerly, at the point where a
//! pattern or rule is built. Verification failures are a separate type,
//! [`UnsatisfiedCallVerification`], so that test hosts can report an assertion
//! failure differently from a mistake in the test itself.

use thiserror::Error;

/// Failure signal raised by verification.
///
/// Carries the full two-part diagnostic report. `Display` prints the report
/// verbatim so it can be compared against golden output.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{report}")]
pub struct UnsatisfiedCallVerification {
    report: String,
}

impl UnsatisfiedCallVerification {
    /// Wrap a rendered report.
    pub fn new(report: impl Into<String>) -> Self {
        Self {
            report: report.into(),
        }
    }

    /// The report text.
    pub fn report(&self) -> &str {
        &self.report
    }

    /// Consume the error, returning the report text.
    pub fn into_report(self) -> String {
        self.report
    }
}

/// The main error type for callshim operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CallshimError {
    // =========================================================================
    // Resolution Errors (E100-E199)
    // =========================================================================
    /// More than one overload survived resolution.
    #[error(
        "E101: Ambiguous method '{type_name}::{method}', candidates:\n{}",
        render_candidates(.candidates)
    )]
    AmbiguousMethod {
        /// The type that was searched.
        type_name: String,
        /// The requested member name.
        method: String,
        /// Every remaining candidate, rendered, in declaration order.
        candidates: Vec<String>,
    },

    /// No overload survived resolution.
    #[error(
        "E102: No matching {} method '{type_name}::{method}' taking {arity} argument(s)",
        member_scope(.is_static)
    )]
    NoMatchingMethod {
        /// The type that was searched.
        type_name: String,
        /// The requested member name.
        method: String,
        /// Whether a static member was requested.
        is_static: bool,
        /// Number of argument matchers supplied.
        arity: usize,
    },

    /// The resolver has no declaration for the requested type.
    #[error("E103: Unknown type '{type_name}'")]
    UnknownType {
        /// The missing type name.
        type_name: String,
    },

    // =========================================================================
    // Construction Errors (E200-E299)
    // =========================================================================
    /// Matcher list length differs from the signature's parameter count.
    #[error("E201: {signature} takes {expected} argument(s) but {actual} matcher(s) were given")]
    MatcherArity {
        /// The rendered signature.
        signature: String,
        /// Declared parameter count.
        expected: usize,
        /// Number of matchers supplied.
        actual: usize,
    },

    /// An expectation group was built without any pattern.
    #[error("E202: Expectation group expecting {times} call(s) has no patterns")]
    EmptyExpectation {
        /// The group's rendered count constraint.
        times: String,
    },

    // =========================================================================
    // Verification Errors (E300-E399)
    // =========================================================================
    /// Verification found unmet expectations.
    #[error(transparent)]
    Unsatisfied(#[from] UnsatisfiedCallVerification),

    // =========================================================================
    // Configuration Errors (E800-E899)
    // =========================================================================
    /// Invalid configuration value.
    #[error("E801: Invalid configuration '{field}': {cause}")]
    InvalidConfig {
        /// The offending field or variable.
        field: String,
        /// Why the value was rejected.
        cause: String,
    },
}

fn render_candidates(candidates: &[String]) -> String {
    candidates
        .iter()
        .map(|c| format!("    {c}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn member_scope(is_static: &bool) -> &'static str {
    if *is_static { "static" } else { "instance" }
}

impl CallshimError {
    /// Get the error code (e.g., "E101").
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AmbiguousMethod { .. } => "E101",
            Self::NoMatchingMethod { .. } => "E102",
            Self::UnknownType { .. } => "E103",
            Self::MatcherArity { .. } => "E201",
            Self::EmptyExpectation { .. } => "E202",
            Self::Unsatisfied(_) => "E301",
            Self::InvalidConfig { .. } => "E801",
        }
    }

    /// Check if this error came from signature resolution.
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::AmbiguousMethod { .. } | Self::NoMatchingMethod { .. } | Self::UnknownType { .. }
        )
    }

    /// Check if this error is a failed call verification.
    pub fn is_assertion_failure(&self) -> bool {
        matches!(self, Self::Unsatisfied(_))
    }

    /// Check if this is a configuration error.
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::InvalidConfig { .. })
    }
}

/// Result type alias using `CallshimError`.
pub type Result<T> = std::result::Result<T, CallshimError>;
