//! Verification of recorded calls against expectations.
//!
//! Verification is a pure computation over a ledger snapshot. It never runs
//! by-reference adjustments, never touches the ledger, and gives the same
//! report for the same inputs.
//!
//! # Report format
//!
//! ```text
//! Unsatisfied invocation:
//!     tests/orders.rs:41: Expected to call exactly 0 times, but actually call 1 times
//! All invocations:
//!     tests/orders.rs:41: hit(1) => Orders::submit(String<a>)
//!                                   Orders::submit(String<b>)
//! ```
//!
//! Pattern `j` of a request (counting across all groups in order) is reported
//! at `call_site.line + j`. Every ledger entry matched by a pattern carries
//! that pattern's location and its running hit number. The `=>` delimiters
//! are right-aligned to one column.

use crate::error::{CallshimError, UnsatisfiedCallVerification};
use crate::ledger::Invocation;
use crate::pattern::CallPattern;
use crate::types::CallSite;
use std::fmt;

const INDENT: &str = "    ";

/// Count constraint for an expectation group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Times {
    /// Exactly `n` calls.
    Exactly(usize),
    /// `n` or more calls.
    AtLeast(usize),
    /// `n` or fewer calls.
    AtMost(usize),
}

impl Times {
    /// Exactly one call.
    pub fn once() -> Self {
        Self::Exactly(1)
    }

    /// No calls at all.
    pub fn never() -> Self {
        Self::Exactly(0)
    }

    /// Check whether `actual` calls satisfy the constraint.
    pub fn is_satisfied_by(&self, actual: usize) -> bool {
        match *self {
            Self::Exactly(n) => actual == n,
            Self::AtLeast(n) => actual >= n,
            Self::AtMost(n) => actual <= n,
        }
    }

    /// The bound `n`.
    pub fn count(&self) -> usize {
        match *self {
            Self::Exactly(n) | Self::AtLeast(n) | Self::AtMost(n) => n,
        }
    }

    /// The constraint phrase used in reports.
    pub fn phrase(&self) -> &'static str {
        match self {
            Self::Exactly(_) => "exactly",
            Self::AtLeast(_) => "at least",
            Self::AtMost(_) => "at most",
        }
    }
}

impl Default for Times {
    fn default() -> Self {
        Self::AtLeast(1)
    }
}

impl fmt::Display for Times {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.phrase(), self.count())
    }
}

/// One or more patterns sharing a count constraint.
///
/// The group's actual count is the sum of every pattern's matches.
#[derive(Debug, Clone)]
pub struct Expectation {
    times: Times,
    patterns: Vec<CallPattern>,
}

impl Expectation {
    /// A group with a single pattern.
    pub fn new(times: Times, pattern: CallPattern) -> Self {
        Self {
            times,
            patterns: vec![pattern],
        }
    }

    /// A group with several patterns, in registration order.
    ///
    /// Fails with `EmptyExpectation` when `patterns` is empty.
    pub fn group(
        times: Times,
        patterns: impl IntoIterator<Item = CallPattern>,
    ) -> crate::error::Result<Self> {
        let patterns: Vec<CallPattern> = patterns.into_iter().collect();
        if patterns.is_empty() {
            return Err(CallshimError::EmptyExpectation {
                times: times.to_string(),
            });
        }
        Ok(Self { times, patterns })
    }

    /// Add another pattern to the group.
    #[must_use]
    pub fn with(mut self, pattern: CallPattern) -> Self {
        self.patterns.push(pattern);
        self
    }

    /// The count constraint.
    pub fn times(&self) -> Times {
        self.times
    }

    /// The patterns, in registration order.
    pub fn patterns(&self) -> &[CallPattern] {
        &self.patterns
    }
}

/// An ordered sequence of expectation groups plus the call site that issued it.
///
/// # Example
///
/// ```
/// use callshim_core::verify::{verify, Times, VerificationRequest};
/// use callshim_core::{CallPattern, CallSite, Ledger, MethodSignature, TypeRef, Value, ValueShape};
///
/// let sig = MethodSignature::new_static("Log", "write")
///     .param(TypeRef::reference("String", ValueShape::Str));
/// let mut ledger = Ledger::new();
/// ledger.record(&sig, None, &[Value::string("a")]);
///
/// let once = VerificationRequest::new(CallSite::new("t.rs", 1))
///     .expect(Times::once(), CallPattern::new(sig.clone(), ["a"]).unwrap());
/// assert!(verify(ledger.all(), &once).is_ok());
///
/// let never = VerificationRequest::new(CallSite::new("t.rs", 1))
///     .expect(Times::never(), CallPattern::new(sig, ["a"]).unwrap());
/// let failure = verify(ledger.all(), &never).unwrap_err();
/// assert!(failure.report().contains("hit(1) => Log::write(String<a>)"));
/// ```
#[derive(Debug, Clone)]
pub struct VerificationRequest {
    groups: Vec<Expectation>,
    call_site: CallSite,
}

impl VerificationRequest {
    /// Create an empty request issued from `call_site`.
    pub fn new(call_site: CallSite) -> Self {
        Self {
            groups: Vec::new(),
            call_site,
        }
    }

    /// Create an empty request issued from the caller's location.
    #[track_caller]
    pub fn here() -> Self {
        Self::new(CallSite::caller())
    }

    /// Add a single-pattern group.
    #[must_use]
    pub fn expect(self, times: Times, pattern: CallPattern) -> Self {
        self.expect_group(Expectation::new(times, pattern))
    }

    /// Add a group.
    #[must_use]
    pub fn expect_group(mut self, group: Expectation) -> Self {
        self.groups.push(group);
        self
    }

    /// The groups, in request order.
    pub fn groups(&self) -> &[Expectation] {
        &self.groups
    }

    /// The issuing call site.
    pub fn call_site(&self) -> &CallSite {
        &self.call_site
    }
}

/// Evaluation of one expectation group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupOutcome {
    /// The group's constraint.
    pub times: Times,
    /// Summed matches across the group's patterns.
    pub actual: usize,
    /// Reported location of the group's first pattern.
    pub location: CallSite,
}

impl GroupOutcome {
    /// Check if the constraint holds.
    pub fn is_satisfied(&self) -> bool {
        self.times.is_satisfied_by(self.actual)
    }
}

/// Full evaluation of a request against a ledger.
#[derive(Debug, Clone)]
pub struct Evaluation {
    groups: Vec<GroupOutcome>,
    /// Hit labels per ledger entry, indexed like the ledger.
    labels: Vec<Vec<String>>,
    /// Rendered ledger entries.
    entries: Vec<String>,
}

impl Evaluation {
    /// Per-group outcomes, in request order.
    pub fn groups(&self) -> &[GroupOutcome] {
        &self.groups
    }

    /// Check if every group is satisfied.
    pub fn is_satisfied(&self) -> bool {
        self.groups.iter().all(GroupOutcome::is_satisfied)
    }

    /// Render the failure report, or `None` when every group is satisfied.
    pub fn report(&self) -> Option<String> {
        if self.is_satisfied() {
            return None;
        }

        let mut lines = vec!["Unsatisfied invocation:".to_string()];
        lines.extend(
            self.groups
                .iter()
                .filter(|group| !group.is_satisfied())
                .map(|group| {
                    format!(
                        "{INDENT}{}: Expected to call {} {} times, but actually call {} times",
                        group.location,
                        group.times.phrase(),
                        group.times.count(),
                        group.actual
                    )
                }),
        );

        lines.push("All invocations:".to_string());
        let prefixes: Vec<Option<String>> = self
            .labels
            .iter()
            .map(|labels| (!labels.is_empty()).then(|| format!("{} =>", labels.join(", "))))
            .collect();
        let width = prefixes
            .iter()
            .flatten()
            .map(|prefix| prefix.chars().count())
            .max()
            .unwrap_or(0);
        let blank = if width == 0 {
            String::new()
        } else {
            " ".repeat(width + 1)
        };

        lines.extend(self.entries.iter().zip(&prefixes).map(|(entry, prefix)| {
            match prefix {
                Some(prefix) => format!("{INDENT}{prefix:>width$} {entry}"),
                None => format!("{INDENT}{blank}{entry}"),
            }
        }));

        Some(lines.join("\n"))
    }
}

/// Evaluate a request without deciding success or failure.
pub fn evaluate(ledger: &[Invocation], request: &VerificationRequest) -> Evaluation {
    let mut labels: Vec<Vec<String>> = vec![Vec::new(); ledger.len()];
    let mut groups = Vec::with_capacity(request.groups.len());
    let mut pattern_index = 0usize;

    for group in &request.groups {
        let group_location = request.call_site.offset(pattern_index);
        let mut actual = 0usize;

        for pattern in &group.patterns {
            let location = request.call_site.offset(pattern_index);
            let hits = ledger
                .iter()
                .enumerate()
                .filter(|(_, invocation)| pattern.matches(invocation))
                .map(|(position, _)| position);

            for (k, position) in hits.enumerate() {
                labels[position].push(format!("{location}: hit({})", k + 1));
                actual += 1;
            }
            pattern_index += 1;
        }

        groups.push(GroupOutcome {
            times: group.times,
            actual,
            location: group_location,
        });
    }

    Evaluation {
        groups,
        labels,
        entries: ledger.iter().map(ToString::to_string).collect(),
    }
}

/// Check every expectation of `request` against `ledger`.
pub fn verify(
    ledger: &[Invocation],
    request: &VerificationRequest,
) -> Result<(), UnsatisfiedCallVerification> {
    match evaluate(ledger, request).report() {
        None => Ok(()),
        Some(report) => Err(UnsatisfiedCallVerification::new(report)),
    }
}
