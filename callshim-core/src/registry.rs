//! Stub rules and the registry that picks one for an incoming call.
//!
//! Rules sharing a signature are tried newest first, and the first rule whose
//! matchers all succeed answers the call. A later registration therefore
//! overrides an earlier one that would still match.

use crate::error::Result;
use crate::matcher::ArgMatcher;
use crate::pattern::CallPattern;
use crate::signature::MethodSignature;
use crate::types::InstanceId;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

type ComputeFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

/// What a matching stub rule does with the call.
#[derive(Clone)]
pub enum Response {
    /// Return a fixed value.
    Fixed(Value),
    /// Compute the return value from the (already adjusted) arguments.
    Computed(ComputeFn),
    /// Let the real implementation run.
    DelegateToOriginal,
    /// Return the zero value of the signature's return type.
    Default,
}

impl Response {
    /// Build a computed response.
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(f))
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
            Self::DelegateToOriginal => f.write_str("DelegateToOriginal"),
            Self::Default => f.write_str("Default"),
        }
    }
}

/// Result of consulting the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// No rule matched.
    Unhandled,
    /// A rule matched and asked for the real implementation to run.
    CallOriginal,
    /// A rule matched and replaced the call with this value.
    Return(Value),
}

impl Dispatch {
    /// Check if a rule answered the call.
    pub fn is_handled(&self) -> bool {
        !matches!(self, Self::Unhandled)
    }
}

/// A registered call replacement.
#[derive(Debug, Clone)]
pub struct StubRule {
    pattern: CallPattern,
    response: Response,
    /// Number of calls this rule answers (None = unlimited).
    times: Option<usize>,
    matched_count: usize,
}

impl StubRule {
    /// Create a rule from a pattern.
    pub fn new(pattern: CallPattern, response: Response) -> Self {
        Self {
            pattern,
            response,
            times: None,
            matched_count: 0,
        }
    }

    /// Create a rule, checking the matcher count against the signature.
    pub fn for_signature<M>(
        signature: MethodSignature,
        matchers: M,
        response: Response,
    ) -> Result<Self>
    where
        M: IntoIterator,
        M::Item: Into<ArgMatcher>,
    {
        Ok(Self::new(CallPattern::new(signature, matchers)?, response))
    }

    /// Limit the number of calls this rule answers.
    #[must_use]
    pub fn times(mut self, n: usize) -> Self {
        self.times = Some(n);
        self
    }

    /// The rule's pattern.
    pub fn pattern(&self) -> &CallPattern {
        &self.pattern
    }

    /// The rule's response.
    pub fn response(&self) -> &Response {
        &self.response
    }

    /// Number of calls answered so far.
    pub fn matched_count(&self) -> usize {
        self.matched_count
    }

    fn is_exhausted(&self) -> bool {
        self.times.is_some_and(|limit| self.matched_count >= limit)
    }
}

/// A rule chosen for a call, not yet applied.
///
/// Selection and application are split so a caller holding a lock can
/// release it before a computed response runs.
#[derive(Debug, Clone)]
pub struct Selected {
    pattern: CallPattern,
    response: Response,
}

impl Selected {
    /// Splice by-reference replacements into `args`, then run the response.
    pub fn apply(self, args: &mut [Value]) -> Dispatch {
        self.pattern.adjust_references(args);
        match self.response {
            Response::Fixed(value) => Dispatch::Return(value),
            Response::Computed(f) => Dispatch::Return(f(args)),
            Response::DelegateToOriginal => Dispatch::CallOriginal,
            Response::Default => {
                Dispatch::Return(self.pattern.signature().return_type().zero_value())
            }
        }
    }

    /// The winning rule's pattern.
    pub fn pattern(&self) -> &CallPattern {
        &self.pattern
    }
}

/// Ordered collection of stub rules.
#[derive(Debug, Clone, Default)]
pub struct StubRegistry {
    rules: Vec<StubRule>,
}

impl StubRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a rule; it takes precedence over every earlier rule.
    pub fn register(&mut self, rule: StubRule) {
        tracing::debug!(pattern = %rule.pattern, response = ?rule.response, "Registered stub rule");
        self.rules.push(rule);
    }

    /// Pick the newest live rule matching the call and count the use.
    pub fn select(
        &mut self,
        signature: &MethodSignature,
        instance: Option<InstanceId>,
        args: &[Value],
    ) -> Option<Selected> {
        let rule = self
            .rules
            .iter_mut()
            .rev()
            .filter(|rule| !rule.is_exhausted())
            .find(|rule| rule.pattern.matches_call(signature, instance, args))?;

        rule.matched_count += 1;
        Some(Selected {
            pattern: rule.pattern.clone(),
            response: rule.response.clone(),
        })
    }

    /// Select a rule and apply it to `args` in one step.
    pub fn dispatch(
        &mut self,
        signature: &MethodSignature,
        instance: Option<InstanceId>,
        args: &mut [Value],
    ) -> Dispatch {
        match self.select(signature, instance, args) {
            Some(selected) => selected.apply(args),
            None => Dispatch::Unhandled,
        }
    }

    /// Registered rules, oldest first.
    pub fn rules(&self) -> &[StubRule] {
        &self.rules
    }

    /// Number of registered rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if no rules are registered.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Remove every rule.
    pub fn reset(&mut self) {
        self.rules.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{any, eq, out, predicate};
    use crate::types::{TypeRef, ValueShape};

    fn int() -> TypeRef {
        TypeRef::value("Int32", ValueShape::Int)
    }

    fn square() -> MethodSignature {
        MethodSignature::new_static("Math", "square")
            .param(int())
            .returns(int())
    }

    fn rule(matcher: ArgMatcher, response: Response) -> StubRule {
        StubRule::for_signature(square(), [matcher], response).unwrap()
    }

    #[test]
    fn unmatched_call_is_unhandled() {
        let mut registry = StubRegistry::new();
        registry.register(rule(eq(2), Response::Fixed(Value::int(4))));

        let mut args = [Value::int(3)];
        assert_eq!(
            registry.dispatch(&square(), None, &mut args),
            Dispatch::Unhandled
        );
    }

    #[test]
    fn last_registered_wins() {
        let mut registry = StubRegistry::new();
        registry.register(rule(any(), Response::Fixed(Value::int(1))));
        registry.register(rule(any(), Response::Fixed(Value::int(2))));

        let mut args = [Value::int(0)];
        assert_eq!(
            registry.dispatch(&square(), None, &mut args),
            Dispatch::Return(Value::int(2))
        );
    }

    #[test]
    fn newer_non_matching_rule_falls_through_to_older() {
        let mut registry = StubRegistry::new();
        registry.register(rule(any(), Response::Fixed(Value::int(1))));
        registry.register(rule(eq(5), Response::Fixed(Value::int(25))));

        let mut five = [Value::int(5)];
        let mut six = [Value::int(6)];
        assert_eq!(
            registry.dispatch(&square(), None, &mut five),
            Dispatch::Return(Value::int(25))
        );
        assert_eq!(
            registry.dispatch(&square(), None, &mut six),
            Dispatch::Return(Value::int(1))
        );
    }

    #[test]
    fn response_variants() {
        let mut registry = StubRegistry::new();
        registry.register(rule(eq(1), Response::DelegateToOriginal));
        registry.register(rule(eq(2), Response::Default));
        registry.register(rule(
            eq(3),
            Response::computed(|args| {
                let n = args[0].as_i64().unwrap_or_default();
                Value::int(n * n)
            }),
        ));

        assert_eq!(
            registry.dispatch(&square(), None, &mut [Value::int(1)]),
            Dispatch::CallOriginal
        );
        assert_eq!(
            registry.dispatch(&square(), None, &mut [Value::int(2)]),
            Dispatch::Return(Value::int(0))
        );
        assert_eq!(
            registry.dispatch(&square(), None, &mut [Value::int(3)]),
            Dispatch::Return(Value::int(9))
        );
    }

    #[test]
    fn times_limit_exposes_older_rule() {
        let mut registry = StubRegistry::new();
        registry.register(rule(any(), Response::Fixed(Value::int(0))));
        registry.register(rule(any(), Response::Fixed(Value::int(7))).times(2));

        let results: Vec<Dispatch> = (0..3)
            .map(|_| registry.dispatch(&square(), None, &mut [Value::int(1)]))
            .collect();
        assert_eq!(
            results,
            vec![
                Dispatch::Return(Value::int(7)),
                Dispatch::Return(Value::int(7)),
                Dispatch::Return(Value::int(0)),
            ]
        );
        assert_eq!(registry.rules()[1].matched_count(), 2);
    }

    #[test]
    fn out_parameters_are_spliced_before_computed_response() {
        let sig = MethodSignature::new_static("Cache", "try_get")
            .param(TypeRef::reference("String", ValueShape::Str))
            .ref_param(int())
            .returns(TypeRef::value("Boolean", ValueShape::Bool));
        let mut registry = StubRegistry::new();
        registry.register(
            StubRule::for_signature(
                sig.clone(),
                [eq("k"), out(any(), 42)],
                Response::computed(|args| Value::bool(args[1] == Value::int(42))),
            )
            .unwrap(),
        );

        let mut args = [Value::string("k"), Value::int(0)];
        assert_eq!(
            registry.dispatch(&sig, None, &mut args),
            Dispatch::Return(Value::bool(true))
        );
        assert_eq!(args[1], Value::int(42));
    }

    #[test]
    fn out_parameters_are_spliced_for_delegate_too() {
        let sig = MethodSignature::new_static("Cache", "fill").ref_param(int());
        let mut registry = StubRegistry::new();
        registry.register(
            StubRule::for_signature(sig.clone(), [out(any(), 5)], Response::DelegateToOriginal)
                .unwrap(),
        );

        let mut args = [Value::int(0)];
        assert_eq!(
            registry.dispatch(&sig, None, &mut args),
            Dispatch::CallOriginal
        );
        assert_eq!(args[0], Value::int(5));
    }

    #[test]
    fn non_winning_rules_never_touch_arguments() {
        let sig = MethodSignature::new_static("Cache", "fill").ref_param(int());
        let mut registry = StubRegistry::new();
        registry.register(
            StubRule::for_signature(
                sig.clone(),
                [out(predicate("negative", |v| v.as_i64().is_some_and(|n| n < 0)), 5)],
                Response::Default,
            )
            .unwrap(),
        );

        let mut args = [Value::int(1)];
        assert_eq!(registry.dispatch(&sig, None, &mut args), Dispatch::Unhandled);
        assert_eq!(args[0], Value::int(1));
    }

    #[test]
    fn reset_clears_rules() {
        let mut registry = StubRegistry::new();
        registry.register(rule(any(), Response::Default));
        registry.reset();
        assert!(registry.is_empty());
        assert!(
            !registry
                .dispatch(&square(), None, &mut [Value::int(1)])
                .is_handled()
        );
    }
}
