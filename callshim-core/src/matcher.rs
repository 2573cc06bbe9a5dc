//! Argument matchers.
//!
//! An [`ArgMatcher`] is a predicate over one argument value. Matchers serve
//! three purposes:
//!
//! - `matches` decides whether a recorded argument satisfies a pattern.
//! - `type_matches` decides whether the matcher fits a declared parameter. It
//!   is used when a pattern is resolved from a member name.
//! - `adjust_reference` writes a programmed value into a by-reference slot
//!   before a stub response runs. Verification never calls it.

use crate::types::{ParamType, TypeRef};
use crate::value::Value;
use regex::Regex;
use std::fmt;
use std::sync::Arc;

type PredicateFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A named boolean test over an argument value.
#[derive(Clone)]
pub struct Predicate {
    description: String,
    ty: Option<TypeRef>,
    test: PredicateFn,
}

impl Predicate {
    /// Create an untyped predicate.
    pub fn new<F>(description: impl Into<String>, test: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            description: description.into(),
            ty: None,
            test: Arc::new(test),
        }
    }

    /// Restrict the predicate to parameters of a given type.
    #[must_use]
    pub fn typed(mut self, ty: TypeRef) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Human-readable description.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Run the test.
    pub fn test(&self, value: &Value) -> bool {
        (self.test)(value)
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("description", &self.description)
            .field("ty", &self.ty)
            .finish()
    }
}

/// Predicate over a single argument value.
#[derive(Debug, Clone)]
pub enum ArgMatcher {
    /// Matches every value. With a type, only fits parameters of that type.
    Any(Option<TypeRef>),
    /// Matches values structurally equal to the given one.
    Exact(Value),
    /// Matches values accepted by a predicate.
    Predicate(Predicate),
    /// Matches like `inner` on a by-reference parameter.
    ByRef {
        /// The matcher applied to the current slot value.
        inner: Box<ArgMatcher>,
        /// Value spliced into the slot before a stub response runs.
        replacement: Option<Value>,
    },
}

impl ArgMatcher {
    /// Check whether an argument value satisfies this matcher.
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Any(_) => true,
            Self::Exact(expected) => expected == value,
            Self::Predicate(predicate) => predicate.test(value),
            Self::ByRef { inner, .. } => inner.matches(value),
        }
    }

    /// Check whether this matcher fits a declared parameter.
    ///
    /// By-reference-ness must agree. An exact `null` only fits reference and
    /// nullable value types.
    pub fn type_matches(&self, param: &ParamType) -> bool {
        match self {
            Self::ByRef { inner, .. } => param.by_ref && inner.fits_type(&param.ty),
            other => !param.by_ref && other.fits_type(&param.ty),
        }
    }

    fn fits_type(&self, ty: &TypeRef) -> bool {
        match self {
            Self::Any(None) => true,
            Self::Any(Some(expected)) => expected.name() == ty.name(),
            Self::Exact(value) => ty.accepts(value),
            Self::Predicate(predicate) => predicate
                .ty
                .as_ref()
                .is_none_or(|expected| expected.name() == ty.name()),
            Self::ByRef { inner, .. } => inner.fits_type(ty),
        }
    }

    /// Write the programmed replacement into a by-reference slot.
    ///
    /// No-op for every matcher except `ByRef` with a replacement value.
    pub fn adjust_reference(&self, slot: &mut Value) {
        if let Self::ByRef {
            replacement: Some(value),
            ..
        } = self
        {
            *slot = value.clone();
        }
    }

    /// Check if this matcher targets a by-reference parameter.
    pub fn is_by_ref(&self) -> bool {
        matches!(self, Self::ByRef { .. })
    }
}

impl fmt::Display for ArgMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any(None) => f.write_str("any"),
            Self::Any(Some(ty)) => write!(f, "any<{ty}>"),
            Self::Exact(value) => write!(f, "{value}"),
            Self::Predicate(predicate) => write!(f, "where {}", predicate.description),
            Self::ByRef { inner, .. } => write!(f, "ref {inner}"),
        }
    }
}

macro_rules! exact_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ArgMatcher {
                fn from(value: $ty) -> Self {
                    Self::Exact(value.into())
                }
            }
        )*
    };
}

exact_from!(Value, serde_json::Value, bool, i32, i64, u32, f64, &str, String);

/// Match any value.
pub fn any() -> ArgMatcher {
    ArgMatcher::Any(None)
}

/// Match any value, fitting only parameters of type `ty`.
pub fn any_of(ty: TypeRef) -> ArgMatcher {
    ArgMatcher::Any(Some(ty))
}

/// Match values equal to `value`.
pub fn eq(value: impl Into<Value>) -> ArgMatcher {
    ArgMatcher::Exact(value.into())
}

/// Match the null value.
pub fn null() -> ArgMatcher {
    ArgMatcher::Exact(Value::null())
}

/// Match values accepted by `test`.
pub fn predicate<F>(description: impl Into<String>, test: F) -> ArgMatcher
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    ArgMatcher::Predicate(Predicate::new(description, test))
}

/// Match values accepted by `test`, fitting only parameters of type `ty`.
pub fn typed_predicate<F>(ty: TypeRef, description: impl Into<String>, test: F) -> ArgMatcher
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    ArgMatcher::Predicate(Predicate::new(description, test).typed(ty))
}

/// Match string values against a regular expression.
pub fn matches_regex(pattern: &str) -> Result<ArgMatcher, regex::Error> {
    let re = Regex::new(pattern)?;
    Ok(predicate(format!("/{pattern}/"), move |value| {
        value.as_str().is_some_and(|s| re.is_match(s))
    }))
}

/// Match a by-reference parameter with `inner`, leaving the slot untouched.
pub fn by_ref(inner: impl Into<ArgMatcher>) -> ArgMatcher {
    ArgMatcher::ByRef {
        inner: Box::new(inner.into()),
        replacement: None,
    }
}

/// Match a by-reference parameter with `inner` and splice `replacement` into
/// the slot when a stub answers the call.
pub fn out(inner: impl Into<ArgMatcher>, replacement: impl Into<Value>) -> ArgMatcher {
    ArgMatcher::ByRef {
        inner: Box::new(inner.into()),
        replacement: Some(replacement.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueShape;

    fn int() -> TypeRef {
        TypeRef::value("Int32", ValueShape::Int)
    }

    fn opt_int() -> TypeRef {
        TypeRef::nullable("Int32?", ValueShape::Int)
    }

    #[test]
    fn value_matching() {
        assert!(any().matches(&Value::string("x")));
        assert!(eq(3).matches(&Value::int(3)));
        assert!(!eq(3).matches(&Value::int(4)));
        assert!(!eq("3").matches(&Value::int(3)));

        let positive = predicate("positive", |v| v.as_i64().is_some_and(|n| n > 0));
        assert!(positive.matches(&Value::int(1)));
        assert!(!positive.matches(&Value::int(-1)));

        assert!(by_ref(eq(1)).matches(&Value::int(1)));
        assert!(!by_ref(eq(1)).matches(&Value::int(2)));
    }

    #[test]
    fn exact_null_never_fits_value_types() {
        let param = ParamType::by_value(int());
        assert!(!null().type_matches(&param));
        assert!(null().type_matches(&ParamType::by_value(opt_int())));
        assert!(null().type_matches(&ParamType::by_value(TypeRef::object())));
    }

    #[test]
    fn exact_null_matches_absent_literal_on_reference_types() {
        assert!(null().matches(&Value::null()));
        assert!(!null().matches(&Value::int(0)));
    }

    #[test]
    fn typed_any_fits_by_name() {
        assert!(any_of(int()).type_matches(&ParamType::by_value(int())));
        assert!(!any_of(int()).type_matches(&ParamType::by_value(opt_int())));
        assert!(any().type_matches(&ParamType::by_value(opt_int())));
    }

    #[test]
    fn by_ref_agreement() {
        let by_value = ParamType::by_value(int());
        let by_reference = ParamType::by_ref(int());

        assert!(!by_ref(any()).type_matches(&by_value));
        assert!(by_ref(any()).type_matches(&by_reference));
        assert!(!any().type_matches(&by_reference));

        assert!(by_ref(any()).is_by_ref());
        assert!(out(eq(1), 2).is_by_ref());
        assert!(!eq(1).is_by_ref());
    }

    #[test]
    fn typed_predicate_fits_declared_type_only() {
        let m = typed_predicate(int(), "even", |v| v.as_i64().is_some_and(|n| n % 2 == 0));
        assert!(m.type_matches(&ParamType::by_value(int())));
        assert!(!m.type_matches(&ParamType::by_value(TypeRef::object())));
    }

    #[test]
    fn adjust_reference_only_for_out() {
        let mut slot = Value::int(1);
        eq(1).adjust_reference(&mut slot);
        by_ref(any()).adjust_reference(&mut slot);
        assert_eq!(slot, Value::int(1));

        out(any(), 42).adjust_reference(&mut slot);
        assert_eq!(slot, Value::int(42));
    }

    #[test]
    fn regex_matcher() {
        let m = matches_regex(r"^user-\d+$").unwrap();
        assert!(m.matches(&Value::string("user-12")));
        assert!(!m.matches(&Value::string("admin")));
        assert!(!m.matches(&Value::int(12)));
        assert!(matches_regex("(").is_err());
    }

    #[test]
    fn display() {
        assert_eq!(any().to_string(), "any");
        assert_eq!(any_of(int()).to_string(), "any<Int32>");
        assert_eq!(eq("a").to_string(), "a");
        assert_eq!(out(any(), 1).to_string(), "ref any");
    }
}
