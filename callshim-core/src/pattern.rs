//! Call patterns: a signature plus one matcher per parameter.

use crate::error::{CallshimError, Result};
use crate::ledger::Invocation;
use crate::matcher::ArgMatcher;
use crate::resolver::MethodResolver;
use crate::signature::MethodSignature;
use crate::types::InstanceId;
use crate::value::Value;
use std::fmt;

/// A signature with per-parameter matchers.
///
/// Shared by stub rules and verification expectations. The matcher count
/// always equals the signature's arity.
#[derive(Debug, Clone)]
pub struct CallPattern {
    signature: MethodSignature,
    matchers: Vec<ArgMatcher>,
    instance: Option<InstanceId>,
}

impl CallPattern {
    /// Build a pattern for a known signature.
    ///
    /// Fails with `MatcherArity` when the matcher count differs from the
    /// parameter count.
    pub fn new<M>(signature: MethodSignature, matchers: M) -> Result<Self>
    where
        M: IntoIterator,
        M::Item: Into<ArgMatcher>,
    {
        let matchers: Vec<ArgMatcher> = matchers.into_iter().map(Into::into).collect();
        if matchers.len() != signature.arity() {
            return Err(CallshimError::MatcherArity {
                signature: signature.to_string(),
                expected: signature.arity(),
                actual: matchers.len(),
            });
        }
        Ok(Self {
            signature,
            matchers,
            instance: None,
        })
    }

    /// Build a pattern from a member name, resolving the overload from the
    /// matchers.
    pub fn resolve<M>(
        resolver: &dyn MethodResolver,
        type_name: &str,
        name: &str,
        is_static: bool,
        matchers: M,
    ) -> Result<Self>
    where
        M: IntoIterator,
        M::Item: Into<ArgMatcher>,
    {
        let matchers: Vec<ArgMatcher> = matchers.into_iter().map(Into::into).collect();
        let signature = resolver.resolve(type_name, name, is_static, &matchers)?;
        Self::new(signature, matchers)
    }

    /// Only match calls made on `instance`.
    #[must_use]
    pub fn on_instance(mut self, instance: InstanceId) -> Self {
        self.instance = Some(instance);
        self
    }

    /// The target signature.
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    /// Per-parameter matchers.
    pub fn matchers(&self) -> &[ArgMatcher] {
        &self.matchers
    }

    /// The instance filter, if any.
    pub fn instance(&self) -> Option<InstanceId> {
        self.instance
    }

    /// Check whether a call satisfies this pattern.
    pub fn matches_call(
        &self,
        signature: &MethodSignature,
        instance: Option<InstanceId>,
        args: &[Value],
    ) -> bool {
        if &self.signature != signature {
            return false;
        }
        if self.instance.is_some() && self.instance != instance {
            return false;
        }
        args.len() == self.matchers.len()
            && self
                .matchers
                .iter()
                .zip(args)
                .all(|(matcher, arg)| matcher.matches(arg))
    }

    /// Check whether a recorded invocation satisfies this pattern.
    pub fn matches(&self, invocation: &Invocation) -> bool {
        self.matches_call(
            invocation.signature(),
            invocation.instance(),
            invocation.arguments(),
        )
    }

    /// Apply every by-reference replacement to `args`.
    pub(crate) fn adjust_references(&self, args: &mut [Value]) {
        for (matcher, slot) in self.matchers.iter().zip(args.iter_mut()) {
            matcher.adjust_reference(slot);
        }
    }
}

impl fmt::Display for CallPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.signature.qualified_name())?;
        for (i, matcher) in self.matchers.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{matcher}")?;
        }
        f.write_str(")")?;
        if let Some(instance) = self.instance {
            write!(f, " on {instance}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{any, eq, out};
    use crate::types::{TypeRef, ValueShape};

    fn echo() -> MethodSignature {
        MethodSignature::new_instance("Echo", "say")
            .param(TypeRef::reference("String", ValueShape::Str))
    }

    #[test]
    fn arity_is_enforced() {
        let err = CallPattern::new(echo(), [any(), any()]).unwrap_err();
        assert_eq!(
            err,
            CallshimError::MatcherArity {
                signature: "Echo::say(String)".to_string(),
                expected: 1,
                actual: 2,
            }
        );
    }

    #[test]
    fn matches_signature_and_arguments() {
        let pattern = CallPattern::new(echo(), ["a"]).unwrap();
        assert!(pattern.matches_call(&echo(), None, &[Value::string("a")]));
        assert!(!pattern.matches_call(&echo(), None, &[Value::string("b")]));

        let other = MethodSignature::new_instance("Echo", "shout")
            .param(TypeRef::reference("String", ValueShape::Str));
        assert!(!pattern.matches_call(&other, None, &[Value::string("a")]));
    }

    #[test]
    fn instance_filter() {
        let pattern = CallPattern::new(echo(), [any()])
            .unwrap()
            .on_instance(InstanceId::new(7));
        let args = [Value::string("a")];
        assert!(pattern.matches_call(&echo(), Some(InstanceId::new(7)), &args));
        assert!(!pattern.matches_call(&echo(), Some(InstanceId::new(8)), &args));
        assert!(!pattern.matches_call(&echo(), None, &args));

        let unscoped = CallPattern::new(echo(), [any()]).unwrap();
        assert!(unscoped.matches_call(&echo(), Some(InstanceId::new(8)), &args));
    }

    #[test]
    fn adjust_references_splices_only_out_slots() {
        let int = TypeRef::value("Int32", ValueShape::Int);
        let sig = MethodSignature::new_static("Map", "try_get")
            .param(int.clone())
            .ref_param(int);
        let pattern = CallPattern::new(sig, [eq(1), out(any(), 99)]).unwrap();

        let mut args = vec![Value::int(1), Value::int(0)];
        pattern.adjust_references(&mut args);
        assert_eq!(args, vec![Value::int(1), Value::int(99)]);
    }

    #[test]
    fn display() {
        let pattern = CallPattern::new(echo(), ["a"])
            .unwrap()
            .on_instance(InstanceId::new(3));
        assert_eq!(pattern.to_string(), "Echo::say(a) on instance_3");
    }
}
