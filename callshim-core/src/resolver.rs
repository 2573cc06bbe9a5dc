//! Resolving a member name to one concrete signature.
//!
//! Patterns built from a literal member name (rather than a known
//! [`MethodSignature`]) go through a [`MethodResolver`]. The filter pipeline
//! is the same for every resolver:
//!
//! 1. members with the requested name and static/instance context
//! 2. members with the same arity as the matcher list
//! 3. members whose every parameter fits the corresponding matcher
//!
//! Exactly one survivor is a success. Anything else is an error raised at
//! pattern construction time.

use crate::error::{CallshimError, Result};
use crate::matcher::ArgMatcher;
use crate::signature::MethodSignature;
use crate::types::{ParamType, TypeRef};
use std::collections::HashMap;

/// Capability that resolves a member name on a type to one signature.
pub trait MethodResolver: Send + Sync {
    /// Resolve `type_name::name` against the supplied argument matchers.
    fn resolve(
        &self,
        type_name: &str,
        name: &str,
        is_static: bool,
        matchers: &[ArgMatcher],
    ) -> Result<MethodSignature>;
}

/// Pick the single signature among `members` that fits the request.
///
/// `members` must be in declaration order; ambiguity errors list the
/// surviving candidates in that order.
pub fn resolve_overload<'a, I>(
    type_name: &str,
    name: &str,
    is_static: bool,
    matchers: &[ArgMatcher],
    members: I,
) -> Result<MethodSignature>
where
    I: IntoIterator<Item = &'a MethodSignature>,
{
    let candidates: Vec<&MethodSignature> = members
        .into_iter()
        .filter(|m| m.name() == name && m.is_static() == is_static)
        .filter(|m| m.arity() == matchers.len())
        .filter(|m| {
            m.params()
                .iter()
                .zip(matchers)
                .all(|(param, matcher)| matcher.type_matches(param))
        })
        .collect();

    match candidates.as_slice() {
        [single] => {
            tracing::trace!(signature = %single, "Resolved member");
            Ok((*single).clone())
        }
        [] => Err(CallshimError::NoMatchingMethod {
            type_name: type_name.to_string(),
            method: name.to_string(),
            is_static,
            arity: matchers.len(),
        }),
        many => Err(CallshimError::AmbiguousMethod {
            type_name: type_name.to_string(),
            method: name.to_string(),
            candidates: many.iter().map(|m| m.to_string()).collect(),
        }),
    }
}

/// Declared members of one type, in declaration order.
#[derive(Debug, Clone)]
pub struct TypeDecl {
    name: String,
    members: Vec<MethodSignature>,
}

impl TypeDecl {
    /// Start declaring a type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
        }
    }

    /// Declare a static member.
    #[must_use]
    pub fn static_method<P>(self, name: &str, params: P, returns: TypeRef) -> Self
    where
        P: IntoIterator,
        P::Item: Into<ParamType>,
    {
        let sig = MethodSignature::new_static(self.name.clone(), name);
        self.push(sig, params, returns)
    }

    /// Declare an instance member.
    #[must_use]
    pub fn instance_method<P>(self, name: &str, params: P, returns: TypeRef) -> Self
    where
        P: IntoIterator,
        P::Item: Into<ParamType>,
    {
        let sig = MethodSignature::new_instance(self.name.clone(), name);
        self.push(sig, params, returns)
    }

    /// Declare a fully built signature.
    ///
    /// The signature's declaring type should be this type's name.
    #[must_use]
    pub fn member(mut self, signature: MethodSignature) -> Self {
        self.members.push(signature);
        self
    }

    fn push<P>(self, sig: MethodSignature, params: P, returns: TypeRef) -> Self
    where
        P: IntoIterator,
        P::Item: Into<ParamType>,
    {
        let sig = params
            .into_iter()
            .fold(sig, |sig, param| sig.param(param))
            .returns(returns);
        self.member(sig)
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[MethodSignature] {
        &self.members
    }
}

/// In-memory [`MethodResolver`] over declared types.
///
/// # Example
///
/// ```
/// use callshim_core::matcher::null;
/// use callshim_core::{MethodResolver, TypeCatalog, TypeDecl, TypeRef, ValueShape};
///
/// let int = TypeRef::value("Int32", ValueShape::Int);
/// let opt_int = TypeRef::nullable("Int32?", ValueShape::Int);
///
/// let catalog = TypeCatalog::new().with_type(
///     TypeDecl::new("Parser")
///         .static_method("parse", [int], TypeRef::unit())
///         .static_method("parse", [opt_int], TypeRef::unit()),
/// );
///
/// // Only the nullable overload accepts a literal null.
/// let sig = catalog.resolve("Parser", "parse", true, &[null()]).unwrap();
/// assert_eq!(sig.to_string(), "Parser::parse(Int32?)");
/// ```
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: HashMap<String, TypeDecl>,
}

impl TypeCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type declaration, replacing any previous one with the same name.
    #[must_use]
    pub fn with_type(mut self, decl: TypeDecl) -> Self {
        self.insert(decl);
        self
    }

    /// Add a type declaration, replacing any previous one with the same name.
    pub fn insert(&mut self, decl: TypeDecl) {
        self.types.insert(decl.name.clone(), decl);
    }

    /// Look up a declared type.
    pub fn get(&self, type_name: &str) -> Option<&TypeDecl> {
        self.types.get(type_name)
    }
}

impl MethodResolver for TypeCatalog {
    fn resolve(
        &self,
        type_name: &str,
        name: &str,
        is_static: bool,
        matchers: &[ArgMatcher],
    ) -> Result<MethodSignature> {
        let decl = self
            .types
            .get(type_name)
            .ok_or_else(|| CallshimError::UnknownType {
                type_name: type_name.to_string(),
            })?;
        resolve_overload(type_name, name, is_static, matchers, &decl.members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{any, any_of, by_ref, eq, null};
    use crate::types::ValueShape;

    fn int() -> TypeRef {
        TypeRef::value("Int32", ValueShape::Int)
    }

    fn opt_int() -> TypeRef {
        TypeRef::nullable("Int32?", ValueShape::Int)
    }

    fn string() -> TypeRef {
        TypeRef::reference("String", ValueShape::Str)
    }

    fn catalog() -> TypeCatalog {
        TypeCatalog::new().with_type(
            TypeDecl::new("Overloads")
                .static_method("method", [int()], TypeRef::unit())
                .static_method("method", [TypeRef::object()], TypeRef::unit())
                .static_method("method", [int(), int()], TypeRef::unit())
                .instance_method("method", [string()], TypeRef::unit())
                .static_method("nullable", [int()], TypeRef::unit())
                .static_method("nullable", [opt_int()], TypeRef::unit()),
        )
    }

    #[test]
    fn arity_narrows_to_one() {
        let sig = catalog()
            .resolve("Overloads", "method", true, &[any(), any()])
            .unwrap();
        assert_eq!(sig.to_string(), "Overloads::method(Int32, Int32)");
    }

    #[test]
    fn static_context_narrows_to_one() {
        let sig = catalog()
            .resolve("Overloads", "method", false, &[eq("a")])
            .unwrap();
        assert_eq!(sig.to_string(), "Overloads::method(String)");
        assert!(!sig.is_static());
    }

    #[test]
    fn null_literal_is_ambiguous_between_reference_types() {
        let catalog = TypeCatalog::new().with_type(
            TypeDecl::new("Overloads")
                .static_method("method", [opt_int()], TypeRef::unit())
                .static_method("method", [TypeRef::object()], TypeRef::unit()),
        );
        let err = catalog
            .resolve("Overloads", "method", true, &[null()])
            .unwrap_err();
        assert_eq!(
            err,
            CallshimError::AmbiguousMethod {
                type_name: "Overloads".to_string(),
                method: "method".to_string(),
                candidates: vec![
                    "Overloads::method(Int32?)".to_string(),
                    "Overloads::method(Object)".to_string(),
                ],
            }
        );
    }

    #[test]
    fn null_literal_skips_value_type() {
        let sig = catalog()
            .resolve("Overloads", "nullable", true, &[null()])
            .unwrap();
        assert_eq!(sig.to_string(), "Overloads::nullable(Int32?)");
    }

    #[test]
    fn integer_literal_is_ambiguous_between_int_and_object() {
        let err = catalog()
            .resolve("Overloads", "method", true, &[eq(1)])
            .unwrap_err();
        match err {
            CallshimError::AmbiguousMethod { candidates, .. } => assert_eq!(
                candidates,
                vec![
                    "Overloads::method(Int32)".to_string(),
                    "Overloads::method(Object)".to_string(),
                ]
            ),
            other => panic!("Expected AmbiguousMethod, got {other:?}"),
        }
    }

    #[test]
    fn typed_any_disambiguates() {
        let sig = catalog()
            .resolve("Overloads", "method", true, &[any_of(int())])
            .unwrap();
        assert_eq!(sig.to_string(), "Overloads::method(Int32)");
    }

    #[test]
    fn no_candidates() {
        let err = catalog()
            .resolve("Overloads", "method", true, &[any(), any(), any()])
            .unwrap_err();
        assert_eq!(err.code(), "E102");

        let err = catalog()
            .resolve("Overloads", "method", true, &[by_ref(any())])
            .unwrap_err();
        assert_eq!(err.code(), "E102");

        let err = catalog().resolve("Missing", "method", true, &[]).unwrap_err();
        assert_eq!(err.code(), "E103");
    }
}
