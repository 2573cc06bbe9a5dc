//! Identity of an interceptable operation.

use crate::types::{ParamType, TypeRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an interceptable operation.
///
/// Used as the join key between stub rules, verification patterns and
/// recorded invocations. Two signatures are equal iff every field is equal.
///
/// # Example
///
/// ```
/// use callshim_core::{MethodSignature, TypeRef, ValueShape};
///
/// let int = TypeRef::value("Int32", ValueShape::Int);
/// let add = MethodSignature::new_static("Calc", "add")
///     .param(int.clone())
///     .param(int.clone())
///     .returns(int);
///
/// assert_eq!(add.arity(), 2);
/// assert_eq!(add.to_string(), "Calc::add(Int32, Int32)");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSignature {
    declaring_type: String,
    name: String,
    is_static: bool,
    params: Vec<ParamType>,
    returns: TypeRef,
}

impl MethodSignature {
    /// Start a static operation signature with no parameters and no result.
    pub fn new_static(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(declaring_type, name, true)
    }

    /// Start an instance operation signature with no parameters and no result.
    pub fn new_instance(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(declaring_type, name, false)
    }

    fn new(declaring_type: impl Into<String>, name: impl Into<String>, is_static: bool) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            is_static,
            params: Vec::new(),
            returns: TypeRef::unit(),
        }
    }

    /// Append a parameter.
    #[must_use]
    pub fn param(mut self, param: impl Into<ParamType>) -> Self {
        self.params.push(param.into());
        self
    }

    /// Append a by-reference parameter.
    #[must_use]
    pub fn ref_param(mut self, ty: TypeRef) -> Self {
        self.params.push(ParamType::by_ref(ty));
        self
    }

    /// Set the return type.
    #[must_use]
    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.returns = ty;
        self
    }

    /// The owning type.
    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    /// The member name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the operation is static.
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Declared parameters, in order.
    pub fn params(&self) -> &[ParamType] {
        &self.params
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// The declared return type.
    pub fn return_type(&self) -> &TypeRef {
        &self.returns
    }

    /// Render `DeclaringType::name` without the parameter list.
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.declaring_type, self.name)
    }
}

/// Renders `DeclaringType::name(ParamType, ParamType, ...)`.
impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}(", self.declaring_type, self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValueShape;

    fn int() -> TypeRef {
        TypeRef::value("Int32", ValueShape::Int)
    }

    #[test]
    fn equality_covers_all_fields() {
        let a = MethodSignature::new_static("Calc", "add").param(int());
        assert_eq!(a, MethodSignature::new_static("Calc", "add").param(int()));
        assert_ne!(a, MethodSignature::new_instance("Calc", "add").param(int()));
        assert_ne!(a, MethodSignature::new_static("Calc", "add").ref_param(int()));
        assert_ne!(
            a,
            MethodSignature::new_static("Calc", "add").param(TypeRef::object())
        );
        assert_ne!(a, a.clone().returns(int()));
    }

    #[test]
    fn display_lists_parameters() {
        let sig = MethodSignature::new_instance("Store", "try_get")
            .param(TypeRef::reference("String", ValueShape::Str))
            .ref_param(int());
        assert_eq!(sig.to_string(), "Store::try_get(String, ref Int32)");
        assert_eq!(sig.qualified_name(), "Store::try_get");

        let empty = MethodSignature::new_static("Clock", "now");
        assert_eq!(empty.to_string(), "Clock::now()");
    }
}
