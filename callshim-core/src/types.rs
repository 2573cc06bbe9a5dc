//! Declared types, parameter slots and call-site identifiers.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Nullability class of a declared type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// A value type that can never be null.
    Value,
    /// An optional value type (`int?`, `Option<i32>`).
    NullableValue,
    /// A reference type; null is a valid instance.
    Reference,
}

/// Which non-null literal values a declared type accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueShape {
    /// Booleans.
    Bool,
    /// Integers.
    Int,
    /// Floating-point numbers; integers are accepted too.
    Float,
    /// Strings.
    Str,
    /// Arrays.
    List,
    /// Objects.
    Map,
    /// Any non-null value.
    Anything,
}

impl ValueShape {
    fn accepts(self, value: &JsonValue) -> bool {
        match self {
            Self::Bool => value.is_boolean(),
            Self::Int => value.is_i64() || value.is_u64(),
            Self::Float => value.is_number(),
            Self::Str => value.is_string(),
            Self::List => value.is_array(),
            Self::Map => value.is_object(),
            Self::Anything => !value.is_null(),
        }
    }
}

/// A declared type as seen by signature resolution and diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    name: String,
    kind: TypeKind,
    shape: ValueShape,
}

impl TypeRef {
    /// A non-nullable value type.
    pub fn value(name: impl Into<String>, shape: ValueShape) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Value,
            shape,
        }
    }

    /// An optional value type.
    pub fn nullable(name: impl Into<String>, shape: ValueShape) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::NullableValue,
            shape,
        }
    }

    /// A reference type.
    pub fn reference(name: impl Into<String>, shape: ValueShape) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Reference,
            shape,
        }
    }

    /// The root reference type, accepting every value.
    pub fn object() -> Self {
        Self::reference("Object", ValueShape::Anything)
    }

    /// Return type of operations without a result.
    pub fn unit() -> Self {
        Self::value("Void", ValueShape::Anything)
    }

    /// The type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The nullability class.
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// The accepted value shape.
    pub fn shape(&self) -> ValueShape {
        self.shape
    }

    /// Check if null is a valid value of this type.
    pub fn is_nullable(&self) -> bool {
        self.kind != TypeKind::Value
    }

    /// Check whether a literal value could be passed where this type is declared.
    ///
    /// Null is only accepted by reference and nullable value types.
    pub fn accepts(&self, value: &Value) -> bool {
        if value.is_null() {
            return self.is_nullable();
        }
        self.shape.accepts(value.inner())
    }

    /// The zero value returned when a call is answered with a default.
    pub fn zero_value(&self) -> Value {
        if self.kind != TypeKind::Value {
            return Value::null();
        }
        match self.shape {
            ValueShape::Int => Value::int(0),
            ValueShape::Float => Value::float(0.0),
            ValueShape::Bool => Value::bool(false),
            _ => Value::null(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A declared parameter slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamType {
    /// Declared type.
    pub ty: TypeRef,
    /// Whether the argument is passed by reference.
    pub by_ref: bool,
}

impl ParamType {
    /// A by-value parameter.
    pub fn by_value(ty: TypeRef) -> Self {
        Self { ty, by_ref: false }
    }

    /// A by-reference parameter.
    pub fn by_ref(ty: TypeRef) -> Self {
        Self { ty, by_ref: true }
    }
}

impl From<TypeRef> for ParamType {
    fn from(ty: TypeRef) -> Self {
        Self::by_value(ty)
    }
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.by_ref {
            write!(f, "ref {}", self.ty)
        } else {
            write!(f, "{}", self.ty)
        }
    }
}

/// Opaque identity of the receiver of an instance call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(u64);

impl InstanceId {
    /// Create an instance ID from a raw value.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Identity derived from the address of a live object.
    #[must_use]
    pub fn of<T>(object: &T) -> Self {
        Self(std::ptr::from_ref(object) as usize as u64)
    }

    /// Get the raw value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "instance_{}", self.0)
    }
}

/// Source position of a verification request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallSite {
    file: String,
    line: u32,
}

impl CallSite {
    /// Create a call site from an explicit file and line.
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Capture the location of the caller.
    #[track_caller]
    pub fn caller() -> Self {
        std::panic::Location::caller().into()
    }

    /// Source file.
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Source line.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// The same file, `offset` lines further down.
    pub fn offset(&self, offset: usize) -> Self {
        let offset = u32::try_from(offset).unwrap_or(u32::MAX);
        Self {
            file: self.file.clone(),
            line: self.line.saturating_add(offset),
        }
    }
}

impl From<&std::panic::Location<'_>> for CallSite {
    fn from(location: &std::panic::Location<'_>) -> Self {
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}
