//! Prelude for convenient imports.
//!
//! ```
//! use callshim_core::prelude::*;
//! ```

// Engine
pub use crate::config::{EngineConfig, UnmatchedPolicy};
pub use crate::engine::{Engine, HookOutcome, InterceptionHost};

// Error handling
pub use crate::error::{CallshimError, Result, UnsatisfiedCallVerification};

// Call description
pub use crate::matcher::{ArgMatcher, any, by_ref, eq, null, out, predicate};
pub use crate::pattern::CallPattern;
pub use crate::resolver::{MethodResolver, TypeCatalog, TypeDecl};
pub use crate::signature::MethodSignature;
pub use crate::types::{CallSite, InstanceId, TypeRef, ValueShape};
pub use crate::value::Value;

// Stubbing and verification
pub use crate::ledger::Invocation;
pub use crate::registry::{Response, StubRule};
pub use crate::verify::{Expectation, Times, VerificationRequest};
