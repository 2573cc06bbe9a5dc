//! Callshim Core Library
//!
//! A call-substitution and call-verification engine for tests. An
//! interception layer redirects calls of chosen methods into
//! [`Engine::hook`]; the engine records each call, lets registered stub rules
//! replace the result, and later checks recorded calls against expected
//! counts.
//!
//! # Key Components
//!
//! - **Matchers**: argument predicates, including by-reference rewrites
//! - **Signatures**: method identity and overload resolution by matcher types
//! - **Ledger**: chronological record of intercepted calls
//! - **Registry**: stub rules, newest first
//! - **Verification**: count checks with line-numbered failure reports
//!
//! # Example
//!
//! ```
//! use callshim_core::prelude::*;
//!
//! let text = TypeRef::reference("String", ValueShape::Str);
//! let greet = MethodSignature::new_static("Greeter", "greet").param(text.clone()).returns(text);
//! let engine = Engine::new();
//! engine.track(&greet);
//!
//! engine.hook(&greet, None, &mut [Value::from("a")]);
//!
//! let request = VerificationRequest::new(CallSite::new("greet.rs", 10))
//!     .expect(Times::Exactly(2), CallPattern::new(greet, ["a"])?);
//! let failure = engine.verify(&request).unwrap_err();
//! assert!(failure.report().starts_with("Unsatisfied invocation:\n"));
//! # Ok::<(), CallshimError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod matcher;
pub mod pattern;
pub mod prelude;
pub mod registry;
pub mod resolver;
pub mod signature;
pub mod types;
pub mod value;
pub mod verify;

// Re-export key types at crate root for convenience
pub use config::{EngineConfig, UnmatchedPolicy};
pub use engine::{Engine, HookOutcome, InterceptionHost, NoopHost, StubBuilder};
pub use error::{CallshimError, Result, UnsatisfiedCallVerification};
pub use ledger::{Invocation, Ledger};
pub use matcher::{ArgMatcher, Predicate};
pub use pattern::CallPattern;
pub use registry::{Dispatch, Response, StubRegistry, StubRule};
pub use resolver::{MethodResolver, TypeCatalog, TypeDecl};
pub use signature::MethodSignature;
pub use types::{CallSite, InstanceId, ParamType, TypeKind, TypeRef, ValueShape};
pub use value::Value;
pub use verify::{Expectation, Times, VerificationRequest};
