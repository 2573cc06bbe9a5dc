//! The engine: hook entry point, stub registration, verification and reset.
//!
//! One [`Engine`] holds all process-scoped state for a test (the ledger, the
//! stub registry and the set of signatures the interception layer has been
//! asked to hook) behind a single lock. Share it as `Arc<Engine>` with the
//! interception layer.

use crate::config::{EngineConfig, UnmatchedPolicy};
use crate::error::UnsatisfiedCallVerification;
use crate::ledger::{Invocation, Ledger};
use crate::pattern::CallPattern;
use crate::registry::{Dispatch, Response, StubRegistry, StubRule};
use crate::signature::MethodSignature;
use crate::types::InstanceId;
use crate::value::Value;
use crate::verify::{self, VerificationRequest};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Hook-installation side of the interception layer.
///
/// Implementations must not call back into the engine from these methods.
pub trait InterceptionHost: Send + Sync {
    /// Start redirecting calls of `signature` into [`Engine::hook`].
    fn attach(&self, signature: &MethodSignature);

    /// Remove every installed redirection.
    fn detach_all(&self);
}

/// Host that installs nothing, for layers that hook unconditionally.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHost;

impl InterceptionHost for NoopHost {
    fn attach(&self, _signature: &MethodSignature) {}

    fn detach_all(&self) {}
}

/// What the interception layer should do with a call.
#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    /// Run the real implementation (not handled).
    Original,
    /// Skip the real implementation and return this value (handled).
    Replaced(Value),
}

impl HookOutcome {
    /// Check if the engine answered the call.
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::Replaced(_))
    }

    /// The replacement value, if the call was handled.
    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Replaced(value) => Some(value),
            Self::Original => None,
        }
    }
}

#[derive(Default)]
struct EngineState {
    ledger: Ledger,
    registry: StubRegistry,
    attached: HashSet<MethodSignature>,
}

/// Call-substitution and call-verification engine.
///
/// # Example
///
/// ```
/// use callshim_core::matcher::any;
/// use callshim_core::verify::{Times, VerificationRequest};
/// use callshim_core::{CallPattern, Engine, HookOutcome, MethodSignature, TypeRef, Value, ValueShape};
///
/// let int = TypeRef::value("Int32", ValueShape::Int);
/// let sig = MethodSignature::new_static("Dice", "roll").param(int.clone()).returns(int);
/// let engine = Engine::new();
///
/// engine
///     .when(CallPattern::new(sig.clone(), [any()]).unwrap())
///     .returns(4);
///
/// let mut args = [Value::int(6)];
/// assert_eq!(engine.hook(&sig, None, &mut args), HookOutcome::Replaced(Value::int(4)));
///
/// let request = VerificationRequest::here()
///     .expect(Times::once(), CallPattern::new(sig, [6]).unwrap());
/// assert!(engine.verify(&request).is_ok());
/// ```
pub struct Engine {
    config: EngineConfig,
    host: Arc<dyn InterceptionHost>,
    state: RwLock<EngineState>,
}

impl Engine {
    /// Create an engine with default configuration.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    /// Create an engine with the given configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            host: Arc::new(NoopHost),
            state: RwLock::new(EngineState::default()),
        }
    }

    /// Use a custom interception host.
    #[must_use]
    pub fn with_host(mut self, host: Arc<dyn InterceptionHost>) -> Self {
        self.host = host;
        self
    }

    /// Wrap the engine for sharing with the interception layer.
    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Entry point for the interception layer, called before a target's
    /// real body runs.
    ///
    /// Records the call, then lets the newest matching stub rule answer it.
    /// By-reference replacements are written into `args` in place. The
    /// winning response runs after the engine lock is released.
    pub fn hook(
        &self,
        signature: &MethodSignature,
        instance: Option<InstanceId>,
        args: &mut [Value],
    ) -> HookOutcome {
        if args.len() != signature.arity() {
            tracing::warn!(
                signature = %signature,
                expected = signature.arity(),
                actual = args.len(),
                "Hook called with wrong argument count"
            );
        }

        let selected = {
            let mut state = self.state.write();
            if self.config.recording {
                state.ledger.record(signature, instance, args);
            }
            state.registry.select(signature, instance, args)
        };

        let dispatch = match selected {
            Some(selected) => selected.apply(args),
            None => Dispatch::Unhandled,
        };
        tracing::trace!(signature = %signature, dispatch = ?dispatch, "Dispatched call");

        match dispatch {
            Dispatch::Return(value) => HookOutcome::Replaced(value),
            Dispatch::CallOriginal => HookOutcome::Original,
            Dispatch::Unhandled => match self.config.unmatched {
                UnmatchedPolicy::CallOriginal => HookOutcome::Original,
                UnmatchedPolicy::ReturnDefault => {
                    HookOutcome::Replaced(signature.return_type().zero_value())
                }
            },
        }
    }

    /// Register a stub rule; it overrides every earlier matching rule.
    pub fn register(&self, rule: StubRule) {
        let signature = rule.pattern().signature().clone();
        let newly_attached = {
            let mut state = self.state.write();
            state.registry.register(rule);
            state.attached.insert(signature.clone())
        };
        if newly_attached {
            self.attach(&signature);
        }
    }

    /// Start a fluent stub registration.
    pub fn when(&self, pattern: CallPattern) -> StubBuilder<'_> {
        StubBuilder {
            engine: self,
            pattern,
            times: None,
        }
    }

    /// Ask the interception layer to hook `signature` without stubbing it,
    /// so its calls are recorded for verification.
    pub fn track(&self, signature: &MethodSignature) {
        let newly_attached = self.state.write().attached.insert(signature.clone());
        if newly_attached {
            self.attach(signature);
        }
    }

    fn attach(&self, signature: &MethodSignature) {
        tracing::debug!(signature = %signature, "Attaching interception hook");
        self.host.attach(signature);
    }

    /// Check if `signature` has been handed to the interception layer.
    pub fn is_attached(&self, signature: &MethodSignature) -> bool {
        self.state.read().attached.contains(signature)
    }

    /// Check every expectation of `request` against the ledger.
    pub fn verify(&self, request: &VerificationRequest) -> Result<(), UnsatisfiedCallVerification> {
        let state = self.state.read();
        let evaluation = verify::evaluate(state.ledger.all(), request);
        match evaluation.report() {
            None => Ok(()),
            Some(report) => {
                let failed = evaluation
                    .groups()
                    .iter()
                    .filter(|group| !group.is_satisfied())
                    .count();
                tracing::warn!(
                    call_site = %request.call_site(),
                    failed_groups = failed,
                    total_groups = evaluation.groups().len(),
                    "Call verification failed"
                );
                Err(UnsatisfiedCallVerification::new(report))
            }
        }
    }

    /// Verify `request`, panicking with the report on failure.
    #[track_caller]
    pub fn assert_verified(&self, request: &VerificationRequest) {
        if let Err(failure) = self.verify(request) {
            panic!("{failure}");
        }
    }

    /// Clear the ledger, every stub rule and every hook in one step.
    pub fn reset(&self) {
        let mut state = self.state.write();
        let (calls, rules) = (state.ledger.len(), state.registry.len());
        *state = EngineState::default();
        self.host.detach_all();
        tracing::debug!(calls, rules, "Engine reset");
    }

    /// Snapshot of the ledger, oldest first.
    pub fn invocations(&self) -> Vec<Invocation> {
        self.state.read().ledger.all().to_vec()
    }

    /// Number of recorded calls.
    pub fn invocation_count(&self) -> usize {
        self.state.read().ledger.len()
    }

    /// Number of registered stub rules.
    pub fn rule_count(&self) -> usize {
        self.state.read().registry.len()
    }

    /// Pretty JSON dump of the ledger.
    pub fn ledger_json(&self) -> Result<String, serde_json::Error> {
        self.state.read().ledger.to_json()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("Engine")
            .field("config", &self.config)
            .field("invocations", &state.ledger.len())
            .field("rules", &state.registry.len())
            .field("attached", &state.attached.len())
            .finish()
    }
}

/// Builder for fluent stub registration.
pub struct StubBuilder<'a> {
    engine: &'a Engine,
    pattern: CallPattern,
    times: Option<usize>,
}

impl<'a> StubBuilder<'a> {
    /// Answer only the next `n` matching calls.
    #[must_use]
    pub fn times(mut self, n: usize) -> Self {
        self.times = Some(n);
        self
    }

    /// Register the rule with an explicit response.
    pub fn responds(self, response: Response) -> &'a Engine {
        let mut rule = StubRule::new(self.pattern, response);
        if let Some(n) = self.times {
            rule = rule.times(n);
        }
        self.engine.register(rule);
        self.engine
    }

    /// Return a fixed value.
    pub fn returns(self, value: impl Into<Value>) -> &'a Engine {
        self.responds(Response::Fixed(value.into()))
    }

    /// Compute the return value from the arguments.
    pub fn computes<F>(self, f: F) -> &'a Engine
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        self.responds(Response::computed(f))
    }

    /// Let the real implementation run.
    pub fn calls_original(self) -> &'a Engine {
        self.responds(Response::DelegateToOriginal)
    }

    /// Return the zero value of the return type.
    pub fn returns_default(self) -> &'a Engine {
        self.responds(Response::Default)
    }
}
