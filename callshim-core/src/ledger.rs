//! Chronological record of intercepted calls.
//!
//! Every call that reaches the hook is appended exactly once, with its
//! arguments captured at call time. Entries are never mutated; only
//! [`Ledger::reset`] removes them.

use crate::signature::MethodSignature;
use crate::types::InstanceId;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One intercepted call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation {
    seq: u64,
    signature: MethodSignature,
    instance: Option<InstanceId>,
    arguments: Vec<Value>,
}

impl Invocation {
    /// Ledger-assigned sequence number.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The called operation.
    pub fn signature(&self) -> &MethodSignature {
        &self.signature
    }

    /// The receiver, for instance calls.
    pub fn instance(&self) -> Option<InstanceId> {
        self.instance
    }

    /// Argument snapshot taken at call time.
    pub fn arguments(&self) -> &[Value] {
        &self.arguments
    }
}

/// Renders `DeclaringType::name(Type<value>, ...)`.
impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.signature.qualified_name())?;
        for (i, (param, arg)) in self.signature.params().iter().zip(&self.arguments).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}<{arg}>")?;
        }
        f.write_str(")")
    }
}

/// Append-only log of invocations.
///
/// # Example
///
/// ```
/// use callshim_core::{Ledger, MethodSignature, Value};
///
/// let now = MethodSignature::new_static("Clock", "now");
/// let mut ledger = Ledger::new();
///
/// let first = ledger.record(&now, None, &[]);
/// let second = ledger.record(&now, None, &[]);
/// assert!(second.seq() > first.seq());
/// assert_eq!(ledger.len(), 2);
///
/// ledger.reset();
/// assert!(ledger.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Ledger {
    entries: Vec<Invocation>,
    next_seq: u64,
}

impl Ledger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 1,
        }
    }

    /// Append a call and return the new entry.
    ///
    /// `args` is copied, so later writes to by-reference slots do not change
    /// the record.
    pub fn record(
        &mut self,
        signature: &MethodSignature,
        instance: Option<InstanceId>,
        args: &[Value],
    ) -> Invocation {
        let invocation = Invocation {
            seq: self.next_seq,
            signature: signature.clone(),
            instance,
            arguments: args.to_vec(),
        };
        self.next_seq += 1;
        tracing::trace!(seq = invocation.seq, call = %invocation, "Recorded invocation");
        self.entries.push(invocation.clone());
        invocation
    }

    /// All entries, oldest first.
    pub fn all(&self) -> &[Invocation] {
        &self.entries
    }

    /// Entries for one signature, oldest first.
    pub fn invocations_of(&self, signature: &MethodSignature) -> Vec<&Invocation> {
        self.entries
            .iter()
            .filter(|inv| &inv.signature == signature)
            .collect()
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all entries and restart numbering.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.next_seq = 1;
    }

    /// Pretty JSON dump of every entry.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.entries)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TypeRef, ValueShape};

    fn greet() -> MethodSignature {
        MethodSignature::new_instance("Greeter", "greet")
            .param(TypeRef::reference("String", ValueShape::Str))
            .ref_param(TypeRef::value("Int32", ValueShape::Int))
    }

    #[test]
    fn sequence_numbers_strictly_increase() {
        let mut ledger = Ledger::new();
        let seqs: Vec<u64> = (0..5)
            .map(|i| {
                ledger
                    .record(&greet(), None, &[Value::string("x"), Value::int(i)])
                    .seq()
            })
            .collect();
        assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn reset_restarts_numbering() {
        let mut ledger = Ledger::new();
        ledger.record(&greet(), None, &[Value::string("x"), Value::int(0)]);
        ledger.reset();
        let inv = ledger.record(&greet(), None, &[Value::string("y"), Value::int(0)]);
        assert_eq!(inv.seq(), 1);
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn arguments_are_snapshotted() {
        let mut ledger = Ledger::new();
        let mut args = vec![Value::string("x"), Value::int(1)];
        ledger.record(&greet(), Some(InstanceId::new(3)), &args);
        args[1] = Value::int(2);

        assert_eq!(ledger.all()[0].arguments()[1], Value::int(1));
        assert_eq!(ledger.all()[0].instance(), Some(InstanceId::new(3)));
    }

    #[test]
    fn rendering() {
        let mut ledger = Ledger::new();
        let inv = ledger.record(&greet(), None, &[Value::string("bob"), Value::int(5)]);
        assert_eq!(inv.to_string(), "Greeter::greet(String<bob>, ref Int32<5>)");
    }

    #[test]
    fn filter_by_signature() {
        let other = MethodSignature::new_static("Clock", "now");
        let mut ledger = Ledger::new();
        ledger.record(&greet(), None, &[Value::string("a"), Value::int(0)]);
        ledger.record(&other, None, &[]);
        ledger.record(&greet(), None, &[Value::string("b"), Value::int(0)]);

        let greets = ledger.invocations_of(&greet());
        assert_eq!(greets.len(), 2);
        assert_eq!(greets[1].seq(), 3);
    }

    #[test]
    fn json_export() {
        let mut ledger = Ledger::new();
        ledger.record(&greet(), None, &[Value::string("a"), Value::int(0)]);
        let json = ledger.to_json().unwrap();
        assert!(json.contains("\"greet\""));
        assert!(json.contains("\"seq\": 1"));
    }
}
