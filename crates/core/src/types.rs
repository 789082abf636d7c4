//! Core types for transaction binding
//!
//! - `ResourceId`: identity under which a transaction-scoped resource is bound
//! - `Resource`: type-erased resource stored by a transaction context
//! - `TransactionOutcome`: how a transaction finished

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Type-erased resource bound to a transaction
///
/// Contexts store resources without knowing their type; the party that bound
/// a resource downcasts it back with `Arc::downcast`.
pub type Resource = Arc<dyn Any + Send + Sync>;

/// Identity of a transaction-scoped resource
///
/// Derived from the address of a shared allocation, so every handle to the
/// same `Arc` maps to the same identity for as long as the allocation lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(usize);

impl ResourceId {
    /// Identity of the allocation behind `target`
    pub fn of<T: ?Sized>(target: &Arc<T>) -> Self {
        ResourceId(Arc::as_ptr(target) as *const () as usize)
    }

    /// Build an identity from a raw value
    pub const fn from_raw(raw: usize) -> Self {
        ResourceId(raw)
    }

    /// Raw value of this identity
    pub const fn as_raw(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "resource-{:#x}", self.0)
    }
}

/// Final outcome of a transaction, delivered to completion callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionOutcome {
    /// The transaction committed
    Committed,
    /// The transaction rolled back
    RolledBack,
}

impl TransactionOutcome {
    /// Check if the outcome is a commit
    pub fn is_committed(&self) -> bool {
        matches!(self, TransactionOutcome::Committed)
    }
}

impl fmt::Display for TransactionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionOutcome::Committed => write!(f, "committed"),
            TransactionOutcome::RolledBack => write!(f, "rolled back"),
        }
    }
}
