#![forbid(unsafe_code)]

//! Listener registry and fault isolation.
//!
//! # Design
//!
//! Each [`EventKind`] owns an ordered list of `(ListenerId, callback)`
//! entries. Ids come from one monotonically increasing counter, so every
//! list is sorted by id and registration order is id order. Removal looks the
//! id up by binary search; closures are never compared.
//!
//! A listener is any `Fn(&StoreEvent) -> R` where `R` is `()` or
//! `Result<(), E: Display>`. An `Err` return or a panic is a
//! [`ListenerFault`]; the store catches it at the emission site.
//!
//! # Failure Modes
//!
//! - **Panicking listener**: caught with `catch_unwind`. The default panic
//!   hook still prints the panic message to stderr.
//! - **Rc cycle**: a listener that owns a strong store handle keeps the store
//!   alive. Capture a `WeakStore` instead.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::rc::Rc;

use crate::event::{EventKind, StoreEvent};

/// Type-erased callback. `Some(message)` reports a failure.
pub(crate) type ListenerFn = Rc<dyn Fn(&StoreEvent) -> Option<String>>;

/// Return types a listener may use.
pub trait ListenerOutcome {
    /// `Some(message)` if the listener failed.
    fn into_failure(self) -> Option<String>;
}

impl ListenerOutcome for () {
    #[inline]
    fn into_failure(self) -> Option<String> {
        None
    }
}

impl<E: fmt::Display> ListenerOutcome for Result<(), E> {
    fn into_failure(self) -> Option<String> {
        self.err().map(|e| e.to_string())
    }
}

pub(crate) fn erase<F, R>(listener: F) -> ListenerFn
where
    F: Fn(&StoreEvent) -> R + 'static,
    R: ListenerOutcome,
{
    Rc::new(move |event: &StoreEvent| listener(event).into_failure())
}

/// Identity of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// How a listener failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenerFault {
    /// The listener returned `Err`.
    Failed(String),
    /// The listener panicked.
    Panicked(String),
}

/// A listener fault, tagged with the event being delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerError {
    pub event: EventKind,
    pub fault: ListenerFault,
}

impl fmt::Display for ListenerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fault {
            ListenerFault::Failed(msg) => {
                write!(f, "listener for '{}' failed: {msg}", self.event)
            }
            ListenerFault::Panicked(msg) => {
                write!(f, "listener for '{}' panicked: {msg}", self.event)
            }
        }
    }
}

impl std::error::Error for ListenerError {}

/// Run one listener, converting an error return or a panic into a fault.
pub(crate) fn invoke(listener: &ListenerFn, event: &StoreEvent) -> Result<(), ListenerFault> {
    match catch_unwind(AssertUnwindSafe(|| listener(event))) {
        Ok(None) => Ok(()),
        Ok(Some(msg)) => Err(ListenerFault::Failed(msg)),
        Err(payload) => {
            let msg = if let Some(s) = payload.downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = payload.downcast_ref::<String>() {
                s.clone()
            } else {
                "unknown panic".to_string()
            };
            Err(ListenerFault::Panicked(msg))
        }
    }
}

/// Per-kind ordered listener lists.
#[derive(Default)]
pub(crate) struct ListenerRegistry {
    lists: [Vec<(ListenerId, ListenerFn)>; EventKind::COUNT],
    next_id: u64,
}

impl ListenerRegistry {
    pub(crate) fn insert(&mut self, kind: EventKind, listener: ListenerFn) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.lists[kind.index()].push((id, listener));
        id
    }

    /// Remove one registration. Returns `false` if it was already gone.
    pub(crate) fn remove(&mut self, kind: EventKind, id: ListenerId) -> bool {
        let list = &mut self.lists[kind.index()];
        match list.binary_search_by_key(&id, |(entry_id, _)| *entry_id) {
            Ok(pos) => {
                list.remove(pos);
                true
            }
            Err(_) => false,
        }
    }

    /// Clone the current callbacks for `kind`, in registration order.
    pub(crate) fn snapshot(&self, kind: EventKind) -> Vec<ListenerFn> {
        self.lists[kind.index()]
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect()
    }

    pub(crate) fn len(&self, kind: EventKind) -> usize {
        self.lists[kind.index()].len()
    }

    pub(crate) fn total(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }
}
