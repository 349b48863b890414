#![forbid(unsafe_code)]

//! Runtime: the observable state store and its typed change events.
//!
//! # Role in Hearth
//! `hearth-runtime` turns the plain [`hearth_core::ApplicationState`] record
//! into a single source of truth that other components observe instead of
//! polling. A render layer subscribes to [`EventKind::ActiveTabChanged`] or
//! [`EventKind::StateChanged`] to redraw; feature modules flip flags through
//! the per-field setters.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use hearth_runtime::{EventKind, ObservableStore, StoreEvent};
//!
//! let store = ObservableStore::default();
//! let redraws = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&redraws);
//! store.subscribe(EventKind::StateChanged, move |_: &StoreEvent| {
//!     counter.set(counter.get() + 1);
//! });
//!
//! store.set_active_tab("kid-1");
//! assert_eq!(store.active_tab().as_str(), "kid-1");
//! assert_eq!(redraws.get(), 1);
//! ```
//!
//! # Threading
//! The store is single-threaded (`Rc<RefCell<..>>`) and not `Send`. Every
//! operation runs to completion synchronously.

pub mod event;
pub mod listener;
pub mod store;

pub use event::{EventKind, StoreEvent};
pub use listener::{ListenerError, ListenerFault, ListenerId, ListenerOutcome};
pub use store::{ObservableStore, Subscription, Unsubscribe, WeakStore};

pub use hearth_core::{ApplicationState, CalendarStep, FieldPatch, StatePatch, StoreConfig, TabId};
