#![forbid(unsafe_code)]

//! Observable application state store.
//!
//! # Design
//!
//! [`ObservableStore`] wraps an [`ApplicationState`] in shared,
//! reference-counted storage (`Rc<RefCell<..>>`). The composition root
//! creates one store and hands clones to the components that need it;
//! clones share the same record and the same listeners.
//!
//! A call to [`ObservableStore::set_state`] runs in two phases:
//!
//! 1. **Commit**: every patch entry is applied under one borrow and the
//!    changed fields are recorded.
//! 2. **Emit**: with the borrow released, one field event per changed field
//!    is emitted in patch order, then exactly one
//!    [`StoreEvent::StateChanged`].
//!
//! # Invariants
//!
//! 1. No listener observes a partially applied patch.
//! 2. Setting a field to its current value emits no field event.
//! 3. Every non-empty patch emits exactly one `StateChanged`, even when no
//!    field changed. An empty patch is a no-op.
//! 4. Listeners of one kind run in registration order.
//! 5. `version` increments once per patch that changed at least one field.
//!
//! # Re-entrancy
//!
//! The `RefCell` borrow is never held while a listener runs. A listener may
//! call `set_state`, `subscribe`, or unsubscribe; a nested `set_state` is
//! committed and fully emitted before the outer emission moves on to its
//! next listener. The outer `StateChanged` still carries the snapshots of
//! the outer call.
//!
//! Each emission iterates over a snapshot of the listener list taken when
//! the emission starts: listeners added mid-emission first run on the next
//! emission, and listeners removed mid-emission may still receive the event
//! in flight.
//!
//! # Failure Modes
//!
//! A listener that returns `Err` or panics is isolated: the fault is logged
//! at `error` level with the event name, kept in a bounded error log, and
//! delivery continues with the next listener. Faults never reach the caller
//! of `emit` or `set_state`.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use chrono::NaiveDate;
use hearth_core::{
    ApplicationState, CalendarStep, Field, FieldPatch, StatePatch, StoreConfig, TabId,
};
use tracing::{Level, debug, error, trace};

use crate::event::{EventKind, StoreEvent};
use crate::listener::{self, ListenerError, ListenerId, ListenerOutcome, ListenerRegistry};

/// Shared interior for [`ObservableStore`].
struct StoreInner {
    state: ApplicationState,
    version: u64,
    listeners: ListenerRegistry,
    /// Most recent listener faults, oldest first.
    errors: VecDeque<ListenerError>,
    error_capacity: usize,
    failures: u64,
}

/// Single source of truth for cross-cutting UI flags.
///
/// Cloning an `ObservableStore` creates a new handle to the **same** store.
pub struct ObservableStore {
    inner: Rc<RefCell<StoreInner>>,
}

impl Clone for ObservableStore {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl Default for ObservableStore {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}

impl fmt::Debug for ObservableStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ObservableStore")
            .field("state", &inner.state)
            .field("version", &inner.version)
            .field("listener_count", &inner.listeners.total())
            .field("failures", &inner.failures)
            .finish()
    }
}

impl ObservableStore {
    /// Create a store with the initial state described by `config`.
    #[must_use]
    pub fn new(config: &StoreConfig) -> Self {
        Self::from_parts(config.initial_state(), config.error_log_capacity)
    }

    /// Create a store holding `state`, with default settings otherwise.
    #[must_use]
    pub fn with_state(state: ApplicationState) -> Self {
        Self::from_parts(state, StoreConfig::default().error_log_capacity)
    }

    fn from_parts(state: ApplicationState, error_capacity: usize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                state,
                version: 0,
                listeners: ListenerRegistry::default(),
                errors: VecDeque::new(),
                error_capacity,
                failures: 0,
            })),
        }
    }

    /// A non-owning handle, for listeners that call back into the store.
    #[must_use]
    pub fn downgrade(&self) -> WeakStore {
        WeakStore {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Snapshot of the current record. Mutating it does not touch the store.
    #[must_use]
    pub fn get_state(&self) -> ApplicationState {
        self.inner.borrow().state.clone()
    }

    /// Commit `patch`, then emit field events (patch order) followed by one
    /// `StateChanged`. An empty patch does nothing.
    pub fn set_state(&self, patch: impl Into<StatePatch>) {
        let patch = patch.into();
        if patch.is_empty() {
            trace!("empty patch ignored");
            return;
        }

        let (old, new, changes) = {
            let mut inner = self.inner.borrow_mut();
            let old = inner.state.clone();
            let changes = inner.state.apply(&patch);
            if !changes.is_empty() {
                inner.version += 1;
            }
            (old, inner.state.clone(), changes)
        };

        if tracing::enabled!(Level::DEBUG) {
            let fields: Vec<&str> = patch.fields().map(Field::name).collect();
            debug!(?fields, changed = changes.len(), "state committed");
        }

        for change in changes {
            self.emit(&StoreEvent::from(change));
        }
        self.emit(&StoreEvent::StateChanged { new, old });
    }

    /// Register `listener` for `kind`.
    ///
    /// The same closure registered twice runs twice per emission; each
    /// registration gets its own [`Unsubscribe`] handle.
    pub fn subscribe<F, R>(&self, kind: EventKind, listener: F) -> Unsubscribe
    where
        F: Fn(&StoreEvent) -> R + 'static,
        R: ListenerOutcome,
    {
        let id = self
            .inner
            .borrow_mut()
            .listeners
            .insert(kind, listener::erase(listener));
        trace!(event = kind.name(), ?id, "listener subscribed");
        Unsubscribe {
            store: Rc::downgrade(&self.inner),
            kind,
            id,
        }
    }

    /// Deliver `event` to the listeners registered for its kind.
    pub fn emit(&self, event: &StoreEvent) {
        let kind = event.kind();
        let listeners = self.inner.borrow().listeners.snapshot(kind);
        trace!(event = kind.name(), listeners = listeners.len(), "emit");

        for listener in &listeners {
            if let Err(fault) = listener::invoke(listener, event) {
                let err = ListenerError { event: kind, fault };
                error!(event = kind.name(), error = %err, "listener fault isolated");
                self.record_error(err);
            }
        }
    }

    fn record_error(&self, err: ListenerError) {
        let mut inner = self.inner.borrow_mut();
        inner.failures += 1;
        if inner.error_capacity == 0 {
            return;
        }
        while inner.errors.len() >= inner.error_capacity {
            inner.errors.pop_front();
        }
        inner.errors.push_back(err);
    }

    // -- Field accessors --------------------------------------------------

    /// The tab currently shown.
    #[must_use]
    pub fn active_tab(&self) -> TabId {
        self.inner.borrow().state.active_tab.clone()
    }

    /// Switch tabs. Same as `set_state` with a single `ActiveTab` entry.
    pub fn set_active_tab(&self, tab: impl Into<TabId>) {
        self.set_state(FieldPatch::ActiveTab(tab.into()));
    }

    /// Whether privileged controls are visible.
    #[must_use]
    pub fn is_admin_mode(&self) -> bool {
        self.inner.borrow().state.is_admin_mode
    }

    /// Enable or disable admin mode.
    pub fn set_admin_mode(&self, enabled: bool) {
        self.set_state(FieldPatch::AdminMode(enabled));
    }

    /// Whether a loading indicator should be shown.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.borrow().state.is_loading
    }

    /// Set the loading flag.
    pub fn set_loading(&self, loading: bool) {
        self.set_state(FieldPatch::Loading(loading));
    }

    /// The date calendar views are centered on.
    #[must_use]
    pub fn current_date(&self) -> NaiveDate {
        self.inner.borrow().state.current_date
    }

    /// Jump the calendar to `date`.
    pub fn set_current_date(&self, date: NaiveDate) {
        self.set_state(FieldPatch::CurrentDate(date));
    }

    /// Move the calendar date by `step` and return the new date.
    pub fn step_date(&self, step: CalendarStep) -> NaiveDate {
        let date = step.apply(self.current_date());
        self.set_current_date(date);
        date
    }

    // -- Typed subscriptions ----------------------------------------------

    /// Call `f(new, old)` on every `activeTabChanged`.
    pub fn on_active_tab_changed(&self, f: impl Fn(&TabId, &TabId) + 'static) -> Unsubscribe {
        self.subscribe(EventKind::ActiveTabChanged, move |event: &StoreEvent| {
            if let StoreEvent::ActiveTabChanged { new, old } = event {
                f(new, old);
            }
        })
    }

    /// Call `f(new, old)` on every `isAdminModeChanged`.
    pub fn on_admin_mode_changed(&self, f: impl Fn(bool, bool) + 'static) -> Unsubscribe {
        self.subscribe(EventKind::AdminModeChanged, move |event: &StoreEvent| {
            if let StoreEvent::AdminModeChanged { new, old } = event {
                f(*new, *old);
            }
        })
    }

    /// Call `f(new, old)` on every `isLoadingChanged`.
    pub fn on_loading_changed(&self, f: impl Fn(bool, bool) + 'static) -> Unsubscribe {
        self.subscribe(EventKind::LoadingChanged, move |event: &StoreEvent| {
            if let StoreEvent::LoadingChanged { new, old } = event {
                f(*new, *old);
            }
        })
    }

    /// Call `f(new, old)` on every `currentDateChanged`.
    pub fn on_current_date_changed(
        &self,
        f: impl Fn(NaiveDate, NaiveDate) + 'static,
    ) -> Unsubscribe {
        self.subscribe(EventKind::CurrentDateChanged, move |event: &StoreEvent| {
            if let StoreEvent::CurrentDateChanged { new, old } = event {
                f(*new, *old);
            }
        })
    }

    /// Call `f(new, old)` with full snapshots on every `stateChanged`.
    pub fn on_state_changed(
        &self,
        f: impl Fn(&ApplicationState, &ApplicationState) + 'static,
    ) -> Unsubscribe {
        self.subscribe(EventKind::StateChanged, move |event: &StoreEvent| {
            if let StoreEvent::StateChanged { new, old } = event {
                f(new, old);
            }
        })
    }

    // -- Diagnostics ------------------------------------------------------

    /// Number of patches that changed at least one field.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Listeners currently registered for `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.borrow().listeners.len(kind)
    }

    /// Total listener faults since creation, including ones no longer
    /// retained in the error log.
    #[must_use]
    pub fn listener_failures(&self) -> u64 {
        self.inner.borrow().failures
    }

    /// Take the retained listener errors, oldest first.
    pub fn drain_listener_errors(&self) -> Vec<ListenerError> {
        self.inner.borrow_mut().errors.drain(..).collect()
    }
}

/// Non-owning store handle.
#[derive(Clone)]
pub struct WeakStore {
    inner: Weak<RefCell<StoreInner>>,
}

impl WeakStore {
    #[must_use]
    pub fn upgrade(&self) -> Option<ObservableStore> {
        self.inner.upgrade().map(|inner| ObservableStore { inner })
    }
}

impl fmt::Debug for WeakStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WeakStore")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Removes exactly one registration.
///
/// Dropping the handle leaves the listener registered; use
/// [`Unsubscribe::into_guard`] for scoped subscriptions.
#[derive(Clone)]
pub struct Unsubscribe {
    store: Weak<RefCell<StoreInner>>,
    kind: EventKind,
    id: ListenerId,
}

impl Unsubscribe {
    /// Remove the registration. Returns `false` if it was already removed
    /// or the store is gone.
    pub fn unsubscribe(&self) -> bool {
        let Some(inner) = self.store.upgrade() else {
            return false;
        };
        let removed = inner.borrow_mut().listeners.remove(self.kind, self.id);
        if removed {
            trace!(event = self.kind.name(), id = ?self.id, "listener unsubscribed");
        }
        removed
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    #[must_use]
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Convert into an RAII guard that unsubscribes on drop.
    #[must_use]
    pub fn into_guard(self) -> Subscription {
        Subscription { handle: self }
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .finish()
    }
}

/// RAII guard for a registration. Dropping it unsubscribes the listener.
pub struct Subscription {
    handle: Unsubscribe,
}

impl Subscription {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        self.handle.kind
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.unsubscribe();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn store() -> ObservableStore {
        ObservableStore::with_state(ApplicationState::with_date(date(2024, 3, 15)))
    }

    fn counter(store: &ObservableStore, kind: EventKind) -> Rc<Cell<u32>> {
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        store.subscribe(kind, move |_: &StoreEvent| count_clone.set(count_clone.get() + 1));
        count
    }

    #[test]
    fn snapshot_is_detached() {
        let store = store();
        let mut snapshot = store.get_state();
        snapshot.is_admin_mode = true;
        snapshot.active_tab = TabId::from("kid-1");
        assert!(!store.is_admin_mode());
        assert_eq!(store.active_tab(), TabId::home());
    }

    #[test]
    fn accessors_round_trip() {
        let store = store();
        store.set_active_tab("kid-1");
        store.set_admin_mode(true);
        store.set_loading(true);
        store.set_current_date(date(2024, 4, 1));

        assert_eq!(store.active_tab().as_str(), "kid-1");
        assert!(store.is_admin_mode());
        assert!(store.is_loading());
        assert_eq!(store.current_date(), date(2024, 4, 1));
        assert_eq!(store.version(), 4);
    }

    #[test]
    fn unchanged_patch_does_not_bump_version() {
        let store = store();
        store.set_state(StatePatch::new().active_tab("home").loading(false));
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn commit_logging_level_does_not_change_delivery() {
        for level in [Level::INFO, Level::DEBUG] {
            let subscriber = tracing_subscriber::fmt()
                .with_test_writer()
                .with_max_level(level)
                .finish();
            tracing::subscriber::with_default(subscriber, || {
                let store = store();
                let fields = counter(&store, EventKind::LoadingChanged);
                let aggregate = counter(&store, EventKind::StateChanged);
                store.set_state(StatePatch::new().loading(true).admin_mode(true));
                assert_eq!(fields.get(), 1);
                assert_eq!(aggregate.get(), 1);
                assert_eq!(store.version(), 1);
            });
        }
    }

    #[test]
    fn empty_patch_emits_nothing() {
        let store = store();
        let count = counter(&store, EventKind::StateChanged);
        store.set_state(StatePatch::new());
        assert_eq!(count.get(), 0);
        assert_eq!(store.version(), 0);
    }

    #[test]
    fn typed_helpers_receive_new_and_old() {
        let store = store();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let seen_tab = Rc::clone(&seen);
        store.on_active_tab_changed(move |new, old| {
            seen_tab.borrow_mut().push(format!("tab {old}->{new}"));
        });
        let seen_admin = Rc::clone(&seen);
        store.on_admin_mode_changed(move |new, old| {
            seen_admin.borrow_mut().push(format!("admin {old}->{new}"));
        });
        let seen_loading = Rc::clone(&seen);
        store.on_loading_changed(move |new, old| {
            seen_loading.borrow_mut().push(format!("loading {old}->{new}"));
        });
        let seen_date = Rc::clone(&seen);
        store.on_current_date_changed(move |new, old| {
            seen_date.borrow_mut().push(format!("date {old}->{new}"));
        });
        let seen_state = Rc::clone(&seen);
        store.on_state_changed(move |new, old| {
            seen_state
                .borrow_mut()
                .push(format!("state {}->{}", old.active_tab, new.active_tab));
        });

        store.set_active_tab("kid-1");
        store.set_admin_mode(true);
        store.set_loading(true);
        store.step_date(CalendarStep::NextDay);

        assert_eq!(
            *seen.borrow(),
            vec![
                "tab home->kid-1",
                "state home->kid-1",
                "admin false->true",
                "state kid-1->kid-1",
                "loading false->true",
                "state kid-1->kid-1",
                "date 2024-03-15->2024-03-16",
                "state kid-1->kid-1",
            ]
        );
    }

    #[test]
    fn step_date_returns_new_date() {
        let store = store();
        assert_eq!(store.step_date(CalendarStep::NextMonth), date(2024, 4, 15));
        assert_eq!(store.step_date(CalendarStep::PrevWeek), date(2024, 4, 8));
        assert_eq!(store.current_date(), date(2024, 4, 8));
    }

    #[test]
    fn guard_drop_unsubscribes() {
        let store = store();
        let count = Rc::new(Cell::new(0u32));
        let count_clone = Rc::clone(&count);
        let guard = store
            .subscribe(EventKind::LoadingChanged, move |_: &StoreEvent| {
                count_clone.set(count_clone.get() + 1);
            })
            .into_guard();
        assert_eq!(guard.kind(), EventKind::LoadingChanged);

        store.set_loading(true);
        assert_eq!(count.get(), 1);

        drop(guard);
        store.set_loading(false);
        assert_eq!(count.get(), 1);
        assert_eq!(store.listener_count(EventKind::LoadingChanged), 0);
    }

    #[test]
    fn clone_shares_state_and_listeners() {
        let a = store();
        let count = counter(&a, EventKind::StateChanged);
        let b = a.clone();
        b.set_admin_mode(true);
        assert!(a.is_admin_mode());
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn weak_store_does_not_keep_store_alive() {
        let store = store();
        let weak = store.downgrade();
        assert!(weak.upgrade().is_some());

        let handle = store.subscribe(EventKind::StateChanged, |_: &StoreEvent| {});
        drop(store);
        assert!(weak.upgrade().is_none());
        assert!(!handle.unsubscribe());
    }

    #[test]
    fn error_log_is_bounded() {
        let store = ObservableStore::new(
            &StoreConfig::default()
                .with_start_date(date(2024, 1, 1))
                .with_error_log_capacity(2),
        );
        store.subscribe(EventKind::LoadingChanged, |event: &StoreEvent| {
            Err::<(), _>(format!("{:?}", event.kind()))
        });
        for i in 0..5 {
            store.set_loading(i % 2 == 0);
        }
        assert_eq!(store.listener_failures(), 5);
        let errors = store.drain_listener_errors();
        assert_eq!(errors.len(), 2);
        assert!(store.drain_listener_errors().is_empty());
    }

    #[test]
    fn zero_capacity_counts_but_keeps_nothing() {
        let store = ObservableStore::new(
            &StoreConfig::default()
                .with_start_date(date(2024, 1, 1))
                .with_error_log_capacity(0),
        );
        store.subscribe(EventKind::StateChanged, |_: &StoreEvent| {
            Err::<(), _>("nope")
        });
        store.set_admin_mode(true);
        assert_eq!(store.listener_failures(), 1);
        assert!(store.drain_listener_errors().is_empty());
    }

    #[test]
    fn debug_format() {
        let dbg = format!("{:?}", store());
        assert!(dbg.contains("ObservableStore"));
        assert!(dbg.contains("version"));
        assert!(dbg.contains("listener_count"));
    }
}
