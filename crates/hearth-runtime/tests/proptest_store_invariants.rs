//! Property-based invariant tests for the observable store.
//!
//! These tests drive a store with arbitrary patch sequences and check:
//!
//! 1. Final state equals the field-wise last-write-wins merge of all patches.
//! 2. A field event fires exactly when the field's value changed, once per
//!    `set_state` call.
//! 3. Exactly one `StateChanged` per non-empty patch, none per empty patch.
//! 4. Field events of one call precede that call's `StateChanged` and follow
//!    patch order.
//! 5. `version` counts the calls that changed at least one field.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::NaiveDate;
use hearth_runtime::{
    ApplicationState, EventKind, FieldPatch, ObservableStore, StatePatch, StoreEvent, TabId,
};
use proptest::prelude::*;

// ── Strategies ────────────────────────────────────────────────────────────

fn tab_strategy() -> impl Strategy<Value = TabId> {
    prop_oneof![
        Just(TabId::home()),
        Just(TabId::from("kid-1")),
        Just(TabId::from("kid-2")),
        Just(TabId::from("parent-1")),
    ]
}

fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..6).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap() + chrono::Duration::days(offset)
    })
}

fn field_patch_strategy() -> impl Strategy<Value = FieldPatch> {
    prop_oneof![
        tab_strategy().prop_map(FieldPatch::ActiveTab),
        any::<bool>().prop_map(FieldPatch::AdminMode),
        date_strategy().prop_map(FieldPatch::CurrentDate),
        any::<bool>().prop_map(FieldPatch::Loading),
    ]
}

fn patch_strategy() -> impl Strategy<Value = StatePatch> {
    proptest::collection::vec(field_patch_strategy(), 0..=6)
        .prop_map(|entries| entries.into_iter().collect())
}

fn patches_strategy() -> impl Strategy<Value = Vec<StatePatch>> {
    proptest::collection::vec(patch_strategy(), 1..=20)
}

// ── Helpers ───────────────────────────────────────────────────────────────

fn initial() -> ApplicationState {
    ApplicationState::with_date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap())
}

fn merge(state: &mut ApplicationState, patch: &StatePatch) {
    for entry in patch {
        match entry {
            FieldPatch::ActiveTab(tab) => state.active_tab = tab.clone(),
            FieldPatch::AdminMode(v) => state.is_admin_mode = *v,
            FieldPatch::CurrentDate(d) => state.current_date = *d,
            FieldPatch::Loading(v) => state.is_loading = *v,
        }
    }
}

fn changed_kinds(before: &ApplicationState, patch: &StatePatch) -> Vec<EventKind> {
    patch
        .iter()
        .filter(|entry| match entry {
            FieldPatch::ActiveTab(tab) => *tab != before.active_tab,
            FieldPatch::AdminMode(v) => *v != before.is_admin_mode,
            FieldPatch::CurrentDate(d) => *d != before.current_date,
            FieldPatch::Loading(v) => *v != before.is_loading,
        })
        .map(|entry| EventKind::for_field(entry.field()))
        .collect()
}

fn record_all(store: &ObservableStore) -> Rc<RefCell<Vec<EventKind>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    for kind in EventKind::ALL {
        let log = Rc::clone(&log);
        store.subscribe(kind, move |event: &StoreEvent| {
            log.borrow_mut().push(event.kind());
        });
    }
    log
}

// ── Properties ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn final_state_is_last_write_wins(patches in patches_strategy()) {
        let store = ObservableStore::with_state(initial());
        let mut expected = initial();
        for patch in &patches {
            merge(&mut expected, patch);
            store.set_state(patch.clone());
        }
        prop_assert_eq!(store.get_state(), expected);
    }

    #[test]
    fn events_match_changes_per_call(patches in patches_strategy()) {
        let store = ObservableStore::with_state(initial());
        let log = record_all(&store);
        let mut model = initial();
        let mut expected_version = 0u64;

        for patch in &patches {
            log.borrow_mut().clear();
            let mut expected = changed_kinds(&model, patch);
            if !expected.is_empty() {
                expected_version += 1;
            }
            if !patch.is_empty() {
                expected.push(EventKind::StateChanged);
            }
            merge(&mut model, patch);

            store.set_state(patch.clone());
            prop_assert_eq!(&*log.borrow(), &expected);
        }
        prop_assert_eq!(store.version(), expected_version);
    }

    #[test]
    fn aggregate_snapshots_bracket_the_call(patch in patch_strategy()) {
        prop_assume!(!patch.is_empty());
        let store = ObservableStore::with_state(initial());
        let seen = Rc::new(RefCell::new(None));
        let seen_clone = Rc::clone(&seen);
        store.on_state_changed(move |new, old| {
            *seen_clone.borrow_mut() = Some((new.clone(), old.clone()));
        });

        let before = store.get_state();
        store.set_state(patch);
        let after = store.get_state();

        let recorded = seen.borrow().clone();
        prop_assert_eq!(recorded, Some((after, before)));
    }
}
