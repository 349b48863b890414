#![forbid(unsafe_code)]

//! Typed store events.
//!
//! Every event carries its payload as typed `(new, old)` values. Field events
//! fire once per changed field; [`StoreEvent::StateChanged`] fires once per
//! committed patch with whole-record snapshots.

use std::fmt;

use chrono::NaiveDate;
use hearth_core::{ApplicationState, Field, FieldChange, TabId};

/// The closed set of event kinds a listener can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    ActiveTabChanged,
    AdminModeChanged,
    CurrentDateChanged,
    LoadingChanged,
    StateChanged,
}

impl EventKind {
    pub const COUNT: usize = 5;

    pub const ALL: [EventKind; Self::COUNT] = [
        EventKind::ActiveTabChanged,
        EventKind::AdminModeChanged,
        EventKind::CurrentDateChanged,
        EventKind::LoadingChanged,
        EventKind::StateChanged,
    ];

    /// Conventional event name (`"<field>Changed"` or `"stateChanged"`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            EventKind::ActiveTabChanged => "activeTabChanged",
            EventKind::AdminModeChanged => "isAdminModeChanged",
            EventKind::CurrentDateChanged => "currentDateChanged",
            EventKind::LoadingChanged => "isLoadingChanged",
            EventKind::StateChanged => "stateChanged",
        }
    }

    /// The change event emitted for `field`.
    #[must_use]
    pub const fn for_field(field: Field) -> Self {
        match field {
            Field::ActiveTab => EventKind::ActiveTabChanged,
            Field::AdminMode => EventKind::AdminModeChanged,
            Field::CurrentDate => EventKind::CurrentDateChanged,
            Field::Loading => EventKind::LoadingChanged,
        }
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An emitted event with its typed payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    ActiveTabChanged { new: TabId, old: TabId },
    AdminModeChanged { new: bool, old: bool },
    CurrentDateChanged { new: NaiveDate, old: NaiveDate },
    LoadingChanged { new: bool, old: bool },
    /// Once per committed patch, after all field events.
    StateChanged {
        new: ApplicationState,
        old: ApplicationState,
    },
}

impl StoreEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            StoreEvent::ActiveTabChanged { .. } => EventKind::ActiveTabChanged,
            StoreEvent::AdminModeChanged { .. } => EventKind::AdminModeChanged,
            StoreEvent::CurrentDateChanged { .. } => EventKind::CurrentDateChanged,
            StoreEvent::LoadingChanged { .. } => EventKind::LoadingChanged,
            StoreEvent::StateChanged { .. } => EventKind::StateChanged,
        }
    }
}

impl From<FieldChange> for StoreEvent {
    fn from(change: FieldChange) -> Self {
        match change {
            FieldChange::ActiveTab { new, old } => StoreEvent::ActiveTabChanged { new, old },
            FieldChange::AdminMode { new, old } => StoreEvent::AdminModeChanged { new, old },
            FieldChange::CurrentDate { new, old } => StoreEvent::CurrentDateChanged { new, old },
            FieldChange::Loading { new, old } => StoreEvent::LoadingChanged { new, old },
        }
    }
}
