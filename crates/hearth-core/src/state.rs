#![forbid(unsafe_code)]

//! Application state record and ordered partial updates.
//!
//! # Design
//!
//! [`ApplicationState`] is a closed record: the four cross-cutting flags the
//! dashboard shares between widgets are named struct members, so a typo in a
//! field name or a value of the wrong type is a compile error rather than a
//! silently merged map entry.
//!
//! Updates travel as a [`StatePatch`], an ordered list of [`FieldPatch`]
//! entries. Order matters because change events are emitted in patch order.
//!
//! # Invariants
//!
//! 1. A patch holds at most one entry per [`Field`]. Pushing a second entry
//!    for the same field overwrites the value in place and keeps the
//!    position of the first entry.
//! 2. [`ApplicationState::apply`] commits every entry before returning, and
//!    reports a [`FieldChange`] only for entries whose value differs from the
//!    stored one.
//! 3. Applying a patch whose values all equal the stored values leaves the
//!    record untouched and reports no changes.

use std::fmt;

use chrono::NaiveDate;

use crate::calendar;

/// Identifier of the tab shown on startup.
pub const HOME_TAB: &str = "home";

/// Identifier of a dashboard tab (the home tab or a family member's tab).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct TabId(String);

impl TabId {
    /// Wrap an identifier as-is.
    ///
    /// No validation happens here; use [`TabId::parse`] for user input.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The fixed home tab.
    #[must_use]
    pub fn home() -> Self {
        Self(HOME_TAB.to_string())
    }

    /// Parse a tab id from user input: surrounding whitespace is trimmed and
    /// the result must not be empty.
    pub fn parse(input: &str) -> Result<Self, TabIdError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TabIdError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_home(&self) -> bool {
        self.0 == HOME_TAB
    }
}

impl Default for TabId {
    fn default() -> Self {
        Self::home()
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TabId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for TabId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Errors from [`TabId::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabIdError {
    /// The input was empty or whitespace only.
    Empty,
}

impl fmt::Display for TabIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "tab id must not be empty"),
        }
    }
}

impl std::error::Error for TabIdError {}

/// Cross-cutting UI flags shared by every dashboard widget.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ApplicationState {
    /// Currently selected tab.
    pub active_tab: TabId,
    /// Gates privileged actions (editing points, deleting members).
    pub is_admin_mode: bool,
    /// Date shown by calendar-style views.
    pub current_date: NaiveDate,
    /// An async operation is in flight.
    pub is_loading: bool,
}

impl Default for ApplicationState {
    /// Home tab, admin off, not loading, dated today (local time).
    fn default() -> Self {
        Self::with_date(calendar::today())
    }
}

impl ApplicationState {
    /// Defaults with a fixed calendar date.
    #[must_use]
    pub fn with_date(current_date: NaiveDate) -> Self {
        Self {
            active_tab: TabId::home(),
            is_admin_mode: false,
            current_date,
            is_loading: false,
        }
    }

    /// Apply every entry of `patch`, then report the entries that changed a
    /// value, in patch order.
    pub fn apply(&mut self, patch: &StatePatch) -> Vec<FieldChange> {
        let mut changes = Vec::new();
        for entry in patch.iter() {
            match entry {
                FieldPatch::ActiveTab(new) => {
                    if *new != self.active_tab {
                        let old = std::mem::replace(&mut self.active_tab, new.clone());
                        changes.push(FieldChange::ActiveTab {
                            new: new.clone(),
                            old,
                        });
                    }
                }
                FieldPatch::AdminMode(new) => {
                    if *new != self.is_admin_mode {
                        let old = std::mem::replace(&mut self.is_admin_mode, *new);
                        changes.push(FieldChange::AdminMode { new: *new, old });
                    }
                }
                FieldPatch::CurrentDate(new) => {
                    if *new != self.current_date {
                        let old = std::mem::replace(&mut self.current_date, *new);
                        changes.push(FieldChange::CurrentDate { new: *new, old });
                    }
                }
                FieldPatch::Loading(new) => {
                    if *new != self.is_loading {
                        let old = std::mem::replace(&mut self.is_loading, *new);
                        changes.push(FieldChange::Loading { new: *new, old });
                    }
                }
            }
        }
        changes
    }
}

/// Names one slot of [`ApplicationState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    ActiveTab,
    AdminMode,
    CurrentDate,
    Loading,
}

impl Field {
    /// Conventional camelCase field name, used in logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Field::ActiveTab => "activeTab",
            Field::AdminMode => "isAdminMode",
            Field::CurrentDate => "currentDate",
            Field::Loading => "isLoading",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A new value for one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldPatch {
    ActiveTab(TabId),
    AdminMode(bool),
    CurrentDate(NaiveDate),
    Loading(bool),
}

impl FieldPatch {
    #[must_use]
    pub fn field(&self) -> Field {
        match self {
            FieldPatch::ActiveTab(_) => Field::ActiveTab,
            FieldPatch::AdminMode(_) => Field::AdminMode,
            FieldPatch::CurrentDate(_) => Field::CurrentDate,
            FieldPatch::Loading(_) => Field::Loading,
        }
    }
}

/// A committed transition of one field, carrying both values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldChange {
    ActiveTab { new: TabId, old: TabId },
    AdminMode { new: bool, old: bool },
    CurrentDate { new: NaiveDate, old: NaiveDate },
    Loading { new: bool, old: bool },
}

impl FieldChange {
    #[must_use]
    pub fn field(&self) -> Field {
        match self {
            FieldChange::ActiveTab { .. } => Field::ActiveTab,
            FieldChange::AdminMode { .. } => Field::AdminMode,
            FieldChange::CurrentDate { .. } => Field::CurrentDate,
            FieldChange::Loading { .. } => Field::Loading,
        }
    }
}

/// Ordered partial update of [`ApplicationState`].
///
/// Built with the chaining setters:
///
/// ```
/// use hearth_core::StatePatch;
///
/// let patch = StatePatch::new().admin_mode(true).loading(true);
/// assert_eq!(patch.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatePatch {
    entries: Vec<FieldPatch>,
}

impl StatePatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry. An existing entry for the same field is overwritten in
    /// place.
    pub fn push(&mut self, entry: FieldPatch) {
        let field = entry.field();
        match self.entries.iter_mut().find(|e| e.field() == field) {
            Some(slot) => *slot = entry,
            None => self.entries.push(entry),
        }
    }

    #[must_use]
    pub fn with(mut self, entry: FieldPatch) -> Self {
        self.push(entry);
        self
    }

    #[must_use]
    pub fn active_tab(self, tab: impl Into<TabId>) -> Self {
        self.with(FieldPatch::ActiveTab(tab.into()))
    }

    #[must_use]
    pub fn admin_mode(self, enabled: bool) -> Self {
        self.with(FieldPatch::AdminMode(enabled))
    }

    #[must_use]
    pub fn current_date(self, date: NaiveDate) -> Self {
        self.with(FieldPatch::CurrentDate(date))
    }

    #[must_use]
    pub fn loading(self, loading: bool) -> Self {
        self.with(FieldPatch::Loading(loading))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldPatch> {
        self.entries.iter()
    }

    /// Fields touched by this patch, in order.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.entries.iter().map(FieldPatch::field)
    }
}

impl From<FieldPatch> for StatePatch {
    fn from(entry: FieldPatch) -> Self {
        Self {
            entries: vec![entry],
        }
    }
}

impl FromIterator<FieldPatch> for StatePatch {
    fn from_iter<I: IntoIterator<Item = FieldPatch>>(iter: I) -> Self {
        let mut patch = Self::new();
        for entry in iter {
            patch.push(entry);
        }
        patch
    }
}

impl<'a> IntoIterator for &'a StatePatch {
    type Item = &'a FieldPatch;
    type IntoIter = std::slice::Iter<'a, FieldPatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
