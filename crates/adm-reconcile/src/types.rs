use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Anything the reconciler can hold: a stable id plus a sortable creation time.
///
/// `created_at` is compared lexicographically. ISO-8601 timestamps in one
/// fixed offset sort correctly that way, which is what the listing endpoint emits.
pub trait Record: Clone {
    fn id(&self) -> &str;
    fn created_at(&self) -> &str;
}

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Opaque high-water mark returned by the listing endpoint (`since`).
///
/// An empty cursor means "no mark yet": an incremental request without a
/// cursor asks for the first page.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(Option<String>);

impl Cursor {
    pub fn empty() -> Self {
        Self(None)
    }

    /// Blank tokens are treated as "no cursor".
    pub fn new(token: impl Into<String>) -> Self {
        Self::from_server(Some(token.into()))
    }

    /// Normalise the optional next-cursor of a page.
    pub fn from_server(token: Option<String>) -> Self {
        match token {
            Some(t) if !t.trim().is_empty() => Self(Some(t)),
            _ => Self(None),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    /// The cursor after an incremental page: the server value when one was
    /// supplied, otherwise `self` unchanged.
    pub fn advanced_to(&self, next: Option<&str>) -> Cursor {
        match next {
            Some(t) if !t.trim().is_empty() => Cursor(Some(t.to_string())),
            _ => self.clone(),
        }
    }
}

impl std::fmt::Display for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Some(t) => f.write_str(t),
            None => f.write_str("-"),
        }
    }
}

// ---------------------------------------------------------------------------
// Filter
// ---------------------------------------------------------------------------

/// Listing filter. Changing it invalidates the cursor and forces a full reload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Filter {
    pub status: Option<String>,
}

impl Filter {
    /// No filter: every record.
    pub fn all() -> Self {
        Self { status: None }
    }

    /// Filter on a status value. Blank input means "all".
    pub fn status(status: impl AsRef<str>) -> Self {
        let s = status.as_ref().trim();
        if s.is_empty() {
            Self::all()
        } else {
            Self {
                status: Some(s.to_string()),
            }
        }
    }

    pub fn status_str(&self) -> Option<&str> {
        self.status.as_deref()
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.status {
            Some(s) => write!(f, "status={s}"),
            None => f.write_str("all"),
        }
    }
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

/// One response from the listing endpoint.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<R> {
    pub items: Vec<R>,
    /// Next cursor as sent by the server; `None` when omitted.
    pub next_cursor: Option<String>,
    /// Total count if the endpoint supplies one. Passed through untouched.
    pub total: Option<u64>,
}

impl<R> Page<R> {
    pub fn new(items: Vec<R>) -> Self {
        Self {
            items,
            next_cursor: None,
            total: None,
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_next_cursor(mut self, cursor: impl Into<String>) -> Self {
        self.next_cursor = Some(cursor.into());
        self
    }

    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// Result of a single upsert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// Id-keyed record set, kept ordered by `created_at` descending.
///
/// Read-only from the outside; mutation happens through the engine functions.
#[derive(Clone, Debug, PartialEq)]
pub struct Collection<R> {
    items: Vec<R>,
    index: HashMap<String, usize>,
}

impl<R> Default for Collection<R> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<R: Record> Collection<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an unordered batch. Later duplicates of an id win.
    pub fn from_records(records: impl IntoIterator<Item = R>) -> Self {
        let mut c = Self::new();
        for r in records {
            c.upsert(r);
        }
        c.sort_newest_first();
        c
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&R> {
        self.index.get(id).map(|&i| &self.items[i])
    }

    /// Records, newest first.
    pub fn as_slice(&self) -> &[R] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, R> {
        self.items.iter()
    }

    /// `created_at` of the newest record.
    pub fn latest_created_at(&self) -> Option<&str> {
        self.items.first().map(|r| r.created_at())
    }

    pub fn into_vec(self) -> Vec<R> {
        self.items
    }

    /// Insert or replace by id. Leaves ordering to [`Collection::sort_newest_first`].
    pub(crate) fn upsert(&mut self, record: R) -> Upsert {
        match self.index.get(record.id()) {
            Some(&i) => {
                self.items[i] = record;
                Upsert::Replaced
            }
            None => {
                self.index.insert(record.id().to_string(), self.items.len());
                self.items.push(record);
                Upsert::Inserted
            }
        }
    }

    /// Stable sort, so equal timestamps keep their previous relative order.
    pub(crate) fn sort_newest_first(&mut self) {
        self.items.sort_by(|a, b| b.created_at().cmp(a.created_at()));
        self.index.clear();
        for (i, r) in self.items.iter().enumerate() {
            self.index.insert(r.id().to_string(), i);
        }
    }
}

impl<'a, R: Record> IntoIterator for &'a Collection<R> {
    type Item = &'a R;
    type IntoIter = std::slice::Iter<'a, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
