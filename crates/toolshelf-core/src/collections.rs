//! Per-user cached collections of tool identifiers.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// The user-owned collections kept in step with the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
    /// Tools created by the user.
    OwnedTools,
    /// Tools the user bookmarked.
    Bookmarks,
}

impl CollectionKind {
    /// Both kinds, in fetch order.
    pub const ALL: [CollectionKind; 2] = [CollectionKind::OwnedTools, CollectionKind::Bookmarks];
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKind::OwnedTools => write!(f, "tools"),
            CollectionKind::Bookmarks => write!(f, "bookmarks"),
        }
    }
}

/// An ordered set of opaque tool ids.
///
/// Entries are unique; iteration follows insertion order, with
/// [`ToolIds::insert_front`] available for most-recent-first lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ToolIds(Vec<String>);

impl ToolIds {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` unless it is already present. Returns whether it was added.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.contains(&id) {
            return false;
        }
        self.0.push(id);
        true
    }

    /// Move or add `id` to the front.
    pub fn insert_front(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.0.retain(|existing| *existing != id);
        self.0.insert(0, id);
    }

    /// Remove `id`. Returns whether it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|existing| existing != id);
        self.0.len() != before
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|existing| existing == id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for ToolIds {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut ids = ToolIds::new();
        for id in iter {
            ids.insert(id);
        }
        ids
    }
}

// Deserialize through FromIterator so duplicates in stored data collapse.
impl<'de> Deserialize<'de> for ToolIds {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ids = Vec::<String>::deserialize(deserializer)?;
        Ok(ids.into_iter().collect())
    }
}

/// Persisted per-user state, stored as JSON under the `userState` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserState {
    #[serde(default)]
    pub tools: ToolIds,
    #[serde(default)]
    pub bookmarked_tools: ToolIds,
}

impl UserState {
    pub fn collection(&self, kind: CollectionKind) -> &ToolIds {
        match kind {
            CollectionKind::OwnedTools => &self.tools,
            CollectionKind::Bookmarks => &self.bookmarked_tools,
        }
    }

    pub fn collection_mut(&mut self, kind: CollectionKind) -> &mut ToolIds {
        match kind {
            CollectionKind::OwnedTools => &mut self.tools,
            CollectionKind::Bookmarks => &mut self.bookmarked_tools,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty() && self.bookmarked_tools.is_empty()
    }
}
