//! Session history: the back/forward stack the router stays in sync with.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// State pushed to history on every navigation.
///
/// Carries enough to re-activate the view without re-matching the path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationEntry {
    pub view_id: String,
    #[serde(default)]
    pub params: Vec<String>,
}

impl NavigationEntry {
    pub fn new(view_id: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            view_id: view_id.into(),
            params,
        }
    }

    pub fn to_state(&self) -> Value {
        // Two string fields; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Decode a history state slot. Anything that is not a well-formed entry
    /// yields `None`.
    pub fn from_state(state: &Value) -> Option<Self> {
        let entry: Self = serde_json::from_value(state.clone()).ok()?;
        if entry.view_id.is_empty() {
            return None;
        }
        Some(entry)
    }
}

/// One history slot: a pathname and its opaque state.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryRecord {
    pub path: String,
    pub state: Option<Value>,
}

/// A back/forward navigation stack.
///
/// `back` and `forward` return the record that became current, mirroring a
/// `popstate` event; `None` means there was nowhere to go.
pub trait History: Send {
    /// Pathname of the current record.
    fn location(&self) -> String;

    /// Push a new record, discarding any forward records.
    fn push(&mut self, state: Value, path: &str);

    fn back(&mut self) -> Option<HistoryRecord>;

    fn forward(&mut self) -> Option<HistoryRecord>;
}

/// In-memory [`History`] with browser stack semantics.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    records: Vec<HistoryRecord>,
    cursor: usize,
}

impl MemoryHistory {
    /// Start at `path` with no state, as after a fresh page load.
    pub fn new(path: &str) -> Self {
        Self {
            records: vec![HistoryRecord {
                path: path.to_string(),
                state: None,
            }],
            cursor: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn current(&self) -> &HistoryRecord {
        &self.records[self.cursor]
    }
}

impl History for MemoryHistory {
    fn location(&self) -> String {
        self.current().path.clone()
    }

    fn push(&mut self, state: Value, path: &str) {
        self.records.truncate(self.cursor + 1);
        self.records.push(HistoryRecord {
            path: path.to_string(),
            state: Some(state),
        });
        self.cursor = self.records.len() - 1;
    }

    fn back(&mut self) -> Option<HistoryRecord> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        Some(self.current().clone())
    }

    fn forward(&mut self) -> Option<HistoryRecord> {
        if self.cursor + 1 >= self.records.len() {
            return None;
        }
        self.cursor += 1;
        Some(self.current().clone())
    }
}
