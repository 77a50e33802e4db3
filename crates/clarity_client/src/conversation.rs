//! The client-visible conversation log: an ordered list of chat entries that
//! the UI renders. Entries are appended and edited in place, never reordered.

use std::fmt;

use uuid::Uuid;

/// Opaque, immutable identity of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(Uuid);

impl EntryId {
    pub fn new() -> Self {
        EntryId(Uuid::new_v4())
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEntry {
    pub id: EntryId,
    pub role: Role,
    pub text: String,
    /// Display timestamp, local `HH:MM`.
    pub time: String,
}

impl ChatEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: EntryId::new(),
            role,
            text: text.into(),
            time: display_time(),
        }
    }
}

/// Current local time as shown next to a chat bubble.
pub fn display_time() -> String {
    chrono::Local::now().format("%H:%M").to_string()
}

#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    entries: Vec<ChatEntry>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ChatEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ChatEntry> {
        self.entries.last()
    }

    pub fn get(&self, id: EntryId) -> Option<&ChatEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Swap in a whole new log, e.g. one restored by the UI layer.
    pub fn replace(&mut self, entries: Vec<ChatEntry>) {
        self.entries = entries;
    }

    pub fn push(&mut self, entry: ChatEntry) -> EntryId {
        let id = entry.id;
        self.entries.push(entry);
        id
    }

    /// Append a fragment to the entry's text. Returns false if no entry has `id`.
    pub fn append_text(&mut self, id: EntryId, fragment: &str) -> bool {
        match self.get_mut(id) {
            Some(entry) => {
                entry.text.push_str(fragment);
                true
            }
            None => false,
        }
    }

    /// Replace the entry's text and restamp its time. Returns false if no entry has `id`.
    pub fn replace_text(&mut self, id: EntryId, text: &str) -> bool {
        match self.get_mut(id) {
            Some(entry) => {
                entry.text = text.to_string();
                entry.time = display_time();
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: EntryId) -> Option<ChatEntry> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(pos))
    }

    fn get_mut(&mut self, id: EntryId) -> Option<&mut ChatEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_target_entry_by_id_not_position() {
        let mut log = ConversationLog::new();
        let first = log.push(ChatEntry::assistant(""));
        let later = log.push(ChatEntry::user("unrelated"));

        assert!(log.append_text(first, "Hi"));
        assert!(log.append_text(first, " there"));

        assert_eq!(log.get(first).unwrap().text, "Hi there");
        assert_eq!(log.get(later).unwrap().text, "unrelated");
        assert_eq!(log.last().unwrap().id, later);
    }

    #[test]
    fn edits_on_missing_entry_report_false() {
        let mut log = ConversationLog::new();
        let gone = log.push(ChatEntry::assistant(""));
        log.remove(gone);

        assert!(!log.append_text(gone, "x"));
        assert!(!log.replace_text(gone, "x"));
        assert!(log.is_empty());
    }
}
