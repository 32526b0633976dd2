//! Notes kept in `notes.json`.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use super::store::{load_json, now_timestamp, save_json};

pub const CATEGORIES: &[&str] = &["General", "Work", "Personal", "Ideas", "Todo", "Important"];
pub const DEFAULT_CATEGORY: &str = "General";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: u32,
    pub content: String,
    pub category: String,
    pub created_at: String,
    pub modified_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Json,
}

impl ExportFormat {
    /// "json" picks JSON; anything else is plain text.
    pub fn from_word(word: &str) -> Self {
        if word.trim().eq_ignore_ascii_case("json") {
            Self::Json
        } else {
            Self::Text
        }
    }

    fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteStats {
    pub total: usize,
    pub per_category: Vec<(&'static str, usize)>,
}

/// Case-insensitive lookup of a known category.
pub fn canonical_category(name: &str) -> Option<&'static str> {
    let name = name.trim();
    CATEGORIES
        .iter()
        .copied()
        .find(|c| c.eq_ignore_ascii_case(name))
}

pub struct NotesStore {
    path: PathBuf,
    export_dir: PathBuf,
    notes: Vec<Note>,
}

impl NotesStore {
    pub fn open(data_dir: &Path) -> Self {
        let path = data_dir.join("notes.json");
        let mut notes: Vec<Note> = load_json(&path);
        notes.sort_by_key(|n| n.id);
        Self {
            path,
            export_dir: data_dir.join("exports"),
            notes,
        }
    }

    /// Persist a modified copy, then adopt it. A failed write leaves the
    /// store as it was.
    fn commit(&mut self, next: Vec<Note>) -> anyhow::Result<()> {
        save_json(&self.path, &next)?;
        self.notes = next;
        Ok(())
    }

    fn next_id(&self) -> u32 {
        self.notes.iter().map(|n| n.id).max().unwrap_or(0) + 1
    }

    /// Add a note. Unknown categories fall back to General.
    pub fn add(&mut self, content: &str, category: Option<&str>) -> anyhow::Result<Note> {
        let content = content.trim();
        if content.is_empty() {
            anyhow::bail!("Note content cannot be empty");
        }
        let category = category
            .and_then(canonical_category)
            .unwrap_or(DEFAULT_CATEGORY);
        let now = now_timestamp();
        let note = Note {
            id: self.next_id(),
            content: content.to_string(),
            category: category.to_string(),
            created_at: now.clone(),
            modified_at: now,
        };
        let mut next = self.notes.clone();
        next.push(note.clone());
        self.commit(next)?;
        info!(id = note.id, category, "Note added");
        Ok(note)
    }

    /// All notes, ordered by id.
    pub fn list(&self) -> &[Note] {
        &self.notes
    }

    pub fn get(&self, id: u32) -> Option<&Note> {
        self.notes.iter().find(|n| n.id == id)
    }

    pub fn by_category(&self, category: &str) -> Vec<&Note> {
        self.notes
            .iter()
            .filter(|n| n.category.eq_ignore_ascii_case(category.trim()))
            .collect()
    }

    /// Case-insensitive match on content or category.
    pub fn search(&self, keyword: &str) -> Vec<&Note> {
        let keyword = keyword.trim().to_lowercase();
        if keyword.is_empty() {
            return Vec::new();
        }
        self.notes
            .iter()
            .filter(|n| {
                n.content.to_lowercase().contains(&keyword)
                    || n.category.to_lowercase().contains(&keyword)
            })
            .collect()
    }

    /// Replace a note's content. `Ok(false)` if there is no such note.
    pub fn update(&mut self, id: u32, content: &str) -> anyhow::Result<bool> {
        let content = content.trim();
        if content.is_empty() {
            anyhow::bail!("Note content cannot be empty");
        }
        let mut next = self.notes.clone();
        let Some(note) = next.iter_mut().find(|n| n.id == id) else {
            return Ok(false);
        };
        note.content = content.to_string();
        note.modified_at = now_timestamp();
        self.commit(next)?;
        Ok(true)
    }

    /// Delete a note. Its id is never handed out again while a higher id
    /// exists.
    pub fn delete(&mut self, id: u32) -> anyhow::Result<bool> {
        if self.get(id).is_none() {
            return Ok(false);
        }
        let next = self.notes.iter().filter(|n| n.id != id).cloned().collect();
        self.commit(next)?;
        info!(id, "Note deleted");
        Ok(true)
    }

    /// Move a note to another category. Errors on an unknown category.
    pub fn change_category(&mut self, id: u32, category: &str) -> anyhow::Result<bool> {
        let Some(category) = canonical_category(category) else {
            anyhow::bail!(
                "Unknown category '{}'. Choose from {}",
                category.trim(),
                CATEGORIES.join(", ")
            );
        };
        let mut next = self.notes.clone();
        let Some(note) = next.iter_mut().find(|n| n.id == id) else {
            return Ok(false);
        };
        note.category = category.to_string();
        note.modified_at = now_timestamp();
        self.commit(next)?;
        Ok(true)
    }

    /// Write every note to `exports/notes_export_<ts>.<ext>`.
    pub fn export(&self, format: ExportFormat) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(&self.export_dir)?;
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = self
            .export_dir
            .join(format!("notes_export_{}.{}", stamp, format.extension()));

        let body = match format {
            ExportFormat::Json => serde_json::to_string_pretty(&self.notes)?,
            ExportFormat::Text => self.render_text(),
        };
        std::fs::write(&path, body)?;
        info!(path = %path.display(), count = self.notes.len(), "Notes exported");
        Ok(path)
    }

    fn render_text(&self) -> String {
        let rule = "=".repeat(60);
        let mut out = format!("{rule}\nNOTES EXPORT\nExported on: {}\n{rule}\n\n", now_timestamp());
        for note in &self.notes {
            let _ = write!(
                out,
                "Note ID: {}\nCategory: {}\nCreated: {}\nContent: {}\n{}\n\n",
                note.id,
                note.category,
                note.created_at,
                note.content,
                "-".repeat(60)
            );
        }
        out
    }

    pub fn stats(&self) -> NoteStats {
        NoteStats {
            total: self.notes.len(),
            per_category: CATEGORIES
                .iter()
                .map(|c| (*c, self.notes.iter().filter(|n| n.category == *c).count()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = NotesStore::open(dir.path());
        store.add("buy milk", Some("personal")).unwrap();
        store.add("ship release", Some("nonsense")).unwrap();

        let store = NotesStore::open(dir.path());
        let notes = store.list();
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].category, "Personal");
        assert_eq!(notes[1].category, "General");
        assert_eq!(notes[1].id, 2);
    }

    #[test]
    fn test_empty_content_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = NotesStore::open(dir.path());
        assert!(store.add("   ", None).is_err());
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = NotesStore::open(dir.path());
        store.add("one", None).unwrap();
        store.add("two", None).unwrap();
        assert!(store.delete(1).unwrap());
        assert!(!store.delete(1).unwrap());
        let third = store.add("three", None).unwrap();
        assert_eq!(third.id, 3);
    }

    #[test]
    fn test_search_content_and_category() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = NotesStore::open(dir.path());
        store.add("Quarterly planning meeting", Some("work")).unwrap();
        store.add("Call mom", Some("personal")).unwrap();
        assert_eq!(store.search("MEETING").len(), 1);
        assert_eq!(store.search("personal").len(), 1);
        assert!(store.search("").is_empty());
        assert_eq!(store.by_category("WORK").len(), 1);
    }

    #[test]
    fn test_update_and_change_category() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = NotesStore::open(dir.path());
        store.add("draft", None).unwrap();
        assert!(store.update(1, "final").unwrap());
        assert!(!store.update(9, "nope").unwrap());
        assert!(store.change_category(1, "ideas").unwrap());
        assert!(store.change_category(1, "groceries").is_err());
        let note = store.get(1).unwrap();
        assert_eq!(note.content, "final");
        assert_eq!(note.category, "Ideas");
    }

    #[test]
    fn test_export_and_stats() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = NotesStore::open(dir.path());
        store.add("alpha", Some("work")).unwrap();
        store.add("beta", Some("work")).unwrap();

        let txt = store.export(ExportFormat::Text).unwrap();
        assert!(std::fs::read_to_string(&txt).unwrap().contains("Content: alpha"));
        let json = store.export(ExportFormat::Json).unwrap();
        let parsed: Vec<Note> =
            serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
        assert_eq!(parsed.len(), 2);

        let stats = store.stats();
        assert_eq!(stats.total, 2);
        assert!(stats.per_category.contains(&("Work", 2)));
        assert!(stats.per_category.contains(&("General", 0)));
    }

    #[test]
    fn test_listing_is_stable() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = NotesStore::open(dir.path());
        store.add("x", None).unwrap();
        store.add("y", None).unwrap();
        assert_eq!(store.list().to_vec(), store.list().to_vec());
    }
}
