//! Note handlers: create, show, search, update and export, plus category and stats.

use super::{arg_or_ask, plural, spoken_list, Reply};
use crate::classifier::first_number;
use crate::dialogue::{Dialogue, DialogueAbort};
use crate::input::VoiceInput;
use crate::services::notes::{canonical_category, ExportFormat, Note, NotesStore, CATEGORIES};

fn spoken(note: &Note) -> String {
    format!("Note {}, {}: {}", note.id, note.category, note.content)
}

/// Resolve a note number from the utterance or by asking, and check it exists.
async fn existing_id<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    store: &NotesStore,
    arg: Option<&str>,
    prompt: &str,
) -> anyhow::Result<Result<u32, Reply>> {
    let id = match arg.and_then(first_number) {
        Some(id) => id,
        None => {
            let answer = dlg.ask(prompt).await?;
            first_number(&answer)
                .ok_or_else(|| DialogueAbort::Invalid(format!("{} isn't a note number.", answer)))?
        }
    };
    Ok(match store.get(id) {
        Some(_) => Ok(id),
        None => Err(Reply::failure(format!("There is no note {}.", id), "note not found")),
    })
}

pub async fn create<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    store: &mut NotesStore,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let content = arg_or_ask(dlg, arg, "What should the note say?").await?;
    let category = dlg
        .ask_optional("Which category? Work, Personal, Ideas, Todo, Important, or General.")
        .await?;
    let note = store.add(&content, category.as_deref())?;
    Ok(Reply::say(format!("Note {} saved in {}.", note.id, note.category)))
}

/// All notes, or one category's when the utterance names one.
pub fn show(store: &NotesStore, arg: Option<&str>) -> anyhow::Result<Reply> {
    if let Some(category) = arg.and_then(canonical_category) {
        let notes = store.by_category(category);
        if notes.is_empty() {
            return Ok(Reply::say(format!("You have no notes in {}.", category)));
        }
        let header = format!("You have {} in {}.", plural(notes.len(), "note"), category);
        return Ok(spoken_list(header, notes.into_iter().map(spoken).collect()));
    }
    let notes = store.list();
    if notes.is_empty() {
        return Ok(Reply::say("You don't have any notes yet."));
    }
    let header = format!("You have {}.", plural(notes.len(), "note"));
    Ok(spoken_list(header, notes.iter().map(spoken).collect()))
}

pub async fn search<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    store: &NotesStore,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let keyword = arg_or_ask(dlg, arg, "What should I search your notes for?").await?;
    let found = store.search(&keyword);
    if found.is_empty() {
        return Ok(Reply::say(format!("No notes mention {}.", keyword)));
    }
    let header = format!("I found {} matching {}.", plural(found.len(), "note"), keyword);
    Ok(spoken_list(header, found.into_iter().map(spoken).collect()))
}

pub async fn delete<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    store: &mut NotesStore,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let id = match existing_id(dlg, store, arg, "Which note number should I delete?").await? {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };
    if !dlg.confirm(&format!("Delete note {}?", id)).await {
        return Ok(Reply::say("Okay, I'll keep it."));
    }
    store.delete(id)?;
    Ok(Reply::say(format!("Note {} deleted.", id)))
}

pub async fn update<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    store: &mut NotesStore,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let id = match existing_id(dlg, store, arg, "Which note number should I update?").await? {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };
    let content = dlg.ask(&format!("What should note {} say now?", id)).await?;
    store.update(id, &content)?;
    Ok(Reply::say(format!("Note {} updated.", id)))
}

pub async fn change_category<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    store: &mut NotesStore,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let id = match existing_id(dlg, store, arg, "Which note number should I move?").await? {
        Ok(id) => id,
        Err(reply) => return Ok(reply),
    };
    let answer = dlg.ask("Which category should it go in?").await?;
    let Some(category) = canonical_category(&answer) else {
        return Err(DialogueAbort::Invalid(format!(
            "{} isn't a category. Choose from {}.",
            answer,
            CATEGORIES.join(", ")
        ))
        .into());
    };
    store.change_category(id, category)?;
    Ok(Reply::say(format!("Note {} moved to {}.", id, category)))
}

pub fn export(store: &NotesStore, arg: Option<&str>) -> anyhow::Result<Reply> {
    if store.list().is_empty() {
        return Ok(Reply::say("You don't have any notes to export."));
    }
    let format = ExportFormat::from_word(arg.unwrap_or("text"));
    let path = store.export(format)?;
    let file = path
        .file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_default();
    Ok(Reply::say(format!(
        "Exported {} to {}.",
        plural(store.list().len(), "note"),
        file
    )))
}

pub fn stats(store: &NotesStore) -> Reply {
    let stats = store.stats();
    let mut lines = vec![format!("You have {}.", plural(stats.total, "note"))];
    lines.extend(
        stats
            .per_category
            .iter()
            .filter(|(_, n)| *n > 0)
            .map(|(category, n)| format!("{}: {}.", category, n)),
    );
    Reply::lines(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ipc::bridge::EventSink;
    use crate::testing::{RecordingTts, ScriptedInput};

    #[tokio::test]
    async fn test_create_uses_default_category_on_silence() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = NotesStore::open(dir.path());
        let tts = RecordingTts::default();
        let speech = tts.handle();
        let mut input = ScriptedInput::silent(2);
        let mut dlg = Dialogue::new(&mut input, &speech, EventSink::disabled());
        let reply = create(&mut dlg, &mut store, Some("call the bank")).await.unwrap();
        assert_eq!(reply, Reply::say("Note 1 saved in General."));
    }

    #[tokio::test]
    async fn test_change_category_rejects_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = NotesStore::open(dir.path());
        store.add("draft", None).unwrap();
        let tts = RecordingTts::default();
        let speech = tts.handle();
        let mut input = ScriptedInput::new(["groceries"]);
        let mut dlg = Dialogue::new(&mut input, &speech, EventSink::disabled());
        let err = change_category(&mut dlg, &mut store, Some("1")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DialogueAbort>(),
            Some(DialogueAbort::Invalid(_))
        ));
        assert_eq!(store.get(1).unwrap().category, "General");
    }

    #[tokio::test]
    async fn test_delete_confirmed() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = NotesStore::open(dir.path());
        store.add("old", None).unwrap();
        let tts = RecordingTts::default();
        let speech = tts.handle();
        let mut input = ScriptedInput::new(["one", "yes"]);
        let mut dlg = Dialogue::new(&mut input, &speech, EventSink::disabled());
        let reply = delete(&mut dlg, &mut store, None).await.unwrap();
        assert_eq!(reply, Reply::say("Note 1 deleted."));
        assert!(store.list().is_empty());
    }

    #[test]
    fn test_stats_skip_empty_categories() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = NotesStore::open(dir.path());
        store.add("a", Some("work")).unwrap();
        store.add("b", Some("work")).unwrap();
        store.add("c", None).unwrap();
        assert_eq!(
            stats(&store).lines,
            vec!["You have 3 notes.", "General: 1.", "Work: 2."]
        );
    }
}
