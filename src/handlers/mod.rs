//! Handler registry: one async function per intent.
//!
//! A handler gathers whatever the utterance left out through the dialogue,
//! makes its one collaborator call, and returns the lines to speak. Errors
//! stop at `handle`: dialogue aborts become their notice, collaborator
//! failures become an apology. Nothing reaches the dispatch loop.

mod apps;
mod codegen;
mod email;
mod evaluation;
mod mcp;
mod music;
mod notes;
mod system;
mod tasks;
mod web;

use tracing::warn;

use crate::classifier::{Intent, IntentKind};
use crate::dialogue::{Dialogue, DialogueAbort};
use crate::input::VoiceInput;
use crate::services::Services;

/// Items read out before summarizing the rest as "and N more".
const SPOKEN_LIST_LIMIT: usize = 10;

const HELP: &[&str] = &[
    "I can open and close applications, search Wikipedia, YouTube and Google, and read the news or the weather.",
    "I can take notes, manage your tasks, play music, and send or schedule emails.",
    "I can also generate code or a website, report system stats, disk space and battery, and tell the time.",
    "Say notes or tasks to hear what I can do with them, or say exit to stop.",
];

const NOTES_HELP: &[&str] = &[
    "For notes, say create note, show notes, search notes, update note, delete note, change category, export notes, or note statistics.",
    "Categories are General, Work, Personal, Ideas, Todo and Important.",
];

const TASKS_HELP: &[&str] = &[
    "For tasks, say add task, show tasks, complete task, remove task, high priority tasks, tasks by category, due tasks, or overdue tasks.",
];

const UNKNOWN: &str = "I'm not sure how to help with that. Say help to hear what I can do.";

/// What a handler wants spoken, and whether the cycle counts as a success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub lines: Vec<String>,
    pub success: bool,
    /// Short failure description for the event stream and the evaluator.
    pub error: Option<String>,
}

impl Reply {
    pub fn say(line: impl Into<String>) -> Self {
        Self::lines([line.into()])
    }

    pub fn lines(lines: impl IntoIterator<Item = String>) -> Self {
        Self {
            lines: lines.into_iter().collect(),
            success: true,
            error: None,
        }
    }

    pub fn failure(line: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            lines: vec![line.into()],
            success: false,
            error: Some(error.into()),
        }
    }

    fn from_static(lines: &[&str]) -> Self {
        Self::lines(lines.iter().map(|l| l.to_string()))
    }
}

/// Run the handler for `intent`. Never fails.
pub async fn handle<I: VoiceInput>(
    intent: &Intent,
    dlg: &mut Dialogue<'_, I>,
    services: &mut Services,
) -> Reply {
    match dispatch(intent, dlg, services).await {
        Ok(reply) => reply,
        Err(e) => match e.downcast_ref::<DialogueAbort>() {
            Some(DialogueAbort::Cancelled) => Reply::say(DialogueAbort::Cancelled.notice()),
            Some(abort) => Reply::failure(abort.notice(), abort.to_string()),
            None => {
                warn!(intent = %intent.kind, "Handler failed: {:#}", e);
                Reply::failure(
                    format!("Sorry, I couldn't complete that. {}", e),
                    e.to_string(),
                )
            }
        },
    }
}

async fn dispatch<I: VoiceInput>(
    intent: &Intent,
    dlg: &mut Dialogue<'_, I>,
    s: &mut Services,
) -> anyhow::Result<Reply> {
    let arg = intent.argument.as_deref();
    match intent.kind {
        IntentKind::Exit => Ok(Reply::say("Goodbye!")),
        IntentKind::ShutdownSystem => system::shutdown(dlg, s.power.as_ref()).await,
        IntentKind::RestartSystem => system::restart(dlg, s.power.as_ref()).await,
        IntentKind::SleepSystem => system::sleep(dlg, s.power.as_ref()).await,
        IntentKind::Wikipedia => web::wikipedia(dlg, &s.web, arg).await,
        IntentKind::YouTube => web::youtube(s.apps.as_ref(), arg),
        IntentKind::GoogleSearch => web::google(dlg, &s.web, s.apps.as_ref(), arg).await,
        IntentKind::News => web::news(&s.web).await,
        IntentKind::Weather => web::weather(dlg, &s.web, arg).await,
        IntentKind::CreateNote => notes::create(dlg, &mut s.notes, arg).await,
        IntentKind::ShowNotes => notes::show(&s.notes, arg),
        IntentKind::SearchNotes => notes::search(dlg, &s.notes, arg).await,
        IntentKind::DeleteNote => notes::delete(dlg, &mut s.notes, arg).await,
        IntentKind::UpdateNote => notes::update(dlg, &mut s.notes, arg).await,
        IntentKind::ChangeNoteCategory => notes::change_category(dlg, &mut s.notes, arg).await,
        IntentKind::ExportNotes => notes::export(&s.notes, arg),
        IntentKind::NoteStats => Ok(notes::stats(&s.notes)),
        IntentKind::AddTask => tasks::add(dlg, &mut s.tasks, intent).await,
        IntentKind::RemoveTask => tasks::remove(dlg, &mut s.tasks, arg).await,
        IntentKind::CompleteTask => tasks::complete(dlg, &mut s.tasks, arg).await,
        IntentKind::ShowTasks => Ok(tasks::show(&s.tasks, arg)),
        IntentKind::TasksByPriority => tasks::by_priority(dlg, &s.tasks, arg).await,
        IntentKind::TasksByCategory => tasks::by_category(dlg, &s.tasks, arg).await,
        IntentKind::DueTasks => Ok(tasks::due(&s.tasks)),
        IntentKind::OverdueTasks => Ok(tasks::overdue(&s.tasks)),
        IntentKind::PlayMusic => music::play(&mut s.music, s.apps.as_ref(), arg).await,
        IntentKind::PauseMusic => music::pause(&mut s.music).await,
        IntentKind::ResumeMusic => music::resume(&mut s.music).await,
        IntentKind::StopMusic => music::stop(&mut s.music).await,
        IntentKind::NextSong => music::next(&mut s.music).await,
        IntentKind::VolumeUp => music::volume(&mut s.music, true).await,
        IntentKind::VolumeDown => music::volume(&mut s.music, false).await,
        IntentKind::ScheduleEmail => email::schedule(dlg, &s.contacts, &s.mail, arg).await,
        IntentKind::SendEmail => email::send(dlg, &s.contacts, s.mail.as_ref(), arg).await,
        IntentKind::AddContact => email::add_contact(dlg, &mut s.contacts, arg).await,
        IntentKind::ListContacts => Ok(email::list_contacts(&s.contacts)),
        IntentKind::GenerateCode => codegen::code(dlg, &s.codegen, arg).await,
        IntentKind::GenerateWebsite => codegen::website(dlg, &s.codegen, arg).await,
        IntentKind::SystemStats => Ok(system::stats(&mut s.system).await),
        IntentKind::DiskSpace => Ok(system::disk_space(&s.system)),
        IntentKind::BatteryStatus => system::battery(&s.system),
        IntentKind::TellTime => Ok(system::time()),
        IntentKind::TellDate => Ok(system::date()),
        IntentKind::PerformanceReport => Ok(evaluation::report(&s.evaluator)),
        IntentKind::GiveFeedback => evaluation::feedback(dlg, &mut s.evaluator).await,
        IntentKind::ListTools => mcp::list_tools(&s.mcp).await,
        IntentKind::AnalyzeWithMcp => mcp::analyze(dlg, &s.mcp, arg).await,
        IntentKind::OpenApp => apps::open(dlg, s.apps.as_ref(), arg).await,
        IntentKind::CloseApp => apps::close(dlg, s.apps.as_ref(), arg).await,
        IntentKind::NotesHelp => Ok(Reply::from_static(NOTES_HELP)),
        IntentKind::TasksHelp => Ok(Reply::from_static(TASKS_HELP)),
        IntentKind::Help => Ok(Reply::from_static(HELP)),
        IntentKind::Unknown => Ok(Reply::say(UNKNOWN)),
    }
}

/// The argument from the utterance, or the user's answer to `prompt`.
async fn arg_or_ask<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    arg: Option<&str>,
    prompt: &str,
) -> Result<String, DialogueAbort> {
    match arg.map(str::trim).filter(|a| !a.is_empty()) {
        Some(a) => Ok(a.to_string()),
        None => dlg.ask(prompt).await,
    }
}

/// A header line followed by at most `SPOKEN_LIST_LIMIT` items.
fn spoken_list(header: String, items: Vec<String>) -> Reply {
    let extra = items.len().saturating_sub(SPOKEN_LIST_LIMIT);
    let mut lines = vec![header];
    lines.extend(items.into_iter().take(SPOKEN_LIST_LIMIT));
    if extra > 0 {
        lines.push(format!("And {} more.", extra));
    }
    Reply::lines(lines)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::classify;
    use crate::ipc::bridge::EventSink;
    use crate::testing::{test_services, RecordingTts, ScriptedInput};

    /// Classify `utterance`, run its handler against `answers`.
    async fn run(
        services: &mut Services,
        utterance: &str,
        answers: &[&str],
    ) -> (Reply, Vec<String>, usize) {
        let tts = RecordingTts::default();
        let speech = tts.handle();
        let mut input = ScriptedInput::new(answers.iter().copied());
        let reply = {
            let mut dlg = Dialogue::new(&mut input, &speech, EventSink::disabled());
            handle(&classify(utterance), &mut dlg, services).await
        };
        speech.say("").await;
        (reply, tts.lines(), input.remaining())
    }

    #[tokio::test]
    async fn test_open_app_uses_argument() {
        let dir = tempfile::tempdir().unwrap();
        let (mut services, mocks) = test_services(dir.path());
        let (reply, prompts, _) = run(&mut services, "open notepad", &[]).await;
        assert_eq!(*mocks.apps.opened.lock().unwrap(), vec!["notepad"]);
        assert_eq!(reply, Reply::say("Opening notepad."));
        assert!(prompts.is_empty());
    }

    #[tokio::test]
    async fn test_open_app_asks_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let (mut services, mocks) = test_services(dir.path());
        let (reply, prompts, _) = run(&mut services, "launch", &["calculator"]).await;
        assert_eq!(prompts, vec!["Which application should I open?"]);
        assert_eq!(*mocks.apps.opened.lock().unwrap(), vec!["calculator"]);
        assert!(reply.success);
    }

    #[tokio::test]
    async fn test_collaborator_error_becomes_apology() {
        let dir = tempfile::tempdir().unwrap();
        let (mut services, mocks) = test_services(dir.path());
        mocks.apps.failing.store(true, std::sync::atomic::Ordering::SeqCst);
        let (reply, _, _) = run(&mut services, "open paint", &[]).await;
        assert!(!reply.success);
        assert_eq!(reply.error.as_deref(), Some("launcher unavailable"));
        assert!(reply.lines[0].starts_with("Sorry, I couldn't complete that."));
    }

    #[tokio::test]
    async fn test_send_email_cancel_at_recipient() {
        let dir = tempfile::tempdir().unwrap();
        let (mut services, mocks) = test_services(dir.path());
        let (reply, prompts, left) =
            run(&mut services, "send email", &["cancel", "hello", "body"]).await;
        assert_eq!(prompts, vec!["Who should I send it to?"]);
        assert_eq!(reply, Reply::say("Okay, cancelled."));
        assert!(mocks.mail.sent.lock().unwrap().is_empty());
        assert_eq!(left, 2);
    }

    #[tokio::test]
    async fn test_send_email_full_dialogue() {
        let dir = tempfile::tempdir().unwrap();
        let (mut services, mocks) = test_services(dir.path());
        services.contacts.add("john", "john@example.com").unwrap();
        let (reply, prompts, _) = run(
            &mut services,
            "send email",
            &["john", "lunch", "see you at noon", "yes"],
        )
        .await;
        assert_eq!(
            prompts,
            vec![
                "Who should I send it to?",
                "What's the subject?",
                "What should the email say?",
                "Send it to john@example.com with subject lunch?",
            ]
        );
        let sent = mocks.mail.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, vec!["john@example.com"]);
        assert_eq!(sent[0].body, "see you at noon");
        assert_eq!(reply, Reply::say("Email sent."));
    }

    #[tokio::test]
    async fn test_send_email_declined_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let (mut services, mocks) = test_services(dir.path());
        let (reply, _, _) = run(
            &mut services,
            "send email to jane at example dot com",
            &["hi", "hello there", "maybe later"],
        )
        .await;
        assert!(mocks.mail.sent.lock().unwrap().is_empty());
        assert_eq!(reply, Reply::say("Okay, I won't send it."));
    }

    #[tokio::test]
    async fn test_unknown_recipient_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let (mut services, mocks) = test_services(dir.path());
        let (reply, prompts, _) = run(&mut services, "send email to nobody", &["x"]).await;
        assert!(prompts.is_empty());
        assert!(!reply.success);
        assert!(reply.lines[0].ends_with("Cancelled."));
        assert!(mocks.mail.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_requires_yes() {
        let dir = tempfile::tempdir().unwrap();
        let (mut services, mocks) = test_services(dir.path());
        let (reply, _, _) = run(&mut services, "shutdown computer", &["no"]).await;
        assert!(mocks.power.calls.lock().unwrap().is_empty());
        assert_eq!(reply, Reply::say("Okay, I'll leave it running."));

        let (_, _, _) = run(&mut services, "reboot", &["yes"]).await;
        assert_eq!(*mocks.power.calls.lock().unwrap(), vec!["restart"]);
    }

    #[tokio::test]
    async fn test_sleep_is_confirmed() {
        let dir = tempfile::tempdir().unwrap();
        let (mut services, mocks) = test_services(dir.path());
        let (reply, prompts, _) = run(&mut services, "put the computer to sleep", &["no"]).await;
        assert_eq!(prompts[0], "Should I put the computer to sleep?");
        assert_eq!(reply, Reply::say("Okay, I'll leave it running."));
        assert!(mocks.power.calls.lock().unwrap().is_empty());

        let (reply, _, _) = run(&mut services, "sleep mode", &["yes"]).await;
        assert_eq!(reply, Reply::say("Putting the system to sleep."));
        assert_eq!(*mocks.power.calls.lock().unwrap(), vec!["sleep"]);
    }

    #[tokio::test]
    async fn test_add_task_cancel_leaves_no_task() {
        let dir = tempfile::tempdir().unwrap();
        let (mut services, _mocks) = test_services(dir.path());
        let (reply, _, _) =
            run(&mut services, "add high priority task pay rent", &["cancel"]).await;
        assert_eq!(reply, Reply::say("Okay, cancelled."));
        assert!(services.tasks.list(true).is_empty());
    }

    #[tokio::test]
    async fn test_add_task_dialogue() {
        let dir = tempfile::tempdir().unwrap();
        let (mut services, _mocks) = test_services(dir.path());
        let (reply, prompts, _) =
            run(&mut services, "add high priority task pay rent", &["skip", "home"]).await;
        assert_eq!(prompts.len(), 2, "priority came from the utterance: {prompts:?}");
        let tasks = services.tasks.list(false);
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "pay rent");
        assert_eq!(tasks[0].category, "home");
        assert!(tasks[0].due_date.is_none());
        assert_eq!(reply.lines[0], "Added. Task 1: pay rent, high priority.");
    }

    #[tokio::test]
    async fn test_show_notes_twice_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let (mut services, _mocks) = test_services(dir.path());
        services.notes.add("buy milk", None).unwrap();
        services.notes.add("ship release", Some("work")).unwrap();
        let (first, _, _) = run(&mut services, "show notes", &[]).await;
        let (second, _, _) = run(&mut services, "show notes", &[]).await;
        assert_eq!(first, second);
        assert_eq!(first.lines[0], "You have 2 notes.");
        assert_eq!(first.lines[1], "Note 1, General: buy milk");

        let (work, _, _) = run(&mut services, "show work notes", &[]).await;
        assert_eq!(work.lines, vec!["You have 1 note in Work.", "Note 2, Work: ship release"]);
    }

    #[tokio::test]
    async fn test_delete_note_unknown_id() {
        let dir = tempfile::tempdir().unwrap();
        let (mut services, _mocks) = test_services(dir.path());
        let (reply, prompts, _) = run(&mut services, "delete note 7", &["yes"]).await;
        assert!(prompts.is_empty());
        assert_eq!(reply.lines, vec!["There is no note 7."]);
    }

    #[tokio::test]
    async fn test_play_music_without_match_searches_youtube() {
        let dir = tempfile::tempdir().unwrap();
        let (mut services, mocks) = test_services(dir.path());
        let (reply, _, _) = run(&mut services, "play song bohemian rhapsody", &[]).await;
        let urls = mocks.apps.urls.lock().unwrap();
        assert_eq!(urls.len(), 1);
        assert!(urls[0].starts_with("https://www.youtube.com/results?search_query=bohemian"));
        assert!(reply.success);
    }

    #[tokio::test]
    async fn test_unknown_and_help() {
        let dir = tempfile::tempdir().unwrap();
        let (mut services, _mocks) = test_services(dir.path());
        let (reply, _, _) = run(&mut services, "sing me something", &[]).await;
        assert_eq!(reply, Reply::say(UNKNOWN));
        let (reply, _, _) = run(&mut services, "help", &[]).await;
        assert_eq!(reply.lines.len(), HELP.len());
    }

    #[test]
    fn test_spoken_list_truncates() {
        let items: Vec<String> = (1..=12).map(|i| i.to_string()).collect();
        let reply = spoken_list("Header".into(), items);
        assert_eq!(reply.lines.len(), 12);
        assert_eq!(reply.lines.last().unwrap(), "And 2 more.");
        assert_eq!(plural(1, "note"), "1 note");
        assert_eq!(plural(3, "task"), "3 tasks");
    }
}
