//! Task handlers: add with its follow-up questions, remove, complete and the list views.

use chrono::NaiveDateTime;

use super::{arg_or_ask, plural, spoken_list, Reply};
use crate::classifier::{tokenize, tokens_outside, Intent};
use crate::dialogue::{Dialogue, DialogueAbort};
use crate::input::VoiceInput;
use crate::services::tasks::{parse_due_date, Priority, Task, TaskRef, TaskStore};

/// Answers that leave an optional field unset.
const SKIP_WORDS: &[&str] = &["skip", "none", "nothing", "no due date", "whenever"];

fn now() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

fn is_skip(answer: &str) -> bool {
    SKIP_WORDS.contains(&tokenize(answer).join(" ").as_str())
}

fn task_list(header: String, empty: &str, tasks: Vec<&Task>) -> Reply {
    if tasks.is_empty() {
        return Reply::say(empty);
    }
    spoken_list(header, tasks.into_iter().map(Task::describe).collect())
}

async fn task_ref<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    arg: Option<&str>,
    prompt: &str,
) -> anyhow::Result<TaskRef> {
    let answer = arg_or_ask(dlg, arg, prompt).await?;
    TaskRef::parse(&answer)
        .ok_or_else(|| DialogueAbort::Invalid("I need a task number or name.".to_string()).into())
}

/// Title from the utterance; priority from the utterance or asked; due
/// date and category asked, both skippable.
pub async fn add<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    store: &mut TaskStore,
    intent: &Intent,
) -> anyhow::Result<Reply> {
    let title = arg_or_ask(dlg, intent.argument.as_deref(), "What's the task?").await?;

    // "call the high school" names the task; only words around it set priority
    let around = tokens_outside(&intent.utterance, &title).join(" ");
    let priority = match Priority::parse(&around) {
        Some(p) => p,
        None => dlg
            .ask_optional("What priority? High, medium, or low.")
            .await?
            .and_then(|a| Priority::parse(&a))
            .unwrap_or_default(),
    };

    let due = match dlg
        .ask_optional("When is it due? Say today, tomorrow, in a few days, or skip.")
        .await?
    {
        Some(answer) if !is_skip(&answer) => Some(parse_due_date(&answer, now()).ok_or_else(
            || DialogueAbort::Invalid(format!("I couldn't understand {} as a date.", answer)),
        )?),
        _ => None,
    };

    let category = dlg
        .ask_optional("Which category? Say skip for general.")
        .await?
        .filter(|c| !is_skip(c));

    let task = store.add(&title, priority, due, category.as_deref())?;
    Ok(Reply::say(format!("Added. {}.", task.describe())))
}

pub async fn remove<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    store: &mut TaskStore,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let target = task_ref(dlg, arg, "Which task should I remove?").await?;
    let prompt = match store.matching(&target).as_slice() {
        [] => return Ok(Reply::failure("I couldn't find that task.", "task not found")),
        [task] => format!("Remove task {}, {}?", task.id, task.title),
        many => format!("Remove {} matching tasks?", many.len()),
    };
    if !dlg.confirm(&prompt).await {
        return Ok(Reply::say("Okay, I'll keep it."));
    }
    let removed = store.remove(&target)?;
    Ok(Reply::say(format!("Removed {}.", plural(removed, "task"))))
}

pub async fn complete<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    store: &mut TaskStore,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let target = task_ref(dlg, arg, "Which task did you finish?").await?;
    Ok(match store.complete(&target)? {
        Some(task) => Reply::say(format!("Marked task {}, {}, as done.", task.id, task.title)),
        None => Reply::failure("I couldn't find a pending task like that.", "task not found"),
    })
}

/// Pending tasks, or every task for "show all tasks".
pub fn show(store: &TaskStore, arg: Option<&str>) -> Reply {
    let all = arg == Some("all");
    let tasks = store.list(all);
    let header = if all {
        format!("You have {} in total.", plural(tasks.len(), "task"))
    } else {
        format!("You have {} pending.", plural(tasks.len(), "task"))
    };
    task_list(header, "You have no pending tasks.", tasks)
}

pub async fn by_priority<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    store: &TaskStore,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let answer = arg_or_ask(dlg, arg, "Which priority? High, medium, or low.").await?;
    let priority = Priority::parse(&answer)
        .ok_or_else(|| DialogueAbort::Invalid(format!("{} isn't a priority.", answer)))?;
    let tasks = store.by_priority(priority);
    Ok(task_list(
        format!("You have {} at {} priority.", plural(tasks.len(), "task"), priority),
        &format!("No pending tasks at {} priority.", priority),
        tasks,
    ))
}

pub async fn by_category<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    store: &TaskStore,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let category = arg_or_ask(dlg, arg, "Which category?").await?;
    let tasks = store.by_category(&category);
    Ok(task_list(
        format!("You have {} in {}.", plural(tasks.len(), "task"), category),
        &format!("No pending tasks in {}.", category),
        tasks,
    ))
}

pub fn due(store: &TaskStore) -> Reply {
    let tasks = store.due_soon(now());
    task_list(
        format!("{} due in the next day.", plural(tasks.len(), "task")),
        "Nothing is due in the next day.",
        tasks,
    )
}

pub fn overdue(store: &TaskStore) -> Reply {
    let tasks = store.overdue(now());
    task_list(
        format!("{} overdue.", plural(tasks.len(), "task")),
        "Nothing is overdue.",
        tasks,
    )
}
