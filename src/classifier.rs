//! Command classifier.
//!
//! An utterance is normalized into word tokens and run against `RULES` in
//! order; the first rule with a matching phrase decides the intent. Phrases
//! match contiguous tokens, `*` stands for exactly one token. Exact rules
//! must equal the whole utterance once filler words are removed.
//!
//! Order is precedence. Specific phrases ("add task", "tasks by category")
//! sit above the broader ones ("show tasks", "task") that would otherwise
//! swallow them.

use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentKind {
    Exit,
    ShutdownSystem,
    RestartSystem,
    SleepSystem,
    Wikipedia,
    YouTube,
    GoogleSearch,
    News,
    Weather,
    CreateNote,
    ShowNotes,
    SearchNotes,
    DeleteNote,
    UpdateNote,
    ChangeNoteCategory,
    ExportNotes,
    NoteStats,
    AddTask,
    RemoveTask,
    CompleteTask,
    ShowTasks,
    TasksByPriority,
    TasksByCategory,
    DueTasks,
    OverdueTasks,
    PlayMusic,
    PauseMusic,
    ResumeMusic,
    StopMusic,
    NextSong,
    VolumeUp,
    VolumeDown,
    ScheduleEmail,
    SendEmail,
    AddContact,
    ListContacts,
    GenerateCode,
    GenerateWebsite,
    SystemStats,
    DiskSpace,
    BatteryStatus,
    TellTime,
    TellDate,
    PerformanceReport,
    GiveFeedback,
    ListTools,
    AnalyzeWithMcp,
    OpenApp,
    CloseApp,
    NotesHelp,
    TasksHelp,
    Help,
    Unknown,
}

impl IntentKind {
    /// Wire name used in `intent` events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exit => "exit",
            Self::ShutdownSystem => "shutdown_system",
            Self::RestartSystem => "restart_system",
            Self::SleepSystem => "sleep_system",
            Self::Wikipedia => "wikipedia",
            Self::YouTube => "youtube",
            Self::GoogleSearch => "google_search",
            Self::News => "news",
            Self::Weather => "weather",
            Self::CreateNote => "create_note",
            Self::ShowNotes => "show_notes",
            Self::SearchNotes => "search_notes",
            Self::DeleteNote => "delete_note",
            Self::UpdateNote => "update_note",
            Self::ChangeNoteCategory => "change_note_category",
            Self::ExportNotes => "export_notes",
            Self::NoteStats => "note_stats",
            Self::AddTask => "add_task",
            Self::RemoveTask => "remove_task",
            Self::CompleteTask => "complete_task",
            Self::ShowTasks => "show_tasks",
            Self::TasksByPriority => "tasks_by_priority",
            Self::TasksByCategory => "tasks_by_category",
            Self::DueTasks => "due_tasks",
            Self::OverdueTasks => "overdue_tasks",
            Self::PlayMusic => "play_music",
            Self::PauseMusic => "pause_music",
            Self::ResumeMusic => "resume_music",
            Self::StopMusic => "stop_music",
            Self::NextSong => "next_song",
            Self::VolumeUp => "volume_up",
            Self::VolumeDown => "volume_down",
            Self::ScheduleEmail => "schedule_email",
            Self::SendEmail => "send_email",
            Self::AddContact => "add_contact",
            Self::ListContacts => "list_contacts",
            Self::GenerateCode => "generate_code",
            Self::GenerateWebsite => "generate_website",
            Self::SystemStats => "system_stats",
            Self::DiskSpace => "disk_space",
            Self::BatteryStatus => "battery_status",
            Self::TellTime => "tell_time",
            Self::TellDate => "tell_date",
            Self::PerformanceReport => "performance_report",
            Self::GiveFeedback => "give_feedback",
            Self::ListTools => "list_tools",
            Self::AnalyzeWithMcp => "analyze_with_mcp",
            Self::OpenApp => "open_app",
            Self::CloseApp => "close_app",
            Self::NotesHelp => "notes_help",
            Self::TasksHelp => "tasks_help",
            Self::Help => "help",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified utterance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    pub kind: IntentKind,
    /// Parameter pulled out of the utterance, if the rule extracts one.
    pub argument: Option<String>,
    pub utterance: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Matching {
    /// Phrase occurs as a contiguous token run.
    Phrase,
    /// Utterance minus fillers equals the phrase.
    Exact,
}

/// How a rule pulls its argument out of the utterance tokens.
#[derive(Debug, Clone, Copy)]
enum Arg {
    None,
    /// Tokens after the matched phrase, minus leading connectors.
    Rest,
    /// The tokens matched by `*`.
    Wildcard,
    /// `Rest` when something follows the phrase, else the `*` tokens with
    /// priority words and connectors trimmed from both ends.
    Title,
    /// Tokens after the last of these words; falls back to `Rest`.
    After(&'static [&'static str]),
    /// Tokens after the last of these words, or nothing.
    Following(&'static [&'static str]),
    /// All tokens except these words.
    Strip(&'static [&'static str]),
    /// The first token that is one of these words.
    OneOf(&'static [&'static str]),
}

#[derive(Debug)]
pub struct Rule {
    kind: IntentKind,
    matching: Matching,
    phrases: &'static [&'static str],
    arg: Arg,
}

const fn phrase(kind: IntentKind, phrases: &'static [&'static str], arg: Arg) -> Rule {
    Rule {
        kind,
        matching: Matching::Phrase,
        phrases,
        arg,
    }
}

const fn exact(kind: IntentKind, phrases: &'static [&'static str]) -> Rule {
    Rule {
        kind,
        matching: Matching::Exact,
        phrases,
        arg: Arg::None,
    }
}

use IntentKind as K;

const WIKI_NOISE: &[&str] = &[
    "search", "wikipedia", "on", "in", "for", "about", "look", "up", "tell", "me", "who", "what",
    "is", "was", "according", "to",
];
const YOUTUBE_NOISE: &[&str] = &["play", "search", "youtube", "on", "in", "for", "open", "watch"];
const GOOGLE_NOISE: &[&str] = &["google", "search", "for", "on", "about", "look", "up"];

/// The ordered rule table. First match wins.
pub static RULES: &[Rule] = &[
    exact(K::Exit, &["exit", "quit", "goodbye", "bye", "stop listening"]),
    phrase(K::Exit, &["shutdown optimus", "shut down optimus"], Arg::None),
    phrase(
        K::ShutdownSystem,
        &[
            "shutdown system",
            "shut down system",
            "shutdown computer",
            "shut down computer",
            "power off",
        ],
        Arg::None,
    ),
    phrase(
        K::RestartSystem,
        &["restart system", "restart computer", "reboot"],
        Arg::None,
    ),
    phrase(
        K::SleepSystem,
        &[
            "sleep system",
            "sleep computer",
            "computer to sleep",
            "system to sleep",
            "suspend system",
            "suspend computer",
            "sleep mode",
        ],
        Arg::None,
    ),
    // notes
    phrase(
        K::CreateNote,
        &[
            "create note",
            "add note",
            "make note",
            "new note",
            "take note",
            "write note",
        ],
        Arg::Rest,
    ),
    phrase(
        K::ShowNotes,
        &[
            "show notes",
            "view notes",
            "list notes",
            "display notes",
            "read notes",
            "open notes",
            "show * notes",
            "list * notes",
        ],
        Arg::Wildcard,
    ),
    phrase(
        K::SearchNotes,
        &["search notes", "search note", "find notes", "find note"],
        Arg::After(&["for", "about", "containing"]),
    ),
    phrase(K::DeleteNote, &["delete note", "remove note"], Arg::Rest),
    phrase(
        K::UpdateNote,
        &["update note", "edit note", "modify note"],
        Arg::Rest,
    ),
    phrase(
        K::ChangeNoteCategory,
        &["change category", "change note category", "move note"],
        Arg::Rest,
    ),
    phrase(
        K::ExportNotes,
        &["export notes", "export note", "backup notes", "save notes"],
        Arg::OneOf(&["json", "text", "txt"]),
    ),
    phrase(
        K::NoteStats,
        &[
            "notes statistics",
            "note statistics",
            "notes stats",
            "how many notes",
        ],
        Arg::None,
    ),
    // tasks
    phrase(
        K::AddTask,
        &[
            "add task",
            "create task",
            "new task",
            "add * task",
            "add * * task",
            "create * task",
        ],
        Arg::Title,
    ),
    phrase(K::RemoveTask, &["remove task", "delete task"], Arg::Rest),
    phrase(
        K::CompleteTask,
        &["complete task", "finish task", "done task", "mark task"],
        Arg::Rest,
    ),
    phrase(
        K::TasksByPriority,
        &["high priority", "medium priority", "low priority"],
        Arg::OneOf(&["high", "medium", "low"]),
    ),
    phrase(
        K::TasksByCategory,
        &[
            "tasks by category",
            "tasks in category",
            "task category",
            "tasks category",
        ],
        Arg::After(&["category"]),
    ),
    phrase(
        K::DueTasks,
        &["due tasks", "due soon", "upcoming tasks", "tasks due"],
        Arg::None,
    ),
    phrase(K::OverdueTasks, &["overdue", "late tasks"], Arg::None),
    phrase(
        K::ShowTasks,
        &["show tasks", "list tasks", "view tasks", "all tasks", "show task"],
        Arg::OneOf(&["all"]),
    ),
    // music
    phrase(K::PlayMusic, &["play song", "play music"], Arg::Rest),
    phrase(
        K::PauseMusic,
        &["pause music", "pause song", "pause"],
        Arg::None,
    ),
    phrase(
        K::ResumeMusic,
        &["resume music", "resume song", "resume"],
        Arg::None,
    ),
    phrase(
        K::StopMusic,
        &["stop music", "stop song", "stop playing"],
        Arg::None,
    ),
    phrase(
        K::NextSong,
        &["next song", "skip song", "next track"],
        Arg::None,
    ),
    phrase(
        K::VolumeUp,
        &["volume up", "increase volume", "turn up volume", "louder"],
        Arg::None,
    ),
    phrase(
        K::VolumeDown,
        &["volume down", "decrease volume", "turn down volume", "quieter"],
        Arg::None,
    ),
    // email
    phrase(
        K::ScheduleEmail,
        &[
            "schedule email",
            "schedule mail",
            "schedule * email",
            "send email later",
        ],
        Arg::Following(&["to"]),
    ),
    phrase(
        K::SendEmail,
        &["send email", "send mail", "compose email", "write email"],
        Arg::Following(&["to"]),
    ),
    phrase(
        K::AddContact,
        &["add contact", "save contact", "new contact"],
        Arg::Rest,
    ),
    phrase(K::ListContacts, &["list contacts", "show contacts"], Arg::None),
    // code generation
    phrase(
        K::GenerateCode,
        &["generate code", "write code", "generate * code", "write * code"],
        Arg::Wildcard,
    ),
    phrase(
        K::GenerateWebsite,
        &[
            "create website",
            "generate website",
            "build website",
            "make website",
        ],
        Arg::Rest,
    ),
    // system and clock
    phrase(
        K::SystemStats,
        &[
            "system stats",
            "system status",
            "system statistics",
            "cpu usage",
            "ram usage",
            "memory usage",
        ],
        Arg::None,
    ),
    phrase(
        K::DiskSpace,
        &["disk space", "storage space", "disk usage"],
        Arg::None,
    ),
    phrase(
        K::BatteryStatus,
        &[
            "battery status",
            "battery level",
            "battery life",
            "battery percentage",
            "check battery",
            "how much battery",
        ],
        Arg::None,
    ),
    phrase(
        K::TellTime,
        &[
            "what time",
            "what's time",
            "what is time",
            "current time",
            "time now",
            "tell time",
        ],
        Arg::None,
    ),
    phrase(
        K::TellDate,
        &[
            "what date",
            "what's date",
            "what is date",
            "today's date",
            "what day",
            "date today",
        ],
        Arg::None,
    ),
    // self evaluation
    phrase(
        K::PerformanceReport,
        &["performance report", "agent performance", "how am i doing"],
        Arg::None,
    ),
    phrase(
        K::GiveFeedback,
        &["give feedback", "rate performance", "feedback"],
        Arg::None,
    ),
    // MCP tools
    phrase(
        K::ListTools,
        &["list tools", "available tools", "show tools"],
        Arg::None,
    ),
    phrase(K::AnalyzeWithMcp, &["analyze with mcp", "analyze"], Arg::Rest),
    // web lookups; their single keywords would swallow the phrases above
    phrase(K::Wikipedia, &["wikipedia"], Arg::Strip(WIKI_NOISE)),
    phrase(K::YouTube, &["youtube"], Arg::Strip(YOUTUBE_NOISE)),
    phrase(
        K::GoogleSearch,
        &["google search", "search google", "google for", "on google"],
        Arg::Strip(GOOGLE_NOISE),
    ),
    phrase(K::News, &["news", "headlines"], Arg::None),
    phrase(K::Weather, &["weather"], Arg::After(&["in", "for"])),
    // applications
    phrase(K::OpenApp, &["open", "launch"], Arg::Rest),
    phrase(K::CloseApp, &["close", "terminate", "kill"], Arg::Rest),
    exact(K::StopMusic, &["stop"]),
    // generic keywords last
    phrase(K::NotesHelp, &["note", "notes"], Arg::None),
    phrase(K::TasksHelp, &["task", "tasks"], Arg::None),
    phrase(K::Help, &["help", "what can you do"], Arg::None),
];

/// Dropped from every utterance before matching.
const ARTICLES: &[&str] = &["a", "an", "the", "my", "some"];

/// Politeness that never changes the meaning of a command.
const FILLERS: &[&str] = &["please", "kindly", "hey", "optimus"];
const FILLER_PAIRS: &[(&str, &str)] = &[("can", "you"), ("could", "you"), ("would", "you")];

/// Leading words stripped from a `Rest` argument.
const CONNECTORS: &[&str] = &["to", "for", "about", "called", "named", "that", "with", "of", "on"];

/// Words around "add ... task" that describe the task rather than name it.
const TITLE_EDGES: &[&str] = &["high", "medium", "low", "normal", "urgent", "priority", "new"];

/// "add milk to my task list": nothing after "list" is a title.
const LIST_WORDS: &[&str] = &["list", "lists"];

/// Lower-case word tokens with articles removed. Apostrophes stay inside
/// words ("what's", "today's").
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace('\u{2019}', "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty() && !ARTICLES.contains(t))
        .map(str::to_string)
        .collect()
}

/// Remove filler words and "can you"-style pairs.
pub fn strip_fillers(tokens: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let pair = tokens.get(i + 1).map(|next| (tokens[i].as_str(), next.as_str()));
        if pair.is_some_and(|p| FILLER_PAIRS.contains(&p)) {
            i += 2;
            continue;
        }
        if !FILLERS.contains(&tokens[i].as_str()) {
            out.push(tokens[i].clone());
        }
        i += 1;
    }
    out
}

const NUMBER_WORDS: &[&str] = &[
    "zero", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten",
    "eleven", "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
    "nineteen", "twenty",
];

/// A number as spoken or transcribed: "3", "three", "3rd".
pub fn spoken_number(token: &str) -> Option<u32> {
    let token = token.trim().to_lowercase();
    if let Some(i) = NUMBER_WORDS.iter().position(|w| *w == token) {
        return Some(i as u32);
    }
    let digits = token.trim_end_matches(|c: char| c.is_ascii_alphabetic());
    digits.parse().ok()
}

/// First number anywhere in the text ("delete note number three" -> 3).
pub fn first_number(text: &str) -> Option<u32> {
    tokenize(text).iter().find_map(|t| spoken_number(t))
}

/// The utterance's tokens with the first run of `part` taken out, so a
/// slot can be read from everything except an already extracted argument.
pub fn tokens_outside(utterance: &str, part: &str) -> Vec<String> {
    let mut tokens = tokenize(utterance);
    let part = tokenize(part).join(" ");
    if let Some(span) = find_phrase(&tokens, &part) {
        tokens.drain(span.start..span.end);
    }
    tokens
}

/// Where a phrase matched: token span and the run of `*` tokens, if any.
struct Span {
    start: usize,
    end: usize,
    wildcard: Option<Range<usize>>,
}

fn find_phrase(tokens: &[String], phrase: &str) -> Option<Span> {
    let words: Vec<&str> = phrase.split_whitespace().collect();
    if words.is_empty() || words.len() > tokens.len() {
        return None;
    }
    (0..=tokens.len() - words.len()).find_map(|start| {
        let mut wildcard = None;
        for (offset, word) in words.iter().enumerate() {
            let token = &tokens[start + offset];
            if *word == "*" {
                let at = start + offset;
                let run = wildcard.get_or_insert(at..at);
                run.end = at + 1;
            } else if token != word {
                return None;
            }
        }
        Some(Span {
            start,
            end: start + words.len(),
            wildcard,
        })
    })
}

fn join(tokens: &[String]) -> Option<String> {
    let text = tokens.join(" ");
    (!text.is_empty()).then_some(text)
}

fn rest_after(tokens: &[String], end: usize) -> Option<String> {
    let rest = &tokens[end.min(tokens.len())..];
    let skip = rest
        .iter()
        .take_while(|t| CONNECTORS.contains(&t.as_str()))
        .count();
    join(&rest[skip..])
}

fn extract(arg: Arg, tokens: &[String], span: &Span) -> Option<String> {
    match arg {
        Arg::None => None,
        Arg::Rest => rest_after(tokens, span.end),
        Arg::Wildcard => span.wildcard.clone().and_then(|run| join(&tokens[run])),
        Arg::Title => rest_after(tokens, span.end)
            .filter(|rest| !LIST_WORDS.contains(&rest.as_str()))
            .or_else(|| {
                let run = &tokens[span.wildcard.clone()?];
                let edge = |t: &String| {
                    TITLE_EDGES.contains(&t.as_str()) || CONNECTORS.contains(&t.as_str())
                };
                let head = run.iter().take_while(|t| edge(*t)).count();
                let tail = run[head..].iter().rev().take_while(|t| edge(*t)).count();
                join(&run[head..run.len() - tail])
            }),
        Arg::After(words) => match tokens.iter().rposition(|t| words.contains(&t.as_str())) {
            Some(i) => join(&tokens[i + 1..]),
            None => rest_after(tokens, span.end),
        },
        Arg::Following(words) => tokens
            .iter()
            .rposition(|t| words.contains(&t.as_str()))
            .and_then(|i| join(&tokens[i + 1..])),
        Arg::Strip(words) => {
            let kept: Vec<String> = tokens
                .iter()
                .filter(|t| !words.contains(&t.as_str()))
                .cloned()
                .collect();
            join(&kept)
        }
        Arg::OneOf(words) => tokens
            .iter()
            .find(|t| words.contains(&t.as_str()))
            .cloned(),
    }
}

fn match_rule(rule: &Rule, tokens: &[String]) -> Option<Span> {
    match rule.matching {
        Matching::Exact => rule
            .phrases
            .iter()
            .any(|p| p.split_whitespace().eq(tokens.iter().map(String::as_str)))
            .then_some(Span {
                start: 0,
                end: tokens.len(),
                wildcard: None,
            }),
        Matching::Phrase => rule.phrases.iter().find_map(|p| find_phrase(tokens, p)),
    }
}

/// Index into `RULES` of the rule that claims `utterance`, if any.
fn first_match(tokens: &[String]) -> Option<(usize, Span)> {
    RULES
        .iter()
        .enumerate()
        .find_map(|(i, rule)| match_rule(rule, tokens).map(|span| (i, span)))
}

/// Classify one utterance. Never fails: no match yields `Unknown`.
pub fn classify(utterance: &str) -> Intent {
    let tokens = strip_fillers(&tokenize(utterance));
    let (kind, argument) = match first_match(&tokens) {
        Some((i, span)) => {
            let rule = &RULES[i];
            (rule.kind, extract(rule.arg, &tokens, &span))
        }
        None => (IntentKind::Unknown, None),
    };
    Intent {
        kind,
        argument,
        utterance: utterance.trim().to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One utterance per rule, in table order. Each must land on its own
    /// rule, which proves no rule is shadowed by the ones above it.
    const SAMPLES: &[&str] = &[
        "exit",
        "shut down optimus",
        "shutdown the computer",
        "reboot",
        "put the computer to sleep",
        "take a note",
        "show my work notes",
        "search notes for meeting",
        "delete note 3",
        "edit note 2",
        "change category of note 4",
        "export notes as json",
        "how many notes do i have",
        "add a task",
        "remove task 1",
        "mark task 2 as done",
        "high priority tasks",
        "show tasks by category work",
        "which tasks are due soon",
        "anything overdue",
        "show all tasks",
        "play song believer",
        "pause",
        "resume the music",
        "stop the music",
        "next song",
        "volume up",
        "volume down",
        "schedule an email",
        "send an email to john",
        "add contact",
        "list contacts",
        "generate python code",
        "create a website for my bakery",
        "system status",
        "how much disk space is left",
        "how much battery is left",
        "what time is it",
        "what is the date today",
        "performance report",
        "give feedback",
        "list tools",
        "analyze this sentence please",
        "search wikipedia for alan turing",
        "play despacito on youtube",
        "google search rust lifetimes",
        "read me the news",
        "what's the weather in paris",
        "open notepad",
        "close chrome",
        "stop",
        "note down this task",
        "tasks",
        "help",
    ];

    #[test]
    fn test_every_rule_is_reachable() {
        assert_eq!(SAMPLES.len(), RULES.len(), "one sample per rule");
        for (i, sample) in SAMPLES.iter().enumerate() {
            let tokens = strip_fillers(&tokenize(sample));
            let (hit, _) = first_match(&tokens)
                .unwrap_or_else(|| panic!("{sample:?} matched nothing"));
            assert_eq!(
                hit, i,
                "{sample:?} should hit rule {i} ({:?}) but hit {:?}",
                RULES[i].kind, RULES[hit].kind
            );
        }
    }

    #[test]
    fn test_case_and_fillers_do_not_matter() {
        for text in ["QUIT", "Quit please", "hey optimus, quit", "Can you quit?"] {
            assert_eq!(classify(text).kind, IntentKind::Exit, "{text}");
        }
        for text in ["Open Notepad", "please open notepad", "could you open the notepad"] {
            let intent = classify(text);
            assert_eq!(intent.kind, IntentKind::OpenApp, "{text}");
            assert_eq!(intent.argument.as_deref(), Some("notepad"), "{text}");
        }
    }

    #[test]
    fn test_exit_words_need_the_whole_utterance() {
        assert_eq!(classify("quit").kind, IntentKind::Exit);
        assert_eq!(classify("say bye to the team").kind, IntentKind::Unknown);
    }

    #[test]
    fn test_note_keyword_beats_task_keyword() {
        assert_eq!(classify("note down this task").kind, IntentKind::NotesHelp);
        assert_eq!(classify("tasks and notes").kind, IntentKind::NotesHelp);
    }

    #[test]
    fn test_specific_task_phrase_beats_note_keyword() {
        assert_eq!(classify("add task to my notes").kind, IntentKind::AddTask);
    }

    #[test]
    fn test_whole_tokens_only() {
        // "notepad" is not "note", "notes" is not "note" for CreateNote
        assert_eq!(classify("open notepad").kind, IntentKind::OpenApp);
        assert_eq!(classify("open notes").kind, IntentKind::ShowNotes);
        assert_eq!(classify("open youtube").kind, IntentKind::YouTube);
    }

    #[test]
    fn test_web_keywords_do_not_swallow_commands() {
        let cases: &[(&str, IntentKind, Option<&str>)] = &[
            ("add task watch youtube tutorial", K::AddTask, Some("watch youtube tutorial")),
            ("create note check the weather app", K::CreateNote, Some("check weather app")),
            ("send email about the news", K::SendEmail, None),
            ("add task read wikipedia article", K::AddTask, Some("read wikipedia article")),
            ("show notes about the news", K::ShowNotes, None),
        ];
        for (text, kind, arg) in cases {
            let intent = classify(text);
            assert_eq!(intent.kind, *kind, "{text}");
            assert_eq!(intent.argument.as_deref(), *arg, "{text}");
        }
        // on their own the keywords still reach the lookups
        assert_eq!(classify("latest news").kind, IntentKind::News);
        assert_eq!(classify("open youtube").kind, IntentKind::YouTube);
    }

    #[test]
    fn test_task_title_around_wildcards() {
        let cases: &[(&str, Option<&str>)] = &[
            ("add milk to my task list", Some("milk")),
            ("add groceries to task list", Some("groceries")),
            ("add a high priority task", None),
            ("add urgent task", None),
            ("add high priority task call the bank", Some("call bank")),
            ("add a task to call the high school", Some("call high school")),
        ];
        for (text, title) in cases {
            let intent = classify(text);
            assert_eq!(intent.kind, IntentKind::AddTask, "{text}");
            assert_eq!(intent.argument.as_deref(), *title, "{text}");
        }
    }

    #[test]
    fn test_tokens_outside_argument() {
        assert_eq!(
            tokens_outside("add a task to call the high school", "call high school"),
            vec!["add", "task", "to"]
        );
        assert_eq!(
            tokens_outside("add high priority task buy milk", "buy milk"),
            vec!["add", "high", "priority", "task"]
        );
        assert_eq!(tokens_outside("add task", "pay rent"), vec!["add", "task"]);
    }

    #[test]
    fn test_power_and_battery_phrases() {
        assert_eq!(classify("put my computer to sleep").kind, IntentKind::SleepSystem);
        assert_eq!(classify("sleep mode please").kind, IntentKind::SleepSystem);
        assert_eq!(classify("what's my battery level").kind, IntentKind::BatteryStatus);
    }

    #[test]
    fn test_schedule_before_send() {
        assert_eq!(classify("send email later").kind, IntentKind::ScheduleEmail);
        assert_eq!(classify("send email").kind, IntentKind::SendEmail);
    }

    #[test]
    fn test_priority_task_phrases() {
        assert_eq!(classify("add a high priority task").kind, IntentKind::AddTask);
        let intent = classify("show me low priority tasks");
        assert_eq!(intent.kind, IntentKind::TasksByPriority);
        assert_eq!(intent.argument.as_deref(), Some("low"));
    }

    #[test]
    fn test_argument_extraction() {
        let cases: &[(&str, IntentKind, Option<&str>)] = &[
            ("open google chrome", K::OpenApp, Some("google chrome")),
            ("close the calculator please", K::CloseApp, Some("calculator")),
            ("search wikipedia for alan turing", K::Wikipedia, Some("alan turing")),
            ("play lofi beats on youtube", K::YouTube, Some("lofi beats")),
            ("google search rust borrow checker", K::GoogleSearch, Some("rust borrow checker")),
            ("what's the weather in new york", K::Weather, Some("new york")),
            ("weather london", K::Weather, Some("london")),
            ("what's the weather", K::Weather, None),
            ("play song shape of you", K::PlayMusic, Some("shape of you")),
            ("show work notes", K::ShowNotes, Some("work")),
            ("show notes", K::ShowNotes, None),
            ("search notes for groceries", K::SearchNotes, Some("groceries")),
            ("add task to buy milk", K::AddTask, Some("buy milk")),
            ("take a note about the demo", K::CreateNote, Some("demo")),
            ("show tasks by category work", K::TasksByCategory, Some("work")),
            ("show all tasks", K::ShowTasks, Some("all")),
            ("show tasks", K::ShowTasks, None),
            ("send an email to john", K::SendEmail, Some("john")),
            ("generate rust code", K::GenerateCode, Some("rust")),
            ("export notes as json", K::ExportNotes, Some("json")),
            ("analyze i love this product", K::AnalyzeWithMcp, Some("i love this product")),
        ];
        for (text, kind, arg) in cases {
            let intent = classify(text);
            assert_eq!(intent.kind, *kind, "{text}");
            assert_eq!(intent.argument.as_deref(), *arg, "{text}");
        }
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!(classify("").kind, IntentKind::Unknown);
        assert_eq!(classify("the quick brown fox").kind, IntentKind::Unknown);
    }

    #[test]
    fn test_utterance_is_kept_lowercased() {
        assert_eq!(classify(" Open Notepad ").utterance, "open notepad");
    }

    #[test]
    fn test_classification_is_deterministic() {
        assert_eq!(classify("show my tasks"), classify("show my tasks"));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(spoken_number("three"), Some(3));
        assert_eq!(spoken_number("12"), Some(12));
        assert_eq!(spoken_number("2nd"), Some(2));
        assert_eq!(spoken_number("milk"), None);
        assert_eq!(first_number("delete note number three"), Some(3));
        assert_eq!(first_number("of note 4"), Some(4));
        assert_eq!(first_number("buy milk"), None);
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("What's the time, Optimus?"),
            vec!["what's", "time", "optimus"]
        );
        assert_eq!(tokenize("Today\u{2019}s date"), vec!["today's", "date"]);
    }
}
