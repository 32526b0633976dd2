//! The dispatch loop: listen, classify, run the handler, speak the reply.
//!
//! One cycle at a time. Each handler runs inside its own fault boundary, so
//! a panic in one cycle is logged and apologized for, and the loop keeps
//! listening.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Instant;

use chrono::Timelike;
use futures_util::FutureExt;
use tracing::{error, info};

use crate::classifier::{classify, Intent, IntentKind};
use crate::dialogue::Dialogue;
use crate::handlers::{self, Reply};
use crate::input::{Heard, VoiceInput};
use crate::ipc::bridge::EventSink;
use crate::ipc::AssistantEvent;
use crate::services::Services;
use crate::speech::SpeechHandle;

/// Who is talking to whom.
#[derive(Debug, Clone)]
pub struct Profile {
    pub assistant_name: String,
    pub user_name: Option<String>,
}

fn greeting(hour: u32, profile: &Profile) -> String {
    let part = match hour {
        0..=11 => "Good morning",
        12..=17 => "Good afternoon",
        _ => "Good evening",
    };
    let name = profile
        .user_name
        .as_deref()
        .map(|n| format!(", {}", n))
        .unwrap_or_default();
    format!(
        "{}{}! I am {}. How can I help you?",
        part, name, profile.assistant_name
    )
}

fn farewell(profile: &Profile) -> String {
    match profile.user_name.as_deref() {
        Some(name) => format!("Goodbye, {}. Have a great day!", name),
        None => "Goodbye. Have a great day!".to_string(),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

pub struct Assistant<I: VoiceInput> {
    input: I,
    speech: SpeechHandle,
    events: EventSink,
    services: Services,
    profile: Profile,
}

impl<I: VoiceInput> Assistant<I> {
    pub fn new(
        input: I,
        speech: SpeechHandle,
        events: EventSink,
        services: Services,
        profile: Profile,
    ) -> Self {
        Self {
            input,
            speech,
            events,
            services,
            profile,
        }
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// Run until an exit phrase or until the input closes.
    pub async fn run(&mut self) {
        let hour = chrono::Local::now().hour();
        self.speech.say(greeting(hour, &self.profile)).await;

        loop {
            let heard = Dialogue::new(&mut self.input, &self.speech, self.events)
                .hear()
                .await;
            let utterance = match heard {
                Heard::Utterance(text) => text,
                Heard::Silence => continue,
                Heard::Closed => {
                    info!("Input closed");
                    break;
                }
            };

            let intent = classify(&utterance);
            info!(intent = %intent.kind, argument = ?intent.argument, "Classified");
            self.events.emit(&AssistantEvent::Intent {
                intent: intent.kind.to_string(),
                argument: intent.argument.clone(),
            });

            if intent.kind == IntentKind::Exit {
                self.speech.say(farewell(&self.profile)).await;
                break;
            }

            let started = Instant::now();
            let reply = self.run_cycle(&intent).await;
            for line in &reply.lines {
                self.speech.say(line.as_str()).await;
            }
            if let Some(err) = &reply.error {
                self.events.error(err);
            }
            self.services.evaluator.log_command(
                &utterance,
                reply.success,
                started.elapsed(),
                reply.error.as_deref(),
            );
        }

        self.services.evaluator.save();
        info!("Dispatch loop finished");
    }

    async fn run_cycle(&mut self, intent: &Intent) -> Reply {
        let mut dlg = Dialogue::new(&mut self.input, &self.speech, self.events);
        let cycle = handlers::handle(intent, &mut dlg, &mut self.services);
        match AssertUnwindSafe(cycle).catch_unwind().await {
            Ok(reply) => reply,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(intent = %intent.kind, "Handler panicked: {}", message);
                Reply::failure(
                    "Sorry, something went wrong while handling that.",
                    format!("panic: {}", message),
                )
            }
        }
    }
}
