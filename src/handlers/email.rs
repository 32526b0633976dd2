//! Email and contact handlers. Spoken recipients resolve through the contact book.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::{arg_or_ask, plural, spoken_list, Reply};
use crate::dialogue::{Dialogue, DialogueAbort};
use crate::input::VoiceInput;
use crate::services::contacts::{find_email, ContactBook};
use crate::services::mail::{parse_delay, MailTransport, OutgoingMail};

/// Recipient, subject and body, in that order.
async fn compose<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    contacts: &ContactBook,
    arg: Option<&str>,
) -> anyhow::Result<OutgoingMail> {
    let recipients = arg_or_ask(dlg, arg, "Who should I send it to?").await?;
    let to = contacts.parse_recipients(&recipients);
    if to.is_empty() {
        return Err(DialogueAbort::Invalid(format!(
            "I couldn't find an address for {}.",
            recipients
        ))
        .into());
    }
    let subject = dlg.ask("What's the subject?").await?;
    let body = dlg.ask("What should the email say?").await?;
    Ok(OutgoingMail { to, subject, body })
}

fn spoken_delay(delay: Duration) -> String {
    let secs = delay.as_secs();
    let (h, m, s) = (secs / 3600, secs % 3600 / 60, secs % 60);
    let parts: Vec<String> = [(h, "hour"), (m, "minute"), (s, "second")]
        .into_iter()
        .filter(|(n, _)| *n > 0)
        .map(|(n, unit)| plural(n as usize, unit))
        .collect();
    if parts.is_empty() {
        return "a moment".to_string();
    }
    parts.join(" and ")
}

pub async fn send<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    contacts: &ContactBook,
    mail: &dyn MailTransport,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let message = compose(dlg, contacts, arg).await?;
    let prompt = format!(
        "Send it to {} with subject {}?",
        message.to.join(", "),
        message.subject
    );
    if !dlg.confirm(&prompt).await {
        return Ok(Reply::say("Okay, I won't send it."));
    }
    let id = mail.send(&message).await?;
    info!(id = %id, transport = mail.name(), "Email sent");
    Ok(Reply::say("Email sent."))
}

/// Like `send`, plus a delay. The send happens on a spawned task that
/// reports back through the speech queue.
pub async fn schedule<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    contacts: &ContactBook,
    mail: &Arc<dyn MailTransport>,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let message = compose(dlg, contacts, arg).await?;
    let answer = dlg
        .ask("How long should I wait? For example, ten minutes.")
        .await?;
    let delay = parse_delay(&answer)
        .ok_or_else(|| DialogueAbort::Invalid(format!("I couldn't understand {} as a delay.", answer)))?;
    let when = spoken_delay(delay);
    if !dlg
        .confirm(&format!("Send it to {} in {}?", message.to.join(", "), when))
        .await
    {
        return Ok(Reply::say("Okay, I won't schedule it."));
    }

    let mail = Arc::clone(mail);
    let speech = dlg.speech().clone();
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let to = message.to.join(", ");
        match mail.send(&message).await {
            Ok(id) => {
                info!(id = %id, "Scheduled email sent");
                speech.announce(format!("Your scheduled email to {} has been sent.", to));
            }
            Err(e) => {
                warn!("Scheduled email failed: {}", e);
                speech.announce(format!("Sorry, your scheduled email to {} failed.", to));
            }
        }
    });
    Ok(Reply::say(format!("Okay, I'll send it in {}.", when)))
}

pub async fn add_contact<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    contacts: &mut ContactBook,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let name = arg_or_ask(dlg, arg, "What's the contact's name?").await?;
    let spoken = dlg.ask(&format!("What's {}'s email address?", name)).await?;
    let Some(email) = find_email(&spoken) else {
        return Err(DialogueAbort::Invalid(format!("{} isn't an email address.", spoken)).into());
    };
    contacts.add(&name, &email)?;
    Ok(Reply::say(format!("Saved {} as {}.", name, email)))
}

pub fn list_contacts(contacts: &ContactBook) -> Reply {
    let all = contacts.list();
    if all.is_empty() {
        return Reply::say("You don't have any contacts yet.");
    }
    spoken_list(
        format!("You have {}.", plural(all.len(), "contact")),
        all.iter().map(|(n, e)| format!("{}: {}", n, e)).collect(),
    )
}
