//! Opening and closing desktop applications.

use super::{arg_or_ask, Reply};
use crate::dialogue::Dialogue;
use crate::input::VoiceInput;
use crate::services::apps::{AppLauncher, CloseOutcome};

pub async fn open<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    apps: &dyn AppLauncher,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let name = arg_or_ask(dlg, arg, "Which application should I open?").await?;
    apps.open(&name)?;
    Ok(Reply::say(format!("Opening {}.", name)))
}

pub async fn close<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    apps: &dyn AppLauncher,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let name = arg_or_ask(dlg, arg, "Which application should I close?").await?;
    Ok(match apps.close(&name)? {
        CloseOutcome::Closed => Reply::say(format!("{} has been closed.", name)),
        CloseOutcome::NotRunning => Reply::say(format!("{} isn't running.", name)),
    })
}
