//! Power, host statistics, battery and clock handlers.

use chrono::{DateTime, Local};

use super::Reply;
use crate::dialogue::Dialogue;
use crate::input::VoiceInput;
use crate::services::system::{PowerControl, SystemMonitor};

/// Disks read out before the rest are dropped.
const SPOKEN_DISKS: usize = 4;

pub async fn shutdown<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    power: &dyn PowerControl,
) -> anyhow::Result<Reply> {
    if !dlg.confirm("Are you sure you want to shut down the computer?").await {
        return Ok(Reply::say("Okay, I'll leave it running."));
    }
    power.shutdown()?;
    Ok(Reply::say("Shutting down the system now."))
}

pub async fn restart<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    power: &dyn PowerControl,
) -> anyhow::Result<Reply> {
    if !dlg.confirm("Are you sure you want to restart the computer?").await {
        return Ok(Reply::say("Okay, I'll leave it running."));
    }
    power.restart()?;
    Ok(Reply::say("Restarting the system now."))
}

pub async fn sleep<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    power: &dyn PowerControl,
) -> anyhow::Result<Reply> {
    if !dlg.confirm("Should I put the computer to sleep?").await {
        return Ok(Reply::say("Okay, I'll leave it running."));
    }
    power.sleep()?;
    Ok(Reply::say("Putting the system to sleep."))
}

pub fn battery(system: &SystemMonitor) -> anyhow::Result<Reply> {
    Ok(match system.battery()? {
        Some(status) => Reply::say(status.describe()),
        None => Reply::say("No battery detected. The system is running on AC power."),
    })
}

pub async fn stats(system: &mut SystemMonitor) -> Reply {
    Reply::say(system.stats().await.describe())
}

pub fn disk_space(system: &SystemMonitor) -> Reply {
    let disks = system.disks();
    if disks.is_empty() {
        return Reply::say("I couldn't read any disks.");
    }
    Reply::lines(disks.iter().take(SPOKEN_DISKS).map(|d| d.describe()))
}

fn time_line(now: DateTime<Local>) -> String {
    format!("It's {}.", now.format("%-I:%M %p"))
}

fn date_line(now: DateTime<Local>) -> String {
    format!("Today is {}.", now.format("%A, %B %-d, %Y"))
}

pub fn time() -> Reply {
    Reply::say(time_line(Local::now()))
}

pub fn date() -> Reply {
    Reply::say(date_line(Local::now()))
}
