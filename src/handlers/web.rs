//! Browser lookups: search engines, Wikipedia, YouTube, news and weather.

use super::{arg_or_ask, Reply};
use crate::dialogue::Dialogue;
use crate::input::VoiceInput;
use crate::services::apps::{google_search_url, youtube_search_url, AppLauncher};
use crate::services::web::WebClient;

const YOUTUBE_HOME: &str = "https://www.youtube.com";

pub async fn wikipedia<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    web: &WebClient,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let query = arg_or_ask(dlg, arg, "What should I look up on Wikipedia?").await?;
    let summary = web.wikipedia(&query).await?;
    Ok(Reply::lines(["According to Wikipedia:".to_string(), summary]))
}

/// "open youtube" opens the home page; anything more is a search.
pub fn youtube(apps: &dyn AppLauncher, arg: Option<&str>) -> anyhow::Result<Reply> {
    match arg {
        Some(query) => {
            apps.open_url(&youtube_search_url(query))?;
            Ok(Reply::say(format!("Searching YouTube for {}.", query)))
        }
        None => {
            apps.open_url(YOUTUBE_HOME)?;
            Ok(Reply::say("Opening YouTube."))
        }
    }
}

/// Top result through the search API when keys are set, else the browser.
pub async fn google<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    web: &WebClient,
    apps: &dyn AppLauncher,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let query = arg_or_ask(dlg, arg, "What should I search for?").await?;
    if !web.has_google() {
        apps.open_url(&google_search_url(&query))?;
        return Ok(Reply::say(format!("Here are the Google results for {}.", query)));
    }
    Ok(match web.google(&query).await? {
        Some(hit) => Reply::lines([format!("Top result: {}.", hit.title), hit.snippet]),
        None => Reply::say(format!("I found nothing for {}.", query)),
    })
}

pub async fn news(web: &WebClient) -> anyhow::Result<Reply> {
    let headlines = web.news().await?;
    if headlines.is_empty() {
        return Ok(Reply::say("I couldn't find any headlines right now."));
    }
    let mut lines = vec!["Here are today's top headlines.".to_string()];
    lines.extend(
        headlines
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{}. {}", i + 1, h)),
    );
    Ok(Reply::lines(lines))
}

pub async fn weather<I: VoiceInput>(
    dlg: &mut Dialogue<'_, I>,
    web: &WebClient,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let city = arg_or_ask(dlg, arg, "Which city?").await?;
    Ok(Reply::say(web.weather(&city).await?))
}
