//! Local music playback.

use super::Reply;
use crate::services::apps::{youtube_search_url, AppLauncher};
use crate::services::music::{MusicPlayer, PLAY_THRESHOLD};

const NOTHING_PLAYING: &str = "Nothing is playing right now.";

fn playing(title: Option<String>) -> Reply {
    match title {
        Some(title) => Reply::say(format!("Playing {}.", title)),
        None => Reply::say("Your music library is empty."),
    }
}

/// A close library match plays locally; anything else goes to YouTube.
pub async fn play(
    music: &mut MusicPlayer,
    apps: &dyn AppLauncher,
    arg: Option<&str>,
) -> anyhow::Result<Reply> {
    let Some(query) = arg else {
        return Ok(playing(music.next().await?));
    };
    match music.library().find(query) {
        Some((song, score)) if score > PLAY_THRESHOLD => Ok(playing(Some(music.play(song).await?))),
        _ => {
            apps.open_url(&youtube_search_url(query))?;
            Ok(Reply::say(format!(
                "I couldn't find {} in your library, so I'm searching YouTube.",
                query
            )))
        }
    }
}

pub async fn pause(music: &mut MusicPlayer) -> anyhow::Result<Reply> {
    Ok(if music.pause().await? {
        Reply::say("Music paused.")
    } else {
        Reply::say(NOTHING_PLAYING)
    })
}

pub async fn resume(music: &mut MusicPlayer) -> anyhow::Result<Reply> {
    Ok(if music.resume().await? {
        Reply::say("Resuming.")
    } else {
        Reply::say("There's nothing to resume.")
    })
}

pub async fn stop(music: &mut MusicPlayer) -> anyhow::Result<Reply> {
    Ok(if music.stop().await? {
        Reply::say("Music stopped.")
    } else {
        Reply::say(NOTHING_PLAYING)
    })
}

pub async fn next(music: &mut MusicPlayer) -> anyhow::Result<Reply> {
    Ok(playing(music.next().await?))
}

pub async fn volume(music: &mut MusicPlayer, up: bool) -> anyhow::Result<Reply> {
    let level = music.change_volume(up).await?;
    Ok(Reply::say(format!("Volume set to {:.0}%.", level * 100.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_controls_without_playback() {
        let dir = tempfile::tempdir().unwrap();
        let mut music = MusicPlayer::new(dir.path().join("music"));
        assert_eq!(pause(&mut music).await.unwrap(), Reply::say(NOTHING_PLAYING));
        assert_eq!(stop(&mut music).await.unwrap(), Reply::say(NOTHING_PLAYING));
        assert_eq!(
            next(&mut music).await.unwrap(),
            Reply::say("Your music library is empty.")
        );
        assert_eq!(
            volume(&mut music, false).await.unwrap(),
            Reply::say("Volume set to 90%.")
        );
    }
}
