//! Local music library and playback.
//!
//! Playback runs on its own thread (rodio's output stream is not `Send`),
//! started the first time a song is played. The dispatch loop talks to it
//! with request/reply messages.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::sync::LazyLock;

use regex::Regex;
use rodio::{Decoder, OutputStream, Sink};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use super::contacts::similarity;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac", "m4a"];

/// Songs scoring below this are not candidates at all.
pub const CANDIDATE_THRESHOLD: u8 = 60;
/// Only a match above this is played locally.
pub const PLAY_THRESHOLD: u8 = 80;

const VOLUME_STEP: f32 = 0.1;

static TITLE_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\(official[^)]*\)|official (audio|video)").expect("title noise pattern")
});

/// Best similarity (0..=100) of the shorter string against every window of
/// the longer one.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    if short.is_empty() {
        return 0;
    }
    let long: Vec<char> = long.chars().collect();
    let width = short.chars().count();
    let best = long
        .windows(width)
        .map(|w| similarity(&short, &w.iter().collect::<String>()))
        .fold(0.0, f64::max);
    (best * 100.0).round() as u8
}

/// Song title from a file name, without "(official video)"-style noise.
pub fn song_title(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let title = stem.replace(['_', '-'], " ");
    let title = TITLE_NOISE.replace_all(&title, " ");
    title.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn step_volume(current: f32, up: bool) -> f32 {
    let next = if up { current + VOLUME_STEP } else { current - VOLUME_STEP };
    (next.clamp(0.0, 1.0) * 10.0).round() / 10.0
}

pub struct MusicLibrary {
    dir: PathBuf,
}

impl MusicLibrary {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Audio files in the library directory, sorted by name.
    pub fn songs(&self) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            debug!(dir = %self.dir.display(), "Music directory not readable");
            return Vec::new();
        };
        let mut songs: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| AUDIO_EXTENSIONS.contains(&e.to_lowercase().as_str()))
            })
            .collect();
        songs.sort();
        songs
    }

    /// Best matching song at or above the candidate threshold.
    pub fn find(&self, query: &str) -> Option<(PathBuf, u8)> {
        let mut best: Option<(PathBuf, u8)> = None;
        for song in self.songs() {
            let score = partial_ratio(query, &song_title(&song));
            if score >= CANDIDATE_THRESHOLD && best.as_ref().map_or(true, |(_, s)| score > *s) {
                best = Some((song, score));
            }
        }
        best
    }
}

enum PlayerCommand {
    Play(PathBuf),
    Pause,
    Resume,
    Stop,
    Volume(f32),
}

struct PlayerRequest {
    command: PlayerCommand,
    /// `Ok(false)` when there was nothing to act on.
    reply: oneshot::Sender<anyhow::Result<bool>>,
}

pub struct MusicPlayer {
    library: MusicLibrary,
    tx: Option<std_mpsc::Sender<PlayerRequest>>,
    current: Option<PathBuf>,
    volume: f32,
}

impl MusicPlayer {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            library: MusicLibrary::new(dir),
            tx: None,
            current: None,
            volume: 1.0,
        }
    }

    pub fn library(&self) -> &MusicLibrary {
        &self.library
    }

    pub fn now_playing(&self) -> Option<String> {
        self.current.as_deref().map(song_title)
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    fn sender(&mut self) -> anyhow::Result<&std_mpsc::Sender<PlayerRequest>> {
        if self.tx.is_none() {
            let (tx, rx) = std_mpsc::channel();
            let volume = self.volume;
            std::thread::Builder::new()
                .name("music".into())
                .spawn(move || player_thread(rx, volume))?;
            self.tx = Some(tx);
        }
        self.tx
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Music player unavailable"))
    }

    async fn request(&mut self, command: PlayerCommand) -> anyhow::Result<bool> {
        let (reply, rx) = oneshot::channel();
        let request = PlayerRequest { command, reply };
        if self.sender()?.send(request).is_err() {
            self.tx = None;
            anyhow::bail!("Music player stopped");
        }
        rx.await
            .map_err(|_| anyhow::anyhow!("Music player stopped"))?
    }

    /// Start playing a library file.
    pub async fn play(&mut self, song: PathBuf) -> anyhow::Result<String> {
        let title = song_title(&song);
        self.request(PlayerCommand::Play(song.clone())).await?;
        self.current = Some(song);
        info!(title = %title, "Playing");
        Ok(title)
    }

    /// Play the song after the current one, wrapping around.
    pub async fn next(&mut self) -> anyhow::Result<Option<String>> {
        let songs = self.library.songs();
        if songs.is_empty() {
            return Ok(None);
        }
        let next = match self.current.as_ref().and_then(|c| songs.iter().position(|s| s == c)) {
            Some(i) => songs[(i + 1) % songs.len()].clone(),
            None => songs[0].clone(),
        };
        self.play(next).await.map(Some)
    }

    pub async fn pause(&mut self) -> anyhow::Result<bool> {
        if self.tx.is_none() {
            return Ok(false);
        }
        self.request(PlayerCommand::Pause).await
    }

    pub async fn resume(&mut self) -> anyhow::Result<bool> {
        if self.tx.is_none() {
            return Ok(false);
        }
        self.request(PlayerCommand::Resume).await
    }

    pub async fn stop(&mut self) -> anyhow::Result<bool> {
        if self.tx.is_none() {
            return Ok(false);
        }
        let stopped = self.request(PlayerCommand::Stop).await?;
        self.current = None;
        Ok(stopped)
    }

    /// Step the volume by one notch. Returns the new level.
    pub async fn change_volume(&mut self, up: bool) -> anyhow::Result<f32> {
        self.volume = step_volume(self.volume, up);
        if self.tx.is_some() {
            self.request(PlayerCommand::Volume(self.volume)).await?;
        }
        Ok(self.volume)
    }
}

fn player_thread(rx: std_mpsc::Receiver<PlayerRequest>, mut volume: f32) {
    let stream = OutputStream::try_default();
    let handle = match &stream {
        Ok((_stream, handle)) => Some(handle.clone()),
        Err(e) => {
            error!("Failed to open music output: {}", e);
            None
        }
    };
    let mut sink: Option<Sink> = None;

    for PlayerRequest { command, reply } in rx {
        let result = match (command, &handle) {
            (PlayerCommand::Play(path), Some(handle)) => {
                if let Some(old) = sink.take() {
                    old.stop();
                }
                open_song(&path, handle, volume).map(|s| {
                    sink = Some(s);
                    true
                })
            }
            (PlayerCommand::Play(_), None) => Err(anyhow::anyhow!("No audio output device")),
            (PlayerCommand::Pause, _) => Ok(sink.as_ref().is_some_and(|s| {
                s.pause();
                !s.empty()
            })),
            (PlayerCommand::Resume, _) => Ok(sink.as_ref().is_some_and(|s| {
                s.play();
                !s.empty()
            })),
            (PlayerCommand::Stop, _) => Ok(sink.take().is_some_and(|s| {
                let was_playing = !s.empty();
                s.stop();
                was_playing
            })),
            (PlayerCommand::Volume(level), _) => {
                volume = level;
                if let Some(s) = &sink {
                    s.set_volume(level);
                }
                Ok(true)
            }
        };
        if let Err(e) = &result {
            warn!("Music player: {}", e);
        }
        let _ = reply.send(result);
    }
    debug!("Music thread exiting");
}

fn open_song(path: &Path, handle: &rodio::OutputStreamHandle, volume: f32) -> anyhow::Result<Sink> {
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("Cannot open {}: {}", path.display(), e))?;
    let source = Decoder::new(BufReader::new(file))
        .map_err(|e| anyhow::anyhow!("Cannot decode {}: {}", path.display(), e))?;
    let sink = Sink::try_new(handle).map_err(|e| anyhow::anyhow!("Failed to create sink: {}", e))?;
    sink.set_volume(volume);
    sink.append(source);
    Ok(sink)
}
