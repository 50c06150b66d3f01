//! Audio system for background music and sound effects

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sfx {
    Rotate,
    Clear,
}

impl Sfx {
    fn filename(&self) -> &'static str {
        match self {
            Sfx::Rotate => "rotate.mp3",
            Sfx::Clear => "clear.mp3",
        }
    }
}

const MUSIC_FILE: &str = "music.mp3";

/// Something that can play sound effect triggers
///
/// The game never waits on playback and never learns whether it worked.
pub trait SoundSink {
    fn play(&mut self, sfx: Sfx);
}

/// Audio manager handles all sound playback
pub struct AudioManager {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    music_sink: Option<Sink>,
    sounds_path: PathBuf,
    music_volume: f32,
    sfx_volume: f32,
}

impl AudioManager {
    /// Open the default output device and locate the sound files
    ///
    /// Returns `None` when either is unavailable; the game runs silent.
    pub fn new() -> Option<Self> {
        let (stream, stream_handle) = match OutputStream::try_default() {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!("No audio output device: {}", e);
                return None;
            }
        };
        let Some(sounds_path) = Self::find_sounds_path() else {
            tracing::warn!("No sounds directory found, audio disabled");
            return None;
        };
        tracing::info!("Loading sounds from {}", sounds_path.display());

        Some(Self {
            _stream: stream,
            stream_handle,
            music_sink: None,
            sounds_path,
            music_volume: 0.25,
            sfx_volume: 0.5,
        })
    }

    fn find_sounds_path() -> Option<PathBuf> {
        let mut paths = vec![PathBuf::from("sounds")];
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            paths.push(dir.join("sounds"));
        }

        paths.into_iter().find(|p| p.is_dir())
    }

    /// Set music volume (0.0 to 1.0)
    pub fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.music_sink {
            sink.set_volume(self.music_volume);
        }
    }

    /// Set SFX volume (0.0 to 1.0)
    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.sfx_volume = volume.clamp(0.0, 1.0);
    }

    /// Start the background music, looping indefinitely
    pub fn play_music(&mut self) {
        if self.music_sink.is_some() {
            return;
        }

        let path = self.sounds_path.join(MUSIC_FILE);
        let Ok(file) = File::open(&path) else {
            tracing::warn!("Could not open {}", path.display());
            return;
        };
        let Ok(sink) = Sink::try_new(&self.stream_handle) else { return };
        let Ok(decoder) = Decoder::new(BufReader::new(file)) else {
            tracing::warn!("Could not decode {}", path.display());
            return;
        };

        sink.set_volume(self.music_volume);
        sink.append(decoder.repeat_infinite());
        self.music_sink = Some(sink);
    }

    /// Pause background music
    pub fn pause_music(&mut self) {
        if let Some(sink) = &self.music_sink {
            sink.pause();
        }
    }

    /// Resume background music
    pub fn resume_music(&mut self) {
        if let Some(sink) = &self.music_sink {
            sink.play();
        }
    }

    /// Play a sound effect
    pub fn play_sfx(&mut self, sfx: Sfx) {
        if self.sfx_volume <= 0.0 {
            return;
        }

        let path = self.sounds_path.join(sfx.filename());
        if let Ok(file) = File::open(&path) {
            if let Ok(decoder) = Decoder::new(BufReader::new(file)) {
                if let Ok(sink) = Sink::try_new(&self.stream_handle) {
                    sink.set_volume(self.sfx_volume);
                    sink.append(decoder);
                    sink.detach(); // Let it play and clean up automatically
                }
            }
        }
    }
}

impl SoundSink for AudioManager {
    fn play(&mut self, sfx: Sfx) {
        self.play_sfx(sfx);
    }
}

impl SoundSink for Option<AudioManager> {
    fn play(&mut self, sfx: Sfx) {
        if let Some(audio) = self {
            audio.play_sfx(sfx);
        }
    }
}

impl SoundSink for Vec<Sfx> {
    fn play(&mut self, sfx: Sfx) {
        self.push(sfx);
    }
}
