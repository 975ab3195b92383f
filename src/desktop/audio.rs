//! Sound playback through an external player command
//!
//! A "document" is a worker task that owns playback; it is created on first
//! use and receives play requests as `HostMessage`s.

use crate::core::state::Sound;
use crate::error::PlatformError;
use crate::platform::{AudioHost, HostMessage};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Player commands, run from the assets directory
#[derive(Debug, Clone)]
pub struct PlayerCommands {
    pub on: Vec<String>,
    pub off: Vec<String>,
    pub working_dir: PathBuf,
}

impl PlayerCommands {
    fn for_sound(&self, sound: Sound) -> &[String] {
        match sound {
            Sound::On => &self.on,
            Sound::Off => &self.off,
        }
    }
}

pub struct CommandAudioHost {
    commands: Arc<PlayerCommands>,
    documents: Mutex<HashMap<String, mpsc::UnboundedSender<HostMessage>>>,
}

impl CommandAudioHost {
    pub fn new(commands: PlayerCommands) -> Self {
        Self {
            commands: Arc::new(commands),
            documents: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl AudioHost for CommandAudioHost {
    async fn has_document(&self, path: &str) -> Result<bool, PlatformError> {
        Ok(self
            .documents
            .lock()
            .get(path)
            .is_some_and(|tx| !tx.is_closed()))
    }

    async fn create_document(&self, path: &str) -> Result<(), PlatformError> {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(run_document(path.to_string(), Arc::clone(&self.commands), rx));
        self.documents.lock().insert(path.to_string(), tx);
        info!("Created audio document {}", path);
        Ok(())
    }

    fn send(&self, message: HostMessage) -> Result<(), PlatformError> {
        let mut documents = self.documents.lock();
        documents.retain(|_, tx| !tx.is_closed());
        if documents.is_empty() {
            return Err(PlatformError::Unavailable("audio document"));
        }
        for tx in documents.values() {
            let _ = tx.send(message.clone());
        }
        Ok(())
    }
}

async fn run_document(
    path: String,
    commands: Arc<PlayerCommands>,
    mut rx: mpsc::UnboundedReceiver<HostMessage>,
) {
    while let Some(message) = rx.recv().await {
        if message.target != HostMessage::OFFSCREEN || message.kind != HostMessage::PLAY_SOUND {
            debug!("Audio document {} ignoring {:?}", path, message);
            continue;
        }
        play(&commands, message.sound).await;
    }
    debug!("Audio document {} closed", path);
}

async fn play(commands: &PlayerCommands, sound: Sound) {
    let argv = commands.for_sound(sound);
    let Some((program, args)) = argv.split_first() else {
        return;
    };

    let status = Command::new(program)
        .args(args)
        .current_dir(&commands.working_dir)
        .kill_on_drop(true)
        .status()
        .await;

    match status {
        Ok(status) if status.success() => debug!("Played {:?} sound", sound),
        Ok(status) => warn!("Player for {:?} sound exited with {}", sound, status),
        Err(e) => warn!("Failed to run player for {:?} sound: {}", sound, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn host() -> CommandAudioHost {
        CommandAudioHost::new(PlayerCommands {
            on: Vec::new(),
            off: Vec::new(),
            working_dir: std::env::temp_dir(),
        })
    }

    #[tokio::test]
    async fn test_document_lifecycle() {
        let audio = host();
        assert!(!audio.has_document("offscreen.html").await.unwrap());

        audio.create_document("offscreen.html").await.unwrap();
        assert!(audio.has_document("offscreen.html").await.unwrap());
        assert!(audio.send(HostMessage::play_sound(Sound::On)).is_ok());
    }

    #[tokio::test]
    async fn test_send_without_document_fails() {
        let audio = host();
        let err = audio.send(HostMessage::play_sound(Sound::Off)).unwrap_err();
        assert!(matches!(err, PlatformError::Unavailable(_)));
    }
}
