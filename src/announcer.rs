// src/announcer.rs - Spoken token announcements
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{AnnouncerConfig, AnnouncerMode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Announcement {
    pub counter: u32,
    pub token: u64,
}

impl Announcement {
    pub fn phrase(&self) -> String {
        format!("Token number {}, please proceed to counter {}", self.token, self.counter)
    }
}

/// Something that can voice an announcement.
#[async_trait]
pub trait Announcer: Send + Sync {
    async fn announce(&self, announcement: &Announcement) -> Result<()>;
}

/// Writes the phrase to the log. Used where no speech output is attached.
pub struct LogAnnouncer;

#[async_trait]
impl Announcer for LogAnnouncer {
    async fn announce(&self, announcement: &Announcement) -> Result<()> {
        log::info!("🔊 {}", announcement.phrase());
        Ok(())
    }
}

/// Runs an external text-to-speech program with the phrase as last argument.
pub struct CommandAnnouncer {
    program: String,
    args: Vec<String>,
}

impl CommandAnnouncer {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl Announcer for CommandAnnouncer {
    async fn announce(&self, announcement: &Announcement) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(announcement.phrase())
            .status()
            .await
            .with_context(|| format!("Failed to start '{}'", self.program))?;

        if !status.success() {
            anyhow::bail!("'{}' exited with {}", self.program, status);
        }
        Ok(())
    }
}

pub fn from_config(config: &AnnouncerConfig) -> Arc<dyn Announcer> {
    match config.mode {
        AnnouncerMode::Log => Arc::new(LogAnnouncer),
        AnnouncerMode::Command => Arc::new(CommandAnnouncer::new(
            config.command.clone(),
            config.args.clone(),
        )),
    }
}

/// Sending half handed to the board. Sending never blocks and never fails
/// the caller.
#[derive(Clone)]
pub struct AnnouncementSender {
    tx: mpsc::UnboundedSender<Announcement>,
}

impl AnnouncementSender {
    pub fn send(&self, announcement: Announcement) {
        if let Err(e) = self.tx.send(announcement) {
            tracing::warn!(counter = e.0.counter, token = e.0.token, "announcer is gone, dropping announcement");
        }
    }
}

/// Starts the worker that voices announcements one after another.
pub fn spawn_announcer(announcer: Arc<dyn Announcer>) -> (AnnouncementSender, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Announcement>();

    let handle = tokio::spawn(async move {
        while let Some(announcement) = rx.recv().await {
            if let Err(e) = announcer.announce(&announcement).await {
                tracing::warn!(
                    counter = announcement.counter,
                    token = announcement.token,
                    "announcement failed: {:#}",
                    e
                );
            }
        }
        tracing::debug!("announcer worker stopped");
    });

    (AnnouncementSender { tx }, handle)
}
