// src/dev/reload.rs

//! Live-reload capability and its TCP implementation.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::errors::Result;

/// Transport contract for notifying connected viewers after a rebuild.
pub trait LiveReload: Send + Sync {
    /// Start accepting viewer connections on `port`.
    fn listen(&self, port: u16) -> Result<()>;

    /// Tell every connected viewer which artifacts changed. Paths are
    /// relative to the artifact tree the viewers load from.
    fn notify(&self, files: &[PathBuf]) -> Result<()>;
}

/// Line-delimited JSON over TCP: each notification is one
/// `{"files": [...]}` line pushed to every connected client.
pub struct TcpReloadServer {
    clients: broadcast::Sender<String>,
    listening: AtomicBool,
}

impl TcpReloadServer {
    pub fn new() -> Self {
        let (clients, _) = broadcast::channel(16);
        Self {
            clients,
            listening: AtomicBool::new(false),
        }
    }
}

impl Default for TcpReloadServer {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveReload for TcpReloadServer {
    fn listen(&self, port: u16) -> Result<()> {
        // Idempotent: a second listen on the same instance is a no-op.
        if self.listening.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        let clients = self.clients.clone();
        tokio::spawn(async move {
            let listener = match TcpListener::bind(("127.0.0.1", port)).await {
                Ok(listener) => listener,
                Err(err) => {
                    warn!(port, error = %err, "live-reload listener failed to bind");
                    return;
                }
            };
            info!(port, "live-reload listening");

            loop {
                let (mut socket, peer) = match listener.accept().await {
                    Ok(accepted) => accepted,
                    Err(err) => {
                        warn!(error = %err, "live-reload accept failed");
                        continue;
                    }
                };
                debug!(%peer, "live-reload client connected");

                let mut rx = clients.subscribe();
                tokio::spawn(async move {
                    while let Ok(line) = rx.recv().await {
                        if socket.write_all(line.as_bytes()).await.is_err() {
                            break;
                        }
                    }
                    debug!(%peer, "live-reload client disconnected");
                });
            }
        });

        Ok(())
    }

    fn notify(&self, files: &[PathBuf]) -> Result<()> {
        let files: Vec<String> = files
            .iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect();
        let mut line = serde_json::to_string(&serde_json::json!({ "files": files }))?;
        line.push('\n');

        debug!(clients = self.clients.receiver_count(), ?files, "live-reload notify");
        // No receivers just means nobody is connected yet.
        let _ = self.clients.send(line);
        Ok(())
    }
}
