//! Idle-timeout handle for persistent lobbies.
//!
//! A persistent lobby with an idle timeout arms this one-shot timer when its
//! last client leaves. The fire task holds only a weak lobby reference: if
//! the lobby is gone by the time the timer fires, the task exits silently.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;

use super::WeakLobby;

#[derive(Debug, Default)]
pub struct IdleTimer {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl IdleTimer {
    /// Schedule removal of the lobby after `timeout`. Re-arming replaces any
    /// pending timer.
    pub fn arm(&self, lobby: WeakLobby, timeout: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no async runtime; idle timeout not scheduled");
            return;
        };
        let mut task = self.task.lock();
        if let Some(previous) = task.take() {
            previous.abort();
        }
        *task = Some(runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            let Some(lobby) = lobby.upgrade() else {
                return;
            };
            let (lobby_id, server_state, occupied) = {
                let lobby = lobby.read();
                (
                    lobby.lobby_id,
                    lobby.server_state_weak(),
                    lobby.count_clients(),
                )
            };
            if occupied == 0 {
                tracing::info!(lobby_id, "idle timeout expired");
                if let Some(server_state) = server_state.upgrade() {
                    server_state.remove_lobby(lobby_id);
                }
            } else {
                tracing::warn!(lobby_id, occupied, "idle timeout fired with clients present");
            }
        }));
    }

    /// Cancel any pending timer. Returns whether one was actually pending.
    pub fn disarm(&self) -> bool {
        match self.task.lock().take() {
            Some(task) => {
                let was_pending = !task.is_finished();
                task.abort();
                was_pending
            }
            None => false,
        }
    }
}
