use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use log::{error, trace, warn};

use crate::protocol::{Command, Message};
use crate::registry::FieldId;

/// Where the native widget lives, picked once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// No native widget; the managed element edits text itself.
    Editor,
    Android,
    Ios,
}

impl Platform {
    pub fn has_native_widget(self) -> bool {
        !matches!(self, Platform::Editor)
    }

    /// Touch-driven platforms dismiss the keyboard on taps outside a field.
    pub fn is_touch(self) -> bool {
        self.has_native_widget()
    }
}

/// The component owning the real platform widgets.
///
/// Delivery is fire-and-forget: nothing here waits for the peer to act.
pub trait NativePeer {
    fn platform(&self) -> Platform;

    fn execute(&mut self, id: FieldId, message: Message);
}

pub fn send(peer: &mut dyn NativePeer, id: FieldId, command: &Command) {
    match command.encode(id) {
        Ok(message) => {
            trace!("-> {} id={id}", command.kind());
            peer.execute(id, message);
        }
        Err(err) => error!("failed to encode {} for field {id}: {err}", command.kind()),
    }
}

/// Peer for platforms without native widgets. Commands go nowhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct EditorPeer;

impl NativePeer for EditorPeer {
    fn platform(&self) -> Platform {
        Platform::Editor
    }

    fn execute(&mut self, _id: FieldId, _message: Message) {}
}

/// Peer reached through serialized JSON payloads on a bounded queue.
///
/// The receiving end usually feeds [`crate::transport::writer_loop`].
#[derive(Debug)]
pub struct MessagingPeer {
    platform: Platform,
    tx: SyncSender<Vec<u8>>,
    queue_capacity: usize,
    dropped: u64,
}

impl MessagingPeer {
    pub fn channel(platform: Platform, queue_capacity: usize) -> (Self, Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::sync_channel(queue_capacity);
        (
            Self {
                platform,
                tx,
                queue_capacity,
                dropped: 0,
            },
            rx,
        )
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl NativePeer for MessagingPeer {
    fn platform(&self) -> Platform {
        self.platform
    }

    fn execute(&mut self, id: FieldId, message: Message) {
        let payload = match serde_json::to_vec(&message) {
            Ok(payload) => payload,
            Err(err) => {
                error!("failed to serialize message for field {id}: {err}");
                return;
            }
        };

        match self.tx.try_send(payload) {
            Ok(()) => {}
            Err(TrySendError::Full(_payload)) => {
                self.dropped += 1;
                if self.dropped == 1 || self.dropped.is_power_of_two() {
                    warn!(
                        "native outbound queue full (cap={}); dropped {} message(s)",
                        self.queue_capacity, self.dropped
                    );
                }
            }
            Err(TrySendError::Disconnected(_payload)) => {
                warn!("native peer disconnected; dropping message for field {id}");
            }
        }
    }
}
