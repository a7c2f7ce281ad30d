//! Request/response bridge to the embedding host.
//!
//! The host (the desktop shell that owns the window, file dialogs, and
//! title bar) is on the far side of a message channel. Every request
//! carries a fresh id; the bridge blocks on the reply with a matching
//! id under a deadline, and anything else that arrives while waiting —
//! host-initiated events, stale replies from timed-out requests — is
//! queued or dropped rather than misdelivered.
//!
//! Hosts encode "no payload" as the literal string `-Null-`; the
//! bridge maps that to `None` so callers never see the sentinel.

use std::collections::VecDeque;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::time::{Duration, Instant};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Host reply sentinel for an absent payload.
const NULL_PAYLOAD: &str = "-Null-";

/// A request on its way to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub id: u64,
    pub method: String,
    pub payload: Option<String>,
}

/// Anything the host sends back over the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Reply to a request, matched by id.
    Reply { id: u64, payload: String },
    /// Host-initiated event, delivered via [`HostBridge::poll_events`].
    Event(HostEvent),
}

/// Events the host raises on its own initiative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The open file changed on disk and should be re-read.
    Reload,
    /// The window wants to close; the host holds the close until it is
    /// told to proceed via `close_form`.
    Closing,
}

/// Bridge failures. Timeouts are expected operational noise (a host
/// dialog left open, a hung shell); the session logs and carries on.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("host did not reply to {method} within {timeout:?}")]
    Timeout { method: String, timeout: Duration },
    #[error("host channel closed")]
    Closed,
    #[error("host reply was empty where a payload was required")]
    EmptyReply,
    #[error("could not decode host reply: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Host environment description returned by `Home`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct HostInfo {
    #[serde(default)]
    pub args: Vec<String>,
    pub culture: String,
    pub executable_path: String,
    #[serde(rename = "LocalIPs", default)]
    pub local_ips: Vec<String>,
    pub machine_name: String,
    #[serde(rename = "OSVersion")]
    pub os_version: String,
    pub user_name: String,
    pub user_profile: String,
}

/// Client end of the host channel.
#[derive(Debug)]
pub struct HostBridge {
    tx: Sender<Request>,
    rx: Receiver<Inbound>,
    next_id: u64,
    timeout: Duration,
    pending_events: VecDeque<HostEvent>,
}

impl HostBridge {
    /// Wrap existing channel endpoints.
    pub const fn new(tx: Sender<Request>, rx: Receiver<Inbound>, timeout: Duration) -> Self {
        Self {
            tx,
            rx,
            next_id: 0,
            timeout,
            pending_events: VecDeque::new(),
        }
    }

    /// Create a bridge plus the host-side endpoints it talks to.
    pub fn channel(timeout: Duration) -> (Self, Receiver<Request>, Sender<Inbound>) {
        let (req_tx, req_rx) = channel();
        let (in_tx, in_rx) = channel();
        (Self::new(req_tx, in_rx, timeout), req_rx, in_tx)
    }

    /// Send a request and block for its reply, up to the configured
    /// timeout. Events arriving in the meantime are queued for
    /// [`poll_events`](Self::poll_events); replies to other ids are
    /// dropped.
    pub fn request(
        &mut self,
        method: &str,
        payload: Option<&str>,
    ) -> Result<Option<String>, BridgeError> {
        self.next_id += 1;
        let id = self.next_id;
        self.tx
            .send(Request {
                id,
                method: method.to_string(),
                payload: payload.map(ToString::to_string),
            })
            .map_err(|_| BridgeError::Closed)?;

        let deadline = Instant::now() + self.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(BridgeError::Timeout {
                    method: method.to_string(),
                    timeout: self.timeout,
                });
            }
            match self.rx.recv_timeout(remaining) {
                Ok(Inbound::Reply { id: reply_id, payload }) if reply_id == id => {
                    return Ok(decode_payload(payload));
                }
                Ok(Inbound::Reply { id: stale, .. }) => {
                    // Reply to a request that already timed out.
                    debug!(stale, awaiting = id, "dropping stale host reply");
                }
                Ok(Inbound::Event(event)) => {
                    self.pending_events.push_back(event);
                }
                Err(RecvTimeoutError::Timeout) => {
                    return Err(BridgeError::Timeout {
                        method: method.to_string(),
                        timeout: self.timeout,
                    });
                }
                Err(RecvTimeoutError::Disconnected) => return Err(BridgeError::Closed),
            }
        }
    }

    /// Drain host-initiated events without blocking.
    pub fn poll_events(&mut self) -> Vec<HostEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(Inbound::Event(event)) => self.pending_events.push_back(event),
                Ok(Inbound::Reply { id, .. }) => {
                    warn!(id, "dropping unsolicited host reply");
                }
                Err(_) => break,
            }
        }
        self.pending_events.drain(..).collect()
    }

    /// Ask the host to describe its environment.
    pub fn home(&mut self) -> Result<HostInfo, BridgeError> {
        let payload = self.request("Home", None)?.ok_or(BridgeError::EmptyReply)?;
        Ok(serde_json::from_str(&payload)?)
    }

    /// Read a file through the host. Empty reply means an empty file.
    pub fn read_file(&mut self, path: &str) -> Result<String, BridgeError> {
        Ok(self.request("ReadFile", Some(path))?.unwrap_or_default())
    }

    /// Write content through the host. An empty `path` asks the host
    /// to raise its save dialog; either way the reply is the resolved
    /// path the file actually landed at.
    pub fn write_file(&mut self, path: &str, content: &str) -> Result<String, BridgeError> {
        let body = serde_json::json!({ "Path": path, "Content": content });
        self.request("WriteFile", Some(&body.to_string()))?
            .ok_or(BridgeError::EmptyReply)
    }

    /// Set the window title.
    pub fn set_title(&mut self, title: &str) -> Result<(), BridgeError> {
        self.request("SetTitle", Some(title)).map(|_| ())
    }

    /// Tell the host to proceed with a held window close.
    pub fn close_form(&mut self) -> Result<(), BridgeError> {
        self.request("CloseForm", None).map(|_| ())
    }
}

/// Map the host's `-Null-` sentinel to `None`.
fn decode_payload(payload: String) -> Option<String> {
    if payload == NULL_PAYLOAD {
        None
    } else {
        Some(payload)
    }
}
