//! The engine's internal error algebra. Every public entry point still
//! returns a [`Node`](notecard_json::Node) response document (synthesizing
//! one from an [`EngineError`] at the boundary) so application code only
//! ever inspects `err` fields -- but internally, code matches on
//! [`ErrorKind`] rather than on the legacy brace-tag substrings the wire
//! format carries.

use alloc::string::String;
use notecard_json::Node;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorKind {
    #[error("insufficient memory")]
    Mem,
    #[error("transport i/o error")]
    Io,
    #[error("transport timed out")]
    IoTimeout,
    #[error("protocol violation")]
    IoBad,
    #[error("binary payload corrupted")]
    BadBin,
    #[error("could not parse response")]
    Parse,
    #[error("precondition violated")]
    Logic,
}

impl ErrorKind {
    /// The brace-delimited fault tag this kind serializes to on the wire,
    /// matching the convention existing device firmware and application
    /// code already matches on.
    pub fn tag(&self) -> &'static str {
        match self {
            ErrorKind::Mem => "{mem}",
            ErrorKind::Io => "{io}",
            ErrorKind::IoTimeout => "{io-timeout}",
            ErrorKind::IoBad => "{io-bad}",
            ErrorKind::BadBin => "{bad-bin}",
            ErrorKind::Parse => "",
            ErrorKind::Logic => "",
        }
    }

    /// Whether the transaction engine should retry a transaction that
    /// failed with this kind.
    pub fn retry_eligible(&self) -> bool {
        matches!(self, ErrorKind::Io | ErrorKind::IoTimeout | ErrorKind::BadBin)
    }

    /// Whether this kind should latch `reset_required` for the next
    /// transaction.
    pub fn latches_reset(&self) -> bool {
        matches!(
            self,
            ErrorKind::Io | ErrorKind::IoTimeout | ErrorKind::IoBad | ErrorKind::Parse
        )
    }
}

#[derive(Debug, Clone)]
pub struct EngineError {
    pub kind: ErrorKind,
    pub detail: String,
    pub id: Option<Node>,
}

impl EngineError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        EngineError {
            kind,
            detail: detail.into(),
            id: None,
        }
    }

    pub fn with_id(mut self, id: Option<Node>) -> Self {
        self.id = id;
        self
    }

    /// Serializes this error to the `{"err": ..., "src": "note-c"}` shape
    /// every user-facing failure path returns.
    pub fn to_response(&self) -> Node {
        let mut response = Node::object();
        let message = if self.kind.tag().is_empty() {
            self.detail.clone()
        } else {
            self.detail.clone() + " " + self.kind.tag()
        };
        response.set("err", Node::string(message));
        response.set("src", Node::string("note-c"));
        if let Some(id) = &self.id {
            response.set("id", id.clone());
        }
        response
    }
}

impl core::fmt::Display for EngineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.kind, self.detail)
    }
}

/// Classifies a device-returned `err` string by the fault tags it carries,
/// mirroring `NoteErrorContains`/the engine's retry gate.
pub fn classify_response_error(err: &str) -> Option<ErrorKind> {
    if err.contains("{bad-bin}") {
        Some(ErrorKind::BadBin)
    } else if err.contains("{io-timeout}") {
        Some(ErrorKind::IoTimeout)
    } else if err.contains("{io-bad}") {
        Some(ErrorKind::IoBad)
    } else if err.contains("{io}") {
        Some(ErrorKind::Io)
    } else {
        None
    }
}
