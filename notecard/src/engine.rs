//! The transaction engine: reset-on-demand, device-locked request/response
//! round trips, `cmd` fire-and-forget dispatch, and the `{io}`/`{bad-bin}`
//! retry policy.

use crate::backoff::Backoff;
use crate::error::{classify_response_error, EngineError, ErrorKind};
use crate::platform::Platform;
use crate::transport::TransportOps;
use crate::Trace;
use alloc::string::{String, ToString};
use notecard_json::{parser, printer, Node};

const MAX_IO_RETRIES: usize = 3;
const MAX_BAD_BIN_RETRIES: usize = 3;
const DEFAULT_TRANSACTION_TIMEOUT_MS: u32 = 10_000;

/// Composes a platform binding set with an active transport. Generic over
/// both so the reset/lock/retry orchestration below is written once and
/// reused for serial and I2C alike.
pub struct Notecard<P, T> {
    pub(crate) platform: P,
    pub(crate) transport: T,
    reset_required: bool,
    crc_sequence: u32,
    crc_enabled: bool,
}

impl<P: Platform, T: TransportOps<P>> Notecard<P, T> {
    pub fn new(platform: P, transport: T) -> Self {
        Notecard {
            platform,
            transport,
            reset_required: true,
            crc_sequence: 0,
            crc_enabled: false,
        }
    }

    pub fn enable_crc(&mut self, enabled: bool) {
        self.crc_enabled = enabled;
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    /// Runs one request/response (or fire-and-forget `cmd`) transaction,
    /// always returning a response document: on failure, a synthesized
    /// `{"err": ...}` object rather than a `Result`, matching the source
    /// library's "errors are just another response field" contract.
    pub fn transaction(&mut self, request: Node) -> Node {
        self.platform.lock_device();
        let response = self.transaction_locked(request);
        self.platform.unlock_device();
        response
    }

    /// Runs one transaction assuming the caller already holds the device
    /// lock; used directly by [`Self::transaction`] and, for a whole batch
    /// under a single lock, by [`Self::request_response_json`].
    fn transaction_locked(&mut self, request: Node) -> Node {
        let id = request.get("id").cloned();
        let is_command = !request.is_present("req") && request.is_present("cmd");

        let mut backoff = Backoff::new(if is_command { 0 } else { MAX_IO_RETRIES });
        let mut bad_bin_backoff = Backoff::new(MAX_BAD_BIN_RETRIES);

        loop {
            match self.perform_once(&request, is_command) {
                Ok(response) => {
                    if let Some(err) = response_err(&response) {
                        match classify_response_error(&err) {
                            Some(ErrorKind::BadBin) if bad_bin_backoff.wait(&mut self.platform) => {
                                ringbuf::ringbuf_entry_root!(Trace::Retry { attempt: 1 });
                                continue;
                            }
                            Some(ErrorKind::Io) if backoff.wait(&mut self.platform) => {
                                ringbuf::ringbuf_entry_root!(Trace::Retry { attempt: 2 });
                                continue;
                            }
                            _ => return response,
                        }
                    }
                    return response;
                }
                Err(e) => {
                    if e.kind.latches_reset() {
                        self.reset_required = true;
                    }
                    if e.kind.retry_eligible() && backoff.wait(&mut self.platform) {
                        ringbuf::ringbuf_entry_root!(Trace::Retry { attempt: 3 });
                        continue;
                    }
                    return e.with_id(id).to_response();
                }
            }
        }
    }

    /// Runs one attempt, assuming the device lock is already held by the
    /// caller (either [`Self::transaction`] or a whole-pipeline caller).
    fn perform_once(&mut self, request: &Node, is_command: bool) -> Result<Node, EngineError> {
        if self.reset_required {
            self.reset_required = false;
            ringbuf::ringbuf_entry_root!(Trace::Reset);
            self.transport.reset(&mut self.platform)?;
        }

        self.run_locked(request, is_command)
    }

    fn run_locked(&mut self, request: &Node, is_command: bool) -> Result<Node, EngineError> {
        self.platform
            .transaction_start(DEFAULT_TRANSACTION_TIMEOUT_MS)
            .map_err(|_| EngineError::new(ErrorKind::Io, "card not ready"))?;

        let mut outgoing = request.clone();
        if outgoing.get_string("req") == "hub.set" && outgoing.is_present("product") {
            if let Some(agent) = self.platform.user_agent() {
                outgoing.merge(agent);
            }
        }
        if self.crc_enabled {
            self.crc_sequence = self.crc_sequence.wrapping_add(1);
            let body = printer::print(&outgoing);
            outgoing.set("crc", Node::string(crc_tag(self.crc_sequence, &body)));
        }

        let mut json = printer::print(&outgoing);
        json.push('\n');

        let timeout_ms = derive_timeout_ms(request);
        let timeout_ms = self.transport.request_timeout_ms(&json, timeout_ms);

        ringbuf::ringbuf_entry_root!(Trace::Transmit { len: json.len() as u16 });
        self.transport.transmit(&mut self.platform, json.as_bytes())?;

        self.platform.transaction_stop();

        if is_command {
            return Ok(Node::object());
        }

        let raw = self.transport.receive(&mut self.platform, timeout_ms)?;
        ringbuf::ringbuf_entry_root!(Trace::Receive { len: raw.len() as u16 });

        let text = core::str::from_utf8(&raw)
            .map_err(|_| EngineError::new(ErrorKind::Parse, "unrecognized response from card"))?;
        let mut response = parser::parse(text.trim_end_matches(['\n', '\r']))
            .map_err(|_| EngineError::new(ErrorKind::Parse, "unrecognized response from card"))?;

        if self.crc_enabled && response.is_present("crc") {
            let received_tag = response.get_string("crc").to_string();
            response.delete("crc");
            let body = printer::print(&response);
            if received_tag != crc_tag(self.crc_sequence, &body) {
                return Err(EngineError::new(ErrorKind::Io, "crc mismatch"));
            }
        }
        Ok(response)
    }

    /// Raw newline-delimited JSON variant: detects `cmd` vs `req` per
    /// document and pipes a whole batch through a single device lock,
    /// returning the last document's raw response text.
    pub fn request_response_json(&mut self, raw: &str) -> String {
        self.platform.lock_device();
        let mut last = Node::object();
        for line in raw.lines().filter(|l| !l.trim().is_empty()) {
            match parser::parse(line) {
                Ok(doc) => last = self.transaction_locked(doc),
                Err(_) => {
                    last = EngineError::new(ErrorKind::Parse, "unrecognized request").to_response();
                }
            }
        }
        self.platform.unlock_device();
        printer::print(&last)
    }
}

fn response_err(response: &Node) -> Option<String> {
    if response.is_present("err") {
        Some(response.get_string("err").to_string())
    } else {
        None
    }
}

fn derive_timeout_ms(request: &Node) -> u32 {
    if request.is_present("milliseconds") {
        request.get_int("milliseconds").max(0) as u32
    } else if request.is_present("seconds") {
        (request.get_int("seconds").max(0) as u32).saturating_mul(1000)
    } else {
        DEFAULT_TRANSACTION_TIMEOUT_MS
    }
}

/// Wire-integrity tag: `"<seq>:<fletcher16 of the body, hex>"`, where body
/// is the outgoing/incoming document serialized without the `crc` field
/// itself.
fn crc_tag(seq: u32, body: &str) -> String {
    let checksum = fletcher::calc_fletcher16(body.as_bytes());
    alloc::format!("{}:{:04x}", seq, checksum)
}
