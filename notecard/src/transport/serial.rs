//! UART chunked transport: segment-paced writes, byte-at-a-time reads with
//! an outer "first byte" timeout and an inner "between byte" timeout, and a
//! `\n`-drain resync protocol.

use super::TransportOps;
use crate::error::{EngineError, ErrorKind};
use crate::platform::SerialPlatform;
use alloc::vec::Vec;

/// Bytes written per `serial_transmit` call before a pacing delay.
const SEGMENT_SIZE: usize = 250;
const SEGMENT_DELAY_MS: u32 = 50;
const RESET_DRAIN_MS: u32 = 500;
const RESET_RETRIES: u32 = 10;
const FIRST_BYTE_TIMEOUT_MS: u32 = 10_000;
const BETWEEN_BYTE_TIMEOUT_MS: u32 = 1_000;

pub struct SerialTransport {
    pub turbo: bool,
}

impl SerialTransport {
    pub fn new() -> Self {
        SerialTransport { turbo: false }
    }
}

impl Default for SerialTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SerialPlatform + ?Sized> TransportOps<P> for SerialTransport {
    fn reset(&self, platform: &mut P) -> Result<(), EngineError> {
        if !platform.serial_reset() {
            return Err(EngineError::new(ErrorKind::Io, "serial reset failed"));
        }
        for _ in 0..RESET_RETRIES {
            let _ = platform.serial_transmit(b"\n", true);
            let start = platform.get_ms();
            let mut saw_byte = false;
            let mut clean = true;
            while platform.wrap_elapsed(start) < RESET_DRAIN_MS {
                if platform.serial_available() {
                    let b = platform.serial_receive();
                    saw_byte = true;
                    if b != b'\n' && b != b'\r' {
                        clean = false;
                    }
                } else {
                    platform.delay_ms(5);
                }
            }
            if saw_byte && clean {
                return Ok(());
            }
            platform.serial_reset();
        }
        Err(EngineError::new(ErrorKind::Io, "notecard not responding"))
    }

    fn transmit(&self, platform: &mut P, data: &[u8]) -> Result<(), EngineError> {
        let mut sent = 0usize;
        while sent < data.len() {
            let end = (sent + SEGMENT_SIZE).min(data.len());
            platform
                .serial_transmit(&data[sent..end], end == data.len())
                .map_err(|_| EngineError::new(ErrorKind::Io, "serial transmit failed"))?;
            sent = end;
            if sent < data.len() && !self.turbo {
                platform.delay_ms(SEGMENT_DELAY_MS);
            }
        }
        Ok(())
    }

    fn receive(&self, platform: &mut P, timeout_ms: u32) -> Result<Vec<u8>, EngineError> {
        let outer_timeout = timeout_ms.min(FIRST_BYTE_TIMEOUT_MS).max(1);
        let mut buf = Vec::new();
        let start = platform.get_ms();
        loop {
            if platform.serial_available() {
                let b = platform.serial_receive();
                buf.push(b);
                if b == b'\n' {
                    return Ok(buf);
                }
            } else if buf.is_empty() {
                if platform.wrap_elapsed(start) >= outer_timeout {
                    return Err(EngineError::new(ErrorKind::IoTimeout, "no reply from card"));
                }
                platform.delay_ms(5);
            } else {
                let byte_start = platform.get_ms();
                let mut got_more = false;
                while platform.wrap_elapsed(byte_start) < BETWEEN_BYTE_TIMEOUT_MS {
                    if platform.serial_available() {
                        got_more = true;
                        break;
                    }
                    platform.delay_ms(2);
                }
                if !got_more {
                    return Err(EngineError::new(
                        ErrorKind::IoTimeout,
                        "reply truncated between bytes",
                    ));
                }
            }
        }
    }
}
