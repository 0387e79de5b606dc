//! I2C chunked transport: writes split at `max_chunk` (hard-capped at 127),
//! reads driven by a zero-length "query" that reports the device's
//! `available` byte count, paced to avoid overrunning the device's
//! interrupt buffer.

use super::TransportOps;
use crate::error::{EngineError, ErrorKind};
use crate::platform::I2cPlatform;
use alloc::vec::Vec;

const HARD_MAX_CHUNK: u16 = 127;
const DEFAULT_MAX_CHUNK: u16 = 30;
const PACING_DELAY_MS: u32 = 6;
/// Chunks per write segment before the longer segment-level delay, mirroring
/// the serial transport's `SEGMENT_SIZE`/`SEGMENT_DELAY_MS` pair.
const CHUNKS_PER_SEGMENT: u32 = 8;
const SEGMENT_DELAY_MS: u32 = 50;
const POLL_DELAY_MS: u32 = 50;
const RESET_RETRIES: u32 = 3;
const DEFAULT_TIMEOUT_MS: u32 = 10_000;
const WEB_DEFAULT_TIMEOUT_MS: u32 = 90_000;
const GROWTH_CHUNK: usize = 250;

pub struct I2cTransport {
    pub addr: u8,
    pub max_chunk: u16,
    pub turbo: bool,
}

impl I2cTransport {
    pub fn new(addr: u8) -> Self {
        I2cTransport {
            addr,
            max_chunk: DEFAULT_MAX_CHUNK,
            turbo: false,
        }
    }

    fn chunk_cap(&self) -> u16 {
        self.max_chunk.min(HARD_MAX_CHUNK).max(1)
    }

    fn pace(&self, platform: &mut (impl I2cPlatform + ?Sized), ms: u32) {
        if !self.turbo {
            platform.delay_ms(ms);
        }
    }
}

impl<P: I2cPlatform + ?Sized> TransportOps<P> for I2cTransport {
    fn reset(&self, platform: &mut P) -> Result<(), EngineError> {
        if !platform.i2c_reset() {
            return Err(EngineError::new(ErrorKind::Io, "i2c reset failed"));
        }
        for _ in 0..RESET_RETRIES {
            let mut scratch = [0u8; 128];
            let mut ready = false;
            let mut req_len: u16 = 0;
            loop {
                let mut available = 0u16;
                self.pace(platform, PACING_DELAY_MS);
                let len = req_len.min(scratch.len() as u16);
                match platform.i2c_receive(self.addr, &mut scratch[..len as usize], req_len, &mut available) {
                    Ok(()) => {}
                    Err(_) => break,
                }
                if available == 0 {
                    ready = true;
                    break;
                }
                req_len = available.min(self.chunk_cap());
            }
            if ready {
                return Ok(());
            }
            platform.i2c_reset();
            platform.delay_ms(2000);
        }
        Err(EngineError::new(ErrorKind::Io, "notecard not responding"))
    }

    fn transmit(&self, platform: &mut P, data: &[u8]) -> Result<(), EngineError> {
        let mut sent = 0usize;
        let cap = self.chunk_cap() as usize;
        let mut chunk_count: u32 = 0;
        while sent < data.len() {
            let end = (sent + cap).min(data.len());
            platform
                .i2c_transmit(self.addr, &data[sent..end])
                .map_err(|_| EngineError::new(ErrorKind::Io, "i2c transmit failed"))?;
            sent = end;
            chunk_count += 1;
            self.pace(platform, PACING_DELAY_MS);
            if sent < data.len() && chunk_count % CHUNKS_PER_SEGMENT == 0 {
                self.pace(platform, SEGMENT_DELAY_MS);
            }
        }
        Ok(())
    }

    fn receive(&self, platform: &mut P, timeout_ms: u32) -> Result<Vec<u8>, EngineError> {
        let start = platform.get_ms();
        let mut buf: Vec<u8> = Vec::with_capacity(256);
        let mut received_newline = false;
        let mut next_chunk: u16 = 0;
        loop {
            let mut available = 0u16;
            self.pace(platform, PACING_DELAY_MS);
            if next_chunk > 0 {
                let needed = buf.len() + next_chunk as usize;
                if needed > buf.capacity() {
                    let grow = next_chunk as usize + GROWTH_CHUNK.max(next_chunk as usize);
                    buf.reserve(grow);
                }
                let old_len = buf.len();
                buf.resize(old_len + next_chunk as usize, 0);
                platform
                    .i2c_receive(self.addr, &mut buf[old_len..], next_chunk, &mut available)
                    .map_err(|_| EngineError::new(ErrorKind::Io, "i2c receive failed"))?;
                if buf.last() == Some(&b'\n') {
                    received_newline = true;
                }
            } else {
                let mut probe = [0u8; 0];
                platform
                    .i2c_receive(self.addr, &mut probe, 0, &mut available)
                    .map_err(|_| EngineError::new(ErrorKind::Io, "i2c query failed"))?;
            }
            next_chunk = available.min(self.chunk_cap());
            if next_chunk > 0 {
                continue;
            }
            if received_newline {
                return Ok(buf);
            }
            if platform.wrap_elapsed(start) >= timeout_ms {
                return Err(EngineError::new(
                    ErrorKind::IoTimeout,
                    "notecard request or response was lost",
                ));
            }
            platform.delay_ms(POLL_DELAY_MS);
        }
    }

    fn request_timeout_ms(&self, request_json: &str, default_ms: u32) -> u32 {
        if !request_json.contains("\"web.") {
            return if default_ms == 0 { DEFAULT_TIMEOUT_MS } else { default_ms };
        }
        if let Some(pos) = request_json.find("\"seconds\":") {
            let rest = &request_json[pos + "\"seconds\":".len()..];
            let digits: alloc::string::String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            if let Ok(seconds) = digits.parse::<u32>() {
                return seconds.saturating_mul(1000);
            }
        }
        WEB_DEFAULT_TIMEOUT_MS
    }
}
