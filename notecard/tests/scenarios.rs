//! End-to-end scenarios exercised against the public API, covering the
//! cases not already pinned down by a module's inline unit tests: I2C
//! chunk-overflow reassembly and the `web.*` timeout override.

use notecard::{I2cPlatform, I2cTransport, Platform, PlatformResult, TransportOps};

struct MockI2c {
    clock: u32,
    remaining: Vec<u8>,
}

impl MockI2c {
    fn new(payload: Vec<u8>) -> Self {
        MockI2c { clock: 0, remaining: payload }
    }
}

impl Platform for MockI2c {
    fn get_ms(&self) -> u32 {
        self.clock
    }
    fn delay_ms(&mut self, ms: u32) {
        self.clock = self.clock.wrapping_add(ms);
    }
    fn lock_bus(&mut self) {}
    fn unlock_bus(&mut self) {}
    fn lock_device(&mut self) {}
    fn unlock_device(&mut self) {}
}

impl I2cPlatform for MockI2c {
    fn i2c_reset(&mut self) -> bool {
        true
    }
    fn i2c_transmit(&mut self, _addr: u8, _data: &[u8]) -> PlatformResult<()> {
        Ok(())
    }
    fn i2c_receive(
        &mut self,
        _addr: u8,
        buf: &mut [u8],
        req_len: u16,
        available: &mut u16,
    ) -> PlatformResult<()> {
        if req_len == 0 {
            *available = self.remaining.len() as u16;
            return Ok(());
        }
        let n = req_len as usize;
        let drained: Vec<u8> = self.remaining.drain(..n).collect();
        buf[..n].copy_from_slice(&drained);
        *available = self.remaining.len() as u16;
        Ok(())
    }
}

/// E2: a 900-byte response, default `max_chunk` of 30 bytes, reassembled
/// across repeated length-query/read cycles into one contiguous buffer.
#[test]
fn i2c_chunk_overflow_reassembles_full_response() {
    let mut body = vec![b'x'; 899];
    body.push(b'\n');
    let mut platform = MockI2c::new(body);
    let transport = I2cTransport::new(0x17);

    let received = transport.receive(&mut platform, 10_000).unwrap();

    assert_eq!(received.len(), 900);
    assert_eq!(received.last(), Some(&b'\n'));
    assert!(received[..899].iter().all(|&b| b == b'x'));
}

/// E3: a `web.*` request honors an explicit `"seconds"` override instead of
/// the default 10 s length-query timeout.
#[test]
fn web_request_uses_seconds_override_for_timeout() {
    let transport = I2cTransport::new(0x17);

    let web_request = r#"{"req":"web.post","seconds":120,"route":"my-route"}"#;
    assert_eq!(transport.request_timeout_ms(web_request, 10_000), 120_000);

    let plain_request = r#"{"req":"card.version"}"#;
    assert_eq!(transport.request_timeout_ms(plain_request, 10_000), 10_000);
}

/// A `web.*` request with no `"seconds"` field falls back to the long
/// 90 s default rather than the standard 10 s one.
#[test]
fn web_request_without_seconds_uses_long_default() {
    let transport = I2cTransport::new(0x17);
    let web_request = r#"{"req":"web.get","route":"my-route"}"#;
    assert_eq!(transport.request_timeout_ms(web_request, 10_000), 90_000);
}

/// Writing 17 one-byte chunks incurs the per-chunk pacing delay on every
/// chunk plus the longer segment delay every 8th chunk (but not after the
/// final chunk, since there is nothing left to pace before).
#[test]
fn i2c_transmit_adds_segment_delay_every_n_chunks() {
    let mut platform = MockI2c::new(Vec::new());
    let mut transport = I2cTransport::new(0x17);
    transport.max_chunk = 1;
    let data = vec![b'a'; 17];

    transport.transmit(&mut platform, &data).unwrap();

    assert_eq!(platform.clock, 17 * 6 + 2 * 50);
}
