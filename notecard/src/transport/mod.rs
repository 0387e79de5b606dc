//! Transport-variant abstraction: [`TransportOps`] is implemented once per
//! wire (serial, I2C) and the transaction engine is generic over it, so the
//! reset/lock/retry orchestration in [`crate::engine`] is written exactly
//! once regardless of which link is active.

pub mod i2c;
pub mod serial;

pub use i2c::I2cTransport;
pub use serial::SerialTransport;

use crate::error::EngineError;
use alloc::vec::Vec;

pub trait TransportOps<P: ?Sized> {
    fn reset(&self, platform: &mut P) -> Result<(), EngineError>;
    fn transmit(&self, platform: &mut P, data: &[u8]) -> Result<(), EngineError>;
    fn receive(&self, platform: &mut P, timeout_ms: u32) -> Result<Vec<u8>, EngineError>;

    /// Timeout override for this request, in milliseconds. Only the I2C
    /// transport currently varies this (the `web.*` override); serial uses
    /// the caller-supplied default unconditionally.
    fn request_timeout_ms(&self, _request_json: &str, default_ms: u32) -> u32 {
        default_ms
    }
}
