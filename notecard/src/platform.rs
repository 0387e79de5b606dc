//! The fixed set of operations the engine asks the host to provide. A host
//! wires up only the bindings its active transport needs; the unused ones
//! keep a safe default that reports `NotSupported` rather than forcing
//! every implementation to stub out the whole trait.

use notecard_json::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformError {
    NotResponding,
    Timeout,
    NotSupported,
    Bus,
}

pub type PlatformResult<T> = Result<T, PlatformError>;

/// Bindings common to every transport: clock, delay, and the two mutexes
/// that order a transaction against bus arbitration.
pub trait Platform {
    fn get_ms(&self) -> u32;
    fn delay_ms(&mut self, ms: u32);

    fn lock_bus(&mut self);
    fn unlock_bus(&mut self);
    fn lock_device(&mut self);
    fn unlock_device(&mut self);

    /// Optional readiness gate around a transaction; default accepts
    /// immediately.
    fn transaction_start(&mut self, _timeout_ms: u32) -> PlatformResult<()> {
        Ok(())
    }
    fn transaction_stop(&mut self) {}

    /// Optional human-readable sink; default discards.
    fn debug_output(&mut self, _message: &str) {}

    /// Optional diagnostic object merged into outgoing `hub.set` requests
    /// that carry a `product` field.
    fn user_agent(&self) -> Option<Node> {
        None
    }

    fn wrap_elapsed(&self, start: u32) -> u32 {
        self.get_ms().wrapping_sub(start)
    }
}

/// Bindings for the UART transport. Kept as a separate trait so a host
/// that only wires up I2C never has to implement these.
pub trait SerialPlatform: Platform {
    fn serial_reset(&mut self) -> bool;
    fn serial_transmit(&mut self, data: &[u8], flush: bool) -> PlatformResult<()>;
    fn serial_available(&mut self) -> bool;
    fn serial_receive(&mut self) -> u8;
}

/// Bindings for the I2C transport.
pub trait I2cPlatform: Platform {
    fn i2c_reset(&mut self) -> bool;
    fn i2c_transmit(&mut self, addr: u8, data: &[u8]) -> PlatformResult<()>;
    /// `req_len == 0` performs a length-only query: no bytes are
    /// transferred, only `available` is updated.
    fn i2c_receive(
        &mut self,
        addr: u8,
        buf: &mut [u8],
        req_len: u16,
        available: &mut u16,
    ) -> PlatformResult<()>;
}
