//! The binary payload engine: a COBS-framed, MD5-verified transfer of
//! opaque bytes to and from the device's content-addressed payload store,
//! layered on top of the same transport used for JSON transactions.

use crate::engine::Notecard;
use crate::error::{EngineError, ErrorKind};
use crate::platform::Platform;
use crate::transport::TransportOps;
use alloc::vec::Vec;
use md5::{Digest, Md5};
use notecard_json::Node;

fn md5_hex(data: &[u8]) -> alloc::string::String {
    let digest = Md5::digest(data);
    let mut out = alloc::string::String::with_capacity(32);
    for byte in digest {
        out.push_str(&alloc::format!("{:02x}", byte));
    }
    out
}

impl<P: Platform, T: TransportOps<P>> Notecard<P, T> {
    /// Queries the device's payload store length and capacity.
    pub fn binary_store_decoded_length(&mut self) -> Result<(u32, u32), EngineError> {
        let mut req = Node::object();
        req.set("req", Node::string("card.binary"));
        let response = self.transaction(req);
        if response.is_present("err") {
            return Err(EngineError::new(ErrorKind::Io, response.get_string("err")));
        }
        Ok((response.get_int("length") as u32, response.get_int("max") as u32))
    }

    /// Deletes the device's stored payload.
    pub fn binary_reset(&mut self) -> Result<(), EngineError> {
        let mut req = Node::object();
        req.set("req", Node::string("card.binary"));
        req.set("delete", Node::bool(true));
        let response = self.transaction(req);
        if response.is_present("err") {
            return Err(EngineError::new(ErrorKind::Io, response.get_string("err")));
        }
        Ok(())
    }

    /// Appends `data` at `offset`, which must equal the store's current
    /// length (append-only).
    pub fn binary_transmit(&mut self, data: &[u8], offset: u32) -> Result<(), EngineError> {
        let (length, max) = self.binary_store_decoded_length()?;
        if offset != length {
            return Err(EngineError::new(
                ErrorKind::Logic,
                "binary transmit offset is not the store's current length",
            ));
        }
        let encoded_len = cobs::encoded_len(data);
        if length as u64 + encoded_len as u64 > max as u64 {
            return Err(EngineError::new(ErrorKind::Logic, "payload exceeds store capacity"));
        }

        let mut put = Node::object();
        put.set("req", Node::string("card.binary.put"));
        put.set("cobs", Node::int(encoded_len as i64));
        put.set("status", Node::string(md5_hex(data)));
        let response = self.transaction(put);
        if let Some(err) = response_error(&response) {
            return Err(classify(&err));
        }

        let mut framed = cobs::encode(data, b'\n');
        framed.push(b'\n');
        self.platform.lock_device();
        let send_result = self.transport.transmit(&mut self.platform, &framed);
        self.platform.unlock_device();
        send_result?;

        let (new_length, _) = self.binary_store_decoded_length()?;
        if new_length != length + data.len() as u32 {
            return Err(EngineError::new(ErrorKind::BadBin, "store length mismatch after transmit"));
        }
        Ok(())
    }

    /// Reads `length` decoded bytes starting at `offset` into `buf`,
    /// requiring `buf.len() >= encoded_max_len(length) + 1` (the `+1` for
    /// the trailing newline the transport reads through).
    pub fn binary_receive(&mut self, offset: u32, length: u32, buf: &mut Vec<u8>) -> Result<usize, EngineError> {
        let min_capacity = cobs::encoded_max_len(length as usize) + 1;
        if buf.capacity() < min_capacity {
            buf.reserve(min_capacity - buf.capacity());
        }

        let mut get = Node::object();
        get.set("req", Node::string("card.binary.get"));
        get.set("offset", Node::int(offset as i64));
        get.set("length", Node::int(length as i64));
        let response = self.transaction(get);
        if let Some(err) = response_error(&response) {
            return Err(classify(&err));
        }
        let expected_md5 = response.get_string("status").to_owned();

        self.platform.lock_device();
        let raw = self.transport.receive(&mut self.platform, 10_000);
        self.platform.unlock_device();
        let raw = raw?;

        let decoded = cobs::decode(&raw, b'\n').map_err(|_| EngineError::new(ErrorKind::BadBin, "malformed cobs frame"))?;
        if md5_hex(&decoded) != expected_md5 {
            return Err(EngineError::new(ErrorKind::BadBin, "binary payload md5 mismatch"));
        }
        buf.clear();
        buf.extend_from_slice(&decoded);
        Ok(decoded.len())
    }

    pub fn binary_receive_all(&mut self, buf: &mut Vec<u8>) -> Result<usize, EngineError> {
        let (length, _) = self.binary_store_decoded_length()?;
        self.binary_receive(0, length, buf)
    }
}

fn response_error(response: &Node) -> Option<alloc::string::String> {
    if response.is_present("err") {
        Some(response.get_string("err").to_owned())
    } else {
        None
    }
}

fn classify(err: &str) -> EngineError {
    let kind = crate::error::classify_response_error(err).unwrap_or(ErrorKind::Io);
    EngineError::new(kind, err)
}
