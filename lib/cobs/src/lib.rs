// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Consistent Overhead Byte Stuffing.
//!
//! Removes a chosen sentinel byte from an arbitrary byte stream so the
//! sentinel can be used unambiguously as an external packet terminator.
//! Unlike `corncobs`, the sentinel is a runtime parameter rather than
//! always zero, and `guaranteed_fit` is exposed for sizing receive buffers
//! against a fixed capacity.

#![cfg_attr(not(test), no_std)]

extern crate alloc;

use alloc::vec::Vec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CobsError {
    /// A code byte named a run longer than the remaining input: the frame
    /// was truncated before its terminating sentinel.
    Truncated,
}

/// Default sentinel used when no application-specific value is needed.
pub const DEFAULT_SENTINEL: u8 = 0;

/// Exact length of `encode(input, eop)`, not counting the trailing sentinel.
pub fn encoded_len(input: &[u8]) -> usize {
    let mut len = 1usize;
    let mut code: u8 = 1;
    for &ch in input {
        if ch != 0 {
            len += 1;
            code += 1;
        }
        if ch == 0 || code == 0xFF {
            code = 1;
            len += 1;
        }
    }
    len
}

/// Worst-case encoded length for an `n`-byte input, including the trailing
/// sentinel byte a caller appends to frame the packet. `ceil(n / 254)`
/// underestimates the overhead at exact multiples of 254 (a run of 254
/// non-zero bytes needs a leading `0xFF` code *and* a trailing `0x01` code),
/// so this is `n + n/254 + 2` rather than `n + ceil(n/254) + 1`.
pub fn encoded_max_len(n: usize) -> usize {
    n + n / 254 + 2
}

/// Largest `n` such that `encoded_max_len(n) <= cap`.
///
/// `encoded_max_len` is monotonic in `n`, so this is found by estimating
/// and correcting rather than trusting a closed form: the obvious
/// `cap - (1 + cap/254 + 1)` formula undercounts by one at buffer
/// capacities that are themselves exact multiples of 254, e.g. it gives
/// 65535 for `cap = 65796` where 65536 is also guaranteed to fit.
pub fn guaranteed_fit(cap: usize) -> usize {
    if cap < 2 {
        return 0;
    }
    let mut n = cap - 2;
    while n > 0 && encoded_max_len(n) > cap {
        n -= 1;
    }
    while encoded_max_len(n + 1) <= cap {
        n += 1;
    }
    n
}

/// Encode `input`, XOR-ing every emitted byte (including code bytes) with
/// `eop` so the raw value `eop` never appears in the output. Does not
/// append the trailing sentinel; callers frame the packet by writing `eop`
/// after the returned bytes.
pub fn encode(input: &[u8], eop: u8) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(input));
    let mut code: u8 = 1;
    let mut code_index = out.len();
    out.push(0);
    for &ch in input {
        if ch != 0 {
            out.push(ch ^ eop);
            code += 1;
        }
        if ch == 0 || code == 0xFF {
            out[code_index] = code ^ eop;
            code = 1;
            code_index = out.len();
            out.push(0);
        }
    }
    out[code_index] = code ^ eop;
    out
}

/// Decode a span that includes the trailing sentinel byte (as received off
/// the wire). Stops at the first code byte that decodes to zero; an input
/// exhausted before that point is a truncated frame.
pub fn decode(input: &[u8], eop: u8) -> Result<Vec<u8>, CobsError> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0usize;
    let mut prev_code: Option<u8> = None;
    loop {
        if i >= input.len() {
            return Err(CobsError::Truncated);
        }
        let code = input[i] ^ eop;
        i += 1;
        if code == 0 {
            break;
        }
        if let Some(prev) = prev_code {
            if prev != 0xFF {
                out.push(0);
            }
        }
        let run = (code - 1) as usize;
        if i + run > input.len() {
            return Err(CobsError::Truncated);
        }
        out.extend(input[i..i + run].iter().map(|&b| b ^ eop));
        i += run;
        prev_code = Some(code);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(input: &[u8], eop: u8) {
        let mut encoded = encode(input, eop);
        encoded.push(eop);
        let decoded = decode(&encoded, eop).expect("decode should succeed");
        assert_eq!(decoded, input);
    }

    #[test]
    fn roundtrip_empty() {
        roundtrip(&[], 0);
    }

    #[test]
    fn roundtrip_no_zeros() {
        roundtrip(b"Hello Blues!", 0);
    }

    #[test]
    fn roundtrip_with_embedded_zero() {
        roundtrip(&[1, 2, 0, 3, 0, 0, 4], 0);
    }

    #[test]
    fn roundtrip_nonzero_sentinel() {
        roundtrip(b"contains\nnewlines\nand\0nulls", b'\n');
    }

    #[test]
    fn roundtrip_exact_254_run() {
        let input = vec![1u8; 254];
        roundtrip(&input, 0);
        // A run of 254 non-zero bytes needs two code bytes (0xFF, 0x01).
        assert_eq!(encoded_len(&input), 254 + 2);
    }

    #[test]
    fn encoded_max_len_matches_known_vectors() {
        assert_eq!(encoded_max_len(0), 2);
        assert_eq!(encoded_max_len(1), 3);
        assert_eq!(encoded_max_len(253), 255);
        assert_eq!(encoded_max_len(254), 257);
        assert_eq!(encoded_max_len(255), 258);
        assert_eq!(encoded_max_len(508), 512);
        assert_eq!(encoded_max_len(65536), 65796);
    }

    #[test]
    fn guaranteed_fit_matches_known_vectors() {
        assert_eq!(guaranteed_fit(0), 0);
        assert_eq!(guaranteed_fit(1), 0);
        assert_eq!(guaranteed_fit(8), 6);
        assert_eq!(guaranteed_fit(256), 253);
        assert_eq!(guaranteed_fit(65796), 65536);
    }

    #[test]
    fn guaranteed_fit_round_trips_into_encoded_max_len() {
        for cap in [0usize, 1, 2, 3, 8, 256, 1024, 65796] {
            assert!(encoded_max_len(guaranteed_fit(cap)) <= cap);
        }
    }

    #[test]
    fn truncated_frame_is_an_error() {
        let encoded = encode(b"hello", 0);
        // Missing the trailing sentinel byte.
        assert_eq!(decode(&encoded, 0), Err(CobsError::Truncated));
    }

    #[test]
    fn decode_does_not_append_phantom_trailing_zero() {
        // Single non-zero byte: final block's code is 2, not 0xFF, so a
        // decoder that keys the implicit-zero decision off the block just
        // read (rather than the one still to come) appends a spurious
        // trailing zero here.
        let mut encoded = encode(b"\x05", 0);
        encoded.push(0);
        assert_eq!(decode(&encoded, 0).unwrap(), b"\x05");
    }
}
