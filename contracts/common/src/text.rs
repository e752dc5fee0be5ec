use soroban_sdk::{Env, String};

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Builds a contract string from bytes already known to be ASCII.
///
/// Non-UTF-8 input yields an empty string rather than trapping.
pub fn ascii_string(env: &Env, bytes: &[u8]) -> String {
    String::from_str(env, core::str::from_utf8(bytes).unwrap_or_default())
}

/// Lowercase hex encoding of a 32-byte digest.
pub fn hex_string(env: &Env, digest: &[u8; 32]) -> String {
    let mut buf = [0u8; 64];
    for (i, byte) in digest.iter().enumerate() {
        buf[i * 2] = HEX_DIGITS[(byte >> 4) as usize];
        buf[i * 2 + 1] = HEX_DIGITS[(byte & 0x0f) as usize];
    }
    ascii_string(env, &buf)
}
