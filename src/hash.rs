//! Content digests using blake3.
//!
//! Every fingerprint in the crate is a lowercase hex prefix of a blake3 digest.
//!
//! ```ignore
//! use cachet::hash;
//!
//! let h = hash::digest(b"body {}", 10); // -> "a1b2c3d4e5"
//! ```

/// Default digest length in hex characters.
pub const DEFAULT_LENGTH: usize = 10;

/// Longest digest we can produce (a full blake3 hash in hex).
pub const MAX_LENGTH: usize = 64;

/// Shortest digest accepted by configuration.
pub const MIN_LENGTH: usize = 4;

/// Compute a hex digest of `data`, truncated to `length` characters.
#[inline]
pub fn digest<T: AsRef<[u8]> + ?Sized>(data: &T, length: usize) -> String {
    truncate(blake3::hash(data.as_ref()).as_bytes(), length)
}

fn truncate(bytes: &[u8; 32], length: usize) -> String {
    let mut hex = hex::encode(bytes);
    hex.truncate(length.clamp(1, MAX_LENGTH));
    hex
}
