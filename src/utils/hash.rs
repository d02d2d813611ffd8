//! Content fingerprints using blake3.
//!
//! ```ignore
//! let fp = hash::fingerprint(b"body { color: red }", 8); // -> "1a2b3c4d"
//! ```

/// A 256-bit content hash (blake3 output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    pub fn of(data: &[u8]) -> Self {
        Self(*blake3::hash(data).as_bytes())
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }
}

/// First `len` hex characters of the content hash (clamped to 64).
///
/// Pure function of the bytes: equal content always yields equal fingerprints.
pub fn fingerprint(data: &[u8], len: usize) -> String {
    let mut hex = ContentHash::of(data).to_hex();
    hex.truncate(len.clamp(1, 64));
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_is_deterministic() {
        let a = fingerprint(b"body{color:red}", 8);
        assert_eq!(a, fingerprint(b"body{color:red}", 8));
        assert_eq!(a.len(), 8);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_one_byte_change_changes_fingerprint() {
        assert_ne!(fingerprint(b"body{color:red}", 8), fingerprint(b"body{color:reD}", 8));
    }

    #[test]
    fn test_fingerprint_length_clamped() {
        assert_eq!(fingerprint(b"x", 0).len(), 1);
        assert_eq!(fingerprint(b"x", 100).len(), 64);
    }
}
