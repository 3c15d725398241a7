//! # Hashing Utilities
//!
//! BLAKE3 is the only hash function in Strata, and the only one we intend to
//! support without a very good reason. It's fast on every platform that
//! matters, and the built-in `derive_key` mode gives us proper domain
//! separation without the amateur-hour trick of prepending a tag byte.
//!
//! The single consumer that matters is message-identifier derivation in the
//! router: a cross-domain message is identified by a domain-separated hash
//! over its source domain, payload, and reception timestamp.

/// Compute the BLAKE3 hash of the input data.
///
/// Returns a 32-byte digest as a fixed-size array. The `blake3` crate picks
/// up SIMD automatically, so there's no faster option to reach for.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Hash multiple byte slices together without concatenation overhead.
///
/// Feeding parts sequentially into the hasher produces the same digest as
/// hashing their concatenation, minus the temporary buffer. Used for
/// composite preimages like `(domain || payload || timestamp)`.
pub fn blake3_hash_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

/// Compute a domain-separated hash using BLAKE3's `derive_key` mode.
///
/// Two hashes with different context strings can never collide, even on
/// identical data, because the context changes the internal IV. Every hash
/// that acts as an identifier in Strata goes through this function with its
/// own context constant.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    hasher.update(data);
    *hasher.finalize().as_bytes()
}

/// Domain-separated hash over multiple parts. Same contract as
/// [`domain_separated_hash`], same no-copy trick as [`blake3_hash_multi`].
pub fn domain_separated_hash_multi(context: &str, parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_derive_key(context);
    for part in parts {
        hasher.update(part);
    }
    *hasher.finalize().as_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blake3_deterministic() {
        let a = blake3_hash(b"strata");
        let b = blake3_hash(b"strata");
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }

    #[test]
    fn blake3_different_inputs() {
        assert_ne!(blake3_hash(b"strata"), blake3_hash(b"Strata"));
    }

    #[test]
    fn multi_matches_concatenation() {
        let multi = blake3_hash_multi(&[b"hello", b" world"]);
        let single = blake3_hash(b"hello world");
        assert_eq!(multi, single);
    }

    #[test]
    fn domain_separation_changes_digest() {
        let data = b"same data";
        let a = domain_separated_hash("context-a", data);
        let b = domain_separated_hash("context-b", data);
        assert_ne!(a, b);
    }

    #[test]
    fn domain_separated_is_not_plain_blake3() {
        let data = b"test data";
        assert_ne!(blake3_hash(data), domain_separated_hash("strata-test", data));
    }

    #[test]
    fn domain_separated_multi_matches_single() {
        let multi = domain_separated_hash_multi("ctx", &[b"ab", b"cd"]);
        let single = domain_separated_hash("ctx", b"abcd");
        assert_eq!(multi, single);
    }
}
