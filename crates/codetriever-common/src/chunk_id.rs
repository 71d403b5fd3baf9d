//! Deterministic chunk identifiers.
//!
//! A chunk id is derived from the quadruple that uniquely identifies a
//! declaration inside a repository at a point in time: its file, the line
//! span it covers, and its qualified name. Hashing that quadruple (rather
//! than generating a random id) means re-indexing an unchanged file produces
//! the same ids, so upserts replace rather than accumulate points.
//!
//! The vector store (spec.md's "uuid-string id" requirement) only accepts an
//! unsigned integer or a UUID as a point id, so the blake3 digest is folded
//! into a UUID v5 rather than handed to the store as a bare hex string.

use uuid::Uuid;

/// Namespace UUID for codetriever chunk ids (randomly generated once). This
/// keeps our derived UUIDs from colliding with UUID v5 ids minted by other
/// namespaces over the same input bytes.
const CHUNK_ID_NAMESPACE: Uuid = Uuid::from_bytes([
    0xa8, 0xf5, 0xc3, 0xe2, 0x7b, 0x9d, 0x4f, 0x2a, 0x9e, 0x1c, 0x3d, 0x5a, 0x7b, 0x9f, 0x1e, 0x3c,
]);

/// Derive a stable chunk id from `(file_path, start_line, end_line, qualified_name)`.
///
/// Hashes the quadruple with `blake3` for its collision resistance, then
/// folds the digest into a UUID v5 so the result is always a valid point id
/// for the vector store. The id is never used as a security boundary.
#[must_use]
pub fn generate_chunk_id(
    file_path: &str,
    start_line: usize,
    end_line: usize,
    qualified_name: &str,
) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(file_path.as_bytes());
    hasher.update(b"\0");
    hasher.update(start_line.to_le_bytes().as_slice());
    hasher.update(b"\0");
    hasher.update(end_line.to_le_bytes().as_slice());
    hasher.update(b"\0");
    hasher.update(qualified_name.as_bytes());
    let digest = hasher.finalize();
    Uuid::new_v5(&CHUNK_ID_NAMESPACE, digest.as_bytes()).to_string()
}

/// Derive the id for a text piece split off a parent chunk by `TextPreparer`.
///
/// Split pieces keep the parent's identity but need distinguishable,
/// co-locatable ids so every piece can be upserted without overwriting its
/// siblings. Re-hashed through the same namespace as `generate_chunk_id` so
/// the result is a UUID string too, rather than `parent_id` with a suffix
/// that could never parse as one.
#[must_use]
pub fn piece_id(parent_id: &str, ordinal: usize) -> String {
    let data = format!("{parent_id}:{ordinal}");
    Uuid::new_v5(&CHUNK_ID_NAMESPACE, data.as_bytes()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stable_across_calls() {
        let a = generate_chunk_id("src/lib.rs", 10, 20, "Foo.bar");
        let b = generate_chunk_id("src/lib.rs", 10, 20, "Foo.bar");
        assert_eq!(a, b);
    }

    #[test]
    fn differs_on_any_field() {
        let base = generate_chunk_id("src/lib.rs", 10, 20, "Foo.bar");
        assert_ne!(base, generate_chunk_id("src/other.rs", 10, 20, "Foo.bar"));
        assert_ne!(base, generate_chunk_id("src/lib.rs", 11, 20, "Foo.bar"));
        assert_ne!(base, generate_chunk_id("src/lib.rs", 10, 21, "Foo.bar"));
        assert_ne!(base, generate_chunk_id("src/lib.rs", 10, 20, "Foo.baz"));
    }

    #[test]
    fn ids_are_valid_uuid_strings() {
        let id = generate_chunk_id("src/lib.rs", 10, 20, "Foo.bar");
        assert!(Uuid::parse_str(&id).is_ok());
        let piece = piece_id(&id, 0);
        assert!(Uuid::parse_str(&piece).is_ok());
    }

    #[test]
    fn piece_ids_are_distinguishable() {
        let parent = generate_chunk_id("src/lib.rs", 10, 20, "Foo.bar");
        assert_ne!(piece_id(&parent, 0), piece_id(&parent, 1));
        assert_ne!(piece_id(&parent, 0), piece_id(&parent, 1));
    }
}
