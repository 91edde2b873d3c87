//! ID generation and validation utilities.

use ulid::Ulid;
use uuid::Uuid;

use crate::{AppError, AppResult};

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs are lexicographically sortable and stored lowercase.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a random bearer token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // No time component, unlike entity IDs
        Uuid::new_v4().simple().to_string()
    }
}

/// Checks that `id` is a well-formed entity ID and returns it in stored
/// (lowercase) form.
///
/// `label` names the entity in the error, e.g. `"video"` gives
/// `"Invalid video ID"`.
pub fn ensure_valid_id(id: &str, label: &str) -> AppResult<String> {
    Ulid::from_string(&id.to_uppercase())
        .map(|_| id.to_lowercase())
        .map_err(|_| AppError::BadRequest(format!("Invalid {label} ID")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_eq!(id2.len(), 26);
        assert_ne!(id1, id2);
        assert_eq!(id1, id1.to_lowercase());
    }

    #[test]
    fn test_generate_token() {
        let id_gen = IdGenerator::new();
        let token = id_gen.generate_token();

        assert_eq!(token.len(), 32); // Simple UUID without hyphens
    }

    #[test]
    fn test_generated_ids_are_valid() {
        let id = IdGenerator::new().generate();
        assert!(ensure_valid_id(&id, "video").is_ok());
    }

    #[test]
    fn test_valid_id_is_normalized_to_lowercase() {
        let id = ensure_valid_id("01ARZ3NDEKTSV4RRFFQ69G5FAV", "video").unwrap();
        assert_eq!(id, "01arz3ndektsv4rrffq69g5fav");
    }

    #[test]
    fn test_invalid_id_names_the_entity() {
        let err = ensure_valid_id("not-an-id", "comment").unwrap_err();
        match err {
            AppError::BadRequest(msg) => assert_eq!(msg, "Invalid comment ID"),
            other => panic!("unexpected error: {other:?}"),
        }

        assert!(ensure_valid_id("", "video").is_err());
        assert!(ensure_valid_id("01arz3ndektsv4rrffq69g5fa", "video").is_err());
    }
}
