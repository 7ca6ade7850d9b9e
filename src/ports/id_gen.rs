//! ID generator port for producing unique tokens.

/// Generates unique identifiers.
///
/// Used to name temporary files and to tag lock files with the session that
/// holds them.
pub trait IdGenerator: Send + Sync {
    /// Generates a new unique identifier string.
    fn generate_id(&self) -> String;
}
