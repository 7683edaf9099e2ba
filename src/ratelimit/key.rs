//! Entry key generation and handling.

/// A key that uniquely identifies a rate limit entry.
///
/// The key is the pair of category and identifier. Keeping the two parts
/// as separate fields (rather than joining them into one string) means an
/// identifier containing `:` can never collide with a different
/// category/identifier pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntryKey {
    /// The category this entry belongs to (e.g. `auth:login`)
    pub category: String,
    /// The rate-limited subject (client IP, user id, API key)
    pub identifier: String,
}

impl EntryKey {
    /// Create a new entry key from a category and identifier.
    pub fn new(category: &str, identifier: &str) -> Self {
        Self {
            category: category.to_string(),
            identifier: identifier.to_string(),
        }
    }
}

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.category, self.identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_key_creation() {
        let key = EntryKey::new("api:query", "192.168.1.1");

        assert_eq!(key.category, "api:query");
        assert_eq!(key.identifier, "192.168.1.1");
    }

    #[test]
    fn test_entry_key_display() {
        let key = EntryKey::new("auth:login", "user42");
        assert_eq!(key.to_string(), "auth:login:user42");
    }

    #[test]
    fn test_entry_key_equality() {
        let key1 = EntryKey::new("default", "user1");
        let key2 = EntryKey::new("default", "user1");

        assert_eq!(key1, key2);
    }

    #[test]
    fn test_colon_in_identifier_does_not_collide() {
        // "a" + "b:c" and "a:b" + "c" render identically but are distinct keys.
        let key1 = EntryKey::new("a", "b:c");
        let key2 = EntryKey::new("a:b", "c");

        assert_eq!(key1.to_string(), key2.to_string());
        assert_ne!(key1, key2);
    }
}
