use std::fmt;

/// Request-scoped credential for the LLM provider.
///
/// Keys are passed explicitly to every remote call and are never stored in
/// process-wide state, so concurrent requests with different keys cannot see
/// each other's secrets. `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wraps a raw key. Returns `None` when the key is empty or blank.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Raw secret value. Only the HTTP layer should need this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub(crate) fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_keys_are_rejected() {
        assert!(ApiKey::new("").is_none());
        assert!(ApiKey::new("   ").is_none());
        assert_eq!(ApiKey::new(" sk-1 ").unwrap().expose(), "sk-1");
    }

    #[test]
    fn debug_does_not_leak() {
        let key = ApiKey::new("sk-secret").unwrap();
        let printed = format!("{key:?}");
        assert!(!printed.contains("sk-secret"));
    }
}
