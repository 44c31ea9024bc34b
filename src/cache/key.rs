//! Cache entry addressing.

use std::fmt;

/// Separator between namespace and key in the rendered cache key.
pub const NAMESPACE_SEPARATOR: char = ':';

/// A cache key scoped to a namespace, rendered as `namespace:key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub namespace: &'static str,
    pub key: &'static str,
}

impl CacheKey {
    pub const fn new(namespace: &'static str, key: &'static str) -> Self {
        Self { namespace, key }
    }

    /// The key as stored in the backend.
    pub fn render(&self) -> String {
        format!("{}{}{}", self.namespace, NAMESPACE_SEPARATOR, self.key)
    }

    /// Prefix shared by every key in `namespace`.
    pub fn namespace_prefix(namespace: &str) -> String {
        format!("{}{}", namespace, NAMESPACE_SEPARATOR)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.namespace, NAMESPACE_SEPARATOR, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render() {
        let key = CacheKey::new("regions", "dict");
        assert_eq!(key.render(), "regions:dict");
        assert_eq!(key.to_string(), "regions:dict");
        assert!(key.render().starts_with(&CacheKey::namespace_prefix("regions")));
    }
}
