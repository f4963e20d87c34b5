//! Rate limiting dimensions.

use std::fmt;

/// An independent rate limiting namespace.
///
/// Each dimension owns its own counter and lock, so keys in different
/// dimensions never collide and traffic in one never blocks the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    /// Every API request, keyed by client IP
    Global,
    /// Content creation, keyed by authenticated user
    WritePath,
}

impl Dimension {
    /// Stable name used in logs and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Global => "global",
            Dimension::WritePath => "write_path",
        }
    }

    /// Message returned to clients rejected in this dimension.
    pub fn rejection_message(&self) -> &'static str {
        match self {
            Dimension::Global => "Too many requests",
            Dimension::WritePath => "Too many prompt creations",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_display() {
        assert_eq!(Dimension::Global.to_string(), "global");
        assert_eq!(Dimension::WritePath.to_string(), "write_path");
    }

    #[test]
    fn test_rejection_messages_differ() {
        assert_ne!(
            Dimension::Global.rejection_message(),
            Dimension::WritePath.rejection_message()
        );
    }
}
