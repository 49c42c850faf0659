//! Recipient of a single templated email.
//!
//! Both fields are stored as `Arc<str>`: a recipient is cloned into every send
//! task and retry attempt, and is never mutated once parsed.

use std::{
    fmt::{self, Display},
    sync::Arc,
};

use serde::{Deserialize, Serialize};

/// A name/email pair targeted for one email send.
///
/// # Examples
///
/// ```
/// use ezsender_common::Recipient;
///
/// let recipient = Recipient::new("Ada", "ada@example.com");
/// assert_eq!(recipient.name(), "Ada");
/// assert_eq!(recipient.email(), "ada@example.com");
/// assert_eq!(recipient.to_string(), "Ada <ada@example.com>");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Recipient {
    name: Arc<str>,
    email: Arc<str>,
}

impl Recipient {
    /// Create a new recipient
    #[must_use]
    pub fn new(name: impl Into<Arc<str>>, email: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Display name, possibly empty
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Destination address
    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }
}

impl Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "<{}>", self.email)
        } else {
            write!(f, "{} <{}>", self.name, self.email)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recipient_accessors() {
        let recipient = Recipient::new(String::from("Grace"), "grace@example.com");
        assert_eq!(recipient.name(), "Grace");
        assert_eq!(recipient.email(), "grace@example.com");
    }

    #[test]
    fn test_recipient_display_without_name() {
        let recipient = Recipient::new("", "anon@example.com");
        assert_eq!(recipient.to_string(), "<anon@example.com>");
    }

    #[test]
    fn test_recipient_clone_shares_storage() {
        let recipient = Recipient::new("Linus", "linus@example.com");
        let clone = recipient.clone();
        assert!(Arc::ptr_eq(&recipient.email, &clone.email));
        assert_eq!(recipient, clone);
    }

    #[test]
    fn test_recipient_ron_roundtrip_shape() {
        let recipient: Recipient =
            ron::from_str(r#"(name: "Barbara", email: "barbara@example.com")"#)
                .unwrap_or_else(|e| panic!("failed to parse recipient: {e}"));
        pretty_assertions::assert_eq!(recipient, Recipient::new("Barbara", "barbara@example.com"));
    }
}
