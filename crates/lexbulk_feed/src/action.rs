//! Vendor-declared action types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the publisher wants a subscriber to do with an entry.
///
/// - `Add`: a new entry; the subscriber should store it
/// - `Change`: the full entry is resent after an edit
/// - `Delete`: mandatory removal from all systems (compliance)
/// - `Replace`: earlier duplicates are replaced by an authoritative copy
/// - `Remove`: the item must be removed from its purposed copy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// New entry.
    Add,
    /// Changed entry, resent in full.
    Change,
    /// Mandatory deletion.
    Delete,
    /// Replacement of duplicates.
    Replace,
    /// Removal from a purposed copy.
    Remove,
}

impl ActionType {
    /// All action types, in declaration order.
    pub const ALL: [ActionType; 5] = [
        ActionType::Add,
        ActionType::Change,
        ActionType::Delete,
        ActionType::Replace,
        ActionType::Remove,
    ];

    /// Returns the wire name (lowercase).
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Add => "add",
            ActionType::Change => "change",
            ActionType::Delete => "delete",
            ActionType::Replace => "replace",
            ActionType::Remove => "remove",
        }
    }

    /// Parses a wire value, ignoring case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|action| action.as_str().eq_ignore_ascii_case(value))
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown action type: {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(ActionType::parse("add"), Some(ActionType::Add));
        assert_eq!(ActionType::parse(" Delete\n"), Some(ActionType::Delete));
        assert_eq!(ActionType::parse("REPLACE"), Some(ActionType::Replace));
        assert_eq!(ActionType::parse("upsert"), None);
        assert_eq!(ActionType::parse(""), None);
    }

    #[test]
    fn wire_names_match_display() {
        for action in ActionType::ALL {
            assert_eq!(action.to_string(), action.as_str());
            assert_eq!(action.as_str().parse::<ActionType>(), Ok(action));
        }
    }

    #[test]
    fn serializes_lowercase() {
        let json = serde_json::to_string(&ActionType::Change).unwrap();
        assert_eq!(json, "\"change\"");
    }
}
