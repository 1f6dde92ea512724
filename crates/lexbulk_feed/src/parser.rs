//! Multipart payload parser.
//!
//! A delivery payload is a sequence of blocks separated by [`BLOCK_SEPARATOR`]:
//!
//! ```text
//! [0] header
//! [1] metadata feed: one <entry> per content item (id, action, pcsi)
//! [2] urn:contentItem:<id>@lexisnexis.com
//! [3] full text of <id>
//! [4] urn:contentItem:<id>@lexisnexis.com
//! [5] ...
//! ```
//!
//! The metadata block is applied first, then identifier/body pairs attach
//! text. Pairing is driven by a two-state machine rather than index parity,
//! so a stray block is reported instead of shifting every later pair. Empty
//! blocks are ignored in both states, and an identifier line arriving where
//! a body is expected closes the pending id with a missing-body warning.

use crate::content_id::{body_content_id, identifier_line_id};
use crate::error::{FeedError, FeedResult};
use crate::metadata::{decode_entries, EntryDecodeError};
use crate::record::ChangeSet;
use thiserror::Error;

/// Separator between payload blocks (line feed followed by carriage return).
pub const BLOCK_SEPARATOR: &str = "\n\r";

/// Index of the metadata block.
const METADATA_BLOCK: usize = 1;

/// A problem confined to one entry or block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseWarning {
    /// A metadata entry was skipped.
    #[error(transparent)]
    MalformedEntry(#[from] EntryDecodeError),

    /// A block appeared where an identifier line was expected.
    #[error(
        "block {index} is not an identifier line (after {}): {preview:?}",
        .after.as_deref().unwrap_or("start of payload")
    )]
    UnpairedBlock {
        /// Block index in the payload.
        index: usize,
        /// Content id of the last record that received a body.
        after: Option<String>,
        /// Start of the block.
        preview: String,
    },

    /// An identifier line was not followed by a body.
    #[error("identifier block {index} for {content_id} has no body")]
    MissingBody {
        /// Block index in the payload.
        index: usize,
        /// Content id named by the identifier line.
        content_id: String,
    },
}

/// Result of parsing one payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOutcome {
    /// Records keyed by content id.
    pub change_set: ChangeSet,
    /// Entries and blocks that were skipped.
    pub warnings: Vec<ParseWarning>,
}

enum BlockState {
    ExpectId,
    ExpectBody { content_id: String, index: usize },
}

/// Splits a delivery payload into a [`ChangeSet`].
///
/// # Example
///
/// ```rust
/// use lexbulk_feed::{ActionType, ChangeSetParser};
///
/// let payload = "header\n\r\
///     <entry><id>urn:contentItem:ABC123@lexisnexis.com</id><action>add</action><entrymeta pcsi=\"SUB1\"/></entry>\n\r\
///     urn:contentItem:ABC123@lexisnexis.com\n\r\
///     Hello world";
///
/// let outcome = ChangeSetParser::new().parse(payload).unwrap();
/// let record = outcome.change_set.get("ABC123").unwrap();
/// assert_eq!(record.action_type, Some(ActionType::Add));
/// assert_eq!(record.text.as_deref(), Some("Hello world"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ChangeSetParser;

impl ChangeSetParser {
    /// Creates a parser.
    pub fn new() -> Self {
        Self
    }

    /// Parses one complete payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload has no metadata block or the metadata
    /// block is not readable XML. Everything else is reported through
    /// [`ParseOutcome::warnings`].
    pub fn parse(&self, payload: &str) -> FeedResult<ParseOutcome> {
        let blocks: Vec<&str> = payload.split(BLOCK_SEPARATOR).map(str::trim).collect();
        let metadata = blocks
            .get(METADATA_BLOCK)
            .ok_or(FeedError::MissingMetadata {
                blocks: blocks.len(),
            })?;

        let mut outcome = ParseOutcome::default();
        for entry in decode_entries(metadata)? {
            match entry {
                Ok(meta) => outcome.change_set.apply_metadata(&meta),
                Err(e) => outcome.warnings.push(e.into()),
            }
        }

        self.attach_bodies(&blocks[METADATA_BLOCK + 1..], &mut outcome);
        Ok(outcome)
    }

    fn attach_bodies(&self, blocks: &[&str], outcome: &mut ParseOutcome) {
        let mut state = BlockState::ExpectId;
        let mut last_paired: Option<String> = None;

        for (offset, block) in blocks.iter().enumerate() {
            let index = offset + METADATA_BLOCK + 1;
            if block.is_empty() {
                continue;
            }
            state = match state {
                BlockState::ExpectId => match body_content_id(block) {
                    Some(content_id) => BlockState::ExpectBody { content_id, index },
                    None => {
                        outcome.warnings.push(ParseWarning::UnpairedBlock {
                            index,
                            after: last_paired.clone(),
                            preview: block.chars().take(40).collect(),
                        });
                        BlockState::ExpectId
                    }
                },
                BlockState::ExpectBody {
                    content_id,
                    index: id_index,
                } => match identifier_line_id(block) {
                    Some(next_id) => {
                        outcome.warnings.push(ParseWarning::MissingBody {
                            index: id_index,
                            content_id,
                        });
                        BlockState::ExpectBody {
                            content_id: next_id,
                            index,
                        }
                    }
                    None => {
                        outcome.change_set.attach_text(&content_id, *block);
                        last_paired = Some(content_id);
                        BlockState::ExpectId
                    }
                },
            };
        }

        if let BlockState::ExpectBody { content_id, index } = state {
            outcome
                .warnings
                .push(ParseWarning::MissingBody { index, content_id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionType;

    fn entry(id: &str, action: &str, pcsi: &str) -> String {
        format!(
            "<entry><id>urn:contentItem:{id}</id><lnpub:action>{action}</lnpub:action><lnpub:entrymeta pcsi=\"{pcsi}\"/></entry>"
        )
    }

    fn payload(metadata: &str, bodies: &[&str]) -> String {
        let mut blocks = vec!["--header--".to_string(), format!("<feed>{metadata}</feed>")];
        blocks.extend(bodies.iter().map(|b| b.to_string()));
        blocks.join(BLOCK_SEPARATOR)
    }

    #[test]
    fn end_to_end_example() {
        let text = payload(
            "<entry><id>urn:contentItem:ABC123@lexisnexis.com</id><action>add</action><entrymeta pcsi=\"SUB1\"/></entry>",
            &["urn:contentItem:ABC123@lexisnexis.com", "Hello world"],
        );
        let outcome = ChangeSetParser::new().parse(&text).unwrap();

        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.change_set.len(), 1);
        let record = outcome.change_set.get("ABC123").unwrap();
        assert_eq!(record.action_type, Some(ActionType::Add));
        assert_eq!(record.subscription_id.as_deref(), Some("SUB1"));
        assert_eq!(record.text.as_deref(), Some("Hello world"));
        assert_eq!(
            record.destination_key.as_deref(),
            Some("subscriptions/SUB1/ABC123")
        );
    }

    #[test]
    fn several_pairs_attach_to_their_records() {
        let text = payload(
            &format!("{}{}", entry("A", "add", "S"), entry("B", "delete", "S")),
            &[
                "urn:contentItem:A@lexisnexis.com",
                "text of A",
                "urn:contentItem:B@lexisnexis.com",
                "text of B",
            ],
        );
        let outcome = ChangeSetParser::new().parse(&text).unwrap();

        assert_eq!(outcome.change_set.get("A").unwrap().text.as_deref(), Some("text of A"));
        assert_eq!(outcome.change_set.get("B").unwrap().text.as_deref(), Some("text of B"));
        assert_eq!(
            outcome.change_set.get("B").unwrap().action_type,
            Some(ActionType::Delete)
        );
    }

    #[test]
    fn body_without_metadata_creates_orphan() {
        let text = payload(
            &entry("A", "add", "S"),
            &["urn:contentItem:Y@lexisnexis.com", "orphan text"],
        );
        let outcome = ChangeSetParser::new().parse(&text).unwrap();

        let orphan = outcome.change_set.get("Y").unwrap();
        assert_eq!(orphan.text.as_deref(), Some("orphan text"));
        assert_eq!(orphan.action_type, None);
        assert_eq!(orphan.subscription_id, None);
        assert_eq!(outcome.change_set.get("A").unwrap().text, None);
    }

    #[test]
    fn blocks_are_trimmed() {
        let text = "h\n\r <feed>".to_string()
            + &entry("A", "add", "S")
            + "</feed> \n\r  urn:contentItem:A@lexisnexis.com \n\r\n  body text \n";
        let outcome = ChangeSetParser::new().parse(&text).unwrap();
        assert_eq!(
            outcome.change_set.get("A").unwrap().text.as_deref(),
            Some("body text")
        );
    }

    #[test]
    fn separator_is_order_sensitive() {
        let text = ["h", "<feed></feed>", "urn:contentItem:A@lexisnexis.com", "body"].join("\r\n");
        let result = ChangeSetParser::new().parse(&text);
        assert!(matches!(result, Err(FeedError::MissingMetadata { blocks: 1 })));
    }

    #[test]
    fn missing_metadata_block_is_fatal() {
        assert!(matches!(
            ChangeSetParser::new().parse(""),
            Err(FeedError::MissingMetadata { blocks: 1 })
        ));
    }

    #[test]
    fn stray_block_does_not_shift_pairs() {
        let text = payload(
            &format!("{}{}", entry("A", "add", "S"), entry("B", "add", "S")),
            &[
                "urn:contentItem:A@lexisnexis.com",
                "text of A",
                "continuation that was split off",
                "urn:contentItem:B@lexisnexis.com",
                "text of B",
            ],
        );
        let outcome = ChangeSetParser::new().parse(&text).unwrap();

        assert_eq!(outcome.change_set.get("B").unwrap().text.as_deref(), Some("text of B"));
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(
            outcome.warnings[0],
            ParseWarning::UnpairedBlock {
                index: 4,
                after: Some("A".into()),
                preview: "continuation that was split off".into(),
            }
        );
        assert!(outcome.warnings[0].to_string().contains("after A"));
    }

    #[test]
    fn trailing_identifier_is_reported() {
        let text = payload(&entry("A", "add", "S"), &["urn:contentItem:A@lexisnexis.com"]);
        let outcome = ChangeSetParser::new().parse(&text).unwrap();

        assert_eq!(
            outcome.warnings,
            vec![ParseWarning::MissingBody {
                index: 2,
                content_id: "A".into(),
            }]
        );
        assert_eq!(outcome.change_set.get("A").unwrap().text, None);
    }

    #[test]
    fn identifier_after_identifier_is_not_a_body() {
        let text = payload(
            &format!("{}{}", entry("A", "add", "S"), entry("B", "add", "S")),
            &[
                "urn:contentItem:A@lexisnexis.com",
                "urn:contentItem:B@lexisnexis.com",
                "text of B",
            ],
        );
        let outcome = ChangeSetParser::new().parse(&text).unwrap();

        assert_eq!(outcome.change_set.get("A").unwrap().text, None);
        assert_eq!(outcome.change_set.get("B").unwrap().text.as_deref(), Some("text of B"));
        assert_eq!(
            outcome.warnings,
            vec![ParseWarning::MissingBody {
                index: 2,
                content_id: "A".into(),
            }]
        );
    }

    #[test]
    fn body_mentioning_a_urn_is_still_a_body() {
        let text = payload(
            &entry("A", "add", "S"),
            &[
                "urn:contentItem:A@lexisnexis.com",
                "Supersedes urn:contentItem:OLD@lexisnexis.com",
            ],
        );
        let outcome = ChangeSetParser::new().parse(&text).unwrap();

        assert!(outcome.warnings.is_empty());
        assert_eq!(
            outcome.change_set.get("A").unwrap().text.as_deref(),
            Some("Supersedes urn:contentItem:OLD@lexisnexis.com")
        );
    }

    #[test]
    fn empty_block_between_identifier_and_body_is_ignored() {
        let text = payload(
            &entry("A", "add", "S"),
            &["urn:contentItem:A@lexisnexis.com", "", "text of A"],
        );
        let outcome = ChangeSetParser::new().parse(&text).unwrap();

        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.change_set.get("A").unwrap().text.as_deref(), Some("text of A"));
    }

    #[test]
    fn identifier_followed_only_by_empty_blocks_has_no_body() {
        let text = payload(
            &entry("A", "add", "S"),
            &["urn:contentItem:A@lexisnexis.com", "", ""],
        );
        let outcome = ChangeSetParser::new().parse(&text).unwrap();

        assert_eq!(
            outcome.warnings,
            vec![ParseWarning::MissingBody {
                index: 2,
                content_id: "A".into(),
            }]
        );
        assert_eq!(outcome.change_set.get("A").unwrap().text, None);
    }

    #[test]
    fn unpaired_block_at_start_has_no_context() {
        let text = payload(&entry("A", "add", "S"), &["stray"]);
        let outcome = ChangeSetParser::new().parse(&text).unwrap();

        assert!(matches!(
            &outcome.warnings[0],
            ParseWarning::UnpairedBlock { index: 2, after: None, .. }
        ));
        assert!(outcome.warnings[0].to_string().contains("start of payload"));
    }

    #[test]
    fn empty_trailing_blocks_are_ignored() {
        let text = payload(
            &entry("A", "add", "S"),
            &["urn:contentItem:A@lexisnexis.com", "body", "", ""],
        );
        let outcome = ChangeSetParser::new().parse(&text).unwrap();
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn malformed_entry_is_a_warning() {
        let text = payload(
            &format!(
                "<entry><id>urn:contentItem:BAD</id><action>add</action></entry>{}",
                entry("GOOD", "change", "S")
            ),
            &[],
        );
        let outcome = ChangeSetParser::new().parse(&text).unwrap();

        assert_eq!(outcome.change_set.len(), 1);
        assert!(outcome.change_set.get("GOOD").is_some());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].to_string().contains("BAD"));
    }

    #[test]
    fn duplicate_metadata_last_wins() {
        let text = payload(
            &format!("{}{}", entry("X", "add", "S1"), entry("X", "replace", "S2")),
            &["urn:contentItem:X@lexisnexis.com", "body"],
        );
        let outcome = ChangeSetParser::new().parse(&text).unwrap();

        let record = outcome.change_set.get("X").unwrap();
        assert_eq!(record.action_type, Some(ActionType::Replace));
        assert_eq!(record.subscription_id.as_deref(), Some("S2"));
        assert_eq!(record.text.as_deref(), Some("body"));
    }
}
