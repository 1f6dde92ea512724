//! Decoding of the metadata block.
//!
//! The second block of a delivery payload is an Atom-style feed with one
//! `<entry>` per content item. Each entry is decoded on its own into a
//! `Result`, so a broken entry is reported without losing its neighbours.

use crate::action::ActionType;
use crate::content_id::metadata_content_id;
use crate::error::{FeedError, FeedResult};
use crate::xml::{self, attribute, is_end_named, is_named};
use quick_xml::events::{BytesStart, Event};
use thiserror::Error;

/// A successfully decoded metadata entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    /// Content id (URN prefix removed).
    pub content_id: String,
    /// Declared action.
    pub action: ActionType,
    /// Subscription id from `entrymeta/@pcsi`.
    pub subscription_id: String,
}

/// Why a metadata entry could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryDecodeError {
    /// A required sub-field is absent or empty.
    #[error("metadata entry {index} ({}) is missing {field}", .content_id.as_deref().unwrap_or("unknown id"))]
    MissingField {
        /// Position of the entry in the block.
        index: usize,
        /// Content id, when the entry had one.
        content_id: Option<String>,
        /// Name of the missing field.
        field: &'static str,
    },

    /// The action is not one of the known action types.
    #[error("metadata entry {index} ({content_id}) has unknown action {value:?}")]
    UnknownAction {
        /// Position of the entry in the block.
        index: usize,
        /// Content id.
        content_id: String,
        /// The action text as found.
        value: String,
    },
}

impl EntryDecodeError {
    /// Returns the content id of the failed entry, if known.
    pub fn content_id(&self) -> Option<&str> {
        match self {
            EntryDecodeError::MissingField { content_id, .. } => content_id.as_deref(),
            EntryDecodeError::UnknownAction { content_id, .. } => Some(content_id),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    Id,
    Action,
}

/// Fields collected for one `<entry>` before validation.
#[derive(Default)]
struct PendingEntry {
    index: usize,
    id: Option<String>,
    action: Option<String>,
    subscription_id: Option<String>,
    reading: Option<Field>,
    buffer: String,
}

impl PendingEntry {
    fn new(index: usize) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    fn open(&mut self, start: &BytesStart<'_>) {
        if is_named(start, "id") && self.id.is_none() {
            self.begin(Field::Id);
        } else if is_named(start, "action") && self.action.is_none() {
            self.begin(Field::Action);
        } else {
            self.meta(start);
        }
    }

    fn meta(&mut self, start: &BytesStart<'_>) {
        if is_named(start, "entrymeta") && self.subscription_id.is_none() {
            self.subscription_id = attribute(start, "pcsi");
        }
    }

    fn begin(&mut self, field: Field) {
        self.reading = Some(field);
        self.buffer.clear();
    }

    fn close(&mut self, end: &quick_xml::events::BytesEnd<'_>) {
        let value = std::mem::take(&mut self.buffer);
        match self.reading {
            Some(Field::Id) if is_end_named(end, "id") => self.id = Some(value),
            Some(Field::Action) if is_end_named(end, "action") => self.action = Some(value),
            _ => {
                self.buffer = value;
                return;
            }
        }
        self.reading = None;
    }

    fn push_text(&mut self, text: &str) {
        if self.reading.is_some() {
            self.buffer.push_str(text);
        }
    }

    fn finish(self) -> Result<EntryMeta, EntryDecodeError> {
        let index = self.index;
        let content_id = self
            .id
            .as_deref()
            .and_then(metadata_content_id)
            .ok_or(EntryDecodeError::MissingField {
                index,
                content_id: None,
                field: "id",
            })?;

        let action_text = self
            .action
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| EntryDecodeError::MissingField {
                index,
                content_id: Some(content_id.clone()),
                field: "action",
            })?;
        let action =
            ActionType::parse(&action_text).ok_or_else(|| EntryDecodeError::UnknownAction {
                index,
                content_id: content_id.clone(),
                value: action_text.trim().to_string(),
            })?;

        let subscription_id = self
            .subscription_id
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| EntryDecodeError::MissingField {
                index,
                content_id: Some(content_id.clone()),
                field: "entrymeta/@pcsi",
            })?;

        Ok(EntryMeta {
            content_id,
            action,
            subscription_id,
        })
    }
}

/// Decodes every `<entry>` in a metadata block.
///
/// Entries are returned in document order, each either decoded or with the
/// reason it was rejected. An entry left open at the end of the block is
/// decoded as if it had been closed.
///
/// # Errors
///
/// Returns an error only if the block cannot be tokenised as XML.
pub fn decode_entries(block: &str) -> FeedResult<Vec<Result<EntryMeta, EntryDecodeError>>> {
    let mut reader = xml::lenient_reader(block);
    let mut entries = Vec::new();
    let mut current: Option<PendingEntry> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                if is_named(&start, "entry") {
                    if let Some(done) = current.take() {
                        entries.push(done.finish());
                    }
                    current = Some(PendingEntry::new(entries.len()));
                } else if let Some(entry) = current.as_mut() {
                    entry.open(&start);
                }
            }
            Ok(Event::Empty(start)) => {
                if let Some(entry) = current.as_mut() {
                    entry.meta(&start);
                }
            }
            Ok(Event::Text(text)) => {
                if let Some(entry) = current.as_mut() {
                    entry.push_text(&xml::text(&text));
                }
            }
            Ok(Event::CData(data)) => {
                if let Some(entry) = current.as_mut() {
                    entry.push_text(&xml::cdata(&data));
                }
            }
            Ok(Event::End(end)) => {
                if is_end_named(&end, "entry") {
                    if let Some(done) = current.take() {
                        entries.push(done.finish());
                    }
                } else if let Some(entry) = current.as_mut() {
                    entry.close(&end);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(FeedError::xml("metadata block", e)),
        }
    }

    if let Some(done) = current.take() {
        entries.push(done.finish());
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<feed xmlns="http://www.w3.org/2005/Atom" xmlns:lnpub="http://services.lexisnexis.com/shared/xmlschema/publish/1">
        <entry>
            <id>urn:contentItem:AAA111</id>
            <lnpub:action>add</lnpub:action>
            <lnpub:entrymeta pcsi="SUB1"/>
        </entry>
        <entry>
            <id>urn:contentItem:BBB222</id>
            <lnpub:action>delete</lnpub:action>
            <lnpub:entrymeta pcsi="SUB2"></lnpub:entrymeta>
        </entry>
    </feed>"#;

    #[test]
    fn decodes_namespaced_entries() {
        let entries = decode_entries(FEED).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(
            entries[0],
            Ok(EntryMeta {
                content_id: "AAA111".into(),
                action: ActionType::Add,
                subscription_id: "SUB1".into(),
            })
        );
        assert_eq!(
            entries[1].as_ref().unwrap().action,
            ActionType::Delete
        );
        assert_eq!(entries[1].as_ref().unwrap().subscription_id, "SUB2");
    }

    #[test]
    fn decodes_plain_entry() {
        let block = r#"<entry><id>urn:contentItem:ABC123@lexisnexis.com</id><action>add</action><entrymeta pcsi="SUB1"/></entry>"#;
        let entries = decode_entries(block).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].as_ref().unwrap().content_id, "ABC123");
    }

    #[test]
    fn missing_pcsi_rejects_only_that_entry() {
        let block = r#"<feed>
            <entry><id>urn:contentItem:A</id><action>add</action><entrymeta/></entry>
            <entry><id>urn:contentItem:B</id><action>change</action><entrymeta pcsi="S"/></entry>
        </feed>"#;
        let entries = decode_entries(block).unwrap();
        assert_eq!(
            entries[0],
            Err(EntryDecodeError::MissingField {
                index: 0,
                content_id: Some("A".into()),
                field: "entrymeta/@pcsi",
            })
        );
        assert!(entries[1].is_ok());
    }

    #[test]
    fn missing_id_and_action() {
        let block = r#"<entry><action>add</action><entrymeta pcsi="S"/></entry>
            <entry><id>urn:contentItem:C</id><entrymeta pcsi="S"/></entry>"#;
        let entries = decode_entries(block).unwrap();
        assert!(matches!(
            entries[0],
            Err(EntryDecodeError::MissingField { field: "id", .. })
        ));
        let err = entries[1].clone().unwrap_err();
        assert_eq!(err.content_id(), Some("C"));
        assert!(err.to_string().contains("action"));
    }

    #[test]
    fn unknown_action_is_rejected() {
        let block = r#"<entry><id>urn:contentItem:D</id><action>upsert</action><entrymeta pcsi="S"/></entry>"#;
        let entries = decode_entries(block).unwrap();
        assert_eq!(
            entries[0],
            Err(EntryDecodeError::UnknownAction {
                index: 0,
                content_id: "D".into(),
                value: "upsert".into(),
            })
        );
    }

    #[test]
    fn first_id_wins() {
        let block = r#"<entry><id>urn:contentItem:FIRST</id><source><id>urn:other:SECOND</id></source><action>add</action><entrymeta pcsi="S"/></entry>"#;
        let entries = decode_entries(block).unwrap();
        assert_eq!(entries[0].as_ref().unwrap().content_id, "FIRST");
    }

    #[test]
    fn block_without_entries() {
        assert!(decode_entries("<feed><title>empty</title></feed>")
            .unwrap()
            .is_empty());
        assert!(decode_entries("").unwrap().is_empty());
    }
}
