//! Change records and change sets.

use crate::action::ActionType;
use crate::metadata::EntryMeta;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::{self, BTreeMap};

/// Returns the storage key of a content item: `subscriptions/{S}/{C}`.
pub fn destination_key(subscription_id: &str, content_id: &str) -> String {
    format!("subscriptions/{subscription_id}/{content_id}")
}

/// One logical content item inside a payload.
///
/// Records are assembled from two sections of the payload: the metadata
/// block supplies `action_type`, `subscription_id` and `destination_key`,
/// the identifier/body blocks supply `text`. A record seen only in the body
/// blocks keeps the metadata fields empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Content id.
    pub content_id: String,
    /// Declared action, if the metadata block listed this id.
    pub action_type: Option<ActionType>,
    /// Owning subscription.
    pub subscription_id: Option<String>,
    /// Full text body.
    pub text: Option<String>,
    /// Derived storage key (`subscriptions/{S}/{C}`).
    pub destination_key: Option<String>,
}

impl ChangeRecord {
    /// Creates a record with only its id set.
    pub fn new(content_id: impl Into<String>) -> Self {
        Self {
            content_id: content_id.into(),
            action_type: None,
            subscription_id: None,
            text: None,
            destination_key: None,
        }
    }

    /// Returns true if the record is declared as an `Add`.
    pub fn is_add(&self) -> bool {
        self.action_type == Some(ActionType::Add)
    }

    /// Returns the text body if it is present and non-empty.
    pub fn non_empty_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    /// Overwrites the metadata-derived fields.
    pub fn apply_metadata(&mut self, meta: &EntryMeta) {
        self.action_type = Some(meta.action);
        self.destination_key = Some(destination_key(&meta.subscription_id, &self.content_id));
        self.subscription_id = Some(meta.subscription_id.clone());
    }
}

/// Records of one payload keyed by content id.
///
/// Iteration is in content-id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    records: BTreeMap<String, ChangeRecord>,
}

impl ChangeSet {
    /// Creates an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if there are no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Looks up a record.
    pub fn get(&self, content_id: &str) -> Option<&ChangeRecord> {
        self.records.get(content_id)
    }

    /// Iterates over the records.
    pub fn iter(&self) -> impl Iterator<Item = &ChangeRecord> {
        self.records.values()
    }

    /// Returns the record for `content_id`, creating an empty one if needed.
    pub fn record_mut(&mut self, content_id: &str) -> &mut ChangeRecord {
        self.records
            .entry(content_id.to_string())
            .or_insert_with(|| ChangeRecord::new(content_id))
    }

    /// Seeds or overwrites a record from a metadata entry.
    pub fn apply_metadata(&mut self, meta: &EntryMeta) {
        self.record_mut(&meta.content_id).apply_metadata(meta);
    }

    /// Sets the text of a record, creating it if the metadata never listed it.
    pub fn attach_text(&mut self, content_id: &str, text: impl Into<String>) {
        self.record_mut(content_id).text = Some(text.into());
    }

    /// Inserts a complete record, replacing any record with the same id.
    pub fn insert(&mut self, record: ChangeRecord) {
        self.records.insert(record.content_id.clone(), record);
    }
}

impl IntoIterator for ChangeSet {
    type Item = ChangeRecord;
    type IntoIter = btree_map::IntoValues<String, ChangeRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_values()
    }
}

impl FromIterator<ChangeRecord> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = ChangeRecord>>(iter: I) -> Self {
        let mut set = ChangeSet::new();
        for record in iter {
            set.insert(record);
        }
        set
    }
}
