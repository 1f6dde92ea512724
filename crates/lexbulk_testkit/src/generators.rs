//! Property-based test generators using proptest.
//!
//! Provides strategies for content ids, actions, records and whole change
//! sets, plus payload descriptions that can be rendered with
//! [`PayloadBuilder`](crate::PayloadBuilder).

use crate::fixtures::PayloadBuilder;
use lexbulk_feed::{destination_key, ActionType, ChangeRecord, ChangeSet};
use proptest::prelude::*;

/// Strategy for vendor-style content ids (`XXXX-XXXX-XXXX-XXXX-00000-00`).
pub fn content_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[0-9A-Z]{4}-[0-9A-Z]{4}-[0-9A-Z]{4}-[0-9A-Z]{4}-0{5}-0{2}")
        .expect("Invalid regex")
}

/// Strategy for subscription ids.
pub fn subscription_id_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9]{8}-[a-z0-9]{4}").expect("Invalid regex")
}

/// Strategy for action types.
pub fn action_strategy() -> impl Strategy<Value = ActionType> {
    prop::sample::select(ActionType::ALL.to_vec())
}

/// Strategy for body text without block separators or surrounding spaces.
pub fn body_text_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[A-Za-z0-9.,<>/]([A-Za-z0-9 .,<>/]{0,62}[A-Za-z0-9.,<>/])?")
        .expect("Invalid regex")
}

/// Strategy for a single change record.
///
/// Covers records with and without metadata and with missing or empty text.
pub fn change_record_strategy() -> impl Strategy<Value = ChangeRecord> {
    (
        content_id_strategy(),
        prop::option::of((action_strategy(), subscription_id_strategy())),
        prop::option::of(prop_oneof![Just(String::new()), body_text_strategy()]),
    )
        .prop_map(|(content_id, meta, text)| {
            let mut record = ChangeRecord::new(content_id);
            if let Some((action, subscription_id)) = meta {
                record.action_type = Some(action);
                record.destination_key = Some(destination_key(&subscription_id, &record.content_id));
                record.subscription_id = Some(subscription_id);
            }
            record.text = text;
            record
        })
}

/// Strategy for a change set of up to `max` records.
pub fn change_set_strategy(max: usize) -> impl Strategy<Value = ChangeSet> {
    prop::collection::vec(change_record_strategy(), 0..=max)
        .prop_map(|records| records.into_iter().collect())
}

/// One content item of a generated payload.
#[derive(Debug, Clone)]
pub struct PayloadItem {
    /// Content id.
    pub content_id: String,
    /// Metadata entry, if the item is listed in the metadata block.
    pub meta: Option<(ActionType, String)>,
    /// Body text, if the item has an identifier/body pair.
    pub text: Option<String>,
}

/// Strategy for payload items with distinct content ids.
pub fn payload_items_strategy(max: usize) -> impl Strategy<Value = Vec<PayloadItem>> {
    prop::collection::btree_map(
        content_id_strategy(),
        (
            prop::option::of((action_strategy(), subscription_id_strategy())),
            prop::option::of(body_text_strategy()),
        ),
        0..=max,
    )
    .prop_map(|items| {
        items
            .into_iter()
            .map(|(content_id, (meta, text))| PayloadItem {
                content_id,
                meta,
                text,
            })
            .collect()
    })
}

/// Renders payload items into a payload.
pub fn render_payload(items: &[PayloadItem]) -> String {
    let mut builder = PayloadBuilder::new();
    for item in items {
        if let Some((action, subscription_id)) = &item.meta {
            builder = builder.entry(&item.content_id, action.as_str(), subscription_id);
        }
    }
    for item in items {
        if let Some(text) = &item.text {
            builder = builder.body(&item.content_id, text);
        }
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::test_runner::TestRunner;

    #[test]
    fn content_ids_are_plain_names() {
        let mut runner = TestRunner::default();
        runner
            .run(&content_id_strategy(), |id| {
                prop_assert_eq!(id.matches('-').count(), 5);
                prop_assert!(!id.contains('/'));
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn change_sets_respect_max() {
        let mut runner = TestRunner::default();
        runner
            .run(&change_set_strategy(4), |set| {
                prop_assert!(set.len() <= 4);
                Ok(())
            })
            .unwrap();
    }
}
