//! Content identifier extraction.
//!
//! Content items are named by URNs such as
//! `urn:contentItem:5T0K-8X31-JBT7-X0CR-00000-00@lexisnexis.com`; the content
//! id is the part between the prefix and the domain.

/// Prefix that starts every content URN.
pub const CONTENT_ID_PREFIX: &str = "urn:contentItem:";

/// Domain suffix that ends content URNs on identifier lines.
pub const CONTENT_ID_DOMAIN: &str = "@lexisnexis.com";

/// Extracts the content id from a metadata `<id>` value.
///
/// The prefix is removed wherever it occurs and a trailing domain suffix is
/// dropped. Returns `None` when nothing is left.
pub fn metadata_content_id(raw: &str) -> Option<String> {
    let stripped = raw.trim().replace(CONTENT_ID_PREFIX, "");
    let id = stripped
        .strip_suffix(CONTENT_ID_DOMAIN)
        .unwrap_or(&stripped)
        .trim();
    (!id.is_empty()).then(|| id.to_string())
}

/// Extracts the content id from an identifier block.
///
/// The block must contain the URN prefix; the id runs from there to the
/// domain suffix (or the end of the block when the suffix is absent).
/// Returns `None` for blocks that are not identifier lines.
pub fn body_content_id(block: &str) -> Option<String> {
    let (_, rest) = block.split_once(CONTENT_ID_PREFIX)?;
    let id = rest
        .split_once(CONTENT_ID_DOMAIN)
        .map_or(rest, |(id, _)| id)
        .trim();
    (!id.is_empty()).then(|| id.to_string())
}

/// Extracts the content id from a block that is nothing but an identifier
/// line.
///
/// Stricter than [`body_content_id`]: the block must start with the URN
/// prefix and fit on one line, so body text that mentions a URN is not
/// taken for an identifier.
pub fn identifier_line_id(block: &str) -> Option<String> {
    if !block.starts_with(CONTENT_ID_PREFIX) || block.contains(['\n', '\r']) {
        return None;
    }
    body_content_id(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_id_strips_prefix() {
        assert_eq!(
            metadata_content_id("urn:contentItem:ABC123").as_deref(),
            Some("ABC123")
        );
        assert_eq!(
            metadata_content_id(" urn:contentItem:ABC123@lexisnexis.com\n").as_deref(),
            Some("ABC123")
        );
    }

    #[test]
    fn metadata_id_without_prefix_is_kept() {
        assert_eq!(metadata_content_id("ABC123").as_deref(), Some("ABC123"));
        assert_eq!(metadata_content_id("urn:contentItem:"), None);
        assert_eq!(metadata_content_id("   "), None);
    }

    #[test]
    fn body_id_needs_prefix() {
        assert_eq!(
            body_content_id("urn:contentItem:ABC123@lexisnexis.com").as_deref(),
            Some("ABC123")
        );
        assert_eq!(
            body_content_id("Content-ID: <urn:contentItem:5T0K-8X31@lexisnexis.com>").as_deref(),
            Some("5T0K-8X31")
        );
        assert_eq!(body_content_id("Hello world"), None);
    }

    #[test]
    fn body_id_without_domain_runs_to_end() {
        assert_eq!(
            body_content_id("urn:contentItem:XYZ ").as_deref(),
            Some("XYZ")
        );
    }

    #[test]
    fn identifier_line_is_strict() {
        assert_eq!(
            identifier_line_id("urn:contentItem:B@lexisnexis.com").as_deref(),
            Some("B")
        );
        assert_eq!(
            identifier_line_id("See urn:contentItem:B@lexisnexis.com for details"),
            None
        );
        assert_eq!(
            identifier_line_id("urn:contentItem:B@lexisnexis.com\nfollowed by prose"),
            None
        );
    }

    proptest::proptest! {
        #[test]
        fn body_and_metadata_ids_agree(id in "[A-Z0-9][A-Z0-9-]{0,30}") {
            let urn = format!("{CONTENT_ID_PREFIX}{id}{CONTENT_ID_DOMAIN}");
            proptest::prop_assert_eq!(body_content_id(&urn), Some(id.clone()));
            proptest::prop_assert_eq!(metadata_content_id(&urn), Some(id));
        }
    }
}
