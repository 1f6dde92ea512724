//! Small helpers over `quick_xml` shared by the decoders.
//!
//! The feed's XML is matched on local names, case-insensitively, so
//! `lnpub:action`, `action` and `ACTION` are the same element.

use quick_xml::events::{BytesCData, BytesStart, BytesText};
use quick_xml::Reader;

/// Creates a lenient reader: text is trimmed and mismatched end tags are
/// tolerated.
pub(crate) fn lenient_reader(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    let config = reader.config_mut();
    config.trim_text(true);
    config.check_end_names = false;
    reader
}

/// Returns true if the element's local name is `name`.
pub(crate) fn is_named(start: &BytesStart<'_>, name: &str) -> bool {
    start
        .local_name()
        .as_ref()
        .eq_ignore_ascii_case(name.as_bytes())
}

/// Returns true if the end tag's local name is `name`.
pub(crate) fn is_end_named(end: &quick_xml::events::BytesEnd<'_>, name: &str) -> bool {
    end.local_name()
        .as_ref()
        .eq_ignore_ascii_case(name.as_bytes())
}

/// Reads an attribute by local name, ignoring malformed attributes.
pub(crate) fn attribute(start: &BytesStart<'_>, name: &str) -> Option<String> {
    let mut attributes = start.attributes();
    attributes.with_checks(false);
    attributes
        .flatten()
        .find(|attr| {
            attr.key
                .local_name()
                .as_ref()
                .eq_ignore_ascii_case(name.as_bytes())
        })
        .map(|attr| match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        })
}

/// Text content with entities resolved where possible.
pub(crate) fn text(text: &BytesText<'_>) -> String {
    match text.unescape() {
        Ok(value) => value.into_owned(),
        Err(_) => String::from_utf8_lossy(text).into_owned(),
    }
}

pub(crate) fn cdata(cdata: &BytesCData<'_>) -> String {
    String::from_utf8_lossy(cdata).into_owned()
}
