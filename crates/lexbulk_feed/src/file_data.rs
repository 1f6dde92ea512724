//! The `X-LN-Bulk-File` pagination header.
//!
//! Requests carry `<FileData><offset>..</offset><subscriptionGUID>..</subscriptionGUID></FileData>`;
//! responses answer with `<FileData>` holding `offset`, `size` and
//! `moreDataAvailable`.

use crate::error::{FeedError, FeedResult};
use crate::xml::{self, is_end_named, is_named};
use quick_xml::escape::escape;
use quick_xml::events::Event;

/// Name of the request and response header carrying [`FileData`].
pub const BULK_FILE_HEADER: &str = "X-LN-Bulk-File";

/// Media type used for `Accept` and `Content-Type` on file requests.
pub const BULK_MEDIA_TYPE: &str = "application/x-bulk-multipart+xml; version=1.0";

/// Pagination metadata reported by the server for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileData {
    /// Offset to request next.
    pub offset: Option<u64>,
    /// Total size of the file.
    pub size: Option<u64>,
    /// Whether another page follows.
    pub more_data_available: bool,
}

impl FileData {
    /// Encodes the request header for `offset` within `subscription_id`.
    pub fn request_header(offset: u64, subscription_id: &str) -> String {
        format!(
            "<FileData><offset>{offset}</offset><subscriptionGUID>{}</subscriptionGUID></FileData>",
            escape(subscription_id)
        )
    }

    /// Decodes a response header.
    ///
    /// Missing or empty fields decode to `None`. `moreDataAvailable` is only
    /// true when its text is `true`.
    ///
    /// # Errors
    ///
    /// Returns an error if the XML cannot be read or a number is invalid.
    pub fn parse(header: &str) -> FeedResult<Self> {
        #[derive(Clone, Copy)]
        enum Field {
            Offset,
            Size,
            More,
        }

        let mut reader = xml::lenient_reader(header);
        let mut field = None;
        let mut offset = String::new();
        let mut size = String::new();
        let mut more = String::new();

        loop {
            match reader.read_event() {
                Ok(Event::Start(start)) => {
                    field = if is_named(&start, "offset") {
                        Some(Field::Offset)
                    } else if is_named(&start, "size") {
                        Some(Field::Size)
                    } else if is_named(&start, "moreDataAvailable") {
                        Some(Field::More)
                    } else {
                        None
                    };
                }
                Ok(Event::Text(text)) => {
                    let value = xml::text(&text);
                    match field {
                        Some(Field::Offset) => offset.push_str(&value),
                        Some(Field::Size) => size.push_str(&value),
                        Some(Field::More) => more.push_str(&value),
                        None => {}
                    }
                }
                Ok(Event::End(end)) => {
                    if is_end_named(&end, "offset")
                        || is_end_named(&end, "size")
                        || is_end_named(&end, "moreDataAvailable")
                    {
                        field = None;
                    }
                }
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => return Err(FeedError::xml("FileData header", e)),
            }
        }

        Ok(Self {
            offset: parse_number("offset", &offset)?,
            size: parse_number("size", &size)?,
            more_data_available: more.trim().eq_ignore_ascii_case("true"),
        })
    }
}

fn parse_number(field: &'static str, value: &str) -> FeedResult<Option<u64>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| FeedError::InvalidValue {
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_header_format() {
        assert_eq!(
            FileData::request_header(0, "SUB1"),
            "<FileData><offset>0</offset><subscriptionGUID>SUB1</subscriptionGUID></FileData>"
        );
    }

    #[test]
    fn request_header_escapes_subscription() {
        let header = FileData::request_header(5, "a<b");
        assert!(header.contains("a&lt;b"));
    }

    #[test]
    fn parse_full_header() {
        let data = FileData::parse(
            "<FileData><offset>2048</offset><size>10000</size><moreDataAvailable>true</moreDataAvailable></FileData>",
        )
        .unwrap();
        assert_eq!(data.offset, Some(2048));
        assert_eq!(data.size, Some(10000));
        assert!(data.more_data_available);
    }

    #[test]
    fn parse_last_page() {
        let data = FileData::parse(
            "<FileData><offset>10000</offset><size>10000</size><moreDataAvailable>false</moreDataAvailable></FileData>",
        )
        .unwrap();
        assert!(!data.more_data_available);
    }

    #[test]
    fn missing_fields_are_none() {
        let data = FileData::parse("<FileData><size>12</size></FileData>").unwrap();
        assert_eq!(data.offset, None);
        assert_eq!(data.size, Some(12));
        assert!(!data.more_data_available);

        let data = FileData::parse("<FileData><offset/><moreDataAvailable/></FileData>").unwrap();
        assert_eq!(data, FileData::default());
    }

    #[test]
    fn invalid_number_is_an_error() {
        let result = FileData::parse("<FileData><offset>ten</offset></FileData>");
        assert!(matches!(
            result,
            Err(FeedError::InvalidValue { field: "offset", .. })
        ));
    }

    #[test]
    fn namespaced_and_mixed_case_fields() {
        let data = FileData::parse(
            "<ln:FileData xmlns:ln=\"urn:x\"><ln:OFFSET> 7 </ln:OFFSET><ln:moredataavailable>TRUE</ln:moredataavailable></ln:FileData>",
        )
        .unwrap();
        assert_eq!(data.offset, Some(7));
        assert!(data.more_data_available);
    }
}
