//! Paging types for multi-part file retrieval.

use crate::file_data::FileData;

/// One remote file within one subscription, plus its read cursor.
///
/// The cursor only moves forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    /// File id.
    pub file_id: String,
    /// Owning subscription id.
    pub subscription_id: String,
    /// Offset of the next request.
    pub cursor_offset: u64,
    /// Total size, once the server has reported it.
    pub total_size: Option<u64>,
}

impl FileHandle {
    /// Creates a handle positioned at offset 0.
    pub fn new(file_id: impl Into<String>, subscription_id: impl Into<String>) -> Self {
        Self {
            file_id: file_id.into(),
            subscription_id: subscription_id.into(),
            cursor_offset: 0,
            total_size: None,
        }
    }

    /// Builds the request for the current cursor.
    pub fn request(&self) -> PageRequest {
        PageRequest {
            file_id: self.file_id.clone(),
            subscription_id: self.subscription_id.clone(),
            offset: self.cursor_offset,
        }
    }

    /// Moves the cursor to `offset` if that is strictly ahead.
    ///
    /// Returns false (and leaves the cursor alone) otherwise.
    pub fn advance_to(&mut self, offset: u64) -> bool {
        if offset > self.cursor_offset {
            self.cursor_offset = offset;
            true
        } else {
            false
        }
    }
}

/// A request for one page of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// File id.
    pub file_id: String,
    /// Owning subscription id.
    pub subscription_id: String,
    /// Offset to read from.
    pub offset: u64,
}

impl PageRequest {
    /// Encodes the `X-LN-Bulk-File` request header.
    pub fn file_data_header(&self) -> String {
        FileData::request_header(self.offset, &self.subscription_id)
    }
}

/// A page as returned by the transport, before interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawPage {
    /// Response body. Empty means no data at this offset.
    pub body: String,
    /// Value of the `X-LN-Bulk-File` response header, if present.
    pub file_data: Option<String>,
}

impl RawPage {
    /// Creates a raw page.
    pub fn new(body: impl Into<String>, file_data: Option<String>) -> Self {
        Self {
            body: body.into(),
            file_data,
        }
    }
}

/// One retrieved chunk of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    /// Raw payload text.
    pub payload: String,
    /// Offset this page was requested at.
    pub offset: u64,
    /// Next offset reported by the server.
    pub reported_offset: Option<u64>,
    /// Total size reported by the server.
    pub reported_total: Option<u64>,
    /// Whether the server announced another page.
    pub has_more: bool,
}
