//! Wire-format fixtures and temporary output directories.

use lexbulk_feed::{BLOCK_SEPARATOR, CONTENT_ID_DOMAIN, CONTENT_ID_PREFIX};
use lexbulk_storage::FileSink;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Builds an `X-LN-Bulk-File` response header value.
pub fn file_data_header(offset: u64, size: u64, more_data_available: bool) -> String {
    format!(
        "<FileData><offset>{offset}</offset><size>{size}</size>\
         <moreDataAvailable>{more_data_available}</moreDataAvailable></FileData>"
    )
}

/// Returns the identifier line of a content item.
pub fn content_urn(content_id: &str) -> String {
    format!("{CONTENT_ID_PREFIX}{content_id}{CONTENT_ID_DOMAIN}")
}

/// Builds a subscription document linking to the given files.
pub fn subscription_document(file_ids: &[&str]) -> String {
    let epochs: String = file_ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            format!(
                "<epoch><id>{i}</id><link rel=\"file\" \
                 href=\"https://content-api.lexisnexis.com/bulkweb/file/{id}\"/></epoch>"
            )
        })
        .collect();
    format!("<subscription><epochs>{epochs}</epochs></subscription>")
}

/// Builds a multipart delivery payload.
///
/// The header block and the metadata feed come first, followed by the
/// identifier/body blocks in the order they were added.
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    header: String,
    entries: Vec<String>,
    blocks: Vec<String>,
}

impl Default for PayloadBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PayloadBuilder {
    /// Creates a builder with a placeholder header block.
    pub fn new() -> Self {
        Self {
            header: "--bulk-boundary".to_string(),
            entries: Vec::new(),
            blocks: Vec::new(),
        }
    }

    /// Replaces the header block.
    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    /// Adds a well-formed metadata entry.
    pub fn entry(self, content_id: &str, action: &str, subscription_id: &str) -> Self {
        let xml = format!(
            "<entry><id>{}</id><lnpub:action>{action}</lnpub:action>\
             <lnpub:entrymeta pcsi=\"{subscription_id}\"/></entry>",
            content_urn(content_id)
        );
        self.raw_entry(xml)
    }

    /// Adds a metadata entry verbatim.
    pub fn raw_entry(mut self, xml: impl Into<String>) -> Self {
        self.entries.push(xml.into());
        self
    }

    /// Adds an identifier block followed by a body block.
    pub fn body(self, content_id: &str, text: &str) -> Self {
        self.raw_block(content_urn(content_id)).raw_block(text)
    }

    /// Adds a block verbatim after the metadata feed.
    pub fn raw_block(mut self, block: impl Into<String>) -> Self {
        self.blocks.push(block.into());
        self
    }

    /// Returns the metadata feed block.
    pub fn metadata_block(&self) -> String {
        format!(
            "<feed xmlns:lnpub=\"http://www.lexisnexis.com/lnpub\">{}</feed>",
            self.entries.concat()
        )
    }

    /// Joins all blocks with the payload separator.
    pub fn build(&self) -> String {
        let mut parts = vec![self.header.clone(), self.metadata_block()];
        parts.extend(self.blocks.iter().cloned());
        parts.join(BLOCK_SEPARATOR)
    }
}

/// Temporary output and unprocessed directories with a file sink.
///
/// The directories are removed when the value is dropped.
pub struct TestDirs {
    /// Sink rooted at the temporary directory.
    pub sink: FileSink,
    temp_dir: TempDir,
}

impl TestDirs {
    /// Creates a fresh temporary root.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        Self {
            sink: FileSink::new(temp_dir.path()),
            temp_dir,
        }
    }

    /// Returns the temporary root.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Returns a path below the temporary root.
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.temp_dir.path().join(relative)
    }

    /// Reads a file below the temporary root, if it exists.
    pub fn read(&self, relative: impl AsRef<Path>) -> Option<String> {
        std::fs::read_to_string(self.path(relative)).ok()
    }
}

impl Default for TestDirs {
    fn default() -> Self {
        Self::new()
    }
}
