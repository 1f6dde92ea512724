//! Offset-based retrieval of one delivery file.
//!
//! The server hands out a file in pages. Each response reports the next
//! offset and whether more data is available through the `X-LN-Bulk-File`
//! header; the pager follows those offsets until the server stops, the body
//! comes back empty, or the metadata can no longer be trusted.

use crate::config::PagerConfig;
use crate::error::SyncResult;
use crate::transport::FeedTransport;
use lexbulk_feed::{FileData, FileHandle, PageResult};
use lexbulk_storage::StorageSink;
use tracing::{debug, info, warn};

/// File name of a persisted page.
pub fn page_file_name(subscription_id: &str, file_id: &str, offset: u64) -> String {
    format!("{subscription_id}-{file_id}-{offset}.txt")
}

/// Starts page sessions for delivery files.
pub struct Pager<'a, T: FeedTransport, S: StorageSink> {
    transport: &'a T,
    sink: &'a S,
    config: &'a PagerConfig,
}

impl<'a, T: FeedTransport, S: StorageSink> Pager<'a, T, S> {
    /// Creates a pager.
    ///
    /// `sink` is only written to when `config.write_pages` is set.
    pub fn new(transport: &'a T, sink: &'a S, config: &'a PagerConfig) -> Self {
        Self {
            transport,
            sink,
            config,
        }
    }

    /// Returns the lazy page sequence of one file, starting at offset 0.
    ///
    /// In page-writing mode the page directory is created before the first
    /// request, the pages are stored and the sequence only yields errors.
    pub fn fetch_all(&self, file_id: &str, subscription_id: &str) -> Pages<'a, T, S> {
        Pages {
            transport: self.transport,
            sink: self.sink,
            config: self.config,
            handle: FileHandle::new(file_id, subscription_id),
            finished: false,
            directory_ready: false,
            pages_fetched: 0,
        }
    }

    /// Drains a file's page sequence and returns the number of pages.
    ///
    /// # Errors
    ///
    /// Returns the first transport or storage error.
    pub fn drain(&self, file_id: &str, subscription_id: &str) -> SyncResult<u64> {
        let mut pages = self.fetch_all(file_id, subscription_id);
        for page in pages.by_ref() {
            page?;
        }
        Ok(pages.pages_fetched())
    }
}

/// The page sequence of one file.
///
/// Not restartable: the cursor lives inside and only moves forward. The
/// sequence ends after the first error.
pub struct Pages<'a, T: FeedTransport, S: StorageSink> {
    transport: &'a T,
    sink: &'a S,
    config: &'a PagerConfig,
    handle: FileHandle,
    finished: bool,
    directory_ready: bool,
    pages_fetched: u64,
}

impl<T: FeedTransport, S: StorageSink> Pages<'_, T, S> {
    /// Returns the file handle with its current cursor.
    pub fn handle(&self) -> &FileHandle {
        &self.handle
    }

    /// Returns the number of non-empty pages received.
    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    fn fetch_next(&mut self) -> SyncResult<Option<PageResult>> {
        let request = self.handle.request();
        debug!(
            file_id = %request.file_id,
            subscription_id = %request.subscription_id,
            offset = request.offset,
            "requesting page"
        );

        let raw = self.transport.fetch_page(&request)?;
        if raw.body.is_empty() {
            debug!(file_id = %request.file_id, offset = request.offset, "no data at offset");
            return Ok(None);
        }

        let file_data = match raw.file_data.as_deref() {
            Some(header) => FileData::parse(header).unwrap_or_else(|e| {
                warn!(file_id = %request.file_id, error = %e, "unreadable page metadata, stopping after this page");
                FileData::default()
            }),
            None => {
                debug!(file_id = %request.file_id, "no page metadata, stopping after this page");
                FileData::default()
            }
        };

        if file_data.size.is_some() {
            self.handle.total_size = file_data.size;
        }
        self.pages_fetched += 1;
        info!(
            file_id = %request.file_id,
            offset = ?file_data.offset,
            total = ?file_data.size,
            "processed offset {} of {}",
            file_data.offset.map_or_else(|| "?".to_string(), |o| o.to_string()),
            file_data.size.map_or_else(|| "?".to_string(), |s| s.to_string())
        );

        let advanced = file_data
            .offset
            .is_some_and(|offset| self.handle.advance_to(offset));
        if !file_data.more_data_available {
            self.finished = true;
        } else if !advanced {
            warn!(
                file_id = %request.file_id,
                cursor = self.handle.cursor_offset,
                reported = ?file_data.offset,
                "more data announced but offset does not advance, stopping"
            );
            self.finished = true;
        }

        Ok(Some(PageResult {
            payload: raw.body,
            offset: request.offset,
            reported_offset: file_data.offset,
            reported_total: file_data.size,
            has_more: file_data.more_data_available,
        }))
    }

    fn prepare_page_dir(&mut self) -> SyncResult<()> {
        if self.config.write_pages && !self.directory_ready {
            self.sink.ensure_directory(&self.config.page_dir)?;
            self.directory_ready = true;
        }
        Ok(())
    }

    fn persist(&self, page: &PageResult) -> SyncResult<()> {
        let name = page_file_name(
            &self.handle.subscription_id,
            &self.handle.file_id,
            page.offset,
        );
        self.sink
            .write_bytes(&self.config.page_dir.join(name), page.payload.as_bytes())?;
        Ok(())
    }
}

impl<T: FeedTransport, S: StorageSink> Iterator for Pages<'_, T, S> {
    type Item = SyncResult<PageResult>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.finished {
            if let Err(e) = self.prepare_page_dir() {
                self.finished = true;
                return Some(Err(e));
            }
        }
        while !self.finished {
            match self.fetch_next() {
                Ok(Some(page)) if !self.config.write_pages => return Some(Ok(page)),
                Ok(Some(page)) => {
                    if let Err(e) = self.persist(&page) {
                        self.finished = true;
                        return Some(Err(e));
                    }
                }
                Ok(None) => self.finished = true,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}
