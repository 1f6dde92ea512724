//! Error types for feed decoding.

use thiserror::Error;

/// Result type for feed decoding.
pub type FeedResult<T> = Result<T, FeedError>;

/// Errors that make a whole document unusable.
///
/// Problems confined to a single entry or block are reported as warnings
/// by the parser instead.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The payload has no metadata block at index 1.
    #[error("payload has {blocks} block(s), metadata block missing")]
    MissingMetadata {
        /// Number of blocks found.
        blocks: usize,
    },

    /// An XML document could not be tokenised.
    #[error("XML error in {context}: {message}")]
    Xml {
        /// Which document was being read.
        context: &'static str,
        /// Underlying error message.
        message: String,
    },

    /// A field had a value that could not be interpreted.
    #[error("invalid value for {field}: {value:?}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// The offending value.
        value: String,
    },
}

impl FeedError {
    pub(crate) fn xml(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Xml {
            context,
            message: err.to_string(),
        }
    }
}
