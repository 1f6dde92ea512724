//! Request credentials.
//!
//! Every call carries an `Authorization` header and an `X-LN-Request`
//! request token. How the access token is obtained is up to the caller.

use crate::error::{SyncError, SyncResult};
use uuid::Uuid;

/// Header carrying the per-request token.
pub const REQUEST_TOKEN_HEADER: &str = "X-LN-Request";

/// Supplies the credential headers attached to every request.
pub trait CredentialProvider: Send + Sync {
    /// Value of the `Authorization` header.
    fn authorization(&self) -> SyncResult<String>;

    /// Value of the `X-LN-Request` header. Generated fresh for each call.
    fn request_token(&self) -> String {
        request_token(Uuid::new_v4())
    }
}

/// Builds the compact `rt:requestToken` document for a transaction.
pub fn request_token(transaction_id: Uuid) -> String {
    format!(
        "<rt:requestToken xmlns:rt=\"http://services.lexisnexis.com/xmlschema/request-token/1\">\
         <transactionID>{transaction_id}</transactionID>\
         <sequence>1</sequence>\
         <featurePermID></featurePermID>\
         <clientID>-1</clientID>\
         <cpmFeatureCode>22</cpmFeatureCode>\
         </rt:requestToken>"
    )
}

/// An already issued OAuth access token.
#[derive(Clone)]
pub struct BearerCredentials {
    access_token: String,
}

impl BearerCredentials {
    /// Wraps an access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }
}

impl std::fmt::Debug for BearerCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BearerCredentials")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl CredentialProvider for BearerCredentials {
    fn authorization(&self) -> SyncResult<String> {
        let token = self.access_token.trim();
        if token.is_empty() {
            return Err(SyncError::Credentials("empty access token".into()));
        }
        Ok(format!("Bearer {token}"))
    }
}
