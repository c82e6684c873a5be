//! Interpretation backend API
//!
//! ```text
//! FileHandle ──▶ validate_file ──▶ ApiClient ──▶ Transport ──▶ normalize ──▶ InterpretationRecord
//! ```

mod abort;
mod client;
pub mod envelope;
pub mod http_client;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use abort::AbortSignal;
pub use client::ApiClient;
pub use envelope::{normalize, normalize_with_meta, ApiEnvelope, Normalized, ResponseShape};
pub use transport::{ApiRequest, RawResponse, ReqwestTransport, Transport, TransportError};
pub use types::{
    ChatAnswer, Importance, InterpretationPage, InterpretationRecord, Section, Term, UserProfile,
};
