//! Classification client: request lifecycle, cancellation, latest-wins sessions.

pub mod cancel;
pub mod controller;
mod error;
pub mod session;
pub mod transport;

#[cfg(test)]
mod testing;

#[cfg(feature = "http")]
pub mod http;

pub use cancel::CancelToken;
pub use controller::{Attempt, AttemptState, Classifier, Outcome};
pub use error::ClientError;
pub use session::Session;
pub use transport::{Transport, TransportResponse};

#[cfg(feature = "http")]
pub use http::HttpTransport;
