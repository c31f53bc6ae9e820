pub mod error;
pub mod endpoints;
pub mod traits;
pub mod http;
pub mod service;

pub use endpoints::{Endpoint, HttpMethod};
pub use error::ClientError;
pub use http::SignedHttpClient;
pub use service::{RedPayService, Role};
pub use traits::{RemoteClient, Transport};
