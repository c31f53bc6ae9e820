pub mod error;
pub mod canonical;
pub mod integrity;

pub use canonical::{base_string, canonical_fields, SIGNATURE_FIELD};
pub use error::CryptoError;
pub use integrity::{AuthorizationAccount, IntegrityService, SignedAuthorizationAccount};
