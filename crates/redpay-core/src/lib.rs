pub mod error;
pub mod status;
pub mod secret;
pub mod types;
pub mod api_error;
pub mod config;
pub mod state_machine;

pub use api_error::ApiError;
pub use config::{
    AccountConfig, AccountsConfig, AuthorizationMode, CertificateConfig, ConfigSlot, Enroller,
    Environment, LoggingConfig, ReconcileConfig, RedPayConfig, Secrets,
};
pub use error::{ConfigError, CoreError};
pub use secret::Secret;
pub use state_machine::{AuthorizationEvent, AuthorizationState, AuthorizationStateMachine};
pub use types::{
    AuthorizeOrder, Order, UserType, ValidateAuthorizationRequest, ValidateAuthorizationResponse,
    WebhookOperations, WebhookPreAuthorization,
};
