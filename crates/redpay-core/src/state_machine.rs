use std::fmt;

use crate::error::CoreError;

/// Lifecycle of one authorization while it is being reconciled.
///
/// Not persisted: the state only lives for the duration of a webhook call or
/// a polling pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum AuthorizationState {
    /// Awaiting a decision from the remote service.
    Pending,
    /// Validated or pre-authorized.
    Confirmed,
    /// The remote rejected the authorization.
    Failed,
    /// The underlying order was revoked.
    Revoked,
    /// The token has been authorized as many times as it allows.
    ReuseExceeded,
}

impl AuthorizationState {
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for AuthorizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Confirmed => write!(f, "Confirmed"),
            Self::Failed => write!(f, "Failed"),
            Self::Revoked => write!(f, "Revoked"),
            Self::ReuseExceeded => write!(f, "ReuseExceeded"),
        }
    }
}

/// Outcomes observed by the reconciliation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationEvent {
    /// `authorization/check` returned successfully.
    ValidationSucceeded,
    /// The remote answered with a retryable status code.
    RetryRequested,
    /// The remote answered with a terminal error.
    ValidationFailed,
    /// The order backing the webhook is revoked.
    OrderRevoked,
    /// The token's reuse limit has been reached.
    ReuseLimitReached,
    /// A webhook with the OK status code passed every check.
    PreAuthorized,
    /// A webhook carried a non-authorizing status.
    Informational,
}

impl AuthorizationEvent {
    fn target(&self) -> AuthorizationState {
        match self {
            Self::ValidationSucceeded | Self::PreAuthorized => AuthorizationState::Confirmed,
            Self::RetryRequested | Self::Informational => AuthorizationState::Pending,
            Self::ValidationFailed => AuthorizationState::Failed,
            Self::OrderRevoked => AuthorizationState::Revoked,
            Self::ReuseLimitReached => AuthorizationState::ReuseExceeded,
        }
    }
}

/// Valid transitions:
/// - Pending → Pending (RetryRequested, Informational)
/// - Pending → Confirmed (ValidationSucceeded, PreAuthorized)
/// - Pending → Failed (ValidationFailed)
/// - Pending → Revoked (OrderRevoked)
/// - Pending → ReuseExceeded (ReuseLimitReached)
///
/// Every other state is final.
pub struct AuthorizationStateMachine;

impl AuthorizationStateMachine {
    pub fn transition(
        current: AuthorizationState,
        event: AuthorizationEvent,
    ) -> Result<AuthorizationState, CoreError> {
        let new_state = match current {
            AuthorizationState::Pending => event.target(),
            _ => {
                return Err(CoreError::InvalidStateTransition {
                    from: current,
                    to: event.target(),
                });
            }
        };

        tracing::debug!(
            from = %current,
            to = %new_state,
            event = ?event,
            "authorization state transition"
        );

        Ok(new_state)
    }

    pub fn can_transition(current: AuthorizationState, event: AuthorizationEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
