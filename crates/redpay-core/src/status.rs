//! Canonical status codes returned by the RedPay network.
//!
//! Codes are opaque strings of the form `NN-NNN` and are compared verbatim.

/// The operation completed successfully.
pub const STATUS_CODE_OK: &str = "00-000";

/// The operation is still in flight on the remote side; the caller should try again.
pub const STATUS_CODE_RETRY: &str = "07-006";

/// The enrolled user does not exist.
pub const STATUS_CODE_USER_NOT_FOUND: &str = "00-011";

/// Whether `code` is the canonical success code.
pub fn is_ok(code: &str) -> bool {
    code == STATUS_CODE_OK
}
