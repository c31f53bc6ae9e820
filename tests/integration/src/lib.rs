//! Cross-crate tests for the RedPay workspace live in `tests/`.
