use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Put => write!(f, "PUT"),
        }
    }
}

/// RedPay API operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    GenerateToken,
    RevokeToken,
    ValidateToken,
    AuthorizeToken,
    ValidateAuthorization,
    Chargeback,
    User,
    UserVerify,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Self::GenerateToken => "/payment-token/generate",
            Self::RevokeToken => "/payment-token/revoke",
            Self::ValidateToken => "/payment-token/check",
            Self::AuthorizeToken => "/payment-token/authorize",
            Self::ValidateAuthorization => "/authorization/check",
            Self::Chargeback => "/chargeback",
            Self::User => "/user",
            Self::UserVerify => "/user/verify-enrollment",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}
