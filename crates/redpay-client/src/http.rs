use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use redpay_core::{ApiError, RedPayConfig, Secret};
use redpay_crypto::{CryptoError, IntegrityService, SIGNATURE_FIELD};

use crate::endpoints::{Endpoint, HttpMethod};
use crate::error::ClientError;
use crate::traits::Transport;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTPS client that authenticates with a client certificate and signs
/// every request body with the integrity secret.
pub struct SignedHttpClient {
    client: reqwest::Client,
    base_url: String,
    integrity: Secret,
}

impl SignedHttpClient {
    /// Build the mTLS client described by `config`.
    pub fn from_config(config: &RedPayConfig) -> Result<Self, ClientError> {
        let cert = read_pem(&config.certificate.cert_path)?;
        let key = read_pem(&config.certificate.key_path)?;
        let identity = reqwest::Identity::from_pkcs8_pem(&cert, &key)?;

        let client = reqwest::Client::builder()
            .identity(identity)
            .danger_accept_invalid_certs(!config.certificate.verify_ssl)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        if !config.certificate.verify_ssl {
            tracing::warn!("server certificate verification is disabled");
        }

        Ok(Self::with_client(
            client,
            config.base_url(),
            config.secrets.integrity.clone(),
        ))
    }

    /// Use a preconfigured `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>, integrity: Secret) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            integrity,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn get(&self, endpoint: Endpoint, params: Value) -> Result<Value, ClientError> {
        self.send(HttpMethod::Get, endpoint, params).await
    }

    pub async fn post(&self, endpoint: Endpoint, body: Value) -> Result<Value, ClientError> {
        self.send(HttpMethod::Post, endpoint, body).await
    }

    pub async fn put(&self, endpoint: Endpoint, body: Value) -> Result<Value, ClientError> {
        self.send(HttpMethod::Put, endpoint, body).await
    }
}

#[async_trait]
impl Transport for SignedHttpClient {
    async fn send(
        &self,
        method: HttpMethod,
        endpoint: Endpoint,
        payload: Value,
    ) -> Result<Value, ClientError> {
        let request_id = uuid::Uuid::now_v7();
        let url = format!("{}{}", self.base_url, endpoint.path());
        let signed = IntegrityService::attach_signature(&payload, &self.integrity)?;

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = endpoint.path(),
            "sending signed request"
        );

        let request = match method {
            HttpMethod::Get => self.client.get(&url).query(&query_pairs(&signed)),
            HttpMethod::Post => self.client.post(&url).json(&signed),
            HttpMethod::Put => self.client.put(&url).json(&signed),
        };

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let err = ApiError::from_response(status.as_u16(), &body);
            tracing::warn!(
                request_id = %request_id,
                http_status = status.as_u16(),
                status_code = err.status_code().unwrap_or("-"),
                "request rejected"
            );
            return Err(ClientError::Api(err));
        }

        let value = parse_body(&body)?;
        verify_response(&value, &self.integrity)?;

        tracing::debug!(request_id = %request_id, http_status = status.as_u16(), "request completed");
        Ok(value)
    }
}

fn read_pem(path: &Path) -> Result<Vec<u8>, ClientError> {
    std::fs::read(path).map_err(|source| ClientError::Certificate {
        path: path.to_path_buf(),
        source,
    })
}

/// Flatten a signed object into query parameters. Strings are sent bare.
fn query_pairs(value: &Value) -> Vec<(String, String)> {
    value
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| match v {
                    Value::String(s) => (k.clone(), s.clone()),
                    other => (k.clone(), other.to_string()),
                })
                .collect()
        })
        .unwrap_or_default()
}

fn parse_body(body: &str) -> Result<Value, ClientError> {
    if body.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    Ok(serde_json::from_str(body)?)
}

/// Reject signed responses whose signature does not match.
///
/// Responses without a `signature` field are passed through unchecked.
pub(crate) fn verify_response(value: &Value, integrity: &Secret) -> Result<(), ClientError> {
    let signed = value
        .as_object()
        .is_some_and(|fields| fields.contains_key(SIGNATURE_FIELD));
    if !signed {
        return Ok(());
    }

    match IntegrityService::verify_or_fail(value, integrity) {
        Ok(()) => Ok(()),
        Err(CryptoError::InvalidSignature) => {
            tracing::error!("response signature mismatch, discarding body");
            Err(ClientError::InvalidSignature)
        }
        Err(other) => Err(ClientError::Crypto(other)),
    }
}
