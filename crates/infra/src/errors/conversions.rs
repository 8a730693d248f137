//! Conversions from external infrastructure errors into domain errors.

use cadence_domain::CadenceError;
use reqwest::Error as HttpError;

/// Error newtype that keeps conversions on the infrastructure side and
/// can be converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub CadenceError);

impl From<InfraError> for CadenceError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<CadenceError> for InfraError {
    fn from(value: CadenceError) -> Self {
        InfraError(value)
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → CadenceError */
/* -------------------------------------------------------------------------- */

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        let error = if value.is_timeout() {
            CadenceError::Network(format!("http request timed out: {value}"))
        } else if value.is_connect() {
            CadenceError::Network(format!("http connection failed: {value}"))
        } else if let Some(status) = value.status() {
            match status.as_u16() {
                401 | 403 => CadenceError::PermissionDenied(format!("http {status}: {value}")),
                429 => CadenceError::RateLimited(format!("http {status}: {value}")),
                code if status.is_server_error() => {
                    CadenceError::Provider(format!("http {code}: {value}"))
                }
                code => CadenceError::Network(format!("http {code}: {value}")),
            }
        } else if value.is_decode() {
            CadenceError::Provider(format!("malformed http response body: {value}"))
        } else {
            CadenceError::Network(format!("http error: {value}"))
        };
        InfraError(error)
    }
}
