use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::http::request::Parts;

pub mod chat;
pub mod menu;
pub mod orders;
pub mod session;

const X_CUSTOMER_NAME: &str = "X-Customer-Name";

/// Collapses case and whitespace runs so repeated logins by the same
/// customer resolve to one conversation record. Idempotent.
pub fn normalize_customer_key(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalized customer identity taken from the `X-Customer-Name` header.
#[derive(Debug)]
pub struct ExtractCustomer(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for ExtractCustomer
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Self, (StatusCode, &'static str)> {
        if let Some(name) = parts.headers.get(X_CUSTOMER_NAME) {
            let name = name
                .to_str()
                .map_err(|_| (StatusCode::BAD_REQUEST, "invalid customer name"))?;
            let key = normalize_customer_key(name);
            if key.is_empty() {
                return Err((StatusCode::BAD_REQUEST, "invalid customer name"));
            }
            Ok(ExtractCustomer(key))
        } else {
            Err((
                StatusCode::BAD_REQUEST,
                "`X-Customer-Name` header is missing",
            ))
        }
    }
}
