use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;

use crate::error::ApiError;

/// Token presented by the caller; the `Authorization: Bearer` header wins
/// over the `token` query parameter.
pub fn presented_token<'a>(
    header: Option<&'a Authorization<Bearer>>,
    query_token: Option<&'a str>,
) -> Option<&'a str> {
    header.map(|auth| auth.token()).or(query_token)
}

pub fn verify_token(
    expected: &str,
    header: Option<&Authorization<Bearer>>,
    query_token: Option<&str>,
) -> Result<(), ApiError> {
    match presented_token(header, query_token) {
        Some(token) if token == expected => Ok(()),
        Some(_) => Err(ApiError::Unauthorized("Invalid authentication token".into())),
        None => Err(ApiError::Unauthorized("Missing authentication token".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_token_header() {
        let auth = Authorization::bearer("secret").unwrap();
        assert!(verify_token("secret", Some(&auth), None).is_ok());
    }

    #[test]
    fn test_verify_token_query() {
        assert!(verify_token("secret", None, Some("secret")).is_ok());
        assert!(verify_token("secret", None, Some("bad")).is_err());
        assert!(verify_token("secret", None, None).is_err());
    }

    #[test]
    fn test_header_takes_precedence() {
        let auth = Authorization::bearer("from-header").unwrap();
        assert_eq!(presented_token(Some(&auth), Some("from-query")), Some("from-header"));
        assert!(verify_token("from-query", Some(&auth), Some("from-query")).is_err());
    }
}
