use actix_web::http::header::AUTHORIZATION;
use actix_web::HttpRequest;

use crate::config::Config;

/// Token of the `Authorization: Bearer <token>` header, if present.
pub fn extract_authorization_token(request: &HttpRequest) -> Option<String> {
    let header = request.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Whether `token` matches the configured admin token.
/// Always `false` when no admin token is configured.
pub fn is_admin_token(config: &Config, token: &str) -> bool {
    let Some(expected) = config.admin_token.as_deref() else {
        return false;
    };
    // compare every byte so the time taken doesn't depend on the matching prefix
    expected.len() == token.len()
        && expected
            .bytes()
            .zip(token.bytes())
            .fold(0, |acc, (a, b)| acc | (a ^ b))
            == 0
}
