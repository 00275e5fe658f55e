use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::domain::identity::{Author, Identity};
use crate::{usecase::jwt::TokenType, AppState};

/// Identity resolved for one request. A verified Bearer token yields a
/// user id; otherwise the caller may supply `X-Guest-Token` (an opaque
/// client-generated voting capability) and `X-Guest-Name` (the display
/// name guest authorship is matched against). All are optional; the feed
/// is readable anonymously.
#[derive(Clone, Debug, Default)]
pub struct RequestIdentity {
    pub user_id: Option<Uuid>,
    pub guest_token: Option<String>,
    pub guest_name: Option<String>,
}

impl RequestIdentity {
    pub fn voter(&self) -> Option<Identity> {
        if let Some(user_id) = self.user_id {
            return Some(Identity::User(user_id));
        }
        self.guest_token.clone().map(Identity::Guest)
    }

    pub fn author(&self) -> Option<Author> {
        if let Some(user_id) = self.user_id {
            return Some(Author::User(user_id));
        }
        self.guest_name.clone().map(Author::Guest)
    }
}

fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

/// Resolves the request identity. A present but invalid Bearer token is
/// rejected rather than downgraded to a guest.
pub async fn identity_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, String)> {
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok());

    let user_id = match auth_header {
        Some(header) if header.starts_with("Bearer ") => {
            let token = header.strip_prefix("Bearer ").unwrap_or_default();

            let claims = state.jwt_service.validate_token(token).map_err(|e| {
                tracing::warn!(?e, "invalid token");
                (StatusCode::UNAUTHORIZED, format!("Invalid token: {}", e))
            })?;

            if claims.token_type != TokenType::Access {
                tracing::warn!("attempted to use non-access token for authentication");
                return Err((StatusCode::UNAUTHORIZED, "Invalid token type".to_string()));
            }

            let user_id = Uuid::parse_str(&claims.sub).map_err(|e| {
                tracing::error!(?e, "failed to parse user_id from token");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Invalid user ID in token".to_string(),
                )
            })?;

            Some(user_id)
        }
        Some(_) => {
            tracing::warn!("malformed authorization header");
            return Err((
                StatusCode::UNAUTHORIZED,
                "Invalid Authorization header".to_string(),
            ));
        }
        None => None,
    };

    let identity = RequestIdentity {
        user_id,
        guest_token: header_value(&request, "X-Guest-Token"),
        guest_name: header_value(&request, "X-Guest-Name"),
    };

    tracing::debug!(?identity, "request identity resolved");
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voter_prefers_user_over_guest_token() {
        let user_id = Uuid::new_v4();
        let identity = RequestIdentity {
            user_id: Some(user_id),
            guest_token: Some("g1".to_string()),
            guest_name: None,
        };
        assert_eq!(identity.voter(), Some(Identity::User(user_id)));
    }

    #[test]
    fn test_voter_falls_back_to_guest_token() {
        let identity = RequestIdentity {
            user_id: None,
            guest_token: Some("g1".to_string()),
            guest_name: None,
        };
        assert_eq!(identity.voter(), Some(Identity::Guest("g1".to_string())));
    }

    #[test]
    fn test_author_uses_guest_name_not_token() {
        let identity = RequestIdentity {
            user_id: None,
            guest_token: Some("g1".to_string()),
            guest_name: Some("Alex".to_string()),
        };
        assert_eq!(identity.author(), Some(Author::Guest("Alex".to_string())));
    }

    #[test]
    fn test_anonymous_request_has_no_identity() {
        let identity = RequestIdentity::default();
        assert_eq!(identity.voter(), None);
        assert_eq!(identity.author(), None);
    }
}
