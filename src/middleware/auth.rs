//! Session middleware
//!
//! Authentication is owned by an external provider; this service only
//! verifies the bearer tokens it issues and turns their claims into a
//! `Session`. The session carries everything permission evaluation needs
//! (role, tenant, per-user module override set) so downstream code never
//! reaches into ambient auth state.

use std::collections::HashSet;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use jsonwebtoken::{decode, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    models::{Market, Resource, Role},
    utils::error::ErrorResponse,
    AppState,
};

/// Claims as issued by the external auth provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Tenant the user belongs to
    pub tenant_id: String,
    /// User email
    pub email: String,
    /// Role name; unknown names evaluate as "no access", never as an error
    pub role: String,
    /// Per-user module override set; absent means role defaults apply
    #[serde(default)]
    pub modules: Option<Vec<String>>,
    /// Team assignment, if any
    #[serde(default)]
    pub team_id: Option<String>,
    /// Market assignment, if any
    #[serde(default)]
    pub market: Option<String>,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// JWT ID
    #[serde(default)]
    pub jti: Option<String>,
}

/// Authenticated session extracted from a verified token
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub tenant_id: Uuid,
    pub email: String,
    /// Raw role name from the token, kept for audit metadata
    pub role_name: String,
    /// Parsed role; `None` for unknown names, which every permission
    /// helper treats as deny
    pub role: Option<Role>,
    /// Override module set; resources the provider sent that we do not
    /// recognize are dropped, which can only narrow access
    pub modules: Option<HashSet<Resource>>,
    pub team_id: Option<Uuid>,
    pub market: Option<Market>,
}

impl TryFrom<Claims> for Session {
    type Error = &'static str;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| "Invalid user ID in token")?;
        let tenant_id =
            Uuid::parse_str(&claims.tenant_id).map_err(|_| "Invalid tenant ID in token")?;

        let modules = claims.modules.map(|names| {
            names
                .iter()
                .filter_map(|name| Resource::parse(name))
                .collect::<HashSet<Resource>>()
        });

        Ok(Self {
            user_id,
            tenant_id,
            email: claims.email,
            role: Role::parse(&claims.role),
            role_name: claims.role,
            modules,
            team_id: claims.team_id.as_deref().and_then(|s| Uuid::parse_str(s).ok()),
            market: claims.market.as_deref().and_then(Market::parse),
        })
    }
}

/// Extractor for Session from request extensions
///
/// Allows using Session as a handler parameter after auth middleware has run.
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Session>().cloned().ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("unauthorized", "Authentication required")),
            )
        })
    }
}

/// Validate and decode a token issued by the external provider
pub fn validate_token(
    token: &str,
    secret: &str,
    leeway_secs: u64,
) -> Result<TokenData<Claims>, AuthError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = leeway_secs;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })
}

/// Authentication error types
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    TokenExpired,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authentication token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid authentication token"),
            AuthError::TokenExpired => {
                (StatusCode::UNAUTHORIZED, "Authentication token has expired")
            }
        };

        let body = ErrorResponse::new("unauthorized", message);

        (status, Json(body)).into_response()
    }
}

/// Authentication middleware
///
/// Extracts and verifies the bearer token from the Authorization header.
/// On success, injects the Session into request extensions.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AuthError::MissingToken)?;

    let token_data = validate_token(
        bearer.token(),
        &state.config.auth.jwt_secret,
        state.config.auth.leeway_secs,
    )?;

    let session: Session = token_data
        .claims
        .try_into()
        .map_err(|_| AuthError::InvalidToken)?;

    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
