//! Request-scoped session context
//!
//! The whole session lives in a signed cookie. Handlers receive it through
//! extractors instead of reaching for global state:
//! - [`Session`]: whatever the cookie carries, anonymous if absent or invalid
//! - [`CurrentUser`]: requires a logged-in user, else redirects to `/login`
//! - [`AdminUser`]: additionally requires the admin role, else redirects to `/`

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{
        header::{COOKIE, SET_COOKIE},
        request::Parts,
        HeaderMap, HeaderValue,
    },
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;

use crate::auth::SessionKeys;
use crate::error::PortalError;
use crate::i18n::Language;
use crate::models::{Role, UserAccount};
use crate::AppState;

/// Cookie carrying the signed session token
pub const SESSION_COOKIE: &str = "portal_session";

/// Identity of the logged-in user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
    pub role: Role,
}

/// One-shot message shown on the next rendered page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flash {
    pub category: String,
    pub message: String,
}

/// Session state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub user: Option<SessionUser>,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub flashes: Vec<Flash>,
}

impl Session {
    /// Decode the session cookie; anything missing, tampered or expired
    /// yields an anonymous session.
    pub fn from_headers(headers: &HeaderMap, keys: &SessionKeys) -> Self {
        let Some(token) = read_cookie(headers) else {
            return Self::default();
        };
        match keys.verify_token(token) {
            Ok(session) => session,
            Err(e) => {
                tracing::debug!(error = %e, "discarding invalid session cookie");
                Self::default()
            }
        }
    }

    /// Attach an authenticated user. The account's preferred language wins;
    /// otherwise the language already chosen in this session is kept.
    pub fn login(&mut self, user: &UserAccount) {
        self.user = Some(SessionUser {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        });
        self.language = user.language.unwrap_or(self.language);
    }

    /// Drop everything, language included.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn flash(&mut self, category: &str, message: &str) {
        self.flashes.push(Flash { category: category.into(), message: message.into() });
    }

    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }

    /// Attach this session to `response` as a fresh cookie.
    pub fn respond(&self, keys: &SessionKeys, response: impl IntoResponse) -> Result<Response, PortalError> {
        let token = keys
            .create_token(self)
            .map_err(|e| PortalError::Session(e.to_string()))?;
        let cookie = format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            keys.ttl().num_seconds()
        );
        let value = HeaderValue::from_str(&cookie).map_err(|e| PortalError::Session(e.to_string()))?;
        Ok((AppendHeaders([(SET_COOKIE, value)]), response).into_response())
    }
}

/// Cookie that makes the browser forget the session
pub fn expired_cookie() -> HeaderValue {
    HeaderValue::from_static("portal_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

fn read_cookie(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            pair.trim()
                .strip_prefix(SESSION_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Session::from_headers(&parts.headers, &state.sessions))
    }
}

/// Logged-in user plus the rest of the session
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: SessionUser,
    pub session: Session,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = Session::from_headers(&parts.headers, &state.sessions);
        match session.user.clone() {
            Some(user) => Ok(CurrentUser { user, session }),
            None => Err(Redirect::to("/login")),
        }
    }
}

/// Logged-in admin. Non-admins are sent back to the dashboard silently.
#[derive(Debug, Clone)]
pub struct AdminUser(pub CurrentUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let current = CurrentUser::from_request_parts(parts, state).await?;
        if current.user.role.is_admin() {
            Ok(AdminUser(current))
        } else {
            Err(Redirect::to("/"))
        }
    }
}
