//! services/api/src/adapters/remote.rs
//!
//! The client side of profile sync. Signs in to a FocusPoint server over HTTP
//! and implements the `ProfileRepository` and `SessionService` ports against
//! its `/profile` and `/auth/logout` routes, carrying the session cookie.

use crate::web::auth::parse_session_cookie;
use async_trait::async_trait;
use focuspoint_core::domain::{ProfileRecord, User};
use focuspoint_core::ports::{PortError, PortResult, ProfileRepository, SessionService};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthBody {
    user_id: Uuid,
    email: String,
}

/// A signed-in session on a FocusPoint server.
#[derive(Debug, Clone)]
pub struct RemoteAccount {
    client: Client,
    base_url: String,
    session_id: String,
    user: User,
}

impl RemoteAccount {
    /// Logs in with email and password and keeps the returned session cookie.
    pub async fn login(base_url: &str, email: &str, password: &str) -> PortResult<Self> {
        let client = Client::new();
        let base_url = base_url.trim_end_matches('/').to_string();
        let response = client
            .post(format!("{base_url}/auth/login"))
            .json(&LoginBody { email, password })
            .send()
            .await
            .map_err(|e| network_error("logging in", e))?;

        let session_id = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(parse_session_cookie)
            .map(String::from);
        let body = read_success(response, "logging in").await?;
        let auth: AuthBody = serde_json::from_str(&body)
            .map_err(|e| PortError::Unexpected(format!("invalid login payload: {e}; body={body}")))?;
        let session_id = session_id
            .ok_or_else(|| PortError::Unexpected("login response did not set a session cookie".to_string()))?;

        info!(user_id = %auth.user_id, "Signed in to {base_url}");
        Ok(Self {
            client,
            base_url,
            session_id,
            user: User { user_id: auth.user_id, email: Some(auth.email) },
        })
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(COOKIE, format!("session={}", self.session_id))
    }

    /// The server keys profiles by session, so only the signed-in user's
    /// record is reachable.
    fn ensure_own(&self, user_id: Uuid) -> PortResult<()> {
        if user_id != self.user.user_id {
            return Err(PortError::Unauthorized);
        }
        Ok(())
    }
}

fn network_error(action: &str, e: reqwest::Error) -> PortError {
    PortError::Unavailable(format!("network error while {action}: {e}"))
}

/// Maps a non-success status to the port error of the same meaning.
fn http_error(status: StatusCode, body: &str) -> PortError {
    let message = if body.trim().is_empty() {
        format!("focuspoint api error: http {}", status.as_u16())
    } else {
        format!("focuspoint api error: http {}; body={body}", status.as_u16())
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => PortError::Unauthorized,
        StatusCode::NOT_FOUND => PortError::NotFound(message),
        StatusCode::CONFLICT => PortError::Conflict(message),
        StatusCode::TOO_MANY_REQUESTS => PortError::RateLimited(message),
        s if s.is_server_error() => PortError::Unavailable(message),
        _ => PortError::Unexpected(message),
    }
}

async fn read_success(response: Response, action: &str) -> PortResult<String> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| PortError::Unexpected(format!("failed reading response while {action}: {e}")))?;
    if !status.is_success() {
        return Err(http_error(status, &body));
    }
    Ok(body)
}

#[async_trait]
impl ProfileRepository for RemoteAccount {
    async fn load_profile(&self, user_id: Uuid) -> PortResult<Option<ProfileRecord>> {
        self.ensure_own(user_id)?;
        let response = self
            .request(self.client.get(format!("{}/profile", self.base_url)))
            .send()
            .await
            .map_err(|e| network_error("loading the profile", e))?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!(%user_id, "Server has no profile yet");
            return Ok(None);
        }
        let body = read_success(response, "loading the profile").await?;
        let record = serde_json::from_str(&body)
            .map_err(|e| PortError::Unexpected(format!("invalid profile payload: {e}")))?;
        Ok(Some(record))
    }

    async fn upsert_profile(&self, user_id: Uuid, record: &ProfileRecord) -> PortResult<()> {
        self.ensure_own(user_id)?;
        let response = self
            .request(self.client.put(format!("{}/profile", self.base_url)))
            .json(record)
            .send()
            .await
            .map_err(|e| network_error("saving the profile", e))?;
        read_success(response, "saving the profile").await?;
        Ok(())
    }
}

#[async_trait]
impl SessionService for RemoteAccount {
    async fn sign_out(&self) -> PortResult<()> {
        let response = self
            .request(self.client.post(format!("{}/auth/logout", self.base_url)))
            .send()
            .await
            .map_err(|e| network_error("signing out", e))?;
        read_success(response, "signing out").await?;
        info!(user_id = %self.user.user_id, "Signed out remotely");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_map_to_port_errors() {
        assert!(matches!(http_error(StatusCode::UNAUTHORIZED, ""), PortError::Unauthorized));
        assert!(matches!(http_error(StatusCode::NOT_FOUND, ""), PortError::NotFound(_)));
        assert!(matches!(http_error(StatusCode::CONFLICT, "taken"), PortError::Conflict(_)));
        assert!(matches!(http_error(StatusCode::TOO_MANY_REQUESTS, ""), PortError::RateLimited(_)));
        assert!(matches!(http_error(StatusCode::BAD_GATEWAY, ""), PortError::Unavailable(_)));
        match http_error(StatusCode::BAD_REQUEST, "bad json") {
            PortError::Unexpected(m) => assert_eq!(m, "focuspoint api error: http 400; body=bad json"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_server_is_unavailable() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let err = RemoteAccount::login(&format!("http://{addr}"), "a@b.c", "secret").await.unwrap_err();
        assert!(matches!(err, PortError::Unavailable(_)));
    }
}
