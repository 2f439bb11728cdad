//! Client-side view of the session: who is logged in, log in, log out.
//!
//! This is a convenience for UIs deciding whether to show admin-only controls. It is not
//! a security boundary; the server gate is.

use anyhow::{Context, Result};
use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::identity::SessionUser;

#[derive(Debug, Deserialize)]
struct MeResponse {
    user: Option<SessionUser>,
}

#[derive(Debug, Deserialize)]
struct LoginResponseBody {
    #[serde(default)]
    user: Option<SessionUser>,
}

#[derive(Clone)]
pub struct AuthClient {
    base: Url,
    client: reqwest::Client,
}

impl AuthClient {
    /// Client with its own cookie jar, so the session cookie set by login is replayed.
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base).context("invalid base URL")?;
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { base, client })
    }

    pub fn base(&self) -> &Url { &self.base }

    /// Log in. `Ok(None)` when the server rejects the credentials.
    pub async fn login(&self, email: &str, password: &str) -> Result<Option<SessionUser>> {
        let url = self.base.join("/api/auth/login")?;
        let resp = self.client
            .post(url)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        if !resp.status().is_success() {
            debug!(status = %resp.status(), "login refused");
            return Ok(None);
        }
        let body: LoginResponseBody = resp.json().await?;
        Ok(body.user)
    }

    /// The logged-in user, or `None`. Network and parse failures also yield `None`.
    pub async fn current_user(&self) -> Option<SessionUser> {
        match self.fetch_me().await {
            Ok(u) => u,
            Err(e) => {
                debug!("who-am-i failed, treating as logged out: {e:#}");
                None
            }
        }
    }

    async fn fetch_me(&self) -> Result<Option<SessionUser>> {
        let url = self.base.join("/api/auth/me")?;
        let resp = self.client
            .get(url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .send()
            .await?;
        let me: MeResponse = resp.json().await?;
        Ok(me.user)
    }

    pub async fn is_admin(&self) -> bool {
        self.current_user().await.map(|u| u.role.is_admin()).unwrap_or(false)
    }

    /// Ask the server to clear the cookie and return the login page URL to navigate to.
    /// The local session is considered gone even if the request fails.
    pub async fn logout(&self) -> Result<Url> {
        let url = self.base.join("/api/auth/logout")?;
        if let Err(e) = self.client.post(url).send().await {
            debug!("logout request failed: {e}");
        }
        Ok(self.base.join("/login")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_base_url() {
        assert!(AuthClient::new("not a url").is_err());
        assert!(AuthClient::new("http://127.0.0.1:3000").is_ok());
    }

    #[tokio::test]
    async fn unreachable_server_means_no_user() {
        // reserve a port and free it so nothing is listening there
        let listener = std::net::TcpListener::bind(("127.0.0.1", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let client = AuthClient::new(&format!("http://127.0.0.1:{}", port)).unwrap();
        assert!(client.current_user().await.is_none());
        assert!(!client.is_admin().await);
    }
}
