use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::auth::{IssuedSession, NewAccount, ResolvedIdentity};
use crate::database::models::{NewRole, Role, RoleId, RoleUpdate, UserId};
use crate::handlers::elevated::rbac::RbacReport;
use crate::handlers::protected::auth::me::ProfileUpdate;
use crate::handlers::protected::users::{AdminUserUpdate, Deleted};
use crate::handlers::public::auth::login::LoginRequest;

use super::{ClientError, IdentitySource};

/// Typed client for the Pressroom HTTP API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let mut base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        // Endpoints join relative to the base, so a path prefix needs its trailing slash.
        if !base.path().ends_with('/') {
            let prefixed = format!("{}/", base.path());
            base.set_path(&prefixed);
        }
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { http, base, token: None })
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn endpoint(&self, path: &str) -> Result<Url, ClientError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", path, e)))
    }

    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ClientError> {
        let builder = self.http.request(method, self.endpoint(path)?);
        Ok(match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ClientError> {
        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;
        let body: Option<Value> = serde_json::from_str(&text).ok();

        if status.is_success() {
            let data = body
                .and_then(|mut body| body.get_mut("data").map(Value::take))
                .ok_or_else(|| ClientError::Decode(format!("missing data in {} response", status)))?;
            return serde_json::from_value(data).map_err(|e| ClientError::Decode(e.to_string()));
        }

        Err(error_from(status, body.as_ref(), text))
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(self.request(Method::GET, path)?).await
    }

    async fn with_body<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send(self.request(method, path)?.json(body)).await
    }

    pub async fn health(&self) -> Result<Value, ClientError> {
        self.get("/health").await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<IssuedSession, ClientError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.with_body(Method::POST, "/api/auth/login", &body).await
    }

    pub async fn signup(&self, account: &NewAccount) -> Result<IssuedSession, ClientError> {
        self.with_body(Method::POST, "/api/auth/signup", account).await
    }

    pub async fn me(&self) -> Result<ResolvedIdentity, ClientError> {
        self.get("/api/auth/me").await
    }

    pub async fn update_profile(&self, profile: &ProfileUpdate) -> Result<ResolvedIdentity, ClientError> {
        self.with_body(Method::PUT, "/api/auth/me", profile).await
    }

    pub async fn list_roles(&self) -> Result<Vec<Role>, ClientError> {
        self.get("/api/roles").await
    }

    pub async fn create_role(&self, role: &NewRole) -> Result<Role, ClientError> {
        self.with_body(Method::POST, "/api/roles", role).await
    }

    pub async fn update_role(&self, id: RoleId, update: &RoleUpdate) -> Result<Role, ClientError> {
        self.with_body(Method::PUT, &format!("/api/roles/{}", id), update).await
    }

    pub async fn delete_role(&self, id: RoleId) -> Result<Deleted<RoleId>, ClientError> {
        self.send(self.request(Method::DELETE, &format!("/api/roles/{}", id))?).await
    }

    pub async fn list_users(&self) -> Result<Vec<ResolvedIdentity>, ClientError> {
        self.get("/api/users").await
    }

    pub async fn update_user(&self, id: UserId, update: &AdminUserUpdate) -> Result<ResolvedIdentity, ClientError> {
        self.with_body(Method::PUT, &format!("/api/users/{}", id), update).await
    }

    pub async fn delete_user(&self, id: UserId) -> Result<Deleted<UserId>, ClientError> {
        self.send(self.request(Method::DELETE, &format!("/api/users/{}", id))?).await
    }

    pub async fn rbac_report(&self) -> Result<RbacReport, ClientError> {
        self.get("/api/super-admin/rbac").await
    }
}

fn error_from(status: StatusCode, body: Option<&Value>, raw: String) -> ClientError {
    let field = |name: &str| body.and_then(|b| b.get(name)).and_then(Value::as_str).map(str::to_string);
    let message = field("message").unwrap_or(raw);

    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::FORBIDDEN => ClientError::Forbidden(message),
        _ => ClientError::Api {
            status: status.as_u16(),
            code: field("error").unwrap_or_else(|| "HTTP_ERROR".to_string()),
            message,
        },
    }
}

#[async_trait]
impl IdentitySource for ApiClient {
    async fn fetch_identity(&self) -> Result<Option<ResolvedIdentity>, ClientError> {
        if self.token.is_none() {
            return Ok(None);
        }
        match self.me().await {
            Ok(identity) => Ok(Some(identity)),
            Err(ClientError::Unauthorized(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn error_bodies_map_to_client_errors() {
        let body = json!({"success": false, "error": "FORBIDDEN", "message": "Access denied"});
        assert!(matches!(
            error_from(StatusCode::FORBIDDEN, Some(&body), String::new()),
            ClientError::Forbidden(m) if m == "Access denied"
        ));

        let body = json!({"success": false, "error": "UNAUTHORIZED", "message": "Not authorized"});
        assert!(matches!(
            error_from(StatusCode::UNAUTHORIZED, Some(&body), String::new()),
            ClientError::Unauthorized(m) if m == "Not authorized"
        ));

        let body = json!({"success": false, "error": "CONFLICT", "message": "taken"});
        assert!(matches!(
            error_from(StatusCode::CONFLICT, Some(&body), String::new()),
            ClientError::Api { status: 409, code, .. } if code == "CONFLICT"
        ));
    }

    #[test]
    fn non_json_errors_keep_the_raw_text() {
        let err = error_from(StatusCode::METHOD_NOT_ALLOWED, None, "Method Not Allowed".into());
        assert!(matches!(
            err,
            ClientError::Api { status: 405, code, message } if code == "HTTP_ERROR" && message == "Method Not Allowed"
        ));
    }

    #[test]
    fn endpoints_keep_the_base_path_prefix() {
        let client = ApiClient::new("https://news.example.com/pressroom").unwrap();
        assert_eq!(
            client.endpoint("/api/auth/me").unwrap().as_str(),
            "https://news.example.com/pressroom/api/auth/me"
        );

        let client = ApiClient::new("https://news.example.com/pressroom/").unwrap();
        assert_eq!(
            client.endpoint("/api/roles").unwrap().as_str(),
            "https://news.example.com/pressroom/api/roles"
        );

        let client = ApiClient::new("http://127.0.0.1:5000").unwrap();
        assert_eq!(client.endpoint("/health").unwrap().as_str(), "http://127.0.0.1:5000/health");
    }

    #[tokio::test]
    async fn no_token_means_anonymous_without_a_request() {
        let client = ApiClient::new("http://127.0.0.1:9").unwrap();
        assert!(client.fetch_identity().await.unwrap().is_none());
    }

    #[test]
    fn rejects_bad_base_urls() {
        assert!(matches!(ApiClient::new("not a url"), Err(ClientError::InvalidUrl(_))));
    }
}
