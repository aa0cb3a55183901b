use std::fmt::Display;

use reqwest::header::AUTHORIZATION;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;

use crate::error::ClientError;
use crate::session::Session;
use crate::types::{DepartmentFiles, FileListQuery, SigninRequest, SigninResponse};

/// Typed access to the file-transfer API.
///
/// `api_root` is the URL every endpoint path is appended to: the backend's
/// `/api` root when talking to it directly, or the relay's mount URL when
/// going through the relay.
#[derive(Debug, Clone)]
pub struct FileTransferClient {
    client: Client,
    api_root: String,
}

impl FileTransferClient {
    pub fn new(api_root: &str) -> Self {
        Self::with_client(Client::new(), api_root)
    }

    pub fn with_client(client: Client, api_root: &str) -> Self {
        Self {
            client,
            api_root: api_root.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path)
    }

    // Authentication

    /// Sign in and open a session.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(Session, SigninResponse), ClientError> {
        let resp = self
            .client
            .post(self.url("/auth/signin"))
            .json(&SigninRequest { username, password })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = error_message(resp)
                .await
                .unwrap_or_else(|| "Login failed.".to_string());
            return Err(ClientError::Status { status, message });
        }

        let signin: SigninResponse = serde_json::from_str(&resp.text().await?)?;
        Ok((Session::new(signin.access_token.clone()), signin))
    }

    /// Any non-2xx other than 401 is reported with a fixed message.
    pub async fn user_info(&self, session: &Session) -> Result<Value, ClientError> {
        match self
            .get(session, "/auth/user-info", "fetching user information")
            .await
        {
            Err(ClientError::Status { status, .. }) => Err(ClientError::Status {
                status,
                message: "Error fetching user information. Please try again.".to_string(),
            }),
            other => other,
        }
    }

    /// Create an account. Only a plain 200 counts as success.
    pub async fn register<T: Serialize + ?Sized>(&self, data: &T) -> Result<Value, ClientError> {
        let resp = self
            .client
            .post(self.url("/auth/signup"))
            .json(data)
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(ClientError::Status {
                status,
                message: "Registration failed. Please try again.".to_string(),
            });
        }
        parse_body(resp).await
    }

    // Files

    pub async fn file_status(
        &self,
        session: &Session,
        file_code: impl Display,
    ) -> Result<Value, ClientError> {
        self.get(session, &format!("/files/{file_code}/status"), "fetching file status")
            .await
    }

    pub async fn files_by_department(
        &self,
        session: &Session,
        department_id: impl Display,
        query: &FileListQuery,
    ) -> Result<DepartmentFiles, ClientError> {
        let request = self
            .client
            .get(self.url(&format!("/files/department/{department_id}")))
            .query(query);
        let body = self
            .send(session, request, "fetching department files")
            .await?;
        Ok(DepartmentFiles::from_body(&body))
    }

    pub async fn transfer_file<T: Serialize + ?Sized>(
        &self,
        session: &Session,
        payload: &T,
    ) -> Result<Value, ClientError> {
        self.post(session, "/files/transfer", payload, "transferring file")
            .await
    }

    /// Take a transferred file back.
    pub async fn take_back_file<T: Serialize + ?Sized>(
        &self,
        session: &Session,
        payload: &T,
    ) -> Result<Value, ClientError> {
        self.post(session, "/files/return", payload, "returning file")
            .await
    }

    pub async fn transaction_history(
        &self,
        session: &Session,
        file_code: impl Display,
    ) -> Result<Value, ClientError> {
        self.get(
            session,
            &format!("/files/{file_code}/history"),
            "fetching transaction history",
        )
        .await
    }

    pub async fn accept_file<T: Serialize + ?Sized>(
        &self,
        session: &Session,
        payload: &T,
    ) -> Result<Value, ClientError> {
        self.post(session, "/files/accept", payload, "accepting file")
            .await
    }

    pub async fn request_file<T: Serialize + ?Sized>(
        &self,
        session: &Session,
        payload: &T,
    ) -> Result<Value, ClientError> {
        self.post(session, "/files/request", payload, "requesting file")
            .await
    }

    /// Files waiting for the department to accept them.
    pub async fn pending_files(
        &self,
        session: &Session,
        department_id: impl Display,
    ) -> Result<Value, ClientError> {
        self.get(
            session,
            &format!("/files/pending/{department_id}"),
            "fetching files to accept",
        )
        .await
    }

    /// Files other departments have requested from this one.
    pub async fn requested_files(
        &self,
        session: &Session,
        department_id: impl Display,
    ) -> Result<Value, ClientError> {
        self.get(
            session,
            &format!("/files/requests/{department_id}"),
            "fetching requested files",
        )
        .await
    }

    pub async fn requested_files_details(
        &self,
        session: &Session,
        department_id: impl Display,
    ) -> Result<Value, ClientError> {
        self.get(
            session,
            &format!("/files/requests/{department_id}/details"),
            "fetching requested file details",
        )
        .await
    }

    // Directory

    pub async fn all_users(&self, session: &Session) -> Result<Value, ClientError> {
        self.get(session, "/user/get-all-users", "fetching users")
            .await
    }

    pub async fn all_departments(&self, session: &Session) -> Result<Value, ClientError> {
        self.get(session, "/department/get-all-departments", "fetching departments")
            .await
    }

    pub async fn all_sections(&self, session: &Session) -> Result<Value, ClientError> {
        self.get(session, "/section/get-all-sections", "fetching sections")
            .await
    }

    async fn get(
        &self,
        session: &Session,
        path: &str,
        action: &'static str,
    ) -> Result<Value, ClientError> {
        let request = self.client.get(self.url(path));
        self.send(session, request, action).await
    }

    async fn post<T: Serialize + ?Sized>(
        &self,
        session: &Session,
        path: &str,
        payload: &T,
        action: &'static str,
    ) -> Result<Value, ClientError> {
        let request = self.client.post(self.url(path)).json(payload);
        self.send(session, request, action).await
    }

    /// Attach the session's bearer token, send, and unwrap the JSON payload.
    async fn send(
        &self,
        session: &Session,
        request: RequestBuilder,
        action: &'static str,
    ) -> Result<Value, ClientError> {
        let bearer = session.bearer().ok_or(ClientError::NotAuthenticated)?;

        let result = async {
            let resp = request.header(AUTHORIZATION, bearer).send().await?;
            let status = resp.status();

            if status == StatusCode::UNAUTHORIZED {
                session.clear();
                return Err(ClientError::Unauthorized);
            }
            if !status.is_success() {
                let message = error_message(resp)
                    .await
                    .unwrap_or_else(|| format!("backend returned {status}"));
                return Err(ClientError::Status { status, message });
            }
            parse_body(resp).await
        }
        .await;

        if let Err(e) = &result {
            tracing::error!(action, error = %e, "API call failed");
        }
        result
    }
}

async fn parse_body(resp: Response) -> Result<Value, ClientError> {
    let text = resp.text().await?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

/// The backend's `message` field, when the error body carries one.
async fn error_message(resp: Response) -> Option<String> {
    let body: Value = resp.json().await.ok()?;
    body.get("message")?.as_str().map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::http::HeaderMap;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    fn bearer_of(headers: &HeaderMap) -> Option<String> {
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    }

    async fn start_backend() -> String {
        let app = Router::new()
            .route(
                "/api/auth/signin",
                post(|Json(body): Json<Value>| async move {
                    if body["password"] == "secret" {
                        (axum::http::StatusCode::OK, Json(json!({ "accessToken": "tok-1", "username": body["username"] })))
                    } else {
                        (axum::http::StatusCode::UNAUTHORIZED, Json(json!({ "message": "Bad credentials" })))
                    }
                }),
            )
            .route(
                "/api/auth/signup",
                post(|| async { (axum::http::StatusCode::CREATED, Json(json!({ "id": 1 }))) }),
            )
            .route(
                "/api/files/{code}/status",
                get(|headers: HeaderMap| async move {
                    match bearer_of(&headers).as_deref() {
                        Some("Bearer tok-1") => (axum::http::StatusCode::OK, Json(json!({ "status": "IN_TRANSIT" }))),
                        _ => (axum::http::StatusCode::UNAUTHORIZED, Json(json!({ "message": "expired" }))),
                    }
                }),
            )
            .route(
                "/api/files/department/{id}",
                get(|Query(params): Query<HashMap<String, String>>| async move {
                    Json(json!({ "content": [params.get("page").cloned()], "totalPages": 2 }))
                }),
            )
            .route(
                "/api/files/transfer",
                post(|Json(body): Json<Value>| async move { Json(json!({ "transferred": body["fileCode"] })) }),
            )
            .route(
                "/api/auth/user-info",
                get(|headers: HeaderMap| async move {
                    match bearer_of(&headers).as_deref() {
                        Some("Bearer tok-1") => (axum::http::StatusCode::OK, Json(json!({ "username": "clerk" }))),
                        Some("Bearer expired") => (axum::http::StatusCode::UNAUTHORIZED, Json(json!({ "message": "expired" }))),
                        _ => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "NullPointerException" }))),
                    }
                }),
            )
            .route(
                "/api/section/get-all-sections",
                get(|| async { (axum::http::StatusCode::FORBIDDEN, Json(json!({ "message": "not allowed" }))) }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}/api/")
    }

    #[tokio::test]
    async fn test_login_and_authenticated_calls() {
        let client = FileTransferClient::new(&start_backend().await);

        let (session, signin) = client.login("clerk", "secret").await.unwrap();
        assert!(session.is_authenticated());
        assert_eq!(signin.user["username"], "clerk");

        let status = client.file_status(&session, "F-100").await.unwrap();
        assert_eq!(status["status"], "IN_TRANSIT");

        let moved = client
            .transfer_file(&session, &json!({ "fileCode": "F-100", "toDepartmentId": 2 }))
            .await
            .unwrap();
        assert_eq!(moved["transferred"], "F-100");

        let page = client
            .files_by_department(&session, 7, &FileListQuery { page: Some(1), ..Default::default() })
            .await
            .unwrap();
        assert_eq!(page.files, json!(["1"]));
        assert_eq!(page.total_pages, Some(2));
    }

    #[tokio::test]
    async fn test_failed_login_reports_backend_message() {
        let client = FileTransferClient::new(&start_backend().await);
        match client.login("clerk", "wrong").await {
            Err(ClientError::Status { status, message }) => {
                assert_eq!(status, StatusCode::UNAUTHORIZED);
                assert_eq!(message, "Bad credentials");
            }
            other => panic!("expected status error, got {:?}", other.map(|(_, r)| r)),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_clears_session() {
        let client = FileTransferClient::new(&start_backend().await);
        let session = Session::new("stale");

        let err = client.file_status(&session, "F-1").await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized));
        assert!(!session.is_authenticated());

        let err = client.file_status(&session, "F-1").await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_logged_out_session_never_reaches_network() {
        // Nothing listens on port 9 here; a network attempt would fail differently.
        let client = FileTransferClient::new("http://127.0.0.1:9/api");
        let session = Session::new("t");
        session.logout();

        let err = client.all_users(&session).await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthenticated));
    }

    #[tokio::test]
    async fn test_other_failures_keep_session() {
        let client = FileTransferClient::new(&start_backend().await);
        let (session, _) = client.login("clerk", "secret").await.unwrap();

        let err = client.all_sections(&session).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::FORBIDDEN));
        assert_eq!(err.to_string(), "not allowed");
        assert!(session.is_authenticated());
    }

    #[tokio::test]
    async fn test_register_requires_plain_ok() {
        let client = FileTransferClient::new(&start_backend().await);
        let err = client
            .register(&json!({ "username": "new", "password": "p" }))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Registration failed. Please try again.");
    }

    #[tokio::test]
    async fn test_user_info_failure_uses_fixed_message() {
        let client = FileTransferClient::new(&start_backend().await);

        let (session, _) = client.login("clerk", "secret").await.unwrap();
        let info = client.user_info(&session).await.unwrap();
        assert_eq!(info["username"], "clerk");

        let session = Session::new("other");
        let err = client.user_info(&session).await.unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(err.to_string(), "Error fetching user information. Please try again.");
        assert!(session.is_authenticated());

        let session = Session::new("expired");
        let err = client.user_info(&session).await.unwrap_err();
        assert!(matches!(err, ClientError::Unauthorized));
        assert!(!session.is_authenticated());
    }
}
