use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Serialize)]
pub(crate) struct SigninRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

/// Body of a successful sign-in: the access token plus whatever user
/// details the backend includes.
#[derive(Debug, Clone, Deserialize)]
pub struct SigninResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,

    #[serde(flatten)]
    pub user: serde_json::Map<String, Value>,
}

/// Paging and sorting for a department's file listing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileListQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

/// One page of a department's files.
#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentFiles {
    pub files: Value,
    pub total_pages: Option<u64>,
}

impl DepartmentFiles {
    /// Accepts both `{files, totalPages}` and paged `{content, totalPages}` bodies.
    pub(crate) fn from_body(body: &Value) -> Self {
        let files = body
            .get("files")
            .filter(|v| !v.is_null())
            .or_else(|| body.get("content"))
            .cloned()
            .unwrap_or(Value::Null);
        Self {
            files,
            total_pages: body.get("totalPages").and_then(Value::as_u64),
        }
    }
}
