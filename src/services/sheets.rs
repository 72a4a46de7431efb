// src/services/sheets.rs

//! Spreadsheet source.
//!
//! Fetches the raw cell grid of one sheet and turns it into records keyed by
//! the case-folded header row.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::Record;
use crate::utils::http::first_line;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";

/// A source of tabular sheet data.
#[async_trait]
pub trait SheetSource: Send + Sync {
    /// Fetch every row of a sheet, header row first.
    async fn fetch_values(&self, spreadsheet_id: &str, sheet_name: &str)
    -> Result<Vec<Vec<String>>>;
}

/// Outcome of turning a cell grid into records.
#[derive(Debug, Clone, PartialEq)]
pub enum SheetRows {
    /// The sheet returned no cells at all
    Empty,
    /// The first row has no usable header
    MissingHeaders,
    /// Records in source order (possibly none besides the header)
    Rows(Vec<Record>),
}

/// Convert a cell grid into records keyed by the lower-cased header row.
pub fn records_from_values(mut values: Vec<Vec<String>>) -> SheetRows {
    if values.is_empty() {
        return SheetRows::Empty;
    }

    let headers: Vec<String> = values
        .remove(0)
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    if headers.iter().all(String::is_empty) {
        return SheetRows::MissingHeaders;
    }

    SheetRows::Rows(
        values
            .into_iter()
            .map(|row| Record::from_row(&headers, row))
            .collect(),
    )
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Google Sheets API v4 client authorized with a bearer token.
pub struct GoogleSheetsClient {
    client: Client,
    access_token: String,
    application_name: String,
    base_url: String,
}

impl GoogleSheetsClient {
    pub fn new(
        client: Client,
        access_token: impl Into<String>,
        application_name: impl Into<String>,
    ) -> Self {
        Self {
            client,
            access_token: access_token.into(),
            application_name: application_name.into(),
            base_url: SHEETS_API_BASE.to_string(),
        }
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// URL of the `values.get` call for a whole sheet.
    pub fn values_url(&self, spreadsheet_id: &str, sheet_name: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)?;
        url.path_segments_mut()
            .map_err(|_| AppError::config(format!("Invalid Sheets API base: {}", self.base_url)))?
            .pop_if_empty()
            .extend(["spreadsheets", spreadsheet_id, "values", sheet_name]);
        Ok(url)
    }

    fn cell_text(value: Value) -> String {
        match value {
            Value::String(s) => s,
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

#[async_trait]
impl SheetSource for GoogleSheetsClient {
    async fn fetch_values(
        &self,
        spreadsheet_id: &str,
        sheet_name: &str,
    ) -> Result<Vec<Vec<String>>> {
        let url = self.values_url(spreadsheet_id, sheet_name)?;
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.access_token)
            .header(USER_AGENT, &self.application_name)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| first_line(&body));
            return Err(AppError::api(sheet_name, status.as_u16(), message));
        }

        let range: ValueRange = serde_json::from_str(&body)?;
        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(Self::cell_text).collect())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::error::ApiErrorKind;

    const VALUES_PATH: &str = "/spreadsheets/abc123/values/Members";

    fn client_for(server: &MockServer) -> GoogleSheetsClient {
        GoogleSheetsClient::new(Client::new(), "token-1", "GoogleSheetsSync")
            .with_base_url(server.uri())
    }

    async fn fetch_error(status: u16, body: &str) -> AppError {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(VALUES_PATH))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&server)
            .await;
        client_for(&server)
            .fetch_values("abc123", "Members")
            .await
            .unwrap_err()
    }

    fn grid(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|r| r.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn headers_are_case_folded_and_rows_padded() {
        let values = grid(&[
            &["Name", "Bio", "Image"],
            &["Alice", "Researcher", "https://x/a.png"],
            &["Bob"],
        ]);

        let SheetRows::Rows(records) = records_from_values(values) else {
            panic!("expected rows");
        };
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].text("image"), Some("https://x/a.png"));
        assert_eq!(records[1].text("name"), Some("Bob"));
        assert!(records[1].contains_key("bio"));
        assert!(records[1].contains_key("image"));
        assert!(records[1].get("image").is_none());
    }

    #[test]
    fn empty_grid_and_blank_headers() {
        assert_eq!(records_from_values(Vec::new()), SheetRows::Empty);
        assert_eq!(
            records_from_values(grid(&[&["", " "], &["a", "b"]])),
            SheetRows::MissingHeaders
        );
        assert_eq!(
            records_from_values(grid(&[&["name"]])),
            SheetRows::Rows(Vec::new())
        );
    }

    #[test]
    fn values_url_encodes_sheet_name() {
        let client = GoogleSheetsClient::new(Client::new(), "token", "GoogleSheetsSync");
        let url = client.values_url("abc123", "Project Contributors").unwrap();
        assert_eq!(
            url.as_str(),
            "https://sheets.googleapis.com/v4/spreadsheets/abc123/values/Project%20Contributors"
        );
    }

    #[test]
    fn non_string_cells_become_text() {
        assert_eq!(GoogleSheetsClient::cell_text(Value::from(42)), "42");
        assert_eq!(GoogleSheetsClient::cell_text(Value::Bool(true)), "true");
        assert_eq!(GoogleSheetsClient::cell_text(Value::Null), "");
    }

    #[tokio::test]
    async fn fetches_values_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(VALUES_PATH))
            .and(header("authorization", "Bearer token-1"))
            .and(header("user-agent", "GoogleSheetsSync"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "range": "Members!A1:C3",
                "values": [["Name", "Age"], ["Alice", 42, true], ["Bob", null]]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let values = client_for(&server)
            .fetch_values("abc123", "Members")
            .await
            .unwrap();
        assert_eq!(
            values,
            grid(&[&["Name", "Age"], &["Alice", "42", "true"], &["Bob", ""]])
        );
    }

    #[tokio::test]
    async fn missing_values_key_is_an_empty_grid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(VALUES_PATH))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"range": "A1"})),
            )
            .mount(&server)
            .await;

        let values = client_for(&server)
            .fetch_values("abc123", "Members")
            .await
            .unwrap();
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn forbidden_maps_to_authorization_error() {
        let body = r#"{"error":{"code":403,"message":"The caller does not have permission","status":"PERMISSION_DENIED"}}"#;
        let err = fetch_error(403, body).await;
        assert!(err.is_auth());
        let AppError::Api {
            kind,
            context,
            status,
            message,
        } = err
        else {
            panic!("expected an API error");
        };
        assert_eq!(kind, ApiErrorKind::Authorization);
        assert_eq!(context, "Members");
        assert_eq!(status, 403);
        assert_eq!(message, "The caller does not have permission");
    }

    #[tokio::test]
    async fn server_error_keeps_first_body_line() {
        let err = fetch_error(503, "backend unavailable\nretry later").await;
        assert!(!err.is_auth());
        let AppError::Api { kind, message, .. } = err else {
            panic!("expected an API error");
        };
        assert_eq!(kind, ApiErrorKind::Server);
        assert_eq!(message, "backend unavailable");
    }

    #[tokio::test]
    async fn missing_sheet_is_a_client_error() {
        let body = r#"{"error":{"code":400,"message":"Unable to parse range: Members"}}"#;
        let AppError::Api { kind, status, message, .. } = fetch_error(400, body).await else {
            panic!("expected an API error");
        };
        assert_eq!(kind, ApiErrorKind::Client);
        assert_eq!(status, 400);
        assert_eq!(message, "Unable to parse range: Members");
    }
}
