//! HTTP client for the ingestion service

use crate::model::connection::ConnectionProfile;
use crate::model::source::ColumnInfo;
use crate::services::api::{ExportRequest, ImportRequest, IngestApi, ServiceError};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct TablesResponse {
    tables: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ColumnsResponse {
    columns: Vec<ColumnInfo>,
}

#[derive(Debug, Deserialize)]
struct ExportResponse {
    filename: String,
    record_count: u64,
}

#[derive(Debug, Deserialize)]
struct ImportResponse {
    table: String,
    record_count: u64,
}

#[derive(Debug, Serialize)]
struct ExportBody<'a> {
    conn: &'a ConnectionProfile,
    selection: SelectionBody<'a>,
}

#[derive(Debug, Serialize)]
struct SelectionBody<'a> {
    columns: &'a [String],
    table: &'a str,
}

/// Extract the human-readable `detail` string from an error body
///
/// Validation errors carry a list in `detail`; those yield `None` so the
/// caller falls back to its generic message.
pub fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("detail")
        .and_then(|d| d.as_str())
        .map(str::to_string)
}

/// [`IngestApi`] over the service's JSON/multipart HTTP endpoints
pub struct HttpIngestApi {
    client: Client,
    base_url: String,
}

impl HttpIngestApi {
    pub fn new(base_url: &str) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .user_agent(concat!("chfile-tui/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ServiceError> {
        let response = request
            .send()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        debug!(status = status.as_u16(), bytes = body.len(), "response received");

        if !status.is_success() {
            return Err(ServiceError::Server {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        serde_json::from_str(&body).map_err(|e| ServiceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl IngestApi for HttpIngestApi {
    async fn connect(&self, connection: &ConnectionProfile) -> Result<(), ServiceError> {
        let request = self.client.post(self.url("/api/connect")).json(connection);
        let _ack: serde_json::Value = self.send(request).await?;
        Ok(())
    }

    async fn list_tables(&self, connection: &ConnectionProfile) -> Result<Vec<String>, ServiceError> {
        let request = self.client.post(self.url("/api/tables")).json(connection);
        let response: TablesResponse = self.send(request).await?;
        Ok(response.tables)
    }

    async fn list_columns(
        &self,
        connection: &ConnectionProfile,
        table: &str,
    ) -> Result<Vec<ColumnInfo>, ServiceError> {
        let request = self
            .client
            .post(self.url("/api/columns"))
            .query(&[("table", table)])
            .json(connection);
        let response: ColumnsResponse = self.send(request).await?;
        Ok(response.columns)
    }

    async fn export_table(&self, export: &ExportRequest) -> Result<(u64, String), ServiceError> {
        let body = ExportBody {
            conn: &export.connection,
            selection: SelectionBody {
                columns: &export.columns,
                table: &export.table,
            },
        };
        let request = self
            .client
            .post(self.url("/api/ingest/clickhouse-to-file"))
            .query(&[("file_format", export.format.as_str())])
            .json(&body);
        let response: ExportResponse = self.send(request).await?;
        Ok((response.record_count, response.filename))
    }

    async fn import_file(&self, import: &ImportRequest) -> Result<(u64, String), ServiceError> {
        let file = Part::bytes(import.bytes.clone())
            .file_name(import.file_name.clone())
            .mime_str(import.format.mime_type())
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        let columns =
            serde_json::to_string(&import.columns).map_err(|e| ServiceError::Decode(e.to_string()))?;
        let connection = serde_json::to_string(&import.connection)
            .map_err(|e| ServiceError::Decode(e.to_string()))?;

        let mut form = Form::new()
            .part("file", file)
            .text("columns", columns)
            .text("connection", connection);
        if let Some(table) = &import.table {
            form = form.text("table", table.clone());
        }

        let request = self
            .client
            .post(self.url("/api/ingest/file-to-clickhouse"))
            .multipart(form);
        let response: ImportResponse = self.send(request).await?;
        Ok((response.record_count, response.table))
    }
}
