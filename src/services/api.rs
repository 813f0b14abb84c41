//! Contracts of the remote ingestion service
//!
//! The wizard never talks to the network directly. It produces a
//! [`ServiceRequest`] describing one call, the runner executes it through an
//! [`IngestApi`] implementation, and the outcome comes back as a
//! [`ServiceReply`] or [`ServiceError`].

use crate::model::connection::ConnectionProfile;
use crate::model::source::{ColumnInfo, FileFormat};
use async_trait::async_trait;
use thiserror::Error;

/// Export selected columns of a remote table to a file on the service side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
    pub connection: ConnectionProfile,
    pub table: String,
    pub columns: Vec<String>,
    pub format: FileFormat,
}

/// Import selected columns of a local file into a remote table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    pub connection: ConnectionProfile,
    pub file_name: String,
    pub format: FileFormat,
    pub bytes: Vec<u8>,
    pub columns: Vec<String>,
    /// Destination table; the service generates a name when absent
    pub table: Option<String>,
}

/// One call against the service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceCall {
    Connect(ConnectionProfile),
    ListTables(ConnectionProfile),
    ListColumns {
        connection: ConnectionProfile,
        table: String,
    },
    ExportTable(ExportRequest),
    ImportFile(ImportRequest),
}

impl ServiceCall {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            ServiceCall::Connect(_) => "connect",
            ServiceCall::ListTables(_) => "list-tables",
            ServiceCall::ListColumns { .. } => "list-columns",
            ServiceCall::ExportTable(_) => "export-table",
            ServiceCall::ImportFile(_) => "import-file",
        }
    }
}

/// A call tagged with the ticket the wizard expects back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    pub ticket: u64,
    pub call: ServiceCall,
}

/// Successful responses, one per call kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceReply {
    Connected,
    Tables(Vec<String>),
    Columns(Vec<ColumnInfo>),
    Exported { record_count: u64, filename: String },
    Imported { record_count: u64, table: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The service answered with a non-success status
    #[error("service returned {status}: {}", detail.as_deref().unwrap_or("no detail"))]
    Server { status: u16, detail: Option<String> },

    /// The request never produced a response
    #[error("transport error: {0}")]
    Transport(String),

    /// The response body did not have the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ServiceError {
    /// Human-readable message supplied by the server, if any
    pub fn detail(&self) -> Option<&str> {
        match self {
            ServiceError::Server { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }
}

/// The four request/response contracts (ingest has two directions)
#[async_trait]
pub trait IngestApi: Send + Sync {
    async fn connect(&self, connection: &ConnectionProfile) -> Result<(), ServiceError>;

    async fn list_tables(&self, connection: &ConnectionProfile)
        -> Result<Vec<String>, ServiceError>;

    async fn list_columns(
        &self,
        connection: &ConnectionProfile,
        table: &str,
    ) -> Result<Vec<ColumnInfo>, ServiceError>;

    /// Returns `(record_count, filename)`
    async fn export_table(&self, request: &ExportRequest) -> Result<(u64, String), ServiceError>;

    /// Returns `(record_count, table)`
    async fn import_file(&self, request: &ImportRequest) -> Result<(u64, String), ServiceError>;
}

/// Route a call to the matching contract
pub async fn dispatch(api: &dyn IngestApi, call: &ServiceCall) -> Result<ServiceReply, ServiceError> {
    match call {
        ServiceCall::Connect(connection) => {
            api.connect(connection).await?;
            Ok(ServiceReply::Connected)
        }
        ServiceCall::ListTables(connection) => {
            Ok(ServiceReply::Tables(api.list_tables(connection).await?))
        }
        ServiceCall::ListColumns { connection, table } => {
            Ok(ServiceReply::Columns(api.list_columns(connection, table).await?))
        }
        ServiceCall::ExportTable(request) => {
            let (record_count, filename) = api.export_table(request).await?;
            Ok(ServiceReply::Exported {
                record_count,
                filename,
            })
        }
        ServiceCall::ImportFile(request) => {
            let (record_count, table) = api.import_file(request).await?;
            Ok(ServiceReply::Imported {
                record_count,
                table,
            })
        }
    }
}
