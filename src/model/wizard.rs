//! Wizard controller - the step sequencer for a transfer session
//!
//! `Wizard` owns every piece of workflow state and is the only thing that
//! mutates it. It performs no I/O itself: each network action is split into a
//! `begin_*` call that validates, marks the status pending and hands back a
//! ticketed [`ServiceRequest`], and [`Wizard::settle`] which applies the
//! outcome once the runner reports it.
//!
//! At most one request is in flight. A settlement whose ticket does not match
//! the in-flight request (for example after [`Wizard::reset`]) is dropped.

use crate::model::connection::{parse_port, ConnectionProfile, ProfileField};
use crate::model::source::{ColumnInfo, FileFormat, FlatFile, Source, SourceKind};
use crate::model::status::{Destination, IngestionResult, Notification, OperationStatus};
use crate::services::api::{
    ExportRequest, ImportRequest, ServiceCall, ServiceError, ServiceReply, ServiceRequest,
};
use thiserror::Error;
use tracing::{debug, info, warn};

/// The four linear steps of the wizard
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WizardStep {
    Connection,
    SourceSelection,
    ColumnSelection,
    Ingestion,
}

impl WizardStep {
    pub fn all() -> [WizardStep; 4] {
        [
            WizardStep::Connection,
            WizardStep::SourceSelection,
            WizardStep::ColumnSelection,
            WizardStep::Ingestion,
        ]
    }

    pub fn index(&self) -> usize {
        match self {
            WizardStep::Connection => 0,
            WizardStep::SourceSelection => 1,
            WizardStep::ColumnSelection => 2,
            WizardStep::Ingestion => 3,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            WizardStep::Connection => "Connection",
            WizardStep::SourceSelection => "Source Selection",
            WizardStep::ColumnSelection => "Column Selection",
            WizardStep::Ingestion => "Ingestion",
        }
    }

    pub fn next(&self) -> Option<WizardStep> {
        match self {
            WizardStep::Connection => Some(WizardStep::SourceSelection),
            WizardStep::SourceSelection => Some(WizardStep::ColumnSelection),
            WizardStep::ColumnSelection => Some(WizardStep::Ingestion),
            WizardStep::Ingestion => None,
        }
    }

    pub fn prev(&self) -> Option<WizardStep> {
        match self {
            WizardStep::Connection => None,
            WizardStep::SourceSelection => Some(WizardStep::Connection),
            WizardStep::ColumnSelection => Some(WizardStep::SourceSelection),
            WizardStep::Ingestion => Some(WizardStep::ColumnSelection),
        }
    }
}

/// Locally detected reasons an operation was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("{0}")]
    Validation(String),

    #[error("Another operation is still in progress")]
    Busy,

    #[error("{action} is not available on the {step} step")]
    WrongStep {
        action: &'static str,
        step: &'static str,
    },
}

fn invalid(message: impl Into<String>) -> WizardError {
    WizardError::Validation(message.into())
}

/// What the in-flight request will update when it settles
#[derive(Debug, Clone, PartialEq, Eq)]
enum PendingAction {
    Connect,
    ListTables,
    /// The table only becomes the selection once its columns arrive
    ListColumns { table: String },
    Ingest,
}

impl PendingAction {
    /// Message shown when a failure carries no server detail
    fn fallback_message(&self) -> &'static str {
        match self {
            PendingAction::Connect => "Connection failed",
            PendingAction::ListTables => "Failed to fetch tables",
            PendingAction::ListColumns { .. } => "Failed to fetch columns",
            PendingAction::Ingest => "Ingestion failed",
        }
    }
}

#[derive(Debug, Clone)]
struct InFlight {
    ticket: u64,
    action: PendingAction,
}

/// Options for the ingestion call that are not part of the data model proper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferOptions {
    pub export_format: FileFormat,
    pub target_table: Option<String>,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            export_format: FileFormat::Csv,
            target_table: None,
        }
    }
}

/// Workflow state for one wizard session
#[derive(Debug, Clone)]
pub struct Wizard {
    step: WizardStep,
    profile: ConnectionProfile,
    source: Source,
    columns: Vec<ColumnInfo>,
    /// Kept in catalog order
    selected_columns: Vec<String>,
    status: OperationStatus,
    result: Option<IngestionResult>,
    options: TransferOptions,
    in_flight: Option<InFlight>,
    next_ticket: u64,
    /// Starting values restored by `reset`
    initial_profile: ConnectionProfile,
    initial_options: TransferOptions,
}

impl Default for Wizard {
    fn default() -> Self {
        Self::new(ConnectionProfile::default(), TransferOptions::default())
    }
}

impl Wizard {
    pub fn new(profile: ConnectionProfile, options: TransferOptions) -> Self {
        Self {
            step: WizardStep::Connection,
            profile: profile.clone(),
            source: Source::Unselected,
            columns: Vec::new(),
            selected_columns: Vec::new(),
            status: OperationStatus::default(),
            result: None,
            options: options.clone(),
            in_flight: None,
            next_ticket: 1,
            initial_profile: profile,
            initial_options: options,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn profile(&self) -> &ConnectionProfile {
        &self.profile
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn source_kind(&self) -> Option<SourceKind> {
        self.source.kind()
    }

    pub fn columns(&self) -> &[ColumnInfo] {
        &self.columns
    }

    pub fn selected_columns(&self) -> &[String] {
        &self.selected_columns
    }

    pub fn is_column_selected(&self, name: &str) -> bool {
        self.selected_columns.iter().any(|c| c == name)
    }

    pub fn status(&self) -> &OperationStatus {
        &self.status
    }

    pub fn result(&self) -> Option<&IngestionResult> {
        self.result.as_ref()
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the ingestion trigger should be enabled
    pub fn can_ingest(&self) -> bool {
        !self.is_busy() && self.ingest_blocker().is_none()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Step 0: Connection
    // ─────────────────────────────────────────────────────────────────────────

    /// Edit one connection field; only allowed while on the connection step
    pub fn set_profile_field(&mut self, field: ProfileField, value: &str) -> Result<(), WizardError> {
        self.ensure_step(WizardStep::Connection, "Editing the connection")?;
        self.ensure_idle()?;

        match field {
            ProfileField::Host => self.profile.host = value.trim().to_string(),
            ProfileField::Port => {
                self.profile.port = parse_port(value)
                    .ok_or_else(|| invalid("Port must be a number between 1 and 65535"))?;
            }
            ProfileField::Database => self.profile.database = value.trim().to_string(),
            ProfileField::User => self.profile.user = value.trim().to_string(),
            ProfileField::Credential => self.profile.credential = value.to_string(),
        }
        Ok(())
    }

    pub fn begin_connect(&mut self) -> Result<ServiceRequest, WizardError> {
        self.ensure_step(WizardStep::Connection, "Connect")?;
        self.ensure_idle()?;

        let missing = self.profile.missing_fields();
        if !missing.is_empty() {
            let labels: Vec<&str> = missing.iter().map(|f| f.label()).collect();
            return Err(self.reject(invalid(format!(
                "Missing connection fields: {}",
                labels.join(", ")
            ))));
        }

        Ok(self.issue(PendingAction::Connect, ServiceCall::Connect(self.profile.clone())))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Step 1: Source selection
    // ─────────────────────────────────────────────────────────────────────────

    /// Switch source kind, resetting every branch-dependent selection
    ///
    /// Choosing the remote branch returns the table listing request. Choosing
    /// the kind that is already active keeps its state; the table catalog is
    /// only replaced once a new listing succeeds.
    pub fn choose_source(&mut self, kind: SourceKind) -> Result<Option<ServiceRequest>, WizardError> {
        self.ensure_step(WizardStep::SourceSelection, "Choosing a source")?;
        self.ensure_idle()?;

        debug!(source = kind.label(), "source kind chosen");
        if self.source.kind() != Some(kind) {
            self.source = Source::empty(kind);
            self.replace_columns(Vec::new());
        }
        self.status = OperationStatus::default();

        match kind {
            SourceKind::RemoteTable => Ok(Some(self.issue(
                PendingAction::ListTables,
                ServiceCall::ListTables(self.profile.clone()),
            ))),
            SourceKind::FlatFile => Ok(None),
        }
    }

    /// Request the columns of a table from the current catalog
    pub fn select_table(&mut self, table: &str) -> Result<ServiceRequest, WizardError> {
        self.ensure_step(WizardStep::SourceSelection, "Choosing a table")?;
        self.ensure_idle()?;

        match &self.source {
            Source::RemoteTable { tables, .. } if tables.iter().any(|t| t == table) => {}
            Source::RemoteTable { .. } => {
                return Err(self.reject(invalid(format!("Unknown table: {}", table))));
            }
            _ => {
                return Err(self.reject(invalid("Choose ClickHouse as the source first")));
            }
        }

        let call = ServiceCall::ListColumns {
            connection: self.profile.clone(),
            table: table.to_string(),
        };
        Ok(self.issue(
            PendingAction::ListColumns {
                table: table.to_string(),
            },
            call,
        ))
    }

    /// Hold a loaded flat file; its header columns become the catalog
    pub fn select_file(&mut self, file: FlatFile) -> Result<(), WizardError> {
        self.ensure_step(WizardStep::SourceSelection, "Choosing a file")?;
        self.ensure_idle()?;

        if !matches!(self.source, Source::FlatFile { .. }) {
            return Err(self.reject(invalid("Choose Flat file as the source first")));
        }
        if file.columns.is_empty() {
            return Err(self.reject(invalid(format!("No columns found in {}", file.name))));
        }

        info!(file = %file.name, columns = file.columns.len(), "flat file selected");
        self.replace_columns(file.columns.clone());
        self.source = Source::FlatFile { file: Some(file) };
        self.status = OperationStatus::default();
        self.step = WizardStep::ColumnSelection;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Step 2: Column selection
    // ─────────────────────────────────────────────────────────────────────────

    pub fn toggle_column(&mut self, name: &str) -> Result<(), WizardError> {
        if !self.columns.iter().any(|c| c.name == name) {
            return Err(invalid(format!("Unknown column: {}", name)));
        }

        if self.is_column_selected(name) {
            self.selected_columns.retain(|c| c != name);
        } else {
            let mut selected = std::mem::take(&mut self.selected_columns);
            selected.push(name.to_string());
            self.selected_columns = self
                .columns
                .iter()
                .filter(|c| selected.contains(&c.name))
                .map(|c| c.name.clone())
                .collect();
        }
        Ok(())
    }

    pub fn select_all_columns(&mut self) {
        self.selected_columns = self.columns.iter().map(|c| c.name.clone()).collect();
    }

    pub fn clear_column_selection(&mut self) {
        self.selected_columns.clear();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Step 3: Ingestion
    // ─────────────────────────────────────────────────────────────────────────

    pub fn toggle_export_format(&mut self) {
        self.options.export_format = self.options.export_format.toggle();
    }

    /// Set the destination table for file imports; blank means "let the service pick"
    pub fn set_target_table(&mut self, name: &str) -> Result<(), WizardError> {
        let name = name.trim();
        if name.is_empty() {
            self.options.target_table = None;
            return Ok(());
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid(
                "Table names may only contain letters, digits and underscores",
            ));
        }
        self.options.target_table = Some(name.to_string());
        Ok(())
    }

    /// Validate locally and build the ingestion request for the active branch
    pub fn begin_ingest(&mut self) -> Result<ServiceRequest, WizardError> {
        self.ensure_idle()?;
        let call = match self.ingest_call() {
            Ok(call) => call,
            Err(err) => return Err(self.reject(err)),
        };
        Ok(self.issue(PendingAction::Ingest, call))
    }

    /// Why ingestion cannot run right now, if it cannot
    pub fn ingest_blocker(&self) -> Option<&'static str> {
        if self.selected_columns.is_empty() {
            return Some("Select at least one column");
        }
        match &self.source {
            Source::Unselected => Some("Choose a data source first"),
            Source::RemoteTable { selected: None, .. } => Some("Choose a table first"),
            Source::FlatFile { file: None } => Some("Choose a file first"),
            _ => None,
        }
    }

    fn ingest_call(&self) -> Result<ServiceCall, WizardError> {
        if let Some(reason) = self.ingest_blocker() {
            return Err(invalid(reason));
        }

        match &self.source {
            Source::RemoteTable {
                selected: Some(table),
                ..
            } => Ok(ServiceCall::ExportTable(ExportRequest {
                connection: self.profile.clone(),
                table: table.clone(),
                columns: self.selected_columns.clone(),
                format: self.options.export_format,
            })),
            Source::FlatFile { file: Some(file) } => Ok(ServiceCall::ImportFile(ImportRequest {
                connection: self.profile.clone(),
                file_name: file.name.clone(),
                format: file.format,
                bytes: file.bytes.clone(),
                columns: self.selected_columns.clone(),
                table: self.options.target_table.clone(),
            })),
            _ => Err(invalid("Choose a data source first")),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────────

    /// Manual forward navigation; never blocked, actions guard themselves
    pub fn next(&mut self) -> WizardStep {
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        self.step
    }

    pub fn back(&mut self) -> WizardStep {
        if let Some(prev) = self.step.prev() {
            self.go_back_to(prev);
        }
        self.step
    }

    /// Jump to any earlier (or the current) step
    pub fn go_back_to(&mut self, step: WizardStep) -> bool {
        if step > self.step {
            return false;
        }
        if step < WizardStep::Ingestion {
            self.result = None;
        }
        self.step = step;
        true
    }

    /// Discard the whole session, including any request still in flight
    pub fn reset(&mut self) {
        if let Some(in_flight) = &self.in_flight {
            info!(ticket = in_flight.ticket, "abandoning in-flight request");
        }
        let next_ticket = self.next_ticket;
        *self = Self::new(self.initial_profile.clone(), self.initial_options.clone());
        // Tickets stay unique across resets so late replies can't match
        self.next_ticket = next_ticket;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Settlement
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply the outcome of a request; returns the notification to show
    pub fn settle(
        &mut self,
        ticket: u64,
        outcome: Result<ServiceReply, ServiceError>,
    ) -> Option<Notification> {
        let action = match self.in_flight.take() {
            Some(in_flight) if in_flight.ticket == ticket => in_flight.action,
            other => {
                warn!(ticket, "ignoring settlement for a request that is no longer in flight");
                self.in_flight = other;
                return None;
            }
        };

        match outcome {
            Ok(reply) => self.apply_reply(action, reply),
            Err(err) => {
                let message = err
                    .detail()
                    .map(str::to_string)
                    .unwrap_or_else(|| action.fallback_message().to_string());
                warn!(ticket, error = %err, "request failed");
                self.status = OperationStatus::failed(message.clone());
                Some(Notification::error(message))
            }
        }
    }

    fn apply_reply(&mut self, action: PendingAction, reply: ServiceReply) -> Option<Notification> {
        match (action, reply) {
            (PendingAction::Connect, ServiceReply::Connected) => {
                info!(host = %self.profile.host, "connected");
                self.status = OperationStatus::succeeded();
                if self.step == WizardStep::Connection {
                    self.step = WizardStep::SourceSelection;
                }
                Some(Notification::success("Connected successfully!"))
            }
            (PendingAction::ListTables, ServiceReply::Tables(names)) => {
                info!(count = names.len(), "tables listed");
                if let Source::RemoteTable { tables, .. } = &mut self.source {
                    *tables = names;
                }
                self.status = OperationStatus::succeeded();
                None
            }
            (PendingAction::ListColumns { table }, ServiceReply::Columns(columns)) => {
                info!(table = %table, count = columns.len(), "columns listed");
                if let Source::RemoteTable { selected, .. } = &mut self.source {
                    *selected = Some(table);
                }
                self.replace_columns(columns);
                self.status = OperationStatus::succeeded();
                if self.step == WizardStep::SourceSelection {
                    self.step = WizardStep::ColumnSelection;
                }
                None
            }
            (PendingAction::Ingest, ServiceReply::Exported { record_count, filename }) => {
                self.finish_ingest(record_count, Destination::File(filename))
            }
            (PendingAction::Ingest, ServiceReply::Imported { record_count, table }) => {
                self.finish_ingest(record_count, Destination::Table(table))
            }
            (action, reply) => {
                warn!(?action, ?reply, "reply does not match the pending action");
                let message = action.fallback_message();
                self.status = OperationStatus::failed(message);
                Some(Notification::error(message))
            }
        }
    }

    fn finish_ingest(&mut self, record_count: u64, destination: Destination) -> Option<Notification> {
        info!(record_count, ?destination, "ingestion finished");
        // Leaving the ingestion step discards results, including late ones
        if self.step == WizardStep::Ingestion {
            self.result = Some(IngestionResult {
                record_count,
                destination,
            });
        } else {
            debug!(step = ?self.step, "dropping result that arrived after leaving ingestion");
        }
        self.status = OperationStatus::succeeded();
        Some(Notification::success(format!(
            "Successfully processed {} records",
            record_count
        )))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn issue(&mut self, action: PendingAction, call: ServiceCall) -> ServiceRequest {
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        info!(ticket, call = call.name(), "issuing request");
        self.in_flight = Some(InFlight { ticket, action });
        self.status = OperationStatus::pending();
        ServiceRequest { ticket, call }
    }

    /// Replacing the catalog always drops the selection
    fn replace_columns(&mut self, columns: Vec<ColumnInfo>) {
        self.columns = columns;
        self.selected_columns.clear();
    }

    fn ensure_idle(&self) -> Result<(), WizardError> {
        if self.is_busy() {
            return Err(WizardError::Busy);
        }
        Ok(())
    }

    fn ensure_step(&self, step: WizardStep, action: &'static str) -> Result<(), WizardError> {
        if self.step != step {
            return Err(WizardError::WrongStep {
                action,
                step: self.step.title(),
            });
        }
        Ok(())
    }

    fn reject(&self, err: WizardError) -> WizardError {
        debug!(error = %err, step = self.step.title(), "rejected locally");
        err
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::status::{NotificationLevel, OperationPhase};
    use std::path::PathBuf;

    fn profile() -> ConnectionProfile {
        ConnectionProfile {
            host: "localhost".to_string(),
            port: 9000,
            database: "default".to_string(),
            user: "default".to_string(),
            credential: "x".to_string(),
        }
    }

    fn connected() -> Wizard {
        let mut wizard = Wizard::new(profile(), TransferOptions::default());
        let request = wizard.begin_connect().unwrap();
        wizard.settle(request.ticket, Ok(ServiceReply::Connected));
        wizard
    }

    fn with_tables(tables: &[&str]) -> Wizard {
        let mut wizard = connected();
        let request = wizard.choose_source(SourceKind::RemoteTable).unwrap().unwrap();
        let names = tables.iter().map(|t| t.to_string()).collect();
        wizard.settle(request.ticket, Ok(ServiceReply::Tables(names)));
        wizard
    }

    fn users_columns() -> Vec<ColumnInfo> {
        vec![
            ColumnInfo::new("id", "UInt64"),
            ColumnInfo::new("ts", "DateTime"),
        ]
    }

    fn with_users_table() -> Wizard {
        let mut wizard = with_tables(&["events", "users"]);
        let request = wizard.select_table("users").unwrap();
        wizard.settle(request.ticket, Ok(ServiceReply::Columns(users_columns())));
        wizard
    }

    fn flat_file() -> FlatFile {
        FlatFile {
            path: PathBuf::from("/tmp/people.csv"),
            name: "people.csv".to_string(),
            format: FileFormat::Csv,
            bytes: b"name,age\nada,36\n".to_vec(),
            columns: vec![ColumnInfo::new("name", "String"), ColumnInfo::new("age", "String")],
        }
    }

    fn with_file() -> Wizard {
        let mut wizard = connected();
        assert!(wizard.choose_source(SourceKind::FlatFile).unwrap().is_none());
        wizard.select_file(flat_file()).unwrap();
        wizard
    }

    fn auth_rejected() -> ServiceError {
        ServiceError::Server {
            status: 400,
            detail: Some("auth rejected".to_string()),
        }
    }

    #[test]
    fn test_connect_success_advances_to_source_selection() {
        let mut wizard = Wizard::new(profile(), TransferOptions::default());
        let request = wizard.begin_connect().unwrap();
        assert_eq!(request.call, ServiceCall::Connect(profile()));
        assert!(wizard.status().is_pending());

        let note = wizard.settle(request.ticket, Ok(ServiceReply::Connected)).unwrap();
        assert_eq!(note.level, NotificationLevel::Success);
        assert_eq!(wizard.step(), WizardStep::SourceSelection);
        assert_eq!(wizard.status().phase, OperationPhase::Succeeded);
        assert!(!wizard.is_busy());
    }

    #[test]
    fn test_connect_requires_all_fields() {
        let mut wizard = Wizard::default();
        let err = wizard.begin_connect().unwrap_err();
        assert_eq!(err, WizardError::Validation("Missing connection fields: JWT Token".to_string()));
        assert!(!wizard.is_busy());
        assert_eq!(wizard.status().phase, OperationPhase::Idle);
    }

    #[test]
    fn test_connect_failure_keeps_profile_and_step() {
        let mut wizard = Wizard::new(profile(), TransferOptions::default());
        let request = wizard.begin_connect().unwrap();

        let note = wizard.settle(request.ticket, Err(auth_rejected())).unwrap();
        assert_eq!(note, Notification::error("auth rejected"));
        assert_eq!(wizard.status().phase, OperationPhase::Failed);
        assert_eq!(wizard.status().error_message.as_deref(), Some("auth rejected"));
        assert_eq!(wizard.step(), WizardStep::Connection);
        assert_eq!(wizard.profile(), &profile());
    }

    #[test]
    fn test_failure_without_detail_uses_fallback() {
        let mut wizard = Wizard::new(profile(), TransferOptions::default());
        let request = wizard.begin_connect().unwrap();
        let note = wizard
            .settle(request.ticket, Err(ServiceError::Transport("refused".to_string())))
            .unwrap();
        assert_eq!(note.message, "Connection failed");
    }

    #[test]
    fn test_set_profile_field_validates_port_and_step() {
        let mut wizard = Wizard::default();
        assert!(wizard.set_profile_field(ProfileField::Port, "8123").is_ok());
        assert_eq!(wizard.profile().port, 8123);
        assert!(matches!(
            wizard.set_profile_field(ProfileField::Port, "70000"),
            Err(WizardError::Validation(_))
        ));
        assert_eq!(wizard.profile().port, 8123);

        wizard.next();
        assert!(matches!(
            wizard.set_profile_field(ProfileField::Host, "other"),
            Err(WizardError::WrongStep { .. })
        ));
    }

    #[test]
    fn test_busy_guard_rejects_second_action() {
        let mut wizard = Wizard::new(profile(), TransferOptions::default());
        let _request = wizard.begin_connect().unwrap();
        assert_eq!(wizard.begin_connect(), Err(WizardError::Busy));
        assert_eq!(
            wizard.set_profile_field(ProfileField::Host, "elsewhere"),
            Err(WizardError::Busy)
        );
    }

    #[test]
    fn test_remote_source_lists_tables_then_columns() {
        let mut wizard = with_tables(&["events", "users"]);
        assert_eq!(wizard.source().tables(), ["events".to_string(), "users".to_string()]);
        assert_eq!(wizard.step(), WizardStep::SourceSelection);

        let request = wizard.select_table("users").unwrap();
        assert_eq!(
            request.call,
            ServiceCall::ListColumns {
                connection: profile(),
                table: "users".to_string()
            }
        );
        wizard.settle(request.ticket, Ok(ServiceReply::Columns(users_columns())));

        assert_eq!(wizard.columns(), users_columns().as_slice());
        assert!(wizard.selected_columns().is_empty());
        assert_eq!(wizard.source().selected_table(), Some("users"));
        assert_eq!(wizard.step(), WizardStep::ColumnSelection);
    }

    #[test]
    fn test_select_table_must_be_in_catalog() {
        let mut wizard = with_tables(&["events"]);
        assert!(matches!(
            wizard.select_table("missing"),
            Err(WizardError::Validation(_))
        ));
        assert!(!wizard.is_busy());
    }

    #[test]
    fn test_list_columns_failure_keeps_previous_table() {
        let mut wizard = with_users_table();
        wizard.back();
        let request = wizard.select_table("events").unwrap();
        let note = wizard.settle(request.ticket, Err(auth_rejected())).unwrap();

        assert_eq!(note.message, "auth rejected");
        assert_eq!(wizard.source().selected_table(), Some("users"));
        assert_eq!(wizard.columns(), users_columns().as_slice());
        assert_eq!(wizard.step(), WizardStep::SourceSelection);
    }

    #[test]
    fn test_new_column_catalog_clears_selection() {
        let mut wizard = with_users_table();
        wizard.toggle_column("id").unwrap();
        wizard.back();

        let request = wizard.select_table("events").unwrap();
        wizard.settle(
            request.ticket,
            Ok(ServiceReply::Columns(vec![ColumnInfo::new("kind", "String")])),
        );
        assert!(wizard.selected_columns().is_empty());
        assert_eq!(wizard.source().selected_table(), Some("events"));
    }

    #[test]
    fn test_changing_source_resets_branch_state() {
        let mut wizard = with_users_table();
        wizard.toggle_column("id").unwrap();
        wizard.go_back_to(WizardStep::SourceSelection);

        assert!(wizard.choose_source(SourceKind::FlatFile).unwrap().is_none());
        assert_eq!(wizard.source(), &Source::FlatFile { file: None });
        assert!(wizard.columns().is_empty());
        assert!(wizard.selected_columns().is_empty());
        assert!(wizard.source().tables().is_empty());

        // Choosing the active kind again keeps the loaded file
        wizard.select_file(flat_file()).unwrap();
        wizard.back();
        assert!(wizard.choose_source(SourceKind::FlatFile).unwrap().is_none());
        assert_eq!(wizard.source().file(), Some(&flat_file()));
        assert_eq!(wizard.columns().len(), 2);
    }

    #[test]
    fn test_failed_table_relisting_keeps_catalog() {
        let mut wizard = with_users_table();
        wizard.toggle_column("id").unwrap();
        wizard.back();

        let request = wizard.choose_source(SourceKind::RemoteTable).unwrap().unwrap();
        assert_eq!(wizard.source().tables(), ["events".to_string(), "users".to_string()]);
        let note = wizard.settle(request.ticket, Err(auth_rejected())).unwrap();

        assert_eq!(note.message, "auth rejected");
        assert_eq!(wizard.source().tables(), ["events".to_string(), "users".to_string()]);
        assert_eq!(wizard.source().selected_table(), Some("users"));
        assert_eq!(wizard.selected_columns(), ["id".to_string()]);

        // A successful relisting replaces the catalog
        let request = wizard.choose_source(SourceKind::RemoteTable).unwrap().unwrap();
        wizard.settle(request.ticket, Ok(ServiceReply::Tables(vec!["orders".to_string()])));
        assert_eq!(wizard.source().tables(), ["orders".to_string()]);
    }

    #[test]
    fn test_select_file_populates_catalog_and_advances() {
        let wizard = with_file();
        assert_eq!(wizard.step(), WizardStep::ColumnSelection);
        assert_eq!(wizard.columns().len(), 2);
        assert!(wizard.selected_columns().is_empty());
        assert_eq!(wizard.source().file().map(|f| f.name.as_str()), Some("people.csv"));
    }

    #[test]
    fn test_select_file_requires_file_branch() {
        let mut wizard = with_tables(&["events"]);
        assert!(matches!(
            wizard.select_file(flat_file()),
            Err(WizardError::Validation(_))
        ));
    }

    #[test]
    fn test_toggle_column_keeps_catalog_order() {
        let mut wizard = with_users_table();
        wizard.toggle_column("ts").unwrap();
        wizard.toggle_column("id").unwrap();
        assert_eq!(wizard.selected_columns(), ["id".to_string(), "ts".to_string()]);

        wizard.toggle_column("ts").unwrap();
        assert_eq!(wizard.selected_columns(), ["id".to_string()]);

        assert!(wizard.toggle_column("nope").is_err());
    }

    #[test]
    fn test_select_all_and_clear() {
        let mut wizard = with_users_table();
        wizard.select_all_columns();
        assert_eq!(wizard.selected_columns().len(), 2);
        wizard.clear_column_selection();
        assert!(wizard.selected_columns().is_empty());
    }

    #[test]
    fn test_ingest_rejected_locally_with_empty_selection_on_any_step() {
        let mut wizard = with_users_table();
        for _ in 0..3 {
            assert_eq!(
                wizard.begin_ingest(),
                Err(WizardError::Validation("Select at least one column".to_string()))
            );
            assert!(!wizard.is_busy());
            assert!(!wizard.can_ingest());
            wizard.next();
        }
        wizard.go_back_to(WizardStep::Connection);
        assert!(wizard.begin_ingest().is_err());
        assert!(!wizard.is_busy());
    }

    #[test]
    fn test_ingest_table_to_file() {
        let mut wizard = with_users_table();
        wizard.toggle_column("id").unwrap();
        wizard.next();
        assert_eq!(wizard.step(), WizardStep::Ingestion);
        assert!(wizard.can_ingest());

        let request = wizard.begin_ingest().unwrap();
        assert_eq!(
            request.call,
            ServiceCall::ExportTable(ExportRequest {
                connection: profile(),
                table: "users".to_string(),
                columns: vec!["id".to_string()],
                format: FileFormat::Csv,
            })
        );

        let note = wizard
            .settle(
                request.ticket,
                Ok(ServiceReply::Exported {
                    record_count: 1000,
                    filename: "out.csv".to_string(),
                }),
            )
            .unwrap();
        assert_eq!(note, Notification::success("Successfully processed 1000 records"));
        let result = wizard.result().unwrap();
        assert_eq!(
            result.summary_lines(),
            [
                "Records processed: 1000".to_string(),
                "File saved as: out.csv".to_string()
            ]
        );
    }

    #[test]
    fn test_ingest_file_to_table_carries_connection() {
        let mut wizard = with_file();
        wizard.toggle_column("name").unwrap();
        wizard.set_target_table("imported").unwrap();
        wizard.next();

        let request = wizard.begin_ingest().unwrap();
        match &request.call {
            ServiceCall::ImportFile(import) => {
                assert_eq!(import.connection, profile());
                assert_eq!(import.columns, vec!["name".to_string()]);
                assert_eq!(import.file_name, "people.csv");
                assert_eq!(import.table.as_deref(), Some("imported"));
            }
            other => panic!("unexpected call: {:?}", other),
        }

        wizard.settle(
            request.ticket,
            Ok(ServiceReply::Imported {
                record_count: 50,
                table: "imported".to_string(),
            }),
        );
        let result = wizard.result().unwrap();
        assert_eq!(result.summary_lines()[1], "Data imported to table: imported");
    }

    #[test]
    fn test_ingest_failure_leaves_result_untouched() {
        let mut wizard = with_users_table();
        wizard.toggle_column("id").unwrap();
        wizard.next();
        let request = wizard.begin_ingest().unwrap();
        let note = wizard.settle(request.ticket, Err(auth_rejected())).unwrap();

        assert_eq!(note.message, "auth rejected");
        assert!(wizard.result().is_none());
        assert_eq!(wizard.step(), WizardStep::Ingestion);
        assert_eq!(wizard.selected_columns(), ["id".to_string()]);
    }

    #[test]
    fn test_back_from_ingestion_discards_result() {
        let mut wizard = with_users_table();
        wizard.toggle_column("id").unwrap();
        wizard.next();
        let request = wizard.begin_ingest().unwrap();
        wizard.settle(
            request.ticket,
            Ok(ServiceReply::Exported {
                record_count: 1,
                filename: "a.csv".to_string(),
            }),
        );
        assert!(wizard.result().is_some());

        wizard.back();
        assert!(wizard.result().is_none());
        assert_eq!(wizard.selected_columns(), ["id".to_string()]);
    }

    #[test]
    fn test_ingest_settling_after_back_leaves_no_result() {
        let mut wizard = with_users_table();
        wizard.toggle_column("id").unwrap();
        wizard.next();
        let request = wizard.begin_ingest().unwrap();

        wizard.back();
        wizard.clear_column_selection();
        let note = wizard.settle(
            request.ticket,
            Ok(ServiceReply::Exported {
                record_count: 5,
                filename: "a.csv".to_string(),
            }),
        );

        assert_eq!(note.unwrap().level, NotificationLevel::Success);
        assert_eq!(wizard.step(), WizardStep::ColumnSelection);
        assert!(wizard.result().is_none());
        assert!(!wizard.is_busy());

        wizard.next();
        assert!(wizard.result().is_none());
    }

    #[test]
    fn test_back_navigation_preserves_selection_subset() {
        let mut wizard = with_users_table();
        wizard.select_all_columns();
        for _ in 0..5 {
            wizard.back();
            let names: Vec<&str> = wizard.columns().iter().map(|c| c.name.as_str()).collect();
            assert!(wizard
                .selected_columns()
                .iter()
                .all(|c| names.contains(&c.as_str())));
        }
        assert_eq!(wizard.step(), WizardStep::Connection);
        assert!(!wizard.go_back_to(WizardStep::Ingestion));
    }

    #[test]
    fn test_stale_ticket_after_reset_is_ignored() {
        let mut wizard = Wizard::new(profile(), TransferOptions::default());
        let request = wizard.begin_connect().unwrap();
        wizard.reset();
        assert!(!wizard.is_busy());

        assert!(wizard.settle(request.ticket, Ok(ServiceReply::Connected)).is_none());
        assert_eq!(wizard.step(), WizardStep::Connection);
        assert_eq!(wizard.status().phase, OperationPhase::Idle);

        // A fresh request after reset gets a new ticket
        let fresh = wizard.begin_connect().unwrap();
        assert_ne!(fresh.ticket, request.ticket);
    }

    #[test]
    fn test_mismatched_reply_fails_the_action() {
        let mut wizard = Wizard::new(profile(), TransferOptions::default());
        let request = wizard.begin_connect().unwrap();
        let note = wizard
            .settle(request.ticket, Ok(ServiceReply::Tables(vec![])))
            .unwrap();
        assert_eq!(note.level, NotificationLevel::Error);
        assert_eq!(wizard.status().phase, OperationPhase::Failed);
        assert!(!wizard.is_busy());
    }

    #[test]
    fn test_target_table_validation() {
        let mut wizard = Wizard::default();
        assert!(wizard.set_target_table("bad name;").is_err());
        wizard.set_target_table("good_name_1").unwrap();
        assert_eq!(wizard.options().target_table.as_deref(), Some("good_name_1"));
        wizard.set_target_table("  ").unwrap();
        assert!(wizard.options().target_table.is_none());
    }

    #[test]
    fn test_export_format_toggle_reaches_request() {
        let mut wizard = with_users_table();
        wizard.toggle_column("ts").unwrap();
        wizard.toggle_export_format();
        let request = wizard.begin_ingest().unwrap();
        match request.call {
            ServiceCall::ExportTable(export) => assert_eq!(export.format, FileFormat::Json),
            other => panic!("unexpected call: {:?}", other),
        }
    }
}
