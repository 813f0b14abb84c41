//! Status of network actions and their user-facing outcomes

/// Lifecycle phase of the current network action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OperationPhase {
    #[default]
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// Phase plus the message of the last failure
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OperationStatus {
    pub phase: OperationPhase,
    pub error_message: Option<String>,
}

impl OperationStatus {
    pub fn pending() -> Self {
        Self {
            phase: OperationPhase::Pending,
            error_message: None,
        }
    }

    pub fn succeeded() -> Self {
        Self {
            phase: OperationPhase::Succeeded,
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            phase: OperationPhase::Failed,
            error_message: Some(message.into()),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.phase == OperationPhase::Pending
    }
}

/// Where the transferred rows ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    File(String),
    Table(String),
}

/// Outcome of a successful ingestion call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestionResult {
    pub record_count: u64,
    pub destination: Destination,
}

impl IngestionResult {
    /// Lines shown on the ingestion step
    pub fn summary_lines(&self) -> [String; 2] {
        let destination = match &self.destination {
            Destination::File(name) => format!("File saved as: {}", name),
            Destination::Table(name) => format!("Data imported to table: {}", name),
        };
        [format!("Records processed: {}", self.record_count), destination]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient message for the status bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}
