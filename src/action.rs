//! Action enum - All possible application actions
//!
//! Actions are discrete operations that the application can perform.
//! Components emit Actions in response to events, and the App processes
//! them by driving the wizard.

use crate::model::source::SourceKind;
use std::fmt;

/// All possible actions in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ─────────────────────────────────────────────────────────────────────────
    // App Lifecycle
    // ─────────────────────────────────────────────────────────────────────────
    /// Regular tick for polling the runner and expiring notifications
    Tick,
    /// Terminal was resized
    Resize(u16, u16),
    /// Force quit without confirmation
    ForceQuit,

    // ─────────────────────────────────────────────────────────────────────────
    // Wizard Navigation
    // ─────────────────────────────────────────────────────────────────────────
    /// Manual "Next"
    NextStep,
    /// Manual "Back"
    PrevStep,
    /// Discard the session and start over
    ResetWizard,

    // ─────────────────────────────────────────────────────────────────────────
    // Modals
    // ─────────────────────────────────────────────────────────────────────────
    /// Open quit confirmation dialog
    OpenQuitDialog,
    /// Open help dialog showing all keyboard shortcuts
    OpenHelp,
    /// Prompt for a local file path
    OpenFilePrompt,
    /// Prompt for the destination table of a file import
    OpenTargetTablePrompt,
    /// Close the current modal
    CloseModal,

    // ─────────────────────────────────────────────────────────────────────────
    // Step Actions
    // ─────────────────────────────────────────────────────────────────────────
    /// Submit the connection form
    Connect,
    /// Pick the data source kind
    ChooseSource(SourceKind),
    /// Pick a table from the catalog
    SelectTable(String),
    /// Load the flat file at a path
    LoadFile(String),
    /// Toggle one column in the selection
    ToggleColumn(String),
    /// Select every column in the catalog
    SelectAllColumns,
    /// Empty the column selection
    ClearColumns,
    /// Switch export format between csv and json
    ToggleExportFormat,
    /// Set (or clear, when blank) the import destination table
    SetTargetTable(String),
    /// Run the transfer
    StartIngest,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Tick => write!(f, "Tick"),
            Action::Resize(w, h) => write!(f, "Resize({}, {})", w, h),
            Action::ForceQuit => write!(f, "ForceQuit"),
            Action::NextStep => write!(f, "NextStep"),
            Action::PrevStep => write!(f, "PrevStep"),
            Action::ResetWizard => write!(f, "ResetWizard"),
            Action::OpenQuitDialog => write!(f, "OpenQuitDialog"),
            Action::OpenHelp => write!(f, "OpenHelp"),
            Action::OpenFilePrompt => write!(f, "OpenFilePrompt"),
            Action::OpenTargetTablePrompt => write!(f, "OpenTargetTablePrompt"),
            Action::CloseModal => write!(f, "CloseModal"),
            Action::Connect => write!(f, "Connect"),
            Action::ChooseSource(kind) => write!(f, "ChooseSource({})", kind.label()),
            Action::SelectTable(table) => write!(f, "SelectTable({})", table),
            Action::LoadFile(path) => write!(f, "LoadFile({})", path),
            Action::ToggleColumn(column) => write!(f, "ToggleColumn({})", column),
            Action::SelectAllColumns => write!(f, "SelectAllColumns"),
            Action::ClearColumns => write!(f, "ClearColumns"),
            Action::ToggleExportFormat => write!(f, "ToggleExportFormat"),
            Action::SetTargetTable(table) => write!(f, "SetTargetTable({})", table),
            Action::StartIngest => write!(f, "StartIngest"),
        }
    }
}
