//! Model layer - centralized state management
//!
//! This module contains all state-related types:
//! - `Wizard` - the step sequencer and sole owner of workflow state
//! - `ConnectionProfile`, `Source`, `ColumnInfo` - what the wizard collects
//! - `OperationStatus`, `IngestionResult` - outcomes of network actions
//! - `ModalStack` - Modal overlay management

pub mod connection;
pub mod modal;
pub mod source;
pub mod status;
pub mod wizard;

pub use connection::ProfileField;
