//! UI Components
//!
//! Each component encapsulates its own state, event handling, and rendering logic.
//! Components communicate through Actions rather than direct state mutation.

pub mod column_picker;
pub mod connection_form;
pub mod help_dialog;
pub mod ingest_panel;
pub mod layout;
pub mod prompt_dialog;
pub mod quit_dialog;
pub mod source_picker;
pub mod wizard_screen;

pub use column_picker::ColumnPicker;
pub use connection_form::ConnectionForm;
pub use help_dialog::HelpDialog;
pub use ingest_panel::IngestPanel;
pub use layout::{calculate_wizard_layout, centered_popup};
pub use prompt_dialog::PromptDialog;
pub use quit_dialog::QuitDialog;
pub use source_picker::SourcePicker;
pub use wizard_screen::{render_help_bar, render_status_bar, render_stepper, WizardRenderContext};
