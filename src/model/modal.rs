//! Modal stack for managing overlays
//!
//! Only the top modal receives input; the wizard step underneath keeps
//! rendering.

/// What a text prompt is collecting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptPurpose {
    /// Path of a local `.csv`/`.json` file
    FilePath,
    /// Destination table for a file import
    TargetTable,
}

impl PromptPurpose {
    pub fn title(&self) -> &'static str {
        match self {
            PromptPurpose::FilePath => " Open File ",
            PromptPurpose::TargetTable => " Destination Table ",
        }
    }

    pub fn hint(&self) -> &'static str {
        match self {
            PromptPurpose::FilePath => "Path to a .csv or .json file:",
            PromptPurpose::TargetTable => "Table to import into (blank = generated name):",
        }
    }
}

/// Represents a modal overlay that can be displayed on top of the wizard
#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    /// Quit confirmation dialog
    QuitConfirm,
    /// Help dialog showing all keyboard shortcuts
    Help,
    /// Single-line text prompt
    Prompt { purpose: PromptPurpose },
}

/// A stack of modal overlays
///
/// Modals are rendered from bottom to top, with only the top modal
/// receiving input events.
#[derive(Debug, Default)]
pub struct ModalStack {
    stack: Vec<Modal>,
}

impl ModalStack {
    /// Create a new empty modal stack
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    /// Push a modal onto the stack
    pub fn push(&mut self, modal: Modal) {
        self.stack.push(modal);
    }

    /// Pop the top modal from the stack
    pub fn pop(&mut self) -> Option<Modal> {
        self.stack.pop()
    }

    /// Get a reference to the top modal without removing it
    pub fn top(&self) -> Option<&Modal> {
        self.stack.last()
    }

    /// Check if the stack is empty
    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.stack.clear();
    }
}
