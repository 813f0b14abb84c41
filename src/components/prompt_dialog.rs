//! Single-line text prompt (file path, destination table)

use crate::action::Action;
use crate::component::Component;
use crate::components::centered_popup;
use crate::model::modal::PromptPurpose;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub struct PromptDialog {
    pub purpose: PromptPurpose,
    pub input: String,
}

impl Default for PromptDialog {
    fn default() -> Self {
        Self::new(PromptPurpose::FilePath, "")
    }
}

impl PromptDialog {
    pub fn new(purpose: PromptPurpose, initial: &str) -> Self {
        Self {
            purpose,
            input: initial.to_string(),
        }
    }

    /// Reuse the dialog for another prompt
    pub fn open(&mut self, purpose: PromptPurpose, initial: &str) {
        self.purpose = purpose;
        self.input = initial.to_string();
    }

    fn submit(&self) -> Option<Action> {
        match self.purpose {
            PromptPurpose::FilePath if self.input.trim().is_empty() => None,
            PromptPurpose::FilePath => Some(Action::LoadFile(self.input.trim().to_string())),
            PromptPurpose::TargetTable => Some(Action::SetTargetTable(self.input.clone())),
        }
    }
}

impl Component for PromptDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc => Some(Action::CloseModal),
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.input.pop();
                None
            }
            KeyCode::Char(c) => {
                self.input.push(c);
                None
            }
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let width = 64u16.min(area.width.saturating_sub(4));
        let popup_area = centered_popup(area, width, 7);
        frame.render_widget(Clear, popup_area);

        // Keep the tail of long paths visible
        let visible = width.saturating_sub(6) as usize;
        let count = self.input.chars().count();
        let shown: String = if count > visible {
            self.input.chars().skip(count - visible).collect()
        } else {
            self.input.clone()
        };

        let content = vec![
            Line::from(Span::styled(
                self.purpose.hint(),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled("> ", Style::default().fg(Color::Cyan)),
                Span::styled(
                    format!("{}_", shown),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled(" Enter ", Style::default().fg(Color::Yellow)),
                Span::raw("Confirm  "),
                Span::styled(" Esc ", Style::default().fg(Color::Yellow)),
                Span::raw("Cancel"),
            ]),
        ];

        let paragraph = Paragraph::new(content).block(
            Block::default()
                .borders(Borders::ALL)
                .title(self.purpose.title())
                .title_style(
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                )
                .border_style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(paragraph, popup_area);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_text(dialog: &mut PromptDialog, text: &str) {
        for c in text.chars() {
            dialog.handle_key_event(KeyEvent::from(KeyCode::Char(c))).unwrap();
        }
    }

    #[test]
    fn test_file_prompt_submits_trimmed_path() {
        let mut dialog = PromptDialog::new(PromptPurpose::FilePath, "");
        assert_eq!(
            dialog.handle_key_event(KeyEvent::from(KeyCode::Enter)).unwrap(),
            None
        );
        type_text(&mut dialog, " ~/data.csv ");
        assert_eq!(
            dialog.handle_key_event(KeyEvent::from(KeyCode::Enter)).unwrap(),
            Some(Action::LoadFile("~/data.csv".to_string()))
        );
    }

    #[test]
    fn test_target_prompt_allows_blank() {
        let mut dialog = PromptDialog::new(PromptPurpose::TargetTable, "old");
        for _ in 0..3 {
            dialog.handle_key_event(KeyEvent::from(KeyCode::Backspace)).unwrap();
        }
        assert_eq!(
            dialog.handle_key_event(KeyEvent::from(KeyCode::Enter)).unwrap(),
            Some(Action::SetTargetTable(String::new()))
        );
    }

    #[test]
    fn test_esc_cancels() {
        let mut dialog = PromptDialog::default();
        type_text(&mut dialog, "abc");
        assert_eq!(
            dialog.handle_key_event(KeyEvent::from(KeyCode::Esc)).unwrap(),
            Some(Action::CloseModal)
        );
    }
}
