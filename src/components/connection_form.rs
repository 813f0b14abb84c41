//! Connection step: the five-field connection form

use crate::action::Action;
use crate::component::Component;
use crate::model::connection::{ConnectionProfile, ProfileField};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Text buffers for the connection fields
///
/// Values are only handed to the wizard when the user submits, so a port
/// that is half typed never has to be valid.
pub struct ConnectionForm {
    pub focus: ProfileField,
    inputs: [String; 5],
    /// Whether a connect request is running (form is read-only)
    pub busy: bool,
}

impl Default for ConnectionForm {
    fn default() -> Self {
        Self::new(&ConnectionProfile::default())
    }
}

fn slot(field: ProfileField) -> usize {
    match field {
        ProfileField::Host => 0,
        ProfileField::Port => 1,
        ProfileField::Database => 2,
        ProfileField::User => 3,
        ProfileField::Credential => 4,
    }
}

impl ConnectionForm {
    pub fn new(profile: &ConnectionProfile) -> Self {
        let mut form = Self {
            focus: ProfileField::Host,
            inputs: Default::default(),
            busy: false,
        };
        form.load(profile);
        form
    }

    /// Replace every buffer with the profile's values
    pub fn load(&mut self, profile: &ConnectionProfile) {
        for field in ProfileField::all() {
            self.inputs[slot(field)] = profile.field_value(field);
        }
    }

    pub fn value(&self, field: ProfileField) -> &str {
        &self.inputs[slot(field)]
    }

    /// All fields with their typed values, in form order
    pub fn values(&self) -> Vec<(ProfileField, String)> {
        ProfileField::all()
            .into_iter()
            .map(|field| (field, self.value(field).to_string()))
            .collect()
    }

    fn focused_input(&mut self) -> &mut String {
        &mut self.inputs[slot(self.focus)]
    }
}

impl Component for ConnectionForm {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.focus = self.focus.next();
                None
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = self.focus.prev();
                None
            }
            KeyCode::Enter if !self.busy => Some(Action::Connect),
            KeyCode::Backspace if !self.busy => {
                self.focused_input().pop();
                None
            }
            KeyCode::Char(c) if !self.busy => {
                if self.focus != ProfileField::Port || c.is_ascii_digit() {
                    self.focused_input().push(c);
                }
                None
            }
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let mut lines = vec![
            Line::from(""),
            Line::from("Connection to the ClickHouse server:"),
            Line::from(""),
        ];

        for field in ProfileField::all() {
            let focused = field == self.focus;
            let raw = self.value(field);
            let shown = if field == ProfileField::Credential {
                "*".repeat(raw.chars().count())
            } else {
                raw.to_string()
            };
            let cursor = if focused && !self.busy { "_" } else { "" };

            let label_style = if focused {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            lines.push(Line::from(vec![
                Span::styled(if focused { "> " } else { "  " }, label_style),
                Span::styled(format!("{:<10}", field.label()), label_style),
                Span::styled(
                    format!("{}{}", shown, cursor),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
            ]));
        }

        lines.push(Line::from(""));
        if self.busy {
            lines.push(Line::from(Span::styled(
                "Connecting...",
                Style::default().fg(Color::Yellow),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Press Enter to connect",
                Style::default().fg(Color::Yellow),
            )));
        }

        let paragraph = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Connection ")
                .border_style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(paragraph, area);
        Ok(())
    }
}
