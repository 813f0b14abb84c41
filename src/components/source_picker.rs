//! Source selection step
//!
//! Two-panel layout:
//! - Left panel: the source kinds
//! - Right panel: table list (remote) or the loaded file (flat file)

use crate::action::Action;
use crate::component::Component;
use crate::model::source::SourceKind;
use crate::model::wizard::Wizard;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

/// Loaded file shown in the right panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub name: String,
    pub path: String,
    pub format: String,
    pub bytes: usize,
    pub columns: usize,
}

pub struct SourcePicker {
    pub kind: Option<SourceKind>,
    pub tables: Vec<String>,
    pub selected_table: Option<String>,
    pub file: Option<FileSummary>,
    pub selected_index: usize,
    pub list_state: ListState,
    pub busy: bool,
}

impl Default for SourcePicker {
    fn default() -> Self {
        Self::new()
    }
}

impl SourcePicker {
    pub fn new() -> Self {
        Self {
            kind: None,
            tables: Vec::new(),
            selected_table: None,
            file: None,
            selected_index: 0,
            list_state: ListState::default(),
            busy: false,
        }
    }

    /// Refresh the cached view of the wizard's source
    pub fn sync(&mut self, wizard: &Wizard) {
        let source = wizard.source();
        if self.tables != source.tables() {
            self.tables = source.tables().to_vec();
            self.selected_index = 0;
        }
        self.kind = source.kind();
        self.selected_table = source.selected_table().map(str::to_string);
        self.file = source.file().map(|file| FileSummary {
            name: file.name.clone(),
            path: file.path.display().to_string(),
            format: file.format.as_str().to_string(),
            bytes: file.bytes.len(),
            columns: file.columns.len(),
        });
        self.busy = wizard.is_busy();

        if self.tables.is_empty() {
            self.list_state.select(None);
        } else {
            self.selected_index = self.selected_index.min(self.tables.len() - 1);
            self.list_state.select(Some(self.selected_index));
        }
    }

    pub fn highlighted_table(&self) -> Option<&str> {
        self.tables.get(self.selected_index).map(String::as_str)
    }

    fn select_next(&mut self) {
        if self.selected_index < self.tables.len().saturating_sub(1) {
            self.selected_index += 1;
            self.list_state.select(Some(self.selected_index));
        }
    }

    fn select_prev(&mut self) {
        if self.selected_index > 0 {
            self.selected_index -= 1;
            self.list_state.select(Some(self.selected_index));
        }
    }

    fn draw_kinds(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = [
            (SourceKind::RemoteTable, "r"),
            (SourceKind::FlatFile, "f"),
        ]
        .into_iter()
        .map(|(kind, key)| {
            let active = self.kind == Some(kind);
            Line::from(vec![
                Span::styled(format!("[{}] ", key), Style::default().fg(Color::DarkGray)),
                Span::styled(
                    if active { "● " } else { "  " },
                    Style::default().fg(Color::Green),
                ),
                Span::styled(
                    kind.label(),
                    if active {
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().fg(Color::Gray)
                    },
                ),
            ])
        })
        .collect();

        let panel = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Source ")
                .title_style(Style::default().fg(Color::Cyan))
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(panel, area);
    }

    fn draw_tables(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Tables ({}) ", self.tables.len()))
            .title_style(Style::default().fg(Color::Cyan))
            .border_style(Style::default().fg(Color::DarkGray));

        if self.tables.is_empty() {
            let text = if self.busy { "Loading tables..." } else { "No tables found" };
            let message = Paragraph::new(Span::styled(text, Style::default().fg(Color::DarkGray)))
                .block(block);
            frame.render_widget(message, area);
            return;
        }

        let items: Vec<ListItem> = self
            .tables
            .iter()
            .map(|table| {
                let chosen = self.selected_table.as_deref() == Some(table.as_str());
                ListItem::new(Line::from(vec![
                    Span::styled(
                        if chosen { "● " } else { "  " },
                        Style::default().fg(Color::Green),
                    ),
                    Span::raw(table.as_str()),
                ]))
            })
            .collect();

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("▶ ");

        frame.render_stateful_widget(list, area, &mut self.list_state);
    }

    fn draw_file(&self, frame: &mut Frame, area: Rect) {
        let label = Style::default().fg(Color::DarkGray);
        let lines = match &self.file {
            Some(file) => vec![
                Line::from(vec![
                    Span::styled("Name:    ", label),
                    Span::styled(file.name.as_str(), Style::default().fg(Color::White)),
                ]),
                Line::from(vec![
                    Span::styled("Path:    ", label),
                    Span::styled(file.path.as_str(), Style::default().fg(Color::DarkGray)),
                ]),
                Line::from(vec![
                    Span::styled("Format:  ", label),
                    Span::raw(file.format.as_str()),
                ]),
                Line::from(vec![
                    Span::styled("Size:    ", label),
                    Span::raw(format!("{} bytes", file.bytes)),
                ]),
                Line::from(vec![
                    Span::styled("Columns: ", label),
                    Span::raw(file.columns.to_string()),
                ]),
            ],
            None => vec![Line::from(Span::styled(
                "No file loaded. Press o to choose a .csv or .json file",
                Style::default().fg(Color::Yellow),
            ))],
        };

        let panel = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" File ")
                .title_style(Style::default().fg(Color::Cyan))
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(panel, area);
    }
}

impl Component for SourcePicker {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('r') => Some(Action::ChooseSource(SourceKind::RemoteTable)),
            KeyCode::Char('f') => Some(Action::ChooseSource(SourceKind::FlatFile)),
            KeyCode::Char('o') if self.kind == Some(SourceKind::FlatFile) => {
                Some(Action::OpenFilePrompt)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next();
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_prev();
                None
            }
            KeyCode::Enter if self.kind == Some(SourceKind::RemoteTable) => self
                .highlighted_table()
                .map(|table| Action::SelectTable(table.to_string())),
            KeyCode::Enter if self.kind == Some(SourceKind::FlatFile) => {
                Some(Action::OpenFilePrompt)
            }
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(28), // Left panel - source kinds
                Constraint::Min(30),    // Right panel - tables or file
            ])
            .split(area);

        self.draw_kinds(frame, chunks[0]);

        match self.kind {
            Some(SourceKind::RemoteTable) => self.draw_tables(frame, chunks[1]),
            Some(SourceKind::FlatFile) => self.draw_file(frame, chunks[1]),
            None => {
                let hint = Paragraph::new(Span::styled(
                    "Press r for a ClickHouse table or f for a flat file",
                    Style::default().fg(Color::Yellow),
                ))
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(Color::DarkGray)),
                );
                frame.render_widget(hint, chunks[1]);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(picker: &mut SourcePicker, code: KeyCode) -> Option<Action> {
        picker.handle_key_event(KeyEvent::from(code)).unwrap()
    }

    fn remote_picker(tables: &[&str]) -> SourcePicker {
        let mut picker = SourcePicker::new();
        picker.kind = Some(SourceKind::RemoteTable);
        picker.tables = tables.iter().map(|t| t.to_string()).collect();
        picker
    }

    #[test]
    fn test_kind_keys() {
        let mut picker = SourcePicker::new();
        assert_eq!(
            press(&mut picker, KeyCode::Char('r')),
            Some(Action::ChooseSource(SourceKind::RemoteTable))
        );
        assert_eq!(
            press(&mut picker, KeyCode::Char('f')),
            Some(Action::ChooseSource(SourceKind::FlatFile))
        );
        // No branch yet, nothing to open
        assert_eq!(press(&mut picker, KeyCode::Char('o')), None);
    }

    #[test]
    fn test_enter_selects_highlighted_table() {
        let mut picker = remote_picker(&["events", "users"]);
        press(&mut picker, KeyCode::Char('j'));
        press(&mut picker, KeyCode::Char('j'));
        assert_eq!(
            press(&mut picker, KeyCode::Enter),
            Some(Action::SelectTable("users".to_string()))
        );
        press(&mut picker, KeyCode::Char('k'));
        assert_eq!(picker.highlighted_table(), Some("events"));
    }

    #[test]
    fn test_enter_with_no_tables() {
        let mut picker = remote_picker(&[]);
        assert_eq!(press(&mut picker, KeyCode::Enter), None);
    }

    #[test]
    fn test_file_branch_opens_prompt() {
        let mut picker = SourcePicker::new();
        picker.kind = Some(SourceKind::FlatFile);
        assert_eq!(press(&mut picker, KeyCode::Char('o')), Some(Action::OpenFilePrompt));
        assert_eq!(press(&mut picker, KeyCode::Enter), Some(Action::OpenFilePrompt));
    }

    #[test]
    fn test_sync_resets_cursor_on_new_catalog() {
        let mut picker = remote_picker(&["a", "b", "c"]);
        picker.selected_index = 2;
        picker.sync(&Wizard::default());
        assert_eq!(picker.kind, None);
        assert!(picker.tables.is_empty());
        assert_eq!(picker.selected_index, 0);
        assert_eq!(picker.list_state.selected(), None);
    }
}
