//! Column selection step: checklist over the column catalog

use crate::action::Action;
use crate::component::Component;
use crate::model::source::ColumnInfo;
use crate::model::wizard::Wizard;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

pub struct ColumnPicker {
    pub columns: Vec<ColumnInfo>,
    pub selected: Vec<String>,
    /// Table or file the catalog came from
    pub origin: Option<String>,
    pub selected_index: usize,
    pub list_state: ListState,
}

impl Default for ColumnPicker {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnPicker {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            selected: Vec::new(),
            origin: None,
            selected_index: 0,
            list_state: ListState::default(),
        }
    }

    pub fn sync(&mut self, wizard: &Wizard) {
        if self.columns != wizard.columns() {
            self.columns = wizard.columns().to_vec();
            self.selected_index = 0;
        }
        self.selected = wizard.selected_columns().to_vec();
        self.origin = wizard
            .source()
            .selected_table()
            .map(str::to_string)
            .or_else(|| wizard.source().file().map(|file| file.name.clone()));

        if self.columns.is_empty() {
            self.list_state.select(None);
        } else {
            self.selected_index = self.selected_index.min(self.columns.len() - 1);
            self.list_state.select(Some(self.selected_index));
        }
    }

    fn highlighted(&self) -> Option<&ColumnInfo> {
        self.columns.get(self.selected_index)
    }

    fn select_next(&mut self) {
        if self.selected_index < self.columns.len().saturating_sub(1) {
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
}

impl Component for ColumnPicker {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.select_next();
                None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.select_prev();
                None
            }
            KeyCode::Char(' ') | KeyCode::Enter => self
                .highlighted()
                .map(|column| Action::ToggleColumn(column.name.clone())),
            KeyCode::Char('a') if !self.columns.is_empty() => Some(Action::SelectAllColumns),
            KeyCode::Char('c') if !self.selected.is_empty() => Some(Action::ClearColumns),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let title = match &self.origin {
            Some(origin) => format!(
                " Columns of {} ({}/{}) ",
                origin,
                self.selected.len(),
                self.columns.len()
            ),
            None => " Columns ".to_string(),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_style(Style::default().fg(Color::Cyan))
            .border_style(Style::default().fg(Color::DarkGray));

        if self.columns.is_empty() {
            let message = Paragraph::new(Span::styled(
                "No columns available. Choose a table or file first",
                Style::default().fg(Color::Yellow),
            ))
            .block(block);
            frame.render_widget(message, area);
            return Ok(());
        }

        let name_width = self
            .columns
            .iter()
            .map(|c| c.name.chars().count())
            .max()
            .unwrap_or(0);

        let items: Vec<ListItem> = self
            .columns
            .iter()
            .map(|column| {
                let checked = self.selected.iter().any(|s| s == &column.name);
                ListItem::new(Line::from(vec![
                    Span::styled(
                        if checked { "[x] " } else { "[ ] " },
                        Style::default().fg(if checked { Color::Green } else { Color::DarkGray }),
                    ),
                    Span::raw(format!("{:<width$}  ", column.name, width = name_width)),
                    Span::styled(column.data_type.as_str(), Style::default().fg(Color::Magenta)),
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
        Ok(())
    }
}
