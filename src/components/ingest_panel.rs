//! Ingestion step: transfer summary, trigger and result

use crate::action::Action;
use crate::component::Component;
use crate::model::source::{FileFormat, SourceKind};
use crate::model::wizard::Wizard;
use anyhow::Result;
use chrono::{DateTime, Local};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use std::time::Duration;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub struct IngestPanel {
    pub kind: Option<SourceKind>,
    /// Table or file name the rows come from
    pub origin: Option<String>,
    pub column_count: usize,
    pub export_format: FileFormat,
    pub target_table: Option<String>,
    pub blocker: Option<&'static str>,
    /// Nothing in flight and nothing blocking
    pub ready: bool,
    pub busy: bool,
    pub elapsed: Option<Duration>,
    pub summary: Option<[String; 2]>,
    /// When the current result first showed up
    pub completed_at: Option<DateTime<Local>>,
    /// Last failure on this step
    pub error: Option<String>,
}

impl Default for IngestPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestPanel {
    pub fn new() -> Self {
        Self {
            kind: None,
            origin: None,
            column_count: 0,
            export_format: FileFormat::Csv,
            target_table: None,
            blocker: None,
            ready: false,
            busy: false,
            elapsed: None,
            summary: None,
            completed_at: None,
            error: None,
        }
    }

    pub fn sync(&mut self, wizard: &Wizard, elapsed: Option<Duration>) {
        let source = wizard.source();
        self.kind = source.kind();
        self.origin = source
            .selected_table()
            .map(str::to_string)
            .or_else(|| source.file().map(|file| file.name.clone()));
        self.column_count = wizard.selected_columns().len();
        self.export_format = wizard.options().export_format;
        self.target_table = wizard.options().target_table.clone();
        self.blocker = wizard.ingest_blocker();
        self.ready = wizard.can_ingest();
        self.busy = wizard.is_busy();
        self.elapsed = elapsed;
        let summary = wizard.result().map(|result| result.summary_lines());
        if summary.is_none() {
            self.completed_at = None;
        } else if self.summary.is_none() {
            self.completed_at = Some(Local::now());
        }
        self.summary = summary;
        self.error = wizard.status().error_message.clone();
    }

    fn destination_line(&self) -> Line<'static> {
        let label = Style::default().fg(Color::DarkGray);
        match self.kind {
            Some(SourceKind::RemoteTable) => Line::from(vec![
                Span::styled("Export as:    ", label),
                Span::styled(
                    self.export_format.as_str().to_uppercase(),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled("  (t to switch)", label),
            ]),
            Some(SourceKind::FlatFile) => Line::from(vec![
                Span::styled("Import into:  ", label),
                Span::styled(
                    self.target_table
                        .clone()
                        .unwrap_or_else(|| "(named by the server)".to_string()),
                    Style::default().fg(Color::Cyan),
                ),
                Span::styled("  (n to rename)", label),
            ]),
            None => Line::from(""),
        }
    }
}

impl Component for IngestPanel {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Enter if self.ready => Some(Action::StartIngest),
            KeyCode::Char('t') if !self.busy && self.kind == Some(SourceKind::RemoteTable) => {
                Some(Action::ToggleExportFormat)
            }
            KeyCode::Char('n') if !self.busy && self.kind == Some(SourceKind::FlatFile) => {
                Some(Action::OpenTargetTablePrompt)
            }
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let label = Style::default().fg(Color::DarkGray);
        let mut lines = vec![
            Line::from(""),
            Line::from(vec![
                Span::styled("Source:       ", label),
                Span::raw(self.kind.map(|k| k.label()).unwrap_or("-")),
            ]),
            Line::from(vec![
                Span::styled("From:         ", label),
                Span::styled(
                    self.origin.clone().unwrap_or_else(|| "-".to_string()),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ),
            ]),
            Line::from(vec![
                Span::styled("Columns:      ", label),
                Span::raw(self.column_count.to_string()),
            ]),
            self.destination_line(),
            Line::from(""),
        ];

        if self.busy {
            let secs = self.elapsed.map(|d| d.as_secs_f64()).unwrap_or(0.0);
            let frame_idx = (secs * 10.0) as usize % SPINNER.len();
            lines.push(Line::from(Span::styled(
                format!("{} Transferring... {:.1}s", SPINNER[frame_idx], secs),
                Style::default().fg(Color::Yellow),
            )));
        } else if let Some(summary) = &self.summary {
            let finished = self
                .completed_at
                .map(|at| format!("✓ Transfer complete at {}", at.format("%H:%M:%S")))
                .unwrap_or_else(|| "✓ Transfer complete".to_string());
            lines.push(Line::from(Span::styled(
                finished,
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )));
            for line in summary {
                lines.push(Line::from(format!("  {}", line)));
            }
        } else if let Some(blocker) = self.blocker {
            lines.push(Line::from(Span::styled(
                blocker,
                Style::default().fg(Color::Red),
            )));
        } else {
            if let Some(error) = &self.error {
                lines.push(Line::from(Span::styled(
                    format!("✗ {}", error),
                    Style::default().fg(Color::Red),
                )));
            }
            lines.push(Line::from(Span::styled(
                "Press Enter to start the transfer",
                Style::default().fg(Color::Yellow),
            )));
        }

        let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .title(" Ingestion ")
                .title_style(Style::default().fg(Color::Cyan))
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        frame.render_widget(paragraph, area);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(panel: &mut IngestPanel, code: KeyCode) -> Option<Action> {
        panel.handle_key_event(KeyEvent::from(code)).unwrap()
    }

    #[test]
    fn test_enter_only_when_ready() {
        let mut panel = IngestPanel::new();
        panel.sync(&Wizard::default(), None);
        assert!(panel.blocker.is_some());
        assert!(!panel.ready);
        assert_eq!(press(&mut panel, KeyCode::Enter), None);

        panel.ready = true;
        assert_eq!(press(&mut panel, KeyCode::Enter), Some(Action::StartIngest));
    }

    #[test]
    fn test_option_keys_follow_branch() {
        let mut panel = IngestPanel::new();
        panel.kind = Some(SourceKind::RemoteTable);
        assert_eq!(press(&mut panel, KeyCode::Char('t')), Some(Action::ToggleExportFormat));
        assert_eq!(press(&mut panel, KeyCode::Char('n')), None);

        panel.kind = Some(SourceKind::FlatFile);
        assert_eq!(press(&mut panel, KeyCode::Char('t')), None);
        assert_eq!(
            press(&mut panel, KeyCode::Char('n')),
            Some(Action::OpenTargetTablePrompt)
        );
    }
}
