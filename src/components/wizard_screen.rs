//! Wizard chrome: step indicator, status bar and help bar
//!
//! The step body itself is drawn by whichever step component is active.

use crate::model::status::{Notification, NotificationLevel, OperationPhase, OperationStatus};
use crate::model::wizard::WizardStep;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

/// Everything the chrome needs from the app
pub struct WizardRenderContext<'a> {
    pub step: WizardStep,
    pub status: &'a OperationStatus,
    pub notification: Option<&'a Notification>,
    pub api_url: &'a str,
    pub host: &'a str,
}

pub fn render_stepper(frame: &mut Frame, area: Rect, step: WizardStep) {
    let titles: Vec<String> = WizardStep::all()
        .iter()
        .map(|s| {
            let marker = if *s < step { "✓" } else { " " };
            format!("{}{}. {}", marker, s.index() + 1, s.title())
        })
        .collect();

    let tabs = Tabs::new(titles)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" chfile-tui ")
                .title_style(
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                )
                .border_style(Style::default().fg(Color::DarkGray)),
        )
        .select(step.index())
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

/// Status line text and colour; notifications win over the operation phase
pub fn status_line(ctx: &WizardRenderContext) -> (String, Color) {
    if let Some(notification) = ctx.notification {
        let color = match notification.level {
            NotificationLevel::Success => Color::Green,
            NotificationLevel::Error => Color::Red,
        };
        return (notification.message.clone(), color);
    }

    if ctx.status.is_pending() {
        return ("Working...".to_string(), Color::Yellow);
    }

    match ctx.status.phase {
        OperationPhase::Failed => (
            ctx.status
                .error_message
                .clone()
                .unwrap_or_else(|| "Operation failed".to_string()),
            Color::Red,
        ),
        _ => (String::new(), Color::White),
    }
}

pub fn render_status_bar(frame: &mut Frame, area: Rect, ctx: &WizardRenderContext) {
    let mut spans = vec![
        Span::styled(
            format!(" {} ", ctx.api_url),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
    ];

    if ctx.step > WizardStep::Connection {
        spans.push(Span::styled(
            format!(" {} ", ctx.host),
            Style::default()
                .fg(Color::Black)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(" "));
    }

    let (message, color) = status_line(ctx);
    if !message.is_empty() {
        spans.push(Span::styled(message, Style::default().fg(color)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn key_span(key: &str, color: Color) -> Span<'static> {
    Span::styled(
        format!(" {} ", key),
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )
}

pub fn render_help_bar(frame: &mut Frame, area: Rect, step: WizardStep) {
    let mut spans = match step {
        WizardStep::Connection => vec![
            key_span("Tab", Color::Cyan),
            Span::raw("Field "),
            key_span("Enter", Color::Green),
            Span::raw("Connect "),
        ],
        WizardStep::SourceSelection => vec![
            key_span("r/f", Color::Cyan),
            Span::raw("Source "),
            key_span("j/k", Color::Cyan),
            Span::raw("Navigate "),
            key_span("Enter", Color::Green),
            Span::raw("Select "),
            key_span("o", Color::Cyan),
            Span::raw("Open file "),
        ],
        WizardStep::ColumnSelection => vec![
            key_span("Space", Color::Green),
            Span::raw("Toggle "),
            key_span("a", Color::Cyan),
            Span::raw("All "),
            key_span("c", Color::Cyan),
            Span::raw("Clear "),
        ],
        WizardStep::Ingestion => vec![
            key_span("Enter", Color::Green),
            Span::raw("Start "),
            key_span("t", Color::Cyan),
            Span::raw("Format "),
            key_span("n", Color::Cyan),
            Span::raw("Table "),
        ],
    };

    spans.extend([
        key_span("PgUp/PgDn", Color::Cyan),
        Span::raw("Back/Next "),
        key_span("^R", Color::Yellow),
        Span::raw("Reset "),
        key_span("?", Color::Cyan),
        Span::raw("Help "),
        key_span("^C", Color::Yellow),
        Span::raw("Quit"),
    ]);

    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(paragraph, area);
}
