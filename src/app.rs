//! Root application component
//!
//! The App struct implements the Component trait, acting as the root component
//! that delegates event handling and rendering to child components.
//! App is intentionally lean: the wizard owns the workflow state and the
//! runner owns the network. App turns actions into wizard calls, hands the
//! resulting requests to the runner and feeds settlements back on every tick.

use crate::action::Action;
use crate::component::Component;
use crate::components::{
    calculate_wizard_layout, render_help_bar, render_status_bar, render_stepper, ColumnPicker,
    ConnectionForm, HelpDialog, IngestPanel, PromptDialog, QuitDialog, SourcePicker,
    WizardRenderContext,
};
use crate::config::Config;
use crate::model::modal::{Modal, ModalStack, PromptPurpose};
use crate::model::status::{Notification, NotificationLevel};
use crate::model::wizard::{TransferOptions, Wizard, WizardError, WizardStep};
use crate::services::api::{IngestApi, ServiceReply, ServiceRequest};
use crate::services::{flat_file, HttpIngestApi, Settlement, TransferRunner};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{layout::Rect, Frame};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How long a notification stays in the status bar
const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

// ═══════════════════════════════════════════════════════════════════════════════
// App Struct
// ═══════════════════════════════════════════════════════════════════════════════

/// Main application state - coordinates between components
pub struct App {
    /// Workflow state machine
    pub wizard: Wizard,

    /// Background request runner
    pub runner: TransferRunner,

    /// Modal overlay stack
    pub modals: ModalStack,

    pub config: Config,

    /// Where `config` is written back; `None` disables persistence
    config_path: Option<PathBuf>,

    /// Service URL shown in the status bar
    api_url: String,

    /// Transient status bar message and when it was raised
    pub notification: Option<Notification>,
    notification_at: Option<Instant>,

    /// Flag to indicate the app should quit
    pub should_quit: bool,

    // ─────────────────────────────────────────────────────────────────────────
    // Child Components
    // ─────────────────────────────────────────────────────────────────────────
    pub connection_form: ConnectionForm,
    pub source_picker: SourcePicker,
    pub column_picker: ColumnPicker,
    pub ingest_panel: IngestPanel,
    pub prompt_dialog: PromptDialog,
    pub quit_dialog: QuitDialog,
    pub help_dialog: HelpDialog,
}

impl App {
    /// Create the app against the HTTP service named by the config
    pub fn new(config: Config) -> Result<App> {
        let api = HttpIngestApi::new(&config.resolved_api_url())?;
        let api_url = api.base_url().to_string();
        let mut app = Self::with_api(config, Arc::new(api), Config::config_path())?;
        app.api_url = api_url;
        Ok(app)
    }

    /// Create the app against any service implementation
    pub fn with_api(
        config: Config,
        api: Arc<dyn IngestApi>,
        config_path: Option<PathBuf>,
    ) -> Result<App> {
        let options = TransferOptions {
            export_format: config.export_format,
            target_table: None,
        };
        let wizard = Wizard::new(config.connection.clone(), options);
        let connection_form = ConnectionForm::new(wizard.profile());

        Ok(App {
            api_url: config.api_url.clone(),
            wizard,
            runner: TransferRunner::new(api)?,
            modals: ModalStack::new(),
            config,
            config_path,
            notification: None,
            notification_at: None,
            should_quit: false,
            connection_form,
            source_picker: SourcePicker::new(),
            column_picker: ColumnPicker::new(),
            ingest_panel: IngestPanel::new(),
            prompt_dialog: PromptDialog::default(),
            quit_dialog: QuitDialog::default(),
            help_dialog: HelpDialog::default(),
        })
    }

    fn notify(&mut self, notification: Notification) {
        self.notification = Some(notification);
        self.notification_at = Some(Instant::now());
    }

    /// Surface a locally rejected action
    fn report(&mut self, err: WizardError) {
        warn!(error = %err, "action rejected");
        self.notify(Notification::error(err.to_string()));
    }

    fn run_request(&mut self, request: Result<ServiceRequest, WizardError>) {
        match request {
            Ok(request) => self.runner.spawn(request),
            Err(err) => self.report(err),
        }
    }

    fn settle(&mut self, settlement: Settlement) {
        let Settlement { ticket, outcome } = settlement;
        let connected = matches!(outcome, Ok(ServiceReply::Connected));

        if let Some(notification) = self.wizard.settle(ticket, outcome) {
            if connected && notification.level == NotificationLevel::Success {
                self.config.connection = self.wizard.profile().clone();
                self.persist_config();
            }
            self.notify(notification);
        }
    }

    fn persist_config(&self) {
        let Some(path) = &self.config_path else {
            return;
        };
        if let Err(e) = self.config.save_to(path) {
            warn!(error = %e, path = %path.display(), "failed to save config");
        }
    }

    fn expire_notification(&mut self) {
        if let Some(at) = self.notification_at {
            if at.elapsed() >= NOTIFICATION_TTL {
                self.notification = None;
                self.notification_at = None;
            }
        }
    }

    /// Push the wizard's state into the step components
    fn sync_components(&mut self) {
        let busy = self.wizard.is_busy();
        self.connection_form.busy = busy;
        self.source_picker.sync(&self.wizard);
        self.column_picker.sync(&self.wizard);
        self.ingest_panel.sync(&self.wizard, self.runner.elapsed());
    }

    fn load_file(&mut self, path: &str) {
        let path = flat_file::expand_path(path);
        match flat_file::load(&path) {
            Ok(file) => {
                self.modals.pop();
                if let Err(err) = self.wizard.select_file(file) {
                    self.report(err);
                }
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "failed to load file");
                self.notify(Notification::error(format!("{:#}", e)));
            }
        }
    }
}

impl Component for App {
    fn init(&mut self) -> Result<()> {
        info!(api_url = %self.api_url, "wizard started");
        self.sync_components();
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::ForceQuit));
        }

        if let Some(modal) = self.modals.top().cloned() {
            return self.handle_modal_key_event(&modal, key);
        }

        if let Some(action) = self.global_action(key) {
            return Ok(Some(action));
        }

        match self.wizard.step() {
            WizardStep::Connection => self.connection_form.handle_key_event(key),
            WizardStep::SourceSelection => self.source_picker.handle_key_event(key),
            WizardStep::ColumnSelection => self.column_picker.handle_key_event(key),
            WizardStep::Ingestion => self.ingest_panel.handle_key_event(key),
        }
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        if action != Action::Tick {
            debug!(%action, step = self.wizard.step().title(), "action");
        }

        match action {
            // ─────────────────────────────────────────────────────────────────
            // App Lifecycle
            // ─────────────────────────────────────────────────────────────────
            Action::Tick => {
                for settlement in self.runner.poll() {
                    self.settle(settlement);
                }
                self.expire_notification();
            }
            Action::ForceQuit => {
                self.runner.cancel();
                self.should_quit = true;
            }
            Action::Resize(_, _) => {}

            // ─────────────────────────────────────────────────────────────────
            // Wizard Navigation
            // ─────────────────────────────────────────────────────────────────
            Action::NextStep => {
                self.wizard.next();
            }
            Action::PrevStep => {
                self.wizard.back();
            }
            Action::ResetWizard => {
                self.runner.cancel();
                self.wizard.reset();
                self.connection_form.load(self.wizard.profile());
                self.modals.clear();
                self.notification = None;
                self.notification_at = None;
            }

            // ─────────────────────────────────────────────────────────────────
            // Modals
            // ─────────────────────────────────────────────────────────────────
            Action::OpenQuitDialog => {
                self.quit_dialog.transfer_running = self.runner.is_running();
                self.modals.push(Modal::QuitConfirm);
            }
            Action::OpenHelp => {
                self.help_dialog.scroll_offset = 0;
                self.modals.push(Modal::Help);
            }
            Action::OpenFilePrompt => {
                self.prompt_dialog.open(PromptPurpose::FilePath, "");
                self.modals.push(Modal::Prompt {
                    purpose: PromptPurpose::FilePath,
                });
            }
            Action::OpenTargetTablePrompt => {
                let current = self.wizard.options().target_table.clone().unwrap_or_default();
                self.prompt_dialog.open(PromptPurpose::TargetTable, &current);
                self.modals.push(Modal::Prompt {
                    purpose: PromptPurpose::TargetTable,
                });
            }
            Action::CloseModal => {
                self.modals.pop();
            }

            // ─────────────────────────────────────────────────────────────────
            // Step Actions
            // ─────────────────────────────────────────────────────────────────
            Action::Connect => {
                for (field, value) in self.connection_form.values() {
                    if let Err(err) = self.wizard.set_profile_field(field, &value) {
                        self.report(err);
                        self.sync_components();
                        return Ok(None);
                    }
                }
                let request = self.wizard.begin_connect();
                self.run_request(request);
            }
            Action::ChooseSource(kind) => match self.wizard.choose_source(kind) {
                Ok(Some(request)) => self.runner.spawn(request),
                Ok(None) => {}
                Err(err) => self.report(err),
            },
            Action::SelectTable(table) => {
                let request = self.wizard.select_table(&table);
                self.run_request(request);
            }
            Action::LoadFile(path) => self.load_file(&path),
            Action::ToggleColumn(name) => {
                if let Err(err) = self.wizard.toggle_column(&name) {
                    self.report(err);
                }
            }
            Action::SelectAllColumns => self.wizard.select_all_columns(),
            Action::ClearColumns => self.wizard.clear_column_selection(),
            Action::ToggleExportFormat => {
                self.wizard.toggle_export_format();
                self.config.export_format = self.wizard.options().export_format;
                self.persist_config();
            }
            Action::SetTargetTable(name) => match self.wizard.set_target_table(&name) {
                Ok(()) => {
                    self.modals.pop();
                }
                Err(err) => self.report(err),
            },
            Action::StartIngest => {
                let request = self.wizard.begin_ingest();
                self.run_request(request);
            }
        }

        self.sync_components();
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let layout = calculate_wizard_layout(area);
        let step = self.wizard.step();

        render_stepper(frame, layout.stepper, step);
        match step {
            WizardStep::Connection => self.connection_form.draw(frame, layout.body)?,
            WizardStep::SourceSelection => self.source_picker.draw(frame, layout.body)?,
            WizardStep::ColumnSelection => self.column_picker.draw(frame, layout.body)?,
            WizardStep::Ingestion => self.ingest_panel.draw(frame, layout.body)?,
        }

        let ctx = WizardRenderContext {
            step,
            status: self.wizard.status(),
            notification: self.notification.as_ref(),
            api_url: &self.api_url,
            host: &self.wizard.profile().host,
        };
        render_status_bar(frame, layout.status, &ctx);
        render_help_bar(frame, layout.help, step);

        // Draw modal overlay if active
        if let Some(modal) = self.modals.top().cloned() {
            self.draw_modal(frame, area, &modal)?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helper Methods
// ═══════════════════════════════════════════════════════════════════════════════

impl App {
    /// Keys that work on every step
    ///
    /// Plain letters are left to the connection form so they can be typed.
    fn global_action(&self, key: KeyEvent) -> Option<Action> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let typing = self.wizard.step() == WizardStep::Connection;

        match key.code {
            KeyCode::Char('r') if ctrl => Some(Action::ResetWizard),
            KeyCode::Char('n') if ctrl => Some(Action::NextStep),
            KeyCode::Char('b') if ctrl => Some(Action::PrevStep),
            KeyCode::PageDown => Some(Action::NextStep),
            KeyCode::PageUp | KeyCode::Esc => Some(Action::PrevStep),
            KeyCode::F(1) => Some(Action::OpenHelp),
            KeyCode::Char('q') if !ctrl && !typing => Some(Action::OpenQuitDialog),
            KeyCode::Char('?') if !ctrl && !typing => Some(Action::OpenHelp),
            _ => None,
        }
    }

    fn handle_modal_key_event(&mut self, modal: &Modal, key: KeyEvent) -> Result<Option<Action>> {
        match modal {
            Modal::QuitConfirm => self.quit_dialog.handle_key_event(key),
            Modal::Help => self.help_dialog.handle_key_event(key),
            Modal::Prompt { .. } => self.prompt_dialog.handle_key_event(key),
        }
    }

    fn draw_modal(&mut self, frame: &mut Frame, area: Rect, modal: &Modal) -> Result<()> {
        match modal {
            Modal::QuitConfirm => self.quit_dialog.draw(frame, area)?,
            Modal::Help => self.help_dialog.draw(frame, area)?,
            Modal::Prompt { .. } => self.prompt_dialog.draw(frame, area)?,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::connection::ConnectionProfile;
    use crate::model::source::{ColumnInfo, FileFormat, SourceKind};
    use crate::model::status::Destination;
    use crate::services::api::{ExportRequest, ImportRequest, ServiceError};
    use async_trait::async_trait;
    use ratatui::{backend::TestBackend, Terminal};
    use std::fs;
    use std::thread;

    /// In-memory service with two tables
    struct FakeApi {
        reject_connect: bool,
    }

    #[async_trait]
    impl IngestApi for FakeApi {
        async fn connect(&self, _connection: &ConnectionProfile) -> Result<(), ServiceError> {
            if self.reject_connect {
                return Err(ServiceError::Server {
                    status: 401,
                    detail: Some("Authentication failed".to_string()),
                });
            }
            Ok(())
        }

        async fn list_tables(
            &self,
            _connection: &ConnectionProfile,
        ) -> Result<Vec<String>, ServiceError> {
            Ok(vec!["events".to_string(), "users".to_string()])
        }

        async fn list_columns(
            &self,
            _connection: &ConnectionProfile,
            table: &str,
        ) -> Result<Vec<ColumnInfo>, ServiceError> {
            match table {
                "users" => Ok(vec![
                    ColumnInfo::new("id", "UInt64"),
                    ColumnInfo::new("email", "String"),
                ]),
                _ => Err(ServiceError::Transport("connection reset".to_string())),
            }
        }

        async fn export_table(&self, request: &ExportRequest) -> Result<(u64, String), ServiceError> {
            Ok((42, format!("{}.{}", request.table, request.format.as_str())))
        }

        async fn import_file(&self, request: &ImportRequest) -> Result<(u64, String), ServiceError> {
            let table = request.table.clone().unwrap_or_else(|| "imported_1".to_string());
            Ok((2, table))
        }
    }

    fn app_with(reject_connect: bool) -> App {
        let mut config = Config::default();
        config.connection.credential = "token".to_string();
        let mut app =
            App::with_api(config, Arc::new(FakeApi { reject_connect }), None).unwrap();
        app.init().unwrap();
        app
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::from(code)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Route a key through the app like the main loop does
    fn press(app: &mut App, event: KeyEvent) {
        let mut action = app.handle_key_event(event).unwrap();
        while let Some(a) = action {
            action = app.update(a).unwrap();
        }
    }

    /// Tick until the in-flight request settles
    fn settle(app: &mut App) {
        for _ in 0..300 {
            app.update(Action::Tick).unwrap();
            if !app.wizard.is_busy() {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("request did not settle");
    }

    fn connected_app() -> App {
        let mut app = app_with(false);
        press(&mut app, key(KeyCode::Enter));
        settle(&mut app);
        app
    }

    #[test]
    fn test_connect_advances_and_notifies() {
        let app = connected_app();
        assert_eq!(app.wizard.step(), WizardStep::SourceSelection);
        assert_eq!(
            app.notification,
            Some(Notification::success("Connected successfully!"))
        );
    }

    #[test]
    fn test_connect_failure_shows_server_detail() {
        let mut app = app_with(true);
        press(&mut app, key(KeyCode::Enter));
        settle(&mut app);
        assert_eq!(app.wizard.step(), WizardStep::Connection);
        assert_eq!(
            app.notification,
            Some(Notification::error("Authentication failed"))
        );
    }

    #[test]
    fn test_invalid_port_is_reported_without_request() {
        let mut app = app_with(false);
        press(&mut app, key(KeyCode::Tab));
        for _ in 0..4 {
            press(&mut app, key(KeyCode::Backspace));
        }
        press(&mut app, key(KeyCode::Enter));
        assert!(!app.wizard.is_busy());
        assert!(!app.runner.is_running());
        assert_eq!(
            app.notification.as_ref().map(|n| n.level),
            Some(NotificationLevel::Error)
        );
    }

    #[test]
    fn test_remote_table_export_flow() {
        let mut app = connected_app();

        press(&mut app, key(KeyCode::Char('r')));
        settle(&mut app);
        assert_eq!(app.source_picker.tables, vec!["events", "users"]);

        press(&mut app, key(KeyCode::Char('j')));
        press(&mut app, key(KeyCode::Enter));
        settle(&mut app);
        assert_eq!(app.wizard.step(), WizardStep::ColumnSelection);
        assert_eq!(app.column_picker.columns.len(), 2);

        press(&mut app, key(KeyCode::Char('a')));
        press(&mut app, key(KeyCode::PageDown));
        assert_eq!(app.wizard.step(), WizardStep::Ingestion);

        press(&mut app, key(KeyCode::Char('t')));
        assert_eq!(app.wizard.options().export_format, FileFormat::Json);

        press(&mut app, key(KeyCode::Enter));
        settle(&mut app);
        let result = app.wizard.result().unwrap();
        assert_eq!(result.record_count, 42);
        assert_eq!(result.destination, Destination::File("users.json".to_string()));
        assert!(app.ingest_panel.completed_at.is_some());
        assert_eq!(
            app.notification,
            Some(Notification::success("Successfully processed 42 records"))
        );
    }

    #[test]
    fn test_failed_column_listing_stays_on_source_step() {
        let mut app = connected_app();
        press(&mut app, key(KeyCode::Char('r')));
        settle(&mut app);

        // "events" is highlighted first and the fake fails it
        press(&mut app, key(KeyCode::Enter));
        settle(&mut app);
        assert_eq!(app.wizard.step(), WizardStep::SourceSelection);
        assert_eq!(
            app.notification,
            Some(Notification::error("Failed to fetch columns"))
        );
    }

    #[test]
    fn test_flat_file_import_flow() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("people.csv");
        fs::write(&path, "name,age\nada,36\nalan,41\n").unwrap();

        let mut app = connected_app();
        press(&mut app, key(KeyCode::Char('f')));
        assert_eq!(app.wizard.source_kind(), Some(SourceKind::FlatFile));

        press(&mut app, key(KeyCode::Char('o')));
        assert_eq!(
            app.modals.top(),
            Some(&Modal::Prompt {
                purpose: PromptPurpose::FilePath
            })
        );
        app.update(Action::LoadFile(path.display().to_string())).unwrap();
        assert!(app.modals.is_empty());
        assert_eq!(app.wizard.step(), WizardStep::ColumnSelection);

        press(&mut app, key(KeyCode::Char(' ')));
        press(&mut app, key(KeyCode::PageDown));
        press(&mut app, key(KeyCode::Char('n')));
        app.update(Action::SetTargetTable("people".to_string())).unwrap();
        assert!(app.modals.is_empty());

        press(&mut app, key(KeyCode::Enter));
        settle(&mut app);
        assert_eq!(
            app.wizard.result().map(|r| r.destination.clone()),
            Some(Destination::Table("people".to_string()))
        );
    }

    #[test]
    fn test_bad_file_keeps_prompt_open() {
        let mut app = connected_app();
        press(&mut app, key(KeyCode::Char('f')));
        press(&mut app, key(KeyCode::Char('o')));
        app.update(Action::LoadFile("/definitely/missing.csv".to_string()))
            .unwrap();
        assert!(!app.modals.is_empty());
        assert_eq!(app.wizard.step(), WizardStep::SourceSelection);
        assert_eq!(
            app.notification.as_ref().map(|n| n.level),
            Some(NotificationLevel::Error)
        );
    }

    #[test]
    fn test_letters_are_typed_on_connection_step() {
        let mut app = app_with(false);
        press(&mut app, key(KeyCode::Char('q')));
        assert!(app.modals.is_empty());
        assert_eq!(app.connection_form.value(crate::model::ProfileField::Host), "localhostq");

        press(&mut app, ctrl('c'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_quit_dialog_outside_connection_step() {
        let mut app = connected_app();
        press(&mut app, key(KeyCode::Char('q')));
        assert_eq!(app.modals.top(), Some(&Modal::QuitConfirm));
        press(&mut app, key(KeyCode::Esc));
        assert!(app.modals.is_empty());
        assert!(!app.should_quit);
    }

    #[test]
    fn test_reset_returns_to_defaults() {
        let mut app = connected_app();
        press(&mut app, key(KeyCode::Char('r')));
        press(&mut app, ctrl('r'));
        assert_eq!(app.wizard.step(), WizardStep::Connection);
        assert!(!app.wizard.is_busy());
        assert!(!app.runner.is_running());
        assert!(app.notification.is_none());
        assert_eq!(app.wizard.source_kind(), None);
    }

    #[test]
    fn test_successful_connect_saves_profile_without_credential() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut config = Config::default();
        config.connection.credential = "token".to_string();
        let mut app = App::with_api(
            config,
            Arc::new(FakeApi {
                reject_connect: false,
            }),
            Some(path.clone()),
        )
        .unwrap();

        press(&mut app, key(KeyCode::Enter));
        settle(&mut app);

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.connection.host, "localhost");
        assert!(saved.connection.credential.is_empty());
    }

    #[test]
    fn test_draw_every_step() {
        let mut app = connected_app();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();

        for _ in 0..4 {
            terminal
                .draw(|frame| app.draw(frame, frame.area()).unwrap())
                .unwrap();
            press(&mut app, key(KeyCode::PageDown));
        }

        press(&mut app, key(KeyCode::Char('?')));
        terminal
            .draw(|frame| app.draw(frame, frame.area()).unwrap())
            .unwrap();
    }
}
