use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use crate::{
    config::ConfigStore,
    operation::Operation,
    problem::RandomDraws,
    runtime::Countdown,
    session::SessionEngine,
    settings::{ConfigCollector, RangeField, Settings},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Configuring,
    Playing,
    Results,
}

/// Result of handling a key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Continue,
    Quit,
}

/// A row of the configuration form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormRow {
    Operation(Operation),
    Timer,
    Start,
}

impl FormRow {
    pub const COUNT: usize = Operation::ALL.len() + 2;

    pub fn at(index: usize) -> Self {
        match index {
            i if i < Operation::ALL.len() => FormRow::Operation(Operation::ALL[i]),
            i if i == Operation::ALL.len() => FormRow::Timer,
            _ => FormRow::Start,
        }
    }
}

/// Column within an operation row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Enabled,
    Min,
    Max,
}

impl FormField {
    fn next(self) -> Self {
        match self {
            FormField::Enabled => FormField::Min,
            FormField::Min => FormField::Max,
            FormField::Max => FormField::Max,
        }
    }

    fn prev(self) -> Self {
        match self {
            FormField::Enabled => FormField::Enabled,
            FormField::Min => FormField::Enabled,
            FormField::Max => FormField::Min,
        }
    }

    fn range_field(self) -> Option<RangeField> {
        match self {
            FormField::Enabled => None,
            FormField::Min => Some(RangeField::Min),
            FormField::Max => Some(RangeField::Max),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormCursor {
    pub row: usize,
    pub field: FormField,
}

impl Default for FormCursor {
    fn default() -> Self {
        Self {
            row: 0,
            field: FormField::Enabled,
        }
    }
}

impl FormCursor {
    pub fn row(&self) -> FormRow {
        FormRow::at(self.row)
    }
}

/// Top-level controller: configuration, play and results screens
#[derive(Debug)]
pub struct App {
    pub state: AppState,
    pub cursor: FormCursor,
    collector: ConfigCollector,
    store: Box<dyn ConfigStore>,
    settings: Option<Settings>,
    engine: Option<SessionEngine>,
    final_score: Option<u32>,
    notice: Option<&'static str>,
    range_edit: Option<String>,
    seed: Option<u64>,
    sessions_started: u64,
}

impl App {
    pub fn new(store: Box<dyn ConfigStore>, seed: Option<u64>) -> Self {
        let collector = ConfigCollector::new(store.load());
        Self {
            state: AppState::Configuring,
            cursor: FormCursor::default(),
            collector,
            store,
            settings: None,
            engine: None,
            final_score: None,
            notice: None,
            range_edit: None,
            seed,
            sessions_started: 0,
        }
    }

    pub fn collector(&self) -> &ConfigCollector {
        &self.collector
    }

    pub fn collector_mut(&mut self) -> &mut ConfigCollector {
        &mut self.collector
    }

    /// Settings captured by the last successful start
    pub fn settings(&self) -> Option<&Settings> {
        self.settings.as_ref()
    }

    pub fn engine(&self) -> Option<&SessionEngine> {
        self.engine.as_ref()
    }

    pub fn final_score(&self) -> Option<u32> {
        self.final_score
    }

    pub fn notice(&self) -> Option<&'static str> {
        self.notice
    }

    /// Text being typed into the focused range field, if any
    pub fn range_edit(&self) -> Option<&str> {
        self.range_edit.as_deref()
    }

    /// Validate the form and begin a session
    pub fn start(&mut self) {
        match self.collector.validate_and_start() {
            Ok(settings) => {
                self.notice = None;
                self.range_edit = None;
                if let Err(err) = self.store.save(&settings) {
                    warn!(%err, "could not save settings");
                }
                self.settings = Some(settings);
                self.begin_session();
            }
            Err(err) => {
                warn!(%err, "refusing to start");
                self.notice = Some(err.notice());
            }
        }
    }

    /// New session with the captured settings
    pub fn restart(&mut self) {
        if self.settings.is_some() {
            self.begin_session();
        }
    }

    /// Discard the captured settings and go back to the form
    pub fn return_to_configuration(&mut self) {
        self.engine = None;
        self.settings = None;
        self.final_score = None;
        self.notice = None;
        self.range_edit = None;
        self.collector = ConfigCollector::new(self.store.load());
        self.cursor = FormCursor::default();
        self.state = AppState::Configuring;
    }

    fn begin_session(&mut self) {
        let Some(settings) = self.settings.clone() else {
            return;
        };

        let draws = match self.seed {
            Some(seed) => RandomDraws::seeded(seed.wrapping_add(self.sessions_started)),
            None => RandomDraws::from_entropy(),
        };
        self.sessions_started += 1;

        self.engine = Some(SessionEngine::start(settings, draws, Countdown::new()));
        self.final_score = None;
        self.state = AppState::Playing;
    }

    /// Fire the countdown when it is due
    pub fn on_tick(&mut self, now: Instant) {
        if let Some(engine) = self.engine.as_mut() {
            if engine.scheduler().is_due(now) {
                engine.tick();
            }
        }
        self.collect_finished();
    }

    /// End the running session early
    pub fn end_game(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.end_now();
        }
        self.collect_finished();
    }

    fn collect_finished(&mut self) {
        if self.state != AppState::Playing {
            return;
        }
        let Some(score) = self.engine.as_ref().and_then(|e| e.final_score()) else {
            return;
        };

        info!(score, "final score");
        self.final_score = Some(score);
        self.engine = None;
        self.state = AppState::Results;
    }

    pub fn on_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return KeyOutcome::Quit;
        }

        match self.state {
            AppState::Configuring => self.on_form_key(key),
            AppState::Playing => {
                self.on_play_key(key);
                KeyOutcome::Continue
            }
            AppState::Results => match key.code {
                KeyCode::Char('r') => {
                    self.restart();
                    KeyOutcome::Continue
                }
                KeyCode::Char('c') => {
                    self.return_to_configuration();
                    KeyOutcome::Continue
                }
                KeyCode::Char('q') | KeyCode::Esc => KeyOutcome::Quit,
                _ => KeyOutcome::Continue,
            },
        }
    }

    fn on_play_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.end_game(),
            KeyCode::Char(c) if c.is_ascii_digit() || c == '-' => {
                if let Some(engine) = self.engine.as_mut() {
                    let mut text = engine.current_input().to_string();
                    text.push(c);
                    engine.submit_input(&text);
                }
            }
            KeyCode::Backspace => {
                if let Some(engine) = self.engine.as_mut() {
                    let mut text = engine.current_input().to_string();
                    text.pop();
                    engine.submit_input(&text);
                }
            }
            _ => {}
        }
    }

    fn on_form_key(&mut self, key: KeyEvent) -> KeyOutcome {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return KeyOutcome::Quit,
            KeyCode::Enter => self.start(),
            KeyCode::Up => self.move_row(-1),
            KeyCode::Down => self.move_row(1),
            KeyCode::Left => match self.cursor.row() {
                FormRow::Timer => self.collector.step_timer(-1),
                _ => self.move_field(FormField::prev),
            },
            KeyCode::Right => match self.cursor.row() {
                FormRow::Timer => self.collector.step_timer(1),
                _ => self.move_field(FormField::next),
            },
            KeyCode::Tab => self.move_field(FormField::next),
            KeyCode::BackTab => self.move_field(FormField::prev),
            KeyCode::Char(' ') => match self.cursor.row() {
                FormRow::Operation(op) => self.collector.toggle_enabled(op),
                FormRow::Timer => self.collector.step_timer(1),
                FormRow::Start => self.start(),
            },
            KeyCode::Char(c) if c.is_ascii_digit() => self.edit_range(|text| text.push(c)),
            KeyCode::Backspace => self.edit_range(|text| {
                text.pop();
            }),
            _ => {}
        }
        KeyOutcome::Continue
    }

    fn move_row(&mut self, delta: isize) {
        let row = self.cursor.row as isize + delta;
        self.cursor.row = row.clamp(0, FormRow::COUNT as isize - 1) as usize;
        self.range_edit = None;
    }

    fn move_field(&mut self, step: fn(FormField) -> FormField) {
        if let FormRow::Operation(_) = self.cursor.row() {
            self.cursor.field = step(self.cursor.field);
            self.range_edit = None;
        }
    }

    /// Apply a keystroke to the focused range field. The first digit replaces
    /// the shown value; backspace edits it.
    fn edit_range<F: FnOnce(&mut String)>(&mut self, edit: F) {
        let FormRow::Operation(op) = self.cursor.row() else {
            return;
        };
        let Some(field) = self.cursor.field.range_field() else {
            return;
        };

        let (mut text, fresh) = match self.range_edit.take() {
            Some(text) => (text, false),
            None => {
                let config = self.collector.settings().operation(op);
                let current = match field {
                    RangeField::Min => config.min,
                    RangeField::Max => config.max,
                };
                (current.to_string(), true)
            }
        };
        let shown_len = text.len();
        edit(&mut text);
        if fresh && text.len() > shown_len {
            // typing over the displayed value starts a new number
            text.drain(..shown_len);
        }

        self.collector.set_range(op, field, &text);
        self.range_edit = Some(text);
    }
}
