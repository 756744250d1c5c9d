use tracing::{debug, info};

use crate::{
    observer::Observers,
    problem::{self, Draws, Problem, RandomDraws},
    runtime::{Countdown, Scheduler, COUNTDOWN_STEP},
    settings::Settings,
    util,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Over,
}

/// Why a session stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    TimeUp,
    EndedEarly,
}

/// Mutable play state for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub current_problem: Problem,
    pub current_input: String,
    pub score: u32,
    pub remaining_seconds: u32,
}

/// Notifications emitted by [`SessionEngine`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    ProblemChanged(Problem),
    InputChanged(String),
    ScoreChanged(u32),
    Ticked { remaining_seconds: u32 },
    Finished { score: u32, reason: EndReason },
}

/// Drives one play session: countdown, answer checking and scoring.
///
/// `Over` is absorbing. Once the session has finished every mutating call is a
/// no-op and the final score has been emitted exactly once.
#[derive(Debug)]
pub struct SessionEngine<D: Draws = RandomDraws, S: Scheduler = Countdown> {
    settings: Settings,
    state: SessionState,
    status: SessionStatus,
    draws: D,
    scheduler: S,
    observers: Observers<SessionEvent>,
}

impl<D: Draws, S: Scheduler> SessionEngine<D, S> {
    pub fn start(settings: Settings, mut draws: D, mut scheduler: S) -> Self {
        let current_problem = problem::generate(&settings, &mut draws);
        let remaining_seconds = settings.timer().seconds();
        scheduler.schedule(COUNTDOWN_STEP);

        info!(
            remaining_seconds,
            operations = ?settings.enabled_operations(),
            "session started"
        );

        Self {
            settings,
            state: SessionState {
                current_problem,
                current_input: String::new(),
                score: 0,
                remaining_seconds,
            },
            status: SessionStatus::Active,
            draws,
            scheduler,
            observers: Observers::new(),
        }
    }

    pub fn subscribe<F>(&mut self, callback: F)
    where
        F: FnMut(&SessionEvent) + 'static,
    {
        self.observers.subscribe(callback);
    }

    /// Advance the countdown by one second
    pub fn tick(&mut self) {
        if self.is_over() {
            return;
        }

        self.state.remaining_seconds = self.state.remaining_seconds.saturating_sub(1);
        let remaining_seconds = self.state.remaining_seconds;
        self.observers
            .notify(&SessionEvent::Ticked { remaining_seconds });

        if remaining_seconds == 0 {
            self.finish(EndReason::TimeUp);
        } else {
            self.scheduler.schedule(COUNTDOWN_STEP);
        }
    }

    /// Record the raw answer text and score it if it matches
    pub fn submit_input(&mut self, raw: &str) {
        if self.is_over() {
            return;
        }

        self.state.current_input = raw.to_string();
        self.observers
            .notify(&SessionEvent::InputChanged(self.state.current_input.clone()));

        let Some(expected) = self.state.current_problem.expected_answer() else {
            return;
        };
        if util::parse_answer(raw) != Some(expected) {
            return;
        }

        self.state.score += 1;
        self.state.current_input.clear();
        self.state.current_problem = problem::generate(&self.settings, &mut self.draws);
        debug!(score = self.state.score, next = %self.state.current_problem, "correct answer");

        self.observers
            .notify(&SessionEvent::ScoreChanged(self.state.score));
        self.observers
            .notify(&SessionEvent::ProblemChanged(self.state.current_problem));
    }

    /// Stop the session now, keeping the score earned so far
    pub fn end_now(&mut self) {
        if self.is_over() {
            return;
        }
        self.finish(EndReason::EndedEarly);
    }

    fn finish(&mut self, reason: EndReason) {
        self.status = SessionStatus::Over;
        self.scheduler.cancel();

        let score = self.state.score;
        info!(score, ?reason, "session over");
        self.observers
            .notify(&SessionEvent::Finished { score, reason });
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_over(&self) -> bool {
        self.status == SessionStatus::Over
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    /// The score, once the session is over
    pub fn final_score(&self) -> Option<u32> {
        self.is_over().then_some(self.state.score)
    }

    pub fn question_text(&self) -> String {
        self.state.current_problem.question_text()
    }

    pub fn current_input(&self) -> &str {
        &self.state.current_input
    }

    pub fn remaining_seconds(&self) -> u32 {
        self.state.remaining_seconds
    }

    /// Remaining time as `m:ss`
    pub fn remaining_clock(&self) -> String {
        util::format_clock(self.state.remaining_seconds)
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }
}
