use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use mathblitz::{
    operation::Operation,
    problem::{RandomDraws, SequenceDraws},
    runtime::{AppEvent, Countdown, FixedTicker, Runner, Scheduler, TestEventSource},
    session::{SessionEngine, SessionStatus},
    settings::{OperationConfig, Settings, TimerMinutes},
};

/// Counts every firing so the loop can tick without waiting a real second
#[derive(Debug, Default)]
struct ImmediateScheduler {
    armed: bool,
}

impl Scheduler for ImmediateScheduler {
    fn schedule(&mut self, _delay: Duration) {
        self.armed = true;
    }

    fn cancel(&mut self) {
        self.armed = false;
    }
}

fn key(c: char) -> AppEvent {
    AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

// Headless integration using the runtime + SessionEngine without a TTY
#[test]
fn headless_answers_score_through_runner() {
    let settings = Settings::all_disabled()
        .with_operation(Operation::Multiplication, OperationConfig::new(true, 12, 12));
    let mut engine = SessionEngine::start(settings, RandomDraws::seeded(5), Countdown::new());

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(5)),
    );

    for c in "144144".chars() {
        tx.send(key(c)).unwrap();
    }

    for _ in 0..6 {
        if let Ok(AppEvent::Key(key)) = runner.step() {
            if let KeyCode::Char(c) = key.code {
                let mut text = engine.current_input().to_string();
                text.push(c);
                engine.submit_input(&text);
            }
        }
    }

    assert_eq!(engine.score(), 2);
    assert_eq!(engine.question_text(), "12 * 12");
    assert_eq!(engine.status(), SessionStatus::Active);
}

#[test]
fn headless_countdown_stops_rescheduling_when_over() {
    let settings = Settings::default().with_timer(TimerMinutes::new(2).unwrap());
    let mut engine =
        SessionEngine::start(settings, SequenceDraws::default(), ImmediateScheduler::default());

    let (_tx, rx) = mpsc::channel();
    let runner = Runner::new(
        TestEventSource::new(rx),
        FixedTicker::new(Duration::from_millis(1)),
    );

    let mut firings = 0;
    // each Tick stands in for one scheduled one-second firing
    while engine.scheduler().armed {
        if let Ok(AppEvent::Tick) = runner.step() {
            engine.tick();
            firings += 1;
        }
        assert!(firings <= 120, "countdown kept firing after it ended");
    }

    assert_eq!(firings, 120);
    assert!(engine.is_over());
    assert_eq!(engine.final_score(), Some(0));
    assert_eq!(engine.remaining_clock(), "0:00");
}

#[test]
fn headless_draws_are_reproducible_with_a_seed() {
    let questions = |seed| {
        let mut engine = SessionEngine::start(
            Settings::default(),
            RandomDraws::seeded(seed),
            ImmediateScheduler::default(),
        );
        let mut seen = Vec::new();
        for _ in 0..10 {
            seen.push(engine.question_text());
            let answer = engine.state().current_problem.expected_answer().unwrap();
            engine.submit_input(&answer.to_string());
        }
        seen
    };

    assert_eq!(questions(99), questions(99));
}
