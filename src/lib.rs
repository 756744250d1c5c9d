// Library surface for the binary and for headless/integration tests.
pub mod app;
pub mod config;
pub mod error;
pub mod observer;
pub mod operation;
pub mod problem;
pub mod runtime;
pub mod session;
pub mod settings;
pub mod ui;
pub mod util;

pub use app::{App, AppState};
pub use error::ConfigurationError;
pub use operation::Operation;
pub use problem::Problem;
pub use session::SessionEngine;
pub use settings::Settings;
