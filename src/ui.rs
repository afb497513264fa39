//! Ratatui front end for the track catalog. The engine owns the list; this
//! layer turns key presses into engine calls, hands the resulting requests to
//! the dispatcher, and redraws whatever the engine's view says.

mod app;
mod forms;
mod helpers;
mod terminal;


pub use app::App;
pub use terminal::run_app;
