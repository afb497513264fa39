//! Logger bootstrap. Uses `colog` on top of the `log` facade.

use log::LevelFilter;

/// Install the global logger at `level` (falls back to `off` when the string
/// is not a level). Safe to call more than once; later calls are ignored.
pub fn init(level: &str) {
    let filter = level.parse::<LevelFilter>().unwrap_or(LevelFilter::Off);
    let mut builder = colog::default_builder();
    builder.filter(None, filter);
    if builder.try_init().is_err() {
        log::debug!("logger already installed");
    }
}
