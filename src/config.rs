//! Configuration loader and schema types.
//!
//! Settings come from struct defaults, an optional TOML file and
//! `TRACK_CATALOG__*` environment variables, in increasing priority.

mod load;
mod schema;

pub use load::{default_config_path, resolve_config_path};
pub use schema::*;
