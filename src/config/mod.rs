//! Tool settings.
//!
//! Settings are optional: without a file every value has a built-in default.

mod path;
mod settings;

pub use path::{default_settings_path, home_dir, resolve_path};
pub use settings::{NvsToolSettings, Settings};
