//! Game content sources: game files and the preset library.

/// Game file parsing and load errors.
pub mod game_file;
/// Preset discovery and caching.
pub mod loader;

pub use game_file::{load_file, parse_game_file, preset_from_query, LoadError};
pub use loader::{
    is_valid_preset_id, write_sample_template, PresetInfo, PresetLibrary, SAMPLE_PRESET_ID,
    SAMPLE_TEMPLATE_FILE,
};
