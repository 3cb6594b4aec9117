// Data model shared by the engine and whatever front end edits it.
pub mod models;
pub mod utils;

pub use utils::decimal;
