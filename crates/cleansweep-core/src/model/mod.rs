/// Data model — cleanup target groups, items, and display formatting.
pub mod format;
pub mod item;

pub use format::{format_remaining, format_size};
pub use item::{Item, SelectedItem, TargetGroup};
