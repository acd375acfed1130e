// Placeholder conversion between marker styles

mod placeholder;

pub use placeholder::{bind_values, convert, render};

/// Marker syntax a driver expects for bound parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderStyle {
    /// `?`
    Positional,
    /// `$1`, `$2`, ...
    Numbered,
    /// `:name`
    NamedColon,
    /// `%(name)s`
    NamedPercent,
}

impl PlaceholderStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceholderStyle::Positional => "positional",
            PlaceholderStyle::Numbered => "numbered",
            PlaceholderStyle::NamedColon => "named_colon",
            PlaceholderStyle::NamedPercent => "named_percent",
        }
    }
}
