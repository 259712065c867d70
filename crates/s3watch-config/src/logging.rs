//! Diagnostic output format selection.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How daemon diagnostics are rendered on stderr.
///
/// Handler stdout is redirected into the same stream, so the JSON default
/// keeps daemon lines machine-separable from handler chatter.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per line, event fields flattened, run span attached.
    #[default]
    Json,
    /// Single-line text for interactive use.
    Compact,
}

impl LogFormat {
    /// Whether colour escapes may be emitted when stderr is a terminal.
    #[must_use]
    pub const fn allows_ansi(self) -> bool {
        matches!(self, Self::Compact)
    }
}

/// Error returned when text names no [`LogFormat`].
pub type LogFormatParseError = strum::ParseError;
