//! Light/dark theme preference

use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Local storage key holding the preference
pub const THEME_KEY: &str = "theme";

/// Class toggled on `<html>` for dark mode
pub const DARK_CLASS: &str = "dark";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, Theme::Dark)
    }

    /// Stored preference, defaulting to light when absent or unrecognised
    pub fn from_stored(stored: Option<&str>) -> Self {
        match stored.map(str::parse::<Theme>) {
            Some(Ok(theme)) => theme,
            Some(Err(err)) => {
                tracing::warn!(error = %err, "ignoring stored theme");
                Theme::Light
            }
            None => Theme::Light,
        }
    }
}

impl FromStr for Theme {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(ClientError::UnknownTheme(other.to_string())),
        }
    }
}
