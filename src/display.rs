// ABOUTME: Display helpers - the process-wide display type and named
// ABOUTME: counters that a front end can render next to task progress.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Mutex, OnceLock, PoisonError, RwLock};

/// How evaluation progress is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayType {
    #[default]
    Full,
    Conversation,
    Rich,
    Plain,
    None,
}

impl FromStr for DisplayType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(DisplayType::Full),
            "conversation" => Ok(DisplayType::Conversation),
            "rich" => Ok(DisplayType::Rich),
            "plain" => Ok(DisplayType::Plain),
            "none" => Ok(DisplayType::None),
            _ => Err(format!(
                "invalid display type '{}', expected 'full', 'conversation', 'rich', 'plain' or 'none'",
                s
            )),
        }
    }
}

impl std::fmt::Display for DisplayType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DisplayType::Full => "full",
            DisplayType::Conversation => "conversation",
            DisplayType::Rich => "rich",
            DisplayType::Plain => "plain",
            DisplayType::None => "none",
        };
        f.write_str(s)
    }
}

fn display_cell() -> &'static RwLock<DisplayType> {
    static DISPLAY: OnceLock<RwLock<DisplayType>> = OnceLock::new();
    DISPLAY.get_or_init(|| RwLock::new(DisplayType::default()))
}

fn counters() -> &'static Mutex<BTreeMap<String, String>> {
    static COUNTERS: OnceLock<Mutex<BTreeMap<String, String>>> = OnceLock::new();
    COUNTERS.get_or_init(|| Mutex::new(BTreeMap::new()))
}

/// Set the display type. Unrecognized values fall back to `full` with a
/// warning; `None` resets to the default.
pub fn init_display_type(display: Option<&str>) -> DisplayType {
    let display_type = match display {
        None => DisplayType::default(),
        Some(value) => value.parse().unwrap_or_else(|e: String| {
            tracing::warn!("{}; using 'full'", e);
            DisplayType::Full
        }),
    };
    *display_cell().write().unwrap_or_else(PoisonError::into_inner) = display_type;
    display_type
}

/// The current display type.
pub fn display_type() -> DisplayType {
    *display_cell().read().unwrap_or_else(PoisonError::into_inner)
}

/// Set a named counter shown alongside progress.
pub fn display_counter(caption: &str, value: impl ToString) {
    let value = value.to_string();
    tracing::trace!(caption, value = %value, "display counter");
    counters()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .insert(caption.to_string(), value);
}

/// All counters, sorted by caption.
pub fn display_counters() -> Vec<(String, String)> {
    counters()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_display_type() {
        assert_eq!("plain".parse::<DisplayType>(), Ok(DisplayType::Plain));
        assert_eq!(" NONE ".parse::<DisplayType>(), Ok(DisplayType::None));
        assert!("fancy".parse::<DisplayType>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for t in [
            DisplayType::Full,
            DisplayType::Conversation,
            DisplayType::Rich,
            DisplayType::Plain,
            DisplayType::None,
        ] {
            assert_eq!(t.to_string().parse::<DisplayType>(), Ok(t));
        }
    }

    #[test]
    fn test_invalid_display_falls_back_to_full() {
        assert_eq!(init_display_type(Some("bogus")), DisplayType::Full);
    }

    #[test]
    fn test_display_counter_overwrites() {
        display_counter("display-test-counter", 1);
        display_counter("display-test-counter", "2 of 5");
        let value = display_counters()
            .into_iter()
            .find(|(k, _)| k == "display-test-counter")
            .map(|(_, v)| v);
        assert_eq!(value.as_deref(), Some("2 of 5"));
    }
}
