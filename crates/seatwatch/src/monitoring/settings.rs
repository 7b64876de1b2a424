use serde::{Deserialize, Serialize};

/// Runtime-adjustable monitor settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSettings {
    /// Registrar term code, e.g. `2257` for Fall 2025.
    pub term: String,
    /// ntfy topic receiving alerts; empty disables delivery.
    pub ntfy_topic: String,
}

impl MonitorSettings {
    pub fn view(&self) -> SettingsView {
        SettingsView {
            term: self.term.clone(),
            term_name: term_name(&self.term),
            ntfy_topic: self.ntfy_topic.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub term: String,
    pub term_name: String,
    pub ntfy_topic: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default)]
    pub term: Option<String>,
    #[serde(default)]
    pub ntfy_topic: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsOutcome {
    pub message: &'static str,
    pub term_name: String,
    pub term_changed: bool,
}

/// Human-readable name for a `CYYT` term code (`T`: 1 spring, 4 summer, 7 fall).
pub fn term_name(term: &str) -> String {
    let bytes = term.as_bytes();
    if bytes.len() != 4 || !term.is_ascii() {
        return "Unknown Term".to_string();
    }

    let year = match term[1..3].parse::<u32>() {
        Ok(year) => 2000 + year,
        Err(_) => return "Unknown Term".to_string(),
    };

    match bytes[3] {
        b'1' => format!("Spring {year}"),
        b'4' => format!("Summer {year}"),
        b'7' => format!("Fall {year}"),
        _ => "Unknown Term".to_string(),
    }
}
