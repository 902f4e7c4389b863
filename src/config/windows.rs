use std::{collections::BTreeMap, fmt};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The windows the shell knows how to build.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    /// Application launcher.
    Launcher,
    /// Top bar.
    Bar,
    /// Desktop background layer.
    Desktop,
    /// OSD popups (volume, brightness).
    Popups,
    /// Media player controls.
    Music,
    /// Notification center.
    Notifications,
}

impl WindowKind {
    /// Window name registered with the shell runtime.
    pub fn name(self) -> &'static str {
        match self {
            WindowKind::Launcher => "launcher",
            WindowKind::Bar => "bar",
            WindowKind::Desktop => "desktop",
            WindowKind::Popups => "popups",
            WindowKind::Music => "music",
            WindowKind::Notifications => "notifications",
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Window set configuration.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct WindowsConfig {
    /// Windows to construct, in stacking order.
    pub enabled: Vec<WindowKind>,

    /// Close animation delay in milliseconds, keyed by window name.
    /// Windows without an entry use the runtime's default.
    pub close_delay: BTreeMap<String, u32>,
}

impl Default for WindowsConfig {
    fn default() -> Self {
        Self {
            enabled: vec![
                WindowKind::Launcher,
                WindowKind::Bar,
                WindowKind::Desktop,
                WindowKind::Popups,
                WindowKind::Music,
            ],
            close_delay: BTreeMap::from([
                ("launcher".to_string(), 300),
                ("music".to_string(), 300),
            ]),
        }
    }
}
