use std::cell::RefCell;
use std::collections::HashMap;
use std::process::Command;

use tracing::{debug, warn};

/// Surface a profile applies wallpapers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Desktop,
    Lockscreen,
}

impl Target {
    fn schema(self) -> &'static str {
        match self {
            Target::Desktop => "org.gnome.desktop.background",
            Target::Lockscreen => "org.gnome.desktop.screensaver",
        }
    }
}

/// Background setter collaborator: one string property per target.
pub trait Background {
    /// Currently applied wallpaper URI, or an empty string when unknown.
    fn get(&self, target: Target) -> String;

    /// Apply `uri` to `target`.
    fn set(&self, target: Target, uri: &str);
}

/// Setter backed by the `gsettings` command line tool.
#[derive(Debug, Default)]
pub struct GsettingsBackground;

impl GsettingsBackground {
    pub fn new() -> Self {
        Self
    }
}

impl Background for GsettingsBackground {
    fn get(&self, target: Target) -> String {
        let output = Command::new("gsettings")
            .args(["get", target.schema(), "picture-uri"])
            .output();
        match output {
            Ok(output) if output.status.success() => {
                let raw = String::from_utf8_lossy(&output.stdout);
                // gsettings prints the value quoted: 'file:///…'
                raw.trim().trim_matches('\'').to_string()
            }
            Ok(output) => {
                warn!(target = ?target, status = ?output.status, "gsettings get failed");
                String::new()
            }
            Err(err) => {
                warn!(target = ?target, error = %err, "cannot launch gsettings");
                String::new()
            }
        }
    }

    fn set(&self, target: Target, uri: &str) {
        debug!(target = ?target, uri, "applying wallpaper");
        match Command::new("gsettings")
            .args(["set", target.schema(), "picture-uri", uri])
            .output()
        {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                warn!(target = ?target, uri, status = ?output.status, "gsettings set failed")
            }
            Err(err) => warn!(target = ?target, uri, error = %err, "cannot launch gsettings"),
        }
    }
}

/// In-memory setter for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryBackground {
    values: RefCell<HashMap<Target, String>>,
}

impl MemoryBackground {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Background for MemoryBackground {
    fn get(&self, target: Target) -> String {
        self.values
            .borrow()
            .get(&target)
            .cloned()
            .unwrap_or_default()
    }

    fn set(&self, target: Target, uri: &str) {
        self.values.borrow_mut().insert(target, uri.to_string());
    }
}
