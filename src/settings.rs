use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};

use crate::error::Error;
use crate::events::Signal;

/// One source location inside a profile definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Location {
    pub uri: String,
    #[serde(default)]
    pub recursive: bool,
}

/// Keys that can change under a running profile. Subscribers receive one
/// notification per mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingChange {
    CurrentProfile,
    LockscreenProfile,
    Profiles,
    Random,
    AutoRotate,
    RememberProfileState,
    UpdateLockscreen,
    TimerEnabled,
    Interval,
}

fn default_current_profile() -> String {
    "default".to_string()
}

fn default_allowed_content_types() -> Vec<String> {
    [
        "image/jpeg",
        "image/png",
        "image/gif",
        "image/webp",
        "image/bmp",
        "image/tiff",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

fn default_profiles() -> BTreeMap<String, Vec<Location>> {
    let mut profiles = BTreeMap::new();
    profiles.insert(
        "default".to_string(),
        vec![Location {
            uri: "file:///usr/share/backgrounds".to_string(),
            recursive: true,
        }],
    );
    profiles
}

fn default_true() -> bool {
    true
}

fn default_interval() -> Duration {
    Duration::from_secs(300)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SettingsData {
    #[serde(default = "default_current_profile")]
    pub current_profile: String,
    /// Empty string means the lock screen inherits the desktop wallpaper.
    #[serde(default)]
    pub lockscreen_profile: String,
    #[serde(default = "default_profiles")]
    pub profiles: BTreeMap<String, Vec<Location>>,
    #[serde(default = "default_allowed_content_types")]
    pub allowed_content_types: Vec<String>,
    #[serde(default = "default_true")]
    pub random: bool,
    #[serde(default = "default_true")]
    pub auto_rotate: bool,
    #[serde(default)]
    pub remember_profile_state: bool,
    #[serde(default = "default_true")]
    pub update_lockscreen: bool,
    #[serde(default = "default_true")]
    pub timer_enabled: bool,
    #[serde(default = "default_interval", with = "humantime_serde")]
    pub interval: Duration,
    /// Persisted rotation state per profile name: (preview, current).
    #[serde(default)]
    pub profile_state: BTreeMap<String, (String, String)>,
}

impl Default for SettingsData {
    fn default() -> Self {
        Self {
            current_profile: default_current_profile(),
            lockscreen_profile: String::new(),
            profiles: default_profiles(),
            allowed_content_types: default_allowed_content_types(),
            random: true,
            auto_rotate: true,
            remember_profile_state: false,
            update_lockscreen: true,
            timer_enabled: true,
            interval: default_interval(),
            profile_state: BTreeMap::new(),
        }
    }
}

/// File-backed key-value store with per-key change notification.
///
/// Interior mutability keeps the store shareable as `Rc<Settings>` across
/// the profiles that read it; the whole system runs on one logical actor,
/// so `RefCell` borrows never overlap.
pub struct Settings {
    path: Option<PathBuf>,
    data: RefCell<SettingsData>,
    changed: RefCell<Signal<SettingChange>>,
}

impl Settings {
    /// Load settings from a YAML file. A missing file yields the defaults;
    /// mutations will create it.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let data = match std::fs::read_to_string(path) {
            Ok(raw) => serde_yaml::from_str(&raw)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "settings file missing, using defaults");
                SettingsData::default()
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path: Some(path.to_path_buf()),
            data: RefCell::new(data),
            changed: RefCell::new(Signal::new()),
        })
    }

    /// In-memory store that never touches disk.
    pub fn in_memory(data: SettingsData) -> Self {
        Self {
            path: None,
            data: RefCell::new(data),
            changed: RefCell::new(Signal::new()),
        }
    }

    pub fn subscribe(&self) -> UnboundedReceiver<SettingChange> {
        self.changed.borrow_mut().subscribe()
    }

    pub fn current_profile(&self) -> String {
        self.data.borrow().current_profile.clone()
    }

    pub fn lockscreen_profile(&self) -> String {
        self.data.borrow().lockscreen_profile.clone()
    }

    pub fn profile_locations(&self, name: &str) -> Option<Vec<Location>> {
        self.data.borrow().profiles.get(name).cloned()
    }

    pub fn content_type_allowed(&self, content_type: &str) -> bool {
        self.data
            .borrow()
            .allowed_content_types
            .iter()
            .any(|allowed| allowed == content_type)
    }

    pub fn random(&self) -> bool {
        self.data.borrow().random
    }

    pub fn auto_rotate(&self) -> bool {
        self.data.borrow().auto_rotate
    }

    pub fn remember_profile_state(&self) -> bool {
        self.data.borrow().remember_profile_state
    }

    pub fn update_lockscreen(&self) -> bool {
        self.data.borrow().update_lockscreen
    }

    pub fn timer_enabled(&self) -> bool {
        self.data.borrow().timer_enabled
    }

    pub fn interval(&self) -> Duration {
        self.data.borrow().interval
    }

    pub fn set_current_profile(&self, name: &str) {
        self.data.borrow_mut().current_profile = name.to_string();
        self.after_change(SettingChange::CurrentProfile);
    }

    pub fn set_lockscreen_profile(&self, name: &str) {
        self.data.borrow_mut().lockscreen_profile = name.to_string();
        self.after_change(SettingChange::LockscreenProfile);
    }

    pub fn set_profiles(&self, profiles: BTreeMap<String, Vec<Location>>) {
        self.data.borrow_mut().profiles = profiles;
        self.after_change(SettingChange::Profiles);
    }

    pub fn set_random(&self, random: bool) {
        self.data.borrow_mut().random = random;
        self.after_change(SettingChange::Random);
    }

    pub fn set_auto_rotate(&self, auto_rotate: bool) {
        self.data.borrow_mut().auto_rotate = auto_rotate;
        self.after_change(SettingChange::AutoRotate);
    }

    pub fn set_remember_profile_state(&self, remember: bool) {
        self.data.borrow_mut().remember_profile_state = remember;
        self.after_change(SettingChange::RememberProfileState);
    }

    pub fn set_update_lockscreen(&self, update: bool) {
        self.data.borrow_mut().update_lockscreen = update;
        self.after_change(SettingChange::UpdateLockscreen);
    }

    pub fn set_timer_enabled(&self, enabled: bool) {
        self.data.borrow_mut().timer_enabled = enabled;
        self.after_change(SettingChange::TimerEnabled);
    }

    pub fn set_interval(&self, interval: Duration) {
        self.data.borrow_mut().interval = interval;
        self.after_change(SettingChange::Interval);
    }

    /// Store persisted rotation state for `profile`, returning any entry
    /// that was overwritten.
    pub fn put_profile_state(
        &self,
        profile: &str,
        state: (String, String),
    ) -> Option<(String, String)> {
        let previous = self
            .data
            .borrow_mut()
            .profile_state
            .insert(profile.to_string(), state);
        self.persist();
        previous
    }

    /// Remove and return the persisted state for `profile` (one-shot
    /// consumption).
    pub fn take_profile_state(&self, profile: &str) -> Option<(String, String)> {
        let taken = self.data.borrow_mut().profile_state.remove(profile);
        if taken.is_some() {
            self.persist();
        }
        taken
    }

    pub fn has_profile_state(&self, profile: &str) -> bool {
        self.data.borrow().profile_state.contains_key(profile)
    }

    fn after_change(&self, change: SettingChange) {
        self.persist();
        self.changed.borrow_mut().emit(change);
    }

    fn persist(&self) {
        let Some(path) = &self.path else {
            return;
        };
        let serialized = match serde_yaml::to_string(&*self.data.borrow()) {
            Ok(s) => s,
            Err(err) => {
                warn!(error = %err, "cannot serialize settings");
                return;
            }
        };
        if let Err(err) = std::fs::write(path, serialized) {
            warn!(path = %path.display(), error = %err, "cannot write settings file");
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("path", &self.path)
            .field("data", &self.data.borrow())
            .finish()
    }
}
