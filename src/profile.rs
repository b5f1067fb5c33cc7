use std::rc::Rc;

use rand::rngs::StdRng;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

use crate::background::{Background, Target};
use crate::engine::ProfileEngine;
use crate::error::{Error, RotationStatus};
use crate::fs::{DirectoryChange, Filesystem};
use crate::settings::{SettingChange, Settings};

/// What a profile does beyond plain rotation. Both concrete profiles are
/// the same type parameterized over this set; there is no inheritance.
#[derive(Debug, Clone, Copy, Default)]
pub struct Capabilities {
    /// Persist the queue position across unloads when the remember-state
    /// flag is set.
    pub save_state: bool,
    /// With an empty profile name, mirror the desktop wallpaper instead of
    /// rotating.
    pub inherit: bool,
}

/// One rotation profile bound to a target surface.
pub struct Profile {
    engine: ProfileEngine,
    capabilities: Capabilities,
    settings: Rc<Settings>,
    background: Rc<dyn Background>,
    target: Target,
}

impl Profile {
    /// Primary desktop profile: saves and restores its queue position when
    /// the remember-state flag is enabled.
    pub fn desktop(
        settings: Rc<Settings>,
        fs: Rc<dyn Filesystem>,
        background: Rc<dyn Background>,
        rng: StdRng,
        watch_tx: UnboundedSender<DirectoryChange>,
    ) -> Self {
        let name = settings.current_profile();
        Self::with_capabilities(
            name,
            Capabilities {
                save_state: true,
                inherit: false,
            },
            Target::Desktop,
            settings,
            fs,
            background,
            rng,
            watch_tx,
        )
    }

    /// Lock-screen profile: an empty profile name puts it in inherited
    /// mode, mirroring the desktop wallpaper instead of rotating.
    pub fn lockscreen(
        settings: Rc<Settings>,
        fs: Rc<dyn Filesystem>,
        background: Rc<dyn Background>,
        rng: StdRng,
        watch_tx: UnboundedSender<DirectoryChange>,
    ) -> Self {
        let name = settings.lockscreen_profile();
        Self::with_capabilities(
            name,
            Capabilities {
                save_state: false,
                inherit: true,
            },
            Target::Lockscreen,
            settings,
            fs,
            background,
            rng,
            watch_tx,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn with_capabilities(
        name: String,
        capabilities: Capabilities,
        target: Target,
        settings: Rc<Settings>,
        fs: Rc<dyn Filesystem>,
        background: Rc<dyn Background>,
        rng: StdRng,
        watch_tx: UnboundedSender<DirectoryChange>,
    ) -> Self {
        let engine = ProfileEngine::new(
            name,
            Rc::clone(&settings),
            fs,
            Rc::clone(&background),
            target,
            rng,
            watch_tx,
        );
        Self {
            engine,
            capabilities,
            settings,
            background,
            target,
        }
    }

    /// True when this profile mirrors the desktop instead of rotating.
    pub fn is_inherited(&self) -> bool {
        self.capabilities.inherit && self.engine.profile_name().is_empty()
    }

    /// Load the profile's pool. Inherited lock-screen profiles have
    /// nothing to load and report `Rotating` untouched.
    pub fn load(&mut self) -> Result<RotationStatus, Error> {
        if self.is_inherited() {
            debug!("lock-screen inherits the desktop wallpaper, nothing to load");
            return Ok(RotationStatus::Rotating);
        }
        let restore = self.capabilities.save_state && self.settings.remember_profile_state();
        self.engine.load(restore)
    }

    /// Unload, persisting the queue position first when this profile keeps
    /// state and the remember-state flag is on.
    pub fn unload(&mut self) {
        if self.should_save_state() {
            self.engine.save_state();
        }
        self.engine.unload();
    }

    /// Unload and drop the profile's interest in further setting changes.
    /// Callers stop routing `handle_setting_change` after this.
    pub fn destroy(&mut self) {
        self.unload();
    }

    /// Advance the rotation. See [`ProfileEngine::next`].
    pub fn next(&mut self, use_current: bool) -> Result<String, Error> {
        self.engine.next(use_current)
    }

    /// Rewind the rotation. See [`ProfileEngine::previous`].
    pub fn previous(&mut self) -> Result<String, Error> {
        self.engine.previous()
    }

    /// Mirror the desktop wallpaper onto the lock screen. Only acts for an
    /// inherited lock-screen profile while both the auto-rotate and
    /// update-lockscreen flags are enabled.
    pub fn mirror(&mut self, uri: &str) {
        if !self.is_inherited() {
            return;
        }
        if !self.settings.auto_rotate() || !self.settings.update_lockscreen() {
            debug!(uri, "mirroring disabled by settings");
            return;
        }
        info!(uri, "mirroring desktop wallpaper onto the lock screen");
        self.background.set(self.target, uri);
    }

    /// React to a configuration change routed by the owner.
    pub fn handle_setting_change(&mut self, change: SettingChange) -> Result<(), Error> {
        match change {
            SettingChange::CurrentProfile if self.target == Target::Desktop => {
                let name = self.settings.current_profile();
                info!(profile = %name, "desktop profile changed");
                if self.should_save_state() {
                    // Capture the position under the old name before it is
                    // swapped out.
                    self.engine.save_state();
                }
                let was_loaded = self.engine.loaded();
                self.engine.set_profile_name(name);
                if was_loaded {
                    self.load()?;
                }
            }
            SettingChange::LockscreenProfile if self.target == Target::Lockscreen => {
                let name = self.settings.lockscreen_profile();
                info!(profile = %name, "lock-screen profile changed");
                self.engine.unload();
                self.engine.set_profile_name(name);
                if !self.is_inherited() && self.settings.update_lockscreen() {
                    self.load()?;
                }
            }
            SettingChange::UpdateLockscreen if self.target == Target::Lockscreen => {
                if self.settings.update_lockscreen() {
                    if !self.is_inherited() {
                        self.load()?;
                    }
                } else {
                    info!("lock-screen updates disabled");
                    self.engine.unload();
                }
            }
            SettingChange::Profiles => {
                // The definitions backing our name may have changed.
                if self.engine.loaded() {
                    info!(profile = %self.engine.profile_name(), "profile definitions changed, reloading");
                    self.load()?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Forward a directory-change notification that belongs to this
    /// profile's watches.
    pub fn handle_directory_change(&mut self, change: &DirectoryChange) {
        self.engine.handle_directory_change(change);
    }

    pub fn loaded(&self) -> bool {
        self.engine.loaded()
    }

    pub fn preview(&self) -> Option<String> {
        self.engine.preview()
    }

    pub fn profile_name(&self) -> &str {
        self.engine.profile_name()
    }

    pub fn subscribe_loaded(&mut self) -> UnboundedReceiver<()> {
        self.engine.subscribe_loaded()
    }

    pub fn subscribe_preview(&mut self) -> UnboundedReceiver<String> {
        self.engine.subscribe_preview()
    }

    pub fn subscribe_changed(&mut self) -> UnboundedReceiver<String> {
        self.engine.subscribe_changed()
    }

    fn should_save_state(&self) -> bool {
        self.capabilities.save_state
            && self.settings.remember_profile_state()
            && self.engine.loaded()
    }
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("engine", &self.engine)
            .field("capabilities", &self.capabilities)
            .field("target", &self.target)
            .finish()
    }
}
