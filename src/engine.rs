use std::rc::Rc;

use rand::Rng;
use rand::rngs::StdRng;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::background::{Background, Target};
use crate::error::{Error, RotationStatus};
use crate::events::Signal;
use crate::fs::{DirectoryChange, Filesystem, WatchHandle};
use crate::loader;
use crate::queue::{BoundedDeque, QUEUE_CAPACITY};
use crate::settings::Settings;
use crate::state;

/// Rotation engine for one profile: owns the wallpaper pool, the lookahead
/// and history queues, and the selection cursors.
///
/// All operations run on the single logical actor that owns the engine.
/// Directory watches report through the channel supplied at construction,
/// never by mutating engine state from their own thread.
pub struct ProfileEngine {
    name: String,
    settings: Rc<Settings>,
    fs: Rc<dyn Filesystem>,
    background: Rc<dyn Background>,
    target: Target,
    pool: Vec<String>,
    history: BoundedDeque,
    lookahead: BoundedDeque,
    cursor: usize,
    loaded: bool,
    watches: Vec<WatchHandle>,
    rng: StdRng,
    watch_tx: UnboundedSender<DirectoryChange>,
    loaded_signal: Signal<()>,
    preview_signal: Signal<String>,
    changed_signal: Signal<String>,
}

impl ProfileEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: String,
        settings: Rc<Settings>,
        fs: Rc<dyn Filesystem>,
        background: Rc<dyn Background>,
        target: Target,
        rng: StdRng,
        watch_tx: UnboundedSender<DirectoryChange>,
    ) -> Self {
        Self {
            name,
            settings,
            fs,
            background,
            target,
            pool: Vec::new(),
            history: BoundedDeque::new(),
            lookahead: BoundedDeque::new(),
            cursor: 0,
            loaded: false,
            watches: Vec::new(),
            rng,
            watch_tx,
            loaded_signal: Signal::new(),
            preview_signal: Signal::new(),
            changed_signal: Signal::new(),
        }
    }

    /// Rebuild the pool from the profile's configured locations and prime
    /// the lookahead queue. Idempotent: any previous state is dropped
    /// first.
    ///
    /// With `restore_state`, a persisted queue position is consumed into
    /// the lookahead queue before priming, so rotation resumes where it
    /// left off.
    pub fn load(&mut self, restore_state: bool) -> Result<RotationStatus, Error> {
        self.unload();
        info!(profile = %self.name, "loading profile");

        let locations = self
            .settings
            .profile_locations(&self.name)
            .ok_or_else(|| Error::UnknownProfile(self.name.clone()))?;
        let settings = Rc::clone(&self.settings);
        let allow = move |content_type: &str| settings.content_type_allowed(content_type);
        let report = loader::load_locations(self.fs.as_ref(), &locations, &allow, &self.watch_tx);

        if report.pool.is_empty() {
            return Err(Error::NoWallpapers {
                profile: self.name.clone(),
                locations: report.locations,
            });
        }
        let status = if report.pool.len() == 1 {
            warn!(profile = %self.name, "only one wallpaper found, rotation is disabled");
            RotationStatus::Single
        } else {
            RotationStatus::Rotating
        };

        self.pool = report.pool;
        self.pool.sort();
        self.watches = report.watches;

        if restore_state {
            state::restore(&self.settings, &self.name, &mut self.lookahead);
        }
        self.fill_queue();
        self.loaded = true;
        info!(
            profile = %self.name,
            wallpapers = self.pool.len(),
            watches = self.watches.len(),
            "profile loaded"
        );
        self.loaded_signal.emit(());
        Ok(status)
    }

    /// Drop the pool, both queues and every directory watch. The watches
    /// are cancelled before this returns, so no stale notification can
    /// race against the cleared state.
    pub fn unload(&mut self) {
        if self.loaded {
            debug!(profile = %self.name, "unloading profile");
        }
        self.watches.clear();
        self.history.clear();
        self.lookahead.clear();
        self.pool.clear();
        self.cursor = 0;
        self.loaded = false;
    }

    /// Advance to the next wallpaper. With `use_current`, the wallpaper on
    /// display beforehand is pushed into the history so `previous` can get
    /// back to it.
    pub fn next(&mut self, use_current: bool) -> Result<String, Error> {
        if !self.loaded {
            return Err(Error::NotLoaded {
                profile: self.name.clone(),
            });
        }
        if use_current {
            let current = self.background.get(self.target);
            if !current.is_empty() {
                debug!(uri = %current, "recording current wallpaper in history");
                self.history.enqueue(current);
            }
        }
        if self.lookahead.is_empty() {
            self.fill_queue();
        }
        let wallpaper = self.lookahead.dequeue().ok_or_else(|| Error::NoWallpapers {
            profile: self.name.clone(),
            locations: 0,
        })?;
        self.background.set(self.target, &wallpaper);
        info!(profile = %self.name, uri = %wallpaper, "wallpaper changed");
        self.changed_signal.emit(wallpaper.clone());
        self.fill_queue();
        Ok(wallpaper)
    }

    /// Rewind to the most recent history entry. The wallpaper on display
    /// goes back into the lookahead queue, so no refill is needed: the
    /// next `next` shows it again.
    pub fn previous(&mut self) -> Result<String, Error> {
        if !self.loaded {
            return Err(Error::NotLoaded {
                profile: self.name.clone(),
            });
        }
        let Some(wallpaper) = self.history.dequeue() else {
            warn!(profile = %self.name, "no wallpapers in the history");
            return Err(Error::EmptyHistory {
                profile: self.name.clone(),
            });
        };
        let current = self.background.get(self.target);
        if !current.is_empty() {
            self.lookahead.enqueue(current.clone());
            self.preview_signal.emit(current);
        }
        self.background.set(self.target, &wallpaper);
        info!(profile = %self.name, uri = %wallpaper, "wallpaper rewound");
        self.changed_signal.emit(wallpaper.clone());
        Ok(wallpaper)
    }

    /// Top the lookahead queue up to one ready candidate. A non-empty
    /// queue only has its preview re-announced; callers wanting deeper
    /// lookahead call this repeatedly after dequeuing.
    pub(crate) fn fill_queue(&mut self) {
        if let Some(preview) = self.lookahead.preview() {
            let preview = preview.to_string();
            debug!(uri = %preview, "lookahead queue already primed");
            self.preview_signal.emit(preview);
            return;
        }
        if self.pool.is_empty() {
            debug!(profile = %self.name, "no pool to draw from");
            return;
        }
        let wallpaper = if self.settings.random() {
            self.pick_random()
        } else {
            self.pick_sequential()
        };
        debug!(uri = %wallpaper, "queued as next wallpaper");
        self.lookahead.enqueue(wallpaper.clone());
        self.preview_signal.emit(wallpaper);
    }

    /// Uniform pick with repeat avoidance.
    ///
    /// A candidate is held back when it is on display right now, when it
    /// sits in the history (for pools of 100 or more any history entry
    /// counts; below that only the most recent one), or when it is already
    /// queued (again relaxed for pools smaller than the queue occupancy).
    /// When that filter leaves nothing, the rules are relaxed to "anything
    /// but the current wallpaper" so tiny pools keep rotating instead of
    /// starving the picker.
    fn pick_random(&mut self) -> String {
        let current = self.background.get(self.target);
        let pool_len = self.pool.len();
        let most_recent = self.history.preview().map(str::to_string);

        let strict: Vec<&str> = self
            .pool
            .iter()
            .map(String::as_str)
            .filter(|candidate| {
                if *candidate == current.as_str() {
                    return false;
                }
                if self.history.contains(candidate)
                    && (pool_len >= QUEUE_CAPACITY
                        || Some(*candidate) == most_recent.as_deref())
                {
                    return false;
                }
                if self.lookahead.contains(candidate)
                    && (pool_len >= QUEUE_CAPACITY || self.lookahead.len() < pool_len)
                {
                    return false;
                }
                true
            })
            .collect();
        if !strict.is_empty() {
            return strict[self.rng.random_range(0..strict.len())].to_string();
        }

        let fresh: Vec<&str> = self
            .pool
            .iter()
            .map(String::as_str)
            .filter(|candidate| *candidate != current.as_str())
            .collect();
        if fresh.is_empty() {
            // Pool of one, already on display. Keep showing it.
            return self.pool[0].clone();
        }
        debug!(profile = %self.name, "history covers the pool, relaxing repeat avoidance");
        fresh[self.rng.random_range(0..fresh.len())].to_string()
    }

    /// Walk the sorted pool in order, wrapping the cursor back to the
    /// start once it reaches the end.
    fn pick_sequential(&mut self) -> String {
        if self.cursor >= self.pool.len() {
            self.cursor = 0;
        }
        let wallpaper = self.pool[self.cursor].clone();
        self.cursor += 1;
        wallpaper
    }

    /// A watched directory reported a change.
    pub fn handle_directory_change(&mut self, change: &DirectoryChange) {
        // TODO(rescan): decide whether a change should rescan just the
        // reported directory or rebuild the whole pool; until then the
        // notification is only logged.
        debug!(
            profile = %self.name,
            uri = %change.uri,
            "directory changed; rescan not implemented"
        );
    }

    /// Persist the current queue position for this profile.
    pub fn save_state(&self) {
        let current = self.background.get(self.target);
        state::save(&self.settings, &self.name, &self.lookahead, &current);
    }

    pub fn loaded(&self) -> bool {
        self.loaded
    }

    /// Head-of-queue candidate, the wallpaper `next` would show.
    pub fn preview(&self) -> Option<String> {
        self.lookahead.preview().map(str::to_string)
    }

    pub fn profile_name(&self) -> &str {
        &self.name
    }

    /// Point the engine at another profile definition. Takes effect on the
    /// next `load`.
    pub fn set_profile_name(&mut self, name: String) {
        self.name = name;
    }

    pub fn pool(&self) -> &[String] {
        &self.pool
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn lookahead_len(&self) -> usize {
        self.lookahead.len()
    }

    pub fn subscribe_loaded(&mut self) -> UnboundedReceiver<()> {
        self.loaded_signal.subscribe()
    }

    pub fn subscribe_preview(&mut self) -> UnboundedReceiver<String> {
        self.preview_signal.subscribe()
    }

    pub fn subscribe_changed(&mut self) -> UnboundedReceiver<String> {
        self.changed_signal.subscribe()
    }
}

impl std::fmt::Debug for ProfileEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileEngine")
            .field("name", &self.name)
            .field("target", &self.target)
            .field("loaded", &self.loaded)
            .field("pool", &self.pool.len())
            .field("history", &self.history.len())
            .field("lookahead", &self.lookahead.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use tokio::sync::mpsc;

    use super::*;
    use crate::background::MemoryBackground;
    use crate::fs::LocalFilesystem;
    use crate::settings::SettingsData;

    #[test]
    fn fill_queue_before_load_is_inert() {
        let (watch_tx, _watch_rx) = mpsc::unbounded_channel();
        let mut engine = ProfileEngine::new(
            "test".to_string(),
            Rc::new(Settings::in_memory(SettingsData::default())),
            Rc::new(LocalFilesystem::new()),
            Rc::new(MemoryBackground::new()),
            Target::Desktop,
            StdRng::seed_from_u64(7),
            watch_tx,
        );

        // Nothing loaded, nothing to pick from: must not touch the queue.
        engine.fill_queue();
        assert_eq!(engine.preview(), None);
        assert_eq!(engine.lookahead_len(), 0);
    }
}
