//! Event pump driving the profiles: the rotation timer, configuration
//! changes, directory-watch notifications and shutdown all arrive here and
//! are dispatched onto the profiles from one thread.

use std::rc::Rc;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::background::Background;
use crate::error::{Error, RotationStatus};
use crate::fs::Filesystem;
use crate::profile::Profile;
use crate::settings::{SettingChange, Settings};

fn rotation_timer(settings: &Settings) -> tokio::time::Interval {
    let period = settings.interval();
    // First fire after one full period, not immediately.
    let mut timer = interval_at(Instant::now() + period, period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    timer
}

/// Run the rotation until `cancel` fires or the process receives ctrl-c.
pub async fn run(
    settings: Rc<Settings>,
    fs: Rc<dyn Filesystem>,
    background: Rc<dyn Background>,
    rng_seed: Option<u64>,
    cancel: CancellationToken,
) -> Result<(), Error> {
    let mut seeds = match rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let (watch_tx, mut watch_rx) = mpsc::unbounded_channel();
    let mut desktop = Profile::desktop(
        Rc::clone(&settings),
        Rc::clone(&fs),
        Rc::clone(&background),
        StdRng::seed_from_u64(seeds.next_u64()),
        watch_tx.clone(),
    );
    let mut lockscreen = Profile::lockscreen(
        Rc::clone(&settings),
        Rc::clone(&fs),
        Rc::clone(&background),
        StdRng::seed_from_u64(seeds.next_u64()),
        watch_tx,
    );

    let mut setting_rx = settings.subscribe();
    let mut desktop_changed = desktop.subscribe_changed();

    match desktop.load() {
        Ok(RotationStatus::Rotating) => {}
        Ok(RotationStatus::Single) => {
            warn!(profile = %desktop.profile_name(), "single wallpaper, rotation disabled")
        }
        Err(err) => warn!(error = %err, "desktop profile failed to load"),
    }
    if !lockscreen.is_inherited() && settings.update_lockscreen() {
        if let Err(err) = lockscreen.load() {
            warn!(error = %err, "lock-screen profile failed to load");
        }
    }

    // Apply a wallpaper right away; nothing was showing before us, so
    // there is nothing worth recording in the history.
    if settings.auto_rotate() && desktop.loaded() {
        if let Err(err) = desktop.next(false) {
            warn!(error = %err, "initial rotation failed");
        }
    }

    let mut timer = rotation_timer(&settings);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("cancel received, shutting down");
                break;
            }

            res = &mut ctrl_c => {
                if let Err(err) = res {
                    warn!(error = %err, "cannot listen for ctrl-c");
                }
                info!("interrupt received, shutting down");
                break;
            }

            _ = timer.tick() => {
                if settings.timer_enabled() && desktop.loaded() {
                    if let Err(err) = desktop.next(true) {
                        warn!(error = %err, "timed rotation failed");
                    }
                }
            }

            Some(change) = setting_rx.recv() => {
                if matches!(change, SettingChange::Interval | SettingChange::TimerEnabled) {
                    timer = rotation_timer(&settings);
                }
                if let Err(err) = desktop.handle_setting_change(change) {
                    warn!(error = %err, "desktop profile could not apply setting change");
                }
                if let Err(err) = lockscreen.handle_setting_change(change) {
                    warn!(error = %err, "lock-screen profile could not apply setting change");
                }
            }

            Some(dir_change) = watch_rx.recv() => {
                desktop.handle_directory_change(&dir_change);
                lockscreen.handle_directory_change(&dir_change);
            }

            Some(uri) = desktop_changed.recv() => {
                lockscreen.mirror(&uri);
            }
        }
    }

    // Unload persists the desktop queue position when remember-state is
    // enabled.
    desktop.unload();
    lockscreen.unload();
    Ok(())
}
