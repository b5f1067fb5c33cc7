//! Persisted rotation state, so the queue position survives a restart.

use tracing::{debug, info, warn};

use crate::queue::BoundedDeque;
use crate::settings::Settings;

/// Write `(preview, current)` for `profile` into the settings store,
/// overwriting any prior entry. A profile with an empty lookahead queue has
/// no meaningful position to keep, so nothing is written.
pub fn save(settings: &Settings, profile: &str, lookahead: &BoundedDeque, current: &str) {
    let Some(preview) = lookahead.preview() else {
        warn!(profile, "lookahead queue is empty, not saving rotation state");
        return;
    };
    let previous = settings.put_profile_state(profile, (preview.to_string(), current.to_string()));
    if let Some((old_preview, old_current)) = previous {
        debug!(
            profile,
            old_preview, old_current, "overwriting previously saved rotation state"
        );
    }
    info!(profile, preview, current, "saved rotation state");
}

/// Consume any persisted state for `profile` into the lookahead queue.
/// The entry is removed from the store, so a second restore finds nothing.
///
/// The current wallpaper lands at the tail: the first `next()` after a
/// restart re-applies what was showing at save time, and the one after
/// that shows the wallpaper that was previewed.
pub fn restore(settings: &Settings, profile: &str, lookahead: &mut BoundedDeque) -> bool {
    match settings.take_profile_state(profile) {
        Some((preview, current)) => {
            info!(profile, preview, current, "restoring saved rotation state");
            lookahead.restore(vec![preview, current]);
            true
        }
        None => {
            debug!(profile, "no saved rotation state");
            false
        }
    }
}
