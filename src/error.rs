use thiserror::Error;

/// Library error type for wallshift operations.
#[derive(Debug, Error)]
pub enum Error {
    /// The configured locations yielded no usable wallpapers; the profile
    /// stays unloaded.
    #[error("no wallpapers loaded from {locations} location(s) for profile '{profile}'")]
    NoWallpapers { profile: String, locations: usize },

    /// The requested profile name is missing from the settings store.
    #[error("profile '{0}' is not defined in the configuration")]
    UnknownProfile(String),

    /// Rewind was requested but nothing has been shown yet.
    #[error("no wallpapers in the history for profile '{profile}'")]
    EmptyHistory { profile: String },

    /// Navigation was requested before a successful load.
    #[error("profile '{profile}' is not loaded")]
    NotLoaded { profile: String },

    /// Underlying IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Directory watcher error.
    #[error(transparent)]
    Notify(#[from] notify::Error),

    /// YAML/serde configuration error.
    #[error(transparent)]
    Config(#[from] serde_yaml::Error),
}

/// Non-fatal outcome of a successful load.
///
/// A single-entry pool is usable as a static wallpaper but cannot rotate;
/// that is a condition, not a failure, so it lives on the success side of
/// the result rather than in [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationStatus {
    /// Two or more wallpapers are available; rotation works.
    Rotating,
    /// Exactly one wallpaper was found; rotation is disabled.
    Single,
}
