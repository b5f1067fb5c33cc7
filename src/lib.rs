pub mod background;
pub mod daemon;
pub mod engine;
pub mod error;
pub mod events;
pub mod fs;
pub mod loader;
pub mod profile;
pub mod queue;
pub mod settings;
pub mod state;

pub use background::{Background, GsettingsBackground, MemoryBackground, Target};
pub use engine::ProfileEngine;
pub use error::{Error, RotationStatus};
pub use fs::{DirectoryChange, Filesystem, LocalFilesystem};
pub use profile::{Capabilities, Profile};
pub use queue::BoundedDeque;
pub use settings::{Location, SettingChange, Settings, SettingsData};
