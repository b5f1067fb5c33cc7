use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::rc::Rc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tempfile::TempDir;
use tokio::sync::mpsc;
use wallshift::background::{Background, MemoryBackground, Target};
use wallshift::fs::{Filesystem, LocalFilesystem, path_to_uri};
use wallshift::profile::Profile;
use wallshift::settings::{Location, SettingChange, Settings, SettingsData};

fn touch(path: &Path) {
    fs::write(path, b"not really an image").unwrap();
}

fn populated_dir(names: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for name in names {
        touch(&dir.path().join(name));
    }
    dir
}

struct Fixture {
    settings: Rc<Settings>,
    background: Rc<MemoryBackground>,
    fs: Rc<LocalFilesystem>,
    watch_tx: mpsc::UnboundedSender<wallshift::DirectoryChange>,
    _watch_rx: mpsc::UnboundedReceiver<wallshift::DirectoryChange>,
}

fn fixture(data: SettingsData) -> Fixture {
    let (watch_tx, _watch_rx) = mpsc::unbounded_channel();
    Fixture {
        settings: Rc::new(Settings::in_memory(data)),
        background: Rc::new(MemoryBackground::new()),
        fs: Rc::new(LocalFilesystem::new()),
        watch_tx,
        _watch_rx,
    }
}

fn settings_data(profiles: BTreeMap<String, Vec<Location>>) -> SettingsData {
    SettingsData {
        current_profile: "test".to_string(),
        random: false,
        profiles,
        ..SettingsData::default()
    }
}

fn profile_map(entries: &[(&str, &TempDir)]) -> BTreeMap<String, Vec<Location>> {
    entries
        .iter()
        .map(|(name, dir)| {
            (
                (*name).to_string(),
                vec![Location {
                    uri: path_to_uri(dir.path()),
                    recursive: true,
                }],
            )
        })
        .collect()
}

fn desktop(fx: &Fixture) -> Profile {
    Profile::desktop(
        Rc::clone(&fx.settings),
        Rc::clone(&fx.fs) as Rc<dyn Filesystem>,
        Rc::clone(&fx.background) as Rc<dyn Background>,
        StdRng::seed_from_u64(7),
        fx.watch_tx.clone(),
    )
}

fn lockscreen(fx: &Fixture) -> Profile {
    Profile::lockscreen(
        Rc::clone(&fx.settings),
        Rc::clone(&fx.fs) as Rc<dyn Filesystem>,
        Rc::clone(&fx.background) as Rc<dyn Background>,
        StdRng::seed_from_u64(11),
        fx.watch_tx.clone(),
    )
}

#[test]
fn desktop_saves_state_on_unload_when_remembering() {
    let dir = populated_dir(&["a.jpg", "b.jpg"]);
    let mut data = settings_data(profile_map(&[("test", &dir)]));
    data.remember_profile_state = true;
    let fx = fixture(data);

    let mut profile = desktop(&fx);
    profile.load().unwrap();
    profile.next(false).unwrap();
    let preview = profile.preview().unwrap();
    let current = fx.background.get(Target::Desktop);

    profile.unload();
    assert_eq!(
        fx.settings.take_profile_state("test"),
        Some((preview, current))
    );
}

#[test]
fn desktop_does_not_save_state_when_flag_is_off() {
    let dir = populated_dir(&["a.jpg", "b.jpg"]);
    let fx = fixture(settings_data(profile_map(&[("test", &dir)])));

    let mut profile = desktop(&fx);
    profile.load().unwrap();
    profile.next(false).unwrap();
    profile.unload();

    assert!(!fx.settings.has_profile_state("test"));
}

#[test]
fn profile_name_change_saves_old_state_and_reloads() {
    let dir_a = populated_dir(&["a.jpg", "b.jpg"]);
    let dir_b = populated_dir(&["c.jpg", "d.jpg"]);
    let mut data = settings_data(profile_map(&[("test", &dir_a), ("other", &dir_b)]));
    data.remember_profile_state = true;
    let fx = fixture(data);

    let mut profile = desktop(&fx);
    profile.load().unwrap();
    profile.next(false).unwrap();

    fx.settings.set_current_profile("other");
    profile
        .handle_setting_change(SettingChange::CurrentProfile)
        .unwrap();

    assert_eq!(profile.profile_name(), "other");
    assert!(profile.loaded());
    // The old profile's position was captured before switching.
    assert!(fx.settings.has_profile_state("test"));
    assert_eq!(
        profile.preview().unwrap(),
        path_to_uri(&dir_b.path().join("c.jpg"))
    );
}

#[test]
fn inherited_lockscreen_mirrors_the_desktop() {
    let fx = fixture(SettingsData::default());

    let mut profile = lockscreen(&fx);
    assert!(profile.is_inherited());
    profile.load().unwrap();
    assert!(!profile.loaded());

    profile.mirror("file:///w/x.jpg");
    assert_eq!(fx.background.get(Target::Lockscreen), "file:///w/x.jpg");
}

#[test]
fn mirroring_respects_the_update_lockscreen_flag() {
    let mut data = SettingsData::default();
    data.update_lockscreen = false;
    let fx = fixture(data);

    let mut profile = lockscreen(&fx);
    profile.mirror("file:///w/x.jpg");
    assert_eq!(fx.background.get(Target::Lockscreen), "");
}

#[test]
fn mirroring_respects_the_auto_rotate_flag() {
    let mut data = SettingsData::default();
    data.auto_rotate = false;
    let fx = fixture(data);

    let mut profile = lockscreen(&fx);
    profile.mirror("file:///w/x.jpg");
    assert_eq!(fx.background.get(Target::Lockscreen), "");
}

#[test]
fn explicit_lockscreen_profile_rotates_instead_of_mirroring() {
    let dir = populated_dir(&["a.jpg", "b.jpg"]);
    let mut data = settings_data(profile_map(&[("test", &dir)]));
    data.lockscreen_profile = "test".to_string();
    let fx = fixture(data);

    let mut profile = lockscreen(&fx);
    assert!(!profile.is_inherited());
    profile.load().unwrap();
    assert!(profile.loaded());
    assert!(profile.preview().is_some());

    profile.mirror("file:///w/x.jpg");
    assert_eq!(fx.background.get(Target::Lockscreen), "");
}

#[test]
fn update_lockscreen_toggle_unloads_and_reloads() {
    let dir = populated_dir(&["a.jpg", "b.jpg"]);
    let mut data = settings_data(profile_map(&[("test", &dir)]));
    data.lockscreen_profile = "test".to_string();
    let fx = fixture(data);

    let mut profile = lockscreen(&fx);
    profile.load().unwrap();
    assert!(profile.loaded());

    fx.settings.set_update_lockscreen(false);
    profile
        .handle_setting_change(SettingChange::UpdateLockscreen)
        .unwrap();
    assert!(!profile.loaded());

    fx.settings.set_update_lockscreen(true);
    profile
        .handle_setting_change(SettingChange::UpdateLockscreen)
        .unwrap();
    assert!(profile.loaded());
}

#[test]
fn lockscreen_profile_change_switches_to_inherited_mode() {
    let dir = populated_dir(&["a.jpg", "b.jpg"]);
    let mut data = settings_data(profile_map(&[("test", &dir)]));
    data.lockscreen_profile = "test".to_string();
    let fx = fixture(data);

    let mut profile = lockscreen(&fx);
    profile.load().unwrap();
    assert!(profile.loaded());

    fx.settings.set_lockscreen_profile("");
    profile
        .handle_setting_change(SettingChange::LockscreenProfile)
        .unwrap();
    assert!(!profile.loaded());
    assert!(profile.is_inherited());

    profile.mirror("file:///w/x.jpg");
    assert_eq!(fx.background.get(Target::Lockscreen), "file:///w/x.jpg");
}
