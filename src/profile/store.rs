//! Loading and persisting profiles.
use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use super::Profile;
use crate::config::ini;
use crate::config::settings::PROFILE_FILE;
use crate::error::ProfileError;
use crate::logging::Log;

/// Storage for named profiles.
#[cfg_attr(test, mockall::automock)]
pub trait ProfileStore {
    /// Name of the profile this store manages.
    fn profile_name(&self) -> String;

    /// Load the profile called `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::NotFound`] if the profile does not exist, and
    /// another variant if it exists but cannot be read or interpreted.
    fn load(&self, name: &str) -> Result<Profile, ProfileError>;

    /// Persist `profile` under its name, replacing any previous version.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be rendered or written.
    fn save(&self, profile: &Profile) -> Result<(), ProfileError>;
}

/// Load the managed profile, starting from an empty one if it does not exist.
///
/// # Errors
///
/// Returns any load error other than [`ProfileError::NotFound`].
pub fn load_managed(
    store: &dyn ProfileStore,
    summary: &str,
    log: &dyn Log,
) -> Result<Profile, ProfileError> {
    let name = store.profile_name();
    match store.load(&name) {
        Ok(profile) => {
            log.debug(&format!(
                "loaded profile [{name}] with {} section(s)",
                profile.sections.len()
            ));
            Ok(profile)
        }
        Err(e) if e.is_not_found() => {
            log.info(&format!("profile [{name}] does not exist, creating it"));
            Ok(Profile::new(name, summary))
        }
        Err(e) => Err(e),
    }
}

/// Profiles stored as `<tuned_dir>/<name>/tuned.conf`.
#[derive(Debug, Clone)]
pub struct FileProfileStore {
    tuned_dir: PathBuf,
    profile_name: String,
}

impl FileProfileStore {
    #[must_use]
    pub fn new(tuned_dir: impl Into<PathBuf>, profile_name: impl Into<String>) -> Self {
        Self {
            tuned_dir: tuned_dir.into(),
            profile_name: profile_name.into(),
        }
    }

    /// Path of the profile file for `name`.
    #[must_use]
    pub fn profile_path(&self, name: &str) -> PathBuf {
        self.tuned_dir.join(name).join(PROFILE_FILE)
    }
}

impl ProfileStore for FileProfileStore {
    fn profile_name(&self) -> String {
        self.profile_name.clone()
    }

    fn load(&self, name: &str) -> Result<Profile, ProfileError> {
        let path = self.profile_path(name);
        let content = std::fs::read_to_string(&path).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                ProfileError::NotFound {
                    name: name.to_string(),
                }
            } else {
                ProfileError::Io {
                    name: name.to_string(),
                    path: path.clone(),
                    source,
                }
            }
        })?;
        let document =
            ini::parse_kv_sections_from_str(&content).map_err(|e| ProfileError::Malformed {
                name: name.to_string(),
                reason: format!("{e:#}"),
            })?;
        Profile::from_kv(name, document)
    }

    fn save(&self, profile: &Profile) -> Result<(), ProfileError> {
        let content = profile.to_ini()?;
        let path = self.profile_path(&profile.name);
        write_atomic(&path, &content).map_err(|source| ProfileError::Persist { path, source })
    }
}

/// Write `content` to a temporary file next to `path` and rename it over
/// `path`, creating the parent directory if needed.
pub(crate) fn write_atomic(path: &Path, content: &str) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(dir)?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        tmp.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))?;
    }
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::logging::isolated_logger;
    use crate::profile::Section;

    fn store(dir: &Path) -> FileProfileStore {
        FileProfileStore::new(dir, "kernel_settings")
    }

    fn write_profile(dir: &Path, name: &str, content: &str) {
        let profile_dir = dir.join(name);
        std::fs::create_dir_all(&profile_dir).expect("create profile dir");
        std::fs::write(profile_dir.join(PROFILE_FILE), content).expect("write profile");
    }

    #[test]
    fn load_missing_profile_is_not_found() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let err = store(dir.path()).load("junk").unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "Error loading tuned profile [junk]: Profile does not exist"
        );
    }

    #[test]
    fn load_directory_without_file_is_not_found() {
        let dir = tempfile::tempdir().expect("create temp dir");
        std::fs::create_dir_all(dir.path().join("no_profile_file")).expect("mkdir");
        assert!(
            store(dir.path())
                .load("no_profile_file")
                .unwrap_err()
                .is_not_found()
        );
    }

    #[test]
    fn load_empty_file_is_malformed() {
        let dir = tempfile::tempdir().expect("create temp dir");
        write_profile(dir.path(), "empty_profile_file", "");
        let err = store(dir.path()).load("empty_profile_file").unwrap_err();
        assert!(matches!(err, ProfileError::Malformed { .. }));
        assert!(err.to_string().starts_with("Error loading tuned profile"));
    }

    #[test]
    fn load_garbage_is_malformed() {
        let dir = tempfile::tempdir().expect("create temp dir");
        write_profile(dir.path(), "bogus", "[main]\nthis is not a setting\n");
        let err = store(dir.path()).load("bogus").unwrap_err();
        assert!(matches!(err, ProfileError::Malformed { .. }));
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = store(dir.path());
        let mut profile = Profile::new("kernel_settings", "kernel settings");
        profile.sections.insert(
            "bootloader".to_string(),
            [("cmdline", "spectre_v2=off nopti value='has spaces'")]
                .into_iter()
                .collect::<Section>(),
        );
        store.save(&profile).expect("save");
        assert_eq!(store.load("kernel_settings").expect("load"), profile);
    }

    #[test]
    fn save_replaces_existing_file() {
        let dir = tempfile::tempdir().expect("create temp dir");
        write_profile(dir.path(), "kernel_settings", "[main]\nsummary = old\n");
        let store = store(dir.path());
        store
            .save(&Profile::new("kernel_settings", "new"))
            .expect("save");
        let content =
            std::fs::read_to_string(store.profile_path("kernel_settings")).expect("read");
        assert!(content.contains("summary = new"));
        assert!(!content.contains("old"));
    }

    #[test]
    fn load_managed_creates_profile_when_missing() {
        let (log, _tmp, _guard) = isolated_logger();
        let mut mock = MockProfileStore::new();
        mock.expect_profile_name()
            .return_const("kernel_settings".to_string());
        mock.expect_load().returning(|name| {
            Err(ProfileError::NotFound {
                name: name.to_string(),
            })
        });
        let profile = load_managed(&mock, "kernel settings", &log).expect("load");
        assert_eq!(profile, Profile::new("kernel_settings", "kernel settings"));
    }

    #[test]
    fn load_managed_propagates_other_errors() {
        let (log, _tmp, _guard) = isolated_logger();
        let mut mock = MockProfileStore::new();
        mock.expect_profile_name().return_const("bogus".to_string());
        mock.expect_load().returning(|name| {
            Err(ProfileError::Malformed {
                name: name.to_string(),
                reason: "[main] has no summary".to_string(),
            })
        });
        assert!(matches!(
            load_managed(&mock, "kernel settings", &log),
            Err(ProfileError::Malformed { .. })
        ));
    }
}
