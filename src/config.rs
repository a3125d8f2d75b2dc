//! Pipeline settings.
//!
//! Everything has a default matching the Fedora infrastructure; a TOML file
//! may override any subset of fields.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_KOJI_SERVER: &str = "https://koji.fedoraproject.org/kojihub";

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Hub URL handed to `koji --server`.
    pub koji_server: String,
    /// Source package whose builds are listed on the hub.
    pub package: String,
    /// Binary subpackage downloaded and unpacked.
    pub core_package: String,
    pub arch: String,
    /// Key file for release N is `<keysdir>/<key_prefix>N-primary`.
    pub key_prefix: String,
    /// Parent of per-run scratch directories; `$HOME/tmp` when unset.
    pub scratch_base: Option<PathBuf>,
    /// Phrase `rpmkeys --checksig` prints when every signature verified.
    pub confirmation_phrase: String,
    /// Header lines emitted by the normalization pass and dropped afterwards.
    pub strip_lines: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            koji_server: DEFAULT_KOJI_SERVER.to_string(),
            package: "kernel".to_string(),
            core_package: "kernel-core".to_string(),
            arch: "x86_64".to_string(),
            key_prefix: "RPM-GPG-KEY-fedora-".to_string(),
            scratch_base: None,
            confirmation_phrase: "signatures OK".to_string(),
            strip_lines: 4,
        }
    }
}

impl Settings {
    /// Load settings from a TOML file, defaulting missing fields.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading settings '{}'", path.display()))?;
        let settings: Settings = toml::from_str(&text)
            .with_context(|| format!("parsing settings '{}'", path.display()))?;
        settings.validate(path)?;
        Ok(settings)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        for (field, value) in [
            ("koji_server", &self.koji_server),
            ("package", &self.package),
            ("core_package", &self.core_package),
            ("arch", &self.arch),
            ("confirmation_phrase", &self.confirmation_phrase),
        ] {
            if value.trim().is_empty() {
                bail!(
                    "invalid settings '{}': {} must not be empty",
                    path.display(),
                    field
                );
            }
        }
        Ok(())
    }

    /// Public key file for a release inside `keys_dir`.
    pub fn key_file(&self, keys_dir: &Path, release_id: u32) -> PathBuf {
        keys_dir.join(format!("{}{}-primary", self.key_prefix, release_id))
    }

    /// Where scratch directories are created for this run.
    pub fn resolve_scratch_base(&self) -> Result<PathBuf> {
        if let Some(base) = &self.scratch_base {
            return Ok(base.clone());
        }
        let home = dirs::home_dir().context("resolving home directory for scratch space")?;
        Ok(home.join("tmp"))
    }
}
