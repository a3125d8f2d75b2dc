//! End-to-end pipeline runs against a fake hub and fake host tools.

use std::cell::RefCell;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use kernel_config_base::koji::{BuildTarget, TaggedBuild};
use kernel_config_base::{
    BuildService, CommandOutput, CommandRunner, CommandSpec, Pipeline, PipelineError,
    PipelineOptions, PipelineOutcome, Settings, Stage,
};
use tempfile::TempDir;

const PACKAGED_CONFIG: &str = "# Fedora packaged\nCONFIG_64BIT=y\nCONFIG_FEDORA_ONLY=y\n";

struct FakeKoji {
    targets: Vec<&'static str>,
    /// (tag, version, release)
    builds: Vec<(&'static str, &'static str, &'static str)>,
    calls: RefCell<usize>,
}

impl FakeKoji {
    fn new(
        targets: Vec<&'static str>,
        builds: Vec<(&'static str, &'static str, &'static str)>,
    ) -> Self {
        Self {
            targets,
            builds,
            calls: RefCell::new(0),
        }
    }
}

impl BuildService for FakeKoji {
    fn build_targets(&self) -> Result<Vec<BuildTarget>> {
        *self.calls.borrow_mut() += 1;
        Ok(self
            .targets
            .iter()
            .map(|name| BuildTarget {
                name: name.to_string(),
            })
            .collect())
    }

    fn tagged_builds(&self, tag: &str, _package: &str) -> Result<Vec<TaggedBuild>> {
        *self.calls.borrow_mut() += 1;
        Ok(self
            .builds
            .iter()
            .enumerate()
            .filter(|(_, (t, _, _))| *t == tag)
            .map(|(i, (_, version, release))| TaggedBuild {
                version: version.to_string(),
                release: release.to_string(),
                build_id: i as i64,
            })
            .collect())
    }
}

/// Plays dnf, rpmkeys, rpm2cpio, cpio and make.
struct FakeHost {
    checksig_stdout: &'static str,
    make_fails: bool,
    programs: RefCell<Vec<String>>,
}

impl FakeHost {
    fn new() -> Self {
        Self {
            checksig_stdout: "pkg.rpm.untrusted: digests signatures OK\n",
            make_fails: false,
            programs: RefCell::new(Vec::new()),
        }
    }
}

impl CommandRunner for FakeHost {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        self.programs.borrow_mut().push(spec.program.clone());
        let args = spec.args_lossy();
        match spec.program.as_str() {
            "dnf" => {
                let cwd = spec.cwd.as_ref().expect("dnf runs in scratch");
                let pkg = &args[2];
                fs::write(cwd.join(format!("{pkg}.x86_64.rpm")), b"rpm")?;
                Ok(CommandOutput::default())
            }
            "rpmkeys" if args.contains(&"--import".to_string()) => Ok(CommandOutput::default()),
            "rpmkeys" => Ok(CommandOutput::from_stdout(self.checksig_stdout)),
            "rpm2cpio" => Ok(CommandOutput::from_stdout("070701")),
            "cpio" => {
                assert_eq!(
                    args.last().unwrap(),
                    "./lib/modules/6.2-300.fc39.x86_64/config"
                );
                Ok(CommandOutput::from_stdout(PACKAGED_CONFIG))
            }
            "make" => {
                if self.make_fails {
                    bail!("'make olddefconfig' failed with exit status: 2");
                }
                let config = spec.cwd.as_ref().unwrap().join(".config");
                let seed = fs::read_to_string(&config)?;
                let kept: String = seed
                    .lines()
                    .filter(|l| !l.contains("FEDORA_ONLY"))
                    .map(|l| format!("{l}\n"))
                    .collect();
                fs::write(
                    &config,
                    format!(
                        "#\n# Automatically generated file; DO NOT EDIT.\n# Linux/x86 6.1.0 Kernel Configuration\n#\n{kept}CONFIG_NEW_IN_6_1=y\n"
                    ),
                )?;
                Ok(CommandOutput::default())
            }
            other => bail!("unexpected command '{other}'"),
        }
    }
}

struct Fixture {
    _root: TempDir,
    kernel_dir: PathBuf,
    keys_dir: PathBuf,
    scratch_base: PathBuf,
}

impl Fixture {
    fn new(version: &str) -> Self {
        let root = TempDir::new().unwrap();
        let kernel_dir = root.path().join("linux");
        let keys_dir = root.path().join("keys");
        let scratch_base = root.path().join("scratch");
        fs::create_dir_all(&kernel_dir).unwrap();
        fs::create_dir_all(&keys_dir).unwrap();

        fs::write(kernel_dir.join("version"), format!("{version}\n")).unwrap();
        write_source_archive(
            &kernel_dir.join(format!("linux-{version}.tar")),
            &format!("linux-{version}"),
        );
        fs::write(
            keys_dir.join("RPM-GPG-KEY-fedora-39-primary"),
            "-----BEGIN PGP PUBLIC KEY BLOCK-----\n",
        )
        .unwrap();

        Self {
            _root: root,
            kernel_dir,
            keys_dir,
            scratch_base,
        }
    }

    fn settings(&self) -> Settings {
        Settings {
            scratch_base: Some(self.scratch_base.clone()),
            ..Settings::default()
        }
    }

    fn options(&self) -> PipelineOptions {
        PipelineOptions {
            kernel_dir: self.kernel_dir.clone(),
            keys_dir: self.keys_dir.clone(),
            include_rc: false,
            include_testing: false,
            check_host_tools: false,
        }
    }

    fn config_base(&self) -> PathBuf {
        self.kernel_dir.join("config-base")
    }

    fn scratch_is_clean(&self) -> bool {
        !self.scratch_base.exists() || fs::read_dir(&self.scratch_base).unwrap().count() == 0
    }
}

fn write_source_archive(path: &Path, top: &str) {
    let mut builder = tar::Builder::new(File::create(path).unwrap());
    let makefile = b"VERSION = 6\nPATCHLEVEL = 1\n";
    let mut header = tar::Header::new_gnu();
    header.set_size(makefile.len() as u64);
    header.set_mode(0o644);
    builder
        .append_data(&mut header, format!("{top}/Makefile"), &makefile[..])
        .unwrap();
    builder.finish().unwrap();
}

fn fedora_39_koji() -> FakeKoji {
    FakeKoji::new(
        vec!["f39", "f39-candidate", "rawhide"],
        vec![
            ("f39", "6.1", "100.fc39"),
            ("f39-updates", "6.2", "300.fc39"),
        ],
    )
}

#[test]
fn selects_verifies_and_writes_config_base() {
    let fx = Fixture::new("6.1");
    let koji = fedora_39_koji();
    let host = FakeHost::new();
    let settings = fx.settings();

    let outcome = Pipeline::new(&koji, &host, &settings)
        .run(&fx.options())
        .unwrap();

    let PipelineOutcome::Written { package, path, sha256 } = outcome else {
        panic!("expected a written config-base");
    };
    assert_eq!(package, "kernel-core-6.2-300.fc39");
    assert_eq!(path, fx.config_base());
    assert_eq!(sha256.len(), 64);

    let written = fs::read_to_string(&path).unwrap();
    assert!(written.starts_with(
        "# Base config based on Fedora's config (kernel-core-6.2-300.fc39.rpm)\n"
    ));
    assert!(written.ends_with(
        "small version difference.\n# Fedora packaged\nCONFIG_64BIT=y\nCONFIG_NEW_IN_6_1=y\n"
    ));
    assert!(!written.contains("Automatically generated"));
    assert!(!written.contains("FEDORA_ONLY"));

    assert_eq!(
        *host.programs.borrow(),
        vec!["dnf", "rpmkeys", "rpmkeys", "rpm2cpio", "cpio", "make"]
    );
    assert!(fx.scratch_is_clean());
}

#[test]
fn identical_inputs_give_identical_output() {
    let fx = Fixture::new("6.1");
    let koji = fedora_39_koji();
    let host = FakeHost::new();
    let settings = fx.settings();
    let pipeline = Pipeline::new(&koji, &host, &settings);

    pipeline.run(&fx.options()).unwrap();
    let first = fs::read(fx.config_base()).unwrap();
    pipeline.run(&fx.options()).unwrap();
    let second = fs::read(fx.config_base()).unwrap();

    assert_eq!(first, second);
}

#[test]
fn no_close_build_reports_no_update_without_downloading() {
    let fx = Fixture::new("6.1");
    let koji = FakeKoji::new(
        vec!["f39", "f40"],
        vec![("f39", "6.0", "300.fc39"), ("f40-updates", "6.3", "200.fc40")],
    );
    let host = FakeHost::new();
    let settings = fx.settings();

    let outcome = Pipeline::new(&koji, &host, &settings)
        .run(&fx.options())
        .unwrap();

    assert_eq!(outcome, PipelineOutcome::NoUpdate);
    assert!(host.programs.borrow().is_empty());
    assert!(!fx.config_base().exists());
}

#[test]
fn only_release_candidates_reports_no_update() {
    let fx = Fixture::new("6.1");
    let koji = FakeKoji::new(vec!["f39"], vec![("f39", "6.2", "0.rc5.fc39")]);
    let host = FakeHost::new();
    let settings = fx.settings();

    let outcome = Pipeline::new(&koji, &host, &settings)
        .run(&fx.options())
        .unwrap();

    assert_eq!(outcome, PipelineOutcome::NoUpdate);
}

#[test]
fn empty_service_is_a_discovery_failure() {
    let fx = Fixture::new("6.1");
    let koji = FakeKoji::new(vec!["f39"], Vec::new());
    let host = FakeHost::new();
    let settings = fx.settings();

    let err = Pipeline::new(&koji, &host, &settings)
        .run(&fx.options())
        .unwrap_err();

    assert!(matches!(err, PipelineError::NoBuilds));
}

#[test]
fn bad_signature_leaves_previous_config_base_untouched() {
    let fx = Fixture::new("6.1");
    fs::write(fx.config_base(), "previous\n").unwrap();
    let koji = fedora_39_koji();
    let host = FakeHost {
        checksig_stdout: "pkg.rpm.untrusted: digests SIGNATURES NOT OK\n",
        ..FakeHost::new()
    };
    let settings = fx.settings();

    let err = Pipeline::new(&koji, &host, &settings)
        .run(&fx.options())
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Verify));
    assert!(err.to_string().starts_with("signature check failed"));
    assert_eq!(fs::read_to_string(fx.config_base()).unwrap(), "previous\n");
    assert!(!host.programs.borrow().contains(&"rpm2cpio".to_string()));
    assert!(fx.scratch_is_clean());
}

#[test]
fn normalization_failure_is_a_regenerate_error() {
    let fx = Fixture::new("6.1");
    fs::write(fx.config_base(), "previous\n").unwrap();
    let koji = fedora_39_koji();
    let host = FakeHost {
        make_fails: true,
        ..FakeHost::new()
    };
    let settings = fx.settings();

    let err = Pipeline::new(&koji, &host, &settings)
        .run(&fx.options())
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Regenerate));
    assert_eq!(fs::read_to_string(fx.config_base()).unwrap(), "previous\n");
    assert!(fx.scratch_is_clean());
}

#[test]
fn missing_key_file_fails_before_download() {
    let fx = Fixture::new("6.1");
    fs::remove_file(fx.keys_dir.join("RPM-GPG-KEY-fedora-39-primary")).unwrap();
    let koji = fedora_39_koji();
    let host = FakeHost::new();
    let settings = fx.settings();

    let err = Pipeline::new(&koji, &host, &settings)
        .run(&fx.options())
        .unwrap_err();

    assert!(matches!(err, PipelineError::MissingPrerequisite(_)));
    assert!(err.to_string().contains("RPM-GPG-KEY-fedora-39-primary"));
    assert!(host.programs.borrow().is_empty());
}

#[test]
fn missing_version_file_fails_before_any_network_call() {
    let fx = Fixture::new("6.1");
    fs::remove_file(fx.kernel_dir.join("version")).unwrap();
    let koji = fedora_39_koji();
    let host = FakeHost::new();
    let settings = fx.settings();

    let err = Pipeline::new(&koji, &host, &settings)
        .run(&fx.options())
        .unwrap_err();

    assert!(matches!(err, PipelineError::MissingPrerequisite(_)));
    assert_eq!(*koji.calls.borrow(), 0);
}

#[test]
fn unusable_scratch_base_is_a_scratch_error_before_download() {
    let fx = Fixture::new("6.1");
    fs::write(&fx.scratch_base, "not a directory").unwrap();
    let koji = fedora_39_koji();
    let host = FakeHost::new();
    let settings = fx.settings();

    let err = Pipeline::new(&koji, &host, &settings)
        .run(&fx.options())
        .unwrap_err();

    assert_eq!(err.stage(), Some(Stage::Scratch));
    assert!(err.to_string().starts_with("scratch setup failed"));
    assert!(host.programs.borrow().is_empty());
}
