//! Environment step driver.
//!
//! Sequences the external tool invocations (git, make, venv/pip) that must
//! run before stub generation, plus the generation run itself. The steps are
//! an explicit ordered list built at a single call site and consumed by a
//! small dispatcher: `all` runs every ordered step in sequence, `cleanup`
//! only runs when named directly. Any external command failure is fatal; no
//! partial-progress resume is supported.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;

pub const DEFAULT_FIRMWARE_VERSION: &str = "9.2.9";
pub const DEFAULT_FIRMWARE_REPO_URL: &str = "https://github.com/adafruit/circuitpython.git";
pub const DEFAULT_PYTHON: &str = "python3.12";

const MIN_PYTHON: (u64, u64, u64) = (3, 11, 0);
const MIN_NODE: (u64, u64, u64) = (22, 18, 0);
const MIN_NPM: (u64, u64, u64) = (10, 9, 3);

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unknown step: {0}")]
    UnknownStep(String),
    #[error("command `{command}` exited with {status}")]
    CommandFailed {
        command: String,
        status: std::process::ExitStatus,
    },
    #[error("version check failed: {0}")]
    VersionCheck(String),
    #[error("firmware checkout missing at {0}; run the clone-repo step first")]
    MissingFirmware(PathBuf),
    #[error("{0}")]
    Generate(#[from] boardstubs::StubGenError),
}

/// Tool configuration shared by every step.
#[derive(Debug, Clone)]
pub struct StepConfig {
    pub repo_root: PathBuf,
    pub firmware_version: String,
    pub firmware_repo_url: String,
    pub python: String,
}

impl StepConfig {
    pub fn firmware_dir(&self) -> PathBuf {
        self.repo_root.join("circuitpython")
    }

    pub fn venv_dir(&self) -> PathBuf {
        self.firmware_dir().join(".venv")
    }

    // Unix layout first, Windows "scripts" layout as the fallback.
    fn venv_tool(&self, tool: &str) -> PathBuf {
        let bin = self.venv_dir().join("bin");
        if bin.is_dir() {
            bin.join(tool)
        } else {
            self.venv_dir().join("scripts").join(tool)
        }
    }

    pub fn venv_python(&self) -> PathBuf {
        self.venv_tool("python")
    }

    pub fn venv_pip(&self) -> PathBuf {
        self.venv_tool("pip")
    }
}

/// Working directory requirement for a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Workdir {
    RepoRoot,
    Firmware,
}

/// One named step descriptor.
pub struct Step {
    pub name: &'static str,
    pub about: &'static str,
    pub workdir: Workdir,
    /// Whether the step is part of the ordered `all` sequence.
    pub in_all: bool,
    run: fn(&StepConfig, &Path) -> Result<(), StepError>,
}

/// The full step list in execution order. Order and membership are fixed
/// here and nowhere else.
pub fn steps() -> Vec<Step> {
    vec![
        Step {
            name: "check-versions",
            about: "Verify python/node/npm meet the minimum versions",
            workdir: Workdir::RepoRoot,
            in_all: true,
            run: check_versions,
        },
        Step {
            name: "clone-repo",
            about: "Clone the firmware repository, check out the pinned version, fetch submodules",
            workdir: Workdir::RepoRoot,
            in_all: true,
            run: clone_repo,
        },
        Step {
            name: "setup-venv",
            about: "Create the firmware virtualenv and install build requirements",
            workdir: Workdir::Firmware,
            in_all: true,
            run: setup_venv,
        },
        Step {
            name: "make-stubs",
            about: "Run the firmware stub build (make stubs)",
            workdir: Workdir::Firmware,
            in_all: true,
            run: make_stubs,
        },
        Step {
            name: "copy-stubs",
            about: "Copy the generated firmware stubs into the repository stubs directory",
            workdir: Workdir::Firmware,
            in_all: true,
            run: copy_stubs,
        },
        Step {
            name: "build-boards",
            about: "Generate the per-board stub files and metadata index",
            workdir: Workdir::RepoRoot,
            in_all: true,
            run: build_boards,
        },
        Step {
            name: "cleanup",
            about: "Remove the firmware virtualenv (not part of `all`)",
            workdir: Workdir::RepoRoot,
            in_all: false,
            run: cleanup,
        },
    ]
}

/// Run one step by name, or the full ordered sequence for `all`.
pub fn run_step(name: &str, config: &StepConfig) -> Result<(), StepError> {
    if name == "all" {
        return run_all(config);
    }
    let step = steps()
        .into_iter()
        .find(|step| step.name == name)
        .ok_or_else(|| StepError::UnknownStep(name.to_string()))?;
    execute(&step, config)
}

/// Run every ordered step in sequence, stopping at the first failure.
pub fn run_all(config: &StepConfig) -> Result<(), StepError> {
    for step in steps().into_iter().filter(|step| step.in_all) {
        execute(&step, config)?;
    }
    Ok(())
}

fn execute(step: &Step, config: &StepConfig) -> Result<(), StepError> {
    let dir = match step.workdir {
        Workdir::RepoRoot => config.repo_root.clone(),
        Workdir::Firmware => {
            let firmware = config.firmware_dir();
            if !firmware.is_dir() {
                return Err(StepError::MissingFirmware(firmware));
            }
            firmware
        }
    };
    tracing::info!("running step {} in {}", step.name, dir.display());
    (step.run)(config, &dir)
}

fn check_versions(config: &StepConfig, dir: &Path) -> Result<(), StepError> {
    check_version(dir, &config.python, MIN_PYTHON)?;
    check_version(dir, "node", MIN_NODE)?;
    check_version(dir, "npm", MIN_NPM)?;
    Ok(())
}

fn clone_repo(config: &StepConfig, dir: &Path) -> Result<(), StepError> {
    let firmware = config.firmware_dir();
    if !firmware.is_dir() {
        run_command(
            dir,
            "git",
            [
                OsStr::new("clone"),
                OsStr::new(config.firmware_repo_url.as_str()),
                firmware.as_os_str(),
            ],
        )?;
    }
    run_command(&firmware, "git", ["checkout", config.firmware_version.as_str()])?;
    run_command(&firmware, "make", ["fetch-all-submodules"])?;
    Ok(())
}

fn setup_venv(config: &StepConfig, dir: &Path) -> Result<(), StepError> {
    let venv = config.venv_dir();
    if !venv.is_dir() {
        run_command(
            dir,
            &config.python,
            [OsStr::new("-m"), OsStr::new("venv"), venv.as_os_str()],
        )?;
    }
    let python = config.venv_python();
    run_command(
        dir,
        &python.to_string_lossy(),
        ["-m", "pip", "install", "--upgrade", "pip", "wheel"],
    )?;
    let pip = config.venv_pip();
    let pip = pip.to_string_lossy();
    run_command(dir, &pip, ["install", "-r", "requirements-doc.txt"])?;
    run_command(dir, &pip, ["install", "-r", "requirements-dev.txt"])?;
    Ok(())
}

fn make_stubs(config: &StepConfig, dir: &Path) -> Result<(), StepError> {
    let python_arg = format!("PYTHON={}", config.venv_python().display());
    run_command(dir, "make", [python_arg.as_str(), "stubs"])
}

fn copy_stubs(config: &StepConfig, dir: &Path) -> Result<(), StepError> {
    let source = dir.join("circuitpython-stubs");
    let target = config.repo_root.join("stubs");
    if target.is_dir() {
        std::fs::remove_dir_all(&target)?;
    }
    copy_tree(&source, &target)?;
    Ok(())
}

fn build_boards(config: &StepConfig, _dir: &Path) -> Result<(), StepError> {
    let options = boardstubs::GenerateOptions::new(&config.repo_root);
    let summary = boardstubs::generate(&options)?;
    tracing::info!(
        "generated {} board stubs ({} skipped, {} collisions)",
        summary.boards_written,
        summary.boards_skipped,
        summary.collisions
    );
    Ok(())
}

fn cleanup(config: &StepConfig, _dir: &Path) -> Result<(), StepError> {
    let venv = config.venv_dir();
    if let Err(e) = std::fs::remove_dir_all(&venv) {
        tracing::warn!("failed to remove {}: {}", venv.display(), e);
    }
    Ok(())
}

fn run_command<I, S>(dir: &Path, program: &str, args: I) -> Result<(), StepError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<_> = args.into_iter().collect();
    let command_text = command_display(program, &args);
    tracing::debug!("executing `{}` in {}", command_text, dir.display());
    let status = Command::new(program).args(&args).current_dir(dir).status()?;
    if !status.success() {
        return Err(StepError::CommandFailed {
            command: command_text,
            status,
        });
    }
    Ok(())
}

fn command_display<S: AsRef<OsStr>>(program: &str, args: &[S]) -> String {
    let mut display = program.to_string();
    for arg in args {
        display.push(' ');
        display.push_str(&arg.as_ref().to_string_lossy());
    }
    display
}

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\w+\s+)?v?(\d+)\.(\d+)\.(\d+)").expect("valid version regex"));

/// Parse `MAJOR.MINOR.PATCH` out of a tool's version banner, tolerating a
/// leading word (`Python 3.12.1`) or `v` prefix (`v22.18.0`).
fn parse_version(text: &str) -> Option<(u64, u64, u64)> {
    let caps = VERSION_RE.captures(text.trim())?;
    Some((
        caps[1].parse().ok()?,
        caps[2].parse().ok()?,
        caps[3].parse().ok()?,
    ))
}

fn check_version(dir: &Path, program: &str, minimum: (u64, u64, u64)) -> Result<(), StepError> {
    let output = Command::new(program)
        .arg("--version")
        .current_dir(dir)
        .output()?;
    if !output.status.success() {
        return Err(StepError::CommandFailed {
            command: format!("{program} --version"),
            status: output.status,
        });
    }
    let banner = String::from_utf8_lossy(&output.stdout);
    let current = parse_version(&banner).ok_or_else(|| {
        StepError::VersionCheck(format!("{program}: unparseable version `{}`", banner.trim()))
    })?;
    if current < minimum {
        return Err(StepError::VersionCheck(format!(
            "{program}: {}.{}.{} < required {}.{}.{}",
            current.0, current.1, current.2, minimum.0, minimum.1, minimum.2
        )));
    }
    Ok(())
}

fn copy_tree(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dst)?;
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.path().is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
