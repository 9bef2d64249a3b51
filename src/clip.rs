//! External clipping tool orchestration.
//!
//! Given a boundary artifact and the planet file, an external tool
//! produces the per-area extract. Two interchangeable backends are
//! supported; both use "complete ways" semantics, so a way is included
//! only when it lies wholly inside the boundary. The orchestrator never
//! recomputes an extract that already exists.

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use thiserror::Error;
use tracing::{info, warn};

/// Which external tool does the clipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipBackend {
    /// osmconvert: fast, works on the binary pbf format directly.
    OsmConvert,
    /// osmosis: generic read/filter/write pipeline, much slower.
    Osmosis,
}

impl ClipBackend {
    fn default_executable(&self) -> &'static str {
        match self {
            ClipBackend::OsmConvert => "osmconvert",
            ClipBackend::Osmosis => "osmosis",
        }
    }
}

/// How one invocation ended, when it didn't fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOutcome {
    /// The backend ran and produced the destination.
    Extracted,
    /// The destination already existed; nothing was invoked.
    AlreadyDone,
}

#[derive(Debug, Error)]
pub enum ClipError {
    #[error("clipping backend {executable:?} not found")]
    BackendUnavailable { executable: String },

    #[error("backend exited with status {status} for {dest}")]
    NonZeroExit { status: String, dest: String },

    #[error("backend exceeded {timeout:?} for {dest}; process killed")]
    TimedOut { timeout: Duration, dest: String },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// One clip request: planet in, boundary applied, extract out.
#[derive(Debug, Clone)]
pub struct ClipRequest {
    /// Code identifying the area, used for reporting.
    pub code: String,
    pub planet: PathBuf,
    pub poly: PathBuf,
    pub dest: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Clipper {
    backend: ClipBackend,
    executable: PathBuf,
    timeout: Duration,
}

impl Clipper {
    pub fn new(backend: ClipBackend, timeout: Duration) -> Self {
        Self {
            backend,
            executable: PathBuf::from(backend.default_executable()),
            timeout,
        }
    }

    /// Override the backend executable path (e.g. a local build in the
    /// scripts directory).
    pub fn with_executable(mut self, executable: impl Into<PathBuf>) -> Self {
        self.executable = executable.into();
        self
    }

    /// Clip one area. Idempotent: an existing destination is success
    /// without an invocation.
    pub fn clip(&self, request: &ClipRequest) -> Result<ClipOutcome, ClipError> {
        if request.dest.exists() {
            return Ok(ClipOutcome::AlreadyDone);
        }

        let mut command = self.build_command(request);
        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ClipError::BackendUnavailable {
                    executable: self.executable.display().to_string(),
                });
            }
            Err(e) => return Err(ClipError::Io(e)),
        };

        let status = wait_with_timeout(child, self.timeout).map_err(|e| match e {
            WaitError::TimedOut => ClipError::TimedOut {
                timeout: self.timeout,
                dest: request.dest.display().to_string(),
            },
            WaitError::Io(e) => ClipError::Io(e),
        })?;

        if !status.success() {
            return Err(ClipError::NonZeroExit {
                status: status.to_string(),
                dest: request.dest.display().to_string(),
            });
        }

        Ok(ClipOutcome::Extracted)
    }

    fn build_command(&self, request: &ClipRequest) -> Command {
        let mut command = Command::new(&self.executable);
        match self.backend {
            ClipBackend::OsmConvert => {
                command
                    .arg(&request.planet)
                    .arg(format!("-B={}", request.poly.display()))
                    .arg("--complete-ways")
                    .arg(format!("-o={}", request.dest.display()));
            }
            ClipBackend::Osmosis => {
                command
                    .arg("--read-xml")
                    .arg(format!("file={}", request.planet.display()))
                    .arg("--bounding-polygon")
                    .arg(format!("file={}", request.poly.display()))
                    .arg("completeWays=yes")
                    .arg("--write-xml")
                    .arg(format!("file={}", request.dest.display()));
            }
        }
        command.stdout(Stdio::null()).stderr(Stdio::null());
        command
    }
}

enum WaitError {
    TimedOut,
    Io(io::Error),
}

/// Poll the child until exit or deadline; kill it on expiry so a hung
/// backend can't occupy a worker slot forever.
fn wait_with_timeout(
    mut child: Child,
    timeout: Duration,
) -> Result<std::process::ExitStatus, WaitError> {
    let deadline = Instant::now() + timeout;
    loop {
        match child.try_wait().map_err(WaitError::Io)? {
            Some(status) => return Ok(status),
            None if Instant::now() >= deadline => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(WaitError::TimedOut);
            }
            None => std::thread::sleep(Duration::from_millis(200)),
        }
    }
}

/// Result of one area within a batch.
#[derive(Debug)]
pub struct BatchEntry {
    pub code: String,
    pub result: Result<ClipOutcome, ClipError>,
}

/// Fan the clipper out over a worker pool sized to the available CPU
/// parallelism minus one. Workers share nothing; failures are collected
/// per area and never abort the batch.
pub fn clip_batch(clipper: &Clipper, requests: &[ClipRequest]) -> anyhow::Result<Vec<BatchEntry>> {
    let workers = std::thread::available_parallelism()
        .map(|n| n.get().saturating_sub(1).max(1))
        .unwrap_or(1);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .context("failed to build clip worker pool")?;

    info!("Clipping {} areas on {} workers", requests.len(), workers);

    let entries = pool.install(|| {
        requests
            .par_iter()
            .map(|request| {
                let result = clipper.clip(request);
                match &result {
                    Ok(ClipOutcome::Extracted) => info!("{} finished", request.code),
                    Ok(ClipOutcome::AlreadyDone) => {
                        info!("{} already done, skipping", request.code)
                    }
                    Err(e) => warn!("{} failed: {}", request.code, e),
                }
                BatchEntry {
                    code: request.code.clone(),
                    result,
                }
            })
            .collect()
    });

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn request(dir: &Path, code: &str) -> ClipRequest {
        ClipRequest {
            code: code.to_string(),
            planet: dir.join("planet.osm.pbf"),
            poly: dir.join(format!("{}.poly", code)),
            dest: dir.join(format!("{}.osm.pbf", code)),
        }
    }

    #[test]
    fn test_existing_destination_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "NLD");
        fs::write(&req.dest, b"existing").unwrap();

        // Executable doesn't exist, proving nothing gets spawned.
        let clipper = Clipper::new(ClipBackend::OsmConvert, Duration::from_secs(5))
            .with_executable("/nonexistent/osmconvert");
        let outcome = clipper.clip(&req).unwrap();
        assert_eq!(outcome, ClipOutcome::AlreadyDone);
        assert_eq!(fs::read(&req.dest).unwrap(), b"existing");
    }

    #[test]
    fn test_missing_backend_reported() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "NLD");

        let clipper = Clipper::new(ClipBackend::OsmConvert, Duration::from_secs(5))
            .with_executable("/nonexistent/osmconvert");
        match clipper.clip(&req) {
            Err(ClipError::BackendUnavailable { executable }) => {
                assert!(executable.contains("osmconvert"));
            }
            other => panic!("expected BackendUnavailable, got {:?}", other),
        }
        assert!(!req.dest.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_non_zero_exit_reported() {
        let dir = tempfile::tempdir().unwrap();
        let req = request(dir.path(), "NLD");

        // `false` ignores the osmconvert-shaped arguments and exits 1.
        let clipper =
            Clipper::new(ClipBackend::OsmConvert, Duration::from_secs(5)).with_executable("false");
        assert!(matches!(
            clipper.clip(&req),
            Err(ClipError::NonZeroExit { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_hung_backend_times_out() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("hang.sh");
        fs::write(&script, "#!/bin/sh\nsleep 30\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let req = request(dir.path(), "NLD");
        let clipper =
            Clipper::new(ClipBackend::OsmConvert, Duration::from_millis(300)).with_executable(&script);

        let start = Instant::now();
        assert!(matches!(clipper.clip(&req), Err(ClipError::TimedOut { .. })));
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[cfg(unix)]
    #[test]
    fn test_batch_mixes_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let done = request(dir.path(), "DONE");
        fs::write(&done.dest, b"x").unwrap();
        let fresh = request(dir.path(), "FRESH");

        // `true` exits 0 regardless of arguments.
        let clipper =
            Clipper::new(ClipBackend::OsmConvert, Duration::from_secs(5)).with_executable("true");
        let entries = clip_batch(&clipper, &[done, fresh]).unwrap();

        assert_eq!(entries.len(), 2);
        for entry in entries {
            match entry.code.as_str() {
                "DONE" => assert!(matches!(entry.result, Ok(ClipOutcome::AlreadyDone))),
                "FRESH" => assert!(matches!(entry.result, Ok(ClipOutcome::Extracted))),
                other => panic!("unexpected code {}", other),
            }
        }
    }
}
