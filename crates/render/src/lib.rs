//! PDF conversion through a headless office suite.
//!
//! The converter is an opaque external program invoked as
//! `soffice --headless --convert-to pdf --outdir <dir> <input>`. It is given a
//! wall-clock budget and killed when it overruns. Scratch output lives in a
//! temporary directory that is removed on every exit path.

use slidetext_core::{Error, Result};
use std::ffi::OsString;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
#[cfg(unix)]
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

/// Default converter program, looked up on `PATH`.
pub const DEFAULT_PROGRAM: &str = "soffice";

/// Default conversion budget.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Runs the external PDF converter.
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    program: OsString,
    timeout: Duration,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self {
            program: OsString::from(DEFAULT_PROGRAM),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl PdfRenderer {
    /// Create a renderer using `soffice` with a 60 second budget.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different converter executable.
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Set the wall-clock budget for one conversion.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Convert `input` into `out_dir` and return the path of the PDF.
    ///
    /// The output path is derived from the input stem. A converter that exits
    /// successfully without producing it is treated as a failure.
    pub fn render(&self, input: &Path, out_dir: &Path) -> Result<PathBuf> {
        let expected = expected_output(input, out_dir)?;

        log::debug!(
            "Converting {} with {:?} (timeout {:?})",
            input.display(),
            self.program,
            self.timeout
        );

        let mut command = Command::new(&self.program);
        command
            .args(["--headless", "--convert-to", "pdf", "--outdir"])
            .arg(out_dir)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());
        // The soffice launcher forks the real office process; give the whole
        // tree its own group so it can be killed together.
        #[cfg(unix)]
        command.process_group(0);

        let mut child = command.spawn().map_err(|e| {
            Error::RenderFailure(format!(
                "could not start {}: {}",
                self.program.to_string_lossy(),
                e
            ))
        })?;

        // Drain stderr concurrently so a chatty converter cannot fill the pipe.
        let stderr = child.stderr.take();
        let (stderr_tx, stderr_rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = String::new();
            if let Some(mut pipe) = stderr {
                let _ = pipe.read_to_string(&mut buf);
            }
            let _ = stderr_tx.send(buf);
        });

        let deadline = Instant::now() + self.timeout;
        let Some(status) = wait_until(&mut child, deadline)? else {
            // The reader thread is left behind; it ends when the pipe closes.
            log::warn!("Conversion of {} timed out", input.display());
            return Err(Error::RenderTimeout(whole_seconds(self.timeout)));
        };

        // A forked descendant may still hold stderr open after the launcher
        // exits, so the read is bounded by the same deadline.
        let stderr = stderr_rx
            .recv_timeout(deadline.saturating_duration_since(Instant::now()).max(POLL_INTERVAL))
            .unwrap_or_default();

        if !status.success() {
            let detail = stderr.trim();
            return Err(Error::RenderFailure(if detail.is_empty() {
                format!("converter exited with {}", status)
            } else {
                format!("converter exited with {}: {}", status, detail)
            }));
        }

        if !expected.exists() {
            return Err(Error::RenderFailure("output file not found.".to_string()));
        }

        Ok(expected)
    }

    /// Convert `input` and return the PDF bytes.
    pub fn render_to_bytes(&self, input: &Path) -> Result<Vec<u8>> {
        let scratch = tempfile::tempdir()?;
        let pdf = self.render(input, scratch.path())?;
        Ok(fs::read(pdf)?)
    }

    /// Convert `input` and copy the PDF to `dest`.
    ///
    /// Nothing is written to `dest` unless the conversion succeeds.
    pub fn render_to_file(&self, input: &Path, dest: &Path) -> Result<()> {
        let scratch = tempfile::tempdir()?;
        let pdf = self.render(input, scratch.path())?;
        fs::copy(&pdf, dest)?;
        log::debug!("Wrote {}", dest.display());
        Ok(())
    }
}

/// `<out_dir>/<input stem>.pdf`
pub fn expected_output(input: &Path, out_dir: &Path) -> Result<PathBuf> {
    let stem = input.file_stem().ok_or_else(|| {
        Error::RenderFailure(format!("'{}' has no file name", input.display()))
    })?;
    let mut name = stem.to_os_string();
    name.push(".pdf");
    Ok(out_dir.join(name))
}

/// Wait for `child`; `Ok(None)` means it was killed at the deadline.
fn wait_until(child: &mut Child, deadline: Instant) -> Result<Option<ExitStatus>> {
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }

        let now = Instant::now();
        if now >= deadline {
            kill_converter(child);
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

/// Kill the converter's process group, then the converter itself.
#[cfg(unix)]
fn kill_converter(child: &mut Child) {
    if let Ok(pgid) = libc::pid_t::try_from(child.id()) {
        // SAFETY: plain syscall; the child was spawned as leader of this group.
        unsafe { libc::kill(-pgid, libc::SIGKILL) };
    }
    let _ = child.kill();
}

#[cfg(not(unix))]
fn kill_converter(child: &mut Child) {
    let _ = child.kill();
}

/// Budget in whole seconds, rounded up so sub-second budgets never read as 0.
fn whole_seconds(timeout: Duration) -> u64 {
    timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_output() {
        let out = expected_output(Path::new("/tmp/in/My Deck.pptx"), Path::new("/tmp/out")).unwrap();
        assert_eq!(out, PathBuf::from("/tmp/out/My Deck.pdf"));
        assert!(expected_output(Path::new("/"), Path::new("/tmp")).is_err());
    }

    #[test]
    fn test_defaults() {
        let renderer = PdfRenderer::new();
        assert_eq!(renderer.timeout(), Duration::from_secs(60));
        assert_eq!(renderer.program, OsString::from("soffice"));
    }

    #[test]
    fn test_whole_seconds_rounds_up() {
        assert_eq!(whole_seconds(Duration::from_secs(60)), 60);
        assert_eq!(whole_seconds(Duration::from_millis(300)), 1);
        assert_eq!(whole_seconds(Duration::from_millis(1500)), 2);
        assert_eq!(whole_seconds(Duration::ZERO), 0);
    }

    #[test]
    fn test_missing_program_is_failure() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("deck.pptx");
        fs::write(&input, b"x").unwrap();

        let err = PdfRenderer::new()
            .with_program("/nonexistent/slidetext-converter")
            .render(&input, dir.path())
            .unwrap_err();
        assert!(matches!(err, Error::RenderFailure(_)), "got {:?}", err);
    }

    #[cfg(unix)]
    mod scripted {
        use super::*;
        use std::os::unix::fs::PermissionsExt;

        /// Write an executable stand-in for the converter.
        fn script(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("fake-soffice");
            fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn input(dir: &Path) -> PathBuf {
            let path = dir.join("deck.pptx");
            fs::write(&path, b"%PDF-1.4 pretend").unwrap();
            path
        }

        // $5 is the output directory, $6 the input file.
        const COPY_TO_PDF: &str = r#"name=$(basename "$6"); cp "$6" "$5/${name%.*}.pdf""#;

        #[test]
        fn test_successful_conversion() {
            let dir = tempfile::tempdir().unwrap();
            let renderer = PdfRenderer::new().with_program(script(dir.path(), COPY_TO_PDF));

            let bytes = renderer.render_to_bytes(&input(dir.path())).unwrap();
            assert_eq!(bytes, b"%PDF-1.4 pretend");
        }

        #[test]
        fn test_render_to_file() {
            let dir = tempfile::tempdir().unwrap();
            let renderer = PdfRenderer::new().with_program(script(dir.path(), COPY_TO_PDF));
            let dest = dir.path().join("out.pdf");

            renderer.render_to_file(&input(dir.path()), &dest).unwrap();
            assert!(dest.exists());
        }

        #[test]
        fn test_timeout_kills_converter() {
            let dir = tempfile::tempdir().unwrap();
            let renderer = PdfRenderer::new()
                .with_program(script(dir.path(), "exec sleep 30"))
                .with_timeout(Duration::from_millis(300));

            let started = Instant::now();
            let err = renderer.render(&input(dir.path()), dir.path()).unwrap_err();
            assert!(matches!(err, Error::RenderTimeout(_)), "got {:?}", err);
            assert!(started.elapsed() < Duration::from_secs(10));
        }

        #[test]
        fn test_timeout_kills_forked_converter() {
            let dir = tempfile::tempdir().unwrap();
            let renderer = PdfRenderer::new()
                .with_program(script(dir.path(), "sleep 8 & wait"))
                .with_timeout(Duration::from_millis(300));

            let started = Instant::now();
            let err = renderer.render(&input(dir.path()), dir.path()).unwrap_err();
            assert!(started.elapsed() < Duration::from_secs(4), "took {:?}", started.elapsed());
            assert_eq!(err.to_string(), "PDF conversion timed out after 1 seconds.");
        }

        #[test]
        fn test_nonzero_exit_is_failure() {
            let dir = tempfile::tempdir().unwrap();
            let renderer = PdfRenderer::new().with_program(script(
                dir.path(),
                "echo 'source file could not be loaded' >&2; exit 1",
            ));

            let err = renderer.render(&input(dir.path()), dir.path()).unwrap_err();
            match err {
                Error::RenderFailure(msg) => assert!(msg.contains("could not be loaded"), "{}", msg),
                other => panic!("expected failure, got {:?}", other),
            }
        }

        #[test]
        fn test_missing_output_is_failure() {
            let dir = tempfile::tempdir().unwrap();
            let out = tempfile::tempdir().unwrap();
            let renderer = PdfRenderer::new().with_program(script(dir.path(), "exit 0"));

            let err = renderer.render(&input(dir.path()), out.path()).unwrap_err();
            assert_eq!(
                err.to_string(),
                "PDF conversion failed: output file not found."
            );
        }
    }
}
