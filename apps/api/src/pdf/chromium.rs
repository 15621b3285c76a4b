//! Headless Chromium PDF renderer.
//!
//! Each render gets its own temp directory (input HTML, output PDF, browser
//! profile) and its own browser process group. Both are owned by the `render`
//! call and released on every exit path: a [`ProcessGroupGuard`] kills the
//! whole group (browser plus its GPU, zygote and renderer helpers) when the
//! call returns, and the directory is removed when the `TempDir` goes out of
//! scope.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::pdf::{PdfError, PdfOptions, PdfRenderer};

/// Cap on captured browser stderr in error messages.
const MAX_STDERR_CHARS: usize = 2000;

pub struct ChromiumPdfRenderer {
    binary: PathBuf,
    options: PdfOptions,
}

impl ChromiumPdfRenderer {
    pub fn new(binary: impl Into<PathBuf>, options: PdfOptions) -> Self {
        Self {
            binary: binary.into(),
            options,
        }
    }

    fn command(&self, input: &Path, output: &Path, profile: &Path) -> Command {
        let (width, height) = self.options.viewport;
        let mut cmd = Command::new(&self.binary);
        cmd.arg("--headless=new")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--hide-scrollbars")
            .arg("--no-pdf-header-footer")
            .arg(format!("--window-size={width},{height}"))
            .arg(format!(
                "--virtual-time-budget={}",
                self.options.settle_budget.as_millis()
            ))
            .arg(format!("--user-data-dir={}", profile.display()))
            .arg(format!("--print-to-pdf={}", output.display()))
            .arg(format!("file://{}", input.display()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // Own group, so helpers forked by the browser can be killed together.
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }
}

/// Kills the browser's process group when dropped. The group id equals the
/// browser's pid because it is spawned with `process_group(0)`.
struct ProcessGroupGuard {
    pgid: Option<i32>,
}

impl ProcessGroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self {
            pgid: pid.and_then(|p| i32::try_from(p).ok()),
        }
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some(pgid) = self.pgid {
            // Safety: kill(2) only sends a signal; ESRCH for an empty group is ignored.
            let ret = unsafe { libc::kill(-pgid, libc::SIGKILL) };
            if ret == 0 {
                debug!("Killed browser process group {pgid}");
            }
        }
    }
}

#[async_trait]
impl PdfRenderer for ChromiumPdfRenderer {
    async fn render(&self, html: &str) -> Result<Vec<u8>, PdfError> {
        let workdir = tempfile::tempdir()?;
        let input = workdir.path().join("resume.html");
        let output = workdir.path().join("resume.pdf");
        let profile = workdir.path().join("profile");

        tokio::fs::write(&input, with_print_rules(html, &self.options)).await?;

        let child = self
            .command(&input, &output, &profile)
            .spawn()
            .map_err(PdfError::Launch)?;
        let _group = ProcessGroupGuard::new(child.id());

        debug!("Spawned {} for PDF render", self.binary.display());

        // On timeout the wait future is dropped together with the child; the
        // group guard then takes down any helpers still running.
        let finished = tokio::time::timeout(self.options.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!(
                    "PDF render exceeded {}s, browser killed",
                    self.options.timeout.as_secs()
                );
                PdfError::Timeout {
                    secs: self.options.timeout.as_secs(),
                }
            })??;

        if !finished.status.success() {
            let stderr: String = String::from_utf8_lossy(&finished.stderr)
                .chars()
                .take(MAX_STDERR_CHARS)
                .collect();
            return Err(PdfError::Crashed {
                status: finished.status.to_string(),
                stderr,
            });
        }

        let bytes = match tokio::fs::read(&output).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PdfError::EmptyOutput)
            }
            Err(e) => return Err(PdfError::Io(e)),
        };

        if bytes.is_empty() {
            return Err(PdfError::EmptyOutput);
        }

        debug!("PDF rendered ({} bytes)", bytes.len());
        Ok(bytes)
    }
}

/// Injects the page size, margins and background printing rules right after
/// `<head>` so they apply regardless of the template's own stylesheet.
pub fn with_print_rules(html: &str, options: &PdfOptions) -> String {
    let rules = format!(
        "<style>@page {{ size: {}; margin: {}mm; }} html {{ -webkit-print-color-adjust: exact; print-color-adjust: exact; }}</style>",
        options.page_size, options.margin_mm
    );

    match html.find("<head>") {
        Some(pos) => {
            let insert_at = pos + "<head>".len();
            let mut out = String::with_capacity(html.len() + rules.len());
            out.push_str(&html[..insert_at]);
            out.push_str(&rules);
            out.push_str(&html[insert_at..]);
            out
        }
        None => format!("{rules}{html}"),
    }
}
