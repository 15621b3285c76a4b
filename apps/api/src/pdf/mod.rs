// PDF rendering: HTML document -> PDF bytes via a headless browser.
// Failures here are never fatal to resume generation; the orchestrator
// records them and carries on with the HTML artifact alone.

pub mod chromium;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use chromium::ChromiumPdfRenderer;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("failed to launch browser: {0}")]
    Launch(#[source] std::io::Error),

    #[error("browser did not finish within {secs}s")]
    Timeout { secs: u64 },

    #[error("browser exited with {status}: {stderr}")]
    Crashed { status: String, stderr: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser produced no PDF output")]
    EmptyOutput,
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<Vec<u8>, PdfError>;
}

/// Page and timing settings for the browser print.
#[derive(Debug, Clone)]
pub struct PdfOptions {
    /// CSS page size keyword.
    pub page_size: String,
    pub margin_mm: u32,
    /// Virtual time the page gets to load fonts / images before printing.
    pub settle_budget: Duration,
    /// Hard wall-clock bound for the whole browser run.
    pub timeout: Duration,
    pub viewport: (u32, u32),
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            page_size: "A4".to_string(),
            margin_mm: 12,
            settle_budget: Duration::from_secs(5),
            timeout: Duration::from_secs(60),
            viewport: (1200, 800),
        }
    }
}
