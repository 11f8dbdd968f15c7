//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// The five speed test variants exposed by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestMode {
    /// Latency, download and upload with full budgets
    Full,
    /// Latency and download with reduced budgets, upload skipped
    Quick,
    DownloadOnly,
    UploadOnly,
    LatencyOnly,
}

impl TestMode {
    /// All modes, in route order
    pub const ALL: [TestMode; 5] = [
        TestMode::Full,
        TestMode::Quick,
        TestMode::DownloadOnly,
        TestMode::UploadOnly,
        TestMode::LatencyOnly,
    ];

    /// Stable name used in log fields
    pub fn name(&self) -> &'static str {
        match self {
            TestMode::Full => "full",
            TestMode::Quick => "quick",
            TestMode::DownloadOnly => "download",
            TestMode::UploadOnly => "upload",
            TestMode::LatencyOnly => "latency",
        }
    }

    /// Route path serving this mode
    pub fn path(&self) -> &'static str {
        match self {
            TestMode::Full => "/speed-test",
            TestMode::Quick => "/speed-test/quick",
            TestMode::DownloadOnly => "/speed-test/download",
            TestMode::UploadOnly => "/speed-test/upload",
            TestMode::LatencyOnly => "/speed-test/latency",
        }
    }

    pub fn runs_latency(&self) -> bool {
        matches!(self, TestMode::Full | TestMode::Quick | TestMode::LatencyOnly)
    }

    pub fn runs_download(&self) -> bool {
        matches!(self, TestMode::Full | TestMode::Quick | TestMode::DownloadOnly)
    }

    pub fn runs_upload(&self) -> bool {
        matches!(self, TestMode::Full | TestMode::UploadOnly)
    }
}

impl fmt::Display for TestMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
