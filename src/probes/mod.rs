//! Measurement engine: latency sampling, download and upload probes
//!
//! Probes never spawn tasks. Every outbound request lives inside the caller's
//! future, so dropping that future aborts the transfer.

pub mod download;
pub mod latency;
pub mod upload;

pub use download::DownloadProber;
pub use latency::LatencySampler;
pub use upload::UploadProber;
