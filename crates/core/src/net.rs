//! Upload-time estimation
//!
//! Measures effective upstream bandwidth with a single timed 1 MiB POST and
//! scales the result to the file size. The number is a rough hint used to
//! widen upload timeouts, nothing more.

use crate::error::Result;
use std::time::{Duration, Instant};

/// Default measurement endpoint
const DEFAULT_PROBE_URL: &str = "https://httpbin.org/post";

/// Size of the probe payload in bytes
const PROBE_SIZE: usize = 1024 * 1024;

/// Estimate how long uploading `file_size_mb` megabytes will take, in seconds.
pub async fn estimate_upload_time(file_size_mb: u64) -> Result<f64> {
    estimate_upload_time_via(DEFAULT_PROBE_URL, file_size_mb).await
}

/// Estimate upload time against an explicit measurement endpoint
pub async fn estimate_upload_time_via(probe_url: &str, file_size_mb: u64) -> Result<f64> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let payload = vec![b'x'; PROBE_SIZE];

    let start = Instant::now();
    let response = client
        .post(probe_url)
        .header("Content-Type", "application/octet-stream")
        .body(payload)
        .send()
        .await?;
    let _ = response.bytes().await?;
    let elapsed = start.elapsed().as_secs_f64();

    Ok(seconds_for(file_size_mb, PROBE_SIZE, elapsed))
}

/// Scale a measured probe to a full transfer: Mbps from the probe, then
/// megabits of payload divided by that rate.
fn seconds_for(file_size_mb: u64, probe_bytes: usize, elapsed_secs: f64) -> f64 {
    let upload_speed_mbps = (8.0 * probe_bytes as f64) / (elapsed_secs * 1024.0 * 1024.0);
    (file_size_mb as f64 * 8.0) / upload_speed_mbps
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_scale_linearly_with_size() {
        // 1 MiB in 1s => 8 Mbps => 500 MB takes 500s
        let secs = seconds_for(500, 1024 * 1024, 1.0);
        assert!((secs - 500.0).abs() < 1e-9);

        let double = seconds_for(1000, 1024 * 1024, 1.0);
        assert!((double - 2.0 * secs).abs() < 1e-9);
    }

    #[test]
    fn test_faster_probe_means_shorter_estimate() {
        let slow = seconds_for(100, 1024 * 1024, 2.0);
        let fast = seconds_for(100, 1024 * 1024, 0.5);
        assert!(fast < slow);
    }
}
