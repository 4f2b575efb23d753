use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

/// Set to `1` to also append timings to the profile log file
pub const PROFILE_LOG_ENV: &str = "TSA_PROFILE_LOG";

/// Logs how long an analysis step took when dropped
pub struct ProfileScope {
    label: String,
    start: Instant,
}

impl ProfileScope {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for ProfileScope {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_secs_f64() * 1000.0;

        log::info!("[PROFILE] {} - {:.3}ms", self.label, elapsed_ms);

        if file_logging_enabled() {
            if let Err(e) = write_profile_log(&self.label, elapsed_ms) {
                log::warn!("Failed to write profile log: {}", e);
            }
        }
    }
}

fn file_logging_enabled() -> bool {
    std::env::var(PROFILE_LOG_ENV).is_ok_and(|v| v == "1")
}

fn get_profile_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tsa")
        .join("performance_profile.log")
}

fn write_profile_log(label: &str, duration_ms: f64) -> std::io::Result<()> {
    let log_path = get_profile_log_path();
    if let Some(dir) = log_path.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let timestamp = chrono::Utc::now().to_rfc3339();
    writeln!(file, "{} | {} | {:.3}ms", timestamp, label, duration_ms)?;

    Ok(())
}

#[macro_export]
macro_rules! profile_scope {
    ($label:expr) => {
        let _profile_scope = $crate::profiling::ProfileScope::new($label);
    };
}

/// Where timings are written when file logging is enabled
pub fn get_profile_log_location() -> String {
    get_profile_log_path().display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_log_location() {
        let location = get_profile_log_location();
        assert!(location.ends_with("performance_profile.log"));
        assert!(location.contains("tsa"));
    }
}
