//! Logging initialization (console + file)

use anyhow::Result;
use simplelog::*;
use std::fs::File;

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
///
/// # Returns
/// * `Ok(())` - Logger initialized successfully
/// * `Err(anyhow::Error)` - Failed to initialize logger
pub fn init_logger(log_file_path: &str) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;

    CombinedLogger::init(vec![
        TermLogger::new(
            LevelFilter::Info,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(LevelFilter::Info, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // CombinedLogger::init is global, so this is the only test in the
    // binary allowed to call init_logger.
    #[test]
    fn test_init_logger_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");

        init_logger(path.to_str().unwrap()).unwrap();
        assert!(path.exists());
    }
}
