use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::filter::EnvFilter;

/// Environment variable naming the terminal UI's log file.
pub const LOG_FILE_VAR: &str = "INVITATION_LOG";

fn filter() -> EnvFilter {
    EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into())
}

/// Server mode logs to stdout.
pub fn init_stdout() {
    let _ = tracing_subscriber::fmt().with_env_filter(filter()).try_init();
}

/// The terminal UI owns stdout, so it only logs when a file is given.
pub fn init_file(path: Option<&Path>) -> std::io::Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_path_means_no_file() {
        assert!(init_file(None).is_ok());
    }

    #[test]
    fn log_file_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("invitation.log");
        init_file(Some(&path)).unwrap();
        assert!(path.exists());
    }
}
