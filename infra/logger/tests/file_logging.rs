use modhub_logger::{LevelFilter, Logger};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn json_file_output_is_written() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");

    let logger = Logger::builder()
        .name("file-logging")
        .console(false)
        .level(LevelFilter::INFO)
        .path(&log_dir)
        .json(true)
        .init()?;

    tracing::info!(technical_name = "ps_apiresources", "module reset");

    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");

    let contents = fs::read_to_string(log_file)?;
    let first = contents.lines().next().expect("at least one line");
    let line: serde_json::Value = serde_json::from_str(first)?;
    assert_eq!(line["fields"]["technical_name"], "ps_apiresources");

    Ok(())
}
