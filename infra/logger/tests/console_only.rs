use modhub_logger::{LevelFilter, Logger, LoggerError};

#[test]
fn console_logger_has_no_file_guard_and_installs_once() {
    let logger = Logger::builder()
        .name("console-only")
        .level(LevelFilter::INFO)
        .init()
        .expect("first init should succeed");

    assert!(logger.guard().is_none(), "console output must not spawn a file writer");

    let err = Logger::builder().name("console-again").init().expect_err("second init must fail");
    assert!(matches!(err, LoggerError::Subscriber { .. }));
}
