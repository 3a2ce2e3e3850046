use tracing::info;

pub fn init_logging(level: tracing::Level) {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_thread_ids(false)
        .with_level(true)
        .with_max_level(level)
        .with_ansi(true)
        .init();

    info!(%level, "logging initialized");
}
