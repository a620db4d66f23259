use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

/// `RUST_LOG` wins over the command line level when set.
pub fn init_logger(level: LevelFilter) {
    Builder::from_env(Env::default().default_filter_or(level.as_str()))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {:<5} {}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.target(),
                record.args(),
            )
        })
        .init();
}
