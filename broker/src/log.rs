// Grounded on the teacher crate's log.rs: log4rs wired up from the parsed config,
// simplified to a console appender plus an optional rolling file appender.

use log::LevelFilter;
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config as Log4rsConfig, Root};
use log4rs::encode::pattern::PatternEncoder;

use crate::config;
use crate::error::{Error, ErrorKind};

fn level_filter(level: config::LogLevel) -> LevelFilter {
    match level {
        config::LogLevel::Off => LevelFilter::Off,
        config::LogLevel::Error => LevelFilter::Error,
        config::LogLevel::Warn => LevelFilter::Warn,
        config::LogLevel::Info => LevelFilter::Info,
        config::LogLevel::Debug => LevelFilter::Debug,
        config::LogLevel::Trace => LevelFilter::Trace,
    }
}

pub fn init_log(log_conf: &config::Log) -> Result<(), Error> {
    const CONSOLE_NAME: &str = "console";
    const FILE_NAME: &str = "file";

    let level = level_filter(log_conf.log_level());
    let encoder = || Box::new(PatternEncoder::new("{d} {h({l})} {t} - {m}{n}"));

    let mut appenders = Vec::new();
    let mut names = Vec::new();

    if log_conf.console_log() {
        let console = ConsoleAppender::builder()
            .target(Target::Stderr)
            .encoder(encoder())
            .build();
        appenders.push(Appender::builder().build(CONSOLE_NAME, Box::new(console)));
        names.push(CONSOLE_NAME);
    }

    if let Some(path) = log_conf.log_file() {
        let file = FileAppender::builder()
            .encoder(encoder())
            .build(path)
            .map_err(|err| {
                Error::new(ErrorKind::ConfigError, &format!("failed to open log file: {err}"))
            })?;
        appenders.push(Appender::builder().build(FILE_NAME, Box::new(file)));
        names.push(FILE_NAME);
    }

    let mut builder = Log4rsConfig::builder();
    for appender in appenders {
        builder = builder.appender(appender);
    }
    let config = builder
        .build(Root::builder().appenders(names).build(level))
        .map_err(|err| {
            Error::new(ErrorKind::ConfigError, &format!("failed to build log config: {err}"))
        })?;

    log4rs::init_config(config)
        .map_err(|err| Error::new(ErrorKind::ConfigError, &format!("failed to init logger: {err}")))?;
    Ok(())
}
