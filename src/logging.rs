use std::str::FromStr;

use log::LevelFilter;
use simplelog::{ConfigBuilder, WriteLogger};

use crate::config::Settings;
use crate::eval::Decision;

/// Install a file logger writing to `settings.log_file`.
/// Best-effort: failures are silently ignored (logging must never block the hook).
pub fn init(settings: &Settings) {
    if settings.log_file.trim().is_empty() {
        return;
    }
    let Ok(expanded) = shellexpand::full(&settings.log_file) else {
        return;
    };
    let path = std::path::Path::new(&*expanded);
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let Ok(file) = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    else {
        return;
    };

    let level = LevelFilter::from_str(&settings.log_level).unwrap_or(LevelFilter::Info);
    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Off)
        .set_thread_level(LevelFilter::Off)
        .build();
    let _ = WriteLogger::init(level, config, file);
}

/// Record one decision as a single tab-separated line.
pub fn log_decision(command: &str, decision: &Decision) {
    log::info!("{}", decision_line(command, decision));
}

fn decision_line(command: &str, decision: &Decision) -> String {
    // Compact single-line reason for the log (replace newlines with "; ")
    let reason_oneline = decision.reason().unwrap_or("").replace('\n', "; ");
    let cmd_truncated: String = command.chars().take(200).collect();
    format!(
        "{decision}\t{rule}\t{cmd}\t{reason}",
        decision = decision.as_str(),
        rule = decision.rule().unwrap_or("-"),
        cmd = cmd_truncated.replace('\n', "\\n"),
        reason = reason_oneline,
    )
}
