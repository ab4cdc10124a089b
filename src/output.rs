use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ApplyResult, ListResult};
use crate::userdata::Account;

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Interactive,
    NonInteractive,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_accounts(accounts: &[Account]) -> io::Result<()> {
        Self::print_json(&accounts)
    }

    pub fn print_list(result: &ListResult) -> io::Result<()> {
        Self::print_json(result)
    }

    pub fn print_apply(result: &ApplyResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl crate::app::ProgressSink for JsonOutput {
    fn event(&self, _event: crate::app::ProgressEvent) {}
}

/// Plain progress lines on stderr, for interactive runs of the subcommands.
pub struct StderrProgress;

impl crate::app::ProgressSink for StderrProgress {
    fn event(&self, event: crate::app::ProgressEvent) {
        let message = event
            .message
            .split_once("; ")
            .filter(|(head, _)| head.starts_with("phase="))
            .map(|(_, rest)| rest.to_string())
            .unwrap_or(event.message);
        eprintln!("  {message}");
    }
}
