use std::{collections::VecDeque, fmt};

use chrono::{Local, NaiveTime};

/// Oldest lines are dropped past this many
const MAX_ENTRIES: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Info => "INFO",
            LogLevel::Success => "SUCCESS",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        })
    }
}

/// One line of the on-screen log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub time: NaiveTime,
    pub level: LogLevel,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.time.format("%H:%M:%S"),
            self.level,
            self.message
        )
    }
}

/// Scrolling log shown under the progress bar.
#[derive(Debug, Default, Clone)]
pub struct LogPane {
    entries: VecDeque<LogEntry>,
}

impl LogPane {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message stamped with the local time.
    pub fn push(&mut self, level: LogLevel, message: impl Into<String>) {
        self.push_at(Local::now().time(), level, message);
    }

    pub fn push_at(&mut self, time: NaiveTime, level: LogLevel, message: impl Into<String>) {
        if self.entries.len() == MAX_ENTRIES {
            self.entries.pop_front();
        }
        self.entries.push_back(LogEntry {
            time,
            level,
            message: message.into(),
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    /// Whole log as displayed text.
    pub fn text(&self) -> String {
        self.entries
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    #[test]
    fn renders_timestamp_and_level() {
        let mut pane = LogPane::new();
        pane.push_at(at(9, 5, 3), LogLevel::Info, "Starting download: u");
        pane.push_at(at(9, 5, 4), LogLevel::Error, "Download error: 403");
        assert_eq!(
            pane.text(),
            "[09:05:03] INFO: Starting download: u\n[09:05:04] ERROR: Download error: 403"
        );
    }

    #[test]
    fn clear_empties_pane() {
        let mut pane = LogPane::new();
        pane.push(LogLevel::Success, "done");
        assert_eq!(pane.len(), 1);
        pane.clear();
        assert!(pane.is_empty());
        assert_eq!(pane.text(), "");
    }

    #[test]
    fn drops_oldest_when_full() {
        let mut pane = LogPane::new();
        for i in 0..MAX_ENTRIES + 5 {
            pane.push_at(at(0, 0, 0), LogLevel::Info, i.to_string());
        }
        assert_eq!(pane.len(), MAX_ENTRIES);
        assert_eq!(pane.entries().next().unwrap().message, "5");
        assert_eq!(pane.last().unwrap().message, (MAX_ENTRIES + 4).to_string());
    }
}
