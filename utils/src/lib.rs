#[macro_use]
extern crate anyhow;

use std::{fmt, io::BufRead, str::FromStr};

use anyhow::Context;
use clap::ArgMatches;

/// LogLevel
///
/// Represents minimum level of messages that will be logged
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogLevel {
    pub level: usize,
}

impl FromStr for LogLevel {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel { level: 0 }),
            "warn" => Ok(LogLevel { level: 1 }),
            "info" => Ok(LogLevel { level: 2 }),
            "debug" => Ok(LogLevel { level: 3 }),
            "trace" => Ok(LogLevel { level: 4 }),
            "none" => Ok(LogLevel { level: 5 }),
            _ => Err("no match"),
        }
    }
}

impl LogLevel {
    pub fn is_none(&self) -> bool {
        self.level > 4
    }
    pub fn get_level(&self) -> usize {
        if self.level > 4 {
            0
        } else {
            self.level
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let level_str = ["error", "warn", "info", "debug", "trace", "none"];
        if self.level < 6 {
            write!(f, "{}", level_str[self.level])
        } else {
            write!(f, "unknown")
        }
    }
}

/// Initialize logging from command line arguments
pub fn init_log(m: &ArgMatches) -> anyhow::Result<()> {
    let verbose = m
        .get_one::<LogLevel>("loglevel")
        .copied()
        .unwrap_or(LogLevel { level: 2 });
    let quiet = verbose.is_none() || m.get_flag("quiet");
    let ts = m
        .get_one::<stderrlog::Timestamp>("timestamp")
        .copied()
        .unwrap_or(stderrlog::Timestamp::Off);

    stderrlog::new()
        .quiet(quiet)
        .verbosity(verbose.get_level())
        .timestamp(ts)
        .init()
        .with_context(|| "Could not initialize logging")
}

/// Read in next line and split on tabs after trimming white space
pub fn get_next_line<'a, R: BufRead>(
    rdr: &mut R,
    buf: &'a mut String,
) -> anyhow::Result<Option<Vec<&'a str>>> {
    buf.clear();
    if rdr.read_line(buf)? == 0 {
        Ok(None)
    } else {
        Ok(Some(buf.trim().split('\t').collect()))
    }
}

/// True if a line returned by [get_next_line] had no content
pub fn is_blank(fields: &[&str]) -> bool {
    fields.iter().all(|s| s.is_empty())
}

/// Parse a comma separated list of names, trimming white space and
/// dropping empty entries
pub fn split_list(s: &str) -> Vec<&str> {
    s.split(',').map(|x| x.trim()).filter(|x| !x.is_empty()).collect()
}

/// Display wrapper for an optional value.  Missing values are written as NA,
/// present values with their own Display (shortest round trip for floats)
pub struct OptDisplay<'a, T> {
    val: Option<&'a T>,
}

impl<'a, T> OptDisplay<'a, T> {
    pub fn new(val: Option<&'a T>) -> Self {
        Self { val }
    }
}

impl<T: fmt::Display> fmt::Display for OptDisplay<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.val {
            Some(x) => fmt::Display::fmt(x, f),
            None => f.write_str("NA"),
        }
    }
}

/// Check that a name is usable as a column or file name component
pub fn check_name(s: &str) -> anyhow::Result<()> {
    if s.is_empty() {
        Err(anyhow!("Empty name"))
    } else if s.contains(|c: char| c == '\t' || c == '/' || c.is_control()) {
        Err(anyhow!("Illegal character in name {:?}", s))
    } else {
        Ok(())
    }
}
