// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Filters what external build tools print.
//!
//! Watch-mode processes (esbuild, Tailwind) print a line or two on every
//! rebuild. This module keeps errors and warnings visible while dropping the
//! repetitive success chatter.

use console::style;
use regex::Regex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::task::JoinHandle;

/// How a tool output line should be treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Error,
    Warning,
    Info,
}

fn classify(line: &str) -> Severity {
    let lower = line.to_lowercase();
    if lower.contains("error") || lower.contains("err:") || lower.contains("failed") {
        Severity::Error
    } else if lower.contains("warning") || lower.contains("warn:") {
        Severity::Warning
    } else {
        Severity::Info
    }
}

/// Line filter for a tool's watch-mode output.
///
/// The first build always prints in full. After that, routine rebuild lines
/// ("Done in 12ms", watch banners, version announcements) are dropped unless
/// the rebuild was slow enough to be worth seeing.
pub struct OutputFilter {
    /// Prefix shown before every line
    label: String,
    first_build: AtomicBool,
    /// Matches the "Done in ..." summary both tools print
    done_line: Regex,
    /// Captures a duration value and unit out of a line
    timing: Regex,
    /// Rebuilds at or above this many milliseconds print even when routine
    slow_rebuild_ms: u64,
    verbose: bool,
    /// Drop everything but problems once the first build is done
    suppress_watch_rebuilds: bool,
}

impl OutputFilter {
    pub fn new(label: &str, verbose: bool) -> Self {
        Self {
            label: label.to_string(),
            first_build: AtomicBool::new(true),
            done_line: Regex::new(r"(?i)done in \d+").unwrap(),
            timing: Regex::new(r"(\d+)\s*(ms|µs|μs|s)\b").unwrap(),
            slow_rebuild_ms: 100,
            verbose,
            suppress_watch_rebuilds: false,
        }
    }

    /// Drop all non-problem output after the first build. Used when another
    /// channel (the reload spinner) already reports rebuilds.
    pub fn with_suppress_watch_rebuilds(mut self, suppress: bool) -> Self {
        self.suppress_watch_rebuilds = suppress;
        self
    }

    /// Whether `line` is chatter the user does not need to see.
    pub fn should_suppress(&self, line: &str) -> bool {
        // problems always print, and so does the whole first build
        if classify(line) != Severity::Info || self.is_first_build() {
            return false;
        }

        if self.suppress_watch_rebuilds {
            return true;
        }

        !self.verbose && self.is_routine(line)
    }

    fn is_routine(&self, line: &str) -> bool {
        if self.done_line.is_match(line) {
            // keep slow rebuilds visible
            return self
                .timing_ms(line)
                .map_or(true, |ms| ms < self.slow_rebuild_ms);
        }

        let trimmed = line.trim();
        trimmed.is_empty()
            || trimmed.starts_with("[watch]")
            || line.contains("tailwindcss v")
            || line.starts_with('≈')
    }

    /// Duration in milliseconds from lines like "Done in 67ms" or
    /// "Done in 491µs".
    fn timing_ms(&self, line: &str) -> Option<u64> {
        let caps = self.timing.captures(line)?;
        let value: u64 = caps.get(1)?.as_str().parse().ok()?;

        Some(match caps.get(2)?.as_str() {
            "s" => value * 1000,
            "µs" | "μs" => value / 1000,
            _ => value,
        })
    }

    /// Renders `line` with the tool prefix and severity coloring.
    pub fn format_line(&self, line: &str) -> String {
        let line = line.trim();

        let body = match classify(line) {
            Severity::Error => style(line).red().to_string(),
            Severity::Warning => style(line).yellow().to_string(),
            Severity::Info if self.done_line.is_match(line) => match self.timing_ms(line) {
                Some(ms) => format!(
                    "{} {}",
                    style("✓").green(),
                    style(format!("{}ms", ms)).dim()
                ),
                None => style(line).dim().to_string(),
            },
            Severity::Info => style(line).dim().to_string(),
        };

        format!("  {:<12} {}", style(&self.label).cyan(), body)
    }

    /// Marks the initial build as finished; later output gets filtered.
    pub fn mark_first_build_complete(&self) {
        self.first_build.store(false, Ordering::Relaxed);
    }

    pub fn is_first_build(&self) -> bool {
        self.first_build.load(Ordering::Relaxed)
    }

    /// Consumes the filter and follows `stderr` until the child closes it.
    ///
    /// Both esbuild and Tailwind report through stderr. The first "Done in"
    /// line marks the end of the initial build and flips the filter into
    /// watch mode.
    pub fn watch_stderr(self, stderr: ChildStderr) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut lines = BufReader::new(stderr).lines();

            while let Ok(Some(line)) = lines.next_line().await {
                if !self.should_suppress(&line) {
                    println!("{}", self.format_line(&line));
                }

                if self.is_first_build() && self.done_line.is_match(&line) {
                    self.mark_first_build_complete();
                }
            }
        })
    }
}

/// Drains `stdout` so the child never blocks on a full pipe, printing the
/// lines only in verbose mode.
///
/// Both esbuild and Tailwind report through stderr; stdout rarely carries
/// anything.
pub fn drain_stdout(stdout: ChildStdout, label: &str, verbose: bool) -> JoinHandle<()> {
    let label = label.to_string();
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();

        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim();
            if verbose && !line.is_empty() {
                println!("  {:<12} {}", style(&label).cyan(), style(line).dim());
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_is_normalized_to_milliseconds() {
        let filter = OutputFilter::new("esbuild", false);

        assert_eq!(filter.timing_ms("Done in 67ms"), Some(67));
        assert_eq!(filter.timing_ms("Done in 491µs"), Some(0)); // rounds down
        assert_eq!(filter.timing_ms("Done in 2s"), Some(2000));
        assert_eq!(filter.timing_ms("⚡ Done in 24ms"), Some(24));
        assert_eq!(filter.timing_ms("no timing here"), None);
    }

    #[test]
    fn routine_rebuild_chatter_is_suppressed() {
        let filter = OutputFilter::new("Tailwind", false);
        filter.mark_first_build_complete();

        assert!(filter.should_suppress("Done in 50ms"));
        assert!(filter.should_suppress("[watch] build finished"));
        assert!(filter.should_suppress("[watch] build started (change: \"resources/js/app.jsx\")"));
        assert!(filter.should_suppress("≈ tailwindcss v4.1.11"));
        assert!(filter.should_suppress(""));

        assert!(!filter.should_suppress("Error: failed to compile resources/css/app.css"));
        assert!(!filter.should_suppress("Warning: unused @layer rule"));
        assert!(!filter.should_suppress("Done in 150ms")); // slow rebuilds stay visible
    }

    #[test]
    fn first_build_output_is_never_suppressed() {
        let filter = OutputFilter::new("esbuild", false);

        assert!(!filter.should_suppress("Done in 5ms"));
        assert!(filter.is_first_build());

        filter.mark_first_build_complete();
        assert!(!filter.is_first_build());
        assert!(filter.should_suppress("Done in 5ms"));
    }

    #[test]
    fn verbose_mode_shows_all() {
        let filter = OutputFilter::new("esbuild", true);
        filter.mark_first_build_complete();

        assert!(!filter.should_suppress("Done in 50ms"));
        assert!(!filter.should_suppress("[watch] build finished"));
    }

    #[test]
    fn suppress_watch_rebuilds_silences_everything_but_problems() {
        let filter = OutputFilter::new("Tailwind", false).with_suppress_watch_rebuilds(true);
        filter.mark_first_build_complete();

        assert!(filter.should_suppress("Done in 150ms"));
        assert!(filter.should_suppress("rebuilt resources/css/app.css"));
        assert!(!filter.should_suppress("Error: unknown utility class"));
    }
}
