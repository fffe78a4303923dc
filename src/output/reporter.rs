//! Result aggregation and reporting.
//!
//! The [`Reporter`] is the single consumer of scan results. Results arrive in
//! completion order, not scheduling order, and are printed as they arrive.

use crate::output::OutputFormat;
use crate::scanner::{ScanPlan, ScanResult, ScanSummary};
use crate::types::{PortError, TargetError};
use console::{style, StyledObject};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Stderr, Stdout, Write};

/// Progress is only reported for scans larger than this.
pub const PROGRESS_THRESHOLD: usize = 10;
/// Progress is reported every this many completions.
pub const PROGRESS_INTERVAL: usize = 10;

/// Streams results to `out` and diagnostics to `err`.
pub struct Reporter<O: Write, E: Write> {
    out: O,
    err: E,
    verbose: bool,
    format: OutputFormat,
    color_out: bool,
    color_err: bool,
    progress_bar: bool,
    bar: Option<ProgressBar>,
    total: usize,
    completed: usize,
    open: usize,
}

impl Reporter<Stdout, Stderr> {
    /// Reporter on the process's stdout/stderr, with colors and a progress
    /// bar when the streams are terminals.
    pub fn stdio(verbose: bool, format: OutputFormat) -> Self {
        let mut reporter = Self::new(io::stdout(), io::stderr(), verbose, format);
        reporter.color_out = console::colors_enabled();
        reporter.color_err = console::colors_enabled_stderr();
        reporter.progress_bar = console::Term::stderr().is_term();
        reporter
    }
}

impl<O: Write, E: Write> Reporter<O, E> {
    /// Reporter writing uncolored text to the given sinks.
    pub fn new(out: O, err: E, verbose: bool, format: OutputFormat) -> Self {
        Self {
            out,
            err,
            verbose,
            format,
            color_out: false,
            color_err: false,
            progress_bar: false,
            bar: None,
            total: 0,
            completed: 0,
            open: 0,
        }
    }

    /// Results received so far.
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Open results received so far.
    pub fn open(&self) -> usize {
        self.open
    }

    /// Report a target that could not be resolved.
    pub fn resolution_failed(&mut self, error: &TargetError) -> io::Result<()> {
        let prefix = paint(style("Warning:").yellow().bold(), self.color_err);
        self.write_err(format_args!("{} {}", prefix, error))
    }

    /// Report a port spec token that was skipped.
    pub fn port_skipped(&mut self, error: &PortError) -> io::Result<()> {
        let prefix = paint(style("Warning:").yellow().bold(), self.color_err);
        self.write_err(format_args!("{} skipping {}", prefix, error))
    }

    /// Announce the scan and reset counters.
    pub fn begin(&mut self, plan: &ScanPlan) -> io::Result<()> {
        self.total = plan.total();
        self.completed = 0;
        self.open = 0;

        writeln!(
            self.err,
            "Scanning {} target(s) across {} port(s) with timeout {} ms using {} worker(s){}",
            plan.addresses,
            plan.ports,
            plan.timeout.as_millis(),
            plan.workers,
            if self.verbose { " (verbose mode)" } else { "" }
        )?;

        if self.progress_bar && self.total > PROGRESS_THRESHOLD {
            let bar = ProgressBar::with_draw_target(
                Some(self.total as u64),
                ProgressDrawTarget::stderr(),
            );
            if let Ok(progress_style) = ProgressStyle::default_bar().template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%)",
            ) {
                bar.set_style(progress_style.progress_chars("=>-"));
            }
            self.bar = Some(bar);
        }
        Ok(())
    }

    /// Consume one result.
    ///
    /// A write failure ends the scan, so the progress bar is cleared before
    /// the error is returned.
    pub fn record(&mut self, result: &ScanResult) -> io::Result<()> {
        let written = self.tally(result);
        if written.is_err() {
            if let Some(bar) = self.bar.take() {
                bar.finish_and_clear();
            }
        }
        written
    }

    fn tally(&mut self, result: &ScanResult) -> io::Result<()> {
        self.completed += 1;
        if result.is_open() {
            self.open += 1;
        }

        if result.is_open() || self.verbose {
            self.write_result(result)?;
        }

        if self.total > PROGRESS_THRESHOLD && self.completed % PROGRESS_INTERVAL == 0 {
            match &self.bar {
                Some(bar) => bar.set_position(self.completed as u64),
                None => writeln!(
                    self.err,
                    "Progress: {}/{} scans completed ({}%)",
                    self.completed,
                    self.total,
                    self.completed * 100 / self.total
                )?,
            }
        }
        Ok(())
    }

    /// Print the final summary.
    pub fn finish(&mut self, summary: &ScanSummary) -> io::Result<()> {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }

        if summary.interrupted {
            writeln!(
                self.err,
                "Scan interrupted: {}/{} scans completed, {} target(s), {} port(s)",
                summary.completed, summary.scheduled, summary.addresses, summary.ports
            )?;
        } else {
            writeln!(
                self.err,
                "Scan completed: {} target(s), {} port(s)",
                summary.addresses, summary.ports
            )?;
        }
        self.out.flush()?;
        self.err.flush()
    }

    /// Recover the sinks.
    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }

    fn write_result(&mut self, result: &ScanResult) -> io::Result<()> {
        let line = match self.format {
            OutputFormat::Plain => {
                let status = if result.is_open() {
                    paint(style(result.status).green().bold(), self.color_out)
                } else {
                    paint(style(result.status).red(), self.color_out)
                };
                format!("{}:{} is {}", result.address, result.port, status)
            }
            OutputFormat::Json => serde_json::to_string(result).map_err(io::Error::other)?,
        };

        match &self.bar {
            Some(bar) => bar.suspend(|| writeln!(self.out, "{}", line)),
            None => writeln!(self.out, "{}", line),
        }
    }

    fn write_err(&mut self, args: std::fmt::Arguments<'_>) -> io::Result<()> {
        match &self.bar {
            Some(bar) => bar.suspend(|| writeln!(self.err, "{}", args)),
            None => writeln!(self.err, "{}", args),
        }
    }
}

fn paint<D>(styled: StyledObject<D>, enabled: bool) -> StyledObject<D> {
    styled.force_styling(enabled)
}
