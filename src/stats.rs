use crate::error::{DatasetError, Result};
use chrono::Utc;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Progress reporting for an inference run.
///
/// Prints a single overwriting progress line to stdout and appends the last
/// line of every pass to a log file, under a UTC timestamp header written
/// when the run starts.
pub struct Stats {
    stopwatch: Instant,
    items: usize,
    log_output: String,
    log_path: PathBuf,
    f_handle: File,
}

impl Stats {
    pub fn new(log_path: &Path) -> Result<Self> {
        if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DatasetError::io(parent, e))?;
        }

        let f_handle = File::options()
            .create(true)
            .append(true)
            .open(log_path)
            .map_err(|e| DatasetError::io(log_path, e))?;
        let now = Utc::now();

        writeln!(&f_handle, "\n----{}----\n", now.format("%Y-%m-%d %H:%M:%S"))
            .map_err(|e| DatasetError::io(log_path, e))?;

        Ok(Stats {
            stopwatch: Instant::now(),
            items: 0,
            log_output: String::new(),
            log_path: log_path.to_path_buf(),
            f_handle,
        })
    }

    /// Records `batch_len` more processed items of `total`.
    pub fn update(&mut self, batch_len: usize, total: usize, name: &str) {
        if batch_len == 0 {
            return;
        }

        self.items += batch_len;
        let elapsed = self.stopwatch.elapsed().as_secs();

        self.log_output = format!(
            "{},I:{}/{},T:{}m{}s\r",
            name,
            self.items,
            total,
            elapsed / 60,
            elapsed % 60
        );

        print!("{}", &self.log_output);
        // Progress output is best effort.
        std::io::stdout().flush().ok();
    }

    pub fn items(&self) -> usize {
        self.items
    }

    /// Appends the latest progress line to the log and resets the counters.
    pub fn flush(&mut self) -> Result<()> {
        writeln!(self.f_handle, "{}", self.log_output.trim_end_matches('\r'))
            .map_err(|e| DatasetError::io(&self.log_path, e))?;
        self.stopwatch = Instant::now();
        self.items = 0;
        println!();
        Ok(())
    }
}
