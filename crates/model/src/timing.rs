//! Per-step phase timing log.
//!
//! One file per worker, `cpu_solve_<worker>.out`, with a header line and one
//! whitespace-separated line per step:
//!
//! ```text
//! time    get_problem    updateState    balance    solveBuffer    unbalance    rank_id
//! 0.001    0.000012    0.000104    0.000051    0.003310    0.000048    0
//! ```

use chembal_types::WorkerId;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const TIMING_LOG_HEADER: &str =
    "time    get_problem    updateState    balance    solveBuffer    unbalance    rank_id";

/// Wall time spent in each phase of one step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PhaseTimings {
    pub get_problem: Duration,
    pub update_state: Duration,
    pub balance: Duration,
    pub solve_buffer: Duration,
    pub unbalance: Duration,
}

impl PhaseTimings {
    pub fn total(&self) -> Duration {
        self.get_problem + self.update_state + self.balance + self.solve_buffer + self.unbalance
    }

    /// Phase names paired with their durations, in step order.
    pub fn phases(&self) -> [(&'static str, Duration); 5] {
        [
            ("get_problem", self.get_problem),
            ("update_state", self.update_state),
            ("balance", self.balance),
            ("solve_buffer", self.solve_buffer),
            ("unbalance", self.unbalance),
        ]
    }
}

/// Appends one line per step to a worker's timing file.
pub struct TimingLog {
    worker: WorkerId,
    path: PathBuf,
    out: BufWriter<File>,
}

impl TimingLog {
    /// Create (or truncate) `dir/cpu_solve_<worker>.out` and write the header.
    pub fn create(dir: &Path, worker: WorkerId) -> io::Result<Self> {
        let path = dir.join(format!("cpu_solve_{}.out", worker));
        let mut out = BufWriter::new(File::create(&path)?);
        writeln!(out, "{TIMING_LOG_HEADER}")?;
        out.flush()?;
        Ok(Self { worker, path, out })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append the line for the step at simulation time `time`.
    pub fn record(&mut self, time: f64, timings: &PhaseTimings) -> io::Result<()> {
        writeln!(
            self.out,
            "{}    {:.6}    {:.6}    {:.6}    {:.6}    {:.6}    {}",
            time,
            timings.get_problem.as_secs_f64(),
            timings.update_state.as_secs_f64(),
            timings.balance.as_secs_f64(),
            timings.solve_buffer.as_secs_f64(),
            timings.unbalance.as_secs_f64(),
            self.worker,
        )?;
        self.out.flush()
    }
}
