//! Timers.
//!
//! - `Timer` - scoped, logs `TIME: ---> [label elapsed x s]` when dropped
//! - `CumTimer` - sums the duration of several tic/tac sections
//! - `CustomTimer` - per-category accumulation for the nonlinear solver (functions,
//!   jacobians, linear systems) with a summary for the statistics table
use log::info;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Logs the elapsed time in the most readable unit and returns the unit with the value.
pub fn elapsed_time(elapsed: Duration) -> (String, f64) {
    let time = elapsed.as_millis();
    if time < 1000 {
        info!("Elapsed {} ms", time);
        (" ms".to_string(), time as f64)
    } else if time < 60_000 {
        info!("Elapsed {} s", elapsed.as_secs());
        (" s".to_string(), elapsed.as_secs_f64())
    } else if time < 3_600_000 {
        info!("Elapsed {} min", elapsed.as_secs() / 60);
        (" min".to_string(), elapsed.as_secs_f64() / 60.0)
    } else {
        info!("Elapsed {} h", elapsed.as_secs() / 3600);
        (" h".to_string(), elapsed.as_secs_f64() / 3600.0)
    }
}

/// Measures the lifetime of a scope.
///
/// ```rust, ignore
/// {
///     let _t = Timer::new("collocation system");
///     // ... work
/// } // TIME: ---> [collocation system elapsed 0.0123 s]
/// ```
pub struct Timer {
    label: String,
    start: Instant,
    verbose: bool,
}

impl Timer {
    pub fn new(label: &str) -> Self {
        Timer {
            label: label.to_string(),
            start: Instant::now(),
            verbose: true,
        }
    }

    /// Timer that measures but does not log.
    pub fn silent(label: &str) -> Self {
        Timer {
            label: label.to_string(),
            start: Instant::now(),
            verbose: false,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn message(&self) -> String {
        format!(
            "---> [{} elapsed {:.6} s]",
            self.label,
            self.elapsed().as_secs_f64()
        )
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if self.verbose {
            info!("TIME: {}", self.message());
        }
    }
}

/// Accumulates the time of repeated sections.
#[derive(Debug, Clone, Default)]
pub struct CumTimer {
    total: Duration,
    started: Option<Instant>,
}

impl CumTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tic(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Adds the time since the last `tic`. A `tac` without `tic` adds nothing.
    pub fn tac(&mut self) {
        if let Some(start) = self.started.take() {
            self.total += start.elapsed();
        }
    }

    /// Times a closure and returns its value.
    pub fn measure<T>(&mut self, f: impl FnOnce() -> T) -> T {
        self.tic();
        let res = f();
        self.tac();
        res
    }

    pub fn total(&self) -> Duration {
        self.total
    }
}

#[derive(Debug, Clone)]
pub struct CustomTimer {
    pub start: Instant,
    pub fun: CumTimer,
    pub jac: CumTimer,
    pub linear_system: CumTimer,
}

impl CustomTimer {
    pub fn new() -> CustomTimer {
        CustomTimer {
            start: Instant::now(),
            fun: CumTimer::new(),
            jac: CumTimer::new(),
            linear_system: CumTimer::new(),
        }
    }
    pub fn start(&mut self) {
        *self = CustomTimer::new();
    }
    pub fn jac_tic(&mut self) {
        self.jac.tic();
    }
    pub fn jac_tac(&mut self) {
        self.jac.tac();
    }
    pub fn fun_tic(&mut self) {
        self.fun.tic();
    }
    pub fn fun_tac(&mut self) {
        self.fun.tac();
    }
    pub fn linear_system_tic(&mut self) {
        self.linear_system.tic();
    }
    pub fn linear_system_tac(&mut self) {
        self.linear_system.tac();
    }

    /// Share of the total time spent in each category, categories under 0.5 % are
    /// left out.
    pub fn get_all(&self) -> HashMap<String, String> {
        let mut timer_data: HashMap<String, String> = HashMap::new();
        let total = self.start.elapsed();
        let total_time = total.as_nanos() as f64;
        let total_time_string = elapsed_time(total);
        timer_data.insert(
            "time elapsed,".to_string() + total_time_string.0.as_str(),
            format!("{}", total_time_string.1),
        );
        if total_time == 0.0 {
            return timer_data;
        }
        for (name, cum) in [
            ("Function", &self.fun),
            ("Jacobian", &self.jac),
            ("Linear System", &self.linear_system),
        ] {
            let percent = 100.0 * cum.total().as_nanos() as f64 / total_time;
            if percent > 0.5 {
                timer_data.insert(
                    format!("{} (%)", name),
                    format!("{}", (percent * 1000.0).round() / 1000.0),
                );
            }
        }
        timer_data
    }
}

impl Default for CustomTimer {
    fn default() -> Self {
        Self::new()
    }
}
