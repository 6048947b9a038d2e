//! Bookkeeping shared by the simulation-driven solvers.

use std::io::Write;

use crate::error::Result;
use crate::math::MeanVariance;

/// Capacity of the state information cache used along a trajectory.
pub const CACHE_SIZE: usize = 100_000;

/// Tracks the cost along a trajectory and logs
/// `TIME: <t> AVG COST: <window mean> <overall mean>` every `every` steps.
#[derive(Debug, Clone)]
pub struct ProgressReport {
    every: usize,
    window: MeanVariance,
    overall: MeanVariance,
}

impl ProgressReport {
    /// `every == 0` disables the log line; costs are still tracked.
    pub fn new(every: usize) -> Self {
        Self {
            every,
            window: MeanVariance::new(),
            overall: MeanVariance::new(),
        }
    }

    pub fn add_cost(&mut self, cost: f64) {
        self.window.add_sample(cost);
        self.overall.add_sample(cost);
    }

    /// Call once per step, after the update for step `time`.
    pub fn report(&mut self, time: usize) {
        if self.every == 0 || (time + 1) % self.every != 0 {
            return;
        }
        log::info!(
            "TIME: {} AVG COST: {} {}",
            time + 1,
            self.window.mean().unwrap_or(f64::NAN),
            self.overall.mean().unwrap_or(f64::NAN)
        );
        self.window.clear();
    }

    /// Mean cost over the whole trajectory so far.
    pub fn average_cost(&self) -> Option<f64> {
        self.overall.mean()
    }
}

/// Writes `<t>,<r_0>,...,<r_k>` every `every` steps.
pub struct CoefficientTrace<'a> {
    out: Box<dyn Write + 'a>,
    every: usize,
}

impl<'a> CoefficientTrace<'a> {
    /// `None` when `every` is zero.
    pub fn new(out: Box<dyn Write + 'a>, every: usize) -> Option<Self> {
        (every > 0).then_some(Self { out, every })
    }

    pub fn record(&mut self, time: usize, weights: &[f64]) -> Result<()> {
        if (time + 1) % self.every != 0 {
            return Ok(());
        }
        write!(self.out, "{}", time + 1)?;
        for w in weights {
            write!(self.out, ",{}", w)?;
        }
        writeln!(self.out)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// `γ_A γ_B / (γ_B + t)`, or the constant `γ_A` when `γ_B <= 0`.
pub fn step_size(gamma_a: f64, gamma_b: f64, t: f64) -> f64 {
    if gamma_b > 0.0 {
        gamma_a * gamma_b / (gamma_b + t)
    } else {
        gamma_a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Shared(Rc<RefCell<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_trace_every_other_step() -> Result<()> {
        let buffer = Rc::new(RefCell::new(Vec::new()));
        let mut trace = CoefficientTrace::new(Box::new(Shared(Rc::clone(&buffer))), 2).unwrap();
        trace.record(0, &[1.0, 2.0])?;
        trace.record(1, &[1.5, -2.0])?;
        trace.record(2, &[3.0, 4.0])?;
        trace.flush()?;
        assert_eq!(String::from_utf8(buffer.borrow().clone()).unwrap(), "2,1.5,-2\n");
        assert!(CoefficientTrace::new(Box::new(std::io::sink()), 0).is_none());
        Ok(())
    }

    #[test]
    fn test_step_size() {
        assert_eq!(step_size(0.5, 0.0, 100.0), 0.5);
        assert_eq!(step_size(0.5, 10.0, 10.0), 0.25);
    }

    #[test]
    fn test_progress_average() {
        let mut progress = ProgressReport::new(2);
        progress.add_cost(1.0);
        progress.report(0);
        progress.add_cost(3.0);
        progress.report(1);
        assert_eq!(progress.average_cost(), Some(2.0));
    }
}
