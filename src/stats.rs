//! Statistics collection and export.
//!
//! Each coordinator counts what happens to its own children in a
//! [`CycleStats`]. The root folds the counters of the whole tree into a
//! [`SimulationStats`] report that can be exported as JSON or CSV.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use crate::simulator::Transition;
use crate::time::SimTime;

/// Counters kept by a coordinator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleStats {
    /// Cycles driven from the root (only the root increments this)
    pub cycles: u64,
    /// Output function evaluations of atomic models
    pub lambdas: u64,
    /// Internal transitions
    pub internal_transitions: u64,
    /// External transitions
    pub external_transitions: u64,
    /// Confluent transitions
    pub confluent_transitions: u64,
    /// Event copies delivered to a destination port
    pub events_routed: u64,
    /// Events emitted on a declared but uncoupled port
    pub events_discarded: u64,
    /// Events emitted on a port the model never declared
    pub events_undeclared: u64,
}

impl CycleStats {
    /// Counts one applied transition.
    pub fn record_transition(&mut self, kind: Transition) {
        match kind {
            Transition::Internal => self.internal_transitions += 1,
            Transition::External => self.external_transitions += 1,
            Transition::Confluent => self.confluent_transitions += 1,
        }
    }

    /// Total transitions of any kind.
    pub fn transitions(&self) -> u64 {
        self.internal_transitions + self.external_transitions + self.confluent_transitions
    }

    /// Adds another set of counters into this one.
    pub fn merge(&mut self, other: &CycleStats) {
        self.cycles += other.cycles;
        self.lambdas += other.lambdas;
        self.internal_transitions += other.internal_transitions;
        self.external_transitions += other.external_transitions;
        self.confluent_transitions += other.confluent_transitions;
        self.events_routed += other.events_routed;
        self.events_discarded += other.events_discarded;
        self.events_undeclared += other.events_undeclared;
    }
}

/// Report of one simulation run.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SimulationStats {
    /// Name of the top coupled model
    pub name: String,
    /// Start of the simulated span
    pub t0: SimTime,
    /// End of the simulated span
    pub tend: SimTime,
    /// Time of the last executed cycle
    pub final_time: SimTime,
    /// Counters summed over the whole model tree
    pub counters: CycleStats,
    /// Wall-clock duration of `run()` in milliseconds
    pub wall_time_ms: f64,
}

impl SimulationStats {
    /// Exports statistics to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Exports statistics to a JSON file.
    pub fn to_json_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let json = self
            .to_json()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, json)
    }

    /// Exports statistics to CSV (`metric,value` rows).
    pub fn to_csv(&self) -> String {
        let c = &self.counters;
        let mut csv = String::new();
        csv.push_str("metric,value\n");
        csv.push_str(&format!("t0,{}\n", self.t0));
        csv.push_str(&format!("tend,{}\n", self.tend));
        csv.push_str(&format!("final_time,{}\n", self.final_time));
        csv.push_str(&format!("cycles,{}\n", c.cycles));
        csv.push_str(&format!("lambdas,{}\n", c.lambdas));
        csv.push_str(&format!("internal_transitions,{}\n", c.internal_transitions));
        csv.push_str(&format!("external_transitions,{}\n", c.external_transitions));
        csv.push_str(&format!("confluent_transitions,{}\n", c.confluent_transitions));
        csv.push_str(&format!("events_routed,{}\n", c.events_routed));
        csv.push_str(&format!("events_discarded,{}\n", c.events_discarded));
        csv.push_str(&format!("events_undeclared,{}\n", c.events_undeclared));
        csv.push_str(&format!("wall_time_ms,{:.2}\n", self.wall_time_ms));
        csv
    }

    /// Exports statistics to a CSV file.
    pub fn to_csv_file<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        std::fs::write(path, self.to_csv())
    }

    /// Writes a human-readable summary to a writer.
    pub fn write_summary<W: Write>(&self, mut w: W) -> std::io::Result<()> {
        let c = &self.counters;
        writeln!(w, "=== Simulation Statistics ===")?;
        if !self.name.is_empty() {
            writeln!(w, "Model: {}", self.name)?;
        }
        writeln!(w, "Span: [{}, {}]", self.t0, self.tend)?;
        writeln!(w, "Final time: {}", self.final_time)?;
        writeln!(w, "Cycles: {}", c.cycles)?;
        writeln!(w, "Lambdas: {}", c.lambdas)?;
        writeln!(
            w,
            "Transitions: {} (int {}, ext {}, conf {})",
            c.transitions(),
            c.internal_transitions,
            c.external_transitions,
            c.confluent_transitions
        )?;
        writeln!(
            w,
            "Events: {} routed, {} discarded, {} undeclared",
            c.events_routed, c.events_discarded, c.events_undeclared
        )?;
        writeln!(w, "Wall time: {:.2} ms", self.wall_time_ms)?;
        Ok(())
    }

    /// Returns the summary as a string.
    pub fn summary(&self) -> String {
        let mut buf = Vec::new();
        // writing into a Vec cannot fail
        let _ = self.write_summary(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

/// A simple timer for measuring wall-clock time of a run.
#[derive(Debug)]
pub struct Timer {
    start: std::time::Instant,
}

impl Timer {
    /// Starts a new timer.
    pub fn start() -> Self {
        Self {
            start: std::time::Instant::now(),
        }
    }

    /// Returns elapsed time in milliseconds.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::start()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_merge() {
        let mut a = CycleStats::default();
        a.record_transition(Transition::Internal);
        a.record_transition(Transition::Confluent);
        a.lambdas = 2;

        let mut b = CycleStats::default();
        b.record_transition(Transition::External);
        b.events_routed = 3;

        a.merge(&b);
        assert_eq!(a.transitions(), 3);
        assert_eq!(a.external_transitions, 1);
        assert_eq!(a.events_routed, 3);
        assert_eq!(a.lambdas, 2);
    }

    #[test]
    fn test_csv_export() {
        let stats = SimulationStats {
            name: "root".to_string(),
            t0: SimTime::ZERO,
            tend: SimTime::new(10.0),
            final_time: SimTime::new(10.0),
            counters: CycleStats {
                cycles: 11,
                ..Default::default()
            },
            wall_time_ms: 0.0,
        };
        let csv = stats.to_csv();
        assert!(csv.starts_with("metric,value\n"));
        assert!(csv.contains("cycles,11\n"));
        assert!(csv.contains("final_time,10\n"));
    }

    #[test]
    fn test_json_and_summary() {
        let stats = SimulationStats {
            name: "root".to_string(),
            tend: SimTime::INFINITY,
            ..Default::default()
        };
        let json: serde_json::Value = serde_json::from_str(&stats.to_json().unwrap()).unwrap();
        assert_eq!(json["tend"], "inf");
        assert!(stats.summary().contains("Model: root"));
    }

    #[test]
    fn test_timer() {
        let timer = Timer::start();
        assert!(timer.elapsed_ms() >= 0.0);
    }
}
