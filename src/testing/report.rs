//! Collection and emission of test outcomes
//!
//! The [`Reporter`] owns every [`Outcome`] of a run, in submission order,
//! and forwards each one to its [`Emitter`]s as it arrives.

use std::io::Write;

use colored::Colorize;
use serde::Serialize;

use super::outcome::Outcome;
use crate::common::{preview, Result};

/// Longest response preview printed for a failing case
const RESPONSE_PREVIEW_CHARS: usize = 400;

/// Counts of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub total: usize,
}

impl Tally {
    pub fn from_outcomes(outcomes: &[Outcome]) -> Self {
        let mut tally = Tally::default();
        for outcome in outcomes {
            tally.add(outcome);
        }
        tally
    }

    fn add(&mut self, outcome: &Outcome) {
        self.total += 1;
        if outcome.passed {
            self.passed += 1;
        } else if outcome.skipped {
            self.skipped += 1;
        } else {
            self.failed += 1;
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Receives outcomes as the run progresses
pub trait Emitter: Send {
    /// Called once per case, in submission order
    fn case_finished(&mut self, outcome: &Outcome) -> Result<()>;

    /// Called once after the last case
    fn run_finished(&mut self, outcomes: &[Outcome], tally: &Tally) -> Result<()>;
}

/// Owns the outcomes of a run
#[derive(Default)]
pub struct Reporter {
    outcomes: Vec<Outcome>,
    tally: Tally,
    emitters: Vec<Box<dyn Emitter>>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_emitter(mut self, emitter: impl Emitter + 'static) -> Self {
        self.emitters.push(Box::new(emitter));
        self
    }

    /// Record the outcome of one case
    pub fn record(&mut self, outcome: Outcome) -> Result<()> {
        for emitter in &mut self.emitters {
            emitter.case_finished(&outcome)?;
        }
        self.tally.add(&outcome);
        self.outcomes.push(outcome);
        Ok(())
    }

    /// Notify emitters that the run is over
    pub fn finish(&mut self) -> Result<Tally> {
        for emitter in &mut self.emitters {
            emitter.run_finished(&self.outcomes, &self.tally)?;
        }
        Ok(self.tally)
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn into_outcomes(self) -> Vec<Outcome> {
        self.outcomes
    }
}

/// Human-readable progress on stdout
pub struct ConsoleEmitter {
    verbose: bool,
}

impl ConsoleEmitter {
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }
}

impl Emitter for ConsoleEmitter {
    fn case_finished(&mut self, outcome: &Outcome) -> Result<()> {
        let millis = outcome.duration.as_millis();

        if outcome.passed {
            println!(
                "  {} {} {}",
                "✓".green(),
                outcome.name,
                format!("({}ms)", millis).dimmed()
            );
            return Ok(());
        }

        if outcome.skipped {
            let reason = outcome.diagnostic.as_deref().unwrap_or("skipped");
            println!(
                "  {} {} {}",
                "-".yellow(),
                outcome.name.dimmed(),
                format!("({})", reason).yellow()
            );
            return Ok(());
        }

        let phase = outcome
            .phase_failed
            .map(|p| p.to_string())
            .unwrap_or_default();
        println!(
            "  {} {} {}",
            "✗".red(),
            outcome.name.white().bold(),
            format!("[{}]", phase).red()
        );
        if let Some(diagnostic) = &outcome.diagnostic {
            for line in diagnostic.lines() {
                println!("      {}", line);
            }
        }
        if self.verbose {
            if let Some(response) = &outcome.response {
                println!(
                    "      {} {}",
                    "response:".dimmed(),
                    preview(response, RESPONSE_PREVIEW_CHARS).dimmed()
                );
            }
        }
        Ok(())
    }

    fn run_finished(&mut self, _outcomes: &[Outcome], tally: &Tally) -> Result<()> {
        let summary = format!(
            "{} passed, {} failed, {} skipped ({} total)",
            tally.passed, tally.failed, tally.skipped, tally.total
        );
        if tally.is_success() {
            println!("\n{} {}\n", "✓".green().bold(), summary.green().bold());
        } else {
            println!("\n{} {}\n", "✗".red().bold(), summary.red().bold());
        }
        Ok(())
    }
}

#[derive(Serialize)]
struct RunSummary<'a> {
    tally: &'a Tally,
    outcomes: &'a [Outcome],
}

/// JSON summary of the whole run, written once at the end
pub struct JsonEmitter<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonEmitter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write + Send> Emitter for JsonEmitter<W> {
    fn case_finished(&mut self, _outcome: &Outcome) -> Result<()> {
        Ok(())
    }

    fn run_finished(&mut self, outcomes: &[Outcome], tally: &Tally) -> Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, &RunSummary { tally, outcomes })?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::Phase;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    fn sample() -> Vec<Outcome> {
        vec![
            Outcome::pass("a", "{}".to_string(), Duration::ZERO),
            Outcome::fail("b", Phase::Test, "Status 500 - Internal Server Error", None, Duration::ZERO),
            Outcome::skipped("c", "ignored"),
        ]
    }

    #[derive(Clone, Default)]
    struct Recording(Arc<Mutex<Vec<String>>>);

    impl Emitter for Recording {
        fn case_finished(&mut self, outcome: &Outcome) -> Result<()> {
            self.0.lock().unwrap().push(outcome.name.clone());
            Ok(())
        }

        fn run_finished(&mut self, _outcomes: &[Outcome], tally: &Tally) -> Result<()> {
            self.0.lock().unwrap().push(format!("done {}", tally.total));
            Ok(())
        }
    }

    #[test]
    fn test_tally() {
        let tally = Tally::from_outcomes(&sample());
        assert_eq!(
            tally,
            Tally {
                passed: 1,
                failed: 1,
                skipped: 1,
                total: 3
            }
        );
        assert!(!tally.is_success());
    }

    #[test]
    fn test_reporter_forwards_in_order() {
        let recording = Recording::default();
        let mut reporter = Reporter::new().with_emitter(recording.clone());
        for outcome in sample() {
            reporter.record(outcome).unwrap();
        }
        let tally = reporter.finish().unwrap();

        assert_eq!(tally, Tally::from_outcomes(reporter.outcomes()));
        assert_eq!(*recording.0.lock().unwrap(), ["a", "b", "c", "done 3"]);
    }

    #[test]
    fn test_json_summary() {
        let mut buffer = Vec::new();
        let outcomes = sample();
        JsonEmitter::new(&mut buffer)
            .run_finished(&outcomes, &Tally::from_outcomes(&outcomes))
            .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(value["tally"]["failed"], 1);
        assert_eq!(value["outcomes"][1]["phase_failed"], "test");
        assert_eq!(value["outcomes"].as_array().unwrap().len(), 3);
    }
}
