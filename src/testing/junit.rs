//! JUnit XML report for CI systems

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use super::outcome::Outcome;
use super::report::{Emitter, Tally};
use crate::common::{Error, Result};

const SUITE_NAME: &str = "tck";

/// Writes all outcomes to a JUnit XML file when the run finishes
pub struct JUnitEmitter {
    path: PathBuf,
}

impl JUnitEmitter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Emitter for JUnitEmitter {
    fn case_finished(&mut self, _outcome: &Outcome) -> Result<()> {
        Ok(())
    }

    fn run_finished(&mut self, outcomes: &[Outcome], tally: &Tally) -> Result<()> {
        let xml = render(outcomes, tally);
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, xml).map_err(|e| {
            Error::Internal(format!(
                "Failed to write JUnit report '{}': {}",
                self.path.display(),
                e
            ))
        })?;
        tracing::info!(path = %self.path.display(), "JUnit report written");
        Ok(())
    }
}

/// Render a JUnit document with a single test suite
pub fn render(outcomes: &[Outcome], tally: &Tally) -> String {
    let total: Duration = outcomes.iter().map(|o| o.duration).sum();
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");

    let counts = format!(
        "tests=\"{}\" failures=\"{}\" errors=\"0\" skipped=\"{}\" time=\"{}\"",
        tally.total,
        tally.failed,
        tally.skipped,
        seconds(total)
    );
    xml.push_str(&format!("<testsuites name=\"{}\" {}>\n", SUITE_NAME, counts));
    xml.push_str(&format!("  <testsuite name=\"{}\" {}>\n", SUITE_NAME, counts));

    for outcome in outcomes {
        xml.push_str(&format!(
            "    <testcase name=\"{}\" classname=\"{}\" time=\"{}\"",
            escape(&outcome.name),
            SUITE_NAME,
            seconds(outcome.duration)
        ));

        if outcome.passed {
            xml.push_str("/>\n");
            continue;
        }

        xml.push_str(">\n");
        let diagnostic = outcome.diagnostic.as_deref().unwrap_or_default();
        if outcome.skipped {
            xml.push_str(&format!(
                "      <skipped message=\"{}\"/>\n",
                escape(diagnostic)
            ));
        } else {
            let phase = outcome
                .phase_failed
                .map(|p| p.to_string())
                .unwrap_or_default();
            let message = diagnostic.lines().next().unwrap_or_default();
            xml.push_str(&format!(
                "      <failure message=\"{}\" type=\"{}\">{}</failure>\n",
                escape(message),
                phase,
                escape(diagnostic)
            ));
            if let Some(response) = &outcome.response {
                xml.push_str(&format!(
                    "      <system-out>{}</system-out>\n",
                    escape(response)
                ));
            }
        }
        xml.push_str("    </testcase>\n");
    }

    xml.push_str("  </testsuite>\n</testsuites>\n");
    xml
}

fn seconds(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64())
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            '\t' | '\n' | '\r' => escaped.push(c),
            c if (c as u32) < 0x20 => {}
            c => escaped.push(c),
        }
    }
    escaped
}
