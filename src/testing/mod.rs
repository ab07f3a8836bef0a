//! Conformance test execution
//!
//! [`CaseRunner`] drives each test case through its prepare, test and
//! cleanup calls and judges the response. Outcomes go to a [`Reporter`],
//! which hands them to the configured [`Emitter`]s (console, JSON, JUnit).

mod junit;
mod outcome;
mod report;
mod runner;

pub use junit::JUnitEmitter;
pub use outcome::{Outcome, Phase};
pub use report::{ConsoleEmitter, Emitter, JsonEmitter, Reporter, Tally};
pub use runner::{CaseRunner, CANCELLED, IGNORED};
