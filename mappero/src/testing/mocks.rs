//! Fake process runners for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

use crate::command::Command;
use crate::runner::{ProcessOutcome, ProcessRunner};

/// A runner that records every command and never spawns a process.
///
/// Commands succeed unless an outcome was scripted for their subcommand.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<Command>>,
    scripted: Mutex<HashMap<String, ProcessOutcome>>,
}

impl RecordingRunner {
    /// Creates a runner on which every command succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the outcome for commands with the given subcommand.
    #[must_use]
    pub fn respond_to(self, subcommand: impl Into<String>, outcome: ProcessOutcome) -> Self {
        self.scripted.lock().insert(subcommand.into(), outcome);
        self
    }

    /// Makes commands with the given subcommand exit with `exit_code`.
    #[must_use]
    pub fn fail_on(
        self,
        subcommand: impl Into<String>,
        exit_code: i32,
        stderr: impl Into<String>,
    ) -> Self {
        self.respond_to(subcommand, ProcessOutcome::failure(exit_code, stderr))
    }

    /// Returns the recorded commands in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<Command> {
        self.calls.lock().clone()
    }

    /// Returns the number of commands run.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the subcommand of each recorded command.
    #[must_use]
    pub fn subcommands(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| c.subcommand().map(str::to_string))
            .collect()
    }

    /// Clears recorded calls, keeping scripted outcomes.
    pub fn reset(&self) {
        self.calls.lock().clear();
    }
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn run(&self, command: &Command) -> ProcessOutcome {
        self.calls.lock().push(command.clone());
        command
            .subcommand()
            .and_then(|sub| self.scripted.lock().get(sub).cloned())
            .unwrap_or_else(|| ProcessOutcome::success(""))
    }
}
