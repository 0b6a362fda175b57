//! Command type and the parameter-to-token builder.

use super::StageParameters;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An external process invocation: a program followed by ordered argument
/// tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    program: String,
    args: Vec<String>,
}

impl Command {
    /// Creates a command with the given program and leading arguments.
    #[must_use]
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the arguments after the program name.
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the first argument, which is the tool subcommand for every
    /// stage this crate builds.
    #[must_use]
    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }

    /// Returns all tokens, program first.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str))
    }

    /// Returns the value token following `--<flag>`, if present.
    #[must_use]
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        let wanted = format!("--{flag}");
        self.args
            .iter()
            .position(|a| *a == wanted)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Returns true if `--<flag>` appears in the arguments.
    #[must_use]
    pub fn has_flag(&self, flag: &str) -> bool {
        let wanted = format!("--{flag}");
        self.args.iter().any(|a| *a == wanted)
    }

    fn push_param(&mut self, key: &str, token: String) {
        self.args.push(format!("--{key}"));
        self.args.push(token);
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens().collect::<Vec<_>>().join(" "))
    }
}

/// Builds a command from a base invocation and a parameter set.
///
/// Every present parameter contributes a `--key` token followed by its value
/// token, in the parameter set's order. Absent parameters contribute nothing.
/// Flag names and value types are not validated here.
#[must_use]
pub fn build_command(program: &str, base_args: &[&str], params: StageParameters) -> Command {
    let mut command = Command::new(program, base_args.iter().copied());
    for (key, value) in params {
        if let Some(token) = value.to_token() {
            command.push_param(&key, token);
        }
    }
    command
}
