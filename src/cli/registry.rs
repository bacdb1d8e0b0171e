use std::ops::RangeInclusive;

use crate::cli::shell::{CommandResult, ShellContext};
use crate::errors::CliError;

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

/// A shell command: how it is invoked, how many arguments it takes and
/// the function that runs it.
pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub summary: &'static str,
    pub usage: &'static str,
    pub arity: RangeInclusive<usize>,
    pub handler: CommandHandler,
}

impl CommandSpec {
    pub fn new(
        name: &'static str,
        summary: &'static str,
        usage: &'static str,
        arity: RangeInclusive<usize>,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            aliases: &[],
            summary,
            usage,
            arity,
            handler,
        }
    }

    pub fn with_aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    fn answers_to(&self, word: &str) -> bool {
        self.name.eq_ignore_ascii_case(word)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(word))
    }

    pub fn usage_error(&self) -> CliError {
        CliError::Input(format!("usage: {}", self.usage))
    }

    /// Rejects argument lists outside the command's arity before the
    /// handler sees them.
    pub fn check_arity(&self, args: &[&str]) -> Result<(), CliError> {
        if self.arity.contains(&args.len()) {
            Ok(())
        } else {
            Err(self.usage_error())
        }
    }
}

/// Commands in registration order; lookups accept names and aliases in
/// any case.
#[derive(Default)]
pub struct CommandRegistry {
    specs: Vec<CommandSpec>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Later registrations replace earlier ones with the same name.
    pub fn register(&mut self, spec: CommandSpec) {
        match self.specs.iter_mut().find(|known| known.name == spec.name) {
            Some(slot) => *slot = spec,
            None => self.specs.push(spec),
        }
    }

    pub fn resolve(&self, word: &str) -> Option<&CommandSpec> {
        self.specs.iter().find(|spec| spec.answers_to(word))
    }

    pub fn specs(&self) -> impl Iterator<Item = &CommandSpec> {
        self.specs.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.specs.iter().map(|spec| spec.name)
    }
}
