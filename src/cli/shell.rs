use std::io::{self, BufRead, IsTerminal, Write};

use shell_words::split;
use strsim::levenshtein;

use crate::cli::{commands, output, registry::CommandRegistry};
use crate::config::{ConfigManager, EngineConfig};
use crate::core::RollupEngine;
use crate::errors::CliError;

const PROMPT: &str = "debt> ";
const SUGGESTION_DISTANCE: usize = 3;

pub type CommandResult = Result<(), CliError>;

/// Runs the shell over stdin until `exit` or end of input. A prompt is
/// shown only when stdin is a terminal.
pub fn run_cli() -> Result<(), CliError> {
    let mut context = ShellContext::new()?;
    let stdin = io::stdin();
    let interactive = stdin.is_terminal();
    let mut lines = stdin.lock().lines();

    while context.running {
        if interactive {
            print!("{PROMPT}");
            io::stdout().flush()?;
        }
        let Some(line) = lines.next() else {
            break;
        };
        if let Err(err) = context.process_line(&line?) {
            output::error(err);
        }
    }
    Ok(())
}

/// Engine and command table shared by every command of a session.
pub struct ShellContext {
    pub(crate) engine: RollupEngine,
    pub(crate) registry: CommandRegistry,
    pub(crate) config: ConfigManager,
    pub(crate) running: bool,
}

impl ShellContext {
    /// Loads configuration from the default location.
    pub fn new() -> Result<Self, CliError> {
        Self::with_manager(ConfigManager::new())
    }

    /// Loads configuration through `manager`; `config save` writes back
    /// to the same file.
    pub fn with_manager(manager: ConfigManager) -> Result<Self, CliError> {
        let config = manager.load()?;
        tracing::debug!(path = %manager.path().display(), "configuration loaded");
        Self::build(config, manager)
    }

    pub fn with_config(config: EngineConfig) -> Result<Self, CliError> {
        Self::build(config, ConfigManager::new())
    }

    fn build(config: EngineConfig, manager: ConfigManager) -> Result<Self, CliError> {
        Ok(Self {
            engine: RollupEngine::new(config)?.with_cache(),
            registry: commands::registry(),
            config: manager,
            running: true,
        })
    }

    pub fn engine(&self) -> &RollupEngine {
        &self.engine
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn process_line(&mut self, line: &str) -> CommandResult {
        let tokens = split(line).map_err(|err| CliError::Input(err.to_string()))?;
        let Some((raw, rest)) = tokens.split_first() else {
            return Ok(());
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();
        self.dispatch(raw, &args)
    }

    fn dispatch(&mut self, command: &str, args: &[&str]) -> CommandResult {
        let Some(spec) = self.registry.resolve(command) else {
            self.suggest_command(&command.to_lowercase());
            return Ok(());
        };
        spec.check_arity(args)?;
        let handler = spec.handler;
        tracing::debug!(command = spec.name, args = args.len(), "dispatching command");
        handler(self, args)
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, input), name))
            .min_by_key(|(distance, _)| *distance);

        if let Some((distance, name)) = best {
            if distance <= SUGGESTION_DISTANCE {
                output::info(format!("Suggestion: `{}`?", name));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_stops_the_session() {
        let mut context = ShellContext::with_config(EngineConfig::default()).unwrap();
        context.process_line("   ").unwrap();
        assert!(context.is_running());
        context.process_line("QUIT").unwrap();
        assert!(!context.is_running());
    }

    #[test]
    fn unbalanced_quotes_are_input_errors() {
        let mut context = ShellContext::with_config(EngineConfig::default()).unwrap();
        let err = context.process_line("load \"oops").expect_err("bad quoting");
        assert!(matches!(err, CliError::Input(_)));
    }

    #[test]
    fn unknown_command_keeps_running() {
        let mut context = ShellContext::with_config(EngineConfig::default()).unwrap();
        context.process_line("rolup").unwrap();
        assert!(context.is_running());
    }

    #[test]
    fn arity_is_checked_before_the_handler_runs() {
        let mut context = ShellContext::with_config(EngineConfig::default()).unwrap();
        let err = context.process_line("exit now").expect_err("extra argument");
        assert!(err.to_string().contains("usage: exit"));
        assert!(context.is_running());
    }
}
