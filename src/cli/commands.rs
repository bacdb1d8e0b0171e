use std::{fs, path::Path};

use crate::cli::{
    help, output,
    registry::{CommandRegistry, CommandSpec},
    shell::{CommandResult, ShellContext},
};
use crate::core::services::{Direction, ListingRequest, RollupRequest};
use crate::errors::{CliError, RollupError};
use crate::utils::build_info;

pub(crate) fn registry() -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for spec in [
        CommandSpec::new(
            "load",
            "Load a JSON or JSON-lines dataset",
            "load <dataset-id> <path>",
            2..=2,
            cmd_load,
        ),
        CommandSpec::new("datasets", "List loaded datasets", "datasets", 0..=0, cmd_datasets)
            .with_aliases(&["ls"]),
        CommandSpec::new(
            "rollup",
            "Run a rollup request and print the JSON response",
            "rollup <request.json>",
            1..=1,
            cmd_rollup,
        ),
        CommandSpec::new(
            "table",
            "Run a rollup request and print it as a table",
            "table <request.json>",
            1..=1,
            cmd_table,
        ),
        CommandSpec::new(
            "list",
            "Page through the records of a dataset",
            "list <dataset-id> [--desc] [--page-size N] [--cursor TOKEN]",
            1..=6,
            cmd_list,
        ),
        CommandSpec::new(
            "config",
            "Show the active configuration, its file path, or save it to that file",
            "config [show|path|save]",
            0..=1,
            cmd_config,
        ),
        CommandSpec::new("version", "Show build information", "version", 0..=0, cmd_version),
        CommandSpec::new("help", "Show available commands", "help [command]", 0..=1, cmd_help)
            .with_aliases(&["?"]),
        CommandSpec::new("exit", "Leave the shell", "exit", 0..=0, cmd_exit)
            .with_aliases(&["quit"]),
    ] {
        registry.register(spec);
    }
    registry
}

fn usage_error(context: &ShellContext, command: &str) -> CliError {
    match context.registry.resolve(command) {
        Some(spec) => spec.usage_error(),
        None => CliError::Input(format!("usage: {}", command)),
    }
}

fn read_request(path: &str) -> Result<RollupRequest, CliError> {
    let data = fs::read_to_string(path)
        .map_err(|err| CliError::Input(format!("cannot read `{}`: {}", path, err)))?;
    Ok(RollupRequest::from_json(&data)?)
}

fn cmd_load(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [id, path] = args else {
        return Err(usage_error(context, "load"));
    };
    let source = context.engine.load_file(id, Path::new(path))?;
    output::success(format!("Loaded dataset `{}`: {}", id, source.describe()));
    Ok(())
}

fn cmd_datasets(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let registry = context.engine.registry();
    let ids = registry.ids()?;
    if ids.is_empty() {
        output::info("No datasets loaded.");
        return Ok(());
    }
    for id in ids {
        let source = registry.get(&id)?;
        println!("  {:<16} {}", id, source.describe());
    }
    Ok(())
}

fn cmd_rollup(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [path] = args else {
        return Err(usage_error(context, "rollup"));
    };
    let request = read_request(path)?;
    let response = context.engine.respond(&request)?;
    println!("{}", response.to_json_pretty()?);
    Ok(())
}

fn cmd_table(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [path] = args else {
        return Err(usage_error(context, "table"));
    };
    let request = read_request(path)?;
    let response = context.engine.respond(&request)?;
    let lines = output::rollup_table(&response, request.view, request.dimension);
    output::print_table(&lines);
    Ok(())
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((id, flags)) = args.split_first() else {
        return Err(usage_error(context, "list"));
    };
    let mut request = ListingRequest::new(*id);
    let mut flags = flags.iter();
    while let Some(flag) = flags.next() {
        match *flag {
            "--desc" => request = request.with_direction(Direction::Desc),
            "--asc" => request = request.with_direction(Direction::Asc),
            "--page-size" => {
                let size = flags
                    .next()
                    .and_then(|raw| raw.parse::<usize>().ok())
                    .ok_or_else(|| CliError::Input("--page-size expects a number".into()))?;
                request = request.with_page_size(size);
            }
            "--cursor" => {
                let token = flags
                    .next()
                    .ok_or_else(|| CliError::Input("--cursor expects a token".into()))?;
                request = request.with_cursor(*token);
            }
            other => return Err(CliError::Input(format!("unknown flag `{}`", other))),
        }
    }

    let page = context.engine.list(&request)?;
    for record in &page.records {
        println!(
            "  {:<20} {:>6} {:<6} {:<6} {:>16.2}",
            record.account_id,
            record.row_id,
            record.business_area,
            record.account_class,
            record.outstanding_amount
        );
    }
    match page.next_cursor {
        Some(token) => output::info(format!("Next cursor: {}", token)),
        None => output::info("End of listing."),
    }
    Ok(())
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().copied().unwrap_or("show") {
        "show" => {
            let json =
                serde_json::to_string_pretty(context.engine.config()).map_err(RollupError::from)?;
            println!("{}", json);
        }
        "path" => println!("{}", context.config.path().display()),
        "save" => {
            context.config.save(context.engine.config())?;
            output::success(format!(
                "Configuration saved to {}",
                context.config.path().display()
            ));
        }
        _ => return Err(usage_error(context, "config")),
    }
    Ok(())
}

fn cmd_version(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    println!("{}", build_info::current().summary());
    Ok(())
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first() {
        Some(name) => match context.registry.resolve(name) {
            Some(spec) => help::print_command(spec),
            None => context.suggest_command(name),
        },
        None => help::print_overview(&context.registry),
    }
    Ok(())
}

fn cmd_exit(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    context.running = false;
    output::info("Exiting shell.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigManager, EngineConfig};
    use std::io::Write;

    fn context() -> ShellContext {
        ShellContext::with_config(EngineConfig::default()).unwrap()
    }

    #[test]
    fn load_requires_two_arguments() {
        let mut context = context();
        let err = context.process_line("load only-id").expect_err("missing path");
        assert!(err.to_string().contains("load <dataset-id> <path>"));
    }

    #[test]
    fn load_then_list_registers_dataset() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(
            file,
            r#"[{{"accountId":"A","businessArea":"6210","outstandingAmount":1}}]"#
        )
        .unwrap();
        file.flush().unwrap();

        let mut context = context();
        let line = format!("load debts {}", file.path().display());
        context.process_line(&line).unwrap();
        assert_eq!(context.engine().registry().ids().unwrap(), vec!["debts"]);
        context.process_line("list debts --page-size 5").unwrap();
    }

    #[test]
    fn list_rejects_unknown_flags() {
        let mut context = context();
        let err = context
            .process_line("list debts --sideways")
            .expect_err("unknown flag");
        assert!(matches!(err, CliError::Input(_)));
    }

    #[test]
    fn config_save_writes_the_active_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let manager = ConfigManager::with_path(dir.path().join("config.json"));
        let mut context = ShellContext::with_manager(manager.clone()).unwrap();
        context.process_line("config show").unwrap();
        context.process_line("config save").unwrap();
        assert_eq!(manager.load().unwrap(), EngineConfig::default());

        let err = context.process_line("config drop").expect_err("bad subcommand");
        assert!(err.to_string().contains("config [show|path|save]"));
    }

    #[test]
    fn rollup_on_missing_dataset_surfaces_core_error() {
        let mut request = tempfile::NamedTempFile::new().unwrap();
        write!(
            request,
            r#"{{"datasetId":"ghost","view":"AgedDebt","dimension":"Station"}}"#
        )
        .unwrap();
        request.flush().unwrap();
        let mut context = context();
        let err = context
            .process_line(&format!("rollup {}", request.path().display()))
            .expect_err("unknown dataset");
        assert!(matches!(
            err,
            CliError::Core(RollupError::DatasetNotFound(_))
        ));
    }
}
