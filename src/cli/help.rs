use crate::cli::output;
use crate::cli::registry::{CommandRegistry, CommandSpec};

pub fn print_overview(registry: &CommandRegistry) {
    output::section("Commands");
    for spec in registry.specs() {
        println!("  {:<10} {}", spec.name, spec.summary);
    }
    println!("Use `help <command>` for usage.");
}

pub fn print_command(spec: &CommandSpec) {
    output::section(spec.name);
    println!("  {}", spec.summary);
    println!("  Usage: {}", spec.usage);
    if !spec.aliases.is_empty() {
        println!("  Aliases: {}", spec.aliases.join(", "));
    }
}
