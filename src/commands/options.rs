use anyhow::Result;
use colored::Colorize;
use declarative::OPTIONS;

use crate::Context;
use crate::ui;

pub fn run(ctx: &Context) -> Result<()> {
    ui::header("Options");

    if !ctx.quiet {
        ui::dim("Each option is looked up as a passed parameter, then <module>_<name>,");
        ui::dim("then <name>, then falls back to its default.");
        println!();
    }

    println!(
        "  {:<22} {:<20} {:<30} {}",
        "NAME".bold(),
        "TYPE".bold(),
        "DEFAULT".bold(),
        "DESCRIPTION".bold()
    );
    for spec in OPTIONS {
        println!(
            "  {:<22} {:<20} {:<30} {}",
            spec.name,
            spec.kind.to_string(),
            spec.default.to_string(),
            spec.description.dimmed()
        );
    }

    println!();
    ui::info(&format!("{} options", OPTIONS.len()));
    Ok(())
}
