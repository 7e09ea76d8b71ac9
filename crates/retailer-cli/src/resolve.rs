//! Resolve command - print the manifest of a composition.

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;

use crate::workspace::{StoreArgs, Workspace};

#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Composition JSON file
    #[arg(value_name = "COMPOSITION")]
    pub composition: PathBuf,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Output format: text or json
    #[arg(short = 'f', long, default_value = "json")]
    pub format: String,
}

pub async fn execute(args: ResolveArgs) -> Result<i32> {
    if args.format != "text" && args.format != "json" {
        eprintln!("Error: Unsupported format '{}'. Use 'text' or 'json'.", args.format);
        return Ok(1);
    }

    let workspace = Workspace::load(&args.store)?;
    let composition = workspace.load_composition(&args.composition)?;
    let resolution = workspace.assembler().resolve(&composition);

    if args.format == "json" {
        println!("{}", resolution.manifest.to_json()?);
        for warning in &resolution.warnings {
            eprintln!("{} {}", style("Warning:").yellow().bold(), warning);
        }
        return Ok(0);
    }

    println!(
        "{} {} ({})",
        style("Composition").bold(),
        style(&composition.name).cyan(),
        composition.status
    );

    println!();
    println!("{}", style("Solutions:").bold());
    for package_name in resolution.solutions.keys() {
        let range = resolution
            .manifest
            .composer_require
            .get(package_name)
            .map(String::as_str)
            .unwrap_or("*");
        println!("  {} {}", style(package_name).green(), style(range).dim());
    }

    if !resolution.excluded.is_empty() {
        println!();
        println!("{}", style("Excluded:").bold());
        for (package_name, excluded_by) in &resolution.excluded {
            println!("  {} (by {})", style(package_name).red(), excluded_by);
        }
    }

    if !resolution.manifest.required_parts.is_empty() {
        println!();
        println!("{}", style("Parts:").bold());
        for part in resolution.manifest.required_parts.values() {
            println!("  {} {}", part.package_name, style(&part.version_range).dim());
        }
    }

    for warning in &resolution.warnings {
        eprintln!("{} {}", style("Warning:").yellow().bold(), warning);
    }

    Ok(0)
}
