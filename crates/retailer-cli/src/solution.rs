//! Solution command - show one solution and what it pulls in.

use anyhow::{Context, Result};
use clap::Args;
use console::style;
use std::sync::Arc;

use retailer_core::repository::flatten;
use retailer_core::solution::PseudoId;
use retailer_core::SolutionMap;

use crate::workspace::{StoreArgs, Workspace};

#[derive(Args, Debug)]
pub struct SolutionArgs {
    /// Solution reference, e.g. "ecommerce #12"
    #[arg(value_name = "PSEUDO_ID")]
    pub pseudo_id: String,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Also list every solution required directly or transitively
    #[arg(long)]
    pub flatten: bool,
}

pub async fn execute(args: SolutionArgs) -> Result<i32> {
    let pseudo_id: PseudoId = args
        .pseudo_id
        .parse()
        .with_context(|| format!("\"{}\" is not a solution reference", args.pseudo_id))?;

    let workspace = Workspace::load(&args.store)?;
    let solution = Arc::new(workspace.factory.from_pseudo_id(&pseudo_id)?);

    println!("{} : {}", style("name").bold(), solution.name());
    println!("{} : {}", style("package").bold(), solution.package_name());
    println!("{} : {}", style("type").bold(), solution.solution_type());
    println!("{} : {}", style("visibility").bold(), solution.visibility());
    if let Some(description) = solution.description() {
        println!("{} : {}", style("description").bold(), description);
    }

    if !solution.required_solutions().is_empty() {
        println!();
        println!("{}", style("requires").bold());
        for reference in solution.required_solutions().values() {
            println!("  {}", reference);
        }
    }

    if !solution.excluded_solutions().is_empty() {
        println!();
        println!("{}", style("excludes").bold());
        for reference in solution.excluded_solutions().values() {
            println!("  {} ({})", reference.package_name, reference.pseudo_id);
        }
    }

    if !solution.required_parts().is_empty() {
        println!();
        println!("{}", style("parts").bold());
        for part in solution.required_parts().values() {
            println!("  {} {}", part.package_name, style(&part.version_range).dim());
        }
    }

    if args.flatten {
        let working = SolutionMap::from([(solution.package_name().to_string(), Arc::clone(&solution))]);
        let flattened = flatten(working, &workspace.factory);

        println!();
        println!("{}", style("flattened").bold());
        for (package_name, member) in &flattened {
            let marker = if package_name == solution.package_name() { "*" } else { " " };
            println!("{} {}", marker, member.identity());
        }
    }

    Ok(0)
}
