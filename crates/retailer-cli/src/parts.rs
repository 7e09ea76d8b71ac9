//! Parts command - list the parts catalogue.

use anyhow::Result;
use clap::Args;
use console::style;
use std::path::PathBuf;

use retailer_core::catalogue::PartsCatalogue;
use retailer_core::config::Config;

#[derive(Args, Debug)]
pub struct PartsArgs {
    /// Only show parts whose name contains this string
    pub filter: Option<String>,

    /// Ignore the cached catalogue and fetch it again
    #[arg(long)]
    pub refresh: bool,

    /// Working directory (holds retailer.json)
    #[arg(short = 'd', long, default_value = ".")]
    pub working_dir: PathBuf,
}

pub async fn execute(args: PartsArgs) -> Result<i32> {
    let config = Config::build(Some(&args.working_dir), true)?;

    let Some(catalogue) = PartsCatalogue::from_config(&config)? else {
        eprintln!(
            "{} \"parts-repository-url\" is not configured",
            style("Error:").red().bold()
        );
        return Ok(1);
    };

    let parts = if args.refresh {
        catalogue.refresh().await?
    } else {
        catalogue.parts().await?
    };

    let mut shown = 0;
    for part in parts.values() {
        if let Some(filter) = &args.filter {
            if !part.name.contains(filter.as_str()) {
                continue;
            }
        }
        shown += 1;

        let latest = part.versions.last().map(String::as_str).unwrap_or("-");
        match &part.description {
            Some(description) => println!(
                "{} {} {}",
                style(&part.name).green(),
                style(latest).dim(),
                description
            ),
            None => println!("{} {}", style(&part.name).green(), style(latest).dim()),
        }
    }

    log::info!("{} of {} parts from {}", shown, parts.len(), catalogue.url());
    Ok(0)
}
