//! Loading of configuration, the record store and compositions for a command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use retailer_core::composition::{Composition, CompositionAssembler};
use retailer_core::config::Config;
use retailer_core::solution::SolutionFactory;
use retailer_core::store::MemoryPostStore;

/// Options shared by every command that reads the record store.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// JSON file holding solution and purchased solution records
    #[arg(short = 's', long, default_value = "store.json")]
    pub store: PathBuf,

    /// Working directory (holds retailer.json)
    #[arg(short = 'd', long, default_value = ".")]
    pub working_dir: PathBuf,
}

pub struct Workspace {
    pub working_dir: PathBuf,
    pub config: Config,
    pub store: Arc<MemoryPostStore>,
    pub factory: SolutionFactory,
}

impl Workspace {
    pub fn load(args: &StoreArgs) -> Result<Self> {
        let working_dir = args
            .working_dir
            .canonicalize()
            .context("Failed to resolve working directory")?;

        let config = Config::build(Some(&working_dir), true).context("Failed to load configuration")?;
        let vendor = config.vendor()?;

        let store_path = resolve(&working_dir, &args.store);
        let store = Arc::new(
            MemoryPostStore::from_file(&store_path)
                .with_context(|| format!("Failed to load store {}", store_path.display()))?,
        );
        log::info!("Loaded {} solution records from {}", store.len(), store_path.display());

        let factory = SolutionFactory::new(store.clone(), vendor);

        Ok(Self {
            working_dir,
            config,
            store,
            factory,
        })
    }

    pub fn assembler(&self) -> CompositionAssembler {
        CompositionAssembler::new(self.factory.clone(), self.store.clone())
    }

    pub fn load_composition(&self, path: &Path) -> Result<Composition> {
        let path = resolve(&self.working_dir, path);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read composition {}", path.display()))?;
        Composition::from_json(&content)
            .with_context(|| format!("Failed to parse composition {}", path.display()))
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_workspace(dir: &Path) {
        std::fs::write(
            dir.join("retailer.json"),
            r#"{ "config": { "vendor": "retailer" } }"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("store.json"),
            r#"{ "solutions": [ { "id": 1, "slug": "blog" } ] }"#,
        )
        .unwrap();
        std::fs::write(
            dir.join("composition.json"),
            r#"{ "id": 7, "manual_solutions": [ { "pseudo_id": "blog #1" } ] }"#,
        )
        .unwrap();
    }

    #[test]
    fn test_load_workspace() {
        let temp_dir = TempDir::new().unwrap();
        write_workspace(temp_dir.path());

        let workspace = Workspace::load(&StoreArgs {
            store: PathBuf::from("store.json"),
            working_dir: temp_dir.path().to_path_buf(),
        })
        .unwrap();
        assert_eq!(workspace.store.len(), 1);

        let composition = workspace
            .load_composition(Path::new("composition.json"))
            .unwrap();
        let resolution = workspace.assembler().resolve(&composition);
        assert!(resolution.solutions.contains_key("retailer/blog"));
    }

    #[test]
    fn test_missing_store() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("retailer.json"),
            r#"{ "config": { "vendor": "retailer" } }"#,
        )
        .unwrap();

        let result = Workspace::load(&StoreArgs {
            store: PathBuf::from("missing.json"),
            working_dir: temp_dir.path().to_path_buf(),
        });
        assert!(result.is_err());
    }
}
