//! FDC Ingest - FoodData Central CSV loader

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fdc_common::logging::{init_logging, LogConfig, LogLevel};
use fdc_common::types::{DictionaryTable, DocType};
use fdc_ingest::{
    DatasetPlan, DictionaryLoader, IngestConfig, IngestOrchestrator, MemoryStore,
};
use tracing::{info, warn};

/// Reference files picked up from `--dictionaries`
const DICTIONARY_FILES: [(DictionaryTable, &str); 4] = [
    (DictionaryTable::Nutrient, "nutrient.csv"),
    (DictionaryTable::Derivation, "derivation.csv"),
    (DictionaryTable::SrFoodGroup, "sr_food_group.csv"),
    (DictionaryTable::SurveyFoodGroup, "survey_food_group.csv"),
];

#[derive(Parser, Debug)]
#[command(name = "fdc-ingest")]
#[command(author, version, about = "FoodData Central ingestion tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one reference table into dictionary documents.
    ///
    /// The store lives only for this process, so the documents are written to
    /// `--export`.
    Dictionary {
        /// Table type: NUT, DERV, FGSR or FGFNDDS
        #[arg(short, long)]
        table: DictionaryTable,

        /// Headerless CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// JSON file receiving the dictionary documents
        #[arg(long)]
        export: PathBuf,
    },

    /// Ingest one dataset directory
    Run {
        /// Dataset: bfpd, fndds or sr
        #[arg(short, long)]
        dataset: DocType,

        /// Directory holding the dataset's CSV files
        #[arg(short, long)]
        input: PathBuf,

        /// Directory with reference tables to load first
        #[arg(long)]
        dictionaries: Option<PathBuf>,

        /// Prefix ids with the dataset type
        #[arg(long)]
        namespace_ids: bool,

        /// Facts per bulk write
        #[arg(long)]
        fact_batch_size: Option<usize>,

        /// Write the resulting store as JSON
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("fdc-ingest")
        .build();

    // Environment variables take precedence
    let log_config = log_config.clone().merge_env().unwrap_or(log_config);
    let _guard = init_logging(&log_config)?;

    let mut config = IngestConfig::from_env()?;
    let store = Arc::new(MemoryStore::new());

    match cli.command {
        Command::Dictionary {
            table,
            input,
            export,
        } => {
            let written = DictionaryLoader::new(table)
                .load_file(&input, store.as_ref())
                .await?;
            info!("Loaded {} {} entries", written, table);
            export_store(&store, &export)?;
        },
        Command::Run {
            dataset,
            input,
            dictionaries,
            namespace_ids,
            fact_batch_size,
            export,
        } => {
            config.namespace_ids |= namespace_ids;
            if let Some(size) = fact_batch_size {
                config.fact_batch_size = size;
            }
            config.validate()?;

            if let Some(dir) = dictionaries {
                load_dictionaries(&dir, &store).await?;
            }

            let plan = DatasetPlan::for_dataset(dataset, &input);
            let report = IngestOrchestrator::new(store.clone(), config)
                .run(plan)
                .await
                .with_context(|| format!("{} ingest aborted", dataset))?;

            info!(report = %serde_json::to_string(&report)?, "Run report");
            if let Some(path) = export {
                export_store(&store, &path)?;
            }

            if !report.exit_ok() {
                anyhow::bail!("{} ingest failed: a loader could not read its file", dataset);
            }
        },
    }

    info!("Ingestion complete");
    Ok(())
}

async fn load_dictionaries(dir: &Path, store: &MemoryStore) -> Result<()> {
    for (table, file) in DICTIONARY_FILES {
        let path = dir.join(file);
        if !path.exists() {
            warn!("No {} file at {}, skipping", table, path.display());
            continue;
        }
        DictionaryLoader::new(table).load_file(&path, store).await?;
    }
    Ok(())
}

fn export_store(store: &MemoryStore, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), &store.export())
        .context("Failed to write export")?;
    info!("Exported store to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dictionary_requires_export() {
        let missing = Cli::try_parse_from(["fdc-ingest", "dictionary", "-t", "NUT", "-i", "n.csv"]);
        assert!(missing.is_err());

        let parsed = Cli::try_parse_from([
            "fdc-ingest", "dictionary", "-t", "NUT", "-i", "n.csv", "--export", "nut.json",
        ]);
        assert!(matches!(
            parsed.map(|cli| cli.command),
            Ok(Command::Dictionary { table: DictionaryTable::Nutrient, .. })
        ));
    }
}
