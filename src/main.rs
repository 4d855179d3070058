use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use stocktag::{
    curate_round_robin, curate_single_table, handle_labels, train, train_with_holdout,
    ArtifactStore, CorpusReader, CuratedTable, CurationMode, LabelVocabulary, ModelArtifact,
    PredictResponse, Predictor, TrainConfig,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    /// One curated table with a header row
    SingleTable,
    /// Deterministic 80/20 per-label split into train.csv and test.csv
    RoundRobin,
}

impl From<ModeArg> for CurationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::SingleTable => CurationMode::SingleTable,
            ModeArg::RoundRobin => CurationMode::RoundRobin,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Curate a raw corpus into a clean single-label training table
    Curate {
        /// Name of the raw corpus file at the dataset folder
        #[arg(short, long)]
        source: String,
        /// Curation output mode
        #[arg(short, long, value_enum, default_value_t = ModeArg::SingleTable)]
        mode: ModeArg,
        /// Name of the curated table written in single-table mode
        #[arg(short, long, default_value = "curated.csv")]
        out_name: String,
    },
    /// Train a classifier on a curated dataset
    Train {
        /// Name of preprocessed dataset file at the dataset folder
        #[arg(short, long, default_value = "curated.csv")]
        dataset_name: String,
        /// Dataset split ratio, i.e. 0.2
        #[arg(short, long, default_value_t = 0.2)]
        split_ratio: f64,
        /// Dataset splitter random state index
        #[arg(short, long, default_value_t = 0)]
        randomization_index: u64,
        /// Train on the pre-split train.csv/test.csv pair instead of
        /// splitting a single table
        #[arg(long)]
        pre_split: bool,
    },
    /// Predict the label for one goods description
    Predict {
        /// Goods description to classify
        #[arg(short, long)]
        description: String,
        /// Randomization index of the trained artifact to load
        #[arg(short, long, default_value_t = 0)]
        randomization_index: u64,
    },
    /// List the labels of the trained model
    Labels {
        /// Randomization index of the trained artifact to load
        #[arg(short, long, default_value_t = 0)]
        randomization_index: u64,
    },
}

fn run_curate(store: &ArtifactStore, source: &str, mode: CurationMode, out_name: &str) -> anyhow::Result<()> {
    store.ensure_dirs()?;
    let corpus = CorpusReader::open(store.dataset_path(source))
        .with_context(|| format!("failed to open corpus {source:?}"))?;
    let labels_path = store.labels_path();
    let report = match mode {
        CurationMode::SingleTable => {
            let table_path = store.dataset_path(out_name);
            info!("Curating {} into {}", source, table_path.display());
            curate_single_table(&corpus, &table_path, &labels_path)?
        }
        CurationMode::RoundRobin => {
            info!("Curating {} into train.csv/test.csv", source);
            curate_round_robin(
                &corpus,
                &store.train_table_path(),
                &store.test_table_path(),
                &labels_path,
            )?
        }
    };
    info!(
        "Curation finished: {} labels, {} rows written",
        report.labels.len(),
        report.rows_written()
    );
    Ok(())
}

fn run_train(
    store: &ArtifactStore,
    dataset_name: &str,
    split_ratio: f64,
    seed: u64,
    pre_split: bool,
) -> anyhow::Result<()> {
    let vocabulary = LabelVocabulary::load(store.labels_path())
        .context("failed to load label vocabulary; run curation first")?;
    let labels = vocabulary.into_labels();

    let (pipeline, _evaluation) = if pre_split {
        let train_table = CuratedTable::read_from(store.train_table_path())?;
        let test_table = CuratedTable::read_from(store.test_table_path())?;
        info!(
            "Training on pre-split tables: {} train / {} test rows",
            train_table.len(),
            test_table.len()
        );
        train_with_holdout(&train_table.rows, &test_table.rows, &labels)?
    } else {
        let table = CuratedTable::read_from(store.dataset_path(dataset_name))
            .with_context(|| format!("failed to read curated table {dataset_name:?}"))?;
        info!("Training on {} ({} rows)", dataset_name, table.len());
        let config = TrainConfig {
            split_ratio,
            seed,
        };
        train(&table, &labels, &config)?
    };

    let artifact = ModelArtifact::new(labels, pipeline);
    let path = store.save_artifact(&artifact, seed)?;
    info!("Model saved as {}", path.display());
    Ok(())
}

fn run_predict(store: &ArtifactStore, description: &str, seed: u64) -> anyhow::Result<()> {
    let predictor = Predictor::load(store, seed)?;
    let response = PredictResponse {
        description: description.to_string(),
        prediction: predictor.predict(description)?,
    };
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn run_labels(store: &ArtifactStore, seed: u64) -> anyhow::Result<()> {
    let predictor = Predictor::load(store, seed)?;
    let response = handle_labels(&predictor);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let store = ArtifactStore::new_default();

    match args.command {
        Command::Curate {
            source,
            mode,
            out_name,
        } => run_curate(&store, &source, mode.into(), &out_name),
        Command::Train {
            dataset_name,
            split_ratio,
            randomization_index,
            pre_split,
        } => run_train(&store, &dataset_name, split_ratio, randomization_index, pre_split),
        Command::Predict {
            description,
            randomization_index,
        } => run_predict(&store, &description, randomization_index),
        Command::Labels {
            randomization_index,
        } => run_labels(&store, randomization_index),
    }
}
