use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use spectral_search::{ingest, Engine, Result, SearchOutcome, SpectralConfig, WeightingScheme};

/// Latent semantic search over a corpus of paper abstracts
#[derive(Parser, Debug)]
#[command(name = "spectral-search")]
#[command(about = "Build and query a latent semantic index", long_about = None)]
struct Args {
    /// Log filter, overridden by RUST_LOG
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build an index bundle from a JSONL corpus
    Build {
        /// JSONL file with id, title, abstract and categories per line
        #[arg(short, long)]
        input: PathBuf,
        /// Output bundle path
        #[arg(short, long, default_value = "index.cbor")]
        output: PathBuf,
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of concepts
        #[arg(short, long)]
        k: Option<usize>,
        /// Seed for the solver and for sampling
        #[arg(long)]
        seed: Option<u64>,
        /// Keep at most this many randomly sampled documents
        #[arg(long)]
        sample: Option<usize>,
        /// Keep documents in any of these categories (comma separated)
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,
        /// Use the smoothed, L2-normalized weighting
        #[arg(long)]
        smooth: bool,
    },
    /// Rank documents of a bundle against a query
    Search {
        #[arg(short, long, default_value = "index.cbor")]
        index: PathBuf,
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of results, defaults to `search.top_k` of the configuration
        #[arg(short = 'n', long)]
        top_k: Option<usize>,
        /// Print the first three query coordinates
        #[arg(long)]
        coordinates: bool,
        query: Vec<String>,
    },
    /// Print the strongest terms of the leading concepts
    Concepts {
        #[arg(short, long, default_value = "index.cbor")]
        index: PathBuf,
        /// Number of concepts to show
        #[arg(long, default_value_t = 5)]
        concepts: usize,
        /// Terms per concept
        #[arg(long, default_value_t = 10)]
        terms: usize,
    },
    /// Print singular values and explained variance
    Spectrum {
        #[arg(short, long, default_value = "index.cbor")]
        index: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match run(args.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(fatal = e.is_fatal(), "{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Build { input, output, config, k, seed, sample, categories, smooth } => {
            let mut config = load_config(config)?;
            if let Some(k) = k {
                config.decompose.k = k;
            }
            if seed.is_some() {
                config.decompose.seed = seed;
            }
            if smooth {
                config.weighting.scheme = WeightingScheme::Smooth;
            }
            build(&input, &output, &config, sample, &categories, seed)
        }
        Command::Search { index, config, top_k, coordinates, query } => {
            let top_k = top_k.unwrap_or(load_config(config)?.search.top_k);
            let engine = Engine::load(&index)?;
            search(&engine, &query.join(" "), top_k, coordinates)
        }
        Command::Concepts { index, concepts, terms } => {
            let engine = Engine::load(&index)?;
            let index = engine.index();
            let decomposition = index.decomposition();
            for concept in 0..concepts.min(index.rank()) {
                let top: Vec<String> = decomposition
                    .top_terms(concept, terms, index.model())
                    .into_iter()
                    .map(|(term, _)| term)
                    .collect();
                println!("Concept {} (sigma {:.4}): {}", concept + 1, decomposition.sigma[concept], top.join(", "));
            }
            Ok(())
        }
        Command::Spectrum { index } => {
            let engine = Engine::load(&index)?;
            let decomposition = engine.index().decomposition();
            let mut cumulative = 0.0;
            for (i, (sigma, ratio)) in decomposition
                .sigma
                .iter()
                .zip(decomposition.explained_variance_ratio())
                .enumerate()
            {
                cumulative += ratio;
                println!("{:>4}  {:>10.4}  {:>7.4}  {:>7.4}", i + 1, sigma, ratio, cumulative);
            }
            Ok(())
        }
    }
}

fn load_config(path: Option<PathBuf>) -> Result<SpectralConfig> {
    match path {
        Some(path) => SpectralConfig::from_json_file(path),
        None => Ok(SpectralConfig::default()),
    }
}

fn build(
    input: &Path,
    output: &Path,
    config: &SpectralConfig,
    sample: Option<usize>,
    categories: &[String],
    seed: Option<u64>,
) -> Result<()> {
    let start = Instant::now();
    let mut records = ingest::filter_categories(ingest::read_jsonl(input)?, categories);
    if let Some(n) = sample {
        records = ingest::sample(records, n, seed);
    }
    let (texts, ids) = ingest::into_corpus(&records);
    info!(documents = texts.len(), k = config.decompose.k, "building index");

    let engine = Engine::build(&texts, ids, config)?;
    engine.save(output)?;
    info!(
        elapsed_ms = start.elapsed().as_millis() as u64,
        output = %output.display(),
        "build finished"
    );
    Ok(())
}

fn search(engine: &Engine, query: &str, top_k: usize, coordinates: bool) -> Result<()> {
    match engine.search(query, top_k)? {
        SearchOutcome::NoMatch => {
            println!("No match: none of the query terms appear in the index vocabulary.");
        }
        SearchOutcome::Matches(results) => {
            println!("Top {} Results:", results.len());
            for hit in &results.hits {
                println!("{}. [Score: {:.4}] {}", hit.rank, hit.score, hit.doc_id);
            }
            if coordinates {
                let [x, y, z] = results.query_coordinates();
                println!("Query coordinates: ({:.4}, {:.4}, {:.4})", x, y, z);
            }
        }
    }
    Ok(())
}
