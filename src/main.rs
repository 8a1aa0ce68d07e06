use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use dgw_cluster::{ClusteringConfig, HierarchicalClustering, PrototypingMethod};
use dgw_dtw::{BandConstraint, Dataset, Dtw, Metric, Parallelism, pairwise_distances};
use dgw_io::{DatasetReader, ExperimentName, PointsOfInterestReader, ResultWriter};

#[derive(Parser)]
#[command(name = "dgw")]
#[command(about = "Dynamic Genome Warping: shape-based clustering of genomic signal tracks")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of worker threads (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Input dataset options shared by every subcommand.
#[derive(Args, Debug, Clone)]
struct InputArgs {
    /// Path to the wide signal-track CSV (region_id,dataset,0,1,...)
    #[arg(long)]
    data: PathBuf,

    /// Optional points-of-interest CSV (region_id,dataset,bin)
    #[arg(long)]
    poi: Option<PathBuf>,

    /// Apply log(1 + x) to every value before computing distances
    #[arg(long, default_value_t = false)]
    log_scale: bool,

    /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
    #[arg(long)]
    experiment: String,

    /// Output directory for result files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

/// DTW kernel options.
#[derive(Args, Debug, Clone)]
struct DtwArgs {
    /// Local cost: sqeuclidean, euclidean or cosine (default: cosine for
    /// two or more datasets, sqeuclidean otherwise)
    #[arg(long)]
    metric: Option<Metric>,

    /// Slanted band half-width k (unconstrained if not set)
    #[arg(long, allow_negative_numbers = true)]
    slanted_band: Option<i64>,

    /// Extra cost added to every non-diagonal step
    #[arg(long, default_value_t = 0.0)]
    warping_penalty: f64,

    /// Stretch the shorter sequence to the longer one before aligning
    #[arg(long, default_value_t = false)]
    scale_first: bool,

    /// Do not try the reversed first sequence
    #[arg(long, default_value_t = false)]
    no_reverse: bool,

    /// Report raw accumulated cost instead of dividing by the longer length
    #[arg(long, default_value_t = false)]
    no_normalise: bool,
}

impl DtwArgs {
    fn build(&self, dataset: &Dataset) -> Result<Dtw> {
        let metric = self.metric.unwrap_or(if dataset.ndim() >= 2 {
            Metric::Cosine
        } else {
            Metric::SqEuclidean
        });
        let constraint = match self.slanted_band {
            Some(k) => BandConstraint::slanted_band(k)?,
            None => BandConstraint::Unconstrained,
        };
        Ok(Dtw::new(metric)
            .with_constraint(constraint)
            .with_warping_penalty(self.warping_penalty)?
            .with_scale_first(self.scale_first)
            .with_try_reverse(!self.no_reverse)
            .with_normalise(!self.no_normalise))
    }
}

#[derive(Subcommand)]
enum Command {
    /// Build the DTW hierarchy, prototypes and warping paths, then cut it
    Cluster {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        dtw: DtwArgs,

        /// Prototyping scheme: psa, standard, standard-unweighted or mean
        #[arg(long, default_value = "standard")]
        prototyping_method: PrototypingMethod,

        /// Cut into at most this many clusters
        #[arg(long, conflicts_with = "threshold", required_unless_present = "threshold")]
        n_clusters: Option<usize>,

        /// Cut at this merge distance
        #[arg(long)]
        threshold: Option<f64>,
    },

    /// Compute the condensed pairwise DTW distance matrix only
    Distances {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        dtw: DtwArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct ClusterOutput {
    experiment: String,
    n_regions: usize,
    n_datasets: usize,
    metric: String,
    prototyping_method: String,
    threshold: f64,
    n_clusters: usize,
    cluster_sizes: Vec<usize>,
    files: Vec<PathBuf>,
}

#[derive(Serialize)]
struct DistancesOutput {
    experiment: String,
    n_regions: usize,
    n_pairs: usize,
    metric: String,
    file: PathBuf,
}

fn load_dataset(input: &InputArgs) -> Result<Dataset> {
    let mut dataset = DatasetReader::new(&input.data)
        .read()
        .context("failed to read input CSV")?;
    if let Some(poi) = &input.poi {
        let poi = PointsOfInterestReader::new(poi)
            .read()
            .context("failed to read points of interest")?;
        dataset = dataset
            .with_points_of_interest(poi)
            .context("points of interest do not match the dataset")?;
    }
    if input.log_scale {
        dataset = dataset.log_scaled().context("log scaling failed")?;
        info!("applied log(1 + x)");
    }
    Ok(dataset)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let parallelism = match cli.threads {
        Some(threads) => {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .context("failed to configure thread pool")?;
            info!(threads, "thread pool configured");
            Parallelism::new(threads)?
        }
        None => Parallelism::available(),
    };

    match cli.command {
        Command::Cluster {
            input,
            dtw,
            prototyping_method,
            n_clusters,
            threshold,
        } => {
            let experiment = ExperimentName::new(input.experiment.clone())?;
            let dataset = load_dataset(&input)?;
            let (n_regions, n_datasets) = (dataset.len(), dataset.ndim());

            let mut kernel = dtw.build(&dataset)?;
            if prototyping_method == PrototypingMethod::Mean {
                if dtw.slanted_band.is_some_and(|k| k != 0) {
                    warn!("mean prototyping overrides --slanted-band with 0");
                }
                kernel = kernel
                    .with_constraint(BandConstraint::SlantedBand(0))
                    .with_scale_first(true);
            }
            let config = ClusteringConfig::new(kernel)
                .with_prototyping_method(prototyping_method)
                .with_parallelism(parallelism);

            let hc = HierarchicalClustering::fit(dataset, config).context("clustering failed")?;
            let threshold = match (threshold, n_clusters) {
                (Some(t), _) => t,
                (None, Some(k)) => hc.threshold_for_n_clusters(k)?,
                (None, None) => anyhow::bail!("either --n-clusters or --threshold is required"),
            };
            let assignments = hc.cut(threshold)?;
            info!(threshold, clusters = assignments.n(), "tree cut");

            let writer = ResultWriter::new(&input.output_dir, experiment)?;
            let files = writer
                .write_hierarchy(&hc, threshold, &assignments)
                .context("failed to write artifacts")?;

            let output = ClusterOutput {
                experiment: input.experiment,
                n_regions,
                n_datasets,
                metric: kernel.metric().to_string(),
                prototyping_method: prototyping_method.to_string(),
                threshold,
                n_clusters: assignments.n(),
                cluster_sizes: assignments.iter().map(|c| c.size()).collect(),
                files,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Distances { input, dtw } => {
            let experiment = ExperimentName::new(input.experiment.clone())?;
            let dataset = load_dataset(&input)?;
            let kernel = dtw.build(&dataset)?;

            let distances =
                pairwise_distances(&dataset, &kernel, parallelism).context("pairwise DTW failed")?;
            let writer = ResultWriter::new(&input.output_dir, experiment)?;
            let file = writer.write_distances(dataset.ids(), &distances)?;

            let output = DistancesOutput {
                experiment: input.experiment,
                n_regions: dataset.len(),
                n_pairs: distances.as_slice().len(),
                metric: kernel.metric().to_string(),
                file,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
