use anyhow::Result;
use clap::Parser;
use serde_json::json;
use topology_geocluster::{cluster, data, normalize, ClusterConfig, NormalizeConfig, WebMercator};

#[derive(Parser, Debug)]
#[clap(
    name = "topology-geocluster",
    about = "Normalize a network topology and cluster its nodes on a map"
)]
struct Cli {
    /// Path to input JSON graph
    #[clap(long)]
    input: String,

    /// Node field listing secondary addresses
    #[clap(long, default_value = "local_addresses")]
    address_field: String,

    /// Cluster geographically placed nodes
    #[clap(long)]
    cluster: bool,

    /// Map zoom level used for projection
    #[clap(long, default_value = "4")]
    zoom: f64,

    /// Clustering radius in pixels
    #[clap(long, default_value = "30")]
    cluster_radius: f64,

    /// Node attribute splitting co-located clusters
    #[clap(long)]
    attribute: Option<String>,

    /// Minimum distance between co-located clusters, in pixels
    #[clap(long, default_value = "20")]
    separation: f64,

    /// Number of worker threads (0 = use all available cores)
    #[clap(long, default_value = "0")]
    threads: usize,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    // Set number of threads
    let num_threads = if args.threads > 0 {
        args.threads
    } else {
        num_cpus::get()
    };

    log::info!("Using {} worker threads", num_threads);
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()?;

    // 1. Load data
    let normalize_config = NormalizeConfig::default().with_address_field(args.address_field.as_str());
    let graph = data::load_graph(&args.input, &normalize_config)?;

    // 2. Normalize
    let normalized = normalize(graph)?;

    // 3. Cluster if requested
    let clustering = if args.cluster {
        let mut config = ClusterConfig::new(args.cluster_radius).with_separation(args.separation);
        config.clustering_attribute = args.attribute.clone();
        let projector = WebMercator::new(args.zoom);
        Some(cluster(&normalized, &projector, &config))
    } else {
        None
    };

    let output = json!({
        "nodes": normalized.nodes,
        "links": normalized.links,
        "report": normalized.report,
        "clustering": clustering,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);

    log::info!("Done");

    Ok(())
}
