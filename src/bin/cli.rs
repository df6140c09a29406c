use clap::{Args, Parser, Subcommand};
use hotness_bloom_rs::{
    GenerationStats, HotnessConfig, HotnessConfigBuilder, HotnessFilter,
    HotnessReport,
    common::{bits2hr, bytes2hr, percent2hr},
    optimal_bit_size, optimal_num_hashes,
};
use serde::Serialize;
use std::{
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Reference 32-key access trace used by `demo`.
const REFERENCE_TRACE: [u64; 32] = [
    6, 20, 5, 9, 22, 3, 3, 11, 1, 3, 0, 5, 4, 2, 1, 0, 3, 3, 3, 4, 19, 1, 26,
    6, 5, 6, 5, 7, 7, 26, 6, 5,
];

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log decay ticks and the generations holding each HOT key
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reference 32-key trace on a small 4 x 32-bit ring
    Demo {
        /// Print the verdict of every request
        #[arg(long)]
        show_keys: bool,
    },

    /// Replay a trace file (one integer key per line) through a filter
    Replay {
        /// Trace file, or "-" for stdin
        #[arg(short, long)]
        trace: PathBuf,

        #[command(flatten)]
        ring: RingArgs,

        /// Print the verdict of every request
        #[arg(long)]
        show_keys: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Display sizing of a ring configuration
    Info {
        #[command(flatten)]
        ring: RingArgs,
    },
}

#[derive(Args, Clone)]
struct RingArgs {
    /// Number of generations
    #[arg(long, default_value = "4")]
    bf_num: usize,

    /// Scale applied to the raw weighted score
    #[arg(long, default_value = "2.0")]
    max_weight: f64,

    /// Minimum scaled score for HOT
    #[arg(long, default_value = "4.0")]
    hot_threshold: f64,

    /// Requests between decay ticks
    #[arg(long, default_value = "512")]
    decay_window: u64,

    /// Bits per generation (power of two)
    #[arg(long, default_value = "2048")]
    bit_size: usize,

    /// Hash functions per generation
    #[arg(long, default_value = "2")]
    num_hashes: usize,

    /// Size generations for this many distinct keys (overrides bit size and hashes)
    #[arg(long, requires = "fpr")]
    capacity: Option<usize>,

    /// Target false positive rate used with --capacity
    #[arg(long, requires = "capacity")]
    fpr: Option<f64>,
}

impl RingArgs {
    fn to_config(
        &self,
        verbose: bool,
    ) -> Result<HotnessConfig, Box<dyn std::error::Error>> {
        let (bit_size, num_hashes) = match (self.capacity, self.fpr) {
            (Some(capacity), Some(fpr)) => {
                if capacity == 0 || fpr <= 0.0 || fpr >= 1.0 {
                    return Err(
                        "capacity must be > 0 and fpr between 0 and 1".into()
                    );
                }
                let bits = optimal_bit_size(capacity, fpr);
                (bits, optimal_num_hashes(capacity, bits).max(1))
            }
            _ => (self.bit_size, self.num_hashes),
        };

        let config = HotnessConfigBuilder::default()
            .bf_num(self.bf_num)
            .max_weight(self.max_weight)
            .hot_threshold(self.hot_threshold)
            .decay_window(self.decay_window)
            .bit_size(bit_size)
            .num_hashes(num_hashes)
            .verbose(verbose)
            .build()?;
        config.validate()?;
        Ok(config)
    }
}

#[derive(Serialize)]
struct ReplaySummary {
    requests: u64,
    decays: u64,
    report: HotnessReport,
    generations: Vec<GenerationStats>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Demo { show_keys } => {
            let config = HotnessConfigBuilder::default()
                .bf_num(4)
                .max_weight(2.0)
                .hot_threshold(4.0)
                .decay_window(8)
                .bit_size(32)
                .num_hashes(2)
                .verbose(cli.verbose)
                .build()?;
            let filter = replay(config, REFERENCE_TRACE.into_iter(), *show_keys)?;
            println!("{}", filter.report());
        }
        Commands::Replay {
            trace,
            ring,
            show_keys,
            json,
        } => {
            let config = ring.to_config(cli.verbose)?;
            let keys = read_trace(trace)?;
            info!(keys = keys.len(), trace = %trace.display(), "Replaying trace");

            let filter = replay(config, keys.into_iter(), *show_keys)?;
            if *json {
                let summary = ReplaySummary {
                    requests: filter.request_count(),
                    decays: filter.decay_count(),
                    report: filter.report(),
                    generations: filter.generation_stats(),
                };
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Requests: {}", filter.request_count());
                println!("Decay ticks: {}", filter.decay_count());
                println!("{}", filter.report());
            }
        }
        Commands::Info { ring } => {
            let config = ring.to_config(cli.verbose)?;
            print_info(&config);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn replay(
    config: HotnessConfig,
    keys: impl Iterator<Item = u64>,
    show_keys: bool,
) -> Result<HotnessFilter<u64>, Box<dyn std::error::Error>> {
    let mut filter = HotnessFilter::new(config)?;

    for key in keys {
        let placement = filter.handle_request(&key)?;
        let verdict = filter.classify(&key);
        if show_keys {
            println!(
                "#{:<6} key {:<10} {:<4} score {:>5.2} placement {:?}",
                filter.request_count(),
                key,
                verdict,
                filter.score(&key),
                placement
            );
        }
    }

    Ok(filter)
}

fn read_trace(path: &Path) -> Result<Vec<u64>, Box<dyn std::error::Error>> {
    let reader: Box<dyn BufRead> = if path.as_os_str() == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        Box::new(BufReader::new(File::open(path)?))
    };

    let mut keys = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let key = line.parse::<u64>().map_err(|e| {
            format!("line {}: invalid key '{line}': {e}", line_no + 1)
        })?;
        keys.push(key);
    }
    Ok(keys)
}

fn print_info(config: &HotnessConfig) {
    println!("Hotness Filter Configuration:");
    println!("  Generations: {}", config.bf_num);
    println!("  Max weight: {}", config.max_weight);
    println!("  Hot threshold: {}", config.hot_threshold);
    println!("  Decay window: {} requests", config.decay_window);
    println!("  Bits per generation: {}", config.bit_size);
    println!("  Hash functions: {}", config.num_hashes);
    println!("\nDerived:");
    println!("  Memory per generation: {}", bits2hr(config.bit_size));
    println!("  Total memory: {}", bytes2hr(config.memory_bytes()));
    println!("  Max score: {:.2}", config.max_score());

    // Expected FPR of a generation after one window's worth of distinct keys.
    let per_generation = config.decay_window as f64;
    let k = config.num_hashes as f64;
    let fill = 1.0 - (-k * per_generation / config.bit_size as f64).exp();
    println!(
        "  Expected FPR after {} distinct keys: {}",
        config.decay_window,
        percent2hr(fill.powf(k))
    );
}
