use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Env;

use cachesim::{csv, run_simulation, SimConfig, SimError, SimReport};

/// Simulate a single-level CPU data cache over a trace of memory requests.
#[derive(Parser)]
#[command(name = "cachesim")]
struct Cli {
    /// The file with the requests to run. Must be a .csv file.
    input_file: PathBuf,

    /// Number of cycles to simulate.
    #[arg(short = 'c', long, default_value_t = 1_000_000_000)]
    cycles: u64,

    /// Simulate a direct-mapped cache (the default).
    #[arg(long)]
    directmapped: bool,

    /// Simulate a four-way set-associative cache.
    #[arg(long, conflicts_with = "directmapped")]
    fourway: bool,

    /// Size of a cache line in bytes.
    #[arg(long = "cacheline-size", default_value_t = 64)]
    cacheline_size: u32,

    /// Number of cache lines.
    #[arg(long)]
    cachelines: Option<u32>,

    /// Cache latency in cycles.
    #[arg(long = "cache-latency")]
    cache_latency: Option<u32>,

    /// Memory latency in cycles.
    #[arg(long = "memory-latency", default_value_t = 200)]
    memory_latency: u32,

    /// Write a value-change trace of all signals to this file.
    #[arg(long = "tf", value_name = "FILE")]
    tracefile: Option<PathBuf>,

    /// Preset: 1 MiB L2 cache (2^14 lines, 5 cycle latency).
    #[arg(long = "L2")]
    l2: bool,

    /// Preset: 2 MiB L3 cache (2^15 lines, 20 cycle latency).
    #[arg(long = "L3")]
    l3: bool,
}

fn main() -> ExitCode {
    let env = Env::default().filter_or("CACHESIM_LOG", "info");
    env_logger::init_from_env(env);

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), SimError> {
    let args = Cli::parse();
    let config = resolve_config(&args)?;
    print_input(&args, &config);

    let mut requests = csv::read_requests(&args.input_file)?;
    let report = run_simulation(&config, &mut requests, args.tracefile.as_deref())?;
    print_output(&report);
    Ok(())
}

/// Fold the preset flags and defaults into a validated configuration,
/// rounding the cache line count up where the organization demands it.
fn resolve_config(args: &Cli) -> Result<SimConfig, SimError> {
    if args.input_file.extension().and_then(|e| e.to_str()) != Some("csv") {
        return Err(SimError::Config(format!(
            "not a valid csv file: {}",
            args.input_file.display()
        )));
    }

    if args.cacheline_size == 0 {
        return Err(SimError::Config("cache line size can't be 0".into()));
    }
    if !args.cacheline_size.is_power_of_two() {
        return Err(SimError::Config(
            "cache line size must be a power of 2".into(),
        ));
    }

    // an explicit --cachelines / --cache-latency wins over a preset
    let (preset_lines, preset_latency) = if args.l3 {
        (1 << 15, 20)
    } else if args.l2 {
        (1 << 14, 5)
    } else {
        (512, 1)
    };
    let mut cache_lines = args.cachelines.unwrap_or(preset_lines);
    let cache_latency = args.cache_latency.unwrap_or(preset_latency);

    if cache_lines == 0 {
        return Err(SimError::Config("cache lines can't be 0".into()));
    }

    let direct_mapped = !args.fourway;
    if direct_mapped {
        if !cache_lines.is_power_of_two() {
            let rounded = next_power_of_two(cache_lines)?;
            eprintln!(
                "Attention: cache lines of a direct-mapped cache must be a power of 2.\n           \
                 The simulation will proceed with {rounded} cache lines"
            );
            cache_lines = rounded;
        }
    } else if !cache_lines.is_power_of_two() || cache_lines < 4 {
        let rounded = next_power_of_two(cache_lines)?.max(4);
        eprintln!(
            "Attention: cache lines of a four-way cache must be at least 4 and a power of 2.\n           \
             The simulation will proceed with {rounded} cache lines"
        );
        cache_lines = rounded;
    }

    let config = SimConfig {
        cycles: args.cycles,
        direct_mapped,
        cache_lines,
        cache_line_size: args.cacheline_size,
        cache_latency,
        memory_latency: args.memory_latency,
    };
    config.validate()?;
    Ok(config)
}

fn next_power_of_two(n: u32) -> Result<u32, SimError> {
    n.checked_next_power_of_two()
        .ok_or_else(|| SimError::Config(format!("cache line count {n} is too large")))
}

fn print_input(args: &Cli, config: &SimConfig) {
    println!("INPUT:");
    println!("Cycles: {}", config.cycles);
    println!("Direct Mapped: {}", u8::from(config.direct_mapped));
    println!("Cache Line Size: {}", config.cache_line_size);
    println!("Cache Lines: {}", config.cache_lines);
    println!("Cache Latency: {}", config.cache_latency);
    println!("Memory Latency: {}", config.memory_latency);
    match &args.tracefile {
        Some(path) => println!("Trace File: {}", path.display()),
        None => println!("Trace File: None"),
    }
    println!("Input File: {}\n", args.input_file.display());
}

fn print_output(report: &SimReport) {
    println!("OUTPUT:");
    println!("Cycles: {}", report.cycles);
    println!("Hits: {}", report.hits);
    println!("Misses: {}", report.misses);
    println!("PrimitiveGate: {}", report.primitive_gate_count);
}
