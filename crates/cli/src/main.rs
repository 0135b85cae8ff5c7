//! Command-line front end for the cache coherence simulator.
//!
//! Parses the cache geometry and trace prefix, runs the four-core simulation
//! to completion, and writes the statistics report to stdout or to the `-o`
//! file. Exits 0 on success and 1 on invalid arguments or I/O errors.

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::Parser;

use l1sim_core::config::CacheParams;
use l1sim_core::{Config, Simulator};

#[derive(Parser, Debug)]
#[command(
    name = "l1sim",
    about = "Four-core MESI L1 cache coherence simulator",
    long_about = "Simulates four cores with private L1 caches kept coherent by an \
                  invalidation-based MESI protocol over a single shared bus.\n\n\
                  Each core consumes one memory-reference trace: <APP>_proc0.trace \
                  through <APP>_proc3.trace, one `R <hex-addr>` or `W <hex-addr>` \
                  record per line.\n\nExample:\n  l1sim -t app1 -s 6 -E 2 -b 5 -o app1.txt"
)]
struct Cli {
    /// Name of the parallel application whose four traces to run (e.g. app1).
    #[arg(short = 't', value_name = "APP")]
    trace: String,

    /// Number of set index bits (number of sets = 2^s).
    #[arg(short = 's', value_name = "S")]
    set_bits: u32,

    /// Associativity (number of cache lines per set).
    #[arg(short = 'E', value_name = "E")]
    associativity: usize,

    /// Number of block bits (block size = 2^b bytes).
    #[arg(short = 'b', value_name = "B")]
    block_bits: u32,

    /// Write the statistics report to this file instead of stdout.
    #[arg(short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            let _ = err.print();
            process::exit(code);
        }
    };

    let config = Config {
        cache: CacheParams {
            set_bits: cli.set_bits,
            associativity: cli.associativity,
            block_bits: cli.block_bits,
        },
        ..Config::default()
    };
    if let Err(err) = config.validate() {
        eprintln!("Error: {}", err);
        process::exit(1);
    }

    let mut sim = match Simulator::open(config.clone(), &cli.trace) {
        Ok(sim) => sim,
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(1);
        }
    };

    println!("===== Simulation Configuration =====");
    println!("Application: {}", cli.trace);
    println!(
        "Cache: {} sets (s = {}), {}-way, {}-byte blocks (b = {})",
        config.cache.num_sets(),
        config.cache.set_bits,
        config.cache.associativity,
        config.cache.block_size(),
        config.cache.block_bits
    );
    match &cli.output {
        Some(path) => println!("Output: {}", path.display()),
        None => println!("Output: stdout"),
    }
    println!("====================================");
    println!();
    println!("Starting simulation...");

    let outcome = sim.run();
    if let Err(err) = &outcome {
        eprintln!("Warning: {}", err);
    } else {
        println!("Simulation complete.");
    }
    println!();

    let report = sim.report();
    match &cli.output {
        Some(path) => {
            let mut file = match File::create(path) {
                Ok(file) => file,
                Err(err) => {
                    eprintln!(
                        "Error: could not open output file {}: {}",
                        path.display(),
                        err
                    );
                    process::exit(1);
                }
            };
            if let Err(err) = report.write_to(&mut file) {
                eprintln!("Error: could not write {}: {}", path.display(), err);
                process::exit(1);
            }
            println!("Results written to {}", path.display());
        }
        None => {
            if let Err(err) = report.write_to(&mut io::stdout()) {
                eprintln!("Error: could not write report: {}", err);
                process::exit(1);
            }
        }
    }

    if outcome.is_err() {
        process::exit(1);
    }
}
