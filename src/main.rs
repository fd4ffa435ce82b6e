//! Poseidon hash CLI
//!
//! Usage:
//!   cargo run -- hash --width 3 1 2
//!   cargo run -- hash --width 5 --cap 0 0x01 0x02 0x03
//!   cargo run -- fixed 1 2
//!   cargo run -- constants --max-width 3 > constants.json
//!   cargo run -- --constants constants.json hash --width 3 1 2

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use bn254_poseidon::{
    field::parse_u256, ConstantProvider, ConstantTable, GeneratedConstants, Poseidon, PoseidonError,
};

/// Poseidon hash over the BN254 scalar field
#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "poseidon-hash")]
#[command(about = "Compute Poseidon hashes over the BN254 scalar field")]
struct Args {
    /// Load circomlib-layout constants from a JSON file instead of generating them
    #[arg(long, global = true)]
    constants: Option<std::path::PathBuf>,

    /// Output format: dec or hex
    #[arg(long, global = true, default_value = "hex")]
    format: String,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Command {
    /// Sponge hash of any number of inputs
    Hash {
        /// State width (rate = width - 1)
        #[arg(long, default_value_t = 3)]
        width: usize,

        /// Capacity tag (negative values wrap mod p); defaults to the number of inputs
        #[arg(long, allow_negative_numbers = true)]
        cap: Option<i64>,

        /// Inputs as decimal or 0x-prefixed hex
        inputs: Vec<String>,
    },
    /// Single-permutation hash of 1 to 16 field elements
    Fixed {
        /// Inputs as decimal or 0x-prefixed hex
        inputs: Vec<String>,
    },
    /// Print constants for widths 2..=max-width as circomlib JSON
    Constants {
        #[arg(long, default_value_t = 17)]
        max_width: usize,
    },
}

#[cfg(feature = "cli")]
fn run<P: ConstantProvider>(hasher: &Poseidon<P>, command: &Command, format: &str) -> Result<String, PoseidonError> {
    let digest = match command {
        Command::Hash { width, cap, inputs } => {
            let inputs = inputs.iter().map(|s| parse_u256(s)).collect::<Result<Vec<_>, _>>()?;
            let cap = cap.unwrap_or(inputs.len() as i64);
            tracing::debug!(width, cap, inputs = inputs.len(), "sponge hash");
            hasher.hash_with_cap(&inputs, *width, cap)?
        }
        Command::Fixed { inputs } => {
            let inputs = inputs.iter().map(|s| parse_u256(s)).collect::<Result<Vec<_>, _>>()?;
            tracing::debug!(inputs = inputs.len(), "fixed hash");
            hasher.hash_fixed(&inputs)?
        }
        Command::Constants { max_width } => {
            let table = ConstantTable::from_provider(hasher.provider(), 2..=*max_width)?;
            return table.to_json();
        }
    };

    Ok(match format {
        "dec" => digest.to_string(),
        _ => format!("0x{:064x}", digest),
    })
}

fn main() {
    #[cfg(feature = "cli")]
    {
        let args = Args::parse();

        let level = if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        };
        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_writer(std::io::stderr)
            .init();

        if args.format != "dec" && args.format != "hex" {
            eprintln!("Unknown format: {}. Use 'dec' or 'hex'.", args.format);
            std::process::exit(2);
        }

        let result = match &args.constants {
            Some(path) => std::fs::read_to_string(path)
                .map_err(|e| PoseidonError::Json(format!("{}: {e}", path.display())))
                .and_then(|json| ConstantTable::from_json(&json))
                .and_then(|table| run(&Poseidon::new(table), &args.command, &args.format)),
            None => run(&Poseidon::new(GeneratedConstants::new()), &args.command, &args.format),
        };

        match result {
            Ok(out) => println!("{out}"),
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
    }

    #[cfg(not(feature = "cli"))]
    {
        eprintln!("CLI feature not enabled. Build with: cargo run --features cli");
    }
}
