use std::path::PathBuf;

use clap::Parser;
use libdicetray::{parse, stringify, BoxConfig, DiceBox, DiceError, RollNotation, Theme};
use log::{info, warn};
use serde::{Deserialize, Serialize};

/// CLI for the dice tray: throws dice headlessly and prints what they show
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Dice notation, e.g. `2d6+1d20+3` or `2d6 1d20 @ 4 2 19`
    #[arg(required = true, allow_hyphen_values = true)]
    notation: Vec<String>,

    /// Simulated seconds after which a throw is read as-is
    #[arg(short, long)]
    time: Option<f32>,

    /// Output format: text, json, csv
    #[arg(short, long, default_value = "text", value_parser = ["text", "json", "csv"])]
    output: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Seed for reproducible throws
    #[arg(long)]
    seed: Option<u64>,

    /// JSON file with box and physics settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of rolls for batch mode
    #[arg(long, default_value_t = 1)]
    batch: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RollResult {
    die_type: String,
    value: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SimulationResult {
    results: Vec<RollResult>,
    constant: i32,
    total: i32,
    forced: usize,
}

/// Join command-line pieces into one expression. Terms before `@` are
/// summed; everything after it is the requested-results list.
fn join_notation(pieces: &[String]) -> String {
    let mut expr = String::new();
    let mut results: Option<String> = None;
    for piece in pieces {
        if let Some(results) = results.as_mut() {
            results.push(' ');
            results.push_str(piece);
            continue;
        }
        match piece.split_once('@') {
            Some((term, rest)) => {
                push_term(&mut expr, term);
                results = Some(rest.to_string());
            }
            None => push_term(&mut expr, piece),
        }
    }
    match results {
        Some(results) => format!("{expr} @ {}", results.trim()),
        None => expr,
    }
}

fn push_term(expr: &mut String, term: &str) {
    if term.is_empty() {
        return;
    }
    let glued = expr.is_empty() || expr.ends_with(['+', '-']) || term.starts_with(['+', '-']);
    if !glued {
        expr.push('+');
    }
    expr.push_str(term);
}

fn load_config(args: &Args) -> Result<BoxConfig, DiceError> {
    let mut config = match &args.config {
        Some(path) => BoxConfig::from_path(path)?,
        None => BoxConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(time) = args.time {
        config.max_sim_seconds = time;
    }
    Ok(config)
}

fn run_simulation(
    notation: &RollNotation,
    config: BoxConfig,
    batch: usize,
) -> Result<Vec<SimulationResult>, DiceError> {
    let mut dice_box = DiceBox::new(config, Theme::default());
    let mut all_results = Vec::with_capacity(batch);

    for roll in 0..batch {
        dice_box.clear();
        let Some(outcome) = dice_box.roll_to_completion(notation, None)? else {
            warn!("roll {} skipped: a throw was still in flight", roll + 1);
            continue;
        };
        info!(
            "roll {} settled after {} steps",
            roll + 1,
            outcome.iterations
        );
        let results = outcome
            .dice
            .iter()
            .zip(&outcome.values)
            .map(|(die, &value)| RollResult {
                die_type: die.to_string(),
                value,
            })
            .collect();
        all_results.push(SimulationResult {
            results,
            constant: outcome.constant,
            total: outcome.total,
            forced: outcome.forced,
        });
    }

    Ok(all_results)
}

fn format_output(
    results: Vec<SimulationResult>,
    output_format: &str,
) -> Result<String, Box<dyn std::error::Error>> {
    match output_format {
        "text" => {
            let mut output = String::new();
            for (i, result) in results.iter().enumerate() {
                if results.len() > 1 {
                    output.push_str(&format!("Roll {}: ", i + 1));
                }

                let values: Vec<String> = result
                    .results
                    .iter()
                    .map(|r| format!("{}: {}", r.die_type, r.value))
                    .collect();
                output.push_str(&values.join(", "));
                match result.constant {
                    0 => {}
                    c if c > 0 => output.push_str(&format!(" + {c}")),
                    c => output.push_str(&format!(" - {}", c.unsigned_abs())),
                }
                output.push('\n');

                if results.len() > 1 {
                    output.push_str(&format!("  Total: {}\n", result.total));
                } else {
                    output.push_str(&format!("Total: {}\n", result.total));
                }
            }
            Ok(output)
        }
        "json" => {
            if results.len() == 1 {
                Ok(serde_json::to_string_pretty(&results[0])?)
            } else {
                Ok(serde_json::to_string_pretty(&results)?)
            }
        }
        "csv" => {
            let mut output = String::from("Roll,Dice Type,Value\n");
            for (i, result) in results.iter().enumerate() {
                for roll in &result.results {
                    output.push_str(&format!("{},{},{}\n", i + 1, roll.die_type, roll.value));
                }
                if result.constant != 0 {
                    output.push_str(&format!("{},constant,{}\n", i + 1, result.constant));
                }
            }
            Ok(output)
        }
        _ => Err("Invalid output format".into()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let text = join_notation(&args.notation);
    let notation = parse(&text);
    if notation.error {
        warn!("parts of {text:?} were not understood and were skipped");
    }
    info!("rolling {}", stringify(&notation));
    if notation.is_empty() {
        println!("No dice to roll in {text:?}");
        return Ok(());
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            std::process::exit(1);
        }
    };

    match run_simulation(&notation, config, args.batch) {
        Ok(results) => {
            let output = format_output(results, &args.output)?;
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error during simulation: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
