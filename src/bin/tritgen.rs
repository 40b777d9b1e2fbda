//! tritgen - Verification stimulus generator for the ternary accelerator
//!
//! # Usage
//!
//! ```bash
//! # Generate the full stimulus file set with the built-in configuration:
//! tritgen -o stimuli
//!
//! # Custom geometry from a JSON file, 4 executions, fixed seed:
//! tritgen -c geometry.json -o stimuli --execs 4 --seed 7
//!
//! # Load a decoder codebook from table files instead of the built-in one:
//! tritgen --codebook stimuli_table.txt responses_table.txt
//! ```
//!
//! # Exit Codes
//!
//! - 0: All stimulus files written
//! - 1: Generation failed (geometry, codebook, or record error)
//! - 2: Invalid arguments

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;

use tritgen::codebook::Codebook;
use tritgen::geometry::{Geometry, MemoryConfig};
use tritgen::network::{random_image, random_thresholds, random_weights, Layer};
use tritgen::record::TestParams;
use tritgen::stimuli;

struct Options {
    config: Option<PathBuf>,
    out_dir: PathBuf,
    codebook: Option<(PathBuf, PathBuf)>,
    num_execs: usize,
    seed: u64,
    cnn_layers: usize,
    tcn_layers: usize,
    classes: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            config: None,
            out_dir: PathBuf::from("stimuli"),
            codebook: None,
            num_execs: 1,
            seed: 42,
            cnn_layers: 2,
            tcn_layers: 1,
            classes: 10,
        }
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let mut opts = Options::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--config" => match args.get(i + 1) {
                Some(path) => {
                    opts.config = Some(PathBuf::from(path));
                    i += 1;
                }
                None => return usage_error("--config requires a file path"),
            },
            "-o" | "--out" => match args.get(i + 1) {
                Some(path) => {
                    opts.out_dir = PathBuf::from(path);
                    i += 1;
                }
                None => return usage_error("--out requires a directory path"),
            },
            "--codebook" => match (args.get(i + 1), args.get(i + 2)) {
                (Some(stim), Some(resp)) => {
                    opts.codebook = Some((PathBuf::from(stim), PathBuf::from(resp)));
                    i += 2;
                }
                _ => return usage_error("--codebook requires two file paths"),
            },
            "--execs" => match parse_count(args.get(i + 1)) {
                Some(n) => {
                    opts.num_execs = n;
                    i += 1;
                }
                None => return usage_error("--execs requires a positive integer"),
            },
            "--seed" => match args.get(i + 1).and_then(|s| s.parse::<u64>().ok()) {
                Some(n) => {
                    opts.seed = n;
                    i += 1;
                }
                None => return usage_error("--seed requires an integer"),
            },
            "--cnn-layers" => match parse_count(args.get(i + 1)) {
                Some(n) => {
                    opts.cnn_layers = n;
                    i += 1;
                }
                None => return usage_error("--cnn-layers requires a positive integer"),
            },
            "--tcn-layers" => match args.get(i + 1).and_then(|s| s.parse::<usize>().ok()) {
                Some(n) => {
                    opts.tcn_layers = n;
                    i += 1;
                }
                None => return usage_error("--tcn-layers requires an integer"),
            },
            "--classes" => match parse_count(args.get(i + 1)) {
                Some(n) => {
                    opts.classes = n;
                    i += 1;
                }
                None => return usage_error("--classes requires a positive integer"),
            },
            "-h" | "--help" => {
                print_help();
                return ExitCode::SUCCESS;
            }
            other => {
                eprintln!("Unknown option: {}\n", other);
                print_help();
                return ExitCode::from(2);
            }
        }
        i += 1;
    }

    match run(&opts) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_count(arg: Option<&String>) -> Option<usize> {
    arg.and_then(|s| s.parse::<usize>().ok()).filter(|&n| n > 0)
}

fn usage_error(message: &str) -> ExitCode {
    eprintln!("Error: {}\n", message);
    print_help();
    ExitCode::from(2)
}

fn print_help() {
    println!("tritgen - verification stimulus generator for the ternary accelerator");
    println!();
    println!("USAGE:");
    println!("    tritgen [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <FILE>           Geometry configuration JSON (default: built-in)");
    println!("    -o, --out <DIR>               Output directory (default: stimuli)");
    println!("        --codebook <STIM> <RESP>  Decoder codebook table files (default: built-in base-3)");
    println!("        --execs <N>               Number of test executions (default: 1)");
    println!("        --seed <N>                Random seed for the stand-in network (default: 42)");
    println!("        --cnn-layers <N>          Convolutional layers in the stand-in network (default: 2)");
    println!("        --tcn-layers <N>          Temporal layers in the stand-in network (default: 1)");
    println!("        --classes <N>             Output classes of the final dense layer (default: 10)");
    println!("    -h, --help                    Show this help");
}

fn run(opts: &Options) -> anyhow::Result<()> {
    let config = match &opts.config {
        Some(path) => MemoryConfig::from_json_file(path)
            .with_context(|| format!("loading geometry configuration {}", path.display()))?,
        None => MemoryConfig::cutie(),
    };
    let geom = Geometry::resolve(&config).context("resolving memory geometry")?;

    let codebook = match &opts.codebook {
        Some((stim, resp)) => Codebook::from_files(stim, resp)
            .context("loading decoder codebook tables")?,
        None => Codebook::base3(),
    };

    let layers = build_network(&geom, opts).context("building stand-in network")?;

    std::fs::create_dir_all(&opts.out_dir)
        .with_context(|| format!("creating output directory {}", opts.out_dir.display()))?;

    println!("Generating layer params stimuli file...");
    let mut sink = stream(opts, "layer_params.txt")?;
    let mut intf = stream(opts, "layer_params_intf.txt")?;
    stimuli::write_layer_params(&mut sink, &mut intf, &geom, &layers, config.tcn_width)
        .context("writing layer parameter stream")?;

    println!("Generating weight stimuli file...");
    let mut sink = stream(opts, "weights.txt")?;
    let mut intf = stream(opts, "weights_intf.txt")?;
    stimuli::write_weights(&mut sink, &mut intf, &geom, &codebook, &layers)
        .context("writing weight stream")?;

    println!("Generating thresholds stimuli file...");
    let mut sink = stream(opts, "thresholds.txt")?;
    let mut intf = stream(opts, "thresholds_intf.txt")?;
    stimuli::write_thresholds(&mut sink, &mut intf, &geom, &layers)
        .context("writing threshold stream")?;

    println!("Generating activation and result stimuli file...");
    let mut act_sink = stream(opts, "activations.txt")?;
    let mut act_intf = stream(opts, "activations_intf.txt")?;
    let mut resp_sink = stream(opts, "responses.txt")?;
    let mut resp_intf = stream(opts, "responses_intf.txt")?;

    let in_channels = layers
        .first()
        .map(|l| l.in_channels)
        .unwrap_or(config.ni);
    let mut num_acts = 0;
    let mut num_responses = 0;
    for exec in 0..opts.num_execs {
        let image = random_image(
            in_channels,
            config.image_width,
            config.image_height,
            opts.seed ^ (exec as u64).wrapping_mul(0x9e37),
        );
        num_acts = stimuli::write_activations(&mut act_sink, &mut act_intf, &geom, &codebook, &image)
            .with_context(|| format!("writing activation stream, execution {}", exec))?;

        let response = random_image(opts.classes, 1, 1, opts.seed ^ 0xdead ^ exec as u64);
        num_responses =
            stimuli::write_activations(&mut resp_sink, &mut resp_intf, &geom, &codebook, &response)
                .with_context(|| format!("writing response stream, execution {}", exec))?;
    }

    println!("Generating test params file...");
    let params = TestParams {
        num_execs: opts.num_execs,
        image_width: config.image_width,
        image_height: config.image_height,
        rounded_ni: geom.round_to_word(in_channels),
        num_acts,
        num_responses,
        num_layers: layers.len(),
        num_cnn_layers: opts.cnn_layers,
        num_tcn_layers: opts.tcn_layers,
    };
    let mut sink = stream(opts, "test_params.txt")?;
    stimuli::write_test_params(&mut sink, &params).context("writing test parameter summary")?;

    println!(
        "Done. {} layers, {} executions, stimuli in {}.",
        layers.len(),
        opts.num_execs,
        opts.out_dir.display()
    );
    Ok(())
}

fn stream(opts: &Options, name: &str) -> anyhow::Result<BufWriter<File>> {
    let path = opts.out_dir.join(name);
    let file =
        File::create(&path).with_context(|| format!("creating {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Seeded stand-in for a trained network: full-width CNN layers, then TCN
/// layers over the configured sequence buffer, then one dense classifier.
fn build_network(geom: &Geometry, opts: &Options) -> anyhow::Result<Vec<Layer>> {
    let config = &geom.config;
    // Largest magnitude a threshold field can carry at its signed width.
    let magnitude = (1i64 << (geom.threshold_width - 1)) - 1;
    let mut layers = Vec::new();
    let mut seed = opts.seed;
    let mut next_seed = || {
        seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        seed
    };

    let mut width = config.image_width;
    let mut height = config.image_height;
    let mut in_channels = config.ni;
    for _ in 0..opts.cnn_layers {
        let weights = random_weights(config.no, in_channels, config.k, config.k, next_seed());
        let thresholds = random_thresholds(config.no, magnitude, next_seed())?;
        let layer = Layer::cnn(
            in_channels, config.no, config.k, width, height, 1, 1, None, weights, thresholds,
        )?;
        width = layer.image_width;
        height = layer.image_height;
        in_channels = config.no;
        layers.push(layer);
    }

    for _ in 0..opts.tcn_layers {
        let kt = 2.min(config.k);
        let dilation = 2.min(config.tcn_width);
        let weights = random_weights(config.no, in_channels, kt, 1, next_seed());
        let thresholds = random_thresholds(config.no, magnitude, next_seed())?;
        layers.push(Layer::tcn(
            in_channels,
            config.no,
            config.k,
            kt,
            dilation,
            config.tcn_width,
            weights,
            thresholds,
        )?);
        in_channels = config.no;
    }

    let weights = random_weights(opts.classes, in_channels, config.k, config.k, next_seed());
    let thresholds = random_thresholds(opts.classes, magnitude, next_seed())?;
    layers.push(Layer::dense(
        in_channels,
        opts.classes,
        config.k,
        weights,
        thresholds,
    )?);

    Ok(layers)
}
