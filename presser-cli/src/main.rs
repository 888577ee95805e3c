// CLI entry point for SoundPresser.
//
// Converts frequencies found in sound to keyboard presses: pulls
// sample blocks from the audio source, estimates one pitch per block,
// quantizes it into a note bucket and taps the key the frequency map
// assigns to that bucket.
//
// Usage:
//   presser <source> <frequency_map> [OPTIONS]
//     <source>            WAV file path, or device:default / device:<name>
//                         for live capture
//     <frequency_map>     JSON object mapping decimal frequencies to key
//                         identifiers, e.g. { "440.0": "a" }
//     --granularity <N>   Bucket width for note matching, in thousandths of
//                         natural-log units (default: 56)
//     --dry-run           Print key names instead of pressing keys

mod keyboard;

use std::path::Path;
use std::process::exit;

use anyhow::Result;
use presser_core::analyzer::PitchStream;
use presser_core::audio::{self, SampleSource};
use presser_core::freq_map;
use presser_core::pitch::PitchEstimator;
use presser_core::processor::{self, DryRunSink, KeySink};

use crate::keyboard::SystemKeyboard;

struct Args {
    source: String,
    frequency_map: String,
    granularity: u32,
    dry_run: bool,
}

fn main() {
    let args = parse_args();

    // File sources must exist before any processing starts. Device
    // identifiers are resolved by the audio layer instead.
    if !args.source.starts_with("device:") && !Path::new(&args.source).exists() {
        eprintln!("Could not find source '{}' on the system!", args.source);
        exit(1);
    }

    if let Err(e) = run(&args) {
        eprintln!("Error: {e:#}");
        exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    // Read and prepare the frequency map first; a broken map should
    // fail before any audio is touched.
    let entries = freq_map::load_raw_map(&args.frequency_map)?;
    let bucket_map = freq_map::quantize_map(&entries, args.granularity);
    eprintln!(
        "[MAIN] Loaded {} map entries into {} buckets",
        entries.len(),
        bucket_map.len()
    );

    let source = audio::open_source(&args.source)?;
    let estimator = PitchEstimator::new(source.sample_rate());
    let frequencies = PitchStream::new(source, estimator);

    // Dry runs never touch the OS keyboard, so they work headless.
    let mut sink: Box<dyn KeySink> = if args.dry_run {
        Box::new(DryRunSink)
    } else {
        Box::new(SystemKeyboard::new()?)
    };

    processor::process_frequencies(frequencies, &bucket_map, args.granularity, sink.as_mut())
}

/// Parse command-line arguments. Uses simple `std::env::args()`
/// matching, no clap dependency.
fn parse_args() -> Args {
    let mut source = None;
    let mut frequency_map = None;
    let mut granularity: u32 = 56;
    let mut dry_run = false;

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--granularity" => {
                i += 1;
                granularity = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--granularity requires a positive integer");
                    exit(1);
                });
                if granularity == 0 {
                    eprintln!("--granularity must be greater than zero");
                    exit(1);
                }
            }
            "--dry-run" => dry_run = true,
            "--help" | "-h" => {
                print_usage();
                exit(0);
            }
            other if other.starts_with("--") => {
                eprintln!("Unknown option '{other}'");
                print_usage();
                exit(1);
            }
            positional => {
                if source.is_none() {
                    source = Some(positional.to_string());
                } else if frequency_map.is_none() {
                    frequency_map = Some(positional.to_string());
                } else {
                    eprintln!("Unexpected argument '{positional}'");
                    print_usage();
                    exit(1);
                }
            }
        }
        i += 1;
    }

    let (Some(source), Some(frequency_map)) = (source, frequency_map) else {
        print_usage();
        exit(1);
    };

    Args {
        source,
        frequency_map,
        granularity,
        dry_run,
    }
}

fn print_usage() {
    eprintln!("Usage: presser <source> <frequency_map> [--granularity <N>] [--dry-run]");
    eprintln!();
    eprintln!("SoundPresser is a tool for converting frequencies found in sound to");
    eprintln!("keyboard presses.");
    eprintln!();
    eprintln!("  <source>           WAV file, or device:default / device:<name> for live capture");
    eprintln!("  <frequency_map>    Path to a JSON file mapping frequencies to keys");
    eprintln!("  --granularity <N>  How close log(freq) has to be to log(freq of a mapped");
    eprintln!("                     note), in thousandths (default: 56)");
    eprintln!("  --dry-run          Print names of keys to be pressed instead of pressing them");
}
