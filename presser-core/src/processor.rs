//! # Frequency Processor
//!
//! The orchestrator: drains the detected-frequency sequence,
//! quantizes each estimate with the same granularity the bucket map
//! was built with, and taps the mapped key on every hit. Silence and
//! unmatched notes are normal outcomes and do nothing.

use std::collections::HashMap;

use anyhow::Result;

use crate::quantize::quantize;

/// Destination for matched key taps.
///
/// One sink handle is constructed at startup and passed into the
/// processor; implementations decide what a tap is: a synthetic OS
/// key event, a printed notice, a test recording.
pub trait KeySink {
    fn tap(&mut self, key: &str) -> Result<()>;
}

/// Sink for dry runs: prints the key name instead of pressing it.
///
/// Notices go to stdout so they can be piped; diagnostics elsewhere
/// in the pipeline stay on stderr.
pub struct DryRunSink;

impl KeySink for DryRunSink {
    fn tap(&mut self, key: &str) -> Result<()> {
        println!("Tapping key '{key}'");
        Ok(())
    }
}

/// Drains `frequencies`, tapping the sink for every estimate whose
/// bucket has an entry in `bucket_map`.
///
/// `granularity` must be the value `bucket_map` was quantized with;
/// buckets from mismatched granularities never line up. Source and
/// sink failures propagate immediately; there are no retries.
pub fn process_frequencies<I>(
    frequencies: I,
    bucket_map: &HashMap<i64, String>,
    granularity: u32,
    sink: &mut dyn KeySink,
) -> Result<()>
where
    I: IntoIterator<Item = Result<f32>>,
{
    for freq in frequencies {
        let freq = freq?;
        let Some(bucket) = quantize(f64::from(freq), granularity) else {
            continue; // silence / unvoiced block
        };
        if let Some(key) = bucket_map.get(&bucket) {
            sink.tap(key)?;
        }
    }
    Ok(())
}
