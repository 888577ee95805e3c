//! # Pitch Stream Analyzer
//!
//! Adapts a pull-based sample source and a pitch estimator into a
//! lazy, finite sequence of detected frequencies, one per audio block.

use anyhow::Result;

use crate::audio::{BLOCK_SIZE, SampleSource};
use crate::pitch::PitchEstimator;

/// Lazy stream of one frequency estimate per audio block.
///
/// Forward-only and single-pass: each `next` pulls one block,
/// estimates its pitch and yields the result. The final, possibly
/// partial, block is still analyzed; the stream ends after yielding
/// it, when the pull's sample count came back short of [`BLOCK_SIZE`].
/// A pull failure yields one `Err` and then ends the stream.
pub struct PitchStream<S: SampleSource> {
    source: S,
    estimator: PitchEstimator,
    done: bool,
}

impl<S: SampleSource> PitchStream<S> {
    pub fn new(source: S, estimator: PitchEstimator) -> Self {
        Self {
            source,
            estimator,
            done: false,
        }
    }
}

impl<S: SampleSource> Iterator for PitchStream<S> {
    type Item = Result<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut block = [0.0f32; BLOCK_SIZE];
        let read = match self.source.pull(&mut block) {
            Ok(read) => read,
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };

        // A short read marks the last block. The termination check
        // runs after the yield, never before it.
        if read < BLOCK_SIZE {
            self.done = true;
        }

        Some(Ok(self.estimator.estimate(&block)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    /// Source that replays a fixed script of pull counts over silent
    /// blocks.
    struct ScriptedSource {
        counts: Vec<usize>,
        pulls: usize,
    }

    impl ScriptedSource {
        fn new(counts: &[usize]) -> Self {
            Self {
                counts: counts.to_vec(),
                pulls: 0,
            }
        }
    }

    impl SampleSource for ScriptedSource {
        fn pull(&mut self, block: &mut [f32; BLOCK_SIZE]) -> Result<usize> {
            block.fill(0.0);
            match self.counts.get(self.pulls) {
                Some(&count) => {
                    self.pulls += 1;
                    Ok(count)
                }
                None => bail!("pulled past the end of the script"),
            }
        }

        fn sample_rate(&self) -> u32 {
            44_100
        }
    }

    #[test]
    fn stream_ends_after_the_short_block_is_yielded() {
        let source = ScriptedSource::new(&[512, 512, 300]);
        let stream = PitchStream::new(source, PitchEstimator::new(44_100));

        let frequencies: Vec<f32> = stream.map(|f| f.unwrap()).collect();

        // Exactly three blocks analyzed, the partial one included.
        assert_eq!(frequencies, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn exact_multiple_streams_end_on_the_empty_pull() {
        let source = ScriptedSource::new(&[512, 0]);
        let stream = PitchStream::new(source, PitchEstimator::new(44_100));

        assert_eq!(stream.count(), 2);
    }

    #[test]
    fn pull_errors_end_the_stream_after_propagating() {
        let source = ScriptedSource::new(&[512]);
        let mut stream = PitchStream::new(source, PitchEstimator::new(44_100));

        assert!(stream.next().unwrap().is_ok());
        assert!(stream.next().unwrap().is_err());
        assert!(stream.next().is_none());
    }
}
