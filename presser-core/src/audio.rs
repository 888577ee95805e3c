//! # Audio Source Module
//!
//! Pull-based audio sources feeding the analysis pipeline. A source
//! hands out fixed-capacity blocks of mono f32 samples together with
//! the count actually read; a count short of [`BLOCK_SIZE`] marks the
//! final block of the stream.
//!
//! Two implementations are provided:
//! - WAV files, decoded up front with hound
//! - Live capture devices via CPAL, bridged to the pull model through
//!   a channel

use std::path::Path;

use anyhow::{Context, Result, anyhow};
use cpal::SupportedStreamConfigRange;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Receiver;
use hound::{SampleFormat, WavReader};

/// Number of samples per pulled block.
///
/// A pull that comes back with fewer valid samples than this signals
/// the last (possibly partial) block of the stream.
pub const BLOCK_SIZE: usize = 512;

/// Sample rate requested from capture devices.
const TARGET_SAMPLE_RATE: u32 = 44_100;

/// A pull-based stream of mono sample blocks.
pub trait SampleSource {
    /// Fills `block` with up to [`BLOCK_SIZE`] samples and returns the
    /// count actually read. The remainder of a partial block is
    /// zero-filled. Blocks until data is available.
    fn pull(&mut self, block: &mut [f32; BLOCK_SIZE]) -> Result<usize>;

    /// Sample rate of the stream in Hz.
    fn sample_rate(&self) -> u32;
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn pull(&mut self, block: &mut [f32; BLOCK_SIZE]) -> Result<usize> {
        (**self).pull(block)
    }

    fn sample_rate(&self) -> u32 {
        (**self).sample_rate()
    }
}

/// Opens the audio source named on the command line.
///
/// An identifier starting with `device:` selects a capture device,
/// either `device:default` for the host default or a substring of the
/// device name. Anything else is treated as a WAV file path.
pub fn open_source(source: &str) -> Result<Box<dyn SampleSource>> {
    match source.strip_prefix("device:") {
        Some(device) => Ok(Box::new(DeviceSource::open(device)?)),
        None => Ok(Box::new(WavFileSource::open(source)?)),
    }
}

/// WAV file source.
///
/// The whole file is decoded and downmixed to mono at open time;
/// pulls then walk the sample buffer block by block.
pub struct WavFileSource {
    samples: Vec<f32>,
    pos: usize,
    sample_rate: u32,
}

impl WavFileSource {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = WavReader::open(path)
            .with_context(|| format!("failed to open WAV source '{}'", path.display()))?;
        let spec = reader.spec();

        let interleaved: Vec<f32> = match spec.sample_format {
            SampleFormat::Float => reader
                .samples::<f32>()
                .collect::<Result<_, _>>()
                .context("failed to decode WAV samples")?,
            SampleFormat::Int => {
                let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as f32 * scale))
                    .collect::<Result<_, _>>()
                    .context("failed to decode WAV samples")?
            }
        };

        // Downmix interleaved frames by averaging across channels.
        let channels = spec.channels.max(1) as usize;
        let samples = if channels == 1 {
            interleaved
        } else {
            interleaved
                .chunks(channels)
                .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
                .collect()
        };

        eprintln!(
            "[AUDIO] WAV source '{}': {} Hz, {} channel(s), {} samples",
            path.display(),
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            samples,
            pos: 0,
            sample_rate: spec.sample_rate,
        })
    }
}

impl SampleSource for WavFileSource {
    fn pull(&mut self, block: &mut [f32; BLOCK_SIZE]) -> Result<usize> {
        let remaining = &self.samples[self.pos..];
        let count = remaining.len().min(BLOCK_SIZE);
        block[..count].copy_from_slice(&remaining[..count]);
        block[count..].fill(0.0);
        self.pos += count;
        Ok(count)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Live capture from a CPAL input device.
///
/// The device callback accumulates samples and forwards exact
/// [`BLOCK_SIZE`] frames over a channel; `pull` blocks until the next
/// frame arrives. Capture only continues while the stream handle is
/// alive, so the source owns it.
pub struct DeviceSource {
    _stream: cpal::Stream,
    frames: Receiver<Vec<f32>>,
    sample_rate: u32,
}

impl DeviceSource {
    /// Opens a capture device by name substring, or the host default
    /// for an empty identifier or the identifier `default`.
    pub fn open(name: &str) -> Result<Self> {
        let host = cpal::default_host();
        let device = if name.is_empty() || name == "default" {
            host.default_input_device()
                .ok_or_else(|| anyhow!("no default input device available"))?
        } else {
            host.input_devices()?
                .find(|d| d.name().map(|n| n.contains(name)).unwrap_or(false))
                .ok_or_else(|| anyhow!("no input device matching '{name}'"))?
        };

        eprintln!("[AUDIO] Using audio input device: {}", device.name()?);

        let configs = device.supported_input_configs()?.collect::<Vec<_>>();
        let supported_config = find_supported_config(configs, TARGET_SAMPLE_RATE)
            .ok_or_else(|| anyhow!("no suitable f32 input format found"))?;

        // The nearest supported range may not contain the target rate.
        let rate = TARGET_SAMPLE_RATE.clamp(
            supported_config.min_sample_rate().0,
            supported_config.max_sample_rate().0,
        );
        let config = supported_config.with_sample_rate(cpal::SampleRate(rate));
        let sample_rate = config.sample_rate().0;
        let config: cpal::StreamConfig = config.into();

        eprintln!("[AUDIO] Selected sample rate: {sample_rate} Hz");

        let (sender, frames) = crossbeam_channel::unbounded::<Vec<f32>>();
        let err_fn = |err| eprintln!("[AUDIO] An error occurred on the audio stream: {err}");

        // This buffer accumulates audio data from the callback.
        let mut audio_buffer: Vec<f32> = Vec::with_capacity(BLOCK_SIZE * 2);

        let stream = device.build_input_stream(
            &config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                audio_buffer.extend_from_slice(data);

                // While we have enough data for a full block, pass it on.
                while audio_buffer.len() >= BLOCK_SIZE {
                    let frame = audio_buffer[..BLOCK_SIZE].to_vec();
                    let _ = sender.try_send(frame);
                    audio_buffer.drain(..BLOCK_SIZE);
                }
            },
            err_fn,
            None,
        )?;

        stream.play()?;

        Ok(Self {
            _stream: stream,
            frames,
            sample_rate,
        })
    }
}

impl SampleSource for DeviceSource {
    fn pull(&mut self, block: &mut [f32; BLOCK_SIZE]) -> Result<usize> {
        match self.frames.recv() {
            Ok(frame) => {
                block.copy_from_slice(&frame);
                Ok(BLOCK_SIZE)
            }
            // Stream torn down; report a short read to end the pipeline.
            Err(_) => {
                block.fill(0.0);
                Ok(0)
            }
        }
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Finds the best supported input configuration for the target sample
/// rate: mono, f32, closest rate range.
fn find_supported_config(
    configs: Vec<SupportedStreamConfigRange>,
    target_rate: u32,
) -> Option<SupportedStreamConfigRange> {
    configs
        .into_iter()
        .filter(|c| c.channels() == 1 && c.sample_format() == cpal::SampleFormat::F32)
        .min_by_key(|c| {
            let min_diff = (c.min_sample_rate().0 as i32 - target_rate as i32).abs();
            let max_diff = (c.max_sample_rate().0 as i32 - target_rate as i32).abs();
            min_diff.min(max_diff)
        })
}
