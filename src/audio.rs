//! cpal capture: opens the input device and drives the meter pipeline from
//! the host's audio callback.

use crate::config::RunConfig;
use crate::error::MeterError;
use crate::meter::accumulator::PipelineClock;
use crate::meter::frame::FrameSlot;
use crate::meter::pipeline::Pipeline;
use crate::shutdown;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SampleFormat, SizedSample, SupportedBufferSize};
use std::fs::File;
use std::os::unix::io::AsRawFd;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// RAII guard to suppress stderr while ALSA enumerates devices.
/// Restores stderr when dropped.
struct StderrSuppressor {
    saved_fd: i32,
    _dev_null: File,
}

impl StderrSuppressor {
    fn new() -> Option<Self> {
        let dev_null = File::open("/dev/null").ok()?;

        let saved_fd = unsafe { libc::dup(2) };
        if saved_fd < 0 {
            return None;
        }

        if unsafe { libc::dup2(dev_null.as_raw_fd(), 2) } < 0 {
            unsafe {
                libc::close(saved_fd);
            }
            return None;
        }

        Some(Self {
            saved_fd,
            _dev_null: dev_null,
        })
    }
}

impl Drop for StderrSuppressor {
    fn drop(&mut self) {
        unsafe {
            libc::dup2(self.saved_fd, 2);
            libc::close(self.saved_fd);
        }
    }
}

/// Names of all input devices on the default host.
pub fn list_input_devices() -> Result<Vec<String>, MeterError> {
    let _quiet = StderrSuppressor::new();
    let host = cpal::default_host();
    let names = host
        .input_devices()?
        .map(|device| device.name().unwrap_or_else(|_| "Unknown".to_string()))
        .collect();
    Ok(names)
}

/// Pick the named device, falling back to the host default.
fn select_device(host: &cpal::Host, wanted: Option<&str>) -> Result<cpal::Device, MeterError> {
    if let Some(wanted) = wanted {
        let found = host
            .input_devices()?
            .find(|device| device.name().map(|name| name == wanted).unwrap_or(false));
        match found {
            Some(device) => return Ok(device),
            None => warn!("input device {wanted:?} not found, using default input"),
        }
    }
    host.default_input_device().ok_or(MeterError::NoInputDevice)
}

/// Fixed block size if the device accepts the requested one.
fn negotiate_block_size(requested: Option<u32>, supported: &SupportedBufferSize) -> Option<u32> {
    let requested = requested?;
    match supported {
        SupportedBufferSize::Range { min, max } if (*min..=*max).contains(&requested) => {
            Some(requested)
        }
        SupportedBufferSize::Range { min, max } => {
            warn!("block size {requested} outside device range {min}..={max}, using host default");
            None
        }
        SupportedBufferSize::Unknown => {
            warn!("device does not report block sizes, using host default");
            None
        }
    }
}

/// A running (or ready to run) input stream feeding a [`FrameSlot`].
pub struct AudioInput {
    stream: cpal::Stream,
    pub device_name: String,
    pub device_channels: u16,
    pub sample_rate: u32,
}

impl AudioInput {
    /// Open the device and build the stream without starting it.
    pub fn open(config: &RunConfig, slot: Arc<FrameSlot>) -> Result<Self, MeterError> {
        let quiet = StderrSuppressor::new();

        let host = cpal::default_host();
        debug!("audio host: {:?}", host.id());

        let device = select_device(&host, config.device.as_deref())?;
        let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());

        let supported = device.default_input_config()?;
        let sample_format = supported.sample_format();
        let block_size = negotiate_block_size(config.block_size, supported.buffer_size());

        let mut stream_config = supported.config();
        if let Some(frames) = block_size {
            stream_config.buffer_size = cpal::BufferSize::Fixed(frames);
        }

        let device_channels = stream_config.channels;
        let sample_rate = stream_config.sample_rate.0;
        let block_label =
            block_size.map_or_else(|| "host default".to_string(), |frames| frames.to_string());
        info!(
            "input {device_name:?}: {sample_rate}Hz, {device_channels} channels, \
             {sample_format:?}, block size {block_label}"
        );

        let wanted = config.visualizer.channels;
        for channel in (device_channels as usize)..wanted {
            warn!("channel {channel} has no device input, it will stay silent");
        }

        let clock = match block_size {
            Some(frames) => PipelineClock::with_block_size(frames as usize),
            None => PipelineClock::new(),
        };
        let pipeline = Pipeline::new(&config.visualizer, clock);

        let stream = match sample_format {
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, pipeline, slot)?,
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, pipeline, slot)?,
            SampleFormat::U16 => build_stream::<u16>(&device, &stream_config, pipeline, slot)?,
            other => return Err(MeterError::SampleFormat(other)),
        };

        drop(quiet);
        Ok(Self {
            stream,
            device_name,
            device_channels,
            sample_rate,
        })
    }

    pub fn start(&self) -> Result<(), MeterError> {
        self.stream.play()?;
        Ok(())
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut pipeline: Pipeline,
    slot: Arc<FrameSlot>,
) -> Result<cpal::Stream, MeterError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let device_channels = config.channels as usize;
    let mut drift_reported = false;

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            // No logging, locking or allocation past this point
            if shutdown::requested() {
                return;
            }

            if let Some(levels) = pipeline.process_interleaved(data, device_channels) {
                slot.publish(levels);
            }

            if !drift_reported && pipeline.clock().drifted() {
                slot.flag_block_size_change();
                drift_reported = true;
            }
        },
        |err| match err {
            cpal::StreamError::DeviceNotAvailable => {
                error!("audio device disconnected");
                shutdown::request();
            }
            other => warn!("audio stream error: {other}"),
        },
        None,
    )?;
    Ok(stream)
}
