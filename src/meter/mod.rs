//! Peak meter pipeline and its render loop.
//!
//! The audio callback runs peak extraction, block accumulation and smoothing,
//! then drops the finished levels into a [`frame::FrameSlot`]. The main thread
//! polls that slot once per refresh tick and does all terminal output, so no
//! terminal write ever happens on the audio thread.

pub mod accumulator;
pub mod bar;
pub mod frame;
pub mod peak;
pub mod pipeline;
pub mod smoothing;

use crate::audio::AudioInput;
use crate::config::RunConfig;
use crate::error::MeterError;
use crate::shutdown;
use crate::terminal::TerminalCanvas;
use bar::BarRenderer;
use frame::FrameSlot;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Run the meter until a signal or the audio host ends the session.
///
/// Setup errors are returned before the terminal is touched. Once the cursor
/// is hidden it is always shown again before this returns.
pub fn run(config: &RunConfig) -> Result<(), MeterError> {
    shutdown::install().map_err(MeterError::Signal)?;

    let channels = config.visualizer.channels;
    let slot = Arc::new(FrameSlot::new(channels));
    let input = AudioInput::open(config, Arc::clone(&slot))?;
    info!(
        "metering {channels} channel(s) from {:?} ({} device channels at {}Hz)",
        input.device_name, input.device_channels, input.sample_rate
    );

    let mut canvas = start_then_hide(|| input.start(), io::stdout())?;

    let result = render_loop(config, &slot, &mut canvas);

    // Stream first so no callback can race the terminal teardown
    drop(input);
    canvas.restore()?;
    result
}

/// Start capture and only then hide the cursor, so a start failure leaves
/// the terminal as it was.
fn start_then_hide<W, F>(start: F, out: W) -> Result<TerminalCanvas<W>, MeterError>
where
    W: Write,
    F: FnOnce() -> Result<(), MeterError>,
{
    start()?;
    Ok(TerminalCanvas::new(out)?)
}

fn render_loop<W: Write>(
    config: &RunConfig,
    slot: &FrameSlot,
    canvas: &mut TerminalCanvas<W>,
) -> Result<(), MeterError> {
    let renderer = BarRenderer::new(config.visualizer.bar, config.visualizer.channels);
    let mut levels = vec![0.0; slot.channels()];
    let mut last_sequence = 0;

    while !shutdown::requested() {
        std::thread::sleep(config.refresh);

        if slot.take_block_size_change() {
            warn!("audio block size changed mid-session; display cadence is no longer calibrated");
        }

        let Some(sequence) = slot.snapshot(&mut levels) else {
            continue;
        };
        if sequence == last_sequence {
            continue;
        }
        last_sequence = sequence;

        let size = canvas.query_size();
        canvas.draw_frame(&levels, size, &renderer)?;
    }

    debug!("shutdown requested, leaving render loop");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_start_leaves_terminal_untouched() {
        let mut out = Vec::new();
        let result = start_then_hide(|| Err(MeterError::NoInputDevice), &mut out);
        assert!(matches!(result, Err(MeterError::NoInputDevice)));
        drop(result);
        assert!(out.is_empty());
    }

    #[test]
    fn started_stream_hides_cursor() {
        let mut out = Vec::new();
        let canvas = start_then_hide(|| Ok(()), &mut out).unwrap();
        drop(canvas);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\x1b[?25l"));
    }
}
