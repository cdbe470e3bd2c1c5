//! Offline block host for [`HarmonizerKernel`].
//!
//! [`HarmonizerEngine`] plays the role of an audio host: it feeds mono input
//! through the kernel in fixed-size blocks and collects the stereo output.
//! Parameter changes and MIDI can be scheduled at absolute sample positions;
//! a block is split at each event so the change lands on the exact sample.
//!
//! Input may arrive in pieces. Successive [`process`](HarmonizerEngine::process)
//! calls continue the same stream, and event positions count from the first
//! sample ever processed.

use coro_core::ParameterInfo;
use coro_harmonizer::{HarmonizerKernel, KernelStats, MidiMessage};
use tracing::{debug, info};

use crate::{Result, StereoSamples};

/// Something to apply to the kernel between samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EngineEvent {
    /// Set the parameter at `address` (clamped by the kernel).
    Param {
        /// Parameter address
        address: u32,
        /// New value
        value: f32,
    },
    /// Deliver a MIDI message.
    Midi(MidiMessage),
}

/// An [`EngineEvent`] at an absolute sample position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedEvent {
    /// Sample index the event takes effect at
    pub at: u64,
    /// What happens
    pub event: EngineEvent,
}

impl TimedEvent {
    /// Parameter change at `at`.
    pub fn param(at: u64, address: u32, value: f32) -> Self {
        Self {
            at,
            event: EngineEvent::Param { address, value },
        }
    }

    /// MIDI message at `at`.
    pub fn midi(at: u64, message: MidiMessage) -> Self {
        Self {
            at,
            event: EngineEvent::Midi(message),
        }
    }
}

/// Streams audio through a stereo kernel in host-sized blocks.
///
/// # Example
///
/// ```rust
/// use coro_harmonizer::MidiMessage;
/// use coro_io::{HarmonizerEngine, TimedEvent};
///
/// let mut engine = HarmonizerEngine::new(48000.0, 256).unwrap();
/// engine.schedule(TimedEvent::midi(0, MidiMessage::NoteOn { note: 60, velocity: 100 }));
/// let out = engine.process(&vec![0.0; 1024]);
/// assert_eq!(out.len(), 1024);
/// assert_eq!(engine.position(), 1024);
/// ```
#[derive(Debug)]
pub struct HarmonizerEngine {
    kernel: HarmonizerKernel,
    /// Sorted by `at`; entries before `next_event` were applied
    events: Vec<TimedEvent>,
    next_event: usize,
    block_size: usize,
    position: u64,
}

impl HarmonizerEngine {
    /// Creates an engine around a freshly initialized stereo kernel.
    pub fn new(sample_rate: f32, block_size: usize) -> Result<Self> {
        let mut kernel = HarmonizerKernel::new();
        kernel.init(2, sample_rate)?;
        let block_size = block_size.max(1);
        info!(sample_rate, block_size, "harmonizer engine ready");
        Ok(Self {
            kernel,
            events: Vec::new(),
            next_event: 0,
            block_size,
            position: 0,
        })
    }

    /// The hosted kernel.
    pub fn kernel(&self) -> &HarmonizerKernel {
        &self.kernel
    }

    /// Mutable access to the hosted kernel.
    pub fn kernel_mut(&mut self) -> &mut HarmonizerKernel {
        &mut self.kernel
    }

    /// Frames rendered per kernel call.
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Samples processed since creation or the last [`reset`](Self::reset).
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Queues an event. Events at the same position keep insertion order;
    /// events already in the past are applied before the next sample.
    pub fn schedule(&mut self, event: TimedEvent) {
        let pending = &self.events[self.next_event..];
        let slot = self.next_event + pending.partition_point(|e| e.at <= event.at);
        self.events.insert(slot, event);
    }

    /// Queues every event of `events`.
    pub fn schedule_all<I: IntoIterator<Item = TimedEvent>>(&mut self, events: I) {
        for event in events {
            self.schedule(event);
        }
    }

    /// Events not yet applied.
    pub fn pending_events(&self) -> usize {
        self.events.len() - self.next_event
    }

    /// Kernel counters.
    pub fn stats(&self) -> KernelStats {
        self.kernel.stats()
    }

    /// Processes the next stretch of the input stream.
    pub fn process(&mut self, input: &[f32]) -> StereoSamples {
        let mut out = StereoSamples::silence(input.len());
        let mut done = 0;

        while done < input.len() {
            self.apply_due_events();

            let mut frames = self.block_size.min(input.len() - done);
            if let Some(next) = self.events.get(self.next_event) {
                let until = next.at.saturating_sub(self.position);
                frames = frames.min(usize::try_from(until).unwrap_or(usize::MAX));
            }

            let end = done + frames;
            let mut outputs: [&mut [f32]; 2] =
                [&mut out.left[done..end], &mut out.right[done..end]];
            self.kernel.render(frames, 0, &input[done..end], &mut outputs);

            done = end;
            self.position += frames as u64;
        }

        self.events.drain(..self.next_event);
        self.next_event = 0;

        debug!(
            frames = input.len(),
            position = self.position,
            pending = self.pending_events(),
            "processed input"
        );
        out
    }

    /// Resets the kernel and rewinds the stream; scheduled events are dropped.
    pub fn reset(&mut self) {
        self.kernel.reset();
        self.events.clear();
        self.next_event = 0;
        self.position = 0;
    }

    fn apply_due_events(&mut self) {
        while let Some(timed) = self.events.get(self.next_event).copied() {
            if timed.at > self.position {
                break;
            }
            match timed.event {
                EngineEvent::Param { address, value } => {
                    self.kernel.set_param(address as usize, value);
                }
                EngineEvent::Midi(message) => self.kernel.midi(message),
            }
            debug!(at = timed.at, event = ?timed.event, "applied event");
            self.next_event += 1;
        }
    }
}
