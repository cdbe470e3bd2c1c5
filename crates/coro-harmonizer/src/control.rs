//! Lock-free control path between host threads and the render thread.
//!
//! Control threads hold a [`ControlHandle`]. Writes travel through a bounded
//! `crossbeam-channel` queue that the kernel drains at the top of every render
//! call, in arrival order. Each accepted parameter write is also stored in an
//! atomic [`ParamMirror`] so `get` never has to reach the kernel.
//!
//! A full queue rejects the message instead of blocking; the handle counts
//! rejections.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use tracing::warn;

use crate::midi::MidiMessage;
use crate::params::{HarmonizerParam, PARAM_COUNT};
use crate::tuning::CONTROL_QUEUE_LEN;

/// A message for the render thread.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlMessage {
    /// Parameter write (already clamped)
    SetParam {
        /// Parameter address
        address: u32,
        /// New value
        value: f32,
    },
    /// Raw three-byte MIDI message
    Midi([u8; 3]),
}

/// Latest value of every parameter, readable from any thread.
///
/// Values are `f32` stored as bits in `AtomicU32`.
#[derive(Debug)]
pub struct ParamMirror {
    values: Vec<AtomicU32>,
}

impl Default for ParamMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl ParamMirror {
    /// Mirror holding every parameter's default.
    pub fn new() -> Self {
        let values = (0..PARAM_COUNT as u32)
            .map(|address| {
                let default = HarmonizerParam::from_address(address)
                    .map_or(0.0, |param| param.descriptor().default);
                AtomicU32::new(default.to_bits())
            })
            .collect();
        Self { values }
    }

    /// Stored value, `0.0` for unknown addresses.
    #[inline]
    pub fn load(&self, address: u32) -> f32 {
        self.values
            .get(address as usize)
            .map_or(0.0, |v| f32::from_bits(v.load(Ordering::Acquire)))
    }

    /// Stores a value; unknown addresses are ignored.
    #[inline]
    pub fn store(&self, address: u32, value: f32) {
        if let Some(slot) = self.values.get(address as usize) {
            slot.store(value.to_bits(), Ordering::Release);
        }
    }
}

/// Cloneable sender for parameter writes and MIDI.
#[derive(Debug, Clone)]
pub struct ControlHandle {
    tx: Sender<ControlMessage>,
    mirror: Arc<ParamMirror>,
    rejected: Arc<AtomicU64>,
}

impl ControlHandle {
    /// Queues a parameter write. Returns `false` if the queue was full.
    ///
    /// Values are clamped before they are queued; unknown addresses are
    /// dropped and reported as accepted.
    pub fn set_param(&self, address: u32, value: f32) -> bool {
        let Some(param) = HarmonizerParam::from_address(address) else {
            return true;
        };
        let value = param.descriptor().clamp(value);
        if !self.send(ControlMessage::SetParam { address, value }) {
            return false;
        }
        self.mirror.store(address, value);
        true
    }

    /// Queues a MIDI message. Returns `false` if the queue was full.
    pub fn send_midi(&self, message: MidiMessage) -> bool {
        self.send(ControlMessage::Midi(message.to_bytes()))
    }

    /// Last accepted value of a parameter.
    ///
    /// For harmony gain this is the target; the kernel slews toward it, so
    /// `HarmonizerKernel::get` may report a value still in transit.
    pub fn get_param(&self, address: u32) -> f32 {
        self.mirror.load(address)
    }

    /// Messages refused because the queue was full.
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    fn send(&self, message: ControlMessage) -> bool {
        match self.tx.try_send(message) {
            Ok(()) => true,
            Err(TrySendError::Full(message)) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(?message, "control queue full, message dropped");
                false
            }
            Err(TrySendError::Disconnected(message)) => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                warn!(?message, "kernel dropped, message discarded");
                false
            }
        }
    }
}

/// Render-side end of the control queue.
#[derive(Debug)]
pub(crate) struct ControlQueue {
    rx: Receiver<ControlMessage>,
    handle: ControlHandle,
}

impl ControlQueue {
    pub(crate) fn new(mirror: Arc<ParamMirror>) -> Self {
        let (tx, rx) = bounded(CONTROL_QUEUE_LEN);
        Self {
            rx,
            handle: ControlHandle {
                tx,
                mirror,
                rejected: Arc::new(AtomicU64::new(0)),
            },
        }
    }

    pub(crate) fn handle(&self) -> ControlHandle {
        self.handle.clone()
    }

    /// Next pending message, without blocking.
    #[inline]
    pub(crate) fn try_recv(&self) -> Option<ControlMessage> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mirror_defaults() {
        let mirror = ParamMirror::new();
        assert_eq!(mirror.load(1), 2.0);
        assert_eq!(mirror.load(5), -1.0);
        assert_eq!(mirror.load(12), 4.0);
        assert_eq!(mirror.load(9999), 0.0);
    }

    #[test]
    fn test_handle_clamps_and_mirrors() {
        let queue = ControlQueue::new(Arc::new(ParamMirror::new()));
        let handle = queue.handle();
        assert!(handle.set_param(2, 9.0));
        assert_eq!(handle.get_param(2), 4.0);
        assert_eq!(
            queue.try_recv(),
            Some(ControlMessage::SetParam {
                address: 2,
                value: 4.0
            })
        );
        assert_eq!(queue.try_recv(), None);
    }

    #[test]
    fn test_full_queue_rejects() {
        let queue = ControlQueue::new(Arc::new(ParamMirror::new()));
        let handle = queue.handle();
        for _ in 0..CONTROL_QUEUE_LEN {
            assert!(handle.send_midi(MidiMessage::NoteOff { note: 1 }));
        }
        assert!(!handle.set_param(8, 0.5));
        assert_eq!(handle.rejected(), 1);
        // A rejected write never reaches the mirror
        assert_eq!(handle.get_param(8), 1.0);
    }

    #[test]
    fn test_order_preserved() {
        let queue = ControlQueue::new(Arc::new(ParamMirror::new()));
        let handle = queue.handle();
        handle.send_midi(MidiMessage::NoteOn {
            note: 60,
            velocity: 9,
        });
        handle.set_param(0, 3.0);
        assert!(matches!(queue.try_recv(), Some(ControlMessage::Midi(_))));
        assert!(matches!(
            queue.try_recv(),
            Some(ControlMessage::SetParam { address: 0, .. })
        ));
    }
}
