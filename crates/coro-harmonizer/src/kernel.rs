//! The harmonizer kernel: lifecycle, render loop and voice updates.
//!
//! One [`HarmonizerKernel`] owns every piece of state. Per input sample the
//! render loop runs, in order:
//!
//! 1. write the sample into the ring
//! 2. bypass: emit the input at half level and stop
//! 3. every `ESTIMATE_INTERVAL` samples, re-estimate the period
//! 4. advance the pitch marks when they fall behind, then update the voices
//! 5. wait until three marks exist
//! 6. lead resampler (when pitch correction is off)
//! 7. trigger due grains, then mix every active grain
//!
//! # Threading
//!
//! Rendering happens on one thread. Other threads talk to the kernel through
//! a [`ControlHandle`]; its queue is drained at the start of every render
//! call. Nothing on the render path allocates, blocks or logs.

use std::sync::Arc;

use coro_analysis::PitchEstimator;
use coro_core::{
    LinearSmoothedParam, ParamDescriptor, ParameterInfo, RingBuffer, freq_to_midi, scrub,
    semitones_to_ratio,
};
use tracing::{debug, info};

use crate::chords::{self, ChordTables, KeyCenter};
use crate::control::{ControlHandle, ControlMessage, ControlQueue, ParamMirror};
use crate::epoch::PitchMarks;
use crate::error::{KernelError, Result};
use crate::grain::{Grain, GrainPool, GrainWindow};
use crate::harmony::HarmonyAnalyzer;
use crate::lead::LeadResampler;
use crate::midi::{CC_ALL_NOTES_OFF, CC_EXPRESSION, MidiMessage};
use crate::params::{HarmonizerParam, PARAM_COUNT, Settings};
use crate::tuning::{
    ANALYSIS_LAG, BYPASS_GAIN, DEBOUNCE_DIVISOR, DEFAULT_PERIOD, ESTIMATE_INTERVAL,
    FIRST_MIDI_SLOT, GRAIN_POOL, HARMONY_GAIN_RATE, MAX_CHANNELS, RING_LEN, SHORTEN_THRESHOLD,
    VOICE_COUNT, pitch_config,
};
use crate::voice::{Voice, VoiceBank, VoiceRole};

/// Counters updated by the render path.
///
/// Hosts poll these between render calls; the kernel itself never logs
/// while rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KernelStats {
    /// Samples rendered since the last reset
    pub samples: u64,
    /// Render calls since the last reset
    pub blocks: u64,
    /// Pitch-mark advances (one voice update each)
    pub mark_advances: u64,
    /// Grain requests refused by a full pool
    pub dropped_grains: u64,
    /// Key changes found by harmony analysis
    pub key_changes: u64,
    /// Control messages drained from the queue
    pub control_messages: u64,
    /// Grains active at the end of the last block
    pub active_grains: usize,
    /// Most grains active at the end of any block
    pub peak_grains: usize,
}

/// Buffers that exist between `init` and `teardown`.
#[derive(Debug)]
struct DspState {
    ring: RingBuffer,
    estimator: PitchEstimator,
    marks: PitchMarks,
    grains: GrainPool<GRAIN_POOL>,
    window: GrainWindow,
    lead: LeadResampler,
    /// Last accepted period in samples
    period: f32,
    voiced: bool,
    estimate_countdown: u32,
}

impl DspState {
    fn new() -> Self {
        Self {
            ring: RingBuffer::new(RING_LEN),
            estimator: PitchEstimator::new(pitch_config()),
            marks: PitchMarks::new(),
            grains: GrainPool::new(),
            window: GrainWindow::default(),
            lead: LeadResampler::new(),
            period: DEFAULT_PERIOD,
            voiced: false,
            estimate_countdown: ESTIMATE_INTERVAL,
        }
    }

    fn reset(&mut self) {
        self.ring.clear();
        self.estimator.reset();
        self.marks.reset();
        self.grains.clear();
        self.lead.reset();
        self.period = DEFAULT_PERIOD;
        self.voiced = false;
        self.estimate_countdown = ESTIMATE_INTERVAL;
    }
}

/// Real-time PSOLA harmonizer.
///
/// # Example
///
/// ```rust
/// use coro_harmonizer::{HarmonizerKernel, HarmonizerParam};
///
/// let mut kernel = HarmonizerKernel::new();
/// kernel.init(2, 44100.0).unwrap();
/// kernel.set(HarmonizerParam::AutoVoices, 3.0);
///
/// let input: Vec<f32> = (0..512)
///     .map(|n| (std::f32::consts::TAU * 220.0 * n as f32 / 44100.0).sin())
///     .collect();
/// let mut left = vec![0.0; 512];
/// let mut right = vec![0.0; 512];
/// kernel.render(512, 0, &input, &mut [&mut left, &mut right]);
/// assert!(left.iter().chain(&right).all(|s| s.is_finite()));
/// ```
#[derive(Debug)]
pub struct HarmonizerKernel {
    settings: Settings,
    chords: ChordTables,
    harmony: HarmonyAnalyzer,
    voices: VoiceBank<VOICE_COUNT>,
    harmony_gain: LinearSmoothedParam,
    /// MIDI voice level from CC 11
    expression: f32,
    /// Detected pitch class, fractional
    current_note: Option<f32>,
    sample_count: u64,
    stats: KernelStats,
    dsp: Option<Box<DspState>>,
    control: ControlQueue,
    mirror: Arc<ParamMirror>,
    sample_rate: f32,
    channel_count: usize,
}

impl Default for HarmonizerKernel {
    fn default() -> Self {
        Self::new()
    }
}

impl HarmonizerKernel {
    /// Creates an uninitialized kernel with default parameters.
    ///
    /// Rendering writes silence until [`init`](Self::init) succeeds.
    pub fn new() -> Self {
        let settings = Settings::default();
        let mirror = Arc::new(ParamMirror::new());
        Self {
            harmony_gain: LinearSmoothedParam::with_rate(settings.harmony_gain, HARMONY_GAIN_RATE),
            settings,
            chords: ChordTables::default(),
            harmony: HarmonyAnalyzer::new(0),
            voices: VoiceBank::new(FIRST_MIDI_SLOT),
            expression: 1.0,
            current_note: None,
            sample_count: 0,
            stats: KernelStats::default(),
            dsp: None,
            control: ControlQueue::new(Arc::clone(&mirror)),
            mirror,
            sample_rate: 44100.0,
            channel_count: MAX_CHANNELS,
        }
    }

    /// Allocates the working buffers and resets all transient state.
    ///
    /// # Errors
    ///
    /// Fails for a channel count outside `1..=2` or a sample rate that is
    /// not finite and positive. A failed call leaves the kernel unchanged.
    pub fn init(&mut self, channel_count: usize, sample_rate: f32) -> Result<()> {
        if !(1..=MAX_CHANNELS).contains(&channel_count) {
            return Err(KernelError::InvalidChannelCount(channel_count));
        }
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(KernelError::InvalidSampleRate(sample_rate));
        }

        self.channel_count = channel_count;
        self.sample_rate = sample_rate;
        self.harmony.set_debounce((sample_rate / DEBOUNCE_DIVISOR) as u64);
        if self.dsp.is_none() {
            self.dsp = Some(Box::new(DspState::new()));
        }
        self.reset();

        info!(
            channels = channel_count,
            sample_rate,
            debounce = self.harmony.debounce(),
            "harmonizer initialized"
        );
        Ok(())
    }

    /// Clears marks, grains, voices, pitch history and the ring.
    ///
    /// Parameters, chord tables, key center and expression are kept.
    pub fn reset(&mut self) {
        if let Some(dsp) = self.dsp.as_mut() {
            dsp.reset();
        }
        self.voices.reset();
        self.harmony.clear_pending();
        self.harmony_gain.snap_to_target();
        self.current_note = None;
        self.sample_count = 0;
        self.stats = KernelStats::default();
        debug!("harmonizer reset");
    }

    /// Releases the working buffers. Rendering writes silence afterwards.
    pub fn teardown(&mut self) {
        if self.dsp.take().is_some() {
            info!("harmonizer torn down");
        }
    }

    /// True between a successful `init` and `teardown`.
    pub fn is_initialized(&self) -> bool {
        self.dsp.is_some()
    }

    /// Renders `frame_count` samples of `input` starting at `buffer_offset`.
    ///
    /// With one output channel, or a mono `init`, every output receives
    /// left plus right. In stereo, output 0 is left and output 1 is right;
    /// any further outputs are zeroed. The frame count is clamped to what
    /// every buffer can hold past the offset.
    pub fn render(
        &mut self,
        frame_count: usize,
        buffer_offset: usize,
        input: &[f32],
        outputs: &mut [&mut [f32]],
    ) {
        self.drain_control();
        let frames = frames_available(frame_count, buffer_offset, input.len(), outputs);

        let Some(mut dsp) = self.dsp.take() else {
            write_silence(outputs, buffer_offset, frames);
            return;
        };

        let stereo = self.is_stereo(outputs);
        for index in buffer_offset..buffer_offset + frames {
            let (left, right) = self.tick(&mut dsp, input[index]);
            route(outputs, index, left, right, stereo);
        }

        self.finish_block(&dsp, frames);
        self.dsp = Some(dsp);
    }

    /// Renders in place: the input is read from output channel 0.
    pub fn render_in_place(
        &mut self,
        frame_count: usize,
        buffer_offset: usize,
        buffers: &mut [&mut [f32]],
    ) {
        self.drain_control();
        let input_len = buffers.first().map_or(0, |b| b.len());
        let frames = frames_available(frame_count, buffer_offset, input_len, buffers);

        let Some(mut dsp) = self.dsp.take() else {
            write_silence(buffers, buffer_offset, frames);
            return;
        };

        let stereo = self.is_stereo(buffers);
        for index in buffer_offset..buffer_offset + frames {
            let (left, right) = self.tick(&mut dsp, buffers[0][index]);
            route(buffers, index, left, right, stereo);
        }

        self.finish_block(&dsp, frames);
        self.dsp = Some(dsp);
    }

    /// Sets a parameter, clamped to its range.
    pub fn set(&mut self, param: HarmonizerParam, value: f32) {
        let value = param.descriptor().clamp(value);
        let on = value >= 0.5;
        match param {
            HarmonizerParam::KeyCenter => self.harmony.set_key(KeyCenter::from_index(value as u8)),
            HarmonizerParam::Inversion => self.settings.inversion = value as u8,
            HarmonizerParam::AutoVoices => self.settings.auto_voices = value as u8,
            HarmonizerParam::AutoHarmony => self.settings.auto_harmony = on,
            HarmonizerParam::MidiVoices => self.settings.midi_voices = on,
            HarmonizerParam::Triad => self.settings.triad = (value >= 0.0).then_some(value as u8),
            HarmonizerParam::Bypass => self.settings.bypass = on,
            HarmonizerParam::PitchCorrect => self.settings.pitch_correct = on,
            HarmonizerParam::HarmonyGain => {
                self.settings.harmony_gain = value;
                self.harmony_gain.set_target(value);
            }
            HarmonizerParam::VoiceGain => self.settings.voice_gain = value,
            HarmonizerParam::Speed => self.settings.speed = value,
            HarmonizerParam::ChordEntry {
                quality,
                degree,
                voice,
            } => self.chords.set_semitones(
                quality,
                usize::from(degree),
                usize::from(voice),
                value as i32,
            ),
        }
        self.mirror.store(param.address(), value);
    }

    /// Current value of a parameter.
    ///
    /// Harmony gain reports the slewed value, not the target. The target is
    /// what [`ControlHandle::get_param`] and [`Settings::harmony_gain`] hold.
    pub fn get(&self, param: HarmonizerParam) -> f32 {
        let flag = |on: bool| if on { 1.0 } else { 0.0 };
        match param {
            HarmonizerParam::KeyCenter => f32::from(self.harmony.key().index()),
            HarmonizerParam::Inversion => f32::from(self.settings.inversion),
            HarmonizerParam::AutoVoices => f32::from(self.settings.auto_voices),
            HarmonizerParam::AutoHarmony => flag(self.settings.auto_harmony),
            HarmonizerParam::MidiVoices => flag(self.settings.midi_voices),
            HarmonizerParam::Triad => self.settings.triad.map_or(-1.0, f32::from),
            HarmonizerParam::Bypass => flag(self.settings.bypass),
            HarmonizerParam::PitchCorrect => flag(self.settings.pitch_correct),
            HarmonizerParam::HarmonyGain => self.harmony_gain.get(),
            HarmonizerParam::VoiceGain => self.settings.voice_gain,
            HarmonizerParam::Speed => self.settings.speed,
            HarmonizerParam::ChordEntry {
                quality,
                degree,
                voice,
            } => self
                .chords
                .semitones(quality, usize::from(degree), usize::from(voice))
                as f32,
        }
    }

    /// Applies one MIDI message immediately.
    ///
    /// Out-of-range messages are ignored and a note-on with velocity zero
    /// releases the note, as for raw bytes.
    pub fn midi(&mut self, message: MidiMessage) {
        let Some(message) = message.checked() else {
            return;
        };
        let now = self.sample_count;
        match message {
            MidiMessage::NoteOn { note, velocity } => {
                self.voices.note_on(note, velocity, now);
                self.harmony.notes_changed(now);
            }
            MidiMessage::NoteOff { note } => {
                self.voices.note_off(note);
                self.harmony.notes_changed(now);
            }
            MidiMessage::ControlChange {
                controller: CC_EXPRESSION,
                value,
            } => self.expression = f32::from(value) / 127.0,
            MidiMessage::ControlChange {
                controller: CC_ALL_NOTES_OFF,
                ..
            } => {
                self.voices.all_notes_off();
                self.harmony.notes_changed(now);
            }
            MidiMessage::ControlChange { .. } => {}
        }
    }

    /// Parses and applies raw MIDI bytes; malformed messages are ignored.
    pub fn midi_bytes(&mut self, bytes: &[u8]) {
        if let Some(message) = MidiMessage::parse(bytes) {
            self.midi(message);
        }
    }

    /// A handle for other threads.
    pub fn control_handle(&self) -> ControlHandle {
        self.control.handle()
    }

    /// Detected pitch class (0 = C) with its fractional detune, `None` while
    /// unvoiced.
    pub fn current_note(&self) -> Option<f32> {
        self.current_note
    }

    /// Current key center.
    pub fn key_center(&self) -> KeyCenter {
        self.harmony.key()
    }

    /// Notes held by MIDI voices, in slot order.
    pub fn held_notes(&self) -> impl Iterator<Item = u8> + '_ {
        self.voices.held_notes()
    }

    /// All voice slots.
    pub fn voices(&self) -> &[Voice; VOICE_COUNT] {
        self.voices.voices()
    }

    /// Pitch-mark history, if initialized.
    pub fn marks(&self) -> Option<&PitchMarks> {
        self.dsp.as_ref().map(|dsp| &dsp.marks)
    }

    /// Period in samples used for synthesis.
    pub fn period(&self) -> f32 {
        self.dsp.as_ref().map_or(DEFAULT_PERIOD, |dsp| dsp.period)
    }

    /// True when the last pitch estimate was voiced.
    pub fn is_voiced(&self) -> bool {
        self.dsp.as_ref().is_some_and(|dsp| dsp.voiced)
    }

    /// Active grains.
    pub fn active_grains(&self) -> usize {
        self.dsp.as_ref().map_or(0, |dsp| dsp.grains.active_count())
    }

    /// Render counters.
    pub fn stats(&self) -> KernelStats {
        self.stats
    }

    /// Plain parameter values.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Chord tables.
    pub fn chords(&self) -> &ChordTables {
        &self.chords
    }

    /// Sample rate passed to `init`.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Channel count passed to `init`.
    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    fn drain_control(&mut self) {
        while let Some(message) = self.control.try_recv() {
            self.stats.control_messages += 1;
            match message {
                ControlMessage::SetParam { address, value } => {
                    if let Some(param) = HarmonizerParam::from_address(address) {
                        self.set(param, value);
                    }
                }
                ControlMessage::Midi(bytes) => self.midi_bytes(&bytes),
            }
        }
    }

    fn is_stereo(&self, outputs: &[&mut [f32]]) -> bool {
        self.channel_count >= 2 && outputs.len() >= 2
    }

    fn finish_block(&mut self, dsp: &DspState, frames: usize) {
        let active = dsp.grains.active_count();
        self.stats.samples += frames as u64;
        self.stats.blocks += 1;
        self.stats.active_grains = active;
        self.stats.peak_grains = self.stats.peak_grains.max(active);
    }

    /// One input sample in, one `(left, right)` pair out.
    #[inline]
    fn tick(&mut self, dsp: &mut DspState, input: f32) -> (f32, f32) {
        let input = scrub(input);
        dsp.ring.write(input);
        let cursor = dsp.ring.write_pos();
        self.sample_count += 1;

        if self.settings.bypass {
            let out = input * BYPASS_GAIN;
            return (out, out);
        }

        dsp.estimate_countdown -= 1;
        if dsp.estimate_countdown == 0 {
            dsp.estimate_countdown = ESTIMATE_INTERVAL;
            let start = cursor.wrapping_sub(ANALYSIS_LAG) & dsp.ring.mask();
            let estimate = dsp.estimator.estimate_ring(&dsp.ring, start);
            if estimate.period > 0.0 {
                dsp.period = estimate.period;
            }
            dsp.voiced = estimate.voiced;
        }

        if dsp.marks.due(&dsp.ring, cursor, dsp.period) {
            dsp.marks.advance(&dsp.ring, dsp.period, dsp.voiced);
            self.stats.mark_advances += 1;
            self.update_voices(dsp.period, dsp.voiced);
        }

        if !dsp.marks.is_primed() {
            return (0.0, 0.0);
        }

        let (mut left, mut right) = (0.0, 0.0);
        if !self.settings.pitch_correct {
            let ratio = self.voices.voices()[0].ratio();
            let lead = dsp.lead.next(&dsp.ring, cursor, dsp.period, ratio);
            let out = lead * self.settings.voice_gain * 0.5;
            left += out;
            right += out;
        }

        let harmony_gain = self.harmony_gain.advance();
        self.schedule_grains(dsp);
        let (grain_left, grain_right) = dsp.grains.render(&dsp.ring, &dsp.window, harmony_gain);

        (scrub(left + grain_left), scrub(right + grain_right))
    }

    /// Counts down every sounding voice and triggers its due grain.
    fn schedule_grains(&mut self, dsp: &mut DspState) {
        let first = usize::from(!self.settings.pitch_correct);
        let period = dsp.period;
        let mark = dsp.marks.latest();

        for index in first..VOICE_COUNT {
            let role = self.voices.role(index);
            let voice = self.voices.voice_mut(index);
            if voice.is_free() || (role == VoiceRole::Midi && !self.settings.midi_voices) {
                continue;
            }
            if !dsp.voiced && role != VoiceRole::Lead {
                continue;
            }
            if !voice.tick() {
                continue;
            }

            let ratio = voice.ratio();
            let velocity = f32::from(voice.velocity()) / 127.0;
            let mut gain = match role {
                VoiceRole::Lead => self.settings.voice_gain,
                VoiceRole::Harmony => velocity,
                VoiceRole::Midi => self.expression * velocity,
            };
            let mut playback = voice.formant_ratio();

            if dsp.voiced {
                if ratio < 1.0 {
                    gain *= (1.0 / ratio).sqrt();
                }
                if ratio > SHORTEN_THRESHOLD {
                    playback *= 1.0 + (ratio - SHORTEN_THRESHOLD) / 2.0;
                }
            } else {
                playback = ratio;
            }

            let grain = Grain {
                size: 2.0 * period,
                start: dsp.ring.wrap_pos(mark - voice.next_grain() - period),
                pos: 0.0,
                ratio: playback,
                gain,
                pan: voice.pan(),
                voice: index,
            };

            if dsp.grains.trigger(grain) {
                voice.rearm(period / ratio);
            } else {
                self.stats.dropped_grains += 1;
            }
        }
    }

    /// One harmony/voice update, run on every pitch-mark advance.
    fn update_voices(&mut self, period: f32, voiced: bool) {
        self.voices.begin_update();

        if let Some(key) = self.harmony.poll(self.sample_count, self.voices.held_notes()) {
            self.stats.key_changes += 1;
            self.mirror
                .store(HarmonizerParam::KeyCenter.address(), f32::from(key.index()));
        }

        if !voiced || period <= 0.0 {
            self.current_note = None;
            return;
        }

        // Semitones above A4, fractional
        let note = freq_to_midi(self.sample_rate / period) - 69.0;
        let nearest = note.round();
        let error_ratio = semitones_to_ratio(note - nearest);

        let key = self.harmony.key();
        let midi_note = nearest as i32 + 69;
        let interval = (midi_note - i32::from(key.root)).rem_euclid(12) as usize;
        self.current_note = Some(midi_note.rem_euclid(12) as f32 + (note - nearest));

        let start = usize::from(!self.settings.pitch_correct);
        let auto_voices = usize::from(self.settings.auto_voices).min(self.voices.first_midi());

        if let Some(triad) = self.settings.triad.and_then(|i| chords::triad(usize::from(i))) {
            for index in 0..=2 {
                self.voices.voice_mut(index).claim();
            }
            self.voices.voice_mut(1).snap_ratio(triad.upper);
            self.voices.voice_mut(2).snap_ratio(triad.lower);
        } else if self.settings.auto_harmony {
            let voicing =
                self.chords
                    .voicing(key.quality, interval, usize::from(self.settings.inversion));
            for (index, &ratio) in voicing.iter().enumerate().take(auto_voices).skip(start) {
                let voice = self.voices.voice_mut(index);
                voice.claim();
                voice.set_target_ratio(ratio);
            }
        } else {
            for index in 0..auto_voices {
                self.voices.voice_mut(index).snap_ratio(1.0);
            }
        }

        for index in self.voices.first_midi()..VOICE_COUNT {
            let voice = self.voices.voice_mut(index);
            if let Some(held) = voice.note() {
                voice.set_target_ratio(semitones_to_ratio(f32::from(held) - 69.0 - note));
            }
        }

        // Automatic voices lock to the sung pitch rather than the grid
        for index in start..auto_voices {
            let voice = self.voices.voice_mut(index);
            voice.set_target_ratio(voice.target_ratio() / error_ratio);
        }

        for index in 0..VOICE_COUNT {
            self.voices.voice_mut(index).advance_ratio();
        }
    }
}

impl ParameterInfo for HarmonizerKernel {
    fn param_count(&self) -> usize {
        PARAM_COUNT
    }

    fn param_info(&self, index: usize) -> Option<ParamDescriptor> {
        let address = u32::try_from(index).ok()?;
        HarmonizerParam::from_address(address).map(HarmonizerParam::descriptor)
    }

    fn get_param(&self, index: usize) -> f32 {
        u32::try_from(index)
            .ok()
            .and_then(HarmonizerParam::from_address)
            .map_or(0.0, |param| self.get(param))
    }

    fn set_param(&mut self, index: usize, value: f32) {
        if let Some(param) = u32::try_from(index).ok().and_then(HarmonizerParam::from_address) {
            self.set(param, value);
        }
    }
}

/// Frames every buffer can hold past `offset`, capped at `requested`.
fn frames_available(
    requested: usize,
    offset: usize,
    input_len: usize,
    outputs: &[&mut [f32]],
) -> usize {
    let shortest = outputs
        .iter()
        .map(|out| out.len())
        .fold(input_len, usize::min);
    requested.min(shortest.saturating_sub(offset))
}

fn write_silence(outputs: &mut [&mut [f32]], offset: usize, frames: usize) {
    if frames == 0 {
        return;
    }
    for out in outputs.iter_mut() {
        out[offset..offset + frames].fill(0.0);
    }
}

#[inline]
fn route(outputs: &mut [&mut [f32]], index: usize, left: f32, right: f32, stereo: bool) {
    for (channel, out) in outputs.iter_mut().enumerate() {
        out[index] = match (stereo, channel) {
            (false, _) => left + right,
            (true, 0) => left,
            (true, 1) => right,
            (true, _) => 0.0,
        };
    }
}
