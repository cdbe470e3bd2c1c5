//! Level measurement for rendered audio

/// Linear floor below which a level reports as silence.
const SILENCE: f32 = 1e-10;

/// Level reported in dB for silence.
pub const SILENCE_DB: f32 = -200.0;

/// RMS level of a signal, in linear scale.
pub fn rms(signal: &[f32]) -> f32 {
    if signal.is_empty() {
        return 0.0;
    }

    let sum_sq: f32 = signal.iter().map(|&x| x * x).sum();
    (sum_sq / signal.len() as f32).sqrt()
}

/// RMS level in dB.
pub fn rms_db(signal: &[f32]) -> f32 {
    to_db(rms(signal))
}

/// Largest absolute sample value.
pub fn peak(signal: &[f32]) -> f32 {
    signal.iter().fold(0.0f32, |acc, x| acc.max(x.abs()))
}

/// Peak level in dB.
pub fn peak_db(signal: &[f32]) -> f32 {
    to_db(peak(signal))
}

/// Number of samples that are NaN or infinite.
pub fn non_finite_count(signal: &[f32]) -> usize {
    signal.iter().filter(|x| !x.is_finite()).count()
}

fn to_db(level: f32) -> f32 {
    if level > SILENCE {
        20.0 * level.log10()
    } else {
        SILENCE_DB
    }
}
