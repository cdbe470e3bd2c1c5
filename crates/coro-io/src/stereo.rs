//! Two-channel sample container.

/// Left and right channels of equal length.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StereoSamples {
    /// Left channel samples.
    pub left: Vec<f32>,
    /// Right channel samples.
    pub right: Vec<f32>,
}

impl StereoSamples {
    /// Create new stereo samples from left and right channels.
    pub fn new(left: Vec<f32>, right: Vec<f32>) -> Self {
        debug_assert_eq!(left.len(), right.len(), "Channels must have same length");
        Self { left, right }
    }

    /// Silent buffer of `len` frames.
    pub fn silence(len: usize) -> Self {
        Self::new(vec![0.0; len], vec![0.0; len])
    }

    /// Create stereo samples from mono by duplicating to both channels.
    pub fn from_mono(mono: Vec<f32>) -> Self {
        Self {
            left: mono.clone(),
            right: mono,
        }
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// True when there are no frames.
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Mix down to mono by summing channels.
    ///
    /// The harmonizer pans with gains that add up to one, so the sum restores
    /// the level of a centred voice.
    pub fn to_mono(&self) -> Vec<f32> {
        self.left
            .iter()
            .zip(&self.right)
            .map(|(l, r)| l + r)
            .collect()
    }

    /// Convert to interleaved format (L, R, L, R, ...).
    pub fn to_interleaved(&self) -> Vec<f32> {
        self.left
            .iter()
            .zip(&self.right)
            .flat_map(|(&l, &r)| [l, r])
            .collect()
    }

    /// Create from interleaved format (L, R, L, R, ...).
    ///
    /// A trailing unpaired sample is dropped.
    pub fn from_interleaved(interleaved: &[f32]) -> Self {
        let (left, right) = interleaved
            .chunks_exact(2)
            .map(|frame| (frame[0], frame[1]))
            .unzip();
        Self { left, right }
    }

    /// Appends another buffer.
    pub fn extend(&mut self, other: &StereoSamples) {
        self.left.extend_from_slice(&other.left);
        self.right.extend_from_slice(&other.right);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mono() {
        let stereo = StereoSamples::from_mono(vec![1.0, 2.0, 3.0]);
        assert_eq!(stereo.left, stereo.right);
        assert_eq!(stereo.len(), 3);
    }

    #[test]
    fn test_to_mono_sums() {
        let stereo = StereoSamples::new(vec![0.25, 1.0], vec![0.25, -1.0]);
        assert_eq!(stereo.to_mono(), vec![0.5, 0.0]);
    }

    #[test]
    fn test_interleaved() {
        let stereo = StereoSamples::new(vec![1.0, 3.0], vec![2.0, 4.0]);
        let interleaved = stereo.to_interleaved();
        assert_eq!(interleaved, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(StereoSamples::from_interleaved(&interleaved), stereo);
        assert_eq!(StereoSamples::from_interleaved(&[1.0, 2.0, 5.0]).len(), 1);
    }

    #[test]
    fn test_extend() {
        let mut a = StereoSamples::silence(2);
        a.extend(&StereoSamples::new(vec![1.0], vec![2.0]));
        assert_eq!(a.left, vec![0.0, 0.0, 1.0]);
        assert_eq!(a.right, vec![0.0, 0.0, 2.0]);
    }
}
