//! 16-bit stereo output frames for the offline mix.

use crate::mixer::SAMPLE_SCALE;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Frame {
    pub left: i16,
    pub right: i16,
}

impl Frame {
    pub const fn silence() -> Self {
        Self { left: 0, right: 0 }
    }

    pub const fn mono(value: i16) -> Self {
        Self { left: value, right: value }
    }

    /// Centre an 8-bit note sample in the 16-bit mix.
    pub const fn from_note_sample(sample: i8) -> Self {
        Self::mono(sample as i16 * SAMPLE_SCALE)
    }

    /// Add `other`, saturating at the 16-bit limits.
    pub fn mix(&mut self, other: Frame) {
        self.left = self.left.saturating_add(other.left);
        self.right = self.right.saturating_add(other.right);
    }

    pub fn is_silent(&self) -> bool {
        *self == Self::silence()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_samples_scale_to_full_range() {
        assert_eq!(Frame::from_note_sample(127), Frame::mono(16_256));
        assert_eq!(Frame::from_note_sample(-128), Frame::mono(-16_384));
        assert!(Frame::from_note_sample(0).is_silent());
    }

    #[test]
    fn mix_saturates() {
        let mut frame = Frame::mono(30_000);
        frame.mix(Frame::mono(10_000));
        assert_eq!(frame, Frame::mono(i16::MAX));

        let mut frame = Frame::mono(-30_000);
        frame.mix(Frame { left: -10_000, right: 5_000 });
        assert_eq!(frame, Frame { left: i16::MIN, right: -25_000 });
    }
}
