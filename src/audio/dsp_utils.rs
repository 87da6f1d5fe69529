// DSP utilities - output hygiene and parameter smoothing
//
// Small helpers used by the realtime callback and the offline renderer.

/// Flush denormals to zero
///
/// Values this close to 0 can stall the FPU on some processors; they are far
/// below the 32-bit noise floor anyway.
///
/// Threshold: 1e-15
#[inline]
pub fn flush_denormals_to_zero(x: f32) -> f32 {
    if x.abs() < 1e-15 { 0.0 } else { x }
}

/// Soft clipping with tanh
///
/// Keeps the output inside [-1, 1] without hard edges. Near zero it is close
/// to linear.
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    x.tanh()
}

/// Largest absolute sample
pub fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |acc, s| acc.max(s.abs()))
}

/// One-pole smoother
///
/// `y[n] = y[n-1] + α (x[n] - y[n-1])`, used for master gain changes so they
/// do not click.
pub struct OnePoleSmoother {
    current: f32,
    coefficient: f32,
}

impl OnePoleSmoother {
    /// `time_constant_ms` is the time to cover ~63% of a step
    ///
    /// # Example
    /// ```
    /// use groovebox::audio::dsp_utils::OnePoleSmoother;
    /// // 10ms smoothing at 44.1kHz
    /// let smoother = OnePoleSmoother::new(0.8, 10.0, 44100.0);
    /// assert_eq!(smoother.get(), 0.8);
    /// ```
    pub fn new(initial_value: f32, time_constant_ms: f32, sample_rate: f32) -> Self {
        let time_constant_samples = (time_constant_ms * 0.001 * sample_rate).max(1.0);
        Self {
            current: initial_value,
            coefficient: (1.0 / time_constant_samples).min(1.0),
        }
    }

    #[inline]
    pub fn process(&mut self, target: f32) -> f32 {
        self.current += self.coefficient * (target - self.current);
        self.current = flush_denormals_to_zero(self.current);
        self.current
    }

    /// Jump to `value` without smoothing
    #[inline]
    pub fn reset(&mut self, value: f32) {
        self.current = value;
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_denormals() {
        assert_eq!(flush_denormals_to_zero(1e-20), 0.0);
        assert_eq!(flush_denormals_to_zero(0.1), 0.1);
        assert_eq!(flush_denormals_to_zero(-0.1), -0.1);
    }

    #[test]
    fn test_soft_clip() {
        assert!(soft_clip(0.0).abs() < 0.001);
        assert!((soft_clip(0.5) - 0.462).abs() < 0.01);
        assert!(soft_clip(10.0) <= 1.0 && soft_clip(10.0) > 0.99);
        assert!(soft_clip(-10.0) >= -1.0 && soft_clip(-10.0) < -0.99);
    }

    #[test]
    fn test_peak() {
        assert_eq!(peak(&[]), 0.0);
        assert_eq!(peak(&[0.1, -0.8, 0.5]), 0.8);
    }

    #[test]
    fn test_smoother_convergence() {
        let mut smoother = OnePoleSmoother::new(0.0, 10.0, 44100.0);
        let mut value = 0.0;
        for _ in 0..4410 {
            value = smoother.process(1.0);
        }
        assert!((value - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_smoother_no_overshoot() {
        let mut smoother = OnePoleSmoother::new(0.0, 5.0, 44100.0);
        for _ in 0..100 {
            let value = smoother.process(1.0);
            assert!((0.0..=1.0).contains(&value));
        }
        smoother.reset(0.25);
        assert_eq!(smoother.get(), 0.25);
    }
}
