// Parameter automation
//
// Breakpoint curves in voice-local seconds: set-value, linear ramp and
// exponential ramp events, evaluated per sample by the voices.

#[derive(Debug, Clone, Copy, PartialEq)]
enum Segment {
    Set,
    Linear,
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Event {
    time: f32,
    value: f32,
    kind: Segment,
}

/// Automated parameter value over time
///
/// Ramps run from the previous event (or from time 0 at the initial value)
/// to their own time. Exponential ramps fall back to holding the previous
/// value when the end points are zero or differ in sign.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamCurve {
    initial: f32,
    events: Vec<Event>,
}

impl ParamCurve {
    pub fn constant(value: f32) -> Self {
        Self {
            initial: value,
            events: Vec::new(),
        }
    }

    fn push(mut self, time: f32, value: f32, kind: Segment) -> Self {
        let time = time.max(0.0);
        // Keep events sorted; equal times keep insertion order
        let index = self.events.partition_point(|e| e.time <= time);
        self.events.insert(index, Event { time, value, kind });
        self
    }

    /// Jump to `value` at `time`
    pub fn set(self, time: f32, value: f32) -> Self {
        self.push(time, value, Segment::Set)
    }

    /// Ramp linearly to `value`, arriving at `time`
    pub fn linear(self, time: f32, value: f32) -> Self {
        self.push(time, value, Segment::Linear)
    }

    /// Ramp exponentially to `value`, arriving at `time`
    pub fn exponential(self, time: f32, value: f32) -> Self {
        self.push(time, value, Segment::Exponential)
    }

    /// Multiply every value of the curve
    pub fn scaled(mut self, factor: f32) -> Self {
        self.initial *= factor;
        for event in &mut self.events {
            event.value *= factor;
        }
        self
    }

    /// Time of the last event
    pub fn end_time(&self) -> f32 {
        self.events.last().map(|e| e.time).unwrap_or(0.0)
    }

    /// Value at voice-local time `t`
    pub fn value_at(&self, t: f32) -> f32 {
        let next_index = self.events.partition_point(|e| e.time <= t);
        let (prev_time, prev_value) = match next_index.checked_sub(1) {
            Some(i) => (self.events[i].time, self.events[i].value),
            None => (0.0, self.initial),
        };

        let Some(next) = self.events.get(next_index) else {
            return prev_value;
        };

        let span = next.time - prev_time;
        if span <= 0.0 {
            return prev_value;
        }
        let progress = ((t - prev_time) / span).clamp(0.0, 1.0);

        match next.kind {
            Segment::Set => prev_value,
            Segment::Linear => prev_value + (next.value - prev_value) * progress,
            Segment::Exponential => {
                if prev_value == 0.0 || next.value == 0.0 || (prev_value > 0.0) != (next.value > 0.0) {
                    prev_value
                } else {
                    prev_value * (next.value / prev_value).powf(progress)
                }
            }
        }
    }
}
