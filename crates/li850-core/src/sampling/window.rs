use super::Sample;

/// Number of readings kept per channel during a measurement session.
pub const WINDOW_CAPACITY: usize = 20;

/// Fewest readings for which a slope is reported; below this the slope is 0.
pub const MIN_SLOPE_SAMPLES: usize = 6;

/// Fixed-capacity FIFO of the most recent readings of one channel.
///
/// Backed by an array used as a ring: `head` indexes the oldest reading and
/// the next write goes to `(head + len) % N`. Pushing into a full window
/// overwrites the oldest reading.
#[derive(Debug, Clone)]
pub struct SlidingWindow<const N: usize> {
    buffer: [f32; N],
    head: usize,
    len: usize,
}

impl<const N: usize> SlidingWindow<N> {
    pub const fn new() -> Self {
        Self {
            buffer: [0.0; N],
            head: 0,
            len: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub const fn len(&self) -> usize {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Append `value`, evicting the oldest reading when full.
    pub fn push(&mut self, value: f32) {
        if N == 0 {
            return;
        }

        if self.len == N {
            self.buffer[self.head] = value;
            self.head = (self.head + 1) % N;
        } else {
            self.buffer[(self.head + self.len) % N] = value;
            self.len += 1;
        }
    }

    pub fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
    }

    /// Readings from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = f32> + '_ {
        (0..self.len).map(move |i| self.buffer[(self.head + i) % N])
    }

    pub fn oldest(&self) -> Option<f32> {
        (self.len > 0).then(|| self.buffer[self.head])
    }

    pub fn newest(&self) -> Option<f32> {
        (self.len > 0).then(|| self.buffer[(self.head + self.len - 1) % N])
    }

    /// Average rate of change per minute, for readings `timestep_secs` apart.
    ///
    /// Sums the first differences of the stored readings, divides by the
    /// number of stored readings and scales to one minute. Returns 0 while
    /// fewer than [`MIN_SLOPE_SAMPLES`] readings are stored.
    pub fn slope(&self, timestep_secs: f32) -> f32 {
        if self.len < MIN_SLOPE_SAMPLES || timestep_secs <= 0.0 {
            return 0.0;
        }

        // The sum of consecutive differences telescopes to newest - oldest.
        let (Some(oldest), Some(newest)) = (self.oldest(), self.newest()) else {
            return 0.0;
        };
        let mean_step = (newest - oldest) / self.len as f32;

        mean_step * 60.0 / timestep_secs
    }
}

impl<const N: usize> Default for SlidingWindow<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Slope estimates for both channels, per minute.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Slopes {
    pub co2_per_min: f32,
    pub h2o_per_min: f32,
}

/// The CO2 and H2O windows of one measurement session.
#[derive(Debug, Clone, Default)]
pub struct ChannelWindows<const N: usize> {
    pub co2: SlidingWindow<N>,
    pub h2o: SlidingWindow<N>,
}

impl<const N: usize> ChannelWindows<N> {
    pub const fn new() -> Self {
        Self {
            co2: SlidingWindow::new(),
            h2o: SlidingWindow::new(),
        }
    }

    pub fn push(&mut self, sample: &Sample) {
        self.co2.push(sample.co2_ppm);
        self.h2o.push(sample.h2o_mmol_per_mol);
    }

    pub fn clear(&mut self) {
        self.co2.clear();
        self.h2o.clear();
    }

    pub fn slopes(&self, timestep_secs: f32) -> Slopes {
        Slopes {
            co2_per_min: self.co2.slope(timestep_secs),
            h2o_per_min: self.h2o.slope(timestep_secs),
        }
    }
}
