/// One tick of the simulation clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Step index, starting from 0.
    pub step: usize,
    /// Time at the start of the step (h).
    pub time_hr: f64,
}

/// A simulation clock that walks a fixed number of equally spaced steps.
///
/// # Examples
///
/// ```
/// use energy_control_sim::sim::clock::Clock;
///
/// let mut clock = Clock::new(3, 0.5, 6.0);
/// let mut times = Vec::new();
///
/// clock.run(|tick| times.push(tick.time_hr));
/// assert_eq!(times, vec![6.0, 6.5, 7.0]);
/// ```
pub struct Clock {
    current: usize,
    total: usize,
    dt_hours: f64,
    start_hour: f64,
}

impl Clock {
    /// Creates a clock.
    ///
    /// # Arguments
    ///
    /// * `total` - Number of steps the clock will yield
    /// * `dt_hours` - Step duration
    /// * `start_hour` - Time of step 0
    pub fn new(total: usize, dt_hours: f64, start_hour: f64) -> Self {
        Self {
            current: 0,
            total,
            dt_hours,
            start_hour,
        }
    }

    /// Advances the clock by one step.
    ///
    /// # Returns
    ///
    /// * `Some(tick)` - The step about to be simulated
    /// * `None` - If the clock has reached its total steps
    pub fn tick(&mut self) -> Option<Tick> {
        if self.current < self.total {
            let step = self.current;
            self.current += 1;
            Some(Tick {
                step,
                time_hr: self.time_at(step),
            })
        } else {
            None
        }
    }

    /// Time at the start of step `step`; `time_at(total)` is the final time.
    pub fn time_at(&self, step: usize) -> f64 {
        self.start_hour + step as f64 * self.dt_hours
    }

    /// Runs a function for each remaining step in the clock.
    pub fn run(&mut self, mut f: impl FnMut(Tick)) {
        while let Some(tick) = self.tick() {
            f(tick);
        }
    }
}
