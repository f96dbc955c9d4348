use embedded_hal::delay::DelayNs;
use log::{debug, error, info, warn};

use super::DeviceState;
use crate::config::{ConfigError, DeviceConfig};
use crate::input::{Button, InputLatch};
use crate::sampling::{
    AnalogFrontEnd, ChannelWindows, Sample, SampleAcquirer, Slopes, WINDOW_CAPACITY,
};
use crate::storage::{LineStorage, Session, SessionLogger};
use crate::time::{Clock, DateTime};
use crate::timer::{PeriodicTimer, TickLatch, TimerSource};
use crate::ui::{FrameValues, Renderer};

/// The hardware collaborators handed to [`DeviceStateMachine::new`].
pub struct Devices<A, C, S, R, T, D> {
    pub analog: A,
    pub clock: C,
    pub storage: S,
    pub renderer: R,
    pub timer: T,
    pub delay: D,
}

/// Single consumer of button presses and sampling ticks.
///
/// Owns the sliding windows and the current session. Interrupt handlers only
/// ever see the [`InputLatch`] and [`TickLatch`] passed to [`Self::new`].
pub struct DeviceStateMachine<'a, A, C, S, R, T, D> {
    config: DeviceConfig,
    state: DeviceState,
    input: &'a InputLatch,
    timer: TimerSource<'a, T>,
    acquirer: SampleAcquirer<A>,
    clock: C,
    logger: SessionLogger<S>,
    renderer: R,
    delay: D,
    windows: ChannelWindows<WINDOW_CAPACITY>,
    session: Option<Session>,
    latest: Option<Sample>,
    clock_reading: Option<DateTime>,
}

impl<'a, A, C, S, R, T, D> DeviceStateMachine<'a, A, C, S, R, T, D>
where
    A: AnalogFrontEnd,
    C: Clock,
    S: LineStorage,
    R: Renderer,
    T: PeriodicTimer,
    D: DelayNs,
{
    pub fn new(
        config: DeviceConfig,
        input: &'a InputLatch,
        ticks: &'a TickLatch,
        devices: Devices<A, C, S, R, T, D>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let Devices {
            analog,
            clock,
            storage,
            renderer,
            timer,
            delay,
        } = devices;

        info!(
            "Control loop ready: sampling every {} s, logging under {}",
            config.sampling_period_secs, config.mount_point
        );

        Ok(Self {
            acquirer: SampleAcquirer::new(analog, &config),
            logger: SessionLogger::new(storage, &config.mount_point),
            timer: TimerSource::new(timer, ticks),
            config,
            state: DeviceState::Startup,
            input,
            clock,
            renderer,
            delay,
            windows: ChannelWindows::new(),
            session: None,
            latest: None,
            clock_reading: None,
        })
    }

    /// Run the control loop forever.
    pub fn run(&mut self) -> ! {
        loop {
            self.step();
        }
    }

    /// One iteration of the control loop: log a due sample, apply at most one
    /// button press, render the current screen, then pace the frame.
    pub fn step(&mut self) {
        self.service_tick();

        if self.state == DeviceState::Fault {
            self.recover_from_fault();
            return;
        }

        if let Some(button) = self.input.next_press() {
            self.apply(button);
        }

        if self.state.samples_every_frame() {
            let now = self.clock.now();
            self.latest = Some(self.acquirer.acquire(now));
        } else if self.state == DeviceState::ShowTime {
            self.clock_reading = Some(self.clock.now());
        }

        self.render();
        self.delay.delay_ms(self.frame_interval_ms());
    }

    fn service_tick(&mut self) {
        if !self.timer.take_due() {
            return;
        }

        let Some(session) = self.session.as_mut().filter(|s| s.is_active()) else {
            debug!("Sampling tick without an active session, discarded");
            return;
        };

        let sample = self.acquirer.acquire(self.clock.now());
        self.windows.push(&sample);
        // Failures are logged and counted by the logger; the session carries on
        let _ = self.logger.append(session, &sample);
        self.latest = Some(sample);
    }

    fn apply(&mut self, button: Button) {
        let from = self.state;
        let to = from.next_state(button);

        match to {
            DeviceState::Measuring if !from.samples_periodically() => self.start_session(),
            DeviceState::Stopped => self.stop_session(),
            _ => {}
        }

        if from != to {
            info!("{} -> {} ({:?} button)", from, to, button);
        }
        self.state = to;
    }

    fn start_session(&mut self) {
        // A session left open by a forced state change ends here
        if let Some(previous) = self.session.as_mut() {
            previous.close();
        }

        self.windows.clear();
        let now = self.clock.now();
        self.session = Some(self.logger.start_session(now));

        if let Err(e) = self.timer.arm(self.config.sampling_period()) {
            error!("Failed to arm the sampling timer: {:?}", e);
        }

        // Shown on screen until the first tick; neither logged nor windowed
        self.latest = Some(self.acquirer.acquire(now));
    }

    fn stop_session(&mut self) {
        self.timer.disarm();
        if let Some(session) = self.session.as_mut() {
            session.close();
        }
    }

    fn recover_from_fault(&mut self) {
        warn!(
            "Unrecognized device state, resetting to {} in {} ms",
            DeviceState::Startup,
            self.config.fault_reset_delay_ms
        );

        self.stop_session();
        if let Err(e) = self.renderer.draw(DeviceState::Fault, &FrameValues::default()) {
            error!("Failed to draw the diagnostic screen: {:?}", e);
        }
        self.delay.delay_ms(self.config.fault_reset_delay_ms);

        // Presses made while the diagnostic was up are not acted on
        self.input.discard_all();
        self.state = DeviceState::Startup;
        info!("{} -> {} (reset)", DeviceState::Fault, DeviceState::Startup);
    }

    fn render(&mut self) {
        let values = self.frame_values();
        if let Err(e) = self.renderer.draw(self.state, &values) {
            error!("Failed to draw {} screen: {:?}", self.state, e);
        }
    }

    fn frame_values(&self) -> FrameValues {
        let slopes = self.session_active().then(|| self.slopes());

        FrameValues {
            co2: self.latest.map_or(0.0, |s| s.co2_ppm),
            h2o: self.latest.map_or(0.0, |s| s.h2o_mmol_per_mol),
            slope_co2: slopes.map(|s| s.co2_per_min),
            slope_h2o: slopes.map(|s| s.h2o_per_min),
            clock: match self.state {
                DeviceState::ShowTime => self.clock_reading,
                _ => None,
            },
        }
    }

    fn frame_interval_ms(&self) -> u32 {
        if self.state.samples_every_frame() {
            self.config.instant_frame_interval_ms
        } else {
            self.config.frame_interval_ms
        }
    }

    fn session_active(&self) -> bool {
        self.session.as_ref().is_some_and(Session::is_active)
    }

    /// Overwrite the current state with a raw state code.
    ///
    /// Unknown codes put the machine in [`DeviceState::Fault`], which the
    /// next [`Self::step`] recovers from.
    pub fn force_state_code(&mut self, code: u8) {
        let state = DeviceState::from_code(code);
        warn!("State forced to {} (code {:#04x})", state, code);
        self.state = state;
    }

    pub fn state(&self) -> DeviceState {
        self.state
    }

    /// The current session, or the last one once stopped.
    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn latest_sample(&self) -> Option<Sample> {
        self.latest
    }

    pub fn windows(&self) -> &ChannelWindows<WINDOW_CAPACITY> {
        &self.windows
    }

    /// Per-minute trends over the current windows.
    pub fn slopes(&self) -> Slopes {
        self.windows.slopes(self.config.sampling_period_secs as f32)
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn timer(&self) -> &TimerSource<'a, T> {
        &self.timer
    }

    pub fn logger(&self) -> &SessionLogger<S> {
        &self.logger
    }

    pub fn logger_mut(&mut self) -> &mut SessionLogger<S> {
        &mut self.logger
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }
}
