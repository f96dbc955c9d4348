use core::fmt::Debug;

use log::{debug, warn};

use crate::config::DeviceConfig;
use crate::time::DateTime;

/// Analog-to-digital converter wired to the analyzer's analog outputs.
pub trait AnalogFrontEnd {
    type Error: Debug;

    /// Start a conversion on `channel` and return the raw code.
    fn read_raw(&mut self, channel: u8) -> Result<i32, Self::Error>;

    /// Convert a raw code into volts using the converter's current gain.
    fn raw_to_voltage(&self, raw: i32) -> Result<f32, Self::Error>;
}

impl<A: AnalogFrontEnd + ?Sized> AnalogFrontEnd for &mut A {
    type Error = A::Error;

    fn read_raw(&mut self, channel: u8) -> Result<i32, Self::Error> {
        (**self).read_raw(channel)
    }

    fn raw_to_voltage(&self, raw: i32) -> Result<f32, Self::Error> {
        (**self).raw_to_voltage(raw)
    }
}

/// One reading of both channels in physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// CO2 concentration in ppm.
    pub co2_ppm: f32,
    /// H2O concentration in mmol/mol.
    pub h2o_mmol_per_mol: f32,
    pub timestamp: DateTime,
}

impl Sample {
    /// A sample carrying the fault sentinel on both channels.
    pub const fn fault(sentinel: f32, timestamp: DateTime) -> Self {
        Self {
            co2_ppm: sentinel,
            h2o_mmol_per_mol: sentinel,
            timestamp,
        }
    }
}

/// Linear mapping from output voltage to a physical range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelScale {
    pub max_voltage: f32,
    pub full_scale: f32,
}

impl ChannelScale {
    pub const fn new(max_voltage: f32, full_scale: f32) -> Self {
        Self {
            max_voltage,
            full_scale,
        }
    }

    #[inline]
    pub fn to_physical(&self, voltage: f32) -> f32 {
        voltage / self.max_voltage * self.full_scale
    }
}

/// Reads both analyzer channels and scales them to ppm and mmol/mol.
pub struct SampleAcquirer<A> {
    analog: A,
    co2_channel: u8,
    h2o_channel: u8,
    co2_scale: ChannelScale,
    h2o_scale: ChannelScale,
    fault_sentinel: f32,
}

impl<A: AnalogFrontEnd> SampleAcquirer<A> {
    pub fn new(analog: A, config: &DeviceConfig) -> Self {
        Self {
            analog,
            co2_channel: config.co2_channel,
            h2o_channel: config.h2o_channel,
            co2_scale: ChannelScale::new(config.max_voltage, config.co2_full_scale),
            h2o_scale: ChannelScale::new(config.max_voltage, config.h2o_full_scale),
            fault_sentinel: config.fault_sentinel,
        }
    }

    /// Take one CO2/H2O reading stamped with `timestamp`.
    ///
    /// Both conversions run with interrupts disabled, CO2 first. Any driver
    /// failure yields a sample with the fault sentinel on both channels
    /// instead of an error.
    pub fn acquire(&mut self, timestamp: DateTime) -> Sample {
        match self.read_voltages() {
            Ok((co2_volts, h2o_volts)) => {
                let sample = Sample {
                    co2_ppm: self.co2_scale.to_physical(co2_volts),
                    h2o_mmol_per_mol: self.h2o_scale.to_physical(h2o_volts),
                    timestamp,
                };
                debug!(
                    "Sample at {}: CO2 {:.2} ppm, H2O {:.2} mmol/mol",
                    timestamp, sample.co2_ppm, sample.h2o_mmol_per_mol
                );
                sample
            }
            Err(e) => {
                warn!("Analog read failed, reporting fault sentinel: {:?}", e);
                Sample::fault(self.fault_sentinel, timestamp)
            }
        }
    }

    fn read_voltages(&mut self) -> Result<(f32, f32), A::Error> {
        let analog = &mut self.analog;
        let (co2_channel, h2o_channel) = (self.co2_channel, self.h2o_channel);

        // Released on every exit path, including the `?` early returns.
        let (co2_raw, h2o_raw) = critical_section::with(|_| {
            let co2 = analog.read_raw(co2_channel)?;
            let h2o = analog.read_raw(h2o_channel)?;
            Ok::<_, A::Error>((co2, h2o))
        })?;

        Ok((
            self.analog.raw_to_voltage(co2_raw)?,
            self.analog.raw_to_voltage(h2o_raw)?,
        ))
    }

    pub fn fault_sentinel(&self) -> f32 {
        self.fault_sentinel
    }

    /// The underlying converter driver.
    pub fn analog(&self) -> &A {
        &self.analog
    }
}
