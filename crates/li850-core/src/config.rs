//! Device configuration
//!
//! The defaults reproduce the analyzer's factory wiring: the Li-850 analog
//! outputs span 0–2.5 V for 0–5000 ppm CO2 and 0–60 mmol/mol H2O, sampled on
//! ADC channels 0 and 1, logged every 10 s to the card mounted at `/sd`.
//! A configuration can be persisted as a postcard blob.

extern crate alloc;
use alloc::vec::Vec;

use core::time::Duration;

use heapless::String;
use serde::{Deserialize, Serialize};
use thiserror_no_std::Error;

/// Maximum length of the storage mount point, e.g. `/sd`.
pub const MOUNT_POINT_CAPACITY: usize = 16;

pub const DEFAULT_SAMPLING_PERIOD_SECS: u32 = 10;
/// Full-scale voltage of the analyzer's analog outputs.
pub const DEFAULT_MAX_VOLTAGE: f32 = 2.5;
pub const DEFAULT_CO2_FULL_SCALE_PPM: f32 = 5000.0;
pub const DEFAULT_H2O_FULL_SCALE_MMOL: f32 = 60.0;
/// Reported for both channels when a reading fails.
pub const DEFAULT_FAULT_SENTINEL: f32 = 9999.0;
pub const DEFAULT_CO2_CHANNEL: u8 = 0;
pub const DEFAULT_H2O_CHANNEL: u8 = 1;
pub const DEFAULT_MOUNT_POINT: &str = "/sd";

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Sampling period must be at least one second")]
    ZeroSamplingPeriod,
    #[error("Max voltage must be a positive finite number")]
    InvalidMaxVoltage,
    #[error("Full-scale range of the {0} channel must be a positive finite number")]
    InvalidFullScale(&'static str),
    #[error("CO2 and H2O must be read from different channels (both are {0})")]
    SharedChannel(u8),
    #[error("Mount point must be an absolute path without trailing slash")]
    InvalidMountPoint,
    #[error("Failed to encode configuration: {0}")]
    Encode(postcard::Error),
    #[error("Failed to decode configuration: {0}")]
    Decode(postcard::Error),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DeviceConfig {
    /// Seconds between two logged samples while measuring.
    pub sampling_period_secs: u32,
    pub max_voltage: f32,
    pub co2_full_scale: f32,
    pub h2o_full_scale: f32,
    pub fault_sentinel: f32,
    pub co2_channel: u8,
    pub h2o_channel: u8,
    pub mount_point: String<MOUNT_POINT_CAPACITY>,
    /// Display refresh pacing for the menu screens and the measuring screens.
    pub frame_interval_ms: u32,
    /// Display refresh pacing for the instant-reading screen, which samples
    /// on every frame.
    pub instant_frame_interval_ms: u32,
    /// How long the diagnostic screen stays up before the reset to startup.
    pub fault_reset_delay_ms: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let mut mount_point = String::new();
        // DEFAULT_MOUNT_POINT is shorter than MOUNT_POINT_CAPACITY
        let _ = mount_point.push_str(DEFAULT_MOUNT_POINT);

        Self {
            sampling_period_secs: DEFAULT_SAMPLING_PERIOD_SECS,
            max_voltage: DEFAULT_MAX_VOLTAGE,
            co2_full_scale: DEFAULT_CO2_FULL_SCALE_PPM,
            h2o_full_scale: DEFAULT_H2O_FULL_SCALE_MMOL,
            fault_sentinel: DEFAULT_FAULT_SENTINEL,
            co2_channel: DEFAULT_CO2_CHANNEL,
            h2o_channel: DEFAULT_H2O_CHANNEL,
            mount_point,
            frame_interval_ms: 100,
            instant_frame_interval_ms: 200,
            fault_reset_delay_ms: 2000,
        }
    }
}

impl DeviceConfig {
    /// Default configuration with a different sampling period.
    pub fn with_sampling_period(secs: u32) -> Self {
        Self {
            sampling_period_secs: secs,
            ..Self::default()
        }
    }

    pub fn sampling_period(&self) -> Duration {
        Duration::from_secs(self.sampling_period_secs as u64)
    }

    /// Check every field for values the control loop cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sampling_period_secs == 0 {
            return Err(ConfigError::ZeroSamplingPeriod);
        }
        if !is_positive_finite(self.max_voltage) {
            return Err(ConfigError::InvalidMaxVoltage);
        }
        if !is_positive_finite(self.co2_full_scale) {
            return Err(ConfigError::InvalidFullScale("CO2"));
        }
        if !is_positive_finite(self.h2o_full_scale) {
            return Err(ConfigError::InvalidFullScale("H2O"));
        }
        if self.co2_channel == self.h2o_channel {
            return Err(ConfigError::SharedChannel(self.co2_channel));
        }

        let mount = self.mount_point.as_str();
        if mount.len() < 2 || !mount.starts_with('/') || mount.ends_with('/') {
            return Err(ConfigError::InvalidMountPoint);
        }

        Ok(())
    }

    /// Serialize to a postcard blob for persistence.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        postcard::to_allocvec(self).map_err(ConfigError::Encode)
    }

    /// Deserialize and validate a postcard blob.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = postcard::from_bytes(bytes).map_err(ConfigError::Decode)?;
        config.validate()?;
        Ok(config)
    }
}

fn is_positive_finite(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = DeviceConfig::default();
        assert_eq!(config.validate(), Ok(()));
        assert_eq!(config.sampling_period(), Duration::from_secs(10));
        assert_eq!(config.mount_point.as_str(), "/sd");
    }

    #[test]
    fn rejects_zero_period() {
        let config = DeviceConfig::with_sampling_period(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroSamplingPeriod));
    }

    #[test]
    fn rejects_bad_scaling() {
        let mut config = DeviceConfig::default();
        config.max_voltage = 0.0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidMaxVoltage));

        let mut config = DeviceConfig::default();
        config.h2o_full_scale = f32::NAN;
        assert_eq!(config.validate(), Err(ConfigError::InvalidFullScale("H2O")));
    }

    #[test]
    fn rejects_shared_channel() {
        let mut config = DeviceConfig::default();
        config.h2o_channel = config.co2_channel;
        assert_eq!(config.validate(), Err(ConfigError::SharedChannel(0)));
    }

    #[test]
    fn rejects_relative_or_trailing_slash_mount() {
        for mount in ["sd", "/", "/sd/"] {
            let mut config = DeviceConfig::default();
            config.mount_point.clear();
            config.mount_point.push_str(mount).unwrap();
            assert_eq!(config.validate(), Err(ConfigError::InvalidMountPoint), "{mount}");
        }
    }

    #[test]
    fn persisted_blob_restores_configuration() {
        let mut config = DeviceConfig::with_sampling_period(2);
        config.fault_sentinel = -1.0;

        let bytes = config.to_bytes().unwrap();
        let restored = DeviceConfig::from_bytes(&bytes).unwrap();

        assert_eq!(restored, config);
    }

    #[test]
    fn invalid_blob_is_rejected() {
        let config = DeviceConfig::with_sampling_period(0);
        let bytes = config.to_bytes().unwrap();
        assert_eq!(
            DeviceConfig::from_bytes(&bytes),
            Err(ConfigError::ZeroSamplingPeriod)
        );

        assert!(matches!(
            DeviceConfig::from_bytes(&[0xFF]),
            Err(ConfigError::Decode(_))
        ));
    }
}
