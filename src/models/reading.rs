//! Sensor reading model.
//!
//! A reading carries the seven analog channels measured by the caller and
//! optional overrides for the digital channels. Digital channels the caller
//! does not supply are filled from a process-wide [`DigitalChannels`]
//! baseline when the feature vector is built.

use serde::{Deserialize, Serialize};

use super::{Channel, FeatureVector};

/// The analog (continuous) channels of one reading.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalogChannels {
    pub tp2: f64,
    pub tp3: f64,
    pub h1: f64,
    pub dv_pressure: f64,
    pub reservoirs: f64,
    pub oil_temperature: f64,
    pub motor_current: f64,
}

/// A complete set of digital channel values.
///
/// Used as the nominal baseline for channels a reading leaves unset. The
/// default is the "running, healthy" configuration observed in sampled
/// data; deployments with different rolling stock should supply their own.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigitalChannels {
    pub comp: f64,
    #[serde(alias = "dv_eletric")]
    pub dv_electric: f64,
    pub towers: f64,
    pub mpg: f64,
    pub lps: f64,
    pub pressure_switch: f64,
    pub oil_level: f64,
    pub caudal_impulses: f64,
}

/// Per-reading digital values; `None` falls back to the baseline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigitalOverrides {
    pub comp: Option<f64>,
    #[serde(alias = "dv_eletric")]
    pub dv_electric: Option<f64>,
    pub towers: Option<f64>,
    pub mpg: Option<f64>,
    pub lps: Option<f64>,
    pub pressure_switch: Option<f64>,
    pub oil_level: Option<f64>,
    pub caudal_impulses: Option<f64>,
}

/// One train's measurements at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Caller-measured analog channels.
    #[serde(flatten)]
    pub analog: AnalogChannels,
    /// Optional digital channel values.
    #[serde(default, skip_serializing_if = "DigitalOverrides::is_empty")]
    pub digital: DigitalOverrides,
}

impl AnalogChannels {
    /// Value of an analog channel; `None` for digital channels.
    pub fn get(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Tp2 => Some(self.tp2),
            Channel::Tp3 => Some(self.tp3),
            Channel::H1 => Some(self.h1),
            Channel::DvPressure => Some(self.dv_pressure),
            Channel::Reservoirs => Some(self.reservoirs),
            Channel::OilTemperature => Some(self.oil_temperature),
            Channel::MotorCurrent => Some(self.motor_current),
            _ => None,
        }
    }
}

impl DigitalChannels {
    /// Value of a digital channel; `None` for analog channels.
    pub fn get(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Comp => Some(self.comp),
            Channel::DvElectric => Some(self.dv_electric),
            Channel::Towers => Some(self.towers),
            Channel::Mpg => Some(self.mpg),
            Channel::Lps => Some(self.lps),
            Channel::PressureSwitch => Some(self.pressure_switch),
            Channel::OilLevel => Some(self.oil_level),
            Channel::CaudalImpulses => Some(self.caudal_impulses),
            _ => None,
        }
    }
}

impl Default for DigitalChannels {
    fn default() -> Self {
        Self {
            comp: 1.0,
            dv_electric: 0.0,
            towers: 1.0,
            mpg: 1.0,
            lps: 0.0,
            pressure_switch: 1.0,
            oil_level: 1.0,
            caudal_impulses: 1.0,
        }
    }
}

impl DigitalOverrides {
    /// Overridden value for a digital channel, if any.
    pub fn get(&self, channel: Channel) -> Option<f64> {
        match channel {
            Channel::Comp => self.comp,
            Channel::DvElectric => self.dv_electric,
            Channel::Towers => self.towers,
            Channel::Mpg => self.mpg,
            Channel::Lps => self.lps,
            Channel::PressureSwitch => self.pressure_switch,
            Channel::OilLevel => self.oil_level,
            Channel::CaudalImpulses => self.caudal_impulses,
            _ => None,
        }
    }

    /// Whether no digital channel is overridden.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl SensorReading {
    /// Creates a reading with analog values only.
    pub fn new(analog: AnalogChannels) -> Self {
        Self {
            analog,
            digital: DigitalOverrides::default(),
        }
    }

    /// Sets digital overrides.
    pub fn with_digital(mut self, digital: DigitalOverrides) -> Self {
        self.digital = digital;
        self
    }

    /// Builds the scorer input, filling unset digital channels from `defaults`.
    ///
    /// Does not check finiteness; see [`FeatureVector::check_finite`].
    pub fn to_features(&self, defaults: &DigitalChannels) -> FeatureVector {
        FeatureVector::from_fn(|channel| {
            self.analog
                .get(channel)
                .or_else(|| self.digital.get(channel))
                .or_else(|| defaults.get(channel))
                .unwrap_or(f64::NAN)
        })
    }
}
