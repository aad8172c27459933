//! Sensor channels and the fixed-order feature vector.
//!
//! The scorer consumes a vector of exactly [`FEATURE_COUNT`] values in the
//! order it was trained on. That order is encoded once, in [`Channel::ALL`],
//! and every vector is built by indexing through [`Channel::index`], so a
//! caller cannot reorder channels by accident.
//!
//! # Channel Order
//!
//! | idx | Channel | Kind |
//! |-----|---------|------|
//! | 0..=6 | TP2, TP3, H1, DV_pressure, Reservoirs, Oil_temperature, Motor_current | analog |
//! | 7..=14 | COMP, DV_eletric, Towers, MPG, LPS, Pressure_switch, Oil_level, Caudal_impulses | digital |

use serde::{Deserialize, Serialize};

use crate::validation::{ValidationError, ValidationErrorKind};

/// Number of channels in a feature vector.
pub const FEATURE_COUNT: usize = 15;

/// Number of analog channels (the leading block of the vector).
pub const ANALOG_COUNT: usize = 7;

/// A measured channel of the air-production unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    /// Compressor outlet pressure (bar).
    Tp2,
    /// Pneumatic panel pressure (bar).
    Tp3,
    /// Pressure drop at the cyclonic separator filter discharge (bar).
    H1,
    /// Pressure drop at tower discharge (bar).
    DvPressure,
    /// Downstream reservoir pressure (bar).
    Reservoirs,
    /// Compressor oil temperature (°C).
    OilTemperature,
    /// Motor current (A).
    MotorCurrent,
    /// Air intake valve state.
    Comp,
    /// Compressor outlet valve state.
    DvElectric,
    /// Active drying tower.
    Towers,
    /// Intake valve pressure state.
    Mpg,
    /// Low pressure signal.
    Lps,
    /// Pressure switch state.
    PressureSwitch,
    /// Oil level state.
    OilLevel,
    /// Airflow pulse meter output.
    CaudalImpulses,
}

impl Channel {
    /// All channels in scorer order.
    pub const ALL: [Channel; FEATURE_COUNT] = [
        Channel::Tp2,
        Channel::Tp3,
        Channel::H1,
        Channel::DvPressure,
        Channel::Reservoirs,
        Channel::OilTemperature,
        Channel::MotorCurrent,
        Channel::Comp,
        Channel::DvElectric,
        Channel::Towers,
        Channel::Mpg,
        Channel::Lps,
        Channel::PressureSwitch,
        Channel::OilLevel,
        Channel::CaudalImpulses,
    ];

    /// Position of this channel in the feature vector.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Dataset column name.
    pub fn name(self) -> &'static str {
        match self {
            Channel::Tp2 => "TP2",
            Channel::Tp3 => "TP3",
            Channel::H1 => "H1",
            Channel::DvPressure => "DV_pressure",
            Channel::Reservoirs => "Reservoirs",
            Channel::OilTemperature => "Oil_temperature",
            Channel::MotorCurrent => "Motor_current",
            Channel::Comp => "COMP",
            Channel::DvElectric => "DV_eletric",
            Channel::Towers => "Towers",
            Channel::Mpg => "MPG",
            Channel::Lps => "LPS",
            Channel::PressureSwitch => "Pressure_switch",
            Channel::OilLevel => "Oil_level",
            Channel::CaudalImpulses => "Caudal_impulses",
        }
    }

    /// Whether this is a continuous (analog) channel.
    #[inline]
    pub fn is_analog(self) -> bool {
        self.index() < ANALOG_COUNT
    }
}

/// Ordered, fixed-length scorer input.
///
/// Always holds exactly [`FEATURE_COUNT`] values in [`Channel::ALL`]
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f64; FEATURE_COUNT]);

impl FeatureVector {
    /// Builds a vector by asking `value_of` for each channel in order.
    pub(crate) fn from_fn(mut value_of: impl FnMut(Channel) -> f64) -> Self {
        let mut values = [0.0; FEATURE_COUNT];
        for channel in Channel::ALL {
            values[channel.index()] = value_of(channel);
        }
        Self(values)
    }

    /// Builds a vector from a raw slice already in scorer order.
    ///
    /// Rejects slices of the wrong length and non-finite values.
    pub fn try_from_slice(values: &[f64]) -> Result<Self, Vec<ValidationError>> {
        if values.len() != FEATURE_COUNT {
            return Err(vec![ValidationError::new(
                ValidationErrorKind::ChannelCountMismatch,
                format!("Expected {FEATURE_COUNT} channels, got {}", values.len()),
            )]);
        }
        let mut array = [0.0; FEATURE_COUNT];
        array.copy_from_slice(values);
        let vector = Self(array);
        vector.check_finite()?;
        Ok(vector)
    }

    /// Verifies that every channel holds a finite value.
    pub fn check_finite(&self) -> Result<(), Vec<ValidationError>> {
        let errors: Vec<ValidationError> = Channel::ALL
            .iter()
            .filter(|c| !self.get(**c).is_finite())
            .map(|c| {
                ValidationError::new(
                    ValidationErrorKind::NonFiniteChannel,
                    format!("Channel '{}' is not finite: {}", c.name(), self.get(*c)),
                )
            })
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Value of one channel.
    #[inline]
    pub fn get(&self, channel: Channel) -> f64 {
        self.0[channel.index()]
    }

    /// Value at a raw position.
    #[inline]
    pub(crate) fn at(&self, index: usize) -> f64 {
        self.0[index]
    }

    /// The underlying values, in scorer order.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}
