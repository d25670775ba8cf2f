//! Conversion of raw channel counts into illuminance.
//!
//! Two engines compute lux from the same `(broadband, infrared)` pair:
//!
//! - [`empirical_lux`] uses the floating-point piecewise formulas from the
//!   TAOS datasheet, normalizing both channels to the 1×/402 ms basis by
//!   division.
//! - [`fixed_point_lux`] uses only integer shifts and multiplies, selecting
//!   `(b, m)` coefficient pairs from per-package lookup tables. Suited to
//!   targets without an FPU.
//!
//! Both engines are pure functions; hardware access lives in the driver.

use crate::InvalidConfiguration;

/// Analog gain applied to the photodiode current before digitization.
///
/// The discriminant is the gain field of the timing register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    /// 1× gain.
    Low = 0x00,
    /// 16× gain.
    High = 0x10,
}

impl Gain {
    pub(crate) const fn bits(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for Gain {
    type Error = InvalidConfiguration;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Low),
            0x10 => Ok(Self::High),
            _ => Err(InvalidConfiguration),
        }
    }
}

/// Duration the sensor accumulates charge before a channel read is valid.
///
/// The discriminant is the INTEG field of the timing register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IntegrationTime {
    /// 13.7 ms integration.
    Ms13 = 0x00,
    /// 101 ms integration.
    Ms101 = 0x01,
    /// 402 ms integration.
    Ms402 = 0x02,
}

impl IntegrationTime {
    pub(crate) const fn bits(self) -> u8 {
        self as u8
    }

    /// Wait after power-up before the channel registers are valid.
    ///
    /// Intentionally longer than the integration period itself, to
    /// guarantee the conversion has settled.
    pub const fn settling_delay_ms(self) -> u32 {
        match self {
            Self::Ms13 => 15,
            Self::Ms101 => 120,
            Self::Ms402 => 450,
        }
    }
}

impl TryFrom<u8> for IntegrationTime {
    type Error = InvalidConfiguration;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::Ms13),
            0x01 => Ok(Self::Ms101),
            0x02 => Ok(Self::Ms402),
            _ => Err(InvalidConfiguration),
        }
    }
}

/// Physical sensor package.
///
/// The package affects the spectral response, and with it the calibrated
/// coefficient tables. Bit 4 flags the CS (chipscale) package.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Package {
    /// TMB-6 package.
    T = 0x00,
    /// Dual flat no-lead package.
    Fn = 0x01,
    /// Chipled package.
    Cl = 0x02,
    /// Chipscale package.
    Cs = 0x10,
}

impl Package {
    /// Whether the CS coefficient tables apply.
    ///
    /// Checked by bit, not by equality, so any package code carrying the CS
    /// flag selects the CS tables.
    pub const fn is_cs(self) -> bool {
        (self as u8) & 0x10 != 0
    }
}

impl TryFrom<u8> for Package {
    type Error = InvalidConfiguration;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Self::T),
            0x01 => Ok(Self::Fn),
            0x02 => Ok(Self::Cl),
            0x10 => Ok(Self::Cs),
            _ => Err(InvalidConfiguration),
        }
    }
}

// Scaling factors normalizing a reading to the 1×/402 ms basis.
const EMPIRICAL_SCALE_13MS: f64 = 0.034;
const EMPIRICAL_SCALE_101MS: f64 = 0.252;

/// Computes illuminance in lux from raw channel counts, floating point.
///
/// A zero broadband count yields 0.0 regardless of the infrared count; the
/// result is clamped to be non-negative.
#[must_use]
pub fn empirical_lux(
    ch0: u16,
    ch1: u16,
    gain: Gain,
    integration_time: IntegrationTime,
    package: Package,
) -> f64 {
    if ch0 == 0 {
        return 0.0;
    }

    let mut d0 = f64::from(ch0);
    let mut d1 = f64::from(ch1);

    match integration_time {
        IntegrationTime::Ms13 => {
            d0 /= EMPIRICAL_SCALE_13MS;
            d1 /= EMPIRICAL_SCALE_13MS;
        }
        IntegrationTime::Ms101 => {
            d0 /= EMPIRICAL_SCALE_101MS;
            d1 /= EMPIRICAL_SCALE_101MS;
        }
        IntegrationTime::Ms402 => {}
    }
    if gain == Gain::High {
        d0 /= 16.0;
        d1 /= 16.0;
    }

    let ratio = d1 / d0;

    // Piecewise bands from the datasheet; upper bounds inclusive, first
    // match wins. The lowest band requires a strictly positive ratio, so a
    // zero infrared count matches no band at all.
    let lux = if ratio <= 0.0 {
        0.0
    } else if package.is_cs() {
        if ratio <= 0.52 {
            0.0315 * d0 - 0.0593 * d0 * libm::pow(ratio, 1.4)
        } else if ratio <= 0.65 {
            0.0229 * d0 - 0.0291 * d1
        } else if ratio <= 0.80 {
            0.0157 * d0 - 0.0180 * d1
        } else if ratio <= 1.30 {
            0.00338 * d0 - 0.00260 * d1
        } else {
            0.0
        }
    } else if ratio <= 0.50 {
        0.0304 * d0 - 0.062 * d0 * libm::pow(ratio, 1.4)
    } else if ratio <= 0.61 {
        0.0224 * d0 - 0.031 * d1
    } else if ratio <= 0.80 {
        0.0128 * d0 - 0.0153 * d1
    } else if ratio <= 1.30 {
        0.00146 * d0 - 0.00112 * d1
    } else {
        0.0
    };

    lux.max(0.0)
}

// Fixed-point scale exponents.
const CH_SCALE: u32 = 10;
const RATIO_SCALE: u32 = 9;
const LUX_SCALE: u32 = 14;

// Channel scale for 13.7 ms, i.e. 322/11 << CH_SCALE.
const CHSCALE_TINT0: u64 = 0x7517;
// Channel scale for 101 ms, i.e. 322/81 << CH_SCALE.
const CHSCALE_TINT1: u64 = 0x0fe7;

// T, FN and CL package coefficients.
const K1T: u64 = 0x0040; // 0.125 * 2^RATIO_SCALE
const B1T: u64 = 0x01f2;
const M1T: u64 = 0x01be;
const K2T: u64 = 0x0080; // 0.250
const B2T: u64 = 0x0214;
const M2T: u64 = 0x02d1;
const K3T: u64 = 0x00c0; // 0.375
const B3T: u64 = 0x023f;
const M3T: u64 = 0x037b;
const K4T: u64 = 0x0100; // 0.500
const B4T: u64 = 0x0270;
const M4T: u64 = 0x03fe;
const K5T: u64 = 0x0138; // 0.610
const B5T: u64 = 0x016f;
const M5T: u64 = 0x01fc;
const K6T: u64 = 0x019a; // 0.800
const B6T: u64 = 0x00d2;
const M6T: u64 = 0x00fb;
const K7T: u64 = 0x029a; // 1.300
const B7T: u64 = 0x0018;
const M7T: u64 = 0x0012;
const K8T: u64 = 0x029a; // 1.300
const B8T: u64 = 0x0000;
const M8T: u64 = 0x0000;

// CS package coefficients.
const K1C: u64 = 0x0043; // 0.130
const B1C: u64 = 0x0204;
const M1C: u64 = 0x01ad;
const K2C: u64 = 0x0085; // 0.260
const B2C: u64 = 0x0228;
const M2C: u64 = 0x02c1;
const K3C: u64 = 0x00c8; // 0.390
const B3C: u64 = 0x0253;
const M3C: u64 = 0x0363;
const K4C: u64 = 0x010a; // 0.520
const B4C: u64 = 0x0282;
const M4C: u64 = 0x03df;
const K5C: u64 = 0x014d; // 0.650
const B5C: u64 = 0x0177;
const M5C: u64 = 0x01dd;
const K6C: u64 = 0x019a; // 0.800
const B6C: u64 = 0x0101;
const M6C: u64 = 0x0127;
const K7C: u64 = 0x029a; // 1.300
const B7C: u64 = 0x0037;
const M7C: u64 = 0x002b;
const K8C: u64 = 0x029a; // 1.300
const B8C: u64 = 0x0000;
const M8C: u64 = 0x0000;

// The T table carries an explicit beyond-last-threshold branch on K8T while
// the CS table is a plain sequential scan. The asymmetry is part of the
// vendor calibration and is kept as-is; K7T == K8T, so the fallthrough arm
// is unreachable.
const fn coefficients_t(ratio: u64) -> (u64, u64) {
    if ratio <= K1T {
        (B1T, M1T)
    } else if ratio <= K2T {
        (B2T, M2T)
    } else if ratio <= K3T {
        (B3T, M3T)
    } else if ratio <= K4T {
        (B4T, M4T)
    } else if ratio <= K5T {
        (B5T, M5T)
    } else if ratio <= K6T {
        (B6T, M6T)
    } else if ratio <= K7T {
        (B7T, M7T)
    } else if ratio > K8T {
        (B8T, M8T)
    } else {
        // K7T == K8T leaves no gap between the last two checks.
        (0, 0)
    }
}

const fn coefficients_cs(ratio: u64) -> (u64, u64) {
    if ratio <= K1C {
        (B1C, M1C)
    } else if ratio <= K2C {
        (B2C, M2C)
    } else if ratio <= K3C {
        (B3C, M3C)
    } else if ratio <= K4C {
        (B4C, M4C)
    } else if ratio <= K5C {
        (B5C, M5C)
    } else if ratio <= K6C {
        (B6C, M6C)
    } else if ratio <= K7C {
        (B7C, M7C)
    } else {
        (B8C, M8C)
    }
}

/// Computes illuminance in lux from raw channel counts, integer-only.
///
/// All arithmetic is shift/multiply; gain and integration time are
/// compensated through scale constants rather than division, so the engine
/// runs on targets without floating-point hardware. The result is rounded
/// to the nearest integer lux and is never negative.
#[must_use]
pub fn fixed_point_lux(
    ch0: u16,
    ch1: u16,
    gain: Gain,
    integration_time: IntegrationTime,
    package: Package,
) -> u32 {
    let mut ch_scale: u64 = match integration_time {
        IntegrationTime::Ms13 => CHSCALE_TINT0,
        IntegrationTime::Ms101 => CHSCALE_TINT1,
        IntegrationTime::Ms402 => 1 << CH_SCALE,
    };
    // Scale 1× readings up to the 16× basis.
    if gain == Gain::Low {
        ch_scale <<= 4;
    }

    let channel0 = (u64::from(ch0) * ch_scale) >> CH_SCALE;
    let channel1 = (u64::from(ch1) * ch_scale) >> CH_SCALE;

    // Ratio of the channels, scaled by 2^(RATIO_SCALE + 1) then rounded to
    // 2^RATIO_SCALE. A zero broadband count yields ratio 0 and, through the
    // zero subtrahend below, lux 0.
    let ratio1 = if channel0 == 0 {
        0
    } else {
        (channel1 << (RATIO_SCALE + 1)) / channel0
    };
    let ratio = (ratio1 + 1) >> 1;

    let (b, m) = if package.is_cs() {
        coefficients_cs(ratio)
    } else {
        coefficients_t(ratio)
    };

    let temp = (channel0 * b) as i64 - (channel1 * m) as i64;
    let temp = temp.max(0) as u64;

    // Round up to the nearest integer lux and strip the fractional part.
    let temp = temp + (1 << (LUX_SCALE - 1));
    (temp >> LUX_SCALE) as u32
}
