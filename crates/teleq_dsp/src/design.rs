//! Filter Coefficient Designer
//!
//! Pure functions producing second-order sections for every filter in the
//! chain. Based on the RBJ (Robert Bristow-Johnson) Audio EQ Cookbook, with
//! high-order Butterworth cut filters realised as cascades of prewarped
//! second-order sections.
//!
//! Every function clamps its inputs (frequency into `(0, nyquist)`, Q and
//! gain above a small floor) so the result is always a stable filter. Nothing
//! here allocates; the designer is called once per block from the audio
//! thread.

use std::f64::consts::PI;

use biquad::{Coefficients, Q_BUTTERWORTH_F64};

/// Fixed Q used by the low and high shelf bands
pub const SHELF_Q: f64 = 0.5;

/// Lowest frequency handed to the cookbook formulas (Hz)
pub const MIN_FREQUENCY_HZ: f64 = 1.0;

/// Highest frequency as a fraction of the sample rate (just below Nyquist)
pub const MAX_FREQUENCY_RATIO: f64 = 0.499;

/// Smallest Q accepted; anything lower degenerates the section
pub const MIN_Q: f64 = 0.01;

/// Smallest linear gain accepted by the shelf/peak designs (-120 dB)
pub const MIN_GAIN: f64 = 1e-6;

/// Number of second-order sections in the steepest cut filter (24 dB/oct)
pub const MAX_CUT_SECTIONS: usize = 2;

/// Unity section: passes the input unchanged
pub const PASSTHROUGH: Coefficients<f64> = Coefficients {
    a1: 0.0,
    a2: 0.0,
    b0: 1.0,
    b1: 0.0,
    b2: 0.0,
};

/// Convert decibels to linear amplitude
/// Formula: amplitude = 10^(dB/20)
#[inline]
pub fn db_to_gain(db: f64) -> f64 {
    10.0_f64.powf(db / 20.0)
}

/// Clamp a frequency into the range the designs are valid for
#[inline]
pub fn clamp_frequency(frequency: f64, sample_rate: f64) -> f64 {
    let max = (sample_rate * MAX_FREQUENCY_RATIO).max(MIN_FREQUENCY_HZ);
    if frequency.is_nan() {
        return MIN_FREQUENCY_HZ;
    }
    frequency.clamp(MIN_FREQUENCY_HZ, max)
}

/// Clamp Q above [`MIN_Q`]
#[inline]
pub fn clamp_q(q: f64) -> f64 {
    if q.is_nan() {
        return Q_BUTTERWORTH_F64;
    }
    q.max(MIN_Q)
}

#[inline]
fn clamp_gain(gain: f64) -> f64 {
    if gain.is_nan() {
        return 1.0;
    }
    gain.max(MIN_GAIN)
}

/// Normalized angular frequency as (sin, cos)
#[inline]
fn omega(frequency: f64, sample_rate: f64) -> (f64, f64) {
    let w0 = 2.0 * PI * clamp_frequency(frequency, sample_rate) / sample_rate;
    w0.sin_cos()
}

/// Divide through by a0
///
/// Division rather than multiplication by 1/a0 keeps unity designs exact
/// (b0 == 1, b1 == a1, b2 == a2 at 0 dB).
#[inline]
fn normalize(b0: f64, b1: f64, b2: f64, a0: f64, a1: f64, a2: f64) -> Coefficients<f64> {
    Coefficients {
        a1: a1 / a0,
        a2: a2 / a0,
        b0: b0 / a0,
        b1: b1 / a0,
        b2: b2 / a0,
    }
}

/// Second-order lowpass section
pub fn lowpass(frequency: f64, q: f64, sample_rate: f64) -> Coefficients<f64> {
    let (sin_w, cos_w) = omega(frequency, sample_rate);
    let alpha = sin_w / (2.0 * clamp_q(q));
    let b1 = 1.0 - cos_w;

    normalize(b1 * 0.5, b1, b1 * 0.5, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
}

/// Second-order highpass section
pub fn highpass(frequency: f64, q: f64, sample_rate: f64) -> Coefficients<f64> {
    let (sin_w, cos_w) = omega(frequency, sample_rate);
    let alpha = sin_w / (2.0 * clamp_q(q));
    let b0 = (1.0 + cos_w) * 0.5;

    normalize(b0, -(1.0 + cos_w), b0, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
}

/// Band-pass with constant 0 dB peak gain at the centre frequency
pub fn band_pass(frequency: f64, q: f64, sample_rate: f64) -> Coefficients<f64> {
    let (sin_w, cos_w) = omega(frequency, sample_rate);
    let alpha = sin_w / (2.0 * clamp_q(q));

    normalize(alpha, 0.0, -alpha, 1.0 + alpha, -2.0 * cos_w, 1.0 - alpha)
}

/// Peaking (bell) filter; `gain` is linear amplitude at the centre frequency
pub fn peak(frequency: f64, q: f64, gain: f64, sample_rate: f64) -> Coefficients<f64> {
    let (sin_w, cos_w) = omega(frequency, sample_rate);
    let a = clamp_gain(gain).sqrt();
    let alpha = sin_w / (2.0 * clamp_q(q));

    normalize(
        1.0 + alpha * a,
        -2.0 * cos_w,
        1.0 - alpha * a,
        1.0 + alpha / a,
        -2.0 * cos_w,
        1.0 - alpha / a,
    )
}

/// Low shelf; `gain` is the linear amplitude below the corner frequency
pub fn low_shelf(frequency: f64, q: f64, gain: f64, sample_rate: f64) -> Coefficients<f64> {
    let (sin_w, cos_w) = omega(frequency, sample_rate);
    let a = clamp_gain(gain).sqrt();
    let a_minus = a - 1.0;
    let a_plus = a + 1.0;
    let beta = sin_w * a.sqrt() / clamp_q(q);

    normalize(
        a * (a_plus - a_minus * cos_w + beta),
        a * 2.0 * (a_minus - a_plus * cos_w),
        a * (a_plus - a_minus * cos_w - beta),
        a_plus + a_minus * cos_w + beta,
        -2.0 * (a_minus + a_plus * cos_w),
        a_plus + a_minus * cos_w - beta,
    )
}

/// High shelf; `gain` is the linear amplitude above the corner frequency
pub fn high_shelf(frequency: f64, q: f64, gain: f64, sample_rate: f64) -> Coefficients<f64> {
    let (sin_w, cos_w) = omega(frequency, sample_rate);
    let a = clamp_gain(gain).sqrt();
    let a_minus = a - 1.0;
    let a_plus = a + 1.0;
    let beta = sin_w * a.sqrt() / clamp_q(q);

    normalize(
        a * (a_plus + a_minus * cos_w + beta),
        a * -2.0 * (a_minus + a_plus * cos_w),
        a * (a_plus + a_minus * cos_w - beta),
        a_plus - a_minus * cos_w + beta,
        2.0 * (a_minus - a_plus * cos_w),
        a_plus - a_minus * cos_w - beta,
    )
}

/// Ordered second-order sections of a Butterworth cut filter
///
/// Fixed capacity so it can be produced on the audio thread without
/// allocating.
#[derive(Debug, Clone, Copy)]
pub struct CutCoefficients {
    sections: [Coefficients<f64>; MAX_CUT_SECTIONS],
    len: usize,
}

impl CutCoefficients {
    /// The sections to cascade, in order
    pub fn sections(&self) -> &[Coefficients<f64>] {
        &self.sections[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Q of section `index` in an order-`order` Butterworth cascade
///
/// Poles sit at angles (2k+1)π/2N; each conjugate pair gives
/// Q = 1 / (2 cos θ).
#[inline]
fn butterworth_section_q(index: usize, order: usize) -> f64 {
    let theta = (2 * index + 1) as f64 * PI / (2 * order) as f64;
    1.0 / (2.0 * theta.cos())
}

fn butterworth(
    frequency: f64,
    sample_rate: f64,
    order: usize,
    section: fn(f64, f64, f64) -> Coefficients<f64>,
) -> CutCoefficients {
    // Odd orders are rounded up; anything beyond the cascade capacity is capped
    let len = ((order + 1) / 2).clamp(1, MAX_CUT_SECTIONS);
    let even_order = len * 2;

    let mut sections = [PASSTHROUGH; MAX_CUT_SECTIONS];
    for (index, coefficients) in sections.iter_mut().take(len).enumerate() {
        *coefficients = section(frequency, butterworth_section_q(index, even_order), sample_rate);
    }

    CutCoefficients { sections, len }
}

/// Butterworth highpass of the given order
///
/// Order 2 (12 dB/oct) yields one section, order 4 (24 dB/oct) two.
pub fn butterworth_highpass(frequency: f64, sample_rate: f64, order: usize) -> CutCoefficients {
    butterworth(frequency, sample_rate, order, highpass)
}

/// Butterworth lowpass of the given order
///
/// Order 2 (12 dB/oct) yields one section, order 4 (24 dB/oct) two.
pub fn butterworth_lowpass(frequency: f64, sample_rate: f64, order: usize) -> CutCoefficients {
    butterworth(frequency, sample_rate, order, lowpass)
}

/// Magnitude of a section's frequency response at `frequency` (linear)
///
/// H(z) = (b0 + b1 z^-1 + b2 z^-2) / (1 + a1 z^-1 + a2 z^-2), z = e^{jw}
pub fn magnitude_response(coefficients: &Coefficients<f64>, frequency: f64, sample_rate: f64) -> f64 {
    let w = 2.0 * PI * frequency / sample_rate;
    let (sin_1, cos_1) = w.sin_cos();
    let (sin_2, cos_2) = (2.0 * w).sin_cos();

    let num_re = coefficients.b0 + coefficients.b1 * cos_1 + coefficients.b2 * cos_2;
    let num_im = -(coefficients.b1 * sin_1 + coefficients.b2 * sin_2);
    let den_re = 1.0 + coefficients.a1 * cos_1 + coefficients.a2 * cos_2;
    let den_im = -(coefficients.a1 * sin_1 + coefficients.a2 * sin_2);

    let num = (num_re * num_re + num_im * num_im).sqrt();
    let den = (den_re * den_re + den_im * den_im).sqrt();
    num / den.max(f64::MIN_POSITIVE)
}

/// Whether both poles of a section lie strictly inside the unit circle
///
/// Stability triangle for 1 + a1 z^-1 + a2 z^-2.
pub fn is_stable(coefficients: &Coefficients<f64>) -> bool {
    coefficients.a2.abs() < 1.0 && coefficients.a1.abs() < 1.0 + coefficients.a2
}
