//! Temperature to drive level curves
//!
//! Both curve shapes pass through `(min_temp, min_stop)` and
//! `(max_temp, max_drive)`. Coefficients are computed once when the model is
//! built and reused for every evaluation.

use serde::Serialize;

use crate::config::{Algorithm, UnitConfig};

/// Absorbs floating error so that exact boundary values survive the floor.
const ROUNDING_EPSILON: f64 = 1e-9;

/// Precomputed polynomial coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CurveKind {
    /// `a * t + b`
    Linear { a: f64, b: f64 },
    /// `a * t^2 + b * t + c`
    Quadratic { a: f64, b: f64, c: f64 },
}

impl CurveKind {
    fn eval(&self, temp: f64) -> f64 {
        match *self {
            CurveKind::Linear { a, b } => a * temp + b,
            CurveKind::Quadratic { a, b, c } => a * temp * temp + b * temp + c,
        }
    }
}

/// Pure mapping from temperature to drive level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CurveModel {
    min_temp: i64,
    max_temp: i64,
    min_drive: i64,
    max_drive: i64,
    kind: CurveKind,
}

impl CurveModel {
    /// Build the curve selected by `config.algorithm`.
    ///
    /// The configuration is expected to be validated (`min_temp < max_temp`).
    pub fn from_config(config: &UnitConfig) -> Self {
        let min_temp = config.min_temp as f64;
        let max_temp = config.max_temp as f64;
        let min_stop = config.min_stop as f64;
        let max_drive = config.max_drive as f64;

        let kind = match config.algorithm {
            Algorithm::Linear => {
                let a = (max_drive - min_stop) / (max_temp - min_temp);
                let b = (min_stop + max_drive - a * (min_temp + max_temp)) / 2.0;
                CurveKind::Linear { a, b }
            }
            Algorithm::Quadratic => {
                let a = (max_drive - min_stop) / (max_temp - min_temp).powi(2);
                let b = -2.0 * min_temp * a;
                let c = (min_stop
                    + max_drive
                    + a * ((min_temp + max_temp).powi(2) - 2.0 * max_temp.powi(2)))
                    / 2.0;
                CurveKind::Quadratic { a, b, c }
            }
        };

        Self {
            min_temp: config.min_temp,
            max_temp: config.max_temp,
            min_drive: config.min_drive,
            max_drive: config.max_drive,
            kind,
        }
    }

    /// Drive level for a temperature.
    ///
    /// `min_drive` below `min_temp`, `max_drive` above `max_temp`, the
    /// polynomial in between. Fractional results are floored.
    pub fn evaluate(&self, temp: i64) -> i64 {
        if temp < self.min_temp {
            self.min_drive
        } else if temp > self.max_temp {
            self.max_drive
        } else {
            (self.kind.eval(temp as f64) + ROUNDING_EPSILON).floor() as i64
        }
    }

    /// Coefficients in use.
    pub fn kind(&self) -> CurveKind {
        self.kind
    }

    /// `(temperature, drive)` pairs from `from` to `to` inclusive.
    pub fn table(&self, from: i64, to: i64, step: i64) -> Vec<(i64, i64)> {
        let step = step.max(1);
        let mut points = Vec::new();
        let mut temp = from;
        while temp <= to {
            points.push((temp, self.evaluate(temp)));
            temp += step;
        }
        points
    }
}
