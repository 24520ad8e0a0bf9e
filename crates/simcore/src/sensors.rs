use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Binary state of one line sensor.
///
/// The wire encoding is inverted-intent: raw `0` means the sensor sees the
/// line, raw `1` means it does not. User control code receives the raw
/// values, so the inversion is part of the public contract and must not be
/// "fixed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorReading {
    /// Sensor window over the line (raw 0).
    OnLine,
    /// Sensor window off the line (raw 1).
    OffLine,
}

impl SensorReading {
    pub fn from_on_line(on_line: bool) -> Self {
        if on_line { SensorReading::OnLine } else { SensorReading::OffLine }
    }

    /// Raw value as seen by user control code: 0 = on line, 1 = off line.
    pub fn as_raw(self) -> u8 {
        match self {
            SensorReading::OnLine => 0,
            SensorReading::OffLine => 1,
        }
    }

    pub fn is_on_line(self) -> bool {
        self == SensorReading::OnLine
    }

    pub fn is_off_line(self) -> bool {
        self == SensorReading::OffLine
    }

    /// The opposite reading; noise injection flips between the two variants.
    pub fn inverted(self) -> Self {
        match self {
            SensorReading::OnLine => SensorReading::OffLine,
            SensorReading::OffLine => SensorReading::OnLine,
        }
    }
}

/// Sensor identifier → reading. A `BTreeMap` keeps iteration order stable
/// (left-to-right for the standard `s0..s{n-1}` naming).
pub type SensorMap = BTreeMap<String, SensorReading>;

/// Canonical identifier of the `index`-th sensor, counted left to right.
pub fn sensor_id(index: usize) -> String {
    format!("s{index}")
}
