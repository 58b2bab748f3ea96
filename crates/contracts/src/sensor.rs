//! Sensor kinds and telemetry records
//!
//! Typed view of the three record kinds exchanged between producers,
//! the FDIR hub and the GNC consumer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Compile-time upper bound on redundant copies per sensor kind.
pub const MAX_REDUNDANCY: usize = 4;

/// Encoded size of an IMU record (7 doubles, 1 int, 4 bytes tail padding).
pub const IMU_RECORD_SIZE: usize = 64;

/// Encoded size of a GNSS record (7 doubles, 1 int, 4 bytes tail padding).
pub const GNSS_RECORD_SIZE: usize = 64;

/// Encoded size of a star tracker record (5 doubles).
pub const STAR_TRACKER_RECORD_SIZE: usize = 40;

/// Sensor kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Inertial measurement unit
    Imu,
    /// Satellite navigation receiver
    Gnss,
    /// Star tracker
    #[serde(alias = "str")]
    StarTracker,
}

impl SensorKind {
    /// All kinds, in GNC interface order
    pub const ALL: [SensorKind; 3] = [SensorKind::Imu, SensorKind::Gnss, SensorKind::StarTracker];

    /// Fixed wire size of a record of this kind
    pub const fn record_size(self) -> usize {
        match self {
            SensorKind::Imu => IMU_RECORD_SIZE,
            SensorKind::Gnss => GNSS_RECORD_SIZE,
            SensorKind::StarTracker => STAR_TRACKER_RECORD_SIZE,
        }
    }

    /// Short lowercase name used in logs and metric labels
    pub const fn as_str(self) -> &'static str {
        match self {
            SensorKind::Imu => "imu",
            SensorKind::Gnss => "gnss",
            SensorKind::StarTracker => "star_tracker",
        }
    }
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// IMU record: velocity and angle increments over `t_inc` seconds
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ImuRecord {
    /// Velocity increment (m/s)
    pub vel_inc: [f64; 3],

    /// Angle increment (rad)
    pub ang_inc: [f64; 3],

    /// Integration interval (s)
    pub t_inc: f64,

    /// Non-zero when the unit reports the sample as valid
    pub validity: i32,
}

/// GNSS record
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GnssRecord {
    /// Geodetic position (m)
    pub position_m: [f64; 3],

    /// ENU velocity (m/s)
    pub velocity_enu_m_s: [f64; 3],

    /// Dilution of precision
    pub dop: f64,

    /// Non-zero when the receiver has a valid fix
    pub validity: i32,
}

/// Star tracker record
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StarTrackerRecord {
    /// Measurement time tag (s)
    pub time_tag: f64,

    /// Attitude quaternion
    pub quaternion: [f64; 4],
}

/// One telemetry record of any kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SensorRecord {
    Imu(ImuRecord),
    Gnss(GnssRecord),
    StarTracker(StarTrackerRecord),
}

impl SensorRecord {
    /// Kind tag of this record
    pub fn kind(&self) -> SensorKind {
        match self {
            SensorRecord::Imu(_) => SensorKind::Imu,
            SensorRecord::Gnss(_) => SensorKind::Gnss,
            SensorRecord::StarTracker(_) => SensorKind::StarTracker,
        }
    }

    /// Validity flag, `None` for kinds that do not carry one
    pub fn validity(&self) -> Option<bool> {
        match self {
            SensorRecord::Imu(r) => Some(r.validity != 0),
            SensorRecord::Gnss(r) => Some(r.validity != 0),
            SensorRecord::StarTracker(_) => None,
        }
    }
}

impl From<ImuRecord> for SensorRecord {
    fn from(r: ImuRecord) -> Self {
        SensorRecord::Imu(r)
    }
}

impl From<GnssRecord> for SensorRecord {
    fn from(r: GnssRecord) -> Self {
        SensorRecord::Gnss(r)
    }
}

impl From<StarTrackerRecord> for SensorRecord {
    fn from(r: StarTrackerRecord) -> Self {
        SensorRecord::StarTracker(r)
    }
}
