use serde::{Deserialize, Serialize};

use crate::{ConfError, Degrees, Meter};

fn default_buffer_distance() -> Meter {
    15.0
}
fn default_angular_threshold() -> Degrees {
    30.0
}
fn default_hausdorff_threshold() -> Meter {
    17.0
}
fn default_percent_removed_threshold() -> f64 {
    20.0
}
fn default_meters_removed_threshold() -> Meter {
    5.0
}
fn default_min_clip_length() -> Meter {
    1.0
}
fn default_snap_tolerance() -> Meter {
    0.01
}

/// Thresholds for one matching run.
///
/// `max_passes` has no default and must always be given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConf {
    /// Search radius around a reference line.
    #[serde(default = "default_buffer_distance")]
    pub buffer_distance: Meter,
    /// Candidates at this angle or more are not matched.
    #[serde(default = "default_angular_threshold")]
    pub angular_threshold: Degrees,
    /// Candidates at this Hausdorff distance or more are not matched.
    #[serde(default = "default_hausdorff_threshold")]
    pub hausdorff_threshold: Meter,
    /// A match is partial when more than this percentage...
    #[serde(default = "default_percent_removed_threshold")]
    pub percent_removed_threshold: f64,
    /// ...and more than this many meters of the reference were clipped away.
    #[serde(default = "default_meters_removed_threshold")]
    pub meters_removed_threshold: Meter,
    /// Clips shorter than this only cross the reference and are discarded.
    #[serde(default = "default_min_clip_length")]
    pub min_clip_length: Meter,
    #[serde(default = "default_snap_tolerance")]
    pub snap_tolerance: Meter,
    /// Cut both networks into segments of this length before matching.
    #[serde(default)]
    pub segment_length: Option<Meter>,
    pub max_passes: usize,
    /// Remainder pieces shorter than this are dropped, defaults to `min_clip_length`.
    #[serde(default)]
    pub min_remainder_length: Option<Meter>,
}

impl MatchConf {
    pub fn new(max_passes: usize) -> Self {
        Self {
            buffer_distance: default_buffer_distance(),
            angular_threshold: default_angular_threshold(),
            hausdorff_threshold: default_hausdorff_threshold(),
            percent_removed_threshold: default_percent_removed_threshold(),
            meters_removed_threshold: default_meters_removed_threshold(),
            min_clip_length: default_min_clip_length(),
            snap_tolerance: default_snap_tolerance(),
            segment_length: None,
            max_passes,
            min_remainder_length: None,
        }
    }

    pub fn with_segment_length(mut self, length: Meter) -> Self {
        self.segment_length = Some(length);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfError> {
        let conf: Self = serde_json::from_str(json).map_err(|e| ConfError::Parse(e.to_string()))?;
        conf.validate()?;
        Ok(conf)
    }

    pub fn remainder_floor(&self) -> Meter {
        self.min_remainder_length.unwrap_or(self.min_clip_length)
    }

    pub fn validate(&self) -> Result<(), ConfError> {
        let positive = [
            ("buffer_distance", self.buffer_distance),
            ("hausdorff_threshold", self.hausdorff_threshold),
            ("meters_removed_threshold", self.meters_removed_threshold),
            ("min_clip_length", self.min_clip_length),
            ("snap_tolerance", self.snap_tolerance),
        ]
        .into_iter()
        .chain(self.segment_length.map(|l| ("segment_length", l)))
        .chain(self.min_remainder_length.map(|l| ("min_remainder_length", l)));

        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfError::NotPositive { name, value });
            }
        }

        let angle = self.angular_threshold;
        if !angle.is_finite() || angle <= 0.0 || angle > 90.0 {
            return Err(ConfError::AngleOutOfRange(angle));
        }
        let percent = self.percent_removed_threshold;
        if !percent.is_finite() || percent <= 0.0 || percent > 100.0 {
            return Err(ConfError::PercentOutOfRange(percent));
        }
        if self.max_passes == 0 {
            return Err(ConfError::NoPasses);
        }
        Ok(())
    }
}
