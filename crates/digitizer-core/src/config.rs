// File: crates/digitizer-core/src/config.rs
// Summary: Aggregate algorithm settings with defaults and JSON loading.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::mask::GridRemovalSettings;
use crate::ordering::CurveOrderer;
use crate::point_match::PointMatchSettings;
use crate::segment::{SegmentFillSettings, SegmentFillTracer};
use crate::types::{DEFAULT_HISTOGRAM_BUCKETS, DEFAULT_MAX_GRID_LINES, DEFAULT_RELATION_TOLERANCE_PX};

/// Settings shared by every curve of a document. Missing JSON fields take defaults.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigitizerConfig {
    pub segment_fill: SegmentFillSettings,
    pub point_match: PointMatchSettings,
    pub grid_removal: GridRemovalSettings,
    pub max_grid_lines: usize,
    pub relation_tolerance_px: f64,
    pub histogram_buckets: usize,
}

impl Default for DigitizerConfig {
    fn default() -> Self {
        Self {
            segment_fill: SegmentFillSettings::default(),
            point_match: PointMatchSettings::default(),
            grid_removal: GridRemovalSettings::default(),
            max_grid_lines: DEFAULT_MAX_GRID_LINES,
            relation_tolerance_px: DEFAULT_RELATION_TOLERANCE_PX,
            histogram_buckets: DEFAULT_HISTOGRAM_BUCKETS,
        }
    }
}

impl DigitizerConfig {
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.segment_fill.validate()?;
        self.point_match.validate()?;
        Ok(())
    }

    pub fn tracer(&self) -> SegmentFillTracer {
        SegmentFillTracer::new(self.segment_fill)
    }

    pub fn orderer(&self) -> CurveOrderer {
        CurveOrderer::new(self.relation_tolerance_px)
    }
}
