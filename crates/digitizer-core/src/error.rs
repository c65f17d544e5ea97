// File: crates/digitizer-core/src/error.rs
// Summary: Error kinds surfaced by calibration, filtering and point extraction.

use thiserror::Error;

/// Which calibration axis an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AxisId {
    /// X in Cartesian mode, theta in polar mode.
    X,
    /// Y in Cartesian mode, radius in polar mode.
    Y,
}

impl std::fmt::Display for AxisId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AxisId::X => f.write_str("x/theta"),
            AxisId::Y => f.write_str("y/radius"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DigitizeError {
    /// Axis points are collinear or coincide, so no transform exists.
    #[error("axis points are degenerate: {0}")]
    AxisDegenerate(String),

    /// Calibration is incomplete; dependent operations stay disabled.
    #[error("calibration needs {need} axis points, only {have} defined")]
    NeedMoreAxisPoints { have: usize, need: usize },

    #[error("log scale on {axis} axis cannot represent value {value}")]
    LogDomain { axis: AxisId, value: f64 },

    #[error("more than 2 axis points assigned to the {axis} axis")]
    TooManyAxisPoints { axis: AxisId },

    /// Seed or sample pixel is not foreground in the mask.
    #[error("no foreground pixel at or near ({x}, {y})")]
    NoForegroundPixel { x: u32, y: u32 },

    #[error("log scale is not allowed for the theta axis")]
    ThetaLogScale,

    #[error("invalid grid line settings: {0}")]
    InvalidGridSettings(String),

    #[error("cannot parse '{input}' as a date/time value")]
    DateTimeParse { input: String },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// A long-running job observed its cancel token.
    #[error("operation cancelled")]
    Cancelled,

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DigitizeError>;
