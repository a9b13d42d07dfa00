/// Default detector confidence floor, matching the stock YOLO predict threshold.
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.25;

/// Default sliding-window length for the majority decision rule.
pub const DEFAULT_WINDOW_SIZE: usize = 5;

/// Default smoothing factor for the exponential decision rule.
pub const DEFAULT_EMA_ALPHA: f64 = 0.5;

/// Evidence score at or above which a smoothed slot is reported occupied.
pub const OCCUPIED_SCORE_THRESHOLD: f64 = 0.5;

/// Distance in pixels within which a reference point counts as on an edge.
pub const BOUNDARY_TOLERANCE_PX: f64 = 1e-9;

/// Minimum vertex count for a slot polygon.
pub const MIN_POLYGON_VERTICES: usize = 3;
