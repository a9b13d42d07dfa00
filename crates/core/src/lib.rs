//! Parking slot occupancy from object detections.
//!
//! Detections for a frame are mapped onto calibrated slot polygons by the
//! [`occupancy::domain::occupancy_classifier`] and stabilized across frames by
//! the [`occupancy::domain::temporal_aggregator`].

pub mod shared {
    pub mod constants;
    pub mod detection;
    pub mod polygon;
}

pub mod occupancy {
    pub mod domain {
        pub mod decision_rule;
        pub mod occupancy_classifier;
        pub mod occupancy_frame;
        pub mod occupancy_state;
        pub mod region;
        pub mod region_registry;
        pub mod temporal_aggregator;
    }
}

pub mod detection {
    pub mod domain {
        pub mod detection_source;
    }
    pub mod infrastructure;
}

pub mod pipeline {
    pub mod lot_config;
    pub mod monitor_lot_use_case;
}
