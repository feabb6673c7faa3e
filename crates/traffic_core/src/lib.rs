pub mod congestion;
pub mod geo;
pub mod geocode;
pub mod grid;
pub mod matching;
pub mod rides;
pub mod routing;
pub mod services;
pub mod telemetry;
