pub mod heatmap;
pub mod ride_match;
pub mod route_congestion;

pub use heatmap::{HeatmapCell, HeatmapService};
pub use ride_match::{MatchQuery, RideMatchError, RideMatchService, DEFAULT_MATCH_RADIUS_KM};
pub use route_congestion::{
    RouteAnalysisConfig, RouteCongestionError, RouteCongestionService, RouteReport,
    DEFAULT_CORRIDOR_MARGIN_DEG, DEFAULT_ROAD_CAPACITY,
};
