mod dijkstra;
mod route;
mod router;

pub use route::{Route, RouteEdge, RouteQuery, RouteWarning};
pub use router::ShadeRouter;
