mod heuristic;
mod maxrects;
mod rect;

pub use heuristic::PackingHeuristic;
pub use maxrects::MaxRectsPacker;
pub use rect::Rect;
