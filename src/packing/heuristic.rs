/// Rule used to pick which free rectangle receives a new placement
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PackingHeuristic {
    /// Best Short Side Fit - minimizes the shorter leftover side
    #[default]
    BestShortSideFit,
    /// Best Long Side Fit - minimizes the longer leftover side
    BestLongSideFit,
    /// Best Area Fit - picks the smallest free rectangle
    BestAreaFit,
    /// Bottom Left - Tetris-style packing, lowest top edge then lowest x
    BottomLeft,
    /// Contact Point - maximizes contact with placed rectangles and bin edges
    ContactPoint,
}

impl PackingHeuristic {
    pub const ALL: [PackingHeuristic; 5] = [
        PackingHeuristic::BestShortSideFit,
        PackingHeuristic::BestLongSideFit,
        PackingHeuristic::BestAreaFit,
        PackingHeuristic::BottomLeft,
        PackingHeuristic::ContactPoint,
    ];
}
