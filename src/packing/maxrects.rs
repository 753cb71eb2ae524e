use log::trace;

use super::{PackingHeuristic, Rect};

/// Placement score, compared lexicographically; smaller is better
type Score = (i64, i64);

/// MaxRects bin packer implementation
#[derive(Debug, Clone)]
pub struct MaxRectsPacker {
    bin_width: u32,
    bin_height: u32,
    allow_rotations: bool,
    used_rects: Vec<Rect>,
    free_rects: Vec<Rect>,
}

impl MaxRectsPacker {
    pub fn new(width: u32, height: u32) -> Self {
        let initial_rect = Rect::new(0, 0, width, height);
        Self {
            bin_width: width,
            bin_height: height,
            allow_rotations: false,
            used_rects: Vec::new(),
            free_rects: vec![initial_rect],
        }
    }

    /// Also try the width/height-swapped orientation when scoring
    pub fn with_rotations(mut self, allow: bool) -> Self {
        self.allow_rotations = allow;
        self
    }

    pub fn bin_width(&self) -> u32 {
        self.bin_width
    }

    pub fn bin_height(&self) -> u32 {
        self.bin_height
    }

    pub fn used_rects(&self) -> &[Rect] {
        &self.used_rects
    }

    pub fn free_rects(&self) -> &[Rect] {
        &self.free_rects
    }

    /// Try to insert a rectangle with the given dimensions.
    /// Returns the placed rectangle if successful, `None` if no free
    /// rectangle can hold it or the request has zero area.
    pub fn insert(&mut self, width: u32, height: u32, heuristic: PackingHeuristic) -> Option<Rect> {
        if width == 0 || height == 0 {
            return None;
        }
        let (best_rect, _) = self.find_position(width, height, heuristic)?;
        self.place_rect(best_rect);
        Some(best_rect)
    }

    /// Insert a set of rectangles, always placing the globally best-scoring
    /// remaining request next. Stops at the first round where nothing fits.
    ///
    /// Returns `(input index, placement)` pairs in placement order.
    pub fn insert_batch(
        &mut self,
        sizes: &[(u32, u32)],
        heuristic: PackingHeuristic,
    ) -> Vec<(usize, Rect)> {
        let mut remaining: Vec<usize> = (0..sizes.len())
            .filter(|&i| sizes[i].0 > 0 && sizes[i].1 > 0)
            .collect();
        let mut placed = Vec::with_capacity(remaining.len());

        loop {
            let mut best: Option<(usize, Rect, Score)> = None;
            for (pos, &index) in remaining.iter().enumerate() {
                let (width, height) = sizes[index];
                if let Some((rect, score)) = self.find_position(width, height, heuristic) {
                    if best.as_ref().is_none_or(|(_, _, s)| score < *s) {
                        best = Some((pos, rect, score));
                    }
                }
            }

            let Some((pos, rect, _)) = best else {
                break;
            };
            self.place_rect(rect);
            placed.push((remaining.remove(pos), rect));
        }

        placed
    }

    /// Release a previously placed rectangle.
    ///
    /// Adjacent free rectangles are not merged, so heavy remove/insert
    /// churn fragments the free list.
    pub fn remove(&mut self, rect: &Rect) -> bool {
        let Some(pos) = self.used_rects.iter().position(|r| r == rect) else {
            return false;
        };
        self.used_rects.remove(pos);
        self.free_rects.push(*rect);
        self.prune_free_rects();
        true
    }

    /// Check if a rectangle of the given size can fit
    pub fn can_fit(&self, width: u32, height: u32) -> bool {
        self.free_rects.iter().any(|r| {
            (width <= r.width && height <= r.height)
                || (self.allow_rotations && height <= r.width && width <= r.height)
        })
    }

    fn orientations(&self, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
        let rotated = (self.allow_rotations && width != height).then_some((height, width));
        std::iter::once((width, height)).chain(rotated)
    }

    fn find_position(
        &self,
        width: u32,
        height: u32,
        heuristic: PackingHeuristic,
    ) -> Option<(Rect, Score)> {
        let mut best_score = (i64::MAX, i64::MAX);
        let mut best_rect = None;

        for free_rect in &self.free_rects {
            for (w, h) in self.orientations(width, height) {
                if w <= free_rect.width && h <= free_rect.height {
                    let candidate = Rect::new(free_rect.x, free_rect.y, w, h);
                    let score = self.score_rect(free_rect, &candidate, heuristic);
                    if score < best_score {
                        best_score = score;
                        best_rect = Some(candidate);
                    }
                }
            }
        }

        best_rect.map(|rect| (rect, best_score))
    }

    fn score_rect(&self, free_rect: &Rect, candidate: &Rect, heuristic: PackingHeuristic) -> Score {
        let leftover_h = i64::from(free_rect.width - candidate.width);
        let leftover_v = i64::from(free_rect.height - candidate.height);
        let short = leftover_h.min(leftover_v);
        let long = leftover_h.max(leftover_v);

        match heuristic {
            PackingHeuristic::BestShortSideFit => (short, long),
            PackingHeuristic::BestLongSideFit => (long, short),
            PackingHeuristic::BestAreaFit => {
                let area_fit = i64::try_from(free_rect.area() - candidate.area()).unwrap_or(i64::MAX);
                (area_fit, short)
            }
            PackingHeuristic::BottomLeft => {
                let top = i64::from(candidate.bottom());
                let left = i64::from(candidate.x);
                (top, left)
            }
            // Bigger contact is better, so negate it for the minimizing comparison
            PackingHeuristic::ContactPoint => (-self.contact_score(candidate), 0),
        }
    }

    /// Total edge length shared with the bin border and with used rectangles
    fn contact_score(&self, rect: &Rect) -> i64 {
        let mut score = 0i64;

        if rect.x == 0 || rect.right() == self.bin_width {
            score += i64::from(rect.height);
        }
        if rect.y == 0 || rect.bottom() == self.bin_height {
            score += i64::from(rect.width);
        }

        for used in &self.used_rects {
            if used.x == rect.right() || used.right() == rect.x {
                score += i64::from(common_interval(used.y, used.bottom(), rect.y, rect.bottom()));
            }
            if used.y == rect.bottom() || used.bottom() == rect.y {
                score += i64::from(common_interval(used.x, used.right(), rect.x, rect.right()));
            }
        }

        score
    }

    fn place_rect(&mut self, rect: Rect) {
        let mut new_rects = Vec::new();

        self.free_rects.retain(|free_rect| {
            if !rect.intersects(free_rect) {
                return true;
            }

            // Split the free rectangle around the placed rectangle
            // Top portion
            if rect.y > free_rect.y {
                new_rects.push(Rect::new(
                    free_rect.x,
                    free_rect.y,
                    free_rect.width,
                    rect.y - free_rect.y,
                ));
            }

            // Bottom portion
            if rect.bottom() < free_rect.bottom() {
                new_rects.push(Rect::new(
                    free_rect.x,
                    rect.bottom(),
                    free_rect.width,
                    free_rect.bottom() - rect.bottom(),
                ));
            }

            // Left portion
            if rect.x > free_rect.x {
                new_rects.push(Rect::new(
                    free_rect.x,
                    free_rect.y,
                    rect.x - free_rect.x,
                    free_rect.height,
                ));
            }

            // Right portion
            if rect.right() < free_rect.right() {
                new_rects.push(Rect::new(
                    rect.right(),
                    free_rect.y,
                    free_rect.right() - rect.right(),
                    free_rect.height,
                ));
            }

            false
        });

        self.free_rects.extend(new_rects);
        self.prune_free_rects();
        self.used_rects.push(rect);

        trace!(
            "placed {:?}, {} free rects remain",
            rect,
            self.free_rects.len()
        );
    }

    /// Remove free rectangles that are fully contained within others.
    /// Order of the survivors is preserved so placement stays deterministic.
    fn prune_free_rects(&mut self) {
        let mut i = 0;
        while i < self.free_rects.len() {
            let mut removed_i = false;
            let mut j = i + 1;
            while j < self.free_rects.len() {
                if self.free_rects[j].contains(&self.free_rects[i]) {
                    self.free_rects.remove(i);
                    removed_i = true;
                    break;
                }
                if self.free_rects[i].contains(&self.free_rects[j]) {
                    self.free_rects.remove(j);
                } else {
                    j += 1;
                }
            }
            if !removed_i {
                i += 1;
            }
        }
    }

    /// Ratio of used area to bin area (0.0 to 1.0)
    pub fn occupancy(&self) -> f64 {
        let total_area = u64::from(self.bin_width) * u64::from(self.bin_height);
        if total_area == 0 {
            return 0.0;
        }
        let used_area: u64 = self.used_rects.iter().map(Rect::area).sum();
        used_area as f64 / total_area as f64
    }
}

/// Length of the overlap of two half-open intervals, 0 if they are disjoint
fn common_interval(a_start: u32, a_end: u32, b_start: u32, b_end: u32) -> u32 {
    if a_end < b_start || b_end < a_start {
        return 0;
    }
    a_end.min(b_end) - a_start.max(b_start)
}
