//! Intersection geometry
//!
//! Hosts that have no native observer (headless runs, simulations) compute
//! intersections with these helpers. Semantics follow the browser model:
//! the root box is grown (or shrunk) by the root margin, the ratio is the
//! visible share of the target's area, and a change is reported only when
//! a threshold is crossed.

use zzload_core::RootMargin;

/// Axis-aligned box in CSS pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// Same box moved by (dx, dy)
    pub fn translate(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Grow by a root margin. Percentages resolve against this box.
    pub fn expand(&self, margin: &RootMargin) -> Rect {
        let top = margin.top.resolve(self.height);
        let bottom = margin.bottom.resolve(self.height);
        let left = margin.left.resolve(self.width);
        let right = margin.right.resolve(self.width);
        Rect::new(
            self.x - left,
            self.y - top,
            self.width + left + right,
            self.height + top + bottom,
        )
    }

    /// Overlap, including edge-adjacent (zero-area) overlap
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < x || bottom < y {
            return None;
        }
        Some(Rect::new(x, y, right - x, bottom - y))
    }
}

/// Visible share of `target` inside `root` grown by `margin`, and whether
/// the two touch at all
pub fn intersection_ratio(target: &Rect, root: &Rect, margin: &RootMargin) -> (f64, bool) {
    let root = root.expand(margin);
    match target.intersection(&root) {
        None => (0.0, false),
        Some(overlap) => {
            let area = target.area();
            if area == 0.0 {
                (1.0, true)
            } else {
                ((overlap.area() / area).clamp(0.0, 1.0), true)
            }
        }
    }
}

/// Sorted threshold list
#[derive(Clone, Debug, PartialEq)]
pub struct Thresholds(Vec<f64>);

impl Thresholds {
    pub fn new(mut values: Vec<f64>) -> Self {
        values.sort_by(f64::total_cmp);
        values.dedup();
        if values.is_empty() {
            values.push(0.0);
        }
        Thresholds(values)
    }

    pub fn values(&self) -> &[f64] {
        &self.0
    }

    /// How many thresholds the state satisfies. A zero threshold is
    /// satisfied by any intersection, including zero-area.
    pub fn level(&self, ratio: f64, intersecting: bool) -> usize {
        self.0
            .iter()
            .filter(|t| {
                if **t == 0.0 {
                    intersecting
                } else {
                    intersecting && ratio >= **t
                }
            })
            .count()
    }

    /// Should moving from `prev` to `next` produce an entry?
    pub fn crossed(&self, prev: (f64, bool), next: (f64, bool)) -> bool {
        self.level(prev.0, prev.1) != self.level(next.0, next.1)
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds(vec![0.0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zzload_core::Length;

    const VIEWPORT: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 800.0,
        height: 600.0,
    };

    #[test]
    fn test_ratio_partial() {
        let target = Rect::new(0.0, 500.0, 100.0, 200.0);
        let (ratio, hit) = intersection_ratio(&target, &VIEWPORT, &RootMargin::default());
        assert!(hit);
        assert!((ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_ratio_outside() {
        let target = Rect::new(0.0, 700.0, 100.0, 100.0);
        assert_eq!(
            intersection_ratio(&target, &VIEWPORT, &RootMargin::default()),
            (0.0, false)
        );
    }

    #[test]
    fn test_margin_pulls_target_in() {
        let target = Rect::new(0.0, 650.0, 100.0, 100.0);
        let margin = RootMargin::uniform(Length::Px(100.0));
        let (ratio, hit) = intersection_ratio(&target, &VIEWPORT, &margin);
        assert!(hit);
        assert!((ratio - 0.5).abs() < 1e-9);

        let percent = RootMargin::parse("0px 0px 25%").unwrap();
        assert_eq!(VIEWPORT.expand(&percent).bottom(), 750.0);
    }

    #[test]
    fn test_edge_contact_counts_as_intersecting() {
        let target = Rect::new(0.0, 600.0, 100.0, 100.0);
        let (ratio, hit) = intersection_ratio(&target, &VIEWPORT, &RootMargin::default());
        assert!(hit);
        assert_eq!(ratio, 0.0);
    }

    #[test]
    fn test_thresholds_crossing() {
        let t = Thresholds::new(vec![0.5, 0.0, 0.5]);
        assert_eq!(t.values(), &[0.0, 0.5]);

        assert!(t.crossed((0.0, false), (0.1, true)));
        assert!(!t.crossed((0.1, true), (0.4, true)));
        assert!(t.crossed((0.4, true), (0.6, true)));
        assert!(t.crossed((0.6, true), (0.0, false)));
        assert!(!t.crossed((0.0, false), (0.0, false)));
    }
}
