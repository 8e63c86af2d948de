use crate::types::{Rect, Vec2};

#[derive(Debug)]
struct SnapCandidate {
    offset: f32,
    distance: f32,
}

/// Find the best snap position for a dragged bar.
/// `others` are the rects of the other bars plus the viewport itself.
/// Returns the new top-left corner if snapping should occur.
pub fn find_snap_position(dragged: Rect, others: &[Rect], threshold: u16) -> Option<Vec2> {
    if threshold == 0 {
        return None; // Snapping disabled
    }

    let mut best_x: Option<SnapCandidate> = None;
    let mut best_y: Option<SnapCandidate> = None;
    let threshold = f32::from(threshold);

    for other in others {
        // Left edge to right edge of other, right to left, then alignments
        check_snap(&mut best_x, dragged.left(), other.right(), threshold);
        check_snap(&mut best_x, dragged.right(), other.left(), threshold);
        check_snap(&mut best_x, dragged.left(), other.left(), threshold);
        check_snap(&mut best_x, dragged.right(), other.right(), threshold);

        check_snap(&mut best_y, dragged.top(), other.bottom(), threshold);
        check_snap(&mut best_y, dragged.bottom(), other.top(), threshold);
        check_snap(&mut best_y, dragged.top(), other.top(), threshold);
        check_snap(&mut best_y, dragged.bottom(), other.bottom(), threshold);
    }

    if best_x.is_none() && best_y.is_none() {
        return None;
    }
    Some(Vec2::new(
        dragged.min.x + best_x.map_or(0.0, |s| s.offset),
        dragged.min.y + best_y.map_or(0.0, |s| s.offset),
    ))
}

fn check_snap(best: &mut Option<SnapCandidate>, edge: f32, target: f32, threshold: f32) {
    let distance = (edge - target).abs();
    if distance <= threshold {
        let candidate = SnapCandidate {
            offset: target - edge,
            distance,
        };

        // Keep the closest
        if best.as_ref().is_none_or(|b| candidate.distance < b.distance) {
            *best = Some(candidate);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::from_min_size(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn test_snaps_to_neighbour_edge() {
        let other = rect(100.0, 100.0, 200.0, 40.0);
        let dragged = rect(306.0, 120.0, 100.0, 40.0);
        let snapped = find_snap_position(dragged, &[other], 10).unwrap();
        assert_eq!(snapped, Vec2::new(300.0, 120.0));
    }

    #[test]
    fn test_snaps_to_viewport_corner() {
        let viewport = rect(0.0, 0.0, 1920.0, 1080.0);
        let dragged = rect(4.0, 1036.0, 100.0, 40.0);
        assert_eq!(find_snap_position(dragged, &[viewport], 8), Some(Vec2::new(0.0, 1040.0)));
    }

    #[test]
    fn test_out_of_range_or_disabled() {
        let other = rect(0.0, 0.0, 10.0, 10.0);
        let dragged = rect(500.0, 500.0, 10.0, 10.0);
        assert_eq!(find_snap_position(dragged, &[other], 15), None);
        assert_eq!(find_snap_position(rect(11.0, 0.0, 10.0, 10.0), &[other], 0), None);
    }
}
