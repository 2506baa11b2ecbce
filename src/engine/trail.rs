use super::*;

/// Appends the post-move position, then evicts from the front until the trail
/// is back at `TRAIL_MAX`.
pub fn push_trail_point(trail: &mut VecDeque<Vec2>, point: Vec2) {
    trail.push_back(point);
    while trail.len() > TRAIL_MAX {
        trail.pop_front();
    }
}

/// Trail indices older than the recent window, in temporal order. Empty when
/// the trail is too short for the window to leave anything behind.
pub(super) fn settled_indices(trail: &VecDeque<Vec2>) -> std::ops::Range<usize> {
    0..trail.len().saturating_sub(RECENT_TRAIL_WINDOW)
}
