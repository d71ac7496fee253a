//! Pagination tabs for list views.

/// Pages shown on each side of the current one
pub const WINDOW_RADIUS: u32 = 2;

/// Zero-indexed page numbers to render as tabs.
///
/// Centered on `current` when possible, shifted near either end so that up to
/// `2 * WINDOW_RADIUS + 1` pages are shown, and clamped to `0..total`.
/// A `current` past the end is treated as the last page.
pub fn page_window(total: u32, current: u32) -> Vec<u32> {
    if total == 0 {
        return Vec::new();
    }

    let last = total - 1;
    let current = current.min(last);
    let span = 2 * WINDOW_RADIUS;

    let mut start = current.saturating_sub(WINDOW_RADIUS);
    let mut end = current.saturating_add(WINDOW_RADIUS).min(last);

    if current <= WINDOW_RADIUS {
        end = span.min(last);
    }
    if current.saturating_add(WINDOW_RADIUS) >= total {
        start = total.saturating_sub(1 + span);
    }

    (start..=end).collect()
}
