//! Capsule frame model.

/// Everything a capsule sink needs to render one state of the notification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CapsuleFrame {
    /// Source app display name.
    pub title: String,
    /// Marquee window shown in the chip.
    pub short_text: String,
    /// Full current lyric line for the expanded notification body.
    pub body: String,
    /// Playback progress in percent, `None` when the duration is unknown.
    pub progress: Option<u8>,
}

impl CapsuleFrame {
    pub fn new(
        title: impl Into<String>,
        short_text: impl Into<String>,
        body: impl Into<String>,
        progress: Option<u8>,
    ) -> Self {
        Self {
            title: title.into(),
            short_text: short_text.into(),
            body: body.into(),
            progress,
        }
    }
}

/// Playback position as a whole percentage of the duration.
///
/// Returns `None` for a non-positive duration. Positions outside the track
/// (seek races, live streams) are clamped into `0..=100`.
pub fn progress_percent(position_ms: i64, duration_ms: i64) -> Option<u8> {
    if duration_ms <= 0 {
        return None;
    }
    let pct = (position_ms as f64 / duration_ms as f64 * 100.0) as i64;
    Some(pct.clamp(0, 100) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_duration_has_no_progress() {
        assert_eq!(progress_percent(1000, 0), None);
        assert_eq!(progress_percent(1000, -5), None);
    }

    #[test]
    fn truncates_to_whole_percent() {
        assert_eq!(progress_percent(0, 200_000), Some(0));
        assert_eq!(progress_percent(99_999, 200_000), Some(49));
        assert_eq!(progress_percent(200_000, 200_000), Some(100));
    }

    #[test]
    fn out_of_range_positions_are_clamped() {
        assert_eq!(progress_percent(250_000, 200_000), Some(100));
        assert_eq!(progress_percent(-10, 200_000), Some(0));
    }
}
