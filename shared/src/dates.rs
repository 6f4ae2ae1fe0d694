use chrono::NaiveDate;

/// Current wall-clock time as an RFC 3339 string, the format used for every
/// creation/upload timestamp.
pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Clamp a date range into an enclosing window: the start is raised to the
/// window start when it falls earlier, the end lowered to the window end when
/// it falls later. Absent dates and absent window bounds are left alone.
/// Returns the clamped pair plus whether either clamp fired.
pub fn clamp_to_window(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    window_start: Option<NaiveDate>,
    window_end: Option<NaiveDate>,
) -> (Option<NaiveDate>, Option<NaiveDate>, bool) {
    let mut adjusted = false;

    let start = match (start, window_start) {
        (Some(s), Some(ws)) if s < ws => {
            adjusted = true;
            Some(ws)
        }
        (s, _) => s,
    };

    let end = match (end, window_end) {
        (Some(e), Some(we)) if e > we => {
            adjusted = true;
            Some(we)
        }
        (e, _) => e,
    };

    (start, end, adjusted)
}
