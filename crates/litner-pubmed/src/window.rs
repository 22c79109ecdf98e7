//! Calendar windows over the requested publication-date range

use chrono::{Days, NaiveDate};

/// Length of one retrieval window in days
pub const WINDOW_DAYS: u64 = 7;

/// One calendar sub-range of the requested range plus its pagination cursor.
///
/// `first_day` and `last_day` are both inclusive, matching the `[pdat]`
/// range syntax of the search service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalWindow {
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
    /// Offset of the next page to request
    pub offset: usize,
    /// Match count reported by the most recent search page
    pub total_count: usize,
}

impl RetrievalWindow {
    fn new(first_day: NaiveDate, last_day: NaiveDate) -> Self {
        Self {
            first_day,
            last_day,
            offset: 0,
            total_count: 0,
        }
    }

    /// Search query restricted to this window's publication dates
    pub fn query(&self, term: &str) -> String {
        format!(
            "{term} AND ({}:{})[pdat]",
            self.first_day.format("%Y/%m/%d"),
            self.last_day.format("%Y/%m/%d")
        )
    }

    /// `<first>_to_<last>` with ISO dates
    pub fn label(&self) -> String {
        format!(
            "{}_to_{}",
            self.first_day.format("%Y-%m-%d"),
            self.last_day.format("%Y-%m-%d")
        )
    }

    /// Artifact file name for this window
    pub fn artifact_name(&self, prefix: &str) -> String {
        format!("{prefix}_{}.csv", self.label())
    }

    /// Whether the cursor has moved past the reported match count
    pub fn is_exhausted(&self) -> bool {
        self.offset >= self.total_count
    }
}

/// Split `[start, end)` into consecutive 7-day windows.
///
/// The final window is clipped so that it ends on the day before `end`.
/// An empty or inverted range yields no windows.
pub fn partition(start: NaiveDate, end: NaiveDate) -> Vec<RetrievalWindow> {
    let mut windows = Vec::new();
    let Some(last_allowed) = end.pred_opt() else {
        return windows;
    };

    let mut first_day = start;
    while first_day < end {
        let last_day = first_day
            .checked_add_days(Days::new(WINDOW_DAYS - 1))
            .map_or(last_allowed, |d| d.min(last_allowed));
        windows.push(RetrievalWindow::new(first_day, last_day));

        match last_day.succ_opt() {
            Some(next) => first_day = next,
            None => break,
        }
    }
    windows
}
