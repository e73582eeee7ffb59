use crate::protocol::{CountQuery, DateRange, RankingQuery};
use chrono::{DateTime, Days, FixedOffset, Local, Months, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

const SECONDS_PER_DAY: i64 = 86_400;

/// Named date-range rules. `Manual` means the dates were typed in.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
pub enum Preset {
    #[strum(serialize = "Manual")]
    Manual,
    #[strum(serialize = "All")]
    All,
    #[strum(serialize = "1 Year", serialize = "1y")]
    OneYear,
    #[strum(serialize = "6 Months", serialize = "6m")]
    SixMonths,
    #[strum(serialize = "3 Months", serialize = "3m")]
    ThreeMonths,
    #[strum(serialize = "1 Month", serialize = "1m")]
    OneMonth,
    #[strum(serialize = "1 Week", serialize = "1w")]
    OneWeek,
}

impl Preset {
    /// Presets whose dates are a function of "today" alone.
    pub fn is_relative(self) -> bool {
        !matches!(self, Preset::Manual | Preset::All)
    }

    /// `(start, end)` for a relative preset; `None` for `Manual` and `All`.
    pub fn relative_range(self, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
        let start = match self {
            Preset::Manual | Preset::All => return None,
            Preset::OneYear => today.checked_sub_months(Months::new(12)),
            Preset::SixMonths => today.checked_sub_months(Months::new(6)),
            Preset::ThreeMonths => today.checked_sub_months(Months::new(3)),
            Preset::OneMonth => today.checked_sub_months(Months::new(1)),
            Preset::OneWeek => today.checked_sub_days(Days::new(7)),
        };
        Some((start.unwrap_or(NaiveDate::MIN), today))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AppFilter {
    #[default]
    All,
    App(i64),
}

impl AppFilter {
    pub fn app_id(self) -> Option<i64> {
        match self {
            AppFilter::All => None,
            AppFilter::App(id) => Some(id),
        }
    }
}

/// What data is currently requested.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub app: AppFilter,
    pub preset: Preset,
}

impl QueryState {
    /// The last `days` days ending today, every app, no preset.
    pub fn initial(today: NaiveDate, days: u32) -> Self {
        Self {
            start: Some(today.checked_sub_days(Days::new(days as u64)).unwrap_or(NaiveDate::MIN)),
            end: Some(today),
            app: AppFilter::All,
            preset: Preset::Manual,
        }
    }

    /// Any hand edit of a date drops the active preset.
    pub fn edit_start(&mut self, date: Option<NaiveDate>) {
        self.start = date;
        self.preset = Preset::Manual;
    }

    pub fn edit_end(&mut self, date: Option<NaiveDate>) {
        self.end = date;
        self.preset = Preset::Manual;
    }

    /// Applies a relative preset. Returns `false` (and changes nothing) for
    /// `Manual`/`All`, which are not derived from `today`.
    pub fn apply_relative(&mut self, preset: Preset, today: NaiveDate) -> bool {
        match preset.relative_range(today) {
            Some((start, end)) => {
                self.start = Some(start);
                self.end = Some(end);
                self.preset = preset;
                true
            }
            None => false,
        }
    }

    /// Overwrites both dates with the backend's observed bounds. An empty
    /// store leaves the range unbounded.
    pub fn apply_observed(&mut self, range: DateRange, offset: FixedOffset) {
        if range.is_empty() {
            self.start = None;
            self.end = None;
        } else {
            self.start = date_of(range.min, offset);
            self.end = date_of(range.max, offset);
        }
    }

    pub fn ranking_query(&self, offset: FixedOffset, limit: Option<u32>) -> RankingQuery {
        RankingQuery {
            start: self.start.map(|d| day_start(d, offset)),
            end: self.end.map(|d| day_end(d, offset)),
            app_id: self.app.app_id(),
            limit,
        }
    }

    pub fn count_query(&self, offset: FixedOffset) -> CountQuery {
        CountQuery {
            app_id: self.app.app_id(),
            start: self.start.map(|d| day_start(d, offset)),
            end: self.end.map(|d| day_end(d, offset)),
        }
    }
}

/// Unix seconds of local midnight starting `date`.
pub fn day_start(date: NaiveDate, offset: FixedOffset) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp() - offset.local_minus_utc() as i64
}

/// Unix seconds of 23:59:59 local on `date`.
pub fn day_end(date: NaiveDate, offset: FixedOffset) -> i64 {
    day_start(date, offset) + SECONDS_PER_DAY - 1
}

pub fn date_of(timestamp: i64, offset: FixedOffset) -> Option<NaiveDate> {
    DateTime::from_timestamp(timestamp, 0).map(|dt| dt.with_timezone(&offset).date_naive())
}

/// Source of "now" for presets and day boundaries.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<FixedOffset>;

    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    fn offset(&self) -> FixedOffset {
        *self.now().offset()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<FixedOffset>);

impl FixedClock {
    /// Noon UTC on the given day.
    pub fn on(date: NaiveDate) -> Self {
        let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN);
        Self(date.and_time(noon).and_utc().fixed_offset())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<FixedOffset> {
        self.0
    }
}
