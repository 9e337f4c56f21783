//! Calendar month view
//!
//! Monday-first month grid with the gardens of that month attached to
//! their days.

use chrono::{Datelike, NaiveDate, Utc};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::entries::JournalApi;
use crate::graphql::{Garden, GraphQlResult};
use crate::period::{Period, PeriodError};

/// Column headers for the grid
pub const WEEKDAY_HEADERS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// A calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    /// 1-based
    pub month: u32,
}

impl YearMonth {
    /// `None` if `month` is not 1–12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        (1..=12).contains(&month).then_some(Self { year, month })
    }

    pub fn current() -> Self {
        Self::containing(Utc::now().date_naive())
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn prev(&self) -> Self {
        if self.month == 1 {
            Self {
                year: self.year - 1,
                month: 12,
            }
        } else {
            Self {
                year: self.year,
                month: self.month - 1,
            }
        }
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// MONTH period key, `YYYY-MM`
    pub fn month_key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    /// DAY period key for `day` of this month
    pub fn day_key(&self, day: u32) -> String {
        format!("{:04}-{:02}-{:02}", self.year, self.month, day)
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn days_in_month(&self) -> u32 {
        let next = self.next();
        match (self.first_day(), next.first_day()) {
            (Some(first), Some(next_first)) => (next_first - first).num_days() as u32,
            _ => 0,
        }
    }

    /// Month name, e.g. "March"
    pub fn month_name(&self) -> String {
        self.first_day()
            .map(|d| d.format("%B").to_string())
            .unwrap_or_default()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month_name(), self.year)
    }
}

impl FromStr for YearMonth {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Period::Month.validate_key(s)?;

        let invalid = || PeriodError::InvalidKey {
            period: Period::Month,
            key: s.to_string(),
        };
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).ok_or_else(invalid)
    }
}

/// Grid cells for a month: `None` for blanks, `Some(day)` otherwise
///
/// Weeks start on Monday. The grid is padded with trailing blanks to a
/// whole number of weeks.
pub fn month_cells(ym: YearMonth) -> Vec<Option<u32>> {
    let first = match ym.first_day() {
        Some(d) => d,
        None => return Vec::new(),
    };

    let leading = first.weekday().num_days_from_monday() as usize;
    let days = ym.days_in_month();

    let mut cells = Vec::with_capacity(42);
    cells.extend(std::iter::repeat(None).take(leading));
    cells.extend((1..=days).map(Some));
    while cells.len() % 7 != 0 {
        cells.push(None);
    }
    cells
}

/// One image in the month's preview gallery
#[derive(Debug, Clone, PartialEq)]
pub struct GalleryItem {
    pub day_key: String,
    pub public_id: String,
    pub summary: Option<String>,
    pub share_url: Option<String>,
}

/// A month of gardens, indexed by day key
#[derive(Debug, Clone)]
pub struct MonthView {
    month: YearMonth,
    gardens: HashMap<String, Garden>,
}

impl MonthView {
    /// Fetch the gardens for `month`
    pub async fn load(api: &dyn JournalApi, month: YearMonth) -> GraphQlResult<Self> {
        let gardens = api.gardens_by_month(&month.month_key()).await?;
        tracing::debug!(month = %month.month_key(), count = gardens.len(), "Loaded month gardens");
        Ok(Self::from_gardens(month, gardens))
    }

    /// Later gardens with the same key replace earlier ones
    pub fn from_gardens(month: YearMonth, gardens: Vec<Garden>) -> Self {
        let gardens = gardens
            .into_iter()
            .map(|g| (g.period_key.clone(), g))
            .collect();
        Self { month, gardens }
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }

    pub fn len(&self) -> usize {
        self.gardens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gardens.is_empty()
    }

    pub fn garden_for_day(&self, day: u32) -> Option<&Garden> {
        self.gardens.get(&self.month.day_key(day))
    }

    /// Grid cells paired with their garden
    pub fn cells(&self) -> Vec<Option<(u32, Option<&Garden>)>> {
        month_cells(self.month)
            .into_iter()
            .map(|cell| cell.map(|day| (day, self.garden_for_day(day))))
            .collect()
    }

    /// Gardens that have an image, in day order
    pub fn gallery(&self) -> Vec<GalleryItem> {
        let mut items: Vec<GalleryItem> = self
            .gardens
            .values()
            .filter_map(|g| {
                let public_id = g.public_id.clone().filter(|id| !id.is_empty())?;
                Some(GalleryItem {
                    day_key: g.period_key.clone(),
                    public_id,
                    summary: g.summary.clone(),
                    share_url: g.share_url.clone(),
                })
            })
            .collect();
        items.sort_by(|a, b| a.day_key.cmp(&b.day_key));
        items
    }
}
