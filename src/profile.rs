// Baby profile stored alongside the visit history.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BabyInfo {
    pub name: String,
    /// Birthday as `YYYY-MM-DD`.
    pub birthday: String,
}

impl BabyInfo {
    /// A profile is usable only when both fields are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.name.is_empty() && !self.birthday.is_empty()
    }
}

/// Age in whole months at `today`. Invalid or future birthdays count as 0.
pub fn age_in_months(birthday: &str, today: NaiveDate) -> u32 {
    let Ok(birth) = NaiveDate::parse_from_str(birthday, "%Y-%m-%d") else {
        return 0;
    };
    if birth > today {
        return 0;
    }

    let mut months =
        (today.year() - birth.year()) * 12 + (today.month() as i32 - birth.month() as i32);
    if today.day() < birth.day() {
        months -= 1;
    }

    months.max(0) as u32
}
