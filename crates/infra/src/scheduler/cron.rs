//! Five-field cron expressions (`MIN HOUR DOM MON DOW`).
//!
//! Each field accepts `*`, `N`, `A-B`, with an optional `/STEP`, and comma
//! lists of those. Day-of-week is 0-7 with both 0 and 7 meaning Sunday.
//! When day-of-month and day-of-week are both restricted, a day matches if
//! either one does.

use core::fmt;
use core::str::FromStr;

use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, TimeZone, Timelike, Utc,
};
use thiserror::Error;

/// How far ahead `next_after` searches before giving up (covers Feb 29 on a
/// given weekday).
const SEARCH_DAYS: u32 = 366 * 28;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CronError {
    #[error("cron expression needs 5 fields (MIN HOUR DOM MON DOW), got {0}")]
    FieldCount(usize),

    #[error("invalid {field} field '{value}': {reason}")]
    InvalidField {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// A parsed cron schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronSchedule {
    source: String,
    minutes: u64,
    hours: u64,
    days_of_month: u64,
    months: u64,
    days_of_week: u64,
    dom_wildcard: bool,
    dow_wildcard: bool,
}

struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
}

const MINUTE: FieldSpec = FieldSpec { name: "minute", min: 0, max: 59 };
const HOUR: FieldSpec = FieldSpec { name: "hour", min: 0, max: 23 };
const DAY_OF_MONTH: FieldSpec = FieldSpec { name: "day-of-month", min: 1, max: 31 };
const MONTH: FieldSpec = FieldSpec { name: "month", min: 1, max: 12 };
const DAY_OF_WEEK: FieldSpec = FieldSpec { name: "day-of-week", min: 0, max: 7 };

impl CronSchedule {
    pub fn parse(expression: &str) -> Result<Self, CronError> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        let [minute, hour, dom, month, dow] = fields.as_slice() else {
            return Err(CronError::FieldCount(fields.len()));
        };

        let mut days_of_week = parse_field(dow, &DAY_OF_WEEK)?;
        // 7 is an alias for Sunday.
        if days_of_week & (1 << 7) != 0 {
            days_of_week = (days_of_week & !(1 << 7)) | 1;
        }

        Ok(Self {
            source: fields.join(" "),
            minutes: parse_field(minute, &MINUTE)?,
            hours: parse_field(hour, &HOUR)?,
            days_of_month: parse_field(dom, &DAY_OF_MONTH)?,
            months: parse_field(month, &MONTH)?,
            days_of_week,
            dom_wildcard: dom.starts_with('*'),
            dow_wildcard: dow.starts_with('*'),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The first fire time strictly after `after`, evaluated on the wall
    /// clock of `tz`.
    ///
    /// Local times skipped by a DST jump never fire; a repeated local time
    /// fires on its first occurrence after `after`.
    pub fn next_after<Z: TimeZone>(&self, after: DateTime<Utc>, tz: &Z) -> Option<DateTime<Utc>> {
        let local = after.with_timezone(tz).naive_local();
        let start = local.with_second(0)?.with_nanosecond(0)? + Duration::minutes(1);

        let mut date = start.date();
        for _ in 0..SEARCH_DAYS {
            if self.date_matches(date) {
                let (first_hour, first_minute) = if date == start.date() {
                    (start.hour(), start.minute())
                } else {
                    (0, 0)
                };

                for hour in (first_hour..24).filter(|h| has(self.hours, *h)) {
                    let from = if hour == first_hour { first_minute } else { 0 };
                    for minute in (from..60).filter(|m| has(self.minutes, *m)) {
                        let naive = date.and_hms_opt(hour, minute, 0)?;
                        let fire = match tz.from_local_datetime(&naive) {
                            LocalResult::Single(t) => Some(t.with_timezone(&Utc)),
                            LocalResult::Ambiguous(early, late) => [early, late]
                                .into_iter()
                                .map(|t| t.with_timezone(&Utc))
                                .find(|t| *t > after),
                            LocalResult::None => None,
                        };
                        if let Some(fire) = fire.filter(|t| *t > after) {
                            return Some(fire);
                        }
                    }
                }
            }
            date = date.succ_opt()?;
        }
        None
    }

    fn date_matches(&self, date: NaiveDate) -> bool {
        if !has(self.months, date.month()) {
            return false;
        }
        let dom = has(self.days_of_month, date.day());
        let dow = has(self.days_of_week, date.weekday().num_days_from_sunday());
        if self.dom_wildcard || self.dow_wildcard {
            dom && dow
        } else {
            dom || dow
        }
    }
}

impl FromStr for CronSchedule {
    type Err = CronError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn has(bits: u64, value: u32) -> bool {
    bits & (1u64 << value) != 0
}

fn parse_field(text: &str, spec: &FieldSpec) -> Result<u64, CronError> {
    let invalid = |reason: &str| CronError::InvalidField {
        field: spec.name,
        value: text.to_string(),
        reason: reason.to_string(),
    };

    let mut bits = 0u64;
    for item in text.split(',') {
        let (range, step) = match item.split_once('/') {
            Some((range, step)) => {
                let step: u32 = step.parse().map_err(|_| invalid("step is not a number"))?;
                if step == 0 {
                    return Err(invalid("step must be positive"));
                }
                (range, Some(step))
            }
            None => (item, None),
        };

        let (lo, hi) = if range == "*" {
            (spec.min, spec.max)
        } else if let Some((a, b)) = range.split_once('-') {
            let a = parse_value(a, spec).map_err(|r| invalid(r))?;
            let b = parse_value(b, spec).map_err(|r| invalid(r))?;
            if a > b {
                return Err(invalid("range start is after range end"));
            }
            (a, b)
        } else {
            let v = parse_value(range, spec).map_err(|r| invalid(r))?;
            // `N/STEP` runs from N to the field maximum.
            if step.is_some() { (v, spec.max) } else { (v, v) }
        };

        let step = step.unwrap_or(1) as usize;
        for v in (lo..=hi).step_by(step) {
            bits |= 1u64 << v;
        }
    }
    Ok(bits)
}

fn parse_value(text: &str, spec: &FieldSpec) -> Result<u32, &'static str> {
    let v: u32 = text.parse().map_err(|_| "value is not a number")?;
    if v < spec.min || v > spec.max {
        return Err("value out of range");
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;
    use chrono_tz::{America::New_York, Australia::Brisbane};

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn daily_at_nine_in_brisbane() {
        let cron = CronSchedule::parse("0 9 * * *").unwrap();
        // 10:00 local on Jan 1 -> 09:00 local on Jan 2 (UTC+10, no DST).
        let next = cron.next_after(utc(2026, 1, 1, 0, 0), &Brisbane).unwrap();
        assert_eq!(next, utc(2026, 1, 1, 23, 0));
    }

    #[test]
    fn next_is_strictly_after() {
        let cron = CronSchedule::parse("0 9 * * *").unwrap();
        let at = utc(2026, 1, 1, 9, 0);
        assert_eq!(cron.next_after(at, &Utc).unwrap(), utc(2026, 1, 2, 9, 0));
    }

    #[test]
    fn every_fifteen_minutes() {
        let cron = CronSchedule::parse("*/15 * * * *").unwrap();
        assert_eq!(
            cron.next_after(utc(2026, 2, 22, 10, 2), &Utc).unwrap(),
            utc(2026, 2, 22, 10, 15)
        );
        assert_eq!(
            cron.next_after(utc(2026, 2, 22, 10, 50), &Utc).unwrap(),
            utc(2026, 2, 22, 11, 0)
        );
    }

    #[test]
    fn ranges_and_lists() {
        let cron = CronSchedule::parse("0,30 8-10/2 * * *").unwrap();
        let mut t = utc(2026, 3, 1, 0, 0);
        let mut fires = Vec::new();
        for _ in 0..4 {
            t = cron.next_after(t, &Utc).unwrap();
            fires.push((t.hour(), t.minute()));
        }
        assert_eq!(fires, vec![(8, 0), (8, 30), (10, 0), (10, 30)]);
    }

    #[test]
    fn weekday_and_sunday_alias() {
        // 2026-02-22 is a Sunday.
        let monday = CronSchedule::parse("0 9 * * 1").unwrap();
        let next = monday.next_after(utc(2026, 2, 22, 10, 0), &Utc).unwrap();
        assert_eq!(next, utc(2026, 2, 23, 9, 0));
        assert_eq!(next.weekday(), Weekday::Mon);

        let sunday = CronSchedule::parse("0 9 * * 7").unwrap();
        assert_eq!(
            sunday.next_after(utc(2026, 2, 22, 10, 0), &Utc).unwrap(),
            utc(2026, 3, 1, 9, 0)
        );
    }

    #[test]
    fn restricted_dom_and_dow_match_either() {
        // 13th of the month or any Friday.
        let cron = CronSchedule::parse("0 0 13 * 5").unwrap();
        let next = cron.next_after(utc(2026, 2, 22, 0, 0), &Utc).unwrap();
        assert_eq!(next, utc(2026, 2, 27, 0, 0));
    }

    #[test]
    fn month_restriction() {
        let cron = CronSchedule::parse("0 0 1 6 *").unwrap();
        assert_eq!(
            cron.next_after(utc(2026, 7, 1, 0, 0), &Utc).unwrap(),
            utc(2027, 6, 1, 0, 0)
        );
    }

    #[test]
    fn skipped_local_time_moves_to_next_day() {
        // 02:30 does not exist in New York on 2026-03-08.
        let cron = CronSchedule::parse("30 2 * * *").unwrap();
        let next = cron.next_after(utc(2026, 3, 8, 5, 0), &New_York).unwrap();
        assert_eq!(next, utc(2026, 3, 9, 6, 30));
    }

    #[test]
    fn repeated_local_time_fires_first_occurrence() {
        // 01:30 happens twice in New York on 2026-11-01.
        let cron = CronSchedule::parse("30 1 * * *").unwrap();
        let next = cron.next_after(utc(2026, 11, 1, 4, 0), &New_York).unwrap();
        assert_eq!(next, utc(2026, 11, 1, 5, 30));
    }

    #[test]
    fn rejects_bad_expressions() {
        assert_eq!(CronSchedule::parse("bad"), Err(CronError::FieldCount(1)));
        assert!(CronSchedule::parse("60 * * * *").is_err());
        assert!(CronSchedule::parse("* 24 * * *").is_err());
        assert!(CronSchedule::parse("* * 0 * *").is_err());
        assert!(CronSchedule::parse("* * * 13 *").is_err());
        assert!(CronSchedule::parse("* * * * 8").is_err());
        assert!(CronSchedule::parse("*/0 * * * *").is_err());
        assert!(CronSchedule::parse("5-1 * * * *").is_err());
        assert!(CronSchedule::parse("* * * * * *").is_err());
    }

    #[test]
    fn display_normalizes_whitespace() {
        let cron: CronSchedule = "0  9 *  * *".parse().unwrap();
        assert_eq!(cron.to_string(), "0 9 * * *");
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: a daily schedule fires at its minute and hour within one day.
            #[test]
            fn daily_fire_matches_fields(
                minute in 0u32..60,
                hour in 0u32..24,
                secs in 1_600_000_000i64..2_000_000_000,
            ) {
                let cron = CronSchedule::parse(&format!("{minute} {hour} * * *")).unwrap();
                let after = DateTime::<Utc>::from_timestamp(secs, 0).unwrap();
                let next = cron.next_after(after, &Utc).unwrap();

                prop_assert!(next > after);
                prop_assert!(next - after <= Duration::days(1));
                prop_assert_eq!(next.minute(), minute);
                prop_assert_eq!(next.hour(), hour);
            }

            /// Property: arbitrary input never panics the parser.
            #[test]
            fn parse_never_panics(expr in "\\PC{0,40}") {
                let _ = CronSchedule::parse(&expr);
            }
        }
    }
}
