//! Conversion between domain values and the text a user sees and types.
//!
//! A [`Formatter`] is total in one direction and fallible in the other:
//! [`format`](Formatter::format) always produces display text (the
//! placeholder for a missing or out-of-range value), while
//! [`parse`](Formatter::parse) may reject what the user typed. Parsed values
//! re-format canonically, so `format(parse(format(parse(s))))` equals
//! `format(parse(s))`.

use chrono::{Duration as ChronoDuration, Months, NaiveDate, NaiveTime, Timelike};
use std::fmt::{self, Write as _};

/// Why typed text was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("nothing entered")]
    Empty,
    #[error("{input:?} is not a valid {expected}")]
    Malformed {
        input: String,
        expected: &'static str,
    },
    #[error("{input:?} is outside the allowed range")]
    OutOfRange { input: String },
    #[error("range starts after it ends")]
    Inverted,
}

/// What to do with a value outside `min..=max`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RangePolicy {
    /// Move it to the nearest bound.
    #[default]
    Clamp,
    /// Refuse it; the committed value stays where it was.
    Reject,
}

pub trait Formatter: Send + 'static {
    type Value: Clone + PartialEq + fmt::Debug + Send + 'static;

    /// Display text for a value known to be valid.
    fn display(&self, value: &Self::Value) -> String;

    /// Parse typed text into a value, applying range rules.
    fn parse(&self, text: &str) -> Result<Self::Value, ParseError>;

    /// Shown when there is no value to display.
    fn placeholder(&self) -> &str;

    /// Whether `value` satisfies the configured bounds.
    fn in_range(&self, _value: &Self::Value) -> bool {
        true
    }

    /// Display text for any value, including none.
    fn format(&self, value: Option<&Self::Value>) -> String {
        match value {
            Some(v) if self.in_range(v) => self.display(v),
            _ => self.placeholder().to_string(),
        }
    }
}

fn bounded<T: PartialOrd + Copy>(
    value: T,
    min: Option<T>,
    max: Option<T>,
    policy: RangePolicy,
) -> Option<T> {
    let below = min.is_some_and(|m| value < m);
    let above = max.is_some_and(|m| value > m);
    match (policy, below, above) {
        (_, false, false) => Some(value),
        (RangePolicy::Reject, _, _) => None,
        (RangePolicy::Clamp, true, _) => min,
        (RangePolicy::Clamp, _, true) => max,
    }
}

fn non_empty(text: &str) -> Result<&str, ParseError> {
    let text = text.trim();
    if text.is_empty() {
        Err(ParseError::Empty)
    } else {
        Ok(text)
    }
}

/// Calendar dates via a strftime pattern.
#[derive(Debug, Clone)]
pub struct DateFormat {
    pattern: String,
    placeholder: String,
    min: Option<NaiveDate>,
    max: Option<NaiveDate>,
    policy: RangePolicy,
}

impl Default for DateFormat {
    fn default() -> Self {
        Self {
            pattern: "%Y-%m-%d".to_string(),
            placeholder: "YYYY-MM-DD".to_string(),
            min: None,
            max: None,
            policy: RangePolicy::default(),
        }
    }
}

impl DateFormat {
    pub fn new() -> Self {
        Self::default()
    }

    /// A chrono strftime pattern, e.g. `"%d/%m/%Y"`.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_min(mut self, min: NaiveDate) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: NaiveDate) -> Self {
        self.max = Some(max);
        self
    }

    pub fn with_policy(mut self, policy: RangePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> RangePolicy {
        self.policy
    }

    /// Apply the bounds to a stepped or typed date.
    pub fn constrain(&self, date: NaiveDate) -> Option<NaiveDate> {
        bounded(date, self.min, self.max, self.policy)
    }

    /// `date` moved by `days`, bounded. `None` if the move is refused or
    /// leaves chrono's range.
    pub fn add_days(&self, date: NaiveDate, days: i64) -> Option<NaiveDate> {
        date.checked_add_signed(ChronoDuration::days(days))
            .and_then(|d| self.constrain(d))
    }

    /// `date` moved by whole months, the day clamped to the month's end.
    pub fn add_months(&self, date: NaiveDate, months: i32) -> Option<NaiveDate> {
        let shifted = if months >= 0 {
            date.checked_add_months(Months::new(months.unsigned_abs()))
        } else {
            date.checked_sub_months(Months::new(months.unsigned_abs()))
        };
        shifted.and_then(|d| self.constrain(d))
    }
}

impl Formatter for DateFormat {
    type Value = NaiveDate;

    /// Falls back to the placeholder when the pattern has an unknown
    /// specifier.
    fn display(&self, value: &NaiveDate) -> String {
        let mut out = String::new();
        match write!(out, "{}", value.format(&self.pattern)) {
            Ok(()) => out,
            Err(_) => {
                tracing::debug!(pattern = %self.pattern, "date pattern does not format");
                self.placeholder.clone()
            }
        }
    }

    fn parse(&self, text: &str) -> Result<NaiveDate, ParseError> {
        let text = non_empty(text)?;
        let date = NaiveDate::parse_from_str(text, &self.pattern).map_err(|_| {
            ParseError::Malformed {
                input: text.to_string(),
                expected: "date",
            }
        })?;
        self.constrain(date).ok_or_else(|| ParseError::OutOfRange {
            input: text.to_string(),
        })
    }

    fn placeholder(&self) -> &str {
        &self.placeholder
    }

    fn in_range(&self, value: &NaiveDate) -> bool {
        bounded(*value, self.min, self.max, RangePolicy::Reject).is_some()
    }
}

/// Decimal numbers with optional fixed precision and bounds.
#[derive(Debug, Clone, Default)]
pub struct NumberFormat {
    precision: Option<usize>,
    min: Option<f64>,
    max: Option<f64>,
    policy: RangePolicy,
    placeholder: String,
}

impl NumberFormat {
    pub fn new() -> Self {
        Self::default()
    }

    /// Round to and always show this many decimals.
    pub fn with_precision(mut self, decimals: usize) -> Self {
        self.precision = Some(decimals);
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn with_policy(mut self, policy: RangePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn policy(&self) -> RangePolicy {
        self.policy
    }

    /// Round to the configured precision, then apply the bounds.
    pub fn constrain(&self, value: f64) -> Option<f64> {
        let rounded = match self.precision {
            Some(p) => {
                let factor = 10f64.powi(p as i32);
                (value * factor).round() / factor
            }
            None => value,
        };
        bounded(rounded, self.min, self.max, self.policy)
    }
}

impl Formatter for NumberFormat {
    type Value = f64;

    fn display(&self, value: &f64) -> String {
        match self.precision {
            Some(p) => format!("{value:.p$}"),
            None if value.fract() == 0.0 && value.abs() < 1e15 => format!("{}", *value as i64),
            None => format!("{value}"),
        }
    }

    fn parse(&self, text: &str) -> Result<f64, ParseError> {
        let text = non_empty(text)?;
        let cleaned: String = text.chars().filter(|c| *c != '_' && *c != ',').collect();
        let value = cleaned
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ParseError::Malformed {
                input: text.to_string(),
                expected: "number",
            })?;
        self.constrain(value).ok_or_else(|| ParseError::OutOfRange {
            input: text.to_string(),
        })
    }

    fn placeholder(&self) -> &str {
        &self.placeholder
    }

    fn in_range(&self, value: &f64) -> bool {
        value.is_finite() && bounded(*value, self.min, self.max, RangePolicy::Reject).is_some()
    }
}

/// Twelve- or twenty-four-hour clock display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    #[default]
    H24,
    H12,
}

/// Times of day.
#[derive(Debug, Clone)]
pub struct TimeFormat {
    clock: Clock,
    seconds: bool,
    placeholder: String,
}

impl Default for TimeFormat {
    fn default() -> Self {
        Self {
            clock: Clock::H24,
            seconds: false,
            placeholder: "HH:MM".to_string(),
        }
    }
}

impl TimeFormat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Show and accept seconds.
    pub fn with_seconds(mut self, seconds: bool) -> Self {
        self.seconds = seconds;
        self
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    fn pattern(&self) -> &'static str {
        match (self.clock, self.seconds) {
            (Clock::H24, false) => "%H:%M",
            (Clock::H24, true) => "%H:%M:%S",
            (Clock::H12, false) => "%I:%M %p",
            (Clock::H12, true) => "%I:%M:%S %p",
        }
    }

    /// `time` moved by `minutes`, wrapping around midnight.
    pub fn add_minutes(&self, time: NaiveTime, minutes: i64) -> NaiveTime {
        let (shifted, _) = time.overflowing_add_signed(ChronoDuration::minutes(minutes));
        shifted
    }

    /// Snap down to a multiple of `step` minutes since midnight.
    pub fn snap(&self, time: NaiveTime, step: u32) -> NaiveTime {
        let step = step.max(1);
        let minutes = time.num_seconds_from_midnight() / 60;
        let snapped = minutes - minutes % step;
        NaiveTime::from_hms_opt(snapped / 60, snapped % 60, 0).unwrap_or(time)
    }
}

impl Formatter for TimeFormat {
    type Value = NaiveTime;

    fn display(&self, value: &NaiveTime) -> String {
        value.format(self.pattern()).to_string()
    }

    fn parse(&self, text: &str) -> Result<NaiveTime, ParseError> {
        let text = non_empty(text)?;
        let mut time = NaiveTime::parse_from_str(text, self.pattern()).map_err(|_| {
            ParseError::Malformed {
                input: text.to_string(),
                expected: "time",
            }
        })?;
        if !self.seconds {
            time = time.with_second(0).unwrap_or(time);
        }
        Ok(time.with_nanosecond(0).unwrap_or(time))
    }

    fn placeholder(&self) -> &str {
        &self.placeholder
    }
}

/// An inclusive span of dates with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// `None` if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Number of days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

/// Two dates joined by a separator.
#[derive(Debug, Clone)]
pub struct DateRangeFormat {
    date: DateFormat,
    separator: String,
    placeholder: String,
}

impl Default for DateRangeFormat {
    fn default() -> Self {
        Self::new(DateFormat::default())
    }
}

impl DateRangeFormat {
    pub fn new(date: DateFormat) -> Self {
        let placeholder = format!("{0} to {0}", date.placeholder());
        Self {
            date,
            separator: " to ".to_string(),
            placeholder,
        }
    }

    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self.placeholder = format!(
            "{0}{1}{0}",
            self.date.placeholder(),
            self.separator
        );
        self
    }

    pub fn date_format(&self) -> &DateFormat {
        &self.date
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }
}

impl Formatter for DateRangeFormat {
    type Value = DateRange;

    fn display(&self, value: &DateRange) -> String {
        format!(
            "{}{}{}",
            self.date.display(&value.start),
            self.separator,
            self.date.display(&value.end)
        )
    }

    fn parse(&self, text: &str) -> Result<DateRange, ParseError> {
        let text = non_empty(text)?;
        let exact = self.separator.as_str();
        let mut first_error = None;
        // The separator may also occur inside a date ("-" in ISO dates), so
        // try every cut until both halves parse.
        for (start, end) in cuts(text, exact).chain(cuts(text, exact.trim())) {
            match (self.date.parse(start), self.date.parse(end)) {
                (Ok(start), Ok(end)) => {
                    return DateRange::new(start, end).ok_or(ParseError::Inverted)
                }
                (Err(e), _) | (_, Err(e)) => {
                    first_error.get_or_insert(e);
                }
            }
        }
        Err(first_error.unwrap_or_else(|| ParseError::Malformed {
            input: text.to_string(),
            expected: "date range",
        }))
    }

    fn placeholder(&self) -> &str {
        &self.placeholder
    }

    fn in_range(&self, value: &DateRange) -> bool {
        self.date.in_range(&value.start) && self.date.in_range(&value.end)
    }
}

/// Every way to split `text` around one occurrence of `sep`.
fn cuts<'a>(text: &'a str, sep: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
    text.match_indices(sep)
        .filter(move |_| !sep.is_empty())
        .map(move |(i, _)| (&text[..i], &text[i + sep.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn canonical<F: Formatter>(f: &F, inputs: &[&str]) {
        for input in inputs {
            let once = f.display(&f.parse(input).unwrap());
            let twice = f.display(&f.parse(&once).unwrap());
            assert_eq!(once, twice, "input {input:?}");
        }
    }

    #[test]
    fn format_is_total() {
        let f = DateFormat::new().with_max(date(2024, 12, 31));
        assert_eq!(f.format(None), "YYYY-MM-DD");
        assert_eq!(f.format(Some(&date(2025, 1, 1))), "YYYY-MM-DD");
        assert_eq!(f.format(Some(&date(2024, 3, 9))), "2024-03-09");
    }

    #[test]
    fn date_parse_errors() {
        let f = DateFormat::new();
        assert_eq!(f.parse("  "), Err(ParseError::Empty));
        assert!(matches!(f.parse("2024-02-30"), Err(ParseError::Malformed { .. })));
        assert!(matches!(f.parse("tomorrow"), Err(ParseError::Malformed { .. })));
    }

    #[test]
    fn date_bounds_follow_policy() {
        let clamp = DateFormat::new().with_min(date(2024, 1, 1));
        assert_eq!(clamp.parse("2023-06-01"), Ok(date(2024, 1, 1)));

        let reject = clamp.clone().with_policy(RangePolicy::Reject);
        assert!(matches!(reject.parse("2023-06-01"), Err(ParseError::OutOfRange { .. })));
    }

    #[test]
    fn date_custom_pattern_round_trips() {
        let f = DateFormat::new().with_pattern("%d/%m/%Y");
        assert_eq!(f.parse("15/01/2024"), Ok(date(2024, 1, 15)));
        canonical(&f, &["15/01/2024", " 1/2/2024 "]);
    }

    #[test]
    fn month_step_clamps_day() {
        let f = DateFormat::new();
        assert_eq!(f.add_months(date(2024, 1, 31), 1), Some(date(2024, 2, 29)));
        assert_eq!(f.add_months(date(2024, 3, 31), -1), Some(date(2024, 2, 29)));
    }

    #[test]
    fn reject_policy_refuses_step_past_bound() {
        let f = DateFormat::new()
            .with_max(date(2024, 1, 31))
            .with_policy(RangePolicy::Reject);
        assert_eq!(f.add_days(date(2024, 1, 31), 1), None);
        assert_eq!(f.add_days(date(2024, 1, 30), 1), Some(date(2024, 1, 31)));
    }

    #[test]
    fn number_clamps_to_bounds() {
        let f = NumberFormat::new().with_range(0.0, 100.0);
        assert_eq!(f.parse("150"), Ok(100.0));
        assert_eq!(f.parse("-5"), Ok(0.0));
        assert_eq!(f.parse("42"), Ok(42.0));
    }

    #[test]
    fn number_reject_policy() {
        let f = NumberFormat::new()
            .with_range(0.0, 100.0)
            .with_policy(RangePolicy::Reject);
        assert!(matches!(f.parse("150"), Err(ParseError::OutOfRange { .. })));
    }

    #[test]
    fn number_display_and_canonical_form() {
        let plain = NumberFormat::new();
        assert_eq!(plain.display(&3.0), "3");
        assert_eq!(plain.display(&2.5), "2.5");
        assert_eq!(plain.parse("1,234.5"), Ok(1234.5));
        assert!(plain.parse("NaN").is_err());
        canonical(&plain, &["1.50", "007", "1_000", "-0"]);

        let money = NumberFormat::new().with_precision(2);
        assert_eq!(money.parse("3.14159"), Ok(3.14));
        assert_eq!(money.display(&3.0), "3.00");
        canonical(&money, &["3.14159", "2", "0.005"]);
    }

    #[test]
    fn time_formats() {
        let h24 = TimeFormat::new();
        assert_eq!(h24.parse("09:30"), Ok(time(9, 30)));
        assert_eq!(h24.display(&time(17, 5)), "17:05");
        assert!(matches!(h24.parse("25:00"), Err(ParseError::Malformed { .. })));

        let h12 = TimeFormat::new().with_clock(Clock::H12);
        assert_eq!(h12.display(&time(17, 5)), "05:05 PM");
        assert_eq!(h12.parse("05:05 PM"), Ok(time(17, 5)));
        canonical(&h12, &["12:00 AM", "11:59 PM"]);
    }

    #[test]
    fn time_step_wraps_midnight() {
        let f = TimeFormat::new();
        assert_eq!(f.add_minutes(time(23, 45), 30), time(0, 15));
        assert_eq!(f.add_minutes(time(0, 10), -15), time(23, 55));
        assert_eq!(f.snap(time(10, 37), 15), time(10, 30));
    }

    #[test]
    fn date_range_parse() {
        let f = DateRangeFormat::default();
        let range = f.parse("2024-01-01 to 2024-01-07").unwrap();
        assert_eq!(range.days(), 7);
        assert_eq!(f.display(&range), "2024-01-01 to 2024-01-07");
        assert_eq!(f.parse("2024-02-01 to 2024-01-01"), Err(ParseError::Inverted));
        assert!(matches!(f.parse("2024-01-01"), Err(ParseError::Malformed { .. })));
        assert_eq!(f.format(None), "YYYY-MM-DD to YYYY-MM-DD");
    }

    #[test]
    fn date_range_with_dashed_separator() {
        let f = DateRangeFormat::default().with_separator(" - ");
        let range = f.parse("2024-01-01 - 2024-01-07").unwrap();
        assert_eq!(range, DateRange::new(date(2024, 1, 1), date(2024, 1, 7)).unwrap());
        assert_eq!(f.display(&range), "2024-01-01 - 2024-01-07");
        assert_eq!(f.parse("2024-01-01-2024-01-07"), Ok(range));
        assert_eq!(f.parse("2024-02-01 - 2024-01-01"), Err(ParseError::Inverted));
        canonical(&f, &["2024-01-01 - 2024-01-07", " 2023-12-31  -  2024-01-01 "]);
    }

    #[test]
    fn unknown_pattern_displays_placeholder() {
        let f = DateFormat::default()
            .with_pattern("%Q")
            .with_placeholder("no date");
        assert_eq!(f.format(Some(&date(2024, 3, 9))), "no date");
        assert!(matches!(f.parse("2024-03-09"), Err(ParseError::Malformed { .. })));

        let range = DateRangeFormat::new(f);
        let span = DateRange::new(date(2024, 3, 9), date(2024, 3, 10)).unwrap();
        assert_eq!(range.format(Some(&span)), "no date to no date");
    }
}
