use chrono::{
  Local,
  NaiveDate,
  Utc
};

pub const DATE_FORMAT: &str =
  "%Y-%m-%d";

/// Source of "now" for everything that
/// depends on the calendar.
pub trait Clock {
  fn today(&self) -> NaiveDate;

  fn now_millis(&self) -> u64;

  fn tomorrow(&self) -> NaiveDate {
    next_day(self.today())
  }
}

/// Host local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn today(&self) -> NaiveDate {
    Local::now().date_naive()
  }

  fn now_millis(&self) -> u64 {
    u64::try_from(
      Utc::now().timestamp_millis()
    )
    .unwrap_or_default()
  }
}

/// Clock pinned to a single instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
  pub date:   NaiveDate,
  pub millis: u64
}

impl FixedClock {
  #[must_use]
  pub fn new(
    date: NaiveDate,
    millis: u64
  ) -> Self {
    Self {
      date,
      millis
    }
  }
}

impl Clock for FixedClock {
  fn today(&self) -> NaiveDate {
    self.date
  }

  fn now_millis(&self) -> u64 {
    self.millis
  }
}

/// Today's local date as
/// `YYYY-MM-DD`.
#[must_use]
pub fn today() -> String {
  format_date(SystemClock.today())
}

/// Tomorrow's local date as
/// `YYYY-MM-DD`.
#[must_use]
pub fn tomorrow() -> String {
  format_date(SystemClock.tomorrow())
}

#[must_use]
pub fn next_day(
  date: NaiveDate
) -> NaiveDate {
  date.succ_opt().unwrap_or(date)
}

#[must_use]
pub fn format_date(
  date: NaiveDate
) -> String {
  date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(
  raw: &str
) -> Option<NaiveDate> {
  NaiveDate::parse_from_str(
    raw.trim(),
    DATE_FORMAT
  )
  .ok()
}

/// Header form, e.g. `Thursday,
/// October 15, 2026`.
#[must_use]
pub fn format_long_date(
  date: NaiveDate
) -> String {
  date
    .format("%A, %B %-d, %Y")
    .to_string()
}

/// Compact form used in task rows,
/// e.g. `Oct 20`.
#[must_use]
pub fn format_short_date(
  date: NaiveDate
) -> String {
  date.format("%b %-d").to_string()
}

/// Serializes an optional due date as
/// `YYYY-MM-DD`, with the empty string
/// standing in for "no date".
pub mod due_date_serde {
  use chrono::NaiveDate;
  use serde::{
    Deserialize,
    Deserializer,
    Serializer
  };

  use super::DATE_FORMAT;

  pub fn serialize<S>(
    date: &Option<NaiveDate>,
    serializer: S
  ) -> Result<S::Ok, S::Error>
  where
    S: Serializer
  {
    match date {
      | Some(value) => {
        serializer.serialize_str(
          &value
            .format(DATE_FORMAT)
            .to_string()
        )
      }
      | None => {
        serializer.serialize_str("")
      }
    }
  }

  pub fn deserialize<'de, D>(
    deserializer: D
  ) -> Result<Option<NaiveDate>, D::Error>
  where
    D: Deserializer<'de>
  {
    let raw =
      Option::<String>::deserialize(
        deserializer
      )?;
    match raw.as_deref().map(str::trim)
    {
      | None | Some("") => Ok(None),
      | Some(text) => {
        NaiveDate::parse_from_str(
          text,
          DATE_FORMAT
        )
        .map(Some)
        .map_err(
          serde::de::Error::custom
        )
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::NaiveDate;

  use super::{
    Clock,
    FixedClock,
    format_date,
    format_long_date,
    format_short_date,
    parse_date
  };

  fn date(
    y: i32,
    m: u32,
    d: u32
  ) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d)
      .expect("valid date")
  }

  #[test]
  fn formats_with_zero_padding() {
    assert_eq!(
      format_date(date(2026, 3, 7)),
      "2026-03-07"
    );
  }

  #[test]
  fn tomorrow_rolls_over_month_and_year()
   {
    let clock = FixedClock::new(
      date(2026, 12, 31),
      0
    );
    assert_eq!(
      format_date(clock.tomorrow()),
      "2027-01-01"
    );

    let clock = FixedClock::new(
      date(2028, 2, 28),
      0
    );
    assert_eq!(
      format_date(clock.tomorrow()),
      "2028-02-29"
    );
  }

  #[test]
  fn parses_only_calendar_dates() {
    assert_eq!(
      parse_date(" 2026-10-15 "),
      Some(date(2026, 10, 15))
    );
    assert_eq!(
      parse_date("2026-13-01"),
      None
    );
    assert_eq!(parse_date(""), None);
  }

  #[test]
  fn display_formats() {
    assert_eq!(
      format_long_date(date(
        2026, 10, 15
      )),
      "Thursday, October 15, 2026"
    );
    assert_eq!(
      format_short_date(date(
        2026, 10, 5
      )),
      "Oct 5"
    );
  }

  #[test]
  fn system_today_matches_format() {
    let today = super::today();
    assert_eq!(today.len(), 10);
    assert!(parse_date(&today).is_some());
    assert!(
      parse_date(&super::tomorrow())
        .is_some()
    );
  }
}
