use anyhow::{
  Context,
  anyhow
};
use chrono::{
  DateTime,
  Datelike,
  Days,
  LocalResult,
  Months,
  NaiveDate,
  TimeZone,
  Utc,
  Weekday
};
use chrono_tz::Tz;
use regex::Regex;

pub const TIMEZONE_ENV_VAR: &str =
  "APPTRACK_TIMEZONE";
const MILLIS_PER_DAY: i64 =
  24 * 60 * 60 * 1000;

/// Where a deadline stands relative
/// to now.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq,
)]
pub enum DeadlineState {
  Overdue(i64),
  DueToday,
  Upcoming(i64)
}

impl DeadlineState {
  #[must_use]
  pub fn from_days(days: i64) -> Self {
    if days < 0 {
      Self::Overdue(-days)
    } else if days == 0 {
      Self::DueToday
    } else {
      Self::Upcoming(days)
    }
  }

  #[must_use]
  pub fn label(&self) -> String {
    match self {
      | Self::Overdue(days) => {
        format!("{days} days overdue")
      }
      | Self::DueToday => {
        "Due today!".to_string()
      }
      | Self::Upcoming(days) => {
        format!("{days} days left")
      }
    }
  }
}

/// "Now" plus the timezone calendar
/// days are counted in. Views take
/// one so tests can pin the date.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
  pub now: DateTime<Utc>,
  pub tz:  Tz
}

impl Clock {
  pub fn system(tz: Tz) -> Self {
    Self {
      now: Utc::now(),
      tz
    }
  }

  pub fn fixed(
    now: DateTime<Utc>,
    tz: Tz
  ) -> Self {
    Self {
      now,
      tz
    }
  }

  pub fn today(&self) -> NaiveDate {
    today_in(self.now, &self.tz)
  }

  pub fn days_until(
    &self,
    deadline: NaiveDate
  ) -> i64 {
    days_until(
      deadline, self.now, &self.tz
    )
  }
}

/// Resolve the timezone used for
/// "today" and deadline math: env
/// var, then config, then UTC.
pub fn resolve_timezone(
  configured: Option<&str>
) -> Tz {
  if let Ok(raw) =
    std::env::var(TIMEZONE_ENV_VAR)
    && let Some(tz) =
      parse_timezone(&raw, "env")
  {
    return tz;
  }

  if let Some(raw) = configured
    && let Some(tz) =
      parse_timezone(raw, "config")
  {
    return tz;
  }

  Tz::UTC
}

fn parse_timezone(
  raw: &str,
  source: &str
) -> Option<Tz> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    tracing::warn!(
      source,
      "timezone source was empty"
    );
    return None;
  }

  match trimmed.parse::<Tz>() {
    | Ok(tz) => {
      tracing::debug!(
        source,
        timezone = %trimmed,
        "configured timezone"
      );
      Some(tz)
    }
    | Err(err) => {
      tracing::error!(
        source,
        timezone = %trimmed,
        error = %err,
        "failed to parse timezone id"
      );
      None
    }
  }
}

#[must_use]
pub fn today_in(
  now: DateTime<Utc>,
  tz: &Tz
) -> NaiveDate {
  now.with_timezone(tz).date_naive()
}

/// The instant a calendar day begins
/// in `tz`.
#[must_use]
pub fn start_of_day(
  date: NaiveDate,
  tz: &Tz
) -> DateTime<Utc> {
  let midnight = date.and_time(
    chrono::NaiveTime::MIN
  );
  match tz.from_local_datetime(&midnight)
  {
    | LocalResult::Single(dt) => {
      dt.with_timezone(&Utc)
    }
    | LocalResult::Ambiguous(
      first,
      second
    ) => {
      first.min(second).with_timezone(&Utc)
    }
    | LocalResult::None => {
      // Midnight skipped by a DST jump.
      Utc.from_utc_datetime(&midnight)
    }
  }
}

/// Whole days from `now` until the
/// deadline day begins, rounded up.
///
/// Zero on the deadline's own
/// calendar day, negative once it has
/// passed.
#[must_use]
pub fn days_until(
  deadline: NaiveDate,
  now: DateTime<Utc>,
  tz: &Tz
) -> i64 {
  let diff = (start_of_day(deadline, tz)
    - now)
    .num_milliseconds();
  let whole =
    diff.div_euclid(MILLIS_PER_DAY);
  if diff.rem_euclid(MILLIS_PER_DAY)
    == 0
  {
    whole
  } else {
    whole + 1
  }
}

#[must_use]
pub fn deadline_state(
  deadline: NaiveDate,
  now: DateTime<Utc>,
  tz: &Tz
) -> DeadlineState {
  DeadlineState::from_days(days_until(
    deadline, now, tz
  ))
}

#[must_use]
pub fn first_of_month(
  date: NaiveDate
) -> NaiveDate {
  date.with_day(1).unwrap_or(date)
}

#[must_use]
pub fn shift_months(
  date: NaiveDate,
  months: i32
) -> NaiveDate {
  let first = first_of_month(date);
  let shifted = if months >= 0 {
    first.checked_add_months(
      Months::new(months.unsigned_abs())
    )
  } else {
    first.checked_sub_months(
      Months::new(months.unsigned_abs())
    )
  };
  shifted.unwrap_or(first)
}

#[must_use]
pub fn days_in_month(
  date: NaiveDate
) -> u32 {
  let first = first_of_month(date);
  let next = shift_months(first, 1);
  next
    .signed_duration_since(first)
    .num_days() as u32
}

#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_date_expr(
  input: &str,
  today: NaiveDate
) -> anyhow::Result<NaiveDate> {
  let token = input.trim();
  let lower =
    token.to_ascii_lowercase();

  match lower.as_str() {
    | "today" => return Ok(today),
    | "tomorrow" => {
      return today
        .checked_add_days(Days::new(1))
        .ok_or_else(|| {
          anyhow!("date out of range")
        });
    }
    | "yesterday" => {
      return today
        .checked_sub_days(Days::new(1))
        .ok_or_else(|| {
          anyhow!("date out of range")
        });
    }
    | _ => {}
  }

  if let Ok(date) =
    NaiveDate::parse_from_str(
      token, "%Y-%m-%d"
    )
  {
    return Ok(date);
  }

  if let Some(date) =
    parse_offset(&lower, today)?
  {
    return Ok(date);
  }

  if let Some(weekday) =
    parse_weekday_name(&lower)
  {
    return Ok(next_weekday_date(
      today, weekday
    ));
  }

  if let Some(month) =
    parse_month_name(&lower)
  {
    let year = if month > today.month()
    {
      today.year()
    } else {
      today.year() + 1
    };
    return NaiveDate::from_ymd_opt(
      year, month, 1
    )
    .ok_or_else(|| {
      anyhow!(
        "invalid month value: {month}"
      )
    });
  }

  Err(anyhow!(
    "unrecognized date '{token}': \
     expected YYYY-MM-DD, today, \
     tomorrow, yesterday, a weekday \
     or month name, or +Nd/+Nw/+Nm"
  ))
}

fn parse_offset(
  token: &str,
  today: NaiveDate
) -> anyhow::Result<Option<NaiveDate>> {
  let offset_re = Regex::new(
    r"^\+(?P<count>\d{1,4})(?P<unit>[dwm])$"
  )
  .context("invalid offset pattern")?;
  let Some(captures) =
    offset_re.captures(token)
  else {
    return Ok(None);
  };

  let count: u32 = captures["count"]
    .parse()
    .context("invalid offset count")?;
  let shifted = match &captures["unit"]
  {
    | "d" => today.checked_add_days(
      Days::new(u64::from(count))
    ),
    | "w" => today.checked_add_days(
      Days::new(u64::from(count) * 7)
    ),
    | _ => today.checked_add_months(
      Months::new(count)
    )
  };

  shifted
    .map(Some)
    .ok_or_else(|| {
      anyhow!(
        "date offset out of range: \
         {token}"
      )
    })
}

fn parse_weekday_name(
  token: &str
) -> Option<Weekday> {
  match token.trim() {
    | "monday" | "mon" => {
      Some(Weekday::Mon)
    }
    | "tuesday" | "tue" | "tues" => {
      Some(Weekday::Tue)
    }
    | "wednesday" | "wed" => {
      Some(Weekday::Wed)
    }
    | "thursday" | "thu" | "thur"
    | "thurs" => Some(Weekday::Thu),
    | "friday" | "fri" => {
      Some(Weekday::Fri)
    }
    | "saturday" | "sat" => {
      Some(Weekday::Sat)
    }
    | "sunday" | "sun" => {
      Some(Weekday::Sun)
    }
    | _ => None
  }
}

fn next_weekday_date(
  from: NaiveDate,
  target: Weekday
) -> NaiveDate {
  let from_idx = from
    .weekday()
    .num_days_from_monday()
    as u64;
  let target_idx =
    target.num_days_from_monday()
      as u64;
  let mut delta =
    (7 + target_idx - from_idx) % 7;
  if delta == 0 {
    delta = 7;
  }
  from
    .checked_add_days(Days::new(delta))
    .unwrap_or(from)
}

fn parse_month_name(
  token: &str
) -> Option<u32> {
  match token.trim() {
    | "january" | "jan" => Some(1),
    | "february" | "feb" => Some(2),
    | "march" | "mar" => Some(3),
    | "april" | "apr" => Some(4),
    | "may" => Some(5),
    | "june" | "jun" => Some(6),
    | "july" | "jul" => Some(7),
    | "august" | "aug" => Some(8),
    | "september" | "sep" | "sept" => {
      Some(9)
    }
    | "october" | "oct" => Some(10),
    | "november" | "nov" => Some(11),
    | "december" | "dec" => Some(12),
    | _ => None
  }
}
