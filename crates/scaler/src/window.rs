//! Time window evaluation
//!
//! Decides whether a rule's namespaces should be up or down at a given
//! instant. Times are local to the schedule's IANA time zone.
//!
//! Window semantics:
//! - `upscale < downscale`: up for `upscale <= t < downscale`
//! - `upscale > downscale`: the up window crosses midnight
//! - `upscale == downscale`: always up
//!
//! A recurrence restricts the days on which an up window may open. For the
//! after-midnight part of a crossing window the opening day is the previous
//! calendar day.

use crate::error::ScheduleError;
use chrono::{DateTime, Datelike, Duration, NaiveDateTime, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use crds::{Schedule, ScaleState, TimeRule};

/// Parse a strict `HH:MM` clock time
pub fn parse_clock_time(field: &'static str, value: &str) -> Result<NaiveTime, ScheduleError> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M").map_err(|_| ScheduleError::InvalidTime {
        field,
        value: value.to_string(),
    })
}

/// Days of the week a schedule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Recurrence {
    days: [bool; 7],
}

impl Recurrence {
    /// Every day of the week
    pub fn every_day() -> Self {
        Self { days: [true; 7] }
    }

    /// Parse `*`, `MON-FRI`, `MON,WED,FRI`, `FRI-MON` and combinations
    ///
    /// Day names are case-insensitive, abbreviated or in full.
    pub fn parse(raw: &str) -> Result<Self, ScheduleError> {
        let malformed = || ScheduleError::MalformedRecurrence(raw.to_string());
        let trimmed = raw.trim();
        if trimmed == "*" {
            return Ok(Self::every_day());
        }
        if trimmed.is_empty() {
            return Err(malformed());
        }

        let mut days = [false; 7];
        for part in trimmed.split(',') {
            let part = part.trim();
            match part.split_once('-') {
                Some((start, end)) => {
                    let start = parse_day(start).ok_or_else(malformed)?;
                    let end = parse_day(end).ok_or_else(malformed)?;
                    // Ranges may wrap past Sunday (e.g., FRI-MON)
                    let mut day = start;
                    loop {
                        days[day.num_days_from_monday() as usize] = true;
                        if day == end {
                            break;
                        }
                        day = day.succ();
                    }
                }
                None => {
                    let day = parse_day(part).ok_or_else(malformed)?;
                    days[day.num_days_from_monday() as usize] = true;
                }
            }
        }
        Ok(Self { days })
    }

    /// Parse an optional recurrence, defaulting to every day
    pub fn from_schedule(schedule: &Schedule) -> Result<Self, ScheduleError> {
        schedule.recurrence.as_deref().map_or_else(|| Ok(Self::every_day()), Self::parse)
    }

    /// Whether the day is included
    pub fn contains(&self, day: Weekday) -> bool {
        self.days[day.num_days_from_monday() as usize]
    }
}

fn parse_day(raw: &str) -> Option<Weekday> {
    raw.trim().parse::<Weekday>().ok()
}

/// Parsed upscale/downscale window of a single rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaleWindow {
    upscale: NaiveTime,
    downscale: NaiveTime,
}

impl ScaleWindow {
    /// Build a window from explicit times
    pub fn new(upscale: NaiveTime, downscale: NaiveTime) -> Self {
        Self { upscale, downscale }
    }

    /// Parse a rule's times
    pub fn from_rule(rule: &TimeRule) -> Result<Self, ScheduleError> {
        Ok(Self {
            upscale: parse_clock_time("upscaleTime", &rule.upscale_time)?,
            downscale: parse_clock_time("downscaleTime", &rule.downscale_time)?,
        })
    }

    /// Whether the window crosses midnight
    pub fn crosses_midnight(&self) -> bool {
        self.upscale > self.downscale
    }

    /// State at a local clock time, ignoring recurrence
    pub fn state_at(&self, time: NaiveTime) -> ScaleState {
        let up = if self.upscale == self.downscale {
            true
        } else if self.crosses_midnight() {
            time >= self.upscale || time < self.downscale
        } else {
            time >= self.upscale && time < self.downscale
        };
        if up { ScaleState::Up } else { ScaleState::Down }
    }

    /// State at a local date and time, honouring recurrence
    pub fn state_on(&self, local: NaiveDateTime, recurrence: &Recurrence) -> ScaleState {
        let time = local.time();
        if self.state_at(time) == ScaleState::Down {
            return ScaleState::Down;
        }
        let opened_on = if self.crosses_midnight() && time < self.downscale {
            (local.date() - Duration::days(1)).weekday()
        } else {
            local.date().weekday()
        };
        if recurrence.contains(opened_on) {
            ScaleState::Up
        } else {
            ScaleState::Down
        }
    }
}

/// Convert an instant to wall-clock time in an IANA time zone
pub fn local_time(time_zone: &str, now: DateTime<Utc>) -> Result<NaiveDateTime, ScheduleError> {
    let tz: Tz = time_zone
        .trim()
        .parse()
        .map_err(|_| ScheduleError::UnknownTimeZone(time_zone.to_string()))?;
    Ok(now.with_timezone(&tz).naive_local())
}

/// Desired state of a rule's namespaces at `now`
pub fn desired_state(
    schedule: &Schedule,
    rule: &TimeRule,
    now: DateTime<Utc>,
) -> Result<ScaleState, ScheduleError> {
    let window = ScaleWindow::from_rule(rule)?;
    let recurrence = Recurrence::from_schedule(schedule)?;
    let local = local_time(&schedule.time_zone, now)?;
    Ok(window.state_on(local, &recurrence))
}
