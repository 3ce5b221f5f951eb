// src/schedule.rs
//! Time-of-day execution window: decides once per cycle whether the loop may
//! run, and when a closed window reopens.

use anyhow::{anyhow, Result};
use chrono::{Duration as ChronoDuration, NaiveDateTime, Timelike};

/// Operating window in local wall-clock hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionWindow {
    pub start_hour: u32,
    pub end_hour: u32,
}

impl ExecutionWindow {
    /// Window rules: equal hours means always open; otherwise a plain range,
    /// wrapping midnight when start > end (e.g. 22h–06h).
    pub fn is_open(&self, hour: u32) -> bool {
        if self.start_hour == self.end_hour {
            true
        } else if self.start_hour < self.end_hour {
            self.start_hour <= hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }

    /// Next instant the window opens: today at `start_hour:00:00`, rolled to
    /// tomorrow if that is not strictly in the future.
    pub fn next_opening(&self, now: NaiveDateTime) -> NaiveDateTime {
        let mut next = now
            .with_hour(self.start_hour)
            .and_then(|t| t.with_minute(0))
            .and_then(|t| t.with_second(0))
            .and_then(|t| t.with_nanosecond(0))
            .unwrap_or(now);
        if next <= now {
            next += ChronoDuration::days(1);
        }
        next
    }
}

/// Outcome of the per-cycle window check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowCheck {
    Open,
    Closed { reopen_at: NaiveDateTime },
}

fn parse_hour(label: &str, raw: &str) -> Result<u32> {
    let hour: u32 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow!("{label} is not an integer: {raw:?}"))?;
    if hour > 23 {
        return Err(anyhow!("{label} out of range 0..=23: {hour}"));
    }
    Ok(hour)
}

/// Evaluate the window from the raw env values. Absent values disable
/// windowing (always open). Malformed values are a configuration error; the
/// caller logs it, alerts, and treats the cycle as open.
pub fn check_window(
    start_raw: Option<&str>,
    end_raw: Option<&str>,
    now: NaiveDateTime,
) -> Result<WindowCheck> {
    let (Some(start_raw), Some(end_raw)) = (start_raw, end_raw) else {
        return Ok(WindowCheck::Open);
    };

    let window = ExecutionWindow {
        start_hour: parse_hour("EXECUTION_START_HOUR", start_raw)?,
        end_hour: parse_hour("EXECUTION_END_HOUR", end_raw)?,
    };

    if window.is_open(now.hour()) {
        Ok(WindowCheck::Open)
    } else {
        Ok(WindowCheck::Closed {
            reopen_at: window.next_opening(now),
        })
    }
}
