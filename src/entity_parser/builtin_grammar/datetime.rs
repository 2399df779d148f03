use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone, Timelike, Weekday};
use lazy_static::lazy_static;
use regex::Regex;

use crate::ontology::*;
use crate::preprocessing::Token;

use super::numbers::is_digits;
use super::GrammarMatch;

lazy_static! {
    static ref HOUR_WITH_MERIDIEM_REGEX: Regex = Regex::new(r"^(\d{1,2})(am|pm)$").unwrap();
    static ref MINUTES_REGEX: Regex = Regex::new(r"^(\d{2})(am|pm)?$").unwrap();
}

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

#[derive(Debug, Clone, Copy, PartialEq)]
enum DayExpression {
    Now,
    Date(NaiveDate),
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TimeExpression {
    hour: u32,
    minute: u32,
    grain: Grain,
    /// Whether the hour may refer to the morning as well as the afternoon
    ambiguous: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DatetimeExpression {
    day: Option<DayExpression>,
    time: Option<TimeExpression>,
}

fn token_value(tokens: &[Token], index: usize) -> Option<&str> {
    tokens.get(index).map(|token| &*token.value)
}

fn weekday(value: &str) -> Option<Weekday> {
    match value {
        "monday" => Some(Weekday::Mon),
        "tuesday" => Some(Weekday::Tue),
        "wednesday" => Some(Weekday::Wed),
        "thursday" => Some(Weekday::Thu),
        "friday" => Some(Weekday::Fri),
        "saturday" => Some(Weekday::Sat),
        "sunday" => Some(Weekday::Sun),
        _ => None,
    }
}

fn match_day(
    tokens: &[Token],
    start: usize,
    reference: &DateTime<FixedOffset>,
) -> Option<(usize, DayExpression)> {
    let today = reference.naive_local().date();
    let day = match token_value(tokens, start)? {
        "now" => DayExpression::Now,
        "today" => DayExpression::Date(today),
        "tomorrow" => DayExpression::Date(today + Duration::days(1)),
        "yesterday" => DayExpression::Date(today - Duration::days(1)),
        value => {
            let target = weekday(value)?;
            let days_ahead = (7 + target.num_days_from_monday()
                - today.weekday().num_days_from_monday())
                % 7;
            DayExpression::Date(today + Duration::days(i64::from(days_ahead)))
        }
    };
    Some((start + 1, day))
}

fn meridiem_hour(hour: u32, meridiem: &str) -> Option<u32> {
    if hour == 0 || hour > 12 {
        return None;
    }
    match meridiem {
        "am" => Some(hour % 12),
        "pm" => Some(hour % 12 + 12),
        _ => None,
    }
}

fn match_clock_time(tokens: &[Token], start: usize, after_at: bool) -> Option<(usize, TimeExpression)> {
    let value = token_value(tokens, start)?;
    if let Some(captures) = HOUR_WITH_MERIDIEM_REGEX.captures(value) {
        let hour = meridiem_hour(captures[1].parse().ok()?, &captures[2])?;
        return Some((
            start + 1,
            TimeExpression {
                hour,
                minute: 0,
                grain: Grain::Hour,
                ambiguous: false,
            },
        ));
    }
    if !is_digits(value) || value.len() > 2 {
        return None;
    }
    let hour: u32 = value.parse().ok()?;
    if hour > 23 {
        return None;
    }

    let is_adjacent = |index: usize| {
        index < tokens.len() && tokens[index].is_adjacent_to(&tokens[index - 1])
    };
    if token_value(tokens, start + 1) == Some(":") && is_adjacent(start + 1) && is_adjacent(start + 2)
    {
        let captures = MINUTES_REGEX.captures(&tokens[start + 2].value)?;
        let minute: u32 = captures[1].parse().ok()?;
        if minute > 59 {
            return None;
        }
        let mut end = start + 3;
        let meridiem = match captures.get(2) {
            Some(meridiem) => Some(meridiem.as_str().to_string()),
            None => match token_value(tokens, end) {
                Some(value @ "am") | Some(value @ "pm") => {
                    end += 1;
                    Some(value.to_string())
                }
                _ => None,
            },
        };
        let (hour, ambiguous) = match meridiem {
            Some(meridiem) => (meridiem_hour(hour, &meridiem)?, false),
            None => (hour, hour >= 1 && hour <= 12),
        };
        return Some((
            end,
            TimeExpression {
                hour,
                minute,
                grain: Grain::Minute,
                ambiguous,
            },
        ));
    }

    match token_value(tokens, start + 1) {
        Some(meridiem @ "am") | Some(meridiem @ "pm") => Some((
            start + 2,
            TimeExpression {
                hour: meridiem_hour(hour, meridiem)?,
                minute: 0,
                grain: Grain::Hour,
                ambiguous: false,
            },
        )),
        _ if after_at => Some((
            start + 1,
            TimeExpression {
                hour,
                minute: 0,
                grain: Grain::Hour,
                ambiguous: hour >= 1 && hour <= 12,
            },
        )),
        _ => None,
    }
}

fn match_time(tokens: &[Token], start: usize) -> Option<(usize, TimeExpression)> {
    if token_value(tokens, start) == Some("at") {
        match_clock_time(tokens, start + 1, true)
    } else {
        match_clock_time(tokens, start, false)
    }
}

fn match_expression(
    tokens: &[Token],
    start: usize,
    reference: &DateTime<FixedOffset>,
) -> Option<(usize, DatetimeExpression)> {
    if let Some((day_end, day)) = match_day(tokens, start, reference) {
        if day == DayExpression::Now {
            return Some((
                day_end,
                DatetimeExpression {
                    day: Some(day),
                    time: None,
                },
            ));
        }
        return Some(match match_time(tokens, day_end) {
            Some((time_end, time)) => (
                time_end,
                DatetimeExpression {
                    day: Some(day),
                    time: Some(time),
                },
            ),
            None => (
                day_end,
                DatetimeExpression {
                    day: Some(day),
                    time: None,
                },
            ),
        });
    }
    let (time_end, time) = match_time(tokens, start)?;
    let trailing_day = match_day(tokens, time_end, reference)
        .filter(|(_, day)| *day != DayExpression::Now);
    Some(match trailing_day {
        Some((day_end, day)) => (
            day_end,
            DatetimeExpression {
                day: Some(day),
                time: Some(time),
            },
        ),
        None => (
            time_end,
            DatetimeExpression {
                day: None,
                time: Some(time),
            },
        ),
    })
}

fn at_time(
    reference: &DateTime<FixedOffset>,
    date: NaiveDate,
    hour: u32,
    minute: u32,
) -> Option<DateTime<FixedOffset>> {
    let naive_datetime = date.and_hms_opt(hour, minute, 0)?;
    reference
        .offset()
        .from_local_datetime(&naive_datetime)
        .single()
}

fn candidate_hours(time: &TimeExpression) -> Vec<u32> {
    if time.ambiguous {
        vec![time.hour % 12, time.hour % 12 + 12]
    } else {
        vec![time.hour]
    }
}

/// Resolves a time without day to its first occurrence at or after `not_before`, at the minute
/// level
fn first_occurrence(
    time: &TimeExpression,
    not_before: &DateTime<FixedOffset>,
) -> Option<DateTime<FixedOffset>> {
    let not_before_minute = (not_before.hour(), not_before.minute());
    let date = not_before.naive_local().date();
    let same_day = candidate_hours(time)
        .into_iter()
        .find(|hour| (*hour, time.minute) >= not_before_minute);
    match same_day {
        Some(hour) => at_time(not_before, date, hour, time.minute),
        None => at_time(
            not_before,
            date + Duration::days(1),
            candidate_hours(time)[0],
            time.minute,
        ),
    }
}

fn resolve(
    expression: &DatetimeExpression,
    reference: &DateTime<FixedOffset>,
) -> Option<(DateTime<FixedOffset>, Grain)> {
    match (expression.day, expression.time) {
        (Some(DayExpression::Now), _) => Some((*reference, Grain::Second)),
        (Some(DayExpression::Date(date)), Some(time)) => {
            at_time(reference, date, time.hour, time.minute).map(|instant| (instant, time.grain))
        }
        (Some(DayExpression::Date(date)), None) => {
            at_time(reference, date, 0, 0).map(|instant| (instant, Grain::Day))
        }
        (None, Some(time)) => first_occurrence(&time, reference).map(|instant| (instant, time.grain)),
        (None, None) => None,
    }
}

fn resolve_interval(
    from: &DatetimeExpression,
    to: &DatetimeExpression,
    reference: &DateTime<FixedOffset>,
) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
    match (from.day, to.day, to.time) {
        (None, Some(DayExpression::Date(date)), _) => {
            let (to_instant, _) = resolve(to, reference)?;
            let from_time = from.time?;
            let from_instant = at_time(reference, date, from_time.hour, from_time.minute)?;
            Some((from_instant, to_instant))
        }
        (_, None, Some(to_time)) => {
            let (from_instant, _) = resolve(from, reference)?;
            let to_instant = first_occurrence(&to_time, &from_instant)?;
            Some((from_instant, to_instant))
        }
        _ => Some((resolve(from, reference)?.0, resolve(to, reference)?.0)),
    }
}

fn match_interval(
    tokens: &[Token],
    start: usize,
    reference: &DateTime<FixedOffset>,
) -> Option<(usize, TimeIntervalValue)> {
    let separator = match token_value(tokens, start)? {
        "from" => "to",
        "between" => "and",
        _ => return None,
    };
    let (from_end, from) = match_expression(tokens, start + 1, reference)?;
    if token_value(tokens, from_end) != Some(separator) {
        return None;
    }
    let (to_end, to) = match_expression(tokens, from_end + 1, reference)?;
    let (from_instant, to_instant) = resolve_interval(&from, &to, reference)?;
    Some((
        to_end,
        TimeIntervalValue {
            from: Some(from_instant.format(DATETIME_FORMAT).to_string()),
            to: Some(to_instant.format(DATETIME_FORMAT).to_string()),
        },
    ))
}

pub fn match_datetimes(tokens: &[Token], reference: &DateTime<FixedOffset>) -> Vec<GrammarMatch> {
    let mut matches = vec![];
    let mut start = 0;
    while start < tokens.len() {
        if let Some((end, interval)) = match_interval(tokens, start, reference) {
            matches.push(GrammarMatch {
                tokens: start..end,
                kind: BuiltinEntityKind::Datetime,
                value: SlotValue::TimeInterval(interval),
            });
            start = end;
            continue;
        }
        let instant = match_expression(tokens, start, reference).and_then(|(end, expression)| {
            resolve(&expression, reference).map(|(instant, grain)| (end, instant, grain))
        });
        match instant {
            Some((end, instant, grain)) => {
                matches.push(GrammarMatch {
                    tokens: start..end,
                    kind: BuiltinEntityKind::Datetime,
                    value: SlotValue::InstantTime(InstantTimeValue {
                        value: instant.format(DATETIME_FORMAT).to_string(),
                        grain,
                        precision: Precision::Exact,
                    }),
                });
                start = end;
            }
            None => start += 1,
        }
    }
    matches
}
