//! Natural-language time expressions for alarms and durations for timers.
//!
//! Interpretations prefer the future: a clock time that has already passed
//! today means tomorrow, and a bare hour without am/pm picks whichever of
//! the two readings comes next.

use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone};

use super::scheduler::MAX_TIMER_SECONDS;

pub trait TimeParser: Send + Sync {
    fn parse(&self, text: &str, now: DateTime<Local>) -> Option<DateTime<Local>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NaturalTimeParser;

impl NaturalTimeParser {
    pub fn new() -> Self {
        Self
    }
}

impl TimeParser for NaturalTimeParser {
    fn parse(&self, text: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
        parse_time_expression(text, now)
    }
}

/// Words that carry no meaning in a time expression.
/// "to" after "quarter" is consumed before filler skipping applies.
const FILLERS: [&str; 11] = ["for", "at", "to", "on", "the", "and", "please", "me", "up", "wake", "by"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Day {
    Today,
    Tomorrow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Meridiem {
    Am,
    Pm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Clock {
    hour: u32,
    minute: u32,
    meridiem: Option<Meridiem>,
}

/// Lowercases, normalizes "a.m."/"o'clock", and splits "7am" into "7 am".
fn tokenize(text: &str) -> Vec<String> {
    let cleaned = text
        .to_lowercase()
        .replace("a.m.", "am")
        .replace("p.m.", "pm")
        .replace("o'clock", " ")
        .replace("oclock", " ")
        .replace([',', '!', '?'], " ");

    let mut tokens = Vec::new();
    for word in cleaned.split_whitespace() {
        let word = word.trim_end_matches('.');
        let split = word
            .char_indices()
            .find(|&(i, c)| i > 0 && c.is_ascii_alphabetic())
            .map(|(i, _)| i)
            .filter(|&i| word[..i].chars().all(|c| c.is_ascii_digit() || c == ':' || c == '.'));
        match split {
            Some(i) => {
                tokens.push(word[..i].to_string());
                tokens.push(word[i..].to_string());
            }
            None if !word.is_empty() => tokens.push(word.to_string()),
            None => {}
        }
    }
    tokens
}

fn number_word(token: &str) -> Option<u64> {
    let n = match token {
        "a" | "an" | "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "fifteen" => 15,
        "twenty" => 20,
        "thirty" => 30,
        "forty" => 40,
        "fifty" => 50,
        "sixty" => 60,
        _ => return token.parse::<u64>().ok(),
    };
    Some(n)
}

fn unit_seconds(token: &str) -> Option<u64> {
    match token {
        "s" | "sec" | "secs" | "second" | "seconds" => Some(1),
        "m" | "min" | "mins" | "minute" | "minutes" => Some(60),
        "h" | "hr" | "hrs" | "hour" | "hours" => Some(3600),
        _ => None,
    }
}

/// Reads a timer duration such as "for 2 minutes", "90", or "1 hour 30 minutes".
/// A number without a unit counts as seconds.
pub fn parse_duration_seconds(text: &str) -> Option<u64> {
    let tokens = tokenize(text);
    duration_from_tokens(&tokens)
}

fn duration_from_tokens(tokens: &[String]) -> Option<u64> {
    let mut total: u64 = 0;
    let mut seen_amount = false;
    let mut iter = tokens
        .iter()
        .map(String::as_str)
        .filter(|t| !FILLERS.contains(t))
        .peekable();

    while let Some(token) = iter.next() {
        let amount = number_word(token)?;
        let unit = match iter.peek().and_then(|next| unit_seconds(next)) {
            Some(unit) => {
                iter.next();
                unit
            }
            None => 1,
        };
        total = total.checked_add(amount.checked_mul(unit)?)?;
        seen_amount = true;
    }

    (seen_amount && total > 0 && total <= MAX_TIMER_SECONDS).then_some(total)
}

/// Parses an hour token: "7", "7:30", "7.30", "19:45", or a number word.
fn clock_from_token(token: &str) -> Option<(u32, u32)> {
    if let Some((h, m)) = token.split_once(':').or_else(|| token.split_once('.')) {
        let hour = h.parse::<u32>().ok()?;
        let minute = m.parse::<u32>().ok()?;
        return (m.len() == 2 && hour < 24 && minute < 60).then_some((hour, minute));
    }
    let hour = u32::try_from(number_word(token)?).ok()?;
    (hour < 24 && !matches!(token, "a" | "an")).then_some((hour, 0))
}

fn meridiem(token: &str) -> Option<Meridiem> {
    match token {
        "am" => Some(Meridiem::Am),
        "pm" => Some(Meridiem::Pm),
        _ => None,
    }
}

/// Parses an alarm time. Returns `None` for anything it does not fully understand.
pub fn parse_time_expression(text: &str, now: DateTime<Local>) -> Option<DateTime<Local>> {
    let tokens = tokenize(text);
    let words: Vec<&str> = tokens.iter().map(String::as_str).collect();
    if words.is_empty() {
        return None;
    }

    // Relative: "in 10 minutes", "10 minutes from now".
    let relative = match words.as_slice() {
        ["in", rest @ ..] => Some(rest),
        [rest @ .., "from", "now"] => Some(rest),
        _ => None,
    };
    if let Some(rest) = relative {
        let owned: Vec<String> = rest.iter().map(|s| s.to_string()).collect();
        let seconds = duration_from_tokens(&owned)?;
        return now.checked_add_signed(chrono::Duration::try_seconds(seconds as i64)?);
    }

    let mut day = None;
    let mut clock: Option<Clock> = None;
    let mut hint: Option<Meridiem> = None;
    let mut tonight = false;
    let mut offset_minutes: i64 = 0;
    let mut i = 0;

    while i < words.len() {
        let word = words[i];
        match word {
            w if FILLERS.contains(&w) => {}
            "today" => day = Some(Day::Today),
            "tomorrow" => day = Some(Day::Tomorrow),
            "tonight" => {
                day = Some(Day::Today);
                hint = Some(Meridiem::Pm);
                tonight = true;
            }
            "morning" => hint = Some(Meridiem::Am),
            "afternoon" | "evening" | "night" => hint = Some(Meridiem::Pm),
            // "in the morning", "this evening"
            "in" | "this" => {}
            "noon" | "midday" => {
                set_once(&mut clock, Clock { hour: 12, minute: 0, meridiem: Some(Meridiem::Pm) })?;
            }
            "midnight" => {
                set_once(&mut clock, Clock { hour: 12, minute: 0, meridiem: Some(Meridiem::Am) })?;
            }
            "half" | "quarter" => {
                // "half past 7", "quarter past 7", "quarter to 7"
                let relation = *words.get(i + 1)?;
                let (hour, _) = clock_from_token(words.get(i + 2)?)?;
                // "quarter to" counts back from the hour as said, after am/pm applies.
                let (minute, offset) = match (word, relation) {
                    ("half", "past") => (30, 0),
                    ("quarter", "past") => (15, 0),
                    ("quarter", "to") => (0, -15),
                    _ => return None,
                };
                offset_minutes = offset;
                i += 2;
                let mer = words.get(i + 1).and_then(|t| meridiem(t));
                if mer.is_some() {
                    i += 1;
                }
                set_once(&mut clock, Clock { hour, minute, meridiem: mer })?;
            }
            other => {
                let (hour, minute) = clock_from_token(other)?;
                let mer = words.get(i + 1).and_then(|t| meridiem(t));
                if mer.is_some() {
                    i += 1;
                }
                set_once(&mut clock, Clock { hour, minute, meridiem: mer })?;
            }
        }
        i += 1;
    }

    let Some(mut clock) = clock else {
        // "tomorrow" alone: same time tomorrow.
        return match day {
            Some(Day::Tomorrow) => now.checked_add_signed(chrono::Duration::days(1)),
            _ => None,
        };
    };

    // "12 tonight" is the coming midnight, not noon.
    if tonight && clock.hour == 12 && clock.meridiem != Some(Meridiem::Pm) {
        clock.meridiem = Some(Meridiem::Am);
        day = None;
    }

    let hours = candidate_hours(clock, hint)?;
    let offset = chrono::Duration::try_minutes(offset_minutes)?;
    let resolve = |date: NaiveDate, hour: u32| {
        at(date, hour, clock.minute).and_then(|t| t.checked_add_signed(offset))
    };
    let today = now.date_naive();
    match day {
        Some(Day::Tomorrow) => {
            let date = today.succ_opt()?;
            hours.iter().find_map(|&h| resolve(date, h))
        }
        Some(Day::Today) => {
            let options: Vec<_> = hours.iter().filter_map(|&h| resolve(today, h)).collect();
            options
                .iter()
                .copied()
                .find(|t| *t > now)
                .or_else(|| options.last().copied())
        }
        None => {
            let tomorrow = today.succ_opt()?;
            let mut options: Vec<_> = hours
                .iter()
                .filter_map(|&h| resolve(today, h))
                .chain(hours.iter().filter_map(|&h| resolve(tomorrow, h)))
                .filter(|t| *t > now)
                .collect();
            options.sort();
            options.first().copied()
        }
    }
}

fn set_once(slot: &mut Option<Clock>, value: Clock) -> Option<()> {
    if slot.is_some() {
        return None;
    }
    *slot = Some(value);
    Some(())
}

/// 24-hour readings of a clock time, earliest first.
fn candidate_hours(clock: Clock, hint: Option<Meridiem>) -> Option<Vec<u32>> {
    let mer = clock.meridiem.or(hint);
    match (clock.hour, mer) {
        (0, Some(_)) | (13..=23, Some(Meridiem::Am)) => None,
        (13..=23, _) | (0, None) => Some(vec![clock.hour]),
        (12, Some(Meridiem::Am)) => Some(vec![0]),
        (12, Some(Meridiem::Pm)) => Some(vec![12]),
        (h, Some(Meridiem::Am)) => Some(vec![h]),
        (h, Some(Meridiem::Pm)) => Some(vec![h + 12]),
        (12, None) => Some(vec![0, 12]),
        (h, None) => Some(vec![h, h + 12]),
    }
}

fn at(date: NaiveDate, hour: u32, minute: u32) -> Option<DateTime<Local>> {
    let naive = date.and_time(NaiveTime::from_hms_opt(hour, minute, 0)?);
    let local = Local.from_local_datetime(&naive);
    local.earliest().or_else(|| local.latest())
}
