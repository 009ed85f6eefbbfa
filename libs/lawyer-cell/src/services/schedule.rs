use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

pub const DEFAULT_START_HOUR: i32 = 8;
pub const DEFAULT_END_HOUR: i32 = 18;
pub const SLOT_MINUTES: u32 = 30;

/// Lunch break marks that are never offered (12:00 to 13:30).
const LUNCH_SLOTS: [&str; 3] = ["12:00:00", "12:30:00", "13:00:00"];

/// Candidate time-of-day slots for one day: every half hour from `start_hour:00`
/// through `end_hour:00` inclusive, lunch removed. Hours are clamped to 0..=23.
pub fn generate_time_slots(start_hour: Option<i32>, end_hour: Option<i32>) -> Vec<String> {
    let start = start_hour.unwrap_or(DEFAULT_START_HOUR).clamp(0, 23) as u32;
    let end = end_hour.unwrap_or(DEFAULT_END_HOUR).clamp(0, 23) as u32;

    if start > end {
        return Vec::new();
    }

    let mut slots = Vec::with_capacity(((end - start) * 2 + 1) as usize);
    for hour in start..=end {
        for minute in (0..60).step_by(SLOT_MINUTES as usize) {
            if hour == end && minute > 0 {
                break;
            }
            slots.push(format!("{:02}:{:02}:00", hour, minute));
        }
    }

    slots.retain(|slot| !LUNCH_SLOTS.contains(&slot.as_str()));
    slots
}

/// Accepts `HH:MM` or `HH:MM:SS` on a 24h clock.
pub fn parse_time_of_day(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

pub fn minutes_since_midnight(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// `HH:MM` label for a `HH:MM:SS` value.
pub fn slot_label(value: &str) -> String {
    value.get(..5).unwrap_or(value).to_string()
}

/// 0 = Sunday .. 6 = Saturday.
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// `R$ 1.234,56`
pub fn format_price_label(cents: i64) -> String {
    let reais = cents / 100;
    let centavos = (cents % 100).abs();

    let digits = reais.abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if cents < 0 { "-" } else { "" };
    format!("R$ {}{},{:02}", sign, grouped, centavos)
}

/// Reads a price label back into cents. Everything except digits and the decimal
/// comma is ignored, so `R$ 1.234,56` gives 123456.
pub fn parse_price_label(label: &str) -> Option<i64> {
    let cleaned: String = label
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',')
        .collect();

    let (whole, fraction) = match cleaned.split_once(',') {
        Some((whole, fraction)) => (whole, fraction),
        None => (cleaned.as_str(), ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return None;
    }

    let whole: i64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let fraction: String = fraction.chars().filter(|c| c.is_ascii_digit()).take(2).collect();
    let fraction_cents: i64 = match fraction.len() {
        0 => 0,
        1 => fraction.parse::<i64>().ok()? * 10,
        _ => fraction.parse().ok()?,
    };

    Some(whole * 100 + fraction_cents)
}
