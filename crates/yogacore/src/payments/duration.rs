use chrono::TimeDelta;
use lazy_regex::regex_captures;

use crate::error::{AppError, AppResult};

const DAYS_PER_MONTH: i64 = 30;

/// Parses a plan duration such as "7 дней", "1 месяц" or "3 months".
///
/// A month counts as 30 days.
pub fn parse_plan_duration(text: &str) -> AppResult<TimeDelta> {
    let invalid = || AppError::Validation(format!("unsupported plan duration {:?}", text));

    let (_, count, unit) = regex_captures!(r"^\s*(\d+)\s*(\p{L}+)\s*$", text).ok_or_else(invalid)?;
    let count: i64 = count.parse().map_err(|_| invalid())?;

    let days = match unit.to_lowercase().as_str() {
        "день" | "дня" | "дней" | "day" | "days" => count,
        "месяц" | "месяца" | "месяцев" | "month" | "months" => count.checked_mul(DAYS_PER_MONTH).ok_or_else(invalid)?,
        _ => return Err(invalid()),
    };
    TimeDelta::try_days(days).ok_or_else(invalid)
}
