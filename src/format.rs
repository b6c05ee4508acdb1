//! Display formatting shared by the views

use chrono::{DateTime, Utc};

use crate::models::Profile;
use crate::session::User;

/// Whole-dollar amount with thousands separators: `$42,580`
pub fn currency(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}${}", sign, group_thousands(rounded.abs() as u64))
}

/// Unit price with cents: `$1,234.50`
pub fn price(amount: f64) -> String {
    let cents = (amount * 100.0).round();
    let sign = if cents < 0.0 { "-" } else { "" };
    let cents = cents.abs() as u64;
    format!("{}${}.{:02}", sign, group_thousands(cents / 100), cents % 100)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Coarse "time ago" label for the activity feed
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - at).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let (value, unit) = if seconds < 3_600 {
        (seconds / 60, "minute")
    } else if seconds < 86_400 {
        (seconds / 3_600, "hour")
    } else if seconds < 86_400 * 30 {
        (seconds / 86_400, "day")
    } else if seconds < 86_400 * 365 {
        (seconds / (86_400 * 30), "month")
    } else {
        (seconds / (86_400 * 365), "year")
    };

    if value == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", value, unit)
    }
}

/// Dashboard header date: `Friday, October 17, 2026`
pub fn long_date(at: DateTime<Utc>) -> String {
    at.format("%A, %B %-d, %Y").to_string()
}

/// Order table date: `Oct 17, 2026`
pub fn short_date(at: Option<DateTime<Utc>>) -> String {
    at.map(|at| at.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Profile username, else the local part of the email, else "User"
pub fn display_name(profile: Option<&Profile>, user: Option<&User>) -> String {
    if let Some(name) = profile
        .and_then(|p| p.username.as_deref())
        .filter(|name| !name.trim().is_empty())
    {
        return name.to_string();
    }

    user.and_then(|u| u.email.as_deref())
        .and_then(|email| email.split('@').next())
        .filter(|local| !local.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "User".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    #[test]
    fn test_currency() {
        assert_eq!(currency(42580.0), "$42,580");
        assert_eq!(currency(31249.6), "$31,250");
        assert_eq!(currency(0.0), "$0");
        assert_eq!(currency(999.0), "$999");
        assert_eq!(currency(1_000_000.0), "$1,000,000");
        assert_eq!(currency(-1500.0), "-$1,500");
    }

    #[test]
    fn test_price() {
        assert_eq!(price(9.5), "$9.50");
        assert_eq!(price(1234.5), "$1,234.50");
        assert_eq!(price(0.0), "$0.00");
    }

    #[test]
    fn test_relative_time() {
        let now: DateTime<Utc> = "2026-10-17T12:00:00Z".parse().unwrap();
        assert_eq!(relative_time(now - Duration::seconds(10), now), "just now");
        assert_eq!(relative_time(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(relative_time(now - Duration::hours(2), now), "2 hours ago");
        assert_eq!(relative_time(now - Duration::days(1), now), "1 day ago");
        assert_eq!(relative_time(now - Duration::days(2), now), "2 days ago");
        assert_eq!(relative_time(now - Duration::days(400), now), "1 year ago");
    }

    #[test]
    fn test_dates() {
        let at: DateTime<Utc> = "2026-10-17T12:00:00Z".parse().unwrap();
        assert_eq!(long_date(at), "Saturday, October 17, 2026");
        assert_eq!(short_date(Some(at)), "Oct 17, 2026");
        assert_eq!(short_date(None), "-");
    }

    #[test]
    fn test_display_name_fallbacks() {
        let user = User::new(Uuid::nil(), "ana.lima@sunflow.test");
        let named = Profile {
            id: Uuid::nil(),
            username: Some("Ana".into()),
        };
        let unnamed = Profile {
            id: Uuid::nil(),
            username: None,
        };

        assert_eq!(display_name(Some(&named), Some(&user)), "Ana");
        assert_eq!(display_name(Some(&unnamed), Some(&user)), "ana.lima");
        assert_eq!(display_name(None, None), "User");
    }
}
