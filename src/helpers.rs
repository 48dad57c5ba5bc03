use std::sync::OnceLock;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

/// Format a money amount the way the lead tables show it: grouped thousands,
/// no decimals for whole amounts, cents otherwise ("$25,000", "$1,250.5").
pub fn format_currency(amount: f64, currency: &str) -> String {
    let symbol = match currency.to_uppercase().as_str() {
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        "GBP" => "£".to_string(),
        "INR" => "₹".to_string(),
        other => format!("{} ", other),
    };

    let cents = (amount.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let frac = cents % 100;

    let grouped = group_thousands(whole);
    let fraction = match frac {
        0 => String::new(),
        f if f % 10 == 0 => format!(".{}", f / 10),
        f => format!(".{:02}", f),
    };

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}{}{}{}", sign, symbol, grouped, fraction)
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

/// "2,547"
pub fn format_count(count: usize) -> String {
    group_thousands(count as u64)
}

/// First letter of each word: "Sarah Johnson" -> "SJ". Empty names give "U".
pub fn initials(name: &str) -> String {
    let letters: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() {
        "U".to_string()
    } else {
        letters
    }
}

/// "Oct 18, 2026" in local time.
pub fn format_date(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%b %-d, %Y").to_string()
}

/// "Oct 18, 2026, 02:30 PM" in local time.
pub fn format_date_time(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local)
        .format("%b %-d, %Y, %I:%M %p")
        .to_string()
}

fn email_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
}

/// Loose shape check for e-mail form fields.
pub fn is_valid_email(value: &str) -> bool {
    email_re().is_some_and(|re| re.is_match(value.trim()))
}

/// Parse a due-date form value: RFC 3339, or the `YYYY-MM-DDTHH:MM` a
/// datetime input produces (interpreted in local time).
pub fn parse_due_date(value: &str) -> Result<DateTime<Utc>, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("Due date is required".to_string());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc));
    }

    let naive = ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| format!("Invalid due date: {}", trimmed))?;

    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| format!("Due date does not exist in local time: {}", trimmed))
}

/// Parse a money form value. Empty means "no value".
pub fn parse_amount(value: &str) -> Result<Option<f64>, String> {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | ' '))
        .collect();
    if cleaned.is_empty() {
        return Ok(None);
    }
    match cleaned.parse::<f64>() {
        Ok(amount) if amount.is_finite() => Ok(Some(amount)),
        _ => Err(format!("Invalid value: {}", value.trim())),
    }
}

/// Percentage change between two periods, rounded to a whole percent.
/// A rise from zero counts as +100%.
pub fn percent_change(current: f64, previous: f64) -> i64 {
    if previous == 0.0 {
        return if current > 0.0 { 100 } else { 0 };
    }
    (((current - previous) / previous) * 100.0).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(25_000.0, "USD"), "$25,000");
        assert_eq!(format_currency(12_500.5, "usd"), "$12,500.5");
        assert_eq!(format_currency(999.99, "USD"), "$999.99");
        assert_eq!(format_currency(1_234_567.0, "EUR"), "€1,234,567");
        assert_eq!(format_currency(0.0, "USD"), "$0");
        assert_eq!(format_currency(-1500.0, "USD"), "-$1,500");
        assert_eq!(format_currency(10.0, "CHF"), "CHF 10");
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(284), "284");
        assert_eq!(format_count(2547), "2,547");
        assert_eq!(format_count(1_000_000), "1,000,000");
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("Sarah Johnson"), "SJ");
        assert_eq!(initials("  emily   rodriguez "), "ER");
        assert_eq!(initials(""), "U");
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("sarah@acme.com"));
        assert!(is_valid_email(" sarah@acme.co.uk "));
        assert!(!is_valid_email("sarah@acme"));
        assert!(!is_valid_email("sarah acme.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn test_parse_due_date_forms() {
        let utc = parse_due_date("2026-10-20T15:00:00Z").expect("rfc3339");
        assert_eq!(utc.to_rfc3339(), "2026-10-20T15:00:00+00:00");

        let local = parse_due_date("2026-10-20T15:00").expect("datetime-local");
        assert_eq!(
            local.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
            "2026-10-20 15:00"
        );

        assert!(parse_due_date("").is_err());
        assert!(parse_due_date("next tuesday").is_err());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(""), Ok(None));
        assert_eq!(parse_amount("25000"), Ok(Some(25_000.0)));
        assert_eq!(parse_amount("$12,500.50"), Ok(Some(12_500.5)));
        assert!(parse_amount("lots").is_err());
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(12.0, 10.0), 20);
        assert_eq!(percent_change(5.0, 10.0), -50);
        assert_eq!(percent_change(3.0, 0.0), 100);
        assert_eq!(percent_change(0.0, 0.0), 0);
    }
}
