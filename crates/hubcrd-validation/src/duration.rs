//! Parsing of the `duration` string format
//!
//! The format accepts Go duration strings (`1h30m`, `1.5s`, `-300ms`) and
//! falls back to unit phrases such as `3 days` or `1 week`.

use chrono::TimeDelta;
use once_cell::sync::Lazy;
use regex::Regex;

const NANOS_PER_SECOND: i128 = 1_000_000_000;

static DURATION_PHRASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"((\d+)\s*([A-Za-zµ]+))").expect("valid regex"));

/// Unit spellings for the lenient syntax. The last spelling of each group
/// also matches as a prefix (`day` matches `days`).
const PHRASE_UNITS: &[(&[&str], i128)] = &[
    (&["ns", "nano"], 1),
    (&["us", "µs", "micro"], 1_000),
    (&["ms", "milli"], 1_000_000),
    (&["s", "sec"], NANOS_PER_SECOND),
    (&["m", "min"], 60 * NANOS_PER_SECOND),
    (&["h", "hr", "hour"], 3_600 * NANOS_PER_SECOND),
    (&["d", "day"], 86_400 * NANOS_PER_SECOND),
    (&["w", "wk", "week"], 7 * 86_400 * NANOS_PER_SECOND),
];

/// Parse a Go duration string such as `1h30m` or `-1.5s`
pub fn parse_go_duration(input: &str) -> Option<TimeDelta> {
    let (negative, mut rest) = match input.as_bytes().first() {
        Some(b'-') => (true, &input[1..]),
        Some(b'+') => (false, &input[1..]),
        _ => (false, input),
    };

    if rest == "0" {
        return Some(TimeDelta::zero());
    }
    if rest.is_empty() {
        return None;
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let int_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let int_part = &rest[..int_end];
        rest = &rest[int_end..];

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_end = after_dot
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(after_dot.len());
            frac_part = &after_dot[..frac_end];
            rest = &after_dot[frac_end..];
        }

        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }

        let unit_end = rest
            .find(|c: char| c == '.' || c.is_ascii_digit())
            .unwrap_or(rest.len());
        let unit = &rest[..unit_end];
        rest = &rest[unit_end..];

        let scale: i128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => NANOS_PER_SECOND,
            "m" => 60 * NANOS_PER_SECOND,
            "h" => 3_600 * NANOS_PER_SECOND,
            _ => return None,
        };

        if !int_part.is_empty() {
            let value: i128 = int_part.parse().ok()?;
            total = total.checked_add(value.checked_mul(scale)?)?;
        }
        if !frac_part.is_empty() {
            let digits = &frac_part[..frac_part.len().min(18)];
            let value: i128 = digits.parse().ok()?;
            let divisor = 10i128.pow(digits.len() as u32);
            total = total.checked_add(value * scale / divisor)?;
        }

        if total > i64::MAX as i128 {
            return None;
        }
    }

    let nanos = i64::try_from(if negative { -total } else { total }).ok()?;
    Some(TimeDelta::nanoseconds(nanos))
}

/// Parse the OpenAPI `duration` format: Go syntax first, then unit phrases
pub fn parse_format_duration(input: &str) -> Option<TimeDelta> {
    if let Some(duration) = parse_go_duration(input) {
        return Some(duration);
    }

    let mut total: i128 = 0;
    let mut matched = false;

    for caps in DURATION_PHRASE.captures_iter(input) {
        let factor: i128 = caps.get(2)?.as_str().parse().ok()?;
        let unit = caps.get(3)?.as_str().trim().to_lowercase();

        for (spellings, scale) in PHRASE_UNITS {
            let last = spellings.len() - 1;
            for (i, spelling) in spellings.iter().enumerate() {
                if (i == last && unit.starts_with(spelling)) || unit == *spelling {
                    matched = true;
                    total = total.checked_add(factor.checked_mul(*scale)?)?;
                }
            }
        }
    }

    if !matched {
        return None;
    }
    Some(TimeDelta::nanoseconds(i64::try_from(total).ok()?))
}
