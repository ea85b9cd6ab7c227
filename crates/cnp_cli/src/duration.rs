use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// A duration written as `1h`, `30m`, `1d`, `1h15m30s` or plain seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HumanDuration(pub Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut total = 0u64;
        let mut number = String::new();
        let mut seen_any = false;

        for c in s.chars().filter(|c| !c.is_whitespace()) {
            if c.is_ascii_digit() {
                number.push(c);
                continue;
            }
            let value: u64 = number
                .parse()
                .map_err(|_| format!("Expected a number before '{}' in '{}'", c, s))?;
            let unit = match c {
                's' => 1,
                'm' => 60,
                'h' => 3600,
                'd' => 86400,
                _ => return Err(format!("Invalid duration unit: {}", c)),
            };
            total = value
                .checked_mul(unit)
                .and_then(|v| total.checked_add(v))
                .ok_or_else(|| format!("Duration '{}' is too large", s))?;
            number.clear();
            seen_any = true;
        }

        if !number.is_empty() {
            let value: u64 = number.parse().map_err(|_| format!("Invalid number in '{}'", s))?;
            total = total.checked_add(value).ok_or_else(|| format!("Duration '{}' is too large", s))?;
            seen_any = true;
        }

        if !seen_any {
            return Err("Duration must include a number".to_string());
        }
        if total == 0 {
            return Err("Duration must be positive".to_string());
        }
        Ok(HumanDuration(Duration::from_secs(total)))
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0.as_secs())
    }
}
