//! Text formatting shared by the narrative and header renderers.

/// English ordinal for a positive integer: `1st`, `2nd`, `3rd`, `4th`,
/// `11th`, `12th`, `13th`, `21st`, `112th`.
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Whole-dollar amount with thousands separators: `$1,234,567`.
pub fn format_money(amount: f64) -> String {
    let rounded = amount.max(0.0).round() as u64;
    let digits = rounded.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("${out}")
}

/// Race time in `m:ss.f` form: `112.4` → `1:52.4`. Times under a minute
/// keep the bare seconds: `58.2` → `:58.2`.
pub fn format_time(seconds: f64) -> String {
    let tenths = (seconds * 10.0).round() as u64;
    let minutes = tenths / 600;
    let rest = tenths % 600;
    let secs = rest / 10;
    let frac = rest % 10;
    if minutes == 0 {
        format!(":{secs:02}.{frac}")
    } else {
        format!("{minutes}:{secs:02}.{frac}")
    }
}
