//! Utility functions for the count_forecast crate

/// `count` consecutive years starting at `start`
pub fn consecutive_years(start: i32, count: usize) -> Vec<i32> {
    (0..count as i32).map(|i| start + i).collect()
}

/// Round to the nearest integer and group thousands with commas, e.g. `20,291`
pub fn group_thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Like [`group_thousands`] but always carries a sign, e.g. `+1,204`
pub fn signed_thousands(value: f64) -> String {
    if value.round() < 0.0 {
        group_thousands(value)
    } else {
        format!("+{}", group_thousands(value))
    }
}
