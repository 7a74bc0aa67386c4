use std::ops::RangeBounds;
use crate::effects::DISPLAY_COLS;

pub trait WithinExt {
    fn within(&self, range: impl RangeBounds<Self>) -> bool;
}

impl <T: PartialOrd<T>> WithinExt for T {
    fn within(&self, range: impl RangeBounds<Self>) -> bool {
        range.contains(self)
    }
}

/// Formats an amount of pesos with `.` as the thousands separator, e.g. `220.000`.
pub fn format_money(amount: u64) -> String {
    let digits = amount.to_string();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push('.');
        }
        formatted.push(c);
    }
    formatted
}

/// Pads (or clips) `text` to exactly one display row, so a write fully replaces the previous row.
pub fn pad_line(text: &str) -> String {
    format!("{:<width$.width$}", text, width = DISPLAY_COLS)
}

/// Centers `text` within one display row.
pub fn center_line(text: &str) -> String {
    pad_line(&format!("{:^width$}", text, width = DISPLAY_COLS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, "0")]
    #[case(999, "999")]
    #[case(1_000, "1.000")]
    #[case(10_000, "10.000")]
    #[case(220_000, "220.000")]
    #[case(1_234_567, "1.234.567")]
    fn formats_thousands(#[case] amount: u64, #[case] expected: &str) {
        assert_eq!(format_money(amount), expected);
    }

    #[test]
    fn lines_are_exactly_one_row_wide() {
        assert_eq!(pad_line("Hi"), format!("Hi{}", " ".repeat(18)));
        assert_eq!(pad_line("ABCDEFGHIJKLMNOPQRSTUVWXYZ"), "ABCDEFGHIJKLMNOPQRST");
        assert_eq!(center_line("MATECASH"), "      MATECASH      ");
    }

    #[test]
    fn within_checks_ranges() {
        assert!(3.within(0..4));
        assert!(!4.within(0..4));
    }
}
