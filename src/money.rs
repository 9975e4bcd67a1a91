//! Amount parsing and display helpers

use rust_decimal::Decimal;
use std::str::FromStr;

/// Parse form input the way a lenient numeric field does: surrounding
/// whitespace is ignored and trailing junk after a leading number is dropped
/// (`"250abc"` is 250). An exponent is honoured (`"1e3"` is 1000). Returns
/// `None` when there is no leading number at all or the value is out of range.
pub fn parse_amount(input: &str) -> Option<Decimal> {
    let text = input.trim();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if frac_end > frac_start || digits > 0 {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }

    let mut exponent = 0;
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            let exp_text = &text[end + 1..exp_end];
            exponent = exp_text.parse::<i64>().unwrap_or(if exp_text.starts_with('-') {
                i64::MIN
            } else {
                i64::MAX
            });
        }
    }

    let number = text[..end].trim_end_matches('.');
    let number = match number {
        n if n.starts_with("-.") => format!("-0{}", &n[1..]),
        n if n.starts_with("+.") => format!("0{}", &n[1..]),
        n if n.starts_with('.') => format!("0{}", n),
        n => n.trim_start_matches('+').to_string(),
    };
    scale_by_power_of_ten(Decimal::from_str(&number).ok()?, exponent)
}

/// `value * 10^exponent`, `None` on overflow. Tiny results round to zero.
fn scale_by_power_of_ten(mut value: Decimal, exponent: i64) -> Option<Decimal> {
    // 64 steps take any non-zero value past both ends of the range
    for _ in 0..exponent.unsigned_abs().min(64) {
        if value.is_zero() {
            break;
        }
        value = if exponent > 0 {
            value.checked_mul(Decimal::TEN)?
        } else {
            value.checked_div(Decimal::TEN)?
        };
    }
    Some(value)
}

/// `BDT 1,234.50`
pub fn format_bdt(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.2}", rounded.abs());
    let (whole, fraction) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, c) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    format!("BDT {}{}.{}", if negative { "-" } else { "" }, grouped, fraction)
}

/// `1234567890123456` becomes `1234 **** **** 3456`
pub fn mask_account_number(account_number: &str) -> String {
    let chars: Vec<char> = account_number.chars().collect();
    let head: String = chars.iter().take(4).collect();
    let tail: String = chars.iter().skip(12).collect();
    format!("{} **** **** {}", head, tail)
}
