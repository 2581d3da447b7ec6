fn group_thousands(int_part: &str) -> String {
    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    with_commas.chars().rev().collect()
}

fn fixed(val: f64, decimals: usize) -> (bool, String, String) {
    let negative = val < 0.0;
    let s = format!("{:.*}", decimals, val.abs());
    let (int_part, dec_part) = s.split_once('.').unwrap_or((s.as_str(), ""));
    // "-0.00" renders as "0.00"
    let negative = negative && s.chars().any(|c| c.is_ascii_digit() && c != '0');
    (negative, group_thousands(int_part), dec_part.to_string())
}

/// Format a float as a currency amount with thousands separators: R$ 1,234.56
pub fn money(val: f64) -> String {
    let (negative, int_part, dec_part) = fixed(val, 2);
    if negative {
        format!("-R$ {int_part}.{dec_part}")
    } else {
        format!("R$ {int_part}.{dec_part}")
    }
}

/// Like `money`, with an explicit sign for positive amounts.
pub fn signed_money(val: f64) -> String {
    let formatted = money(val);
    if formatted.starts_with('-') || formatted == "R$ 0.00" {
        formatted
    } else {
        format!("+{formatted}")
    }
}

/// Quantities carry up to three decimals; trailing zeros are dropped.
pub fn quantity(val: f64) -> String {
    let (negative, int_part, dec_part) = fixed(val, 3);
    let dec_part = dec_part.trim_end_matches('0');
    let sign = if negative { "-" } else { "" };
    if dec_part.is_empty() {
        format!("{sign}{int_part}")
    } else {
        format!("{sign}{int_part}.{dec_part}")
    }
}

pub fn pct(val: f64) -> String {
    format!("{val:.2}%")
}
