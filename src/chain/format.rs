//! Address and amount helpers

use regex::Regex;
use std::sync::OnceLock;

/// Default decimals for APT
pub const APT_DECIMALS: u32 = 8;

/// Largest decimals value a token may declare
pub const MAX_DECIMALS: u32 = 18;

/// `0x` followed by exactly 64 hex digits
pub fn is_valid_address(address: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^0x[a-fA-F0-9]{64}$").expect("static pattern"))
        .is_match(address)
}

/// `0x` followed by exactly 64 hex digits, as fullnodes report them
pub fn is_valid_transaction_hash(hash: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^0x[0-9a-fA-F]{64}$").expect("static pattern"))
        .is_match(hash)
}

/// 1-10 upper-case letters or digits
pub fn is_valid_token_symbol(symbol: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z0-9]{1,10}$").expect("static pattern"))
        .is_match(symbol)
}

/// `0x1234...cdef`; short input comes back unchanged
pub fn truncate_address(address: &str, start: usize, end: usize) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= start + end {
        return address.to_string();
    }
    let head: String = chars[..start].iter().collect();
    let tail: String = chars[chars.len() - end..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Render base units as a grouped decimal with 2 to 6 fraction digits
///
/// Returns `None` when `raw` is not a finite number or `decimals` exceeds
/// [`MAX_DECIMALS`].
pub fn format_balance(raw: &str, decimals: u32) -> Option<String> {
    let value = parse_finite(raw)?;
    let scaled = value / scale(decimals)?;

    let fixed = format!("{:.6}", scaled.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut frac = frac_part.trim_end_matches('0').to_string();
    while frac.len() < 2 {
        frac.push('0');
    }

    let sign = if scaled < 0.0 { "-" } else { "" };
    Some(format!("{}{}.{}", sign, group_thousands(int_part), frac))
}

/// Convert a display amount to base units
pub fn parse_balance(display: &str, decimals: u32) -> Option<String> {
    let value = parse_finite(&display.replace(',', ""))?;
    let base = (value * scale(decimals)?).round();
    Some(format!("{:.0}", base))
}

fn parse_finite(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

fn scale(decimals: u32) -> Option<f64> {
    (decimals <= MAX_DECIMALS).then(|| 10f64.powi(decimals as i32))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
