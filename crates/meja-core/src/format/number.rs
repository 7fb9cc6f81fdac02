//! Decimal number patterns (`0.00`, `#,##0`, `0.0%`, ...).

use super::locale::Locale;

/// A compiled numeric pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct NumberPattern {
    prefix: String,
    suffix: String,
    min_int: usize,
    min_frac: usize,
    max_frac: usize,
    grouping: bool,
    multiplier: f64,
}

/// The pattern used when a cell has no data format.
pub const DEFAULT_NUMBER_PATTERN: &str = "0.##########";

impl NumberPattern {
    /// Compile a pattern. Only the positive subpattern (before `;`) is used;
    /// negative numbers get a leading `-`.
    pub fn parse(pattern: &str) -> Option<NumberPattern> {
        let mut prefix = String::new();
        let mut suffix = String::new();
        let mut number = String::new();
        let mut multiplier = 1.0;
        let mut in_quote = false;
        let mut seen_number = false;
        let mut chars = pattern.chars().peekable();

        while let Some(c) = chars.next() {
            if in_quote {
                if c == '\'' {
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                        push_literal(&mut prefix, &mut suffix, seen_number, '\'');
                    } else {
                        in_quote = false;
                    }
                } else {
                    push_literal(&mut prefix, &mut suffix, seen_number, c);
                }
                continue;
            }
            match c {
                ';' => break,
                '\'' => in_quote = true,
                '0' | '#' | ',' | '.' => {
                    if seen_number && !suffix.is_empty() {
                        return None;
                    }
                    seen_number = true;
                    number.push(c);
                }
                '%' => {
                    multiplier = 100.0;
                    push_literal(&mut prefix, &mut suffix, seen_number, c);
                }
                '\u{2030}' => {
                    multiplier = 1000.0;
                    push_literal(&mut prefix, &mut suffix, seen_number, c);
                }
                c if c.is_ascii_alphabetic() => return None,
                c => push_literal(&mut prefix, &mut suffix, seen_number, c),
            }
        }
        if in_quote || !number.contains(['0', '#']) {
            return None;
        }

        let (int_part, frac_part) = match number.split_once('.') {
            Some((i, f)) => (i, f),
            None => (number.as_str(), ""),
        };
        if frac_part.contains(['.', ',']) {
            return None;
        }
        let min_int = int_part.chars().filter(|&c| c == '0').count();
        let min_frac = frac_part.chars().take_while(|&c| c == '0').count();
        let max_frac = frac_part.len();
        if frac_part[min_frac..].contains('0') {
            return None;
        }

        Some(NumberPattern {
            prefix,
            suffix,
            min_int,
            min_frac,
            max_frac,
            grouping: int_part.contains(','),
            multiplier,
        })
    }

    pub fn format(&self, value: f64, locale: Locale) -> String {
        if value.is_nan() {
            return "NaN".to_string();
        }
        let symbols = locale.symbols();
        let scaled = value * self.multiplier;
        if scaled.is_infinite() {
            let sign = if scaled < 0.0 { "-" } else { "" };
            return format!("{sign}{}\u{221e}{}", self.prefix, self.suffix);
        }

        let digits = format!("{:.*}", self.max_frac, scaled.abs());
        let (int_digits, frac_digits) = match digits.split_once('.') {
            Some((i, f)) => (i.to_string(), f.to_string()),
            None => (digits.clone(), String::new()),
        };

        let mut frac = frac_digits;
        while frac.len() > self.min_frac && frac.ends_with('0') {
            frac.pop();
        }

        let mut int = int_digits.trim_start_matches('0').to_string();
        while int.len() < self.min_int {
            int.insert(0, '0');
        }
        if int.is_empty() && frac.is_empty() {
            int.push('0');
        }
        if self.grouping {
            int = group_digits(&int, symbols.grouping_separator);
        }

        let is_zero = digits.bytes().all(|b| b == b'0' || b == b'.');
        let mut out = String::new();
        if scaled < 0.0 && !is_zero {
            out.push('-');
        }
        out.push_str(&self.prefix);
        out.push_str(&int);
        if !frac.is_empty() {
            out.push(symbols.decimal_separator);
            out.push_str(&frac);
        }
        out.push_str(&self.suffix);
        out
    }
}

fn push_literal(prefix: &mut String, suffix: &mut String, seen_number: bool, c: char) {
    if seen_number {
        suffix.push(c);
    } else {
        prefix.push(c);
    }
}

fn group_digits(int: &str, separator: char) -> String {
    let len = int.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

/// Format with [`DEFAULT_NUMBER_PATTERN`].
pub fn format_number(value: f64, locale: Locale) -> String {
    match NumberPattern::parse(DEFAULT_NUMBER_PATTERN) {
        Some(pattern) => pattern.format(value, locale),
        None => value.to_string(),
    }
}

/// Parse a number written in `locale`. Grouping separators are accepted in
/// the integer part when they split it into groups of three digits. The
/// whole string must be consumed.
pub fn parse_number(text: &str, locale: Locale) -> Option<f64> {
    let text = text.trim();
    let decimal = locale.decimal_separator();
    let mut normalized = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut seen_digit = false;
    let mut seen_decimal = false;
    let mut grouped = false;
    let mut group_len = 0usize;

    if let Some(&c) = chars.peek()
        && (c == '-' || c == '+')
    {
        normalized.push(c);
        chars.next();
    }

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            seen_digit = true;
            group_len += 1;
            normalized.push(c);
        } else if c == decimal && !seen_decimal {
            if grouped && group_len != 3 {
                return None;
            }
            seen_decimal = true;
            normalized.push('.');
        } else if locale.is_grouping_char(c) && !seen_decimal && seen_digit {
            if group_len == 0 || group_len > 3 || (grouped && group_len != 3) {
                return None;
            }
            grouped = true;
            group_len = 0;
        } else if (c == 'e' || c == 'E') && seen_digit {
            normalized.push('e');
            if let Some(&sign) = chars.peek()
                && (sign == '-' || sign == '+')
            {
                normalized.push(sign);
                chars.next();
            }
            let exponent: String = chars.by_ref().collect();
            if exponent.is_empty() || !exponent.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            normalized.push_str(&exponent);
            break;
        } else {
            return None;
        }
    }

    if !seen_digit || (grouped && !seen_decimal && group_len != 3) {
        return None;
    }
    normalized.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fmt(pattern: &str, value: f64) -> String {
        NumberPattern::parse(pattern).unwrap().format(value, Locale::Us)
    }

    #[test]
    fn test_default_pattern() {
        assert_eq!(format_number(123.5, Locale::Us), "123.5");
        assert_eq!(format_number(123.5, Locale::Germany), "123,5");
        assert_eq!(format_number(42.0, Locale::Root), "42");
        assert_eq!(format_number(-0.25, Locale::Root), "-0.25");
        assert_eq!(format_number(1.0 / 3.0, Locale::Root), "0.3333333333");
        assert_eq!(format_number(1_234_567.0, Locale::Us), "1234567");
    }

    #[test]
    fn test_fixed_and_grouped_patterns() {
        assert_eq!(fmt("0.00", 3.14159), "3.14");
        assert_eq!(fmt("0.00", 2.0), "2.00");
        assert_eq!(fmt("#,##0", 1_234_567.0), "1,234,567");
        assert_eq!(fmt("#,##0.00", -1234.5), "-1,234.50");
        assert_eq!(fmt("000", 7.0), "007");
        assert_eq!(fmt("#.##", 0.5), ".5");
        assert_eq!(fmt("0", -0.2), "0");
    }

    #[test]
    fn test_percent_and_literals() {
        assert_eq!(fmt("0%", 0.256), "26%");
        assert_eq!(fmt("0.0%", 0.256), "25.6%");
        assert_eq!(fmt("'$'#,##0.00", 1500.0), "$1,500.00");
        assert_eq!(fmt("0.0 'kg'", 2.26), "2.3 kg");
    }

    #[test]
    fn test_grouping_uses_locale() {
        let pattern = NumberPattern::parse("#,##0.00").unwrap();
        assert_eq!(pattern.format(1234.5, Locale::Germany), "1.234,50");
        assert_eq!(pattern.format(1234.5, Locale::France), "1\u{202f}234,50");
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(NumberPattern::parse("").is_none());
        assert!(NumberPattern::parse("abc").is_none());
        assert!(NumberPattern::parse("yyyy-MM-dd").is_none());
        assert!(NumberPattern::parse("0.#0").is_none());
        assert!(NumberPattern::parse("'open").is_none());
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("123.5", Locale::Us), Some(123.5));
        assert_eq!(parse_number("1,234.5", Locale::Us), Some(1234.5));
        assert_eq!(parse_number("1.234,5", Locale::Germany), Some(1234.5));
        assert_eq!(parse_number("123,5", Locale::Germany), Some(123.5));
        assert_eq!(parse_number("-7", Locale::Root), Some(-7.0));
        assert_eq!(parse_number("1e3", Locale::Root), Some(1000.0));
        assert_eq!(parse_number("1 234,5", Locale::France), Some(1234.5));
        assert_eq!(parse_number("12abc", Locale::Us), None);
        assert_eq!(parse_number("1,", Locale::Us), None);
        assert_eq!(parse_number("", Locale::Us), None);
        assert_eq!(parse_number("-", Locale::Us), None);
        assert_eq!(parse_number("2023-01-01", Locale::Us), None);
        assert_eq!(parse_number("06.05.23", Locale::Germany), None);
        assert_eq!(parse_number("1,23", Locale::Us), None);
        assert_eq!(parse_number("12,345,678", Locale::Us), Some(12_345_678.0));
    }
}
