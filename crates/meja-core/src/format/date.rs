//! Date patterns in `yyyy-MM-dd HH:mm:ss` notation.
//!
//! Supported letters: `y` year, `M` month (`MMM`/`MMMM` for names), `d` day,
//! `E` weekday, `H` hour 0-23, `h` hour 1-12, `m` minute, `s` second,
//! `S` millisecond, `a` am/pm marker. Text in single quotes is literal.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use super::locale::Locale;

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    Field(char, usize),
    Literal(String),
}

/// A compiled date pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatePattern {
    tokens: Vec<Token>,
}

const FIELD_LETTERS: &str = "yMdEHhmsSa";

impl DatePattern {
    pub fn parse(pattern: &str) -> Option<DatePattern> {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars().peekable();
        let mut has_field = false;

        while let Some(c) = chars.next() {
            if c == '\'' {
                if chars.peek() == Some(&'\'') {
                    chars.next();
                    literal.push('\'');
                    continue;
                }
                let mut closed = false;
                while let Some(q) = chars.next() {
                    if q == '\'' {
                        if chars.peek() == Some(&'\'') {
                            chars.next();
                            literal.push('\'');
                        } else {
                            closed = true;
                            break;
                        }
                    } else {
                        literal.push(q);
                    }
                }
                if !closed {
                    return None;
                }
            } else if FIELD_LETTERS.contains(c) {
                if !literal.is_empty() {
                    tokens.push(Token::Literal(std::mem::take(&mut literal)));
                }
                let mut count = 1;
                while chars.peek() == Some(&c) {
                    chars.next();
                    count += 1;
                }
                tokens.push(Token::Field(c, count));
                has_field = true;
            } else if c.is_ascii_alphabetic() {
                return None;
            } else {
                literal.push(c);
            }
        }
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }
        has_field.then_some(DatePattern { tokens })
    }

    /// Whether the pattern prints any time-of-day field.
    pub fn has_time(&self) -> bool {
        self.tokens
            .iter()
            .any(|t| matches!(t, Token::Field('H' | 'h' | 'm' | 's' | 'S' | 'a', _)))
    }

    pub fn format(&self, value: &NaiveDateTime, locale: Locale) -> String {
        let symbols = locale.symbols();
        let mut out = String::new();
        for token in &self.tokens {
            match token {
                Token::Literal(s) => out.push_str(s),
                Token::Field(c, n) => {
                    let n = *n;
                    match c {
                        'y' if n == 2 => push_padded(&mut out, value.year().rem_euclid(100), 2),
                        'y' => push_padded(&mut out, value.year(), n),
                        'M' if n >= 4 => out.push_str(symbols.months_long[value.month0() as usize]),
                        'M' if n == 3 => out.push_str(symbols.months_short[value.month0() as usize]),
                        'M' => push_padded(&mut out, value.month() as i32, n),
                        'd' => push_padded(&mut out, value.day() as i32, n),
                        'E' => out.push_str(
                            symbols.weekdays_short[value.weekday().num_days_from_monday() as usize],
                        ),
                        'H' => push_padded(&mut out, value.hour() as i32, n),
                        'h' => {
                            let h = value.hour() % 12;
                            push_padded(&mut out, if h == 0 { 12 } else { h as i32 }, n)
                        }
                        'm' => push_padded(&mut out, value.minute() as i32, n),
                        's' => push_padded(&mut out, value.second() as i32, n),
                        'S' => push_padded(&mut out, (value.nanosecond() / 1_000_000) as i32, n.max(3)),
                        'a' => out.push_str(symbols.am_pm[(value.hour() >= 12) as usize]),
                        _ => {}
                    }
                }
            }
        }
        out
    }

    /// Parse `text` against the pattern. Month names match case-insensitively.
    pub fn parse_date_time(&self, text: &str, locale: Locale) -> Option<NaiveDateTime> {
        let symbols = locale.symbols();
        let mut rest = text.trim();
        let (mut year, mut month, mut day) = (None, None, None);
        let (mut hour, mut minute, mut second) = (0u32, 0u32, 0u32);
        let mut pm = None;

        for (i, token) in self.tokens.iter().enumerate() {
            match token {
                Token::Literal(lit) => {
                    rest = strip_literal(rest, lit)?;
                }
                Token::Field(c, n) => {
                    let n = *n;
                    let next_is_field = matches!(self.tokens.get(i + 1), Some(Token::Field(..)));
                    let width = if next_is_field { n.max(1) } else { usize::MAX };
                    match c {
                        'M' if n >= 3 => {
                            let names = if n >= 4 { &symbols.months_long } else { &symbols.months_short };
                            let (m, r) = match_name(rest, names)
                                .or_else(|| match_name(rest, &symbols.months_long))?;
                            month = Some(m as u32 + 1);
                            rest = r;
                        }
                        'E' => {
                            let (_, r) = match_name(rest, &symbols.weekdays_short)?;
                            rest = r;
                        }
                        'a' => {
                            let (idx, r) = match_name(rest, &symbols.am_pm)?;
                            pm = Some(idx == 1);
                            rest = r;
                        }
                        _ => {
                            let (v, r) = take_number(rest, width)?;
                            rest = r;
                            match c {
                                'y' if n == 2 && v < 100 => {
                                    year = Some(if v < 70 { 2000 + v as i32 } else { 1900 + v as i32 })
                                }
                                'y' => year = Some(v as i32),
                                'M' => month = Some(v),
                                'd' => day = Some(v),
                                'H' => hour = v,
                                'h' => hour = v % 12,
                                'm' => minute = v,
                                's' => second = v,
                                _ => {}
                            }
                        }
                    }
                }
            }
        }
        if !rest.is_empty() {
            return None;
        }
        if pm == Some(true) && hour < 12 {
            hour += 12;
        }
        let date = NaiveDate::from_ymd_opt(year?, month?, day.unwrap_or(1))?;
        let time = NaiveTime::from_hms_opt(hour, minute, second)?;
        Some(date.and_time(time))
    }
}

fn push_padded(out: &mut String, value: i32, width: usize) {
    out.push_str(&format!("{value:0width$}"));
}

fn strip_literal<'a>(rest: &'a str, literal: &str) -> Option<&'a str> {
    if let Some(r) = rest.strip_prefix(literal) {
        return Some(r);
    }
    // Whitespace in a literal matches any run of whitespace.
    if literal.trim().is_empty() && rest.starts_with(char::is_whitespace) {
        return Some(rest.trim_start());
    }
    None
}

fn take_number(rest: &str, max_width: usize) -> Option<(u32, &str)> {
    let end = rest
        .char_indices()
        .take(max_width)
        .take_while(|(_, c)| c.is_ascii_digit())
        .map(|(i, c)| i + c.len_utf8())
        .last()?;
    let value = rest[..end].parse().ok()?;
    Some((value, &rest[end..]))
}

fn match_name<'a>(rest: &'a str, names: &[&str]) -> Option<(usize, &'a str)> {
    let lower = rest.to_lowercase();
    names
        .iter()
        .enumerate()
        .filter(|(_, name)| lower.starts_with(&name.to_lowercase()))
        .max_by_key(|(_, name)| name.len())
        .and_then(|(idx, name)| rest.get(name.len()..).map(|r| (idx, r)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_format_medium_dates() {
        let value = dt(2023, 1, 1, 0, 0, 0);
        let medium = |locale: Locale| {
            DatePattern::parse(locale.symbols().medium_date)
                .unwrap()
                .format(&value, locale)
        };
        assert_eq!(medium(Locale::Us), "Jan 1, 2023");
        assert_eq!(medium(Locale::Germany), "01.01.2023");
        assert_eq!(medium(Locale::France), "1 janv. 2023");
        assert_eq!(medium(Locale::Root), "2023-01-01");
    }

    #[test]
    fn test_format_time_fields() {
        let value = dt(2024, 7, 9, 15, 4, 5);
        let p = DatePattern::parse("yy/M/d h:mm:ss a 'o''clock' EEE").unwrap();
        assert_eq!(p.format(&value, Locale::Us), "24/7/9 3:04:05 PM o'clock Tue");
        assert!(p.has_time());
        assert!(!DatePattern::parse("yyyy-MM-dd").unwrap().has_time());
    }

    #[test]
    fn test_invalid_patterns() {
        assert!(DatePattern::parse("0.00").is_none());
        assert!(DatePattern::parse("yyyy-QQ").is_none());
        assert!(DatePattern::parse("'unterminated yyyy").is_none());
    }

    #[test]
    fn test_parse_round_trips_through_locale_patterns() {
        let value = dt(2023, 11, 5, 0, 0, 0);
        for locale in Locale::ALL {
            let symbols = locale.symbols();
            for pattern in [symbols.short_date, symbols.medium_date, symbols.long_date] {
                let p = DatePattern::parse(pattern).unwrap();
                let text = p.format(&value, locale);
                assert_eq!(p.parse_date_time(&text, locale), Some(value), "{locale} {pattern}");
            }
        }
    }

    #[test]
    fn test_parse_lenient_digits() {
        let p = DatePattern::parse("M/d/yy").unwrap();
        assert_eq!(p.parse_date_time("1/2/23", Locale::Us), Some(dt(2023, 1, 2, 0, 0, 0)));
        assert_eq!(p.parse_date_time("12/31/99", Locale::Us), Some(dt(1999, 12, 31, 0, 0, 0)));
        assert_eq!(p.parse_date_time("13/1/23", Locale::Us), None);
        assert_eq!(p.parse_date_time("1/2/23 extra", Locale::Us), None);
    }

    #[test]
    fn test_parse_with_time() {
        let p = DatePattern::parse("yyyy-MM-dd HH:mm:ss").unwrap();
        assert_eq!(
            p.parse_date_time("2020-02-29 23:59:01", Locale::Root),
            Some(dt(2020, 2, 29, 23, 59, 1))
        );
    }
}
