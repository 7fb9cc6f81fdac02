use serde::{Deserialize, Serialize};
use std::fmt;

/// Locale-specific symbols used for display and import.
#[derive(Debug)]
pub struct LocaleSymbols {
    pub decimal_separator: char,
    pub grouping_separator: char,
    pub months_short: [&'static str; 12],
    pub months_long: [&'static str; 12],
    pub weekdays_short: [&'static str; 7],
    pub am_pm: [&'static str; 2],
    pub short_date: &'static str,
    pub medium_date: &'static str,
    pub long_date: &'static str,
    pub medium_date_time: &'static str,
}

const MONTHS_EN_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const MONTHS_EN_LONG: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];
const WEEKDAYS_EN: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

static ROOT: LocaleSymbols = LocaleSymbols {
    decimal_separator: '.',
    grouping_separator: ',',
    months_short: MONTHS_EN_SHORT,
    months_long: MONTHS_EN_LONG,
    weekdays_short: WEEKDAYS_EN,
    am_pm: ["AM", "PM"],
    short_date: "yyyy-MM-dd",
    medium_date: "yyyy-MM-dd",
    long_date: "yyyy MMMM d",
    medium_date_time: "yyyy-MM-dd HH:mm:ss",
};

static US: LocaleSymbols = LocaleSymbols {
    decimal_separator: '.',
    grouping_separator: ',',
    months_short: MONTHS_EN_SHORT,
    months_long: MONTHS_EN_LONG,
    weekdays_short: WEEKDAYS_EN,
    am_pm: ["AM", "PM"],
    short_date: "M/d/yy",
    medium_date: "MMM d, yyyy",
    long_date: "MMMM d, yyyy",
    medium_date_time: "MMM d, yyyy, h:mm:ss a",
};

static UK: LocaleSymbols = LocaleSymbols {
    decimal_separator: '.',
    grouping_separator: ',',
    months_short: MONTHS_EN_SHORT,
    months_long: MONTHS_EN_LONG,
    weekdays_short: WEEKDAYS_EN,
    am_pm: ["am", "pm"],
    short_date: "dd/MM/yyyy",
    medium_date: "d MMM yyyy",
    long_date: "d MMMM yyyy",
    medium_date_time: "d MMM yyyy, HH:mm:ss",
};

static GERMANY: LocaleSymbols = LocaleSymbols {
    decimal_separator: ',',
    grouping_separator: '.',
    months_short: [
        "Jan.", "Feb.", "März", "Apr.", "Mai", "Juni", "Juli", "Aug.", "Sept.", "Okt.", "Nov.",
        "Dez.",
    ],
    months_long: [
        "Januar",
        "Februar",
        "März",
        "April",
        "Mai",
        "Juni",
        "Juli",
        "August",
        "September",
        "Oktober",
        "November",
        "Dezember",
    ],
    weekdays_short: ["Mo.", "Di.", "Mi.", "Do.", "Fr.", "Sa.", "So."],
    am_pm: ["AM", "PM"],
    short_date: "dd.MM.yy",
    medium_date: "dd.MM.yyyy",
    long_date: "d. MMMM yyyy",
    medium_date_time: "dd.MM.yyyy, HH:mm:ss",
};

static FRANCE: LocaleSymbols = LocaleSymbols {
    decimal_separator: ',',
    grouping_separator: '\u{202f}',
    months_short: [
        "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.", "nov.",
        "déc.",
    ],
    months_long: [
        "janvier",
        "février",
        "mars",
        "avril",
        "mai",
        "juin",
        "juillet",
        "août",
        "septembre",
        "octobre",
        "novembre",
        "décembre",
    ],
    weekdays_short: ["lun.", "mar.", "mer.", "jeu.", "ven.", "sam.", "dim."],
    am_pm: ["AM", "PM"],
    short_date: "dd/MM/yyyy",
    medium_date: "d MMM yyyy",
    long_date: "d MMMM yyyy",
    medium_date_time: "d MMM yyyy, HH:mm:ss",
};

/// The locales Meja knows how to format for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locale {
    /// Locale-neutral: ISO dates, `.` as decimal separator.
    #[default]
    Root,
    Us,
    Uk,
    Germany,
    France,
}

impl Locale {
    pub const ALL: [Locale; 5] = [
        Locale::Root,
        Locale::Us,
        Locale::Uk,
        Locale::Germany,
        Locale::France,
    ];

    pub fn symbols(&self) -> &'static LocaleSymbols {
        match self {
            Locale::Root => &ROOT,
            Locale::Us => &US,
            Locale::Uk => &UK,
            Locale::Germany => &GERMANY,
            Locale::France => &FRANCE,
        }
    }

    /// The BCP 47 tag, empty for [`Locale::Root`].
    pub fn tag(&self) -> &'static str {
        match self {
            Locale::Root => "",
            Locale::Us => "en-US",
            Locale::Uk => "en-GB",
            Locale::Germany => "de-DE",
            Locale::France => "fr-FR",
        }
    }

    /// Look a locale up by tag. Accepts `_` as separator and bare language codes.
    pub fn from_tag(tag: &str) -> Option<Locale> {
        let tag = tag.trim().replace('_', "-").to_ascii_lowercase();
        match tag.as_str() {
            "" | "root" | "und" => Some(Locale::Root),
            "en" | "en-us" => Some(Locale::Us),
            "en-gb" | "en-uk" => Some(Locale::Uk),
            "de" | "de-de" | "de-at" | "de-ch" => Some(Locale::Germany),
            "fr" | "fr-fr" | "fr-be" => Some(Locale::France),
            _ => None,
        }
    }

    pub fn decimal_separator(&self) -> char {
        self.symbols().decimal_separator
    }

    /// Whether `c` acts as grouping separator when parsing in this locale.
    pub(crate) fn is_grouping_char(&self, c: char) -> bool {
        let grouping = self.symbols().grouping_separator;
        c == grouping || (grouping.is_whitespace() && (c == ' ' || c == '\u{a0}' || c == '\u{202f}'))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locale::Root => f.write_str("root"),
            other => f.write_str(other.tag()),
        }
    }
}
