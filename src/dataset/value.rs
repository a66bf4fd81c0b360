use chrono::DateTime;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use serde::Serialize;
use std::fmt::Display;

/// Date-only layouts accepted when text is coerced to a date.
const DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Date-time layouts accepted when text is coerced to a date.
const DATETIME_FORMATS: [&str; 8] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// A single scalar cell of a table.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Empty,
    Number(f64),
    Text(String),
    Boolean(bool),
    DateTime(NaiveDateTime),
}

impl Value {
    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }

    /// Numeric view of the cell. Text is parsed after trimming, booleans
    /// count as 1 and 0; NaN, dates and unparseable text are missing.
    pub fn as_number(&self) -> Option<f64> {
        let number = match self {
            Value::Number(value) => *value,
            Value::Text(text) => text.trim().parse::<f64>().ok()?,
            Value::Boolean(value) => f64::from(u8::from(*value)),
            Value::Empty | Value::DateTime(_) => return None,
        };
        (!number.is_nan()).then_some(number)
    }

    /// Date view of the cell. Only date-time cells and parseable text qualify.
    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Value::DateTime(value) => Some(*value),
            Value::Text(text) => parse_datetime(text),
            _ => None,
        }
    }

    /// String form used to match category selections.
    pub fn to_category(&self) -> String {
        match self {
            Value::Empty => String::new(),
            Value::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                format!("{}", *value as i64)
            }
            Value::Number(value) => value.to_string(),
            Value::Text(text) => text.to_owned(),
            Value::Boolean(true) => "True".to_owned(),
            Value::Boolean(false) => "False".to_owned(),
            Value::DateTime(value) => value.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_category())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(value: NaiveDateTime) -> Self {
        Value::DateTime(value)
    }
}

impl From<NaiveDate> for Value {
    fn from(value: NaiveDate) -> Self {
        Value::DateTime(value.and_time(NaiveTime::MIN))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or_default()
    }
}

/// Parses free text as a date or date-time.
/// RFC 3339 timestamps with an offset are converted to UTC.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date.and_time(NaiveTime::MIN));
        }
    }
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|datetime| datetime.naive_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .and_then(|date| date.and_hms_opt(hour, minute, second))
            .unwrap()
    }

    #[test]
    fn parses_supported_layouts() {
        assert_eq!(parse_datetime("2024-01-02"), Some(at(2024, 1, 2, 0, 0, 0)));
        assert_eq!(parse_datetime(" 2024/01/02 "), Some(at(2024, 1, 2, 0, 0, 0)));
        assert_eq!(parse_datetime("01/02/2024"), Some(at(2024, 1, 2, 0, 0, 0)));
        assert_eq!(parse_datetime("02.01.2024"), Some(at(2024, 1, 2, 0, 0, 0)));
        assert_eq!(parse_datetime("January 2, 2024"), Some(at(2024, 1, 2, 0, 0, 0)));
        assert_eq!(parse_datetime("2 Jan 2024"), Some(at(2024, 1, 2, 0, 0, 0)));
        assert_eq!(parse_datetime("2024-01-02T08:30:15"), Some(at(2024, 1, 2, 8, 30, 15)));
        assert_eq!(parse_datetime("2024-01-02 08:30"), Some(at(2024, 1, 2, 8, 30, 0)));
        assert_eq!(parse_datetime("2024-01-02T08:30:15+02:00"), Some(at(2024, 1, 2, 6, 30, 15)));
    }

    #[test]
    fn rejects_non_dates() {
        assert_eq!(parse_datetime(""), None);
        assert_eq!(parse_datetime("North"), None);
        assert_eq!(parse_datetime("2024-13-01"), None);
        assert_eq!(parse_datetime("12.5"), None);
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(Value::Number(2.5).as_number(), Some(2.5));
        assert_eq!(Value::from(" 42 ").as_number(), Some(42.0));
        assert_eq!(Value::from("1,234").as_number(), None);
        assert_eq!(Value::from("NaN").as_number(), None);
        assert_eq!(Value::Boolean(true).as_number(), Some(1.0));
        assert_eq!(Value::Empty.as_number(), None);
        assert_eq!(Value::from(at(2024, 1, 1, 0, 0, 0)).as_number(), None);
    }

    #[test]
    fn category_strings() {
        assert_eq!(Value::Number(10.0).to_category(), "10");
        assert_eq!(Value::Number(10.5).to_category(), "10.5");
        assert_eq!(Value::Boolean(false).to_category(), "False");
        assert_eq!(Value::from("A").to_category(), "A");
        assert_eq!(Value::Empty.to_category(), "");
        assert_eq!(Value::from(at(2024, 1, 3, 0, 0, 0)).to_category(), "2024-01-03 00:00:00");
    }

    #[test]
    fn serializes_untagged() {
        let json = serde_json::to_string(&vec![
            Value::Empty,
            Value::Number(1.5),
            Value::from("x"),
            Value::Boolean(true),
        ])
        .unwrap();
        assert_eq!(json, r#"[null,1.5,"x",true]"#);
    }
}
