use crate::dataset::value::parse_datetime;
use crate::dataset::Value;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use chrono::NaiveTime;
use chrono::TimeDelta;

/// How the raw text of a worksheet cell must be interpreted.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as 0/1
    Boolean,
    /// Plain numeric values
    Number,
    /// Date or date-time serials counted from the 1900 epoch
    DateTime1900,
    /// Date or date-time serials counted from the 1904 epoch
    DateTime1904,
    /// Time-of-day fractions
    Time,
    /// ISO 8601 date/time strings (`t="d"`)
    IsoDateTime,
    /// Inline string values
    InlineString,
    /// Index into the shared string table
    SharedString,
    /// Error literals such as `#DIV/0!`
    Error,
}

impl CellType {
    fn date(is_1904: bool) -> Self {
        if is_1904 {
            Self::DateTime1904
        } else {
            Self::DateTime1900
        }
    }

    /// Cell type implied by a built-in number format id, if it is a date or time format.
    pub(crate) fn from_builtin_format(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "14" | "15" | "16" | "17" | "22" => Some(Self::date(is_1904)),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(Self::Time),
            _ => None,
        }
    }

    /// Cell type implied by a custom format code.
    /// Year/day tokens make a date, hour/second tokens alone make a time;
    /// quoted literals, escaped characters and bracketed sections are ignored.
    pub(crate) fn from_custom_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_bracket = false;
        let mut is_date = false;
        let mut is_time = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,
                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,
                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),
                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }
        if is_date {
            Self::date(is_1904)
        } else if is_time {
            Self::Time
        } else {
            Self::Number
        }
    }
}

/// A raw worksheet cell as read from the XML.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    /// Raw text: number, string, shared string index or error literal
    pub(crate) value: String,
}

impl Cell {
    /// Converts the raw text into a table value.
    pub(crate) fn to_value(&self, shared_strings: &[String]) -> Result<Value, String> {
        let value = match self.kind {
            CellType::Empty => Value::Empty,
            CellType::Boolean => Value::Boolean(self.value == "1" || self.value.eq_ignore_ascii_case("true")),
            CellType::Number => Value::Number(self.to_double()?),
            CellType::DateTime1900 | CellType::DateTime1904 => {
                let serial = self.to_double()?;
                serial_to_datetime(serial, self.kind == CellType::DateTime1904)
                    .map(Value::DateTime)
                    .ok_or_else(|| format!("serial '{}' is out of the date range", self.value))?
            }
            CellType::Time => Value::Text(fraction_to_time_string(self.to_double()?)),
            CellType::IsoDateTime => parse_datetime(&self.value)
                .map(Value::DateTime)
                .unwrap_or_else(|| Value::Text(self.value.to_owned())),
            CellType::InlineString | CellType::Error => Value::Text(self.value.to_owned()),
            CellType::SharedString => {
                let index = self
                    .value
                    .parse::<usize>()
                    .map_err(|_| format!("invalid shared string index '{}'", self.value))?;
                let text = shared_strings
                    .get(index)
                    .ok_or_else(|| format!("shared string {} does not exist", index))?;
                Value::Text(text.to_owned())
            }
        };
        Ok(value)
    }

    fn to_double(&self) -> Result<f64, String> {
        self.value
            .trim()
            .parse::<f64>()
            .map_err(|_| format!("parse '{}' to number failed", self.value))
    }
}

/// Converts an Excel serial to a date-time.
/// The 1900 system counts the non-existent 1900-02-29, so serials before 60
/// are shifted by one day.
pub(crate) fn serial_to_datetime(serial: f64, is_1904: bool) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.trunc() as i64;
    let epoch = if is_1904 {
        NaiveDate::from_ymd_opt(1904, 1, 1)?
    } else if days < 60 {
        NaiveDate::from_ymd_opt(1899, 12, 31)?
    } else {
        NaiveDate::from_ymd_opt(1899, 12, 30)?
    };
    let milliseconds = (serial.fract().abs() * 86_400_000f64).round() as i64;
    epoch
        .checked_add_signed(TimeDelta::try_days(days)?)?
        .and_time(NaiveTime::MIN)
        .checked_add_signed(TimeDelta::try_milliseconds(milliseconds)?)
}

/// Formats a day fraction as `HH:MM:SS`.
pub(crate) fn fraction_to_time_string(fraction: f64) -> String {
    let mut seconds = (fraction.fract().abs() * 86_400f64).round() as i64;
    let hours = seconds / 3_600;
    seconds %= 3_600;
    let minutes = seconds / 60;
    seconds %= 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}
