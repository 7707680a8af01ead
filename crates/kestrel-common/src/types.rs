//! Core types for KestrelDB

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

// ============================================================================
// Identifiers
// ============================================================================

/// Unique identifier for a row within a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowId(pub u64);

/// Unique identifier for a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TxnId(pub u64);

impl TxnId {
    pub const INVALID: TxnId = TxnId(0);

    pub fn is_valid(&self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rid:{}", self.0)
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "txn:{}", self.0)
    }
}

// ============================================================================
// Attribute Types
// ============================================================================

/// Discriminant of a [`Value`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AttrType {
    /// Not yet assigned; only seen while an accumulator is being set up
    #[default]
    Undefined,
    /// Character string
    Chars,
    /// 4-byte signed integer
    Ints,
    /// 4-byte float
    Floats,
    /// Calendar date packed as `YYYYMMDD`
    Dates,
    /// SQL NULL
    Nulls,
    /// Boolean, produced internally (never by the parser)
    Booleans,
}

impl AttrType {
    /// Returns true if this type is numeric
    pub fn is_numeric(&self) -> bool {
        matches!(self, AttrType::Ints | AttrType::Floats)
    }

    fn name(&self) -> &'static str {
        match self {
            AttrType::Undefined => "undefined",
            AttrType::Chars => "chars",
            AttrType::Ints => "ints",
            AttrType::Floats => "floats",
            AttrType::Dates => "dates",
            AttrType::Nulls => "nulls",
            AttrType::Booleans => "booleans",
        }
    }
}

impl fmt::Display for AttrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AttrType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        const ALL: [AttrType; 7] = [
            AttrType::Undefined,
            AttrType::Chars,
            AttrType::Ints,
            AttrType::Floats,
            AttrType::Dates,
            AttrType::Nulls,
            AttrType::Booleans,
        ];
        ALL.iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::invalid_argument(format!("unknown attribute type: {}", s)))
    }
}

// ============================================================================
// Values
// ============================================================================

/// A scalar value.
///
/// The payload lives inside the variant, so it can never be read under the
/// wrong tag, and every assignment replaces tag and payload together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    #[default]
    Undefined,
    Chars(String),
    Ints(i32),
    Floats(f32),
    /// Packed as `year * 10000 + month * 100 + day`
    Dates(i32),
    Null,
    Booleans(bool),
}

impl Value {
    /// Build a date value, rejecting impossible calendar dates.
    pub fn date(year: i32, month: u32, day: u32) -> Result<Value> {
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            Error::invalid_argument(format!("invalid date: {}-{}-{}", year, month, day))
        })?;
        Ok(Value::Dates(pack_date(&date)))
    }

    /// Parse a `YYYY-MM-DD` literal into a date value.
    pub fn parse_date(s: &str) -> Result<Value> {
        let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map_err(|e| Error::invalid_argument(format!("invalid date '{}': {}", s, e)))?;
        Ok(Value::Dates(pack_date(&date)))
    }

    /// Returns the attribute type of this value
    pub fn attr_type(&self) -> AttrType {
        match self {
            Value::Undefined => AttrType::Undefined,
            Value::Chars(_) => AttrType::Chars,
            Value::Ints(_) => AttrType::Ints,
            Value::Floats(_) => AttrType::Floats,
            Value::Dates(_) => AttrType::Dates,
            Value::Null => AttrType::Nulls,
            Value::Booleans(_) => AttrType::Booleans,
        }
    }

    /// Returns true if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Byte length of the payload
    pub fn length(&self) -> usize {
        match self {
            Value::Chars(s) => s.len(),
            Value::Ints(_) | Value::Floats(_) | Value::Dates(_) => 4,
            Value::Booleans(_) => 1,
            Value::Null | Value::Undefined => 0,
        }
    }

    pub fn set_int(&mut self, val: i32) {
        *self = Value::Ints(val);
    }

    pub fn set_float(&mut self, val: f32) {
        *self = Value::Floats(val);
    }

    pub fn set_boolean(&mut self, val: bool) {
        *self = Value::Booleans(val);
    }

    pub fn set_string(&mut self, s: impl Into<String>) {
        *self = Value::Chars(s.into());
    }

    /// Store an already packed `YYYYMMDD` date
    pub fn set_date(&mut self, packed: i32) {
        *self = Value::Dates(packed);
    }

    pub fn set_null(&mut self) {
        *self = Value::Null;
    }

    pub fn set_value(&mut self, other: &Value) {
        *self = other.clone();
    }

    /// Read as an integer, converting from the stored kind when it differs.
    pub fn get_int(&self) -> i32 {
        match self {
            Value::Ints(v) | Value::Dates(v) => *v,
            Value::Floats(v) => *v as i32,
            Value::Booleans(v) => i32::from(*v),
            Value::Chars(s) => parse_leading_int(s),
            Value::Null | Value::Undefined => 0,
        }
    }

    /// Read as a float, converting from the stored kind when it differs.
    pub fn get_float(&self) -> f32 {
        match self {
            Value::Floats(v) => *v,
            Value::Ints(v) | Value::Dates(v) => *v as f32,
            Value::Booleans(v) => {
                if *v {
                    1.0
                } else {
                    0.0
                }
            }
            Value::Chars(s) => parse_leading_float(s).unwrap_or(0.0),
            Value::Null | Value::Undefined => 0.0,
        }
    }

    pub fn get_string(&self) -> String {
        self.to_string()
    }

    /// Read as a boolean, converting from the stored kind when it differs.
    pub fn get_boolean(&self) -> bool {
        match self {
            Value::Booleans(v) => *v,
            Value::Ints(v) | Value::Dates(v) => *v != 0,
            Value::Floats(v) => *v != 0.0,
            Value::Chars(s) => match parse_leading_float(s) {
                Some(f) => f != 0.0,
                None => !s.is_empty(),
            },
            Value::Null | Value::Undefined => false,
        }
    }

    /// Three-way comparison.
    ///
    /// Defined for two values of the same kind and for an `Ints`/`Floats`
    /// pair. Returns `None` for every other combination, including any
    /// comparison involving `Null`; callers must filter those out first.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Ints(a), Value::Ints(b)) | (Value::Dates(a), Value::Dates(b)) => Some(a.cmp(b)),
            (Value::Floats(a), Value::Floats(b)) => a.partial_cmp(b),
            (Value::Ints(a), Value::Floats(b)) => (*a as f32).partial_cmp(b),
            (Value::Floats(a), Value::Ints(b)) => a.partial_cmp(&(*b as f32)),
            (Value::Chars(a), Value::Chars(b)) => Some(a.as_str().cmp(b.as_str())),
            (Value::Booleans(a), Value::Booleans(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Ints(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Floats(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Booleans(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Chars(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Chars(v)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => Ok(()),
            Value::Chars(v) => f.write_str(v),
            Value::Ints(v) => write!(f, "{}", v),
            Value::Floats(v) => f.write_str(&format_float(*v)),
            Value::Dates(v) => write!(f, "{:04}-{:02}-{:02}", v / 10000, (v % 10000) / 100, v % 100),
            Value::Null => write!(f, "NULL"),
            Value::Booleans(v) => write!(f, "{}", v),
        }
    }
}

fn pack_date(date: &NaiveDate) -> i32 {
    date.year() * 10000 + date.month() as i32 * 100 + date.day() as i32
}

/// `atoi`-style parse: optional sign and leading digits, 0 when none.
fn parse_leading_int(s: &str) -> i32 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let magnitude = digits
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, d| acc.saturating_mul(10).saturating_add(i64::from(d - b'0')));
    let signed = if negative { -magnitude } else { magnitude };
    signed.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Float read from the longest numeric prefix after leading whitespace.
/// `None` when the text starts with no digits; a full `inf`/`nan` spelling
/// is also accepted.
fn parse_leading_float(s: &str) -> Option<f32> {
    let s = s.trim_start();
    if let Ok(v) = s.trim_end().parse::<f32>() {
        return Some(v);
    }
    let bytes = s.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;
    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits + frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return None;
    }
    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = count_digits(&bytes[exp..]);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }
    s[..end].parse().ok()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Two decimals at most, trailing zeros trimmed.
fn format_float(v: f32) -> String {
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Definition of a table field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMeta {
    pub name: String,
    pub attr_type: AttrType,
    /// Declared maximum byte length; meaningful for `Chars`
    pub len: usize,
    pub nullable: bool,
}

impl FieldMeta {
    pub fn new(name: impl Into<String>, attr_type: AttrType, len: usize) -> Self {
        Self {
            name: name.into(),
            attr_type,
            len,
            nullable: true,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Check that `value` may be stored in this field.
    pub fn check_value(&self, value: &Value) -> Result<()> {
        if value.is_null() {
            if self.nullable {
                return Ok(());
            }
            return Err(Error::invalid_argument(format!(
                "field {} is not nullable",
                self.name
            )));
        }
        if value.attr_type() != self.attr_type {
            return Err(Error::invalid_argument(format!(
                "type mismatch for field {}: expected {}, got {}",
                self.name,
                self.attr_type,
                value.attr_type()
            )));
        }
        if self.attr_type == AttrType::Chars && value.length() > self.len {
            return Err(Error::invalid_argument(format!(
                "value too long for field {}: {} > {}",
                self.name,
                value.length(),
                self.len
            )));
        }
        Ok(())
    }
}

/// Schema of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableMeta {
    pub name: String,
    pub fields: Vec<FieldMeta>,
}

impl TableMeta {
    pub fn new(name: impl Into<String>, fields: Vec<FieldMeta>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn field_num(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    pub fn field_at(&self, index: usize) -> Option<&FieldMeta> {
        self.fields.get(index)
    }

    /// Case-insensitive lookup by name
    pub fn field(&self, name: &str) -> Option<&FieldMeta> {
        self.field_index(name).map(|i| &self.fields[i])
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields
            .iter()
            .position(|f| f.name.eq_ignore_ascii_case(name))
    }
}
