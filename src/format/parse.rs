// PSPP - a program for statistical analysis.
// Copyright (C) 2025 Free Software Foundation, Inc.
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later
// version.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more
// details.
//
// You should have received a copy of the GNU General Public License along with
// this program.  If not, see <http://www.gnu.org/licenses/>.

use crate::{
    calendar::{calendar_gregorian_to_offset, DateError},
    data::{ByteCow, ByteString, Datum, EncodedString, RawString, WithEncoding},
    endian::{Endian, Parse},
    format::{DateTemplate, Decimals, Settings, TemplateItem, Type},
    settings::{EndianSettings, Settings as PsppSettings},
};
use encoding_rs::Encoding;
use smallstr::SmallString;
use std::{
    fmt::{Display, Write},
    str::FromStr,
};
use thiserror::Error as ThisError;

#[derive(Clone, Debug)]
pub struct ParseError {
    type_: Type,
    input: WithEncoding<ByteString>,
    kind: ParseErrorKind,
}

impl std::error::Error for ParseError {}

impl Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} cannot be parsed as {}: {}",
            self.input.quoted(),
            &self.type_,
            &self.kind
        )
    }
}

#[derive(ThisError, Clone, Debug, PartialEq, Eq)]
enum ParseErrorKind {
    /// Input is not numeric.
    #[error("Input is not numeric.")]
    NotNumeric,

    /// Invalid numeric systax.
    #[error("Invalid numeric systax.")]
    InvalidNumericSyntax,

    /// Field contains unexpected non-digit.
    #[error("Field contains unexpected non-digit {0:?}.")]
    Nondigit(char),

    /// Field contains unexpected non-hex digit.
    #[error("Field contains unexpected non-hex digit {0:?}.")]
    NonHexDigit(char),

    /// Field contains odd number of hex digits.
    #[error("Field contains {0:?} hex digits but only an even number is allowed.")]
    OddLength(usize),

    /// Field contains invalid BCD digit.
    #[error("Field contains invalid BCD digit ({0:?}).")]
    NonBDCDigit(u8),

    /// Invalid BCD sign.
    #[error("Invalid BCD sign 0x{0:x}.")]
    InvalidBCDSign(u8),

    /// Day must be between 1 and 31.
    #[error("Day ({0}) must be between 1 and 31.")]
    InvalidDay(i32),

    /// Syntax error in date field.
    #[error("Syntax error in date field.")]
    DateSyntax,

    /// Julian day must have exactly three digits.
    #[error("Julian day must have exactly three digits.")]
    InvalidYDayLen,

    /// Julian day must be between 1 and 366, inclusive.
    #[error("Julian day ({0}) must be between 1 and 366, inclusive.")]
    InvalidYDay(i32),

    /// Quarter must be between 1 and 4, inclusive.
    #[error("Quarter ({0}) must be between 1 and 4, inclusive.")]
    InvalidQuarter(i32),

    /// Week must be between 1 and 53, inclusive.
    #[error("Week ({0}) must be between 1 and 53, inclusive.")]
    InvalidWeek(i32),

    /// Unrecognized month format.
    #[error("Unrecognized month format.  Months may be specified as Arabic or Roman numerals or as at least 3 letters of their English names.")]
    InvalidMonth,

    /// Delimiter expected between fields in time.
    #[error("Delimiter expected between fields in time.")]
    ExpectedTimeDelimiter,

    /// Delimiter expected between fields in date.
    #[error("Delimiter expected between fields in date.")]
    ExpectedDateDelimiter,

    /// Minute must be between 0 and 59, inclusive.
    #[error("Minute ({0}) must be between 0 and 59, inclusive.")]
    InvalidMinute(i32),

    /// Invalid weekday name.
    #[error("Unrecognized weekday name.  At least the first two letters of an English weekday name must be specified.")]
    InvalidWeekdayName,

    /// Expected character.
    #[error("{0:?} expected in date field.")]
    ExpectedChar(char),

    /// Trailing garbage.
    #[error("Trailing garbage {0:?} follows date.")]
    TrailingGarbage(String),

    /// Invalid date.
    #[error("{0}")]
    InvalidDate(#[from] DateError),

    /// Invalid zoned decimal (Z) syntax.
    #[error("Invalid zoned decimal (Z) syntax.")]
    InvalidZ,
}

pub struct ParseValue<'a> {
    type_: Type,
    settings: &'a Settings,
    endian: EndianSettings,
    implied_decimals: Option<Decimals>,
    output_encoding: &'static Encoding,
}

impl Type {
    pub fn parser(&self, output_encoding: &'static Encoding) -> ParseValue<'static> {
        ParseValue::new(*self, output_encoding)
    }
}

impl ParseValue<'static> {
    pub fn new(type_: Type, output_encoding: &'static Encoding) -> Self {
        let settings = PsppSettings::global();
        Self {
            type_,
            settings: &settings.formats,
            endian: settings.endian,
            implied_decimals: None,
            output_encoding,
        }
    }
}

impl<'a> ParseValue<'a> {
    pub fn with_settings(self, settings: &'a Settings) -> Self {
        Self { settings, ..self }
    }
    pub fn with_endian(self, endian: EndianSettings) -> Self {
        Self { endian, ..self }
    }
    pub fn with_implied_decimals(self, d: Decimals) -> Self {
        Self {
            implied_decimals: if d > 0 { Some(d) } else { None },
            ..self
        }
    }

    /// Parses `input`.
    ///
    /// # Input encoding
    ///
    /// Be careful about the encoding of `input`.  It's tempting to recode all
    /// input into UTF-8, but this will screw up parsing of binary formats,
    /// because recoding bytes from (e.g.) windows-1252 into UTF-8, and then
    /// interpreting them as a binary number yields nonsense.
    pub fn parse<'b, T>(&self, input: T) -> Result<Datum, ParseError>
    where
        T: Into<WithEncoding<ByteCow<'b>>>,
    {
        let input: WithEncoding<ByteCow> = input.into();
        if input.raw_string_bytes().is_empty() {
            return Ok(self.type_.default_value());
        }
        match self.type_ {
            Type::F | Type::Comma | Type::Dot | Type::Dollar | Type::Pct | Type::E => {
                self.parse_number(&input.as_str(), self.type_)
            }
            Type::CC(_) => self.parse_number(&input.as_str(), Type::F),
            Type::N => self.parse_n(&input.as_str()),
            Type::Z => self.parse_z(&input.as_str()),
            Type::PIBHex => self.parse_pibhex(&input.as_str()),
            Type::RBHex => self.parse_rbhex(&input.as_str()),
            Type::Date
            | Type::ADate
            | Type::EDate
            | Type::JDate
            | Type::SDate
            | Type::QYr
            | Type::MoYr
            | Type::WkYr
            | Type::DateTime
            | Type::YmdHms
            | Type::MTime
            | Type::Time
            | Type::DTime => self.parse_date(&input.as_str()),
            Type::WkDay => self.parse_wkday(&input.as_str()),
            Type::Month => self.parse_month(&input.as_str()),
            Type::P => self.parse_p(input.raw_string_bytes()),
            Type::PK => self.parse_pk(input.raw_string_bytes()),
            Type::IB => self.parse_ib(input.raw_string_bytes()),
            Type::PIB => self.parse_pib(input.raw_string_bytes()),
            Type::RB => self.parse_rb(input.raw_string_bytes()),
            Type::A => Ok(Datum::String(
                input
                    .to_encoding(self.output_encoding)
                    .into_owned()
                    .into_inner(),
            )),
            Type::AHex => self.parse_ahex(&input.as_str()),
        }
        .map_err(|kind| ParseError {
            type_: self.type_,
            input: input.cloned(),
            kind,
        })
    }

    fn parse_number(&self, input: &str, type_: Type) -> Result<Datum, ParseErrorKind> {
        let style = self.settings.number_style(type_);

        let input = input.trim();
        if input.is_empty() || input == "." {
            return Ok(Datum::sysmis());
        }
        let mut p = StrParser::new(input.trim());
        fn strip_integer(mut input: &str, grouping: Option<char>) -> &str {
            while let Some(rest) = input.strip_prefix(|c: char| c.is_ascii_digit()) {
                let rest = if let Some(grouping) = grouping {
                    rest.strip_prefix(grouping).unwrap_or(rest)
                } else {
                    rest
                };
                input = rest;
            }
            input
        }

        if p.strip_prefix(&style.prefix.s) {
            p.strip_ws();
        }
        let sign = p.strip_one_of(&['-', '+']).inspect(|_| p.strip_ws());
        if sign.is_some() && p.strip_prefix(&style.prefix.s) {
            p.strip_ws();
        }
        let integer = p.advance(strip_integer(p.0, style.grouping.map(char::from)));
        let decimals = if p.strip_prefix(style.decimal.as_str()) {
            p.strip_matches(|c| c.is_ascii_digit())
        } else {
            ""
        };
        let (exp_sign, exponent) = if p.0.starts_with(['e', 'E', 'd', 'D', '+', '-']) {
            let _e = p
                .strip_one_of(&['e', 'E', 'd', 'D'])
                .inspect(|_| p.strip_ws());
            let exp_sign = p.strip_one_of(&['-', '+']).inspect(|_| p.strip_ws());
            let exponent = p.strip_matches(|c| c.is_ascii_digit());
            (exp_sign, exponent)
        } else {
            (None, "")
        };
        if p.strip_prefix(&style.suffix.s) {
            p.strip_ws();
        }

        if !p.0.is_empty() {
            return Err(ParseErrorKind::NotNumeric);
        }

        let mut number = SmallString::<[u8; 64]>::new();
        if let Some(sign) = sign {
            number.push(sign);
        }
        number.extend(integer.chars().filter(|c| c.is_ascii_digit()));
        if !decimals.is_empty() {
            write!(&mut number, ".{decimals}").unwrap();
        }
        if !exponent.is_empty() {
            number.push('e');
            if let Some(exp_sign) = exp_sign {
                number.push(exp_sign);
            }
            write!(&mut number, "{exponent}").unwrap();
        }

        match f64::from_str(&number) {
            Ok(value) => Ok(Datum::Number(Some(value))),
            Err(_) => Err(ParseErrorKind::InvalidNumericSyntax),
        }
    }

    fn parse_n(&self, input: &str) -> Result<Datum, ParseErrorKind> {
        match input.chars().find(|c| !c.is_ascii_digit()) {
            None => Ok(Datum::Number(Some(input.parse().unwrap()))),
            Some(nondigit) => Err(ParseErrorKind::Nondigit(nondigit)),
        }
    }

    fn parse_z(&self, input: &str) -> Result<Datum, ParseErrorKind> {
        let input = input.trim();
        if input.is_empty() || input == "." {
            return Ok(Datum::sysmis());
        }

        enum ZChar {
            Digit(u32),
            SignedDigit(u32, Sign),
            Dot,
            Invalid,
        }

        impl From<char> for ZChar {
            fn from(c: char) -> Self {
                match c {
                    '0'..='9' => ZChar::Digit(c as u32 - '0' as u32),
                    '{' => ZChar::SignedDigit(0, Sign::Positive),
                    'A'..='I' => ZChar::SignedDigit(c as u32 - 'A' as u32 + 1, Sign::Positive),
                    '}' => ZChar::SignedDigit(0, Sign::Negative),
                    'J'..='R' => ZChar::SignedDigit(c as u32 - 'J' as u32 + 1, Sign::Negative),
                    '.' => ZChar::Dot,
                    _ => ZChar::Invalid,
                }
            }
        }

        let mut number = SmallString::<[u8; 40]>::new();
        let mut sign = None;
        let mut dot = false;
        for c in input.chars().map(ZChar::from) {
            match c {
                ZChar::Digit(digit) if sign.is_none() => {
                    number.push(char::from_digit(digit, 10).unwrap());
                }
                ZChar::SignedDigit(digit, s) if sign.is_none() => {
                    assert!(digit < 10, "{digit}");
                    number.push(char::from_digit(digit, 10).unwrap());
                    sign = Some(s);
                }
                ZChar::Dot if !dot => {
                    number.push('.');
                    dot = true;
                }
                _ => return Err(ParseErrorKind::InvalidZ),
            }
        }
        match self.implied_decimals {
            Some(d) if !dot && d > 0 => write!(&mut number, "e-{d}").unwrap(),
            _ => (),
        }
        let number = number.parse::<f64>().unwrap();
        let number = if sign == Some(Sign::Negative) {
            -number
        } else {
            number
        };
        Ok(Datum::Number(Some(number)))
    }

    fn parse_bcd(input: &[u8]) -> Result<u128, ParseErrorKind> {
        let mut value = 0;
        for byte in input.iter().copied() {
            let hi = nibble(byte >> 4)?;
            let lo = nibble(byte & 0x0f)?;
            value = value * 100 + hi * 10 + lo;
        }
        Ok(value)
    }

    fn apply_decimals(&self, number: f64) -> f64 {
        match self.implied_decimals {
            Some(d) if d > 0 => number / 10.0f64.powi(d as i32),
            _ => number,
        }
    }

    fn parse_pk(&self, input: &[u8]) -> Result<Datum, ParseErrorKind> {
        let number = Self::parse_bcd(input)?;
        Ok(Datum::Number(Some(self.apply_decimals(number as f64))))
    }

    fn parse_p(&self, input: &[u8]) -> Result<Datum, ParseErrorKind> {
        if input.is_empty() {
            return Ok(Datum::Number(None));
        };
        let (head, tail) = input.split_at(input.len() - 1);
        let number = Self::parse_bcd(head)?;
        let number = number * 10 + nibble(tail[0] >> 4)?;
        let number = match tail[0] & 0x0f {
            0xf => number as f64,
            0xd => -(number as f64),
            other => return Err(ParseErrorKind::InvalidBCDSign(other)),
        };
        Ok(Datum::Number(Some(self.apply_decimals(number))))
    }

    fn parse_binary(&self, input: &[u8]) -> u128 {
        match self.endian.input {
            Endian::Big => input.iter().fold(0, |acc, b| (acc << 8) + *b as u128),
            Endian::Little => input.iter().rev().fold(0, |acc, b| (acc << 8) + *b as u128),
        }
    }

    fn parse_ib(&self, input: &[u8]) -> Result<Datum, ParseErrorKind> {
        let number = self.parse_binary(input);
        let sign_bit = 1 << (input.len() * 8 - 1);
        let number = if (number & sign_bit) == 0 {
            number as i128
        } else {
            -(number.wrapping_sub(sign_bit << 1) as i128)
        };
        Ok(Datum::Number(Some(self.apply_decimals(number as f64))))
    }

    fn parse_pib(&self, input: &[u8]) -> Result<Datum, ParseErrorKind> {
        let number = self.parse_binary(input);
        Ok(Datum::Number(Some(self.apply_decimals(number as f64))))
    }

    fn parse_rb(&self, input: &[u8]) -> Result<Datum, ParseErrorKind> {
        let mut bytes = [0; 8];
        let len = input.len().min(8);
        bytes[..len].copy_from_slice(&input[..len]);
        let bits: u64 = self.endian.input.parse(bytes);

        const SYSMIS: f64 = -f64::MAX;
        let number = match f64::from_bits(bits) {
            SYSMIS => None,
            other => Some(other),
        };
        Ok(Datum::Number(number))
    }

    fn parse_ahex(&self, input: &str) -> Result<Datum, ParseErrorKind> {
        let mut result = Vec::with_capacity(input.len() / 2);
        let mut iter = input.chars();
        while let Some(hi) = iter.next() {
            let Some(lo) = iter.next() else {
                return Err(ParseErrorKind::OddLength(input.len()));
            };
            let Some(hi) = hi.to_digit(16) else {
                return Err(ParseErrorKind::NonHexDigit(hi));
            };
            let Some(lo) = lo.to_digit(16) else {
                return Err(ParseErrorKind::NonHexDigit(lo));
            };
            result.push((hi * 16 + lo) as u8);
        }
        Ok(Datum::String(result.into()))
    }

    fn parse_hex(&self, input: &str) -> Result<Option<u64>, ParseErrorKind> {
        let input = input.trim();
        if input.is_empty() || input == "." {
            Ok(None)
        } else if let Ok(value) = u64::from_str_radix(input, 16) {
            Ok(Some(value))
        } else {
            let c = input.chars().find(|c| !c.is_ascii_hexdigit()).unwrap();
            Err(ParseErrorKind::NonHexDigit(c))
        }
    }

    fn parse_pibhex(&self, input: &str) -> Result<Datum, ParseErrorKind> {
        self.parse_hex(input)
            .map(|value| Datum::Number(value.map(|number| number as f64)))
    }

    fn parse_rbhex(&self, input: &str) -> Result<Datum, ParseErrorKind> {
        self.parse_hex(input)
            .map(|value| Datum::Number(value.map(f64::from_bits)))
    }

    fn parse_date(&self, input: &str) -> Result<Datum, ParseErrorKind> {
        let mut p = StrParser(input.trim());
        if p.0.is_empty() || p.0 == "." {
            return Ok(Datum::sysmis());
        }

        let mut day = 1;
        let mut yday = 1;
        let mut month = 1;
        let mut year = None;
        let mut time_sign = None;
        let mut time = 0.0;

        let mut iter = DateTemplate::new(self.type_, 0).unwrap();
        let template_width = iter.len();
        while let Some(TemplateItem { c, n }) = iter.next() {
            match c {
                'd' if n < 3 => {
                    day = parse_day(&mut p)?;
                }
                'd' => {
                    yday = parse_yday(&mut p)?;
                }
                'm' => {
                    month = parse_month(&mut p)?;
                }
                'y' => {
                    let max_digits = if !iter
                        .clone()
                        .next()
                        .is_some_and(|item| item.c.is_ascii_alphabetic())
                    {
                        usize::MAX
                    } else if p.0.len() >= template_width + 2 {
                        4
                    } else {
                        2
                    };
                    year = Some(parse_year(&mut p, self.settings, max_digits)?);
                }
                'q' => month = parse_quarter(&mut p)?,
                'w' => yday = parse_week(&mut p)?,
                'D' => {
                    time_sign = Some(parse_sign(&mut p, time_sign));
                    time += parse_time(&mut p)? * 60.0 * 60.0 * 24.0;
                }
                'H' => {
                    time_sign = Some(parse_sign(&mut p, time_sign));
                    time += parse_time(&mut p)? * 60.0 * 60.0;
                }
                'M' => {
                    if self.type_ == Type::MTime {
                        time_sign = Some(parse_sign(&mut p, time_sign));
                    }
                    time += self.parse_minute_second(&mut p)?;
                }
                '-' | '/' | '.' => parse_date_delimiter(&mut p)?,
                ':' => parse_time_delimiter(&mut p)?,
                ' ' => {
                    if self.type_ != Type::MoYr {
                        p.strip_ws();
                    } else {
                        parse_date_delimiter(&mut p)?
                    }
                }
                c => {
                    debug_assert_eq!(n, 1);
                    if p.strip_one_of(&[c.to_ascii_uppercase(), c.to_ascii_lowercase()])
                        .is_none()
                    {
                        return Err(ParseErrorKind::ExpectedChar(c));
                    }
                }
            }
        }
        parse_trailer(&mut p)?;

        let date = if let Some(year) = year {
            let date = calendar_gregorian_to_offset(year, month, day, self.settings)? + yday - 1;
            date as f64 * 60.0 * 60.0 * 24.0
        } else {
            0.0
        };
        let time_date = if time_sign == Some(Sign::Negative) {
            date - time
        } else {
            date + time
        };
        Ok(Datum::Number(Some(time_date)))
    }

    fn parse_minute_second(&self, p: &mut StrParser<'_>) -> Result<f64, ParseErrorKind> {
        let minute = parse_int::<i32>(p)?;
        if self.type_ != Type::MTime && !(0..=59).contains(&minute) {
            return Err(ParseErrorKind::InvalidMinute(minute));
        }
        let time = minute as f64 * 60.0;

        if parse_time_delimiter(p).is_err() || !p.0.starts_with(|c: char| c.is_ascii_digit()) {
            return Ok(time);
        }
        let integer = p.strip_matches(|c| c.is_ascii_digit());
        let fraction = if p.strip_prefix(self.settings.decimal.as_str()) {
            p.strip_matches(|c| c.is_ascii_digit())
        } else {
            ""
        };

        let mut number = SmallString::<[u8; 40]>::new();
        number.push_str(integer);
        number.push('.');
        number.push_str(fraction);
        let seconds = number.parse::<f64>().unwrap();
        Ok(time + seconds)
    }

    fn parse_wkday(&self, input: &str) -> Result<Datum, ParseErrorKind> {
        let mut p = StrParser(input.trim());
        if p.0.is_empty() || p.0 == "." {
            Ok(Datum::sysmis())
        } else {
            let weekday = parse_weekday(&mut p)?;
            parse_trailer(&mut p)?;
            Ok(Datum::Number(Some(weekday as f64)))
        }
    }

    fn parse_month(&self, input: &str) -> Result<Datum, ParseErrorKind> {
        let mut p = StrParser(input.trim());
        if p.0.is_empty() || p.0 == "." {
            Ok(Datum::sysmis())
        } else {
            let month = parse_month(&mut p)?;
            parse_trailer(&mut p)?;
            Ok(Datum::Number(Some(month as f64)))
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
enum Sign {
    #[default]
    Positive,
    Negative,
}

fn parse_trailer(p: &mut StrParser<'_>) -> Result<(), ParseErrorKind> {
    p.strip_ws();
    if p.0.is_empty() {
        Ok(())
    } else {
        Err(ParseErrorKind::TrailingGarbage(p.0.into()))
    }
}

fn parse_sign(p: &mut StrParser<'_>, sign: Option<Sign>) -> Sign {
    if let Some(sign) = sign {
        sign
    } else if p.strip_one_of(&['-', '+']) == Some('-') {
        Sign::Negative
    } else {
        Sign::Positive
    }
}

fn parse_time(p: &mut StrParser<'_>) -> Result<f64, ParseErrorKind> {
    let number = parse_int::<i32>(p)?;
    if number < 0 {
        return Err(ParseErrorKind::DateSyntax);
    }
    Ok(number as f64)
}

fn parse_day(p: &mut StrParser<'_>) -> Result<i32, ParseErrorKind> {
    let day = parse_int::<i32>(p)?;
    if (1..=31).contains(&day) {
        Ok(day)
    } else {
        Err(ParseErrorKind::InvalidDay(day))
    }
}

fn parse_yday(p: &mut StrParser<'_>) -> Result<i32, ParseErrorKind> {
    let Some(s) = p.0.get(..3) else {
        return Err(ParseErrorKind::InvalidYDayLen);
    };
    if !s.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseErrorKind::InvalidYDayLen);
    }
    let yday = s.parse().unwrap();
    if !(1..=366).contains(&yday) {
        return Err(ParseErrorKind::InvalidYDay(yday));
    }
    p.0 = &p.0[3..];
    Ok(yday)
}

fn parse_month(p: &mut StrParser<'_>) -> Result<i32, ParseErrorKind> {
    if p.0.starts_with(|c: char| c.is_ascii_digit()) {
        let month = parse_int(p)?;
        if (1..=12).contains(&month) {
            return Ok(month);
        }
    } else {
        let name = p.strip_matches(|c| c.is_ascii_alphabetic());

        static ENGLISH_NAMES: [&str; 12] = [
            "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
        ];
        if let Some(month) = match_name(&name[..3.min(name.len())], &ENGLISH_NAMES) {
            return Ok(month);
        }

        static ROMAN_NAMES: [&str; 12] = [
            "i", "ii", "iii", "iv", "v", "vi", "vii", "viii", "ix", "x", "xi", "xii",
        ];
        if let Some(month) = match_name(&name[..4.min(name.len())], &ROMAN_NAMES) {
            return Ok(month);
        }
    }
    Err(ParseErrorKind::InvalidMonth)
}

fn parse_weekday(p: &mut StrParser<'_>) -> Result<i32, ParseErrorKind> {
    static WEEKDAY_NAMES: [&str; 7] = ["su", "mo", "tu", "we", "th", "fr", "sa"];
    let name = p.strip_matches(|c| c.is_ascii_alphabetic());
    name.get(..2)
        .and_then(|name| match_name(name, &WEEKDAY_NAMES))
        .ok_or(ParseErrorKind::InvalidWeekdayName)
}

fn parse_quarter(p: &mut StrParser<'_>) -> Result<i32, ParseErrorKind> {
    match parse_int(p)? {
        quarter @ 1..=4 => Ok((quarter - 1) * 3 + 1),
        other => Err(ParseErrorKind::InvalidQuarter(other)),
    }
}

fn parse_week(p: &mut StrParser<'_>) -> Result<i32, ParseErrorKind> {
    match parse_int(p)? {
        week @ 1..=53 => Ok((week - 1) * 7 + 1),
        other => Err(ParseErrorKind::InvalidWeek(other)),
    }
}

fn parse_time_delimiter(p: &mut StrParser<'_>) -> Result<(), ParseErrorKind> {
    let delimiter = p.strip_matches(|c| c == ':' || c.is_ascii_whitespace());
    if !delimiter.is_empty() {
        Ok(())
    } else {
        Err(ParseErrorKind::ExpectedTimeDelimiter)
    }
}

fn parse_date_delimiter(p: &mut StrParser<'_>) -> Result<(), ParseErrorKind> {
    let delimiter = p
        .strip_matches(|c| c == '-' || c == '/' || c == '.' || c == ',' || c.is_ascii_whitespace());
    if !delimiter.is_empty() {
        Ok(())
    } else {
        Err(ParseErrorKind::ExpectedDateDelimiter)
    }
}

fn match_name(name: &str, candidates: &[&str]) -> Option<i32> {
    for (index, candidate) in candidates.iter().enumerate() {
        if candidate.eq_ignore_ascii_case(name) {
            return Some(index as i32 + 1);
        }
    }
    None
}

fn parse_year(
    p: &mut StrParser<'_>,
    settings: &Settings,
    max_digits: usize,
) -> Result<i32, ParseErrorKind> {
    let head = p.clone().strip_matches(|c| c.is_ascii_digit());
    let head = if head.len() > max_digits {
        head.get(..max_digits).ok_or(ParseErrorKind::DateSyntax)?
    } else {
        head
    };

    let year = head
        .parse::<i32>()
        .map_err(|_| ParseErrorKind::DateSyntax)?;
    p.0 = &p.0[head.len()..];
    Ok(settings.epoch.apply(year))
}

fn parse_int<T>(p: &mut StrParser<'_>) -> Result<T, ParseErrorKind>
where
    T: FromStr,
{
    let mut tmp = *p;
    tmp.strip_one_of(&['+', '-']).inspect(|_| tmp.strip_ws());
    tmp.strip_matches(|c| c.is_ascii_digit());
    let number = p
        .up_to(tmp.0)
        .parse::<T>()
        .map_err(|_| ParseErrorKind::DateSyntax)?;
    *p = tmp;
    Ok(number)
}

#[derive(Copy, Clone, Debug)]
pub struct StrParser<'a>(pub &'a str);

impl<'a> StrParser<'a> {
    pub fn new(s: &'a str) -> Self {
        Self(s)
    }

    pub fn strip_prefix(&mut self, prefix: &'a str) -> bool {
        if prefix.is_empty() {
            false
        } else if let Some(rest) = self.0.strip_prefix(prefix) {
            self.0 = rest;
            true
        } else {
            false
        }
    }

    fn strip_one_of(&mut self, chars: &[char]) -> Option<char> {
        let mut iter = self.0.chars();
        match iter.next() {
            Some(c) if chars.contains(&c) => {
                self.0 = iter.as_str();
                Some(c)
            }
            _ => None,
        }
    }

    fn strip_matches(&mut self, f: impl Fn(char) -> bool) -> &'a str {
        self.advance(self.0.trim_start_matches(f))
    }

    fn strip_ws(&mut self) {
        self.0 = self.0.trim_start();
    }

    fn advance(&mut self, rest: &'a str) -> &'a str {
        let head = self.up_to(rest);
        self.0 = rest;
        head
    }

    fn up_to(&self, rest: &'a str) -> &'a str {
        &self.0[..self.0.len() - rest.len()]
    }
}

/*
#[derive(Copy, Clone, Debug)]
pub struct ByteParser<'a>(pub &'a [u8]);

impl<'a> ByteParser<'a> {
    pub fn new(s: &'a [u8]) -> Self {
        Self(s)
    }

    pub fn strip_prefix(&mut self, prefix: &'a [u8]) -> bool {
        if prefix.is_empty() {
            false
        } else if let Some(rest) = self.0.strip_prefix(prefix) {
            self.0 = rest;
            true
        } else {
            false
        }
    }

    fn strip_one_of(&mut self, chars: &[char]) -> Option<char> {
        let mut iter = self.0.iter();
        match iter.next() {
            Some(c) if chars.contains(&c) => {
                self.0 = iter.as_str();
                Some(c)
            }
            _ => None,
        }
    }

    fn strip_matches(&mut self, f: impl Fn(char) -> bool) -> &'a [u8] {
        self.advance(self.0.trim_start_matches(f))
    }

    fn strip_ws(&mut self) {
        self.0 = self.0.trim_start();
    }

    fn advance(&mut self, rest: &'a [u8]) -> &'a [u8] {
        let head = self.up_to(rest);
        self.0 = rest;
        head
    }

    fn up_to(&self, rest: &'a [u8]) -> &'a [u8] {
        &self.0[..self.0.len() - rest.len()]
    }
}*/

fn nibble(b: u8) -> Result<u128, ParseErrorKind> {
    if b < 10 {
        Ok(b as u128)
    } else {
        Err(ParseErrorKind::NonBDCDigit(b))
    }
}
