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

//! Individual pieces of data.
//!
//! [Datum] is the value of one [Variable].  String data in a [Datum] is held
//! in some type that implements [RawString], usually [ByteString] (owned) or
//! [ByteStr] (borrowed); the character encoding, when one is known, is
//! attached separately via [WithEncoding] rather than being part of the raw
//! bytes themselves.  (All of the variables in a [Dictionary] share the same
//! character encoding.)
//!
//! A [Case] is one record: a sequence of [Datum]s, one per variable, stored
//! contiguously and shared via reference-counting so that cheap clones are
//! possible; writing through a clone first takes a private copy.
//!
//! [Variable]: crate::variable::Variable
//! [Dictionary]: crate::dictionary::Dictionary

#![cfg_attr(not(test), warn(missing_docs))]

mod encoded;

use std::{
    borrow::Cow,
    cmp::Ordering,
    fmt::{Debug, Display, Formatter},
    hash::Hash,
    sync::Arc,
};

use encoding_rs::{mem::decode_latin1, Encoding, UTF_8};
use ordered_float::OrderedFloat;
use serde::Serialize;

pub use encoded::{Encoded, EncodedString, WithEncoding};

use crate::variable::{VarType, VarWidth};

/// A string resize that would lose information.
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResizeError {
    /// Attempted to resize a numeric value as if it were a string, or vice
    /// versa.
    #[error("cannot resize between numeric and string")]
    MixedTypes,

    /// Shrinking the string would have cut off non-space characters.
    #[error("string is too wide to resize without losing data")]
    TooWide,
}

/// Something that can be viewed as a byte string in an unspecified character
/// encoding.
///
/// We assume that the encoding is one supported by [encoding_rs] with byte
/// code units (that is, not a `UTF-16` encoding).  All such encodings have
/// some basic ASCII compatibility, which is what justifies space-padding and
/// space-trimming raw strings without regard to their encoding.
pub trait RawString {
    /// Returns the raw bytes of this string, in its own encoding.
    fn raw_string_bytes(&self) -> &[u8];

    /// Tags this string with `encoding`, without changing its bytes.
    fn with_encoding(self, encoding: &'static Encoding) -> WithEncoding<Self>
    where
        Self: Sized,
    {
        WithEncoding::new(self, encoding)
    }

    /// Returns an object that implements [Display] for printing these bytes,
    /// given that they are encoded in `encoding`.
    fn display(&self, encoding: &'static Encoding) -> DisplayRawString<'_> {
        DisplayRawString(encoding.decode_without_bom_handling(self.raw_string_bytes()).0)
    }
}

/// Helper struct for printing a [RawString] with [format!], created by
/// [RawString::display].
pub struct DisplayRawString<'a>(Cow<'a, str>);

impl<'a> Display for DisplayRawString<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", &self.0)
    }
}

/// A [RawString] that can be resized and trimmed in place.
pub trait MutRawString: RawString {
    /// Extends or shortens this string to exactly `new_len` bytes.  Returns
    /// [ResizeError::TooWide] without modifying `self` if shortening the
    /// string would cut off a non-space byte.  Extension is always done with
    /// spaces and always succeeds.
    fn resize(&mut self, new_len: usize) -> Result<(), ResizeError>;

    /// Removes any trailing ASCII spaces.
    fn trim_end(&mut self);
}

fn eq_ignore_trailing_spaces(a: &[u8], b: &[u8]) -> bool {
    let mut a = a.iter();
    let mut b = b.iter();
    loop {
        match (a.next(), b.next()) {
            (Some(x), Some(y)) if x == y => (),
            (Some(_), Some(_)) => return false,
            (None, None) => return true,
            (Some(b' '), None) => return a.all(|c| *c == b' '),
            (None, Some(b' ')) => return b.all(|c| *c == b' '),
            (Some(_), None) | (None, Some(_)) => return false,
        }
    }
}

/// Displays `bytes` as UTF-8 if valid, else as Latin-1 (bytes interpreted
/// directly as Unicode code points).
struct DisplayBytes<'a>(&'a [u8]);

impl<'a> Display for DisplayBytes<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = std::str::from_utf8(self.0).map_or_else(|_| decode_latin1(self.0), Cow::from);
        write!(f, "{s}")
    }
}

fn debug_bytes(bytes: &[u8], f: &mut Formatter) -> std::fmt::Result {
    write!(f, "{:?}", DisplayBytes(bytes).to_string())
}

/// An owned byte string in an unspecified character encoding.
///
/// A [ByteString] is usually associated with a [Variable] and uses the
/// variable's character encoding.  For a borrowed byte string, see
/// [ByteStr].
///
/// [Variable]: crate::variable::Variable
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteString(pub Vec<u8>);

impl Serialize for ByteString {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&DisplayBytes(&self.0))
    }
}

impl ByteString {
    /// Creates a new [ByteString] that consists of `n` ASCII spaces.
    pub fn spaces(n: usize) -> Self {
        Self(std::iter::repeat_n(b' ', n).collect())
    }

    /// Returns the number of bytes in this string.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if this string has no bytes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns this byte string as a borrowed [ByteStr].
    pub fn as_byte_str(&self) -> ByteStr<'_> {
        ByteStr(&self.0)
    }
}

impl RawString for ByteString {
    fn raw_string_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl MutRawString for ByteString {
    fn resize(&mut self, new_len: usize) -> Result<(), ResizeError> {
        if new_len < self.0.len() && !self.0[new_len..].iter().all(|&b| b == b' ') {
            return Err(ResizeError::TooWide);
        }
        self.0.resize(new_len, b' ');
        Ok(())
    }

    fn trim_end(&mut self) {
        while self.0.pop_if(|c| *c == b' ').is_some() {}
    }
}

impl Debug for ByteString {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        debug_bytes(&self.0, f)
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(source: Vec<u8>) -> Self {
        Self(source)
    }
}

impl From<&[u8]> for ByteString {
    fn from(source: &[u8]) -> Self {
        Self(source.into())
    }
}

impl From<&str> for ByteString {
    fn from(source: &str) -> Self {
        Self(source.as_bytes().into())
    }
}

impl From<String> for ByteString {
    fn from(source: String) -> Self {
        Self(source.into_bytes())
    }
}

impl From<Cow<'_, [u8]>> for ByteString {
    fn from(source: Cow<'_, [u8]>) -> Self {
        Self(source.into_owned())
    }
}

impl From<Cow<'_, str>> for ByteString {
    fn from(source: Cow<'_, str>) -> Self {
        Self(source.into_owned().into_bytes())
    }
}

impl<const N: usize> From<[u8; N]> for ByteString {
    fn from(source: [u8; N]) -> Self {
        Self(source.into())
    }
}

impl PartialEq<ByteStr<'_>> for ByteString {
    fn eq(&self, other: &ByteStr<'_>) -> bool {
        self.0 == other.0
    }
}

/// A borrowed byte string in an unspecified character encoding.
///
/// For an owned byte string, see [ByteString].
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ByteStr<'a>(pub &'a [u8]);

impl<'a> Serialize for ByteStr<'a> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&DisplayBytes(self.0))
    }
}

impl<'a> ByteStr<'a> {
    /// Returns the string's length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the string is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> RawString for ByteStr<'a> {
    fn raw_string_bytes(&self) -> &[u8] {
        self.0
    }
}

impl<'a> Debug for ByteStr<'a> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        debug_bytes(self.0, f)
    }
}

impl<'a> PartialEq<ByteString> for ByteStr<'a> {
    fn eq(&self, other: &ByteString) -> bool {
        self.0 == other.0.as_slice()
    }
}

/// A borrowed-or-owned byte string in an unspecified character encoding.
///
/// The owned form is [ByteString]; the purely-borrowed form is [ByteStr].
#[derive(Clone, PartialEq, Eq)]
pub struct ByteCow<'a>(pub Cow<'a, [u8]>);

impl<'a> ByteCow<'a> {
    /// Converts to an owned [ByteString], cloning only if necessary.
    pub fn into_owned(self) -> ByteString {
        ByteString(self.0.into_owned())
    }
}

impl<'a> RawString for ByteCow<'a> {
    fn raw_string_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl<'a> Debug for ByteCow<'a> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        debug_bytes(&self.0, f)
    }
}

impl<'a> From<&'a str> for ByteCow<'a> {
    fn from(s: &'a str) -> Self {
        Self(Cow::Borrowed(s.as_bytes()))
    }
}

impl<'a> From<&'a [u8]> for ByteCow<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        Self(Cow::Borrowed(bytes))
    }
}

/// A fixed-size borrowed-and-owned byte array, used for binary records with a
/// known, constant width (document lines, 8-byte missing values, and so on).
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ByteStrArray<const N: usize>(pub [u8; N]);

impl<const N: usize> Serialize for ByteStrArray<N> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(&DisplayBytes(&self.0))
    }
}

impl<const N: usize> ByteStrArray<N> {
    /// Returns the bytes of this array.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> RawString for ByteStrArray<N> {
    fn raw_string_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl<const N: usize> Debug for ByteStrArray<N> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        debug_bytes(&self.0, f)
    }
}

/// Helper for displaying a [RawString] in double quotes, with non-ASCII and
/// control characters escaped.
///
/// Created by [EncodedString::quoted].
pub struct Quoted<T>(pub T);

impl<T> Display for Quoted<T>
where
    T: EncodedString,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0.as_str())
    }
}

/// The value of a [Variable](crate::variable::Variable).
///
/// `T` is usually [ByteString] for an owned, encoding-less value, or
/// [`WithEncoding<ByteString>`] when the value's encoding travels with it.
#[derive(Clone, Serialize)]
pub enum Datum<T = ByteString> {
    /// A numeric value.
    Number(
        /// A number, or `None` for the system-missing value.
        Option<f64>,
    ),
    /// A string value.
    String(
        /// The value, in the variable's encoding.
        T,
    ),
}

impl<T> Debug for Datum<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Datum::Number(Some(number)) => write!(f, "{number:?}"),
            Datum::Number(None) => write!(f, "SYSMIS"),
            Datum::String(s) => write!(f, "{s:?}"),
        }
    }
}

impl<T, U> PartialEq<Datum<U>> for Datum<T>
where
    T: PartialEq<U>,
{
    fn eq(&self, other: &Datum<U>) -> bool {
        match (self, other) {
            (Self::Number(Some(a)), Datum::Number(Some(b))) => OrderedFloat(*a) == OrderedFloat(*b),
            (Self::Number(None), Datum::Number(None)) => true,
            (Self::String(a), Datum::String(b)) => a == b,
            _ => false,
        }
    }
}

impl<T> Eq for Datum<T> where T: Eq {}

impl<T> PartialOrd for Datum<T>
where
    T: Ord,
{
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Datum<T>
where
    T: Ord,
{
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Datum::Number(a), Datum::Number(b)) => match (a, b) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => a.total_cmp(b),
            },
            (Datum::Number(_), Datum::String(_)) => Ordering::Less,
            (Datum::String(_), Datum::Number(_)) => Ordering::Greater,
            (Datum::String(a), Datum::String(b)) => a.cmp(b),
        }
    }
}

impl<T> Hash for Datum<T>
where
    T: Hash,
{
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Datum::Number(number) => number.map(OrderedFloat).hash(state),
            Datum::String(string) => string.hash(state),
        }
    }
}

impl<T> Datum<T> {
    /// Constructs a new numerical [Datum] for the system-missing value.
    pub const fn sysmis() -> Self {
        Self::Number(None)
    }

    /// Returns the number inside this datum, or `None` if this is a string
    /// datum.  The outer `Option` distinguishes "not numeric" from the inner
    /// `Option`, which distinguishes the system-missing value.
    pub fn as_number(&self) -> Option<Option<f64>> {
        match self {
            Datum::Number(number) => Some(*number),
            Datum::String(_) => None,
        }
    }

    /// Returns the string inside this datum, or `None` if this is a numeric
    /// datum.
    pub fn as_string(&self) -> Option<&T> {
        match self {
            Datum::Number(_) => None,
            Datum::String(s) => Some(s),
        }
    }

    /// Returns the string inside this datum as a mutable borrow, or `None` if
    /// this is a numeric datum.
    pub fn as_string_mut(&mut self) -> Option<&mut T> {
        match self {
            Datum::Number(_) => None,
            Datum::String(s) => Some(s),
        }
    }

    /// Returns the [VarType] corresponding to this datum.
    pub fn var_type(&self) -> VarType {
        match self {
            Self::Number(_) => VarType::Numeric,
            Self::String(_) => VarType::String,
        }
    }

    /// Tags this datum with `encoding`, leaving numeric data untouched.
    pub fn with_encoding(self, encoding: &'static Encoding) -> Datum<WithEncoding<T>> {
        match self {
            Datum::Number(number) => Datum::Number(number),
            Datum::String(s) => Datum::String(WithEncoding::new(s, encoding)),
        }
    }
}

impl<T> Datum<WithEncoding<T>> {
    /// Removes the encoding tag from this datum, keeping its raw bytes.
    pub fn without_encoding(self) -> Datum<T> {
        match self {
            Datum::Number(number) => Datum::Number(number),
            Datum::String(s) => Datum::String(s.into_inner()),
        }
    }
}

impl Datum<WithEncoding<ByteString>> {
    /// Recodes a string datum into UTF-8 in place, tripling its width; a
    /// numeric datum is unaffected.
    pub fn codepage_to_unicode(&mut self) {
        if let Datum::String(s) = self {
            s.codepage_to_unicode();
        }
    }
}

impl<T> Datum<T>
where
    T: RawString,
{
    /// Returns the [VarWidth] corresponding to this datum.
    pub fn width(&self) -> VarWidth {
        match self {
            Datum::Number(_) => VarWidth::Numeric,
            Datum::String(s) => VarWidth::String(s.raw_string_bytes().len().try_into().unwrap()),
        }
    }

    /// Returns true if this datum can be resized to `width` without loss,
    /// which is true only if this datum and `width` are both string or both
    /// numeric and, for string widths, if shrinking would not drop any
    /// non-space bytes.
    pub fn is_resizable(&self, width: VarWidth) -> bool {
        match (self, width) {
            (Datum::Number(_), VarWidth::Numeric) => true,
            (Datum::String(s), VarWidth::String(new_width)) => {
                let bytes = s.raw_string_bytes();
                let new_len = new_width as usize;
                new_len >= bytes.len() || bytes[new_len..].iter().all(|c| *c == b' ')
            }
            _ => false,
        }
    }

    /// Returns a borrowed view of this datum's bytes, discarding any
    /// encoding tag.
    pub fn as_raw(&self) -> Datum<ByteStr<'_>> {
        match self {
            Datum::Number(n) => Datum::Number(*n),
            Datum::String(s) => Datum::String(ByteStr(s.raw_string_bytes())),
        }
    }

    /// Compares this datum and `other` for equality, ignoring trailing ASCII
    /// spaces if both are strings.
    pub fn eq_ignore_trailing_spaces<S>(&self, other: &Datum<S>) -> bool
    where
        S: RawString,
    {
        match (self, other) {
            (Datum::String(a), Datum::String(b)) => {
                eq_ignore_trailing_spaces(a.raw_string_bytes(), b.raw_string_bytes())
            }
            (Datum::Number(a), Datum::Number(b)) => a.map(OrderedFloat) == b.map(OrderedFloat),
            _ => false,
        }
    }
}

impl<T> Datum<T>
where
    T: MutRawString,
{
    /// Removes trailing ASCII spaces from this datum, if it is a string.
    pub fn trim_end(&mut self) {
        if let Self::String(s) = self {
            s.trim_end();
        }
    }

    /// Resizes this datum to `width`.  Fails with [ResizeError::MixedTypes]
    /// if `width`'s type does not match this datum's type, or with
    /// [ResizeError::TooWide] if shrinking a string would drop non-space
    /// bytes.
    pub fn resize(&mut self, width: VarWidth) -> Result<(), ResizeError> {
        match (self, width) {
            (Datum::Number(_), VarWidth::Numeric) => Ok(()),
            (Datum::String(s), VarWidth::String(new_width)) => s.resize(new_width as usize),
            _ => Err(ResizeError::MixedTypes),
        }
    }
}

impl<T> Datum<T>
where
    T: EncodedString,
{
    /// Returns a helper for displaying this datum, quoting string values and
    /// spelling out `SYSMIS` for the system-missing value.
    pub fn quoted(&self) -> DisplayDatum<'_, T> {
        DisplayDatum(self)
    }
}

/// Helper for displaying a [Datum], created by [Datum::quoted].
pub struct DisplayDatum<'a, T>(&'a Datum<T>);

impl<'a, T> Display for DisplayDatum<'a, T>
where
    T: EncodedString,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Datum::Number(Some(number)) => write!(f, "{number}"),
            Datum::Number(None) => write!(f, "SYSMIS"),
            Datum::String(s) => write!(f, "{:?}", s.as_str()),
        }
    }
}

impl From<f64> for Datum {
    fn from(number: f64) -> Self {
        Some(number).into()
    }
}

impl From<Option<f64>> for Datum {
    fn from(value: Option<f64>) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Self::String(ByteString::from(value))
    }
}

impl From<&[u8]> for Datum {
    fn from(value: &[u8]) -> Self {
        Self::String(ByteString::from(value))
    }
}

/// A case in a data set: one [Datum] per variable in the corresponding
/// [Dictionary], in the same order.
///
/// A [Case] is reference-counted and copy-on-write: cloning it is cheap
/// (it bumps a reference count), and mutating a clone through
/// [Case::make_mut] takes a private copy first if the data is shared, so
/// that other clones keep their prior values.
///
/// [Dictionary]: crate::dictionary::Dictionary
#[derive(Clone)]
pub struct Case<T = Vec<Datum<ByteString>>> {
    encoding: &'static Encoding,
    data: Arc<T>,
}

impl<T> Debug for Case<T>
where
    T: Debug,
{
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        f.debug_struct("Case")
            .field("encoding", &self.encoding.name())
            .field("data", &self.data)
            .finish()
    }
}

impl<T> PartialEq for Case<T>
where
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        self.encoding == other.encoding && self.data == other.data
    }
}

impl<T> Eq for Case<T> where T: Eq {}

impl<T> Case<T> {
    /// Constructs a new case wrapping `data`, tagged with `encoding`.
    pub fn new(data: T, encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            data: Arc::new(data),
        }
    }

    /// Returns this case's character encoding.
    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Returns the number of clones (including `self`) that share the
    /// underlying data.
    pub fn refcount(&self) -> usize {
        Arc::strong_count(&self.data)
    }
}

impl<T> std::ops::Deref for Case<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.data
    }
}

impl<T> Case<T>
where
    T: Clone,
{
    /// Returns a mutable reference to the case's data, taking a private copy
    /// first if it is currently shared with another [Case].
    pub fn make_mut(&mut self) -> &mut T {
        Arc::make_mut(&mut self.data)
    }
}

/// A case whose values have not yet been tagged with a character encoding,
/// as read directly off of disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawCase(pub Vec<Datum<ByteString>>);

impl RawCase {
    /// Tags this case's values with `encoding`, consuming it.
    pub fn with_encoding(self, encoding: &'static Encoding) -> Case<Vec<Datum<ByteString>>> {
        Case::new(self.0, encoding)
    }
}

impl Case<Vec<Datum<ByteString>>> {
    /// Builds a case with one system-missing or all-spaces value per width in
    /// `widths`.
    pub fn from_widths(
        widths: impl IntoIterator<Item = VarWidth>,
        encoding: &'static Encoding,
    ) -> Self {
        let data = widths
            .into_iter()
            .map(|width| match width {
                VarWidth::Numeric => Datum::Number(None),
                VarWidth::String(width) => Datum::String(ByteString::spaces(width as usize)),
            })
            .collect();
        Self::new(data, encoding)
    }

    /// Returns the number of values (one per variable) in this case.
    pub fn value_count(&self) -> usize {
        self.data.len()
    }

    /// Returns the value at dictionary index `index`.
    pub fn value(&self, index: usize) -> &Datum<ByteString> {
        &self.data[index]
    }

    /// Returns the numeric value at dictionary index `index`, or `None` if
    /// it is system-missing.
    ///
    /// # Panics
    ///
    /// Panics if the value at `index` is a string.
    pub fn num(&self, index: usize) -> Option<f64> {
        self.data[index].as_number().expect("numeric value")
    }

    /// Returns the string value at dictionary index `index`.
    ///
    /// # Panics
    ///
    /// Panics if the value at `index` is numeric.
    pub fn str(&self, index: usize) -> &ByteString {
        self.data[index].as_string().expect("string value")
    }

    /// Copies `count` values starting at `src_ofs` in `src` into `self`
    /// starting at `dst_ofs`, taking a private copy of `self`'s data first if
    /// it is shared.
    pub fn copy_from(
        &mut self,
        dst_ofs: usize,
        src: &Case<Vec<Datum<ByteString>>>,
        src_ofs: usize,
        count: usize,
    ) {
        let dst = self.make_mut();
        dst[dst_ofs..dst_ofs + count].clone_from_slice(&src.data[src_ofs..src_ofs + count]);
    }

    /// Recodes every string value from this case's current encoding into
    /// UTF-8, tripling string widths in the process.  If the case is already
    /// in UTF-8, this is a no-op.
    pub fn into_unicode(self) -> Self {
        if self.encoding == UTF_8 {
            return self;
        }
        let encoding = self.encoding;
        let data = match Arc::try_unwrap(self.data) {
            Ok(data) => data,
            Err(shared) => (*shared).clone(),
        };
        let data = data
            .into_iter()
            .map(|datum| {
                let mut tagged = datum.with_encoding(encoding);
                tagged.codepage_to_unicode();
                tagged.without_encoding()
            })
            .collect();
        Self::new(data, UTF_8)
    }
}

#[cfg(test)]
mod tests {
    use encoding_rs::{UTF_8, WINDOWS_1252};

    use super::{ByteStr, ByteString, Case, Datum, MutRawString, RawString, ResizeError};
    use crate::variable::VarWidth;

    #[test]
    fn byte_string_resize_rejects_lossy_shrink() {
        let mut s = ByteString::from("abc  ");
        assert_eq!(s.resize(3), Ok(()));
        assert_eq!(s.0, b"abc");

        let mut s = ByteString::from("abcde");
        assert_eq!(s.resize(3), Err(ResizeError::TooWide));
        assert_eq!(s.0, b"abcde");
    }

    #[test]
    fn byte_string_trim_end() {
        let mut s = ByteString::from("abc   ");
        s.trim_end();
        assert_eq!(s.0, b"abc");
    }

    #[test]
    fn datum_eq_ignore_trailing_spaces() {
        let a = Datum::String(ByteString::from("abc"));
        let b = Datum::String(ByteString::from("abc   "));
        assert!(a.eq_ignore_trailing_spaces(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn datum_width_and_resize() {
        let mut datum = Datum::String(ByteString::from("abc"));
        assert_eq!(datum.width(), VarWidth::String(3));
        datum.resize(VarWidth::String(5)).unwrap();
        assert_eq!(datum.as_string().unwrap().0, b"abc  ");
        assert_eq!(
            datum.resize(VarWidth::Numeric),
            Err(ResizeError::MixedTypes)
        );
    }

    #[test]
    fn datum_as_raw_compares_across_ownership() {
        let owned = Datum::String(ByteString::from("abc"));
        let borrowed: Datum<ByteStr> = Datum::String(ByteStr(b"abc"));
        assert_eq!(owned.as_raw(), borrowed);
    }

    #[test]
    fn case_clone_is_copy_on_write() {
        let a = Case::from_widths([VarWidth::Numeric, VarWidth::String(3)], UTF_8);
        let mut b = a.clone();
        assert_eq!(a.refcount(), 2);

        b.make_mut()[0] = Datum::Number(Some(1.0));
        assert_eq!(a.refcount(), 1);
        assert_eq!(a.value(0), &Datum::Number(None));
        assert_eq!(b.value(0), &Datum::Number(Some(1.0)));
    }

    #[test]
    fn case_into_unicode_triples_string_width() {
        let data = vec![Datum::String(ByteString::from(
            WINDOWS_1252.encode("éèäî").0,
        ))];
        let case = Case::new(data, WINDOWS_1252).into_unicode();
        assert_eq!(case.encoding(), UTF_8);
        assert_eq!(case.value(0), &Datum::String(ByteString::from("éèäî    ")));
    }
}
