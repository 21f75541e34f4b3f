//! Annotation tags.
//!
//! Two nested mini-languages: the outer `key:"value" key2:"value2"` form found in struct
//! field tags and declaration comments, and the inner `name, key=value, key='quoted'`
//! property list carried by a single tag value. Both truncate on malformed input instead
//! of failing: whatever parsed before the first malformed entry is kept.

use std::borrow::Cow;
use std::fmt;

use gosyntax::lit;
use indexmap::IndexMap;

/// Raw value of one tag. Properties are parsed on every query, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Default, Hash)]
pub struct Tag(String);

impl Tag {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lazily yields the `key[=value]` entries of this tag in order.
    pub fn properties(&self) -> Properties<'_> {
        Properties::new(&self.0)
    }

    /// Value of the first property named `key`. Flags without a value yield `""`.
    pub fn property(&self, key: &str) -> Option<Cow<'_, str>> {
        self.properties().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.property(key).is_some()
    }

    /// `true` for a present property whose value is empty, `1`, `true` or `yes`
    /// (case-insensitive); `false` otherwise, including when absent.
    pub fn bool_property(&self, key: &str) -> bool {
        self.property(key).is_some_and(|v| {
            v.is_empty()
                || v == "1"
                || v.eq_ignore_ascii_case("true")
                || v.eq_ignore_ascii_case("yes")
        })
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Tag {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Tag set keyed by tag name, in first-insertion order. Re-inserting a key replaces its
/// value but keeps its position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tags(IndexMap<String, Tag>);

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.0.get(key)
    }

    #[inline]
    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, tag: Tag) -> Option<Tag> {
        self.0.insert(key.into(), tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tag)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Extend<(String, Tag)> for Tags {
    fn extend<I: IntoIterator<Item = (String, Tag)>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl FromIterator<(String, Tag)> for Tags {
    fn from_iter<I: IntoIterator<Item = (String, Tag)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Tags {
    type Item = (String, Tag);
    type IntoIter = indexmap::map::IntoIter<String, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Scans `key:"value"` pairs separated by spaces.
///
/// Keys are runs of bytes above `' '` other than `:`, `"` and DEL, and must be followed by
/// `:"`. Values are Go double-quoted strings. Scanning stops at the first malformed pair;
/// a value that is well delimited but fails to unquote is skipped.
pub fn scan_tags(text: &str) -> Tags {
    let mut tags = Tags::new();
    let bytes = text.as_bytes();
    let mut pos = 0;

    loop {
        while bytes.get(pos) == Some(&b' ') {
            pos += 1;
        }
        if pos >= bytes.len() {
            break;
        }

        let key_start = pos;
        while let Some(&b) = bytes.get(pos) {
            if b <= b' ' || b == b':' || b == b'"' || b == 0x7f {
                break;
            }
            pos += 1;
        }
        if pos == key_start || bytes.get(pos) != Some(&b':') || bytes.get(pos + 1) != Some(&b'"') {
            break;
        }
        let key = &text[key_start..pos];

        // Opening quote at `pos + 1`.
        let value_start = pos + 1;
        let mut i = value_start + 1;
        while i < bytes.len() && bytes[i] != b'"' {
            if bytes[i] == b'\\' {
                i += 1;
            }
            i += 1;
        }
        if i >= bytes.len() {
            break;
        }
        let quoted = &text[value_start..=i];
        pos = i + 1;

        match lit::unquote(quoted) {
            Ok(value) => {
                tags.insert(key, Tag(value));
            }
            Err(err) => tracing::trace!(key, %err, "skipping tag with malformed value"),
        }
    }

    tags
}

/// Iterator over the `key[=value]` entries of a tag value.
///
/// Keys end at space, tab, `=` or `,`. A key followed by `,` or the end of input is a flag
/// with an empty value. Values are either quoted with `"`, `'` (backslash escapes the next
/// character) or `` ` `` (verbatim, carriage returns dropped), or unquoted up to the next
/// byte at or below `' '` or `,`. Iteration ends at the first malformed entry.
///
/// A key followed by anything other than `=`, `,` or the end of input is malformed:
/// `"a b"` yields nothing rather than treating the blank as a separator.
#[derive(Debug, Clone)]
pub struct Properties<'a> {
    src: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> Properties<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            pos: 0,
            done: false,
        }
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn skip_blanks(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t')) {
            self.pos += 1;
        }
    }

    fn scan_entry(&mut self) -> Option<(&'a str, Cow<'a, str>)> {
        self.skip_blanks();
        let key_start = self.pos;
        while self
            .peek()
            .is_some_and(|b| !matches!(b, b' ' | b'\t' | b'=' | b','))
        {
            self.pos += 1;
        }
        if self.pos == key_start {
            return None;
        }
        let key = &self.src[key_start..self.pos];

        self.skip_blanks();
        match self.peek() {
            None => return Some((key, Cow::Borrowed(""))),
            Some(b',') => {
                self.pos += 1;
                return Some((key, Cow::Borrowed("")));
            }
            Some(b'=') => self.pos += 1,
            Some(_) => return None,
        }

        self.skip_blanks();
        let value = match self.peek() {
            None => return Some((key, Cow::Borrowed(""))),
            Some(q @ (b'"' | b'\'' | b'`')) => self.scan_quoted(q)?,
            Some(_) => {
                let start = self.pos;
                while self.peek().is_some_and(|b| b > b' ' && b != b',') {
                    self.pos += 1;
                }
                Cow::Borrowed(&self.src[start..self.pos])
            }
        };

        self.skip_blanks();
        match self.peek() {
            None => {}
            Some(b',') => self.pos += 1,
            // The entry itself is complete; nothing after it is read.
            Some(_) => self.done = true,
        }
        Some((key, value))
    }

    /// Scans a quoted value starting at the opening quote `q`. `None` if unterminated.
    fn scan_quoted(&mut self, q: u8) -> Option<Cow<'a, str>> {
        let bytes = self.src.as_bytes();
        self.pos += 1;
        let mut start = self.pos;
        let mut owned: Option<String> = None;

        loop {
            let b = *bytes.get(self.pos)?;
            if b == q {
                break;
            }
            if b == b'\r' && q == b'`' {
                owned
                    .get_or_insert_with(String::new)
                    .push_str(&self.src[start..self.pos]);
                self.pos += 1;
                start = self.pos;
            } else if b == b'\\' && q != b'`' {
                owned
                    .get_or_insert_with(String::new)
                    .push_str(&self.src[start..self.pos]);
                self.pos += 1;
                if self.pos >= bytes.len() {
                    return None;
                }
                start = self.pos;
                self.pos += 1;
            } else {
                self.pos += 1;
            }
        }

        let tail = self.src.get(start..self.pos)?;
        self.pos += 1;
        Some(match owned {
            None => Cow::Borrowed(tail),
            Some(mut s) => {
                s.push_str(tail);
                Cow::Owned(s)
            }
        })
    }
}

impl<'a> Iterator for Properties<'a> {
    type Item = (&'a str, Cow<'a, str>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let entry = self.scan_entry();
        if entry.is_none() {
            self.done = true;
        }
        entry
    }
}
