//! Struct tag codec.
//!
//! A tag is the conventional `key:"value" key:"value"` list inside a field's
//! tag literal. Keys keep their order; values keep their quoted form so a
//! rebuilt tag differs from the input only in the pairs that were removed.

use std::fmt;

/// One `key:"value"` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    /// Unquoted value.
    pub value: String,
    /// Value as written, including its quotes.
    raw: String,
}

impl Tag {
    /// Directive name: the value up to the first comma.
    pub fn name(&self) -> &str {
        self.value.split(',').next().unwrap_or_default()
    }

    /// Options after the directive name.
    pub fn options(&self) -> Vec<&str> {
        self.value.split(',').skip(1).collect()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.key, self.raw)
    }
}

/// Why a tag string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagError {
    /// A key with no `:` after it.
    MissingColon(String),
    /// A `:` not followed by a quoted value.
    MissingQuote(String),
    /// A quoted value with no closing quote.
    Unterminated(String),
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingColon(key) => write!(f, "tag key {key:?} has no value"),
            Self::MissingQuote(key) => write!(f, "tag value for {key:?} is not quoted"),
            Self::Unterminated(key) => write!(f, "tag value for {key:?} is not terminated"),
        }
    }
}

impl std::error::Error for TagError {}

/// An ordered list of tag pairs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tags(Vec<Tag>);

impl Tags {
    /// Parse a tag string without its surrounding backticks.
    pub fn parse(input: &str) -> Result<Self, TagError> {
        let bytes = input.as_bytes();
        let mut tags = Vec::new();
        let mut i = 0;

        loop {
            while i < bytes.len() && bytes[i] == b' ' {
                i += 1;
            }
            if i >= bytes.len() {
                break;
            }

            let key_start = i;
            while i < bytes.len()
                && bytes[i] > b' '
                && bytes[i] != b':'
                && bytes[i] != b'"'
                && bytes[i] != 0x7f
            {
                i += 1;
            }
            let key = &input[key_start..i];
            if key.is_empty() || i >= bytes.len() || bytes[i] != b':' {
                return Err(TagError::MissingColon(input[key_start..].to_string()));
            }
            i += 1;

            if i >= bytes.len() || bytes[i] != b'"' {
                return Err(TagError::MissingQuote(key.to_string()));
            }
            let raw_start = i;
            i += 1;
            let mut value = String::new();
            loop {
                match bytes.get(i) {
                    None => return Err(TagError::Unterminated(key.to_string())),
                    Some(b'"') => {
                        i += 1;
                        break;
                    }
                    Some(b'\\') => {
                        let Some(escaped) = input[i + 1..].chars().next() else {
                            return Err(TagError::Unterminated(key.to_string()));
                        };
                        value.push(match escaped {
                            'n' => '\n',
                            't' => '\t',
                            c => c,
                        });
                        i += 1 + escaped.len_utf8();
                    }
                    Some(_) => {
                        let ch = input[i..].chars().next().unwrap_or_default();
                        value.push(ch);
                        i += ch.len_utf8();
                    }
                }
            }

            tags.push(Tag {
                key: key.to_string(),
                value,
                raw: input[raw_start..i].to_string(),
            });
        }

        Ok(Self(tags))
    }

    /// Parse a tag literal as written in source, backticks included.
    ///
    /// `None` when the literal is empty or malformed.
    pub fn from_literal(literal: &str) -> Option<Self> {
        let inner = literal.trim_matches('`');
        if inner.is_empty() {
            return None;
        }
        Self::parse(inner).ok()
    }

    /// Find a pair by key.
    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.0.iter().find(|t| t.key == key)
    }

    /// True if a pair with `key` exists.
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Keys in order.
    pub fn keys(&self) -> Vec<&str> {
        self.0.iter().map(|t| t.key.as_str()).collect()
    }

    /// Drop every pair whose key is in `keys`. Returns true if anything was removed.
    pub fn remove_keys<S: AsRef<str>>(&mut self, keys: &[S]) -> bool {
        let before = self.0.len();
        self.0.retain(|t| !keys.iter().any(|k| k.as_ref() == t.key));
        self.0.len() != before
    }

    /// True if there are no pairs.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of pairs.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Render as a backtick literal, or `None` when empty.
    pub fn to_literal(&self) -> Option<String> {
        (!self.is_empty()).then(|| format!("`{self}`"))
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{tag}")?;
        }
        Ok(())
    }
}

/// True if `literal` carries a pair with `key`.
pub fn has_tag(literal: &str, key: &str) -> bool {
    Tags::from_literal(literal).is_some_and(|t| t.has(key))
}

/// The JSON field name from a tag literal, or the empty string.
pub fn json_field_name(literal: &str) -> String {
    Tags::from_literal(literal)
        .and_then(|t| t.get("json").map(|tag| tag.name().to_string()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tags() {
        let tags = Tags::parse(r#"xorm:"varchar(100) notnull pk" json:"name,omitempty""#).unwrap();
        assert_eq!(tags.keys(), vec!["xorm", "json"]);

        let json = tags.get("json").unwrap();
        assert_eq!(json.name(), "name");
        assert_eq!(json.options(), vec!["omitempty"]);
        assert_eq!(tags.get("xorm").unwrap().value, "varchar(100) notnull pk");
    }

    #[test]
    fn test_display_keeps_raw_values() {
        let input = r#"json:"a\"b" yaml:"c""#;
        let tags = Tags::parse(input).unwrap();
        assert_eq!(tags.get("json").unwrap().value, "a\"b");
        assert_eq!(tags.to_string(), input);
    }

    #[test]
    fn test_remove_keys_preserves_order() {
        let mut tags = Tags::parse(r#"a:"1" xorm:"x" b:"2" c:"3""#).unwrap();
        assert!(tags.remove_keys(&["xorm"]));
        assert_eq!(tags.to_string(), r#"a:"1" b:"2" c:"3""#);
        assert!(!tags.remove_keys(&["missing"]));

        assert!(tags.remove_keys(&["a", "b", "c"]));
        assert_eq!(tags.to_literal(), None);
    }

    #[test]
    fn test_escaped_multibyte_character() {
        let tags = Tags::parse(r#"json:"\é" xorm:"x""#).unwrap();
        assert_eq!(tags.get("json").unwrap().value, "é");
        assert_eq!(tags.get("xorm").unwrap().value, "x");
        assert_eq!(tags.to_string(), r#"json:"\é" xorm:"x""#);

        assert!(matches!(Tags::parse("json:\"ü\\"), Err(TagError::Unterminated(_))));
    }

    #[test]
    fn test_malformed_tags() {
        assert!(matches!(Tags::parse("json"), Err(TagError::MissingColon(_))));
        assert!(matches!(Tags::parse("json:name"), Err(TagError::MissingQuote(_))));
        assert!(matches!(Tags::parse(r#"json:"name"#), Err(TagError::Unterminated(_))));
        assert_eq!(Tags::from_literal("`json:name`"), None);
        assert_eq!(Tags::from_literal("``"), None);
    }

    #[test]
    fn test_literal_helpers() {
        let literal = r#"`xorm:"-" json:"owner,omitempty"`"#;
        assert!(has_tag(literal, "xorm"));
        assert!(!has_tag(literal, "yaml"));
        assert_eq!(json_field_name(literal), "owner");
        assert_eq!(json_field_name(r#"`xorm:"-"`"#), "");
        assert_eq!(json_field_name(""), "");
    }
}
