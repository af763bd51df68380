//! Minimal codec for the PHP-serialized values the platform stores in its option tables.
//!
//! Only what the extractor reads and writes is supported: scalars, strings and nested arrays.
//! Objects and references are rejected.

use crate::errors::ExtractError;

/// A decoded PHP value.
#[derive(Debug, Clone, PartialEq)]
pub enum PhpValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<(PhpValue, PhpValue)>),
}

impl PhpValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PhpValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Decode a serialized value.
pub fn unserialize(input: &str) -> Result<PhpValue, ExtractError> {
    let mut parser = Parser {
        input: input.as_bytes(),
        pos: 0,
    };
    let value = parser.value()?;
    if parser.pos != parser.input.len() {
        return Err(parser.error("trailing data"));
    }
    Ok(value)
}

/// String values of a serialized array, e.g. `active_plugins` or `site_admins`.
pub fn string_values(input: &str) -> Result<Vec<String>, ExtractError> {
    match unserialize(input)? {
        PhpValue::Array(entries) => Ok(entries
            .into_iter()
            .filter_map(|(_, v)| v.as_str().map(str::to_string))
            .collect()),
        PhpValue::Bool(false) | PhpValue::Null => Ok(Vec::new()),
        other => Err(ExtractError::Platform(format!(
            "Expected a serialized array, found {:?}",
            other
        ))),
    }
}

/// String keys of a serialized array, e.g. `active_sitewide_plugins`.
pub fn string_keys(input: &str) -> Result<Vec<String>, ExtractError> {
    match unserialize(input)? {
        PhpValue::Array(entries) => Ok(entries
            .into_iter()
            .filter_map(|(k, _)| k.as_str().map(str::to_string))
            .collect()),
        PhpValue::Bool(false) | PhpValue::Null => Ok(Vec::new()),
        other => Err(ExtractError::Platform(format!(
            "Expected a serialized array, found {:?}",
            other
        ))),
    }
}

/// Serialized role map granting each role, e.g. `a:1:{s:13:"administrator";b:1;}`.
pub fn serialize_roles(roles: &[&str]) -> String {
    let body: String = roles
        .iter()
        .map(|role| format!("s:{}:\"{}\";b:1;", role.len(), role))
        .collect();
    format!("a:{}:{{{}}}", roles.len(), body)
}

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn error(&self, what: &str) -> ExtractError {
        ExtractError::Platform(format!(
            "Malformed serialized value at byte {}: {}",
            self.pos, what
        ))
    }

    fn expect(&mut self, byte: u8) -> Result<(), ExtractError> {
        if self.input.get(self.pos) == Some(&byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", byte as char)))
        }
    }

    /// Raw text up to (not including) `end`, consuming the terminator.
    fn until(&mut self, end: u8) -> Result<&'a str, ExtractError> {
        let input: &'a [u8] = self.input;
        let rest = &input[self.pos..];
        let len = rest
            .iter()
            .position(|b| *b == end)
            .ok_or_else(|| self.error(&format!("missing '{}'", end as char)))?;
        let text = std::str::from_utf8(&rest[..len]).map_err(|_| self.error("invalid utf-8"))?;
        self.pos += len + 1;
        Ok(text)
    }

    fn number<T: std::str::FromStr>(&mut self, end: u8) -> Result<T, ExtractError> {
        let raw = self.until(end)?;
        raw.parse().map_err(|_| self.error("invalid number"))
    }

    fn value(&mut self) -> Result<PhpValue, ExtractError> {
        let tag = *self
            .input
            .get(self.pos)
            .ok_or_else(|| self.error("unexpected end"))?;
        self.pos += 1;

        if tag == b'N' {
            self.expect(b';')?;
            return Ok(PhpValue::Null);
        }
        self.expect(b':')?;

        match tag {
            b'b' => match self.until(b';')? {
                "0" => Ok(PhpValue::Bool(false)),
                "1" => Ok(PhpValue::Bool(true)),
                _ => Err(self.error("invalid boolean")),
            },
            b'i' => Ok(PhpValue::Int(self.number(b';')?)),
            b'd' => Ok(PhpValue::Float(self.number(b';')?)),
            b's' => {
                let len: usize = self.number(b':')?;
                self.expect(b'"')?;
                let end = self.pos + len;
                let bytes = self
                    .input
                    .get(self.pos..end)
                    .ok_or_else(|| self.error("string overruns input"))?;
                let text = std::str::from_utf8(bytes)
                    .map_err(|_| self.error("invalid utf-8"))?
                    .to_string();
                self.pos = end;
                self.expect(b'"')?;
                self.expect(b';')?;
                Ok(PhpValue::Str(text))
            }
            b'a' => {
                let count: usize = self.number(b':')?;
                self.expect(b'{')?;
                let mut entries = Vec::with_capacity(count.min(1024));
                for _ in 0..count {
                    let key = self.value()?;
                    let value = self.value()?;
                    entries.push((key, value));
                }
                self.expect(b'}')?;
                Ok(PhpValue::Array(entries))
            }
            _ => Err(self.error("unsupported type")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_plugins_list() {
        let raw = r#"a:2:{i:0;s:19:"akismet/akismet.php";i:1;s:9:"hello.php";}"#;
        assert_eq!(
            string_values(raw).unwrap(),
            vec!["akismet/akismet.php".to_string(), "hello.php".to_string()]
        );
    }

    #[test]
    fn test_network_plugins_keys() {
        let raw = r#"a:1:{s:19:"jetpack/jetpack.php";i:1700000000;}"#;
        assert_eq!(
            string_keys(raw).unwrap(),
            vec!["jetpack/jetpack.php".to_string()]
        );
    }

    #[test]
    fn test_multibyte_string_length_is_in_bytes() {
        let raw = "a:1:{i:0;s:6:\"caf\u{e9}s\";}";
        assert_eq!(string_values(raw).unwrap(), vec!["caf\u{e9}s".to_string()]);
    }

    #[test]
    fn test_false_means_empty() {
        assert!(string_values("b:0;").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_input() {
        assert!(unserialize("a:2:{i:0;s:3:\"abc\";}").is_err());
        assert!(unserialize("s:10:\"short\";").is_err());
        assert!(unserialize("O:8:\"stdClass\":0:{}").is_err());
        assert!(unserialize("i:1;junk").is_err());
    }

    #[test]
    fn test_serialize_roles() {
        let value = serialize_roles(&["administrator"]);
        assert_eq!(value, r#"a:1:{s:13:"administrator";b:1;}"#);
        match unserialize(&value).unwrap() {
            PhpValue::Array(entries) => {
                assert_eq!(entries[0].0, PhpValue::Str("administrator".to_string()));
                assert_eq!(entries[0].1, PhpValue::Bool(true));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
