//! Reader for generated script data files
//!
//! Documentation generators ship their search shards and navigation tree as
//! script files made of plain assignments:
//!
//! ```text
//! var searchData=
//! [
//!   ['bdcr_7',['BDCR',['../struct_r_c_c___reg_def__t.html#a59a5',1,'RCC_RegDef_t']]]
//! ];
//! ```
//!
//! Only the literal subset those files use is accepted: arrays, object
//! literals with quoted or bare keys, single or double quoted strings,
//! integers, `null`, `true` and `false`, plus comments. Values are returned as
//! [`serde_json::Value`] so the decoders downstream work on one tree type.

use crate::error::{Error, Result};
use serde_json::{Map, Number, Value};

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Read every `var name = literal;` assignment in order
pub fn read_assignments(src: &str) -> Result<Vec<(String, Value)>> {
    let mut reader = Reader::new(src);
    let mut out = Vec::new();
    loop {
        reader.skip_trivia();
        if reader.at_end() {
            return Ok(out);
        }
        reader.expect_word("var")?;
        reader.skip_trivia();
        let name = reader.identifier()?;
        reader.skip_trivia();
        reader.expect_char('=')?;
        let value = reader.value()?;
        reader.skip_trivia();
        reader.eat(';');
        out.push((name, value));
    }
}

/// Read the literal assigned to `name`
pub fn read_var(src: &str, name: &str) -> Result<Value> {
    read_assignments(src)?
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v)
        .ok_or_else(|| Error::Serialization(format!("no assignment to '{}'", name)))
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

struct Reader<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(src: &'a str) -> Self {
        Reader { src, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn error(&self, what: &str) -> Error {
        Error::Serialization(format!("{} at byte {}", what, self.pos))
    }

    fn skip_trivia(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();
            if trimmed.starts_with("//") {
                let end = trimmed.find('\n').unwrap_or(trimmed.len());
                self.pos += end;
            } else if trimmed.starts_with("/*") {
                match trimmed[2..].find("*/") {
                    Some(end) => self.pos += end + 4,
                    None => self.pos = self.src.len(),
                }
            } else {
                return;
            }
        }
    }

    fn expect_char(&mut self, c: char) -> Result<()> {
        self.skip_trivia();
        if self.eat(c) {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", c)))
        }
    }

    fn expect_word(&mut self, word: &str) -> Result<()> {
        let found = self.identifier()?;
        if found == word {
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}', found '{}'", word, found)))
        }
    }

    fn identifier(&mut self) -> Result<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                self.bump();
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(self.src[start..self.pos].to_string())
    }

    fn value(&mut self) -> Result<Value> {
        self.skip_trivia();
        match self.peek() {
            Some('[') => self.array(),
            Some('{') => self.object(),
            Some(q @ ('\'' | '"')) => {
                self.bump();
                self.string_body(q).map(Value::String)
            }
            Some(c) if c == '-' || c.is_ascii_digit() => self.number(),
            Some(_) => match self.identifier()?.as_str() {
                "null" => Ok(Value::Null),
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                other => Err(self.error(&format!("unexpected word '{}'", other))),
            },
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn array(&mut self) -> Result<Value> {
        self.expect_char('[')?;
        let mut items = Vec::new();
        loop {
            self.skip_trivia();
            if self.eat(']') {
                return Ok(Value::Array(items));
            }
            items.push(self.value()?);
            self.skip_trivia();
            if self.eat(',') {
                continue;
            }
            self.expect_char(']')?;
            return Ok(Value::Array(items));
        }
    }

    fn object(&mut self) -> Result<Value> {
        self.expect_char('{')?;
        let mut map = Map::new();
        loop {
            self.skip_trivia();
            if self.eat('}') {
                return Ok(Value::Object(map));
            }
            let key = match self.peek() {
                Some(q @ ('\'' | '"')) => {
                    self.bump();
                    self.string_body(q)?
                }
                _ => self.identifier()?,
            };
            self.expect_char(':')?;
            let value = self.value()?;
            map.insert(key, value);
            self.skip_trivia();
            if self.eat(',') {
                continue;
            }
            self.expect_char('}')?;
            return Ok(Value::Object(map));
        }
    }

    fn string_body(&mut self, quote: char) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\\') => match self.bump() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('u') => out.push(self.unicode_escape()?),
                    Some(c) => out.push(c),
                    None => return Err(self.error("unterminated escape")),
                },
                Some(c) => out.push(c),
            }
        }
    }

    fn unicode_escape(&mut self) -> Result<char> {
        let end = self.pos + 4;
        let hex = self
            .src
            .get(self.pos..end)
            .ok_or_else(|| self.error("truncated \\u escape"))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| self.error("bad \\u escape"))?;
        self.pos = end;
        char::from_u32(code).ok_or_else(|| self.error("invalid code point"))
    }

    fn number(&mut self) -> Result<Value> {
        let start = self.pos;
        self.eat('-');
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.bump();
        }
        let text = &self.src[start..self.pos];
        text.parse::<i64>()
            .map(|n| Value::Number(Number::from(n)))
            .map_err(|_| self.error(&format!("bad number '{}'", text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_search_data() {
        let src = r#"var searchData=
[
  ['bdcr_7',['BDCR',['../struct_r_c_c.html#a59',1,'RCC_RegDef_t']]],
  ['bsrr_13',['BSRR',['../struct_g.html#af8',1,'GPIOx_RegDef_t']]]
];
"#;
        let v = read_var(src, "searchData").unwrap();
        assert_eq!(
            v,
            json!([
                ["bdcr_7", ["BDCR", ["../struct_r_c_c.html#a59", 1, "RCC_RegDef_t"]]],
                ["bsrr_13", ["BSRR", ["../struct_g.html#af8", 1, "GPIOx_RegDef_t"]]]
            ])
        );
    }

    #[test]
    fn test_read_multiple_assignments_with_comments() {
        let src = r#"/*
 @licstart license text @licend
*/
var NAVTREE =
[
  [ "Root", "index.html", [
    [ "Child", "index.html#a", null ],
    [ "Topics", "topics.html", "topics" ]
  ] ]
];

var NAVTREEINDEX = [ "a.html" ];
// trailing comment
var SYNCONMSG = 'click to disable panel synchronization';
"#;
        let all = read_assignments(src).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].0, "NAVTREE");
        assert_eq!(all[2].1, json!("click to disable panel synchronization"));
        assert_eq!(all[0].1[0][2][1][2], json!("topics"));
        assert_eq!(all[0].1[0][2][0][2], Value::Null);
    }

    #[test]
    fn test_escapes() {
        let v = read_var(r#"var x = ['it\'s', "a\"b", 'é'];"#, "x").unwrap();
        assert_eq!(v, json!(["it's", "a\"b", "é"]));
    }

    #[test]
    fn test_object_literal() {
        let v = read_var("var o = { a: 1, 'b': [true, false], \"c\": -2 };", "o").unwrap();
        assert_eq!(v, json!({"a": 1, "b": [true, false], "c": -2}));
    }

    #[test]
    fn test_unterminated_string_is_error() {
        assert!(read_var("var x = ['abc];", "x").is_err());
    }

    #[test]
    fn test_missing_var_is_error() {
        let err = read_var("var a = 1;", "b").unwrap_err();
        assert!(err.to_string().contains("no assignment"));
    }

    #[test]
    fn test_trailing_comma() {
        let v = read_var("var x = [1, 2, ];", "x").unwrap();
        assert_eq!(v, json!([1, 2]));
    }
}
