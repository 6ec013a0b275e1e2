//! Parser for Python literal ground truths
//!
//! Several datasets store ground truth as the `repr` of a Python dict rather
//! than JSON: single-quoted strings, `None`/`True`/`False`, tuples and
//! `datetime.date(...)` calls.

use chrono::NaiveDate;
use extract_judge::{Record, Value};

/// Literal parse failure with byte offset
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid literal at offset {position}: {message}")]
pub struct LiteralError {
    pub position: usize,
    pub message: String,
}

/// Parse a Python literal expression into a value
pub fn parse_literal(input: &str) -> Result<Value, LiteralError> {
    let mut parser = LiteralParser::new(input);
    let value = parser.parse_value()?;
    parser.skip_ws();
    if parser.pos < parser.src.len() {
        return Err(parser.error("trailing characters"));
    }
    Ok(value)
}

/// Parse a Python dict literal into a record
pub fn parse_literal_record(input: &str) -> Result<Record, LiteralError> {
    match parse_literal(input)? {
        Value::Object(record) => Ok(record),
        other => Err(LiteralError {
            position: 0,
            message: format!("expected a dict, found {}", other.type_name()),
        }),
    }
}

struct LiteralParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> LiteralParser<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> LiteralError {
        LiteralError {
            position: self.pos,
            message: message.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_ws(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn expect(&mut self, want: char) -> Result<(), LiteralError> {
        self.skip_ws();
        match self.bump() {
            Some(c) if c == want => Ok(()),
            Some(c) => Err(self.error(format!("expected '{}', found '{}'", want, c))),
            None => Err(self.error(format!("expected '{}', found end of input", want))),
        }
    }

    fn parse_value(&mut self) -> Result<Value, LiteralError> {
        self.skip_ws();
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some('{') => self.parse_dict(),
            Some('[') => self.parse_sequence('[', ']'),
            Some('(') => self.parse_sequence('(', ')'),
            Some('\'') | Some('"') => self.parse_string().map(Value::String),
            Some(c) if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_name(),
            Some(c) => Err(self.error(format!("unexpected character '{}'", c))),
        }
    }

    fn parse_dict(&mut self) -> Result<Value, LiteralError> {
        self.expect('{')?;
        let mut record = Record::new();
        loop {
            self.skip_ws();
            if self.peek() == Some('}') {
                self.bump();
                return Ok(Value::Object(record));
            }
            let key = match self.parse_value()? {
                Value::String(s) => s,
                Value::Null => "None".to_string(),
                other => other.to_flat_string(),
            };
            self.expect(':')?;
            let value = self.parse_value()?;
            record.insert(key, value);

            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some('}') => return Ok(Value::Object(record)),
                _ => return Err(self.error("expected ',' or '}' in dict")),
            }
        }
    }

    fn parse_sequence(&mut self, open: char, close: char) -> Result<Value, LiteralError> {
        self.expect(open)?;
        let mut items = Vec::new();
        loop {
            self.skip_ws();
            if self.peek() == Some(close) {
                self.bump();
                return Ok(Value::Array(items));
            }
            items.push(self.parse_value()?);

            self.skip_ws();
            match self.bump() {
                Some(',') => continue,
                Some(c) if c == close => return Ok(Value::Array(items)),
                _ => return Err(self.error(format!("expected ',' or '{}'", close))),
            }
        }
    }

    fn parse_string(&mut self) -> Result<String, LiteralError> {
        let mut out = String::new();
        // adjacent literals concatenate, as in Python source
        loop {
            let quote = match self.bump() {
                Some(q @ ('\'' | '"')) => q,
                _ => return Err(self.error("expected string")),
            };
            loop {
                match self.bump() {
                    None => return Err(self.error("unterminated string")),
                    Some(c) if c == quote => break,
                    Some('\\') => self.parse_escape(&mut out)?,
                    Some(c) => out.push(c),
                }
            }
            self.skip_ws();
            if !matches!(self.peek(), Some('\'' | '"')) {
                return Ok(out);
            }
        }
    }

    fn parse_escape(&mut self, out: &mut String) -> Result<(), LiteralError> {
        match self.bump() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('\n') => {}
            Some('x') => out.push(self.parse_hex(2)?),
            Some('u') => out.push(self.parse_hex(4)?),
            Some('U') => out.push(self.parse_hex(8)?),
            Some(c) => {
                out.push('\\');
                out.push(c);
            }
            None => return Err(self.error("unterminated escape")),
        }
        Ok(())
    }

    fn parse_hex(&mut self, digits: usize) -> Result<char, LiteralError> {
        let rest = self.rest();
        let hex = rest
            .get(..digits)
            .ok_or_else(|| self.error("truncated escape"))?;
        let code = u32::from_str_radix(hex, 16).map_err(|_| self.error("invalid hex escape"))?;
        self.pos += digits;
        char::from_u32(code).ok_or_else(|| self.error("escape is not a valid character"))
    }

    fn parse_number(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        if matches!(self.peek(), Some('-' | '+')) {
            self.bump();
        }
        let mut is_float = false;
        while let Some(c) = self.peek() {
            match c {
                '0'..='9' | '_' => {}
                '.' => is_float = true,
                'e' | 'E' => {
                    is_float = true;
                    self.bump();
                    if matches!(self.peek(), Some('-' | '+')) {
                        self.bump();
                    }
                    continue;
                }
                _ => break,
            }
            self.bump();
        }

        let text: String = self.src[start..self.pos].chars().filter(|c| *c != '_').collect();
        if is_float {
            text.parse::<f64>()
                .map(Value::Float)
                .map_err(|_| self.error(format!("invalid float '{}'", text)))
        } else {
            match text.parse::<i64>() {
                Ok(i) => Ok(Value::Int(i)),
                Err(_) => text
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| self.error(format!("invalid number '{}'", text))),
            }
        }
    }

    fn parse_identifier(&mut self) -> &'a str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' || c == '.' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        &self.src[start..self.pos]
    }

    fn parse_name(&mut self) -> Result<Value, LiteralError> {
        let start = self.pos;
        let name = self.parse_identifier();
        match name {
            "None" => return Ok(Value::Null),
            "True" => return Ok(Value::Bool(true)),
            "False" => return Ok(Value::Bool(false)),
            "nan" | "inf" => {
                return Ok(Value::Float(if name == "nan" { f64::NAN } else { f64::INFINITY }))
            }
            _ => {}
        }

        // string prefixes such as u'...' or r"..."
        if matches!(name, "u" | "r" | "U" | "R") && matches!(self.peek(), Some('\'' | '"')) {
            return self.parse_string().map(Value::String);
        }

        self.skip_ws();
        if self.peek() != Some('(') {
            self.pos = start;
            return Err(self.error(format!("unknown name '{}'", name)));
        }
        let args = match self.parse_sequence('(', ')')? {
            Value::Array(args) => args,
            _ => Vec::new(),
        };

        match name.rsplit('.').next().unwrap_or(name) {
            "date" | "datetime" => {
                let part = |i: usize| args.get(i).and_then(Value::as_int);
                match (part(0), part(1), part(2)) {
                    (Some(y), Some(m), Some(d)) => {
                        NaiveDate::from_ymd_opt(y as i32, m as u32, d as u32)
                            .map(Value::Date)
                            .ok_or_else(|| self.error(format!("invalid date {}-{}-{}", y, m, d)))
                    }
                    _ => Err(self.error("date() needs year, month and day")),
                }
            }
            "Decimal" | "float" => match args.first() {
                Some(Value::String(s)) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| self.error(format!("invalid decimal '{}'", s))),
                Some(v) if v.as_f64().is_some() => Ok(Value::Float(v.as_f64().unwrap_or_default())),
                _ => Err(self.error("Decimal() needs one argument")),
            },
            other => Err(self.error(format!("unsupported call '{}'", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_dict_with_python_tokens() {
        let record = parse_literal_record(
            "{'Company': ['Apple Inc.', \"Uber\"], 'Date': None, 'ok': True, 'n': -3, 'x': 1.5e2}",
        )
        .unwrap();

        assert_eq!(
            record["Company"],
            Value::Array(vec![Value::from("Apple Inc."), Value::from("Uber")])
        );
        assert!(record["Date"].is_null());
        assert_eq!(record["ok"], Value::Bool(true));
        assert_eq!(record["n"], Value::Int(-3));
        assert_eq!(record["x"], Value::Float(150.0));
    }

    #[test]
    fn test_nested_claim_with_dates() {
        let record = parse_literal_record(
            "{'header': {'claim_id': 'CLM-000123', 'report_date': datetime.date(2024, 5, 2)}, \
              'insured_objects': [{'object_id': 'OBJ-1', 'year': 2019}], 'policy_details': None}",
        )
        .unwrap();

        let header = record["header"].as_object().unwrap();
        assert_eq!(
            header["report_date"],
            Value::Date(NaiveDate::from_ymd_opt(2024, 5, 2).unwrap())
        );
        assert_eq!(record["insured_objects"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_string_escapes_and_concatenation() {
        let value = parse_literal(r#"'it\'s' " ok\n" 'é'"#).unwrap();
        assert_eq!(value, Value::from("it's ok\né"));
    }

    #[test]
    fn test_tuples_and_trailing_commas() {
        let value = parse_literal("(1, 2,)").unwrap();
        assert_eq!(value, Value::Array(vec![Value::Int(1), Value::Int(2)]));
        assert!(parse_literal_record("{'a': [1,],}").is_ok());
    }

    #[test]
    fn test_errors_carry_position() {
        let err = parse_literal("{'a': nope}").unwrap_err();
        assert_eq!(err.position, 6);
        assert!(parse_literal("{'a': 1} extra").is_err());
        assert!(parse_literal_record("[1]").is_err());
    }

    #[test]
    fn test_decimal_call() {
        assert_eq!(parse_literal("Decimal('12.50')").unwrap(), Value::Float(12.5));
    }
}
