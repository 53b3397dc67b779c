use std::iter::Peekable;
use std::str::Chars;

/// One token from a command line.
///
/// The numeric codes reported by [`Token::code`] are part of the wire
/// protocol: argument errors embed them in their `ERR` replies (for example
/// `ERR Missing KEY (token=0)` when the line ended early).
#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    /// `[A-Za-z_][A-Za-z0-9_]*`
    Identifier(String),
    /// Single- or double-quoted string. Double quotes honor backslash
    /// escapes, single quotes are verbatim.
    Str(String),
    /// Decimal, `0x` hex, `0b` binary or leading-zero octal, all normalized
    /// to `i64`.
    Int(i64),
    Float(f64),
    /// Any other single character.
    Char(char),
    /// Unterminated string or malformed number.
    Error,
    Eof,
}

impl Token {
    pub fn code(&self) -> u32 {
        match self {
            Token::Eof => 0,
            Token::Error => 257,
            Token::Char(_) => 258,
            Token::Int(_) => 261,
            Token::Float(_) => 263,
            Token::Str(_) => 264,
            Token::Identifier(_) => 266,
        }
    }
}

/// Tokenizer for one command line. A fresh instance is built per line, so
/// connections never share cursor state.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Lexer<'a> {
        Lexer {
            chars: input.chars().peekable(),
        }
    }

    pub fn next_token(&mut self) -> Token {
        while matches!(self.chars.peek(), Some(&(' ' | '\t' | '\r' | '\n'))) {
            self.chars.next();
        }

        let c = match self.chars.next() {
            Some(c) => c,
            None => return Token::Eof,
        };

        match c {
            '"' | '\'' => self.string(c),
            'a'..='z' | 'A'..='Z' | '_' => self.identifier(c),
            '0'..='9' => self.number(c),
            other => Token::Char(other),
        }
    }

    fn identifier(&mut self, first: char) -> Token {
        let mut name = String::new();
        name.push(first);

        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                name.push(c);
                self.chars.next();
            } else {
                break;
            }
        }

        Token::Identifier(name)
    }

    fn string(&mut self, quote: char) -> Token {
        let mut value = String::new();

        loop {
            match self.chars.next() {
                None => return Token::Error, // unterminated
                Some(c) if c == quote => return Token::Str(value),
                // Escapes only apply inside double quotes.
                Some('\\') if quote == '"' => match self.chars.next() {
                    None => return Token::Error,
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('b') => value.push('\u{8}'),
                    Some('f') => value.push('\u{c}'),
                    Some(escaped) => value.push(escaped),
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn number(&mut self, first: char) -> Token {
        if first == '0' {
            match self.chars.peek() {
                Some(&('x' | 'X')) => {
                    self.chars.next();
                    return self.radix_digits(16);
                }
                Some(&('b' | 'B')) => {
                    self.chars.next();
                    return self.radix_digits(2);
                }
                Some(&('0'..='9')) => return self.radix_digits(8),
                _ => {}
            }
        }

        let mut text = String::new();
        text.push(first);
        let mut is_float = false;

        while let Some(&c) = self.chars.peek() {
            match c {
                '0'..='9' => {
                    text.push(c);
                    self.chars.next();
                }
                '.' if !is_float => {
                    is_float = true;
                    text.push(c);
                    self.chars.next();
                }
                'e' | 'E' => {
                    is_float = true;
                    text.push(c);
                    self.chars.next();
                    if let Some(&sign) = self.chars.peek() {
                        if sign == '+' || sign == '-' {
                            text.push(sign);
                            self.chars.next();
                        }
                    }
                    if !matches!(self.chars.peek(), Some(&('0'..='9'))) {
                        return Token::Error;
                    }
                }
                _ => break,
            }
        }

        if is_float {
            match text.parse::<f64>() {
                Ok(f) => Token::Float(f),
                Err(_) => Token::Error,
            }
        } else {
            match text.parse::<i64>() {
                Ok(i) => Token::Int(i),
                Err(_) => Token::Error,
            }
        }
    }

    fn radix_digits(&mut self, radix: u32) -> Token {
        let mut text = String::new();

        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_alphanumeric() {
                text.push(c);
                self.chars.next();
            } else {
                break;
            }
        }

        if text.is_empty() {
            return Token::Error;
        }

        match i64::from_str_radix(&text, radix) {
            Ok(i) => Token::Int(i),
            Err(_) => Token::Error,
        }
    }
}
