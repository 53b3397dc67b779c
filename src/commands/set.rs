use crate::commands::executable::Executable;
use crate::commands::{next_key, CommandError};
use crate::lexer::{Lexer, Token};
use crate::reply::Reply;
use crate::store::Store;

/// Longest accepted key, in bytes. Longer keys are rejected before the value
/// argument is even read.
pub const MAX_KEY_LENGTH: usize = 256;

/// Insert or replace `key` with `value`. The value may be a bare identifier,
/// a quoted string, an integer or a float. Numeric tokens are stored through
/// their normalized text form, so `SET k 0x10` stores `16` rather than the
/// digits as typed.
#[derive(Debug, PartialEq)]
pub struct Set {
    pub key: String,
    pub value: String,
}

impl Executable for Set {
    fn exec(self, store: &Store) -> Reply {
        store.insert(self.key, self.value);
        Reply::Ok
    }
}

impl TryFrom<&mut Lexer<'_>> for Set {
    type Error = CommandError;

    fn try_from(lexer: &mut Lexer) -> Result<Self, Self::Error> {
        let key = next_key(lexer)?;

        if key.len() > MAX_KEY_LENGTH {
            return Err(CommandError::KeyTooLong);
        }

        let value = match lexer.next_token() {
            Token::Identifier(text) | Token::Str(text) => text,
            Token::Int(i) => i.to_string(),
            Token::Float(f) => format_float(f),
            Token::Eof => return Err(CommandError::MissingValueArgument),
            token => {
                return Err(CommandError::MalformedValueArgument { code: token.code() });
            }
        };

        Ok(Self { key, value })
    }
}

/// `%g`-style formatting with six significant digits: fixed notation in the
/// mundane range, otherwise exponent form with a signed two-digit exponent,
/// trailing zeros trimmed either way.
fn format_float(value: f64) -> String {
    const SIG_DIGITS: usize = 6;

    if !value.is_finite() {
        return value.to_string();
    }

    // The scientific rendering carries the post-rounding decimal exponent.
    let sci = format!("{:.*e}", SIG_DIGITS - 1, value);
    let (mantissa, exponent) = sci.split_once('e').expect("exponent marker");
    let exponent: i32 = exponent.parse().expect("numeric exponent");

    if exponent < -4 || exponent >= SIG_DIGITS as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_fraction(mantissa), sign, exponent.abs())
    } else {
        let precision = (SIG_DIGITS as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", precision, value))
    }
}

fn trim_fraction(text: &str) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text.to_string()
    }
}
