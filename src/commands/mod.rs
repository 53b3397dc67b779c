pub mod del;
pub mod executable;
pub mod get;
pub mod set;

use thiserror::Error as ThisError;

use crate::commands::executable::Executable;
use crate::lexer::{Lexer, Token};
use crate::reply::Reply;
use crate::store::Store;

use del::Del;
use get::Get;
use set::Set;

#[derive(Debug, PartialEq)]
pub enum Command {
    Get(Get),
    Set(Set),
    Del(Del),
}

impl Command {
    /// Parses one client line: `<command-identifier> <argument>*`, with a
    /// case-insensitive command name. Each line gets its own lexer, so
    /// connections never interleave tokens.
    pub fn parse(line: &str) -> Result<Command, CommandError> {
        let lexer = &mut Lexer::new(line);

        let name = match lexer.next_token() {
            Token::Identifier(name) => name,
            token => {
                return Err(CommandError::ExpectedCommandIdentifier { code: token.code() });
            }
        };

        match name.to_uppercase().as_str() {
            "GET" => Get::try_from(lexer).map(Command::Get),
            "SET" => Set::try_from(lexer).map(Command::Set),
            "DEL" => Del::try_from(lexer).map(Command::Del),
            _ => Err(CommandError::UnknownCommand { command: name }),
        }
    }
}

impl Executable for Command {
    fn exec(self, store: &Store) -> Reply {
        match self {
            Command::Get(cmd) => cmd.exec(store),
            Command::Set(cmd) => cmd.exec(store),
            Command::Del(cmd) => cmd.exec(store),
        }
    }
}

/// Every command starts with a key, given as a bare identifier or a quoted
/// string.
fn next_key(lexer: &mut Lexer) -> Result<String, CommandError> {
    match lexer.next_token() {
        Token::Identifier(key) | Token::Str(key) => Ok(key),
        token => Err(CommandError::MissingKey { code: token.code() }),
    }
}

/// Argument errors. The `Display` strings are wire-visible: the connection
/// loop renders them as `ERR <message>\r\n`, token codes included.
#[derive(Debug, ThisError, PartialEq)]
pub enum CommandError {
    #[error("Expected Command Identifier (got token={code})")]
    ExpectedCommandIdentifier { code: u32 },
    #[error("Unknown command: {command}")]
    UnknownCommand { command: String },
    #[error("Missing KEY (token={code})")]
    MissingKey { code: u32 },
    #[error("Missing Value Argument")]
    MissingValueArgument,
    #[error("Malformed Value Argument (token={code})")]
    MalformedValueArgument { code: u32 },
    // "To" kept verbatim for wire compatibility with existing clients.
    #[error("Key To Long")]
    KeyTooLong,
}

impl From<CommandError> for Reply {
    fn from(err: CommandError) -> Reply {
        Reply::Err(err.to_string())
    }
}
