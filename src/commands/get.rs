use crate::commands::executable::Executable;
use crate::commands::{next_key, CommandError};
use crate::lexer::Lexer;
use crate::reply::Reply;
use crate::store::Store;

/// Get the value of `key`. Replies with the raw value line, or `NULL` if the
/// key does not exist.
#[derive(Debug, PartialEq)]
pub struct Get {
    pub key: String,
}

impl Executable for Get {
    fn exec(self, store: &Store) -> Reply {
        match store.lookup(&self.key) {
            Some(value) => Reply::Value(value),
            None => Reply::Null,
        }
    }
}

impl TryFrom<&mut Lexer<'_>> for Get {
    type Error = CommandError;

    fn try_from(lexer: &mut Lexer) -> Result<Self, Self::Error> {
        let key = next_key(lexer)?;
        Ok(Self { key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Command;

    #[test]
    fn existing_key() {
        let cmd = Command::parse("GET key1").unwrap();
        assert_eq!(
            cmd,
            Command::Get(Get {
                key: "key1".to_string()
            })
        );

        let store = Store::new();
        store.insert("key1".to_string(), "1".to_string());

        assert_eq!(cmd.exec(&store), Reply::Value("1".to_string()));
    }

    #[test]
    fn missing_key_in_store() {
        let cmd = Command::parse("GET key1").unwrap();
        let store = Store::new();

        assert_eq!(cmd.exec(&store), Reply::Null);
    }

    #[test]
    fn missing_key_argument() {
        let err = Command::parse("GET").unwrap_err();
        assert_eq!(err, CommandError::MissingKey { code: 0 });
        assert_eq!(err.to_string(), "Missing KEY (token=0)");
    }

    #[test]
    fn non_key_argument() {
        let err = Command::parse("GET 42").unwrap_err();
        assert_eq!(err, CommandError::MissingKey { code: 261 });
    }
}
