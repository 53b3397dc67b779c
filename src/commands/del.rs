use crate::commands::executable::Executable;
use crate::commands::{next_key, CommandError};
use crate::lexer::Lexer;
use crate::reply::Reply;
use crate::store::Store;

/// Remove `key` if present. Replies `OK` whether or not the key existed, so
/// deleting an absent key is idempotent.
#[derive(Debug, PartialEq)]
pub struct Del {
    pub key: String,
}

impl Executable for Del {
    fn exec(self, store: &Store) -> Reply {
        store.remove(&self.key);
        Reply::Ok
    }
}

impl TryFrom<&mut Lexer<'_>> for Del {
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
    fn removes_existing_key() {
        let store = Store::new();
        store.insert("key1".to_string(), "1".to_string());

        let cmd = Command::parse("DEL key1").unwrap();
        assert_eq!(cmd.exec(&store), Reply::Ok);
        assert_eq!(store.lookup("key1"), None);
    }

    #[test]
    fn absent_key_still_replies_ok() {
        let store = Store::new();

        let cmd = Command::parse("DEL key1").unwrap();
        assert_eq!(cmd.exec(&store), Reply::Ok);
    }

    #[test]
    fn missing_key_argument() {
        let err = Command::parse("DEL").unwrap_err();
        assert_eq!(err, CommandError::MissingKey { code: 0 });
    }
}
