use std::path::{Path, PathBuf};

use thiserror::Error as ThisError;

use crate::store::Store;

/// Name of the single section every snapshot file carries.
pub const SECTION: &str = "udb";

/// A snapshot is a keyfile-style text document:
///
/// ```text
/// [udb]
/// key1=hello
/// key2=line one\nline two
/// ```
///
/// Values escape backslashes, line breaks, tabs and leading/trailing spaces;
/// keys additionally escape `=`, `[`, `]` and every space, so any stored pair
/// survives a round trip through the file format. Blank lines and `#`
/// comments are tolerated when reading.
#[derive(Debug, ThisError)]
pub enum SnapshotError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl SnapshotError {
    /// A missing snapshot file is expected on first run and is the only I/O
    /// failure callers may ignore.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SnapshotError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

pub fn encode(pairs: &[(String, String)]) -> String {
    let mut pairs: Vec<_> = pairs.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));

    let mut out = format!("[{}]\n", SECTION);
    for (key, value) in pairs {
        out.push_str(&escape_key(key));
        out.push('=');
        out.push_str(&escape_value(value));
        out.push('\n');
    }
    out
}

pub fn decode(text: &str) -> Result<Vec<(String, String)>, SnapshotError> {
    let mut pairs = vec![];
    let mut in_section = false;

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        if raw.trim().is_empty() || raw.starts_with('#') {
            continue;
        }

        if let Some(name) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
            if name != SECTION {
                return Err(SnapshotError::Parse {
                    line,
                    message: format!("unknown section [{}]", name),
                });
            }
            in_section = true;
            continue;
        }

        if !in_section {
            return Err(SnapshotError::Parse {
                line,
                message: format!("entry before [{}] section header", SECTION),
            });
        }

        let (raw_key, raw_value) = split_entry(raw).ok_or_else(|| SnapshotError::Parse {
            line,
            message: "missing '=' separator".to_string(),
        })?;

        let key = unescape(raw_key, line)?;
        let value = unescape(raw_value, line)?;
        pairs.push((key, value));
    }

    Ok(pairs)
}

/// Encodes the store's current contents and atomically replaces the file at
/// `path` (write to a sibling temp file, then rename).
pub async fn write_to_path(store: &Store, path: &Path) -> Result<(), SnapshotError> {
    let data = encode(&store.snapshot_view());

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, data).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

pub async fn read_from_path(path: &Path) -> Result<Vec<(String, String)>, SnapshotError> {
    let text = tokio::fs::read_to_string(path).await?;
    decode(&text)
}

/// Splits a `key=value` line on the first `=` that is not part of an escape
/// sequence.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '=' => return Some((&line[..i], &line[i + 1..])),
            _ => {}
        }
    }
    None
}

fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let last = value.len().saturating_sub(1);

    for (i, c) in value.char_indices() {
        match c {
            '\\' => out.push_str(r"\\"),
            '\n' => out.push_str(r"\n"),
            '\r' => out.push_str(r"\r"),
            '\t' => out.push_str(r"\t"),
            ' ' if i == 0 || i == last => out.push_str(r"\s"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for c in key.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '\n' => out.push_str(r"\n"),
            '\r' => out.push_str(r"\r"),
            '\t' => out.push_str(r"\t"),
            ' ' => out.push_str(r"\s"),
            '=' => out.push_str(r"\="),
            '[' => out.push_str(r"\["),
            ']' => out.push_str(r"\]"),
            _ => out.push(c),
        }
    }
    out
}

fn unescape(text: &str, line: usize) -> Result<String, SnapshotError> {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('s') => out.push(' '),
            Some('=') => out.push('='),
            Some('[') => out.push('['),
            Some(']') => out.push(']'),
            other => {
                return Err(SnapshotError::Parse {
                    line,
                    message: match other {
                        Some(c) => format!("invalid escape sequence '\\{}'", c),
                        None => "trailing backslash".to_string(),
                    },
                })
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(pairs: Vec<(&str, &str)>) {
        let owned: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let mut decoded = decode(&encode(&owned)).unwrap();
        decoded.sort();
        let mut expected = owned;
        expected.sort();

        assert_eq!(decoded, expected);
    }

    #[test]
    fn plain_pairs_roundtrip() {
        roundtrip(vec![("name", "Alice"), ("city", "Berlin")]);
    }

    #[test]
    fn awkward_values_roundtrip() {
        roundtrip(vec![
            ("multiline", "line one\nline two\r\n"),
            ("quoted", "she said \"hi\""),
            ("tabs", "\ta\tb\t"),
            ("spaces", "  padded  "),
            ("backslash", r"C:\temp\new"),
            ("empty", ""),
        ]);
    }

    #[test]
    fn awkward_keys_roundtrip() {
        roundtrip(vec![
            ("has=equals", "v"),
            ("[bracketed]", "v"),
            (" spaced key ", "v"),
            ("line\nbreak", "v"),
        ]);
    }

    #[test]
    fn decode_example_file() {
        let text = "# saved state\n\n[udb]\nkey1=hello\nkey2=a\\nb\n";
        let pairs = decode(text).unwrap();

        assert_eq!(
            pairs,
            vec![
                ("key1".to_string(), "hello".to_string()),
                ("key2".to_string(), "a\nb".to_string()),
            ]
        );
    }

    #[test]
    fn decode_rejects_missing_section() {
        let err = decode("key1=hello\n").unwrap_err();
        assert!(matches!(err, SnapshotError::Parse { line: 1, .. }));
    }

    #[test]
    fn decode_rejects_unknown_section() {
        let err = decode("[other]\nkey1=hello\n").unwrap_err();
        assert!(matches!(err, SnapshotError::Parse { line: 1, .. }));
    }

    #[test]
    fn decode_rejects_entry_without_separator() {
        let err = decode("[udb]\njust a line\n").unwrap_err();
        assert!(matches!(err, SnapshotError::Parse { line: 2, .. }));
    }

    #[test]
    fn decode_rejects_bad_escape() {
        let err = decode("[udb]\nkey=\\q\n").unwrap_err();
        assert!(matches!(err, SnapshotError::Parse { line: 2, .. }));
    }

    #[tokio::test]
    async fn missing_file_is_distinguishable() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_from_path(&dir.path().join("absent.db"))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn write_then_read_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");

        let store = Store::new();
        store.insert("name".to_string(), "Alice".to_string());
        store.insert("note".to_string(), "line one\nline two".to_string());

        write_to_path(&store, &path).await.unwrap();
        let mut pairs = read_from_path(&path).await.unwrap();
        pairs.sort();

        assert_eq!(
            pairs,
            vec![
                ("name".to_string(), "Alice".to_string()),
                ("note".to_string(), "line one\nline two".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn write_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.db");

        let store = Store::new();
        store.insert("a".to_string(), "1".to_string());
        write_to_path(&store, &path).await.unwrap();

        store.remove("a");
        store.insert("b".to_string(), "2".to_string());
        write_to_path(&store, &path).await.unwrap();

        let pairs = read_from_path(&path).await.unwrap();
        assert_eq!(pairs, vec![("b".to_string(), "2".to_string())]);
    }
}
