//! Minimal ssh client configuration reader.
//!
//! Understands the subset of ssh_config(5) needed to reach a host:
//! `Host` blocks with `*`/`?` globs and `!` negation, and the `HostName`,
//! `Port`, `User` and `IdentityFile` keywords. As in ssh, the first value
//! obtained for a keyword wins. `Match` blocks are skipped.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct HostBlock {
    patterns: Vec<String>,
    options: Vec<(String, String)>,
    /// `Match` blocks are never selected.
    disabled: bool,
}

impl HostBlock {
    fn matches(&self, host: &str) -> bool {
        if self.disabled {
            return false;
        }
        let mut matched = false;
        for pattern in &self.patterns {
            if let Some(negated) = pattern.strip_prefix('!') {
                if glob_match(negated, host) {
                    return false;
                }
            } else if glob_match(pattern, host) {
                matched = true;
            }
        }
        matched
    }
}

/// Parsed ssh client configuration.
///
/// # Examples
///
/// ```
/// use kubegather::resolver::SshClientConfig;
///
/// let config = SshClientConfig::parse(
///     "Host bastion\n  HostName 203.0.113.7\n  Port 2222\n\nHost *\n  User ops\n",
/// );
/// assert_eq!(config.get("bastion", "hostname"), Some("203.0.113.7"));
/// assert_eq!(config.get("bastion", "Port"), Some("2222"));
/// assert_eq!(config.get("other", "user"), Some("ops"));
/// assert_eq!(config.get("other", "port"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SshClientConfig {
    blocks: Vec<HostBlock>,
}

impl SshClientConfig {
    /// Parses configuration text. Unknown keywords are kept but ignored by
    /// lookups that do not ask for them.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut blocks = vec![HostBlock {
            patterns: vec!["*".to_string()],
            ..HostBlock::default()
        }];

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((keyword, value)) = split_keyword(line) else {
                continue;
            };
            match keyword.as_str() {
                "host" => blocks.push(HostBlock {
                    patterns: value.split_whitespace().map(str::to_string).collect(),
                    ..HostBlock::default()
                }),
                "match" => blocks.push(HostBlock {
                    disabled: true,
                    ..HostBlock::default()
                }),
                _ => {
                    if let Some(block) = blocks.last_mut() {
                        block.options.push((keyword, unquote(&value).to_string()));
                    }
                }
            }
        }

        Self { blocks }
    }

    /// Loads configuration from `path`. A missing file is an empty config.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(text) => Ok(Self::parse(&text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(Error::InvalidPath {
                path: path.to_path_buf(),
                reason: format!("Failed to read ssh config: {e}"),
            }),
        }
    }

    /// Loads `~/.ssh/config`, or an empty config when there is no home.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read.
    pub fn load_default() -> Result<Self> {
        match default_config_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// First value of `keyword` (case-insensitive) applying to `host`.
    #[must_use]
    pub fn get(&self, host: &str, keyword: &str) -> Option<&str> {
        let keyword = keyword.to_ascii_lowercase();
        self.blocks
            .iter()
            .filter(|block| block.matches(host))
            .flat_map(|block| block.options.iter())
            .find(|(key, _)| *key == keyword)
            .map(|(_, value)| value.as_str())
    }
}

/// Location of the per-user ssh client configuration.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    home::home_dir().map(|home| home.join(".ssh").join("config"))
}

/// Splits `Keyword value` or `Keyword=value`, lowercasing the keyword.
fn split_keyword(line: &str) -> Option<(String, String)> {
    let idx = line.find(|c: char| c.is_whitespace() || c == '=')?;
    let keyword = line[..idx].to_ascii_lowercase();
    let value = line[idx..]
        .trim_start_matches(|c: char| c.is_whitespace() || c == '=')
        .trim();
    if value.is_empty() {
        return None;
    }
    Some((keyword, value.to_string()))
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

/// Matches `text` against a pattern where `*` is any run and `?` any char.
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '?' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '*' {
            star = Some((p, t));
            p += 1;
        } else if let Some((sp, st)) = star {
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|&c| c == '*')
}
