mod prompt;

use crate::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use std::{fmt, fs, io};

pub use self::prompt::*;

const SERVER: &str = "SERVER";
const USER: &str = "USER";
const PASSWORD: &str = "PASSWORD";
const RELEASE: &str = "VSPHERE_RELEASE";

const DEFAULT_RELEASE: &str = "8.0.1.0";

/// Connection settings, read from an env-style file.
pub struct Config {
    pub server: String,
    pub user: String,
    pub password: String,

    /// API release used in request paths (`/sdk/vim25/<release>/...`).
    pub release: String,
}

impl Config {
    /// Loads the configuration; required values missing from the file are
    /// asked for through `prompt` (and are not written back).
    ///
    /// A file that doesn't exist is treated as an empty one.
    pub fn load(
        file: impl AsRef<Path>,
        prompt: &mut dyn Prompt,
        stdout: &mut dyn Write,
    ) -> Result<Self> {
        let file = file.as_ref();

        let mut values = Self::read(file)
            .with_context(|| format!("Couldn't load configuration from: {}", file.display()))?;

        let missing: Vec<_> = [SERVER, USER, PASSWORD]
            .into_iter()
            .filter(|key| !values.contains_key(*key))
            .collect();

        if !missing.is_empty() {
            tracing::debug!(?missing, file = %file.display(), "configuration is incomplete");

            writeln!(
                stdout,
                "{} configuration value(s) are missing: {}",
                "warn:".yellow(),
                missing.iter().join(", "),
            )?;

            writeln!(
                stdout,
                "      set them in {} to avoid entering them manually each time",
                file.display()
            )?;

            writeln!(stdout)?;

            for key in missing {
                let question = format!("Please enter {}: ", key);

                let value = if key == PASSWORD {
                    prompt.read_password(&question)
                } else {
                    prompt.read_line(&question)
                };

                let value = value.with_context(|| format!("Couldn't read {}", key))?;

                values.insert(key.to_owned(), value);
            }
        }

        let mut take = |key: &str| values.remove(key).unwrap_or_default();

        Ok(Self {
            server: take(SERVER),
            user: take(USER),
            password: take(PASSWORD),
            release: values
                .remove(RELEASE)
                .filter(|release| !release.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_RELEASE.into()),
        })
    }

    fn read(file: &Path) -> Result<HashMap<String, String>> {
        let content = match fs::read_to_string(file) {
            Ok(content) => content,

            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(file = %file.display(), "configuration file not found");
                return Ok(Default::default());
            }

            Err(err) => {
                return Err(err).context("Couldn't read file");
            }
        };

        let content = escape_bare_dollars(&content);

        dotenvy::from_read_iter(content.as_bytes())
            .map(|item| item.context("Couldn't parse file"))
            .collect()
    }
}

/// Escapes every `$` that doesn't open a `${NAME}` reference, so that a value
/// such as `PASSWORD=Pa$sw0rd` is read verbatim; braced references still get
/// expanded.
///
/// Single-quoted values and comments are left untouched, since the parser
/// doesn't expand anything there anyway.
fn escape_bare_dollars(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut quote = None;
    let mut escaped = false;
    let mut after_blank = true;

    while let Some(c) = chars.next() {
        if escaped {
            escaped = false;
        } else {
            match (quote, c) {
                (Some('\''), '\'') => quote = None,
                (Some('\''), _) => {}
                (_, '\\') => escaped = true,
                (Some('"'), '"') => quote = None,
                (None, '\'' | '"') => quote = Some(c),

                (None, '#') if after_blank => {
                    out.push(c);

                    while let Some(c) = chars.next_if(|c| *c != '\n') {
                        out.push(c);
                    }

                    continue;
                }

                (_, '$') if chars.peek() != Some(&'{') => out.push('\\'),
                _ => {}
            }
        }

        out.push(c);
        after_blank = c.is_whitespace();
    }

    out
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server", &self.server)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("release", &self.release)
            .finish()
    }
}
