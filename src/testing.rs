use crate::prelude::*;
use ansi_parser::{AnsiParser, AnsiSequence, Output};

/// Compares what a command printed, with ANSI styles turned into tags
/// (`<b>`, `<i>`, `<fg=32>`).
#[macro_export]
macro_rules! assert_stdout {
    ($expected:literal, $actual:expr) => {
        $crate::testing::assert_out(
            indoc::indoc!($expected).trim(),
            String::from_utf8_lossy(&$actual).trim(),
        );
    };
}

#[macro_export]
macro_rules! assert_result {
    ($expected:literal, $actual:expr) => {
        let actual = $crate::utils::format_error(&$actual.unwrap_err());

        pa::assert_str_eq!(indoc::indoc!($expected).trim(), actual);
    };
}

/// Compares the state of a [`crate::vsphere::VsphereFakeClient`].
#[macro_export]
macro_rules! assert_vsphere {
    ($expected:literal, $actual:expr) => {
        pa::assert_str_eq!(indoc::indoc!($expected).trim(), $actual.to_string().trim());
    };
}

/// Compares mutating calls a [`crate::vsphere::VsphereFakeClient`] has
/// accepted, one per line, oldest first.
#[macro_export]
macro_rules! assert_journal {
    ($expected:literal, $actual:expr) => {
        pa::assert_str_eq!(
            indoc::indoc!($expected).trim(),
            $actual.journal().join("\n")
        );
    };
}

#[track_caller]
pub fn assert_out(expected: impl AsRef<str>, actual: impl AsRef<str>) {
    let actual = trim_line_ends(tag_ansi_codes(actual.as_ref()));
    let expected = trim_line_ends(expected.as_ref());

    pa::assert_str_eq!(expected, actual);
}

fn tag_ansi_codes(s: &str) -> String {
    let mut out = String::new();
    let mut open = Vec::new();

    for item in s.ansi_parse() {
        let modes = match item {
            Output::TextBlock(text) => {
                out.push_str(text);
                continue;
            }

            Output::Escape(AnsiSequence::SetGraphicsMode(modes)) => modes,

            Output::Escape(escape) => {
                panic!("Unexpected escape sequence: {:?}", escape);
            }
        };

        for mode in modes {
            let (name, tag) = match mode {
                0 => {
                    while let Some(tag) = open.pop() {
                        out.push_str(&format!("</{}>", tag));
                    }

                    continue;
                }

                1 => ("b", "b".to_string()),
                3 => ("i", "i".to_string()),
                color @ 30..=37 => ("fg", format!("fg={}", color)),
                mode => panic!("Unexpected graphics mode: {}", mode),
            };

            out.push_str(&format!("<{}>", tag));
            open.push(name);
        }
    }

    out
}

fn trim_line_ends(s: impl AsRef<str>) -> String {
    s.as_ref()
        .lines()
        .map(|line| line.trim_end())
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags() {
        colored::control::set_override(true);

        let actual = tag_ansi_codes(&format!(
            "{} {} {}",
            "MyVM01".bold(),
            "myvm01".italic(),
            "[ OK ]".green()
        ));

        pa::assert_str_eq!("<b>MyVM01</b> <i>myvm01</i> <fg=32>[ OK ]</fg>", actual);
    }
}
