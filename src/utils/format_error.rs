use std::fmt::Write;

/// Renders an error together with its causes the way `anyhow`'s `{:?}` does,
/// but never with a backtrace (which `RUST_BACKTRACE` would otherwise append).
pub fn format_error(err: &anyhow::Error) -> String {
    let mut out = err.to_string();
    let causes: Vec<_> = err.chain().skip(1).collect();

    if causes.is_empty() {
        return out;
    }

    out.push_str("\n\nCaused by:");

    for (idx, cause) in causes.iter().enumerate() {
        let (head, indent) = if causes.len() > 1 {
            (format!("{:>5}: ", idx), " ".repeat(7))
        } else {
            (" ".repeat(4), " ".repeat(4))
        };

        for (line_idx, line) in cause.to_string().lines().enumerate() {
            let prefix = if line_idx == 0 { &head } else { &indent };

            _ = write!(out, "\n{}{}", prefix, line);
        }
    }

    out
}
