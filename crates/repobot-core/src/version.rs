//! Version normalization.
//!
//! Release tags mix two numbering conventions: plain semantic versions and
//! the epoch/release/pre/post/dev scheme used by Python packaging. The
//! latter is rewritten into a semver-shaped string so both can be compared
//! with the same strict parser.
//!
//! Mapping:
//!
//! | segment      | input     | output        |
//! |--------------|-----------|---------------|
//! | epoch        | `1!`      | `1.` prefix   |
//! | prerelease   | `a1`      | `-a.1`        |
//! | development  | `.dev3`   | `-dev.3`      |
//! | postrelease  | `.post2`  | dropped       |
//! | local        | `+ubuntu` | dropped       |
//!
//! Post and local segments are recognised so such tags still normalize,
//! but they do not take part in ordering.

use std::sync::OnceLock;

use regex::Regex;

const ALTERNATE_GRAMMAR: &str = concat!(
    r"^(?:(?P<epoch>[0-9]+)!)?",
    r"(?P<release>[0-9]+(?:\.[0-9]+)*)",
    r"(?:(?P<pre_l>a|b|rc)(?P<pre_n>[0-9]+))?",
    r"(?:\.post(?P<post>[0-9]+))?",
    r"(?:\.dev(?P<dev>[0-9]+))?",
    r"(?:\+(?P<local>[a-zA-Z0-9]+(?:\.[a-zA-Z0-9]+)*))?$",
);

fn grammar() -> &'static Regex {
    static GRAMMAR: OnceLock<Regex> = OnceLock::new();
    GRAMMAR.get_or_init(|| Regex::new(ALTERNATE_GRAMMAR).expect("version grammar is valid"))
}

/// Rewrite `text` into semver form, or return it unchanged when it does not
/// follow the alternate grammar.
///
/// ```
/// use repobot_core::normalize_version;
///
/// assert_eq!(normalize_version("1!2.3.4a1"), "1.2.3.4-a.1");
/// assert_eq!(normalize_version("not-a-version"), "not-a-version");
/// ```
pub fn normalize_version(text: &str) -> String {
    let Some(caps) = grammar().captures(text) else {
        return text.to_string();
    };

    let mut out = String::new();
    if let Some(epoch) = caps.name("epoch") {
        out.push_str(epoch.as_str());
        out.push('.');
    }
    out.push_str(&caps["release"]);
    if let (Some(label), Some(number)) = (caps.name("pre_l"), caps.name("pre_n")) {
        out.push('-');
        out.push_str(label.as_str());
        out.push('.');
        out.push_str(number.as_str());
    }
    if let Some(dev) = caps.name("dev") {
        out.push_str("-dev.");
        out.push_str(dev.as_str());
    }
    out
}
