//! Latest package version from an APT repository index.
//!
//! A `Packages` file is a list of stanzas separated by blank lines, each a
//! set of `Field: value` lines. Versions are ordered the way dpkg orders
//! them: `[epoch:]upstream[-revision]`, where `~` sorts before anything,
//! even the end of the string.

use std::cmp::Ordering;

use forge_api::{fetch_package_index, AssetStore};

use crate::domain::Result;
use crate::obs::emit_package_version;

/// Every `Version` listed for `package`, in index order.
pub fn package_versions(index: &str, package: &str) -> Vec<String> {
    let mut versions = Vec::new();
    let mut name: Option<&str> = None;
    let mut version: Option<&str> = None;

    let mut flush = |name: &mut Option<&str>, version: &mut Option<&str>| {
        if let (Some(n), Some(v)) = (name.take(), version.take()) {
            if n == package {
                versions.push(v.to_string());
            }
        }
    };

    for line in index.lines() {
        if line.trim().is_empty() {
            flush(&mut name, &mut version);
            continue;
        }
        // continuation of a multi-line field
        if line.starts_with(' ') || line.starts_with('\t') {
            continue;
        }
        let Some((field, value)) = line.split_once(':') else {
            continue;
        };
        if field.eq_ignore_ascii_case("Package") {
            name = Some(value.trim());
        } else if field.eq_ignore_ascii_case("Version") {
            version = Some(value.trim());
        }
    }
    flush(&mut name, &mut version);
    versions
}

/// Compare two Debian version strings.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let (epoch_a, upstream_a, revision_a) = split_version(a);
    let (epoch_b, upstream_b, revision_b) = split_version(b);
    epoch_a
        .cmp(&epoch_b)
        .then_with(|| compare_fragment(upstream_a, upstream_b))
        .then_with(|| compare_fragment(revision_a, revision_b))
}

/// Highest of `versions` by Debian ordering.
pub fn highest_version<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions.into_iter().max_by(|a, b| compare_versions(a, b))
}

/// Download the index at `url` and return the highest version of `package`,
/// or `None` if the index does not list it.
pub async fn latest_package_version<S>(
    store: &S,
    url: &str,
    package: &str,
) -> Result<Option<String>>
where
    S: AssetStore + ?Sized,
{
    let index = fetch_package_index(store, url).await?;
    let versions = package_versions(&index, package);
    let latest = highest_version(versions.iter().map(String::as_str)).map(str::to_string);
    if let Some(version) = &latest {
        emit_package_version(package, version, versions.len());
    }
    Ok(latest)
}

fn split_version(version: &str) -> (u64, &str, &str) {
    let (epoch, rest) = match version.split_once(':') {
        Some((epoch, rest)) if epoch.bytes().all(|b| b.is_ascii_digit()) => {
            (epoch.parse().unwrap_or(0), rest)
        }
        _ => (0, version),
    };
    match rest.rsplit_once('-') {
        Some((upstream, revision)) => (epoch, upstream, revision),
        None => (epoch, rest, ""),
    }
}

fn char_order(c: Option<u8>) -> i32 {
    match c {
        None => 0,
        Some(b'~') => -1,
        Some(c) if c.is_ascii_digit() => 0,
        Some(c) if c.is_ascii_alphabetic() => c as i32,
        Some(c) => c as i32 + 256,
    }
}

fn compare_fragment(a: &str, b: &str) -> Ordering {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    let (mut i, mut j) = (0, 0);
    let is_digit = |s: &[u8], k: usize| s.get(k).is_some_and(u8::is_ascii_digit);

    while i < a.len() || j < b.len() {
        // non-digit run, character by character
        while (i < a.len() && !is_digit(a, i)) || (j < b.len() && !is_digit(b, j)) {
            let (ac, bc) = (char_order(a.get(i).copied()), char_order(b.get(j).copied()));
            if ac != bc {
                return ac.cmp(&bc);
            }
            i += 1;
            j += 1;
        }

        // digit run, numerically
        while a.get(i) == Some(&b'0') {
            i += 1;
        }
        while b.get(j) == Some(&b'0') {
            j += 1;
        }
        let mut first_diff = Ordering::Equal;
        while is_digit(a, i) && is_digit(b, j) {
            if first_diff == Ordering::Equal {
                first_diff = a[i].cmp(&b[j]);
            }
            i += 1;
            j += 1;
        }
        if is_digit(a, i) {
            return Ordering::Greater;
        }
        if is_digit(b, j) {
            return Ordering::Less;
        }
        if first_diff != Ordering::Equal {
            return first_diff;
        }
    }
    Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_api::fakes::MemoryForge;

    const INDEX: &str = "\
Package: rpi-imager
Version: 1.8.5
Architecture: arm64
Description: Raspberry Pi imaging utility
 Writes OS images to SD cards.

Package: rpi-imager-extra
Version: 9.9.9

Package: rpi-imager
Version: 1.10.0
Architecture: armhf

Package: rpi-imager
Version: 1.9.0~rc1
";

    #[test]
    fn test_versions_are_collected_per_package() {
        assert_eq!(
            package_versions(INDEX, "rpi-imager"),
            vec!["1.8.5", "1.10.0", "1.9.0~rc1"]
        );
        assert!(package_versions(INDEX, "missing").is_empty());
    }

    #[test]
    fn test_numeric_runs_compare_as_numbers() {
        assert_eq!(compare_versions("1.10.0", "1.9.9"), Ordering::Greater);
        assert_eq!(compare_versions("1.01", "1.1"), Ordering::Equal);
    }

    #[test]
    fn test_tilde_sorts_before_release() {
        assert_eq!(compare_versions("1.9.0~rc1", "1.9.0"), Ordering::Less);
        assert_eq!(compare_versions("1.9.0~rc1", "1.9.0~rc2"), Ordering::Less);
    }

    #[test]
    fn test_epoch_and_revision() {
        assert_eq!(compare_versions("1:0.1", "9.9"), Ordering::Greater);
        assert_eq!(compare_versions("2.0-2", "2.0-10"), Ordering::Less);
        assert_eq!(compare_versions("2.0+rpt1", "2.0"), Ordering::Greater);
    }

    #[test]
    fn test_highest_version() {
        let versions = ["1.8.5", "1.10.0", "1.9.0~rc1"];
        assert_eq!(highest_version(versions), Some("1.10.0"));
        assert_eq!(highest_version(Vec::<&str>::new()), None);
    }

    #[tokio::test]
    async fn test_latest_package_version_from_index() {
        let url = "https://archive.example.org/debian/Packages";
        let forge = MemoryForge::new().with_raw_asset(url, INDEX);

        let latest = latest_package_version(&forge, url, "rpi-imager").await.unwrap();
        assert_eq!(latest.as_deref(), Some("1.10.0"));

        let missing = latest_package_version(&forge, url, "nothing").await.unwrap();
        assert_eq!(missing, None);
    }
}
