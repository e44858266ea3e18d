use forge_api::{Release, ReleaseCatalog};
use repobot_core::{select_releases, SelectionPatterns};

fn catalog(releases: Vec<Release>) -> ReleaseCatalog {
    ReleaseCatalog::newest_first(releases).unwrap()
}

fn tags(selection: &repobot_core::Selection) -> (Option<&str>, Option<&str>) {
    (
        selection.stable.as_ref().map(|r| r.tag_name.as_str()),
        selection.prerelease.as_ref().map(|r| r.tag_name.as_str()),
    )
}

// ── Slot filling ────────────────────────────────────────────────────────

#[test]
fn prerelease_before_any_stable_is_taken_unconditionally() {
    let releases = catalog(vec![
        Release::new("v2.0-rc1", true),
        Release::new("v1.9", false),
        Release::new("v1.8", false),
    ]);

    let selection = select_releases(&releases, &SelectionPatterns::default());
    assert_eq!(tags(&selection), (Some("v1.9"), Some("v2.0-rc1")));
}

#[test]
fn only_prereleases_yield_no_stable() {
    let releases = catalog(vec![
        Release::new("v3-rc2", true),
        Release::new("v3-rc1", true),
    ]);

    let selection = select_releases(&releases, &SelectionPatterns::default());
    assert_eq!(tags(&selection), (None, Some("v3-rc2")));
}

#[test]
fn empty_catalog_selects_nothing() {
    let selection = select_releases(&ReleaseCatalog::default(), &SelectionPatterns::default());
    assert_eq!(tags(&selection), (None, None));
}

#[test]
fn ignored_releases_never_fill_a_slot() {
    let releases = catalog(vec![
        Release::new("n-42", true).with_name("Nightly 42"),
        Release::new("v1.1", false).with_description("nightly rebuild"),
        Release::new("v1.0", false),
    ]);
    let patterns = SelectionPatterns::new(Some("(?i)nightly"), None).unwrap();

    let selection = select_releases(&releases, &patterns);
    assert_eq!(tags(&selection), (Some("v1.0"), None));
}

// ── Version keys ────────────────────────────────────────────────────────

#[test]
fn multi_axis_keys_use_existential_comparison() {
    // Tags carry a platform build and an upstream app version.
    let pattern = r"^(?P<a_platform>[0-9.]+)-app(?P<b_app>[0-9.a-z]+)$";
    let releases = catalog(vec![
        Release::new("1.0.0-app2.5.0", false),
        Release::new("0.9.0-app2.6.0b1", true),
    ]);
    let patterns = SelectionPatterns::new(None, Some(pattern)).unwrap();

    let selection = select_releases(&releases, &patterns);
    // The app axis is newer even though the platform axis is older.
    assert_eq!(tags(&selection), (Some("1.0.0-app2.5.0"), Some("0.9.0-app2.6.0b1")));
}

#[test]
fn unparseable_prerelease_key_is_not_newer() {
    let releases = catalog(vec![
        Release::new("v1.0.0", false),
        Release::new("vnext", true),
    ]);
    let patterns = SelectionPatterns::new(None, Some(r"^v(?P<version>.+)$")).unwrap();

    let selection = select_releases(&releases, &patterns);
    assert_eq!(tags(&selection), (Some("v1.0.0"), None));
}

#[test]
fn normalized_tags_compare_as_semver() {
    let releases = catalog(vec![
        Release::new("v1.4.0", false),
        Release::new("v1.5.0.dev3", true),
    ]);
    let patterns = SelectionPatterns::new(None, Some(r"^v(?P<version>.+)$")).unwrap();

    let selection = select_releases(&releases, &patterns);
    assert_eq!(tags(&selection), (Some("v1.4.0"), Some("v1.5.0.dev3")));
}

// ── Properties ──────────────────────────────────────────────────────────

#[test]
fn selection_is_deterministic() {
    let releases = catalog(vec![
        Release::new("v2-rc", true),
        Release::new("v1", false),
        Release::new("v0-rc", true),
    ]);
    let patterns = SelectionPatterns::default();

    let first = select_releases(&releases, &patterns);
    let second = select_releases(&releases, &patterns);
    assert_eq!(first, second);
}

#[test]
fn catalog_must_be_newest_first() {
    use chrono::{TimeZone, Utc};

    let older = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let newer = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let releases = vec![
        Release::new("v1", false).with_created_at(older),
        Release::new("v2", false).with_created_at(newer),
    ];

    assert!(ReleaseCatalog::newest_first(releases.clone()).is_err());

    let sorted = ReleaseCatalog::sorted(releases);
    let selection = select_releases(&sorted, &SelectionPatterns::default());
    assert_eq!(tags(&selection), (Some("v2"), None));
}
