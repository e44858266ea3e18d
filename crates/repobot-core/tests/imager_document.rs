//! End-to-end: release listing -> selection -> descriptor aggregation -> file.

use forge_api::fakes::MemoryForge;
use forge_api::{Release, RepoRef};
use repobot_core::{
    build_imager_document, fetch_snippet, write_document, BotError, DescriptorOverrides,
    SelectionPatterns, SnippetFilter,
};
use serde_json::{json, Value};

const STABLE_URL: &str = "https://github.com/octo/images/releases/download/1.0.0/rpi-imager.json";
const RC_URL: &str = "https://github.com/octo/images/releases/download/1.1.0rc1/rpi-imager.json";

fn repo() -> RepoRef {
    RepoRef::new("octo", "images")
}

fn forge() -> MemoryForge {
    MemoryForge::new()
        .with_releases(vec![
            Release::new("1.1.0rc1", true).with_asset(RC_URL),
            Release::new("1.0.1-nightly", false).with_name("1.0.1 nightly"),
            Release::new("1.0.0", false).with_asset(STABLE_URL),
        ])
        .with_asset(
            STABLE_URL,
            json!({
                "name": "OctoImage 1.0.0",
                "description": "upstream",
                "url": "https://example.com/octo-1.0.0.img.xz",
                "release_date": "2024-03-01"
            }),
        )
        .with_asset(
            RC_URL,
            json!({
                "name": "OctoImage 1.1.0rc1",
                "url": "https://example.com/octo-1.1.0rc1.img.xz"
            }),
        )
}

fn overrides() -> DescriptorOverrides {
    DescriptorOverrides {
        name_stable: Some("OctoImage".to_string()),
        name_prerelease: Some("OctoImage (next)".to_string()),
        init_format: Some("systemd".to_string()),
    }
}

#[tokio::test]
async fn builds_and_writes_two_entry_document() {
    let forge = forge();
    let patterns = SelectionPatterns::new(Some("nightly"), None).unwrap();

    let document = build_imager_document(&forge, &repo(), &patterns, &overrides())
        .await
        .unwrap()
        .expect("stable release present");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rpi-imager.json");
    write_document(&path, &document).unwrap();

    let text = std::fs::read_to_string(&path).unwrap();
    let written: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(
        written,
        json!({ "os_list": [
            {
                "name": "OctoImage",
                "description": "OctoImage 1.0.0",
                "url": "https://example.com/octo-1.0.0.img.xz",
                "release_date": "2024-03-01",
                "init_format": "systemd"
            },
            {
                "name": "OctoImage (next)",
                "url": "https://example.com/octo-1.1.0rc1.img.xz",
                "description": "OctoImage 1.1.0rc1",
                "init_format": "systemd"
            }
        ] })
    );

    // Upstream field order is kept: untouched fields stay where they were.
    let first_keys: Vec<&str> = written["os_list"][0]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(
        first_keys,
        vec!["name", "description", "url", "release_date", "init_format"]
    );
    assert!(text.starts_with("{\n  \"os_list\": [\n    {"));

    // The stable descriptor is fetched before the prerelease one.
    assert_eq!(forge.asset_fetches(), vec![STABLE_URL, RC_URL]);
}

#[tokio::test]
async fn nothing_is_written_without_a_stable_release() {
    let forge = MemoryForge::new()
        .with_releases(vec![Release::new("2.0rc1", true).with_asset(RC_URL)])
        .with_asset(RC_URL, json!({ "name": "rc" }));

    let document = build_imager_document(
        &forge,
        &repo(),
        &SelectionPatterns::default(),
        &DescriptorOverrides::default(),
    )
    .await
    .unwrap();

    assert!(document.is_none());
    assert!(forge.asset_fetches().is_empty());
}

#[tokio::test]
async fn non_object_descriptor_is_rejected() {
    let forge = MemoryForge::new()
        .with_releases(vec![Release::new("1.0.0", false).with_asset(STABLE_URL)])
        .with_asset(STABLE_URL, json!(["not", "an", "object"]));

    let err = build_imager_document(
        &forge,
        &repo(),
        &SelectionPatterns::default(),
        &DescriptorOverrides::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, BotError::DescriptorNotObject { .. }));
}

#[tokio::test]
async fn stable_download_failure_propagates() {
    let forge = MemoryForge::new()
        .with_releases(vec![Release::new("1.0.0", false).with_asset(STABLE_URL)])
        .with_failing_asset(STABLE_URL);

    let err = build_imager_document(
        &forge,
        &repo(),
        &SelectionPatterns::default(),
        &DescriptorOverrides::default(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, BotError::Feed(_)));
}

#[tokio::test]
async fn snippet_copies_newest_matching_descriptor() {
    let forge = forge();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snippet.json");
    let filter = SnippetFilter::new(true, None, Some("nightly")).unwrap();

    let release = fetch_snippet(&forge, &repo(), &filter, &path)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(release.tag_name, "1.1.0rc1");

    let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written["name"], "OctoImage 1.1.0rc1");
}

#[tokio::test]
async fn snippet_without_match_writes_nothing() {
    let forge = forge();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("snippet.json");
    let filter = SnippetFilter::new(false, Some("^2\\."), None).unwrap();

    let release = fetch_snippet(&forge, &repo(), &filter, &path).await.unwrap();
    assert!(release.is_none());
    assert!(!path.exists());
}
