//! Descriptor aggregation for the selected releases.
//!
//! The stable descriptor is fetched first, the prerelease descriptor only
//! after it completes. A missing stable release or stable asset means there
//! is nothing to publish, which is reported as `Ok(None)`.

use forge_api::{AssetStore, Release, ReleaseSource, RepoRef};

use crate::domain::{AggregatedDocument, ArtifactDescriptor, Result};
use crate::obs::emit_descriptor_fetched;
use crate::selection::{select_releases, Selection, SelectionPatterns};

/// Adjustments applied to fetched descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorOverrides {
    /// Display name for the stable entry
    pub name_stable: Option<String>,
    /// Display name for the prerelease entry
    pub name_prerelease: Option<String>,
    /// Value injected as `init_format` into every entry
    pub init_format: Option<String>,
}

/// Fetch one descriptor and apply the name / init format overrides.
async fn fetch_descriptor<S>(
    store: &S,
    release: &Release,
    url: &str,
    name: Option<&str>,
    init_format: Option<&str>,
) -> Result<ArtifactDescriptor>
where
    S: AssetStore + ?Sized,
{
    let value = store.fetch_json(url).await?;
    emit_descriptor_fetched(&release.tag_name, url);

    let mut descriptor = ArtifactDescriptor::from_value(url, value)?;
    if let Some(name) = name {
        descriptor.rename(name);
    }
    if let Some(init_format) = init_format {
        descriptor.set_init_format(init_format);
    }
    Ok(descriptor)
}

/// Build the aggregated document for `selection`.
pub async fn aggregate<S>(
    selection: &Selection,
    store: &S,
    overrides: &DescriptorOverrides,
) -> Result<Option<AggregatedDocument>>
where
    S: AssetStore + ?Sized,
{
    let Some(stable) = &selection.stable else {
        return Ok(None);
    };
    let Some(stable_url) = &stable.asset_url else {
        return Ok(None);
    };

    let init_format = overrides.init_format.as_deref();
    let stable_descriptor = fetch_descriptor(
        store,
        stable,
        stable_url,
        overrides.name_stable.as_deref(),
        init_format,
    )
    .await?;

    let mut os_list = vec![stable_descriptor];

    if let Some(prerelease) = &selection.prerelease {
        if let Some(url) = &prerelease.asset_url {
            let descriptor = fetch_descriptor(
                store,
                prerelease,
                url,
                overrides.name_prerelease.as_deref(),
                init_format,
            )
            .await?;
            os_list.push(descriptor);
        }
    }

    Ok(Some(AggregatedDocument { os_list }))
}

/// List, select and aggregate in one go.
pub async fn build_imager_document<C>(
    client: &C,
    repo: &RepoRef,
    patterns: &SelectionPatterns,
    overrides: &DescriptorOverrides,
) -> Result<Option<AggregatedDocument>>
where
    C: ReleaseSource + AssetStore + ?Sized,
{
    let catalog = client.list_releases(repo).await?;
    let selection = select_releases(&catalog, patterns);
    aggregate(&selection, client, overrides).await
}
