//! Sitemap projection.
//!
//! Turns the same discovery + resolution pipeline the build pass uses into
//! one [`Resource`] per generated variant, so the host's routing and output
//! listing know the files exist:
//!
//! ```text
//! images/cat.png → { output_path: "images/cat-thumb.png", build_path: build/images/cat-thumb.png }
//!                  { output_path: "images/cat-large.png", build_path: build/images/cat-large.png }
//! ```
//!
//! The `original` entry of a Spec Set is never projected: the source image is
//! already the host's resource. Existing registry entries are never modified
//! or removed; duplicate suppression is left to the registry's own identity
//! rule ([`Sitemap`] keys on `output_path`).

use crate::config::{SitePaths, ThumbnailerConfig};
use crate::host::{Resource, ResourceRegistry};
use crate::specs::{ResolvedImage, SpecError, resolve_site};
use std::collections::HashSet;

/// Resources for every non-original variant of `images`.
pub fn resources_for(images: &[ResolvedImage], paths: &SitePaths) -> Vec<Resource> {
    images
        .iter()
        .flat_map(|image| image.specs.variants())
        .map(|(_, spec, _)| Resource {
            output_path: logical_url(&spec.path),
            build_path: paths.build_dir.join(&spec.path),
        })
        .collect()
}

/// Discover, resolve and project a whole site.
pub fn project(config: &ThumbnailerConfig, paths: &SitePaths) -> Result<Vec<Resource>, SpecError> {
    Ok(resources_for(&resolve_site(config, paths)?, paths))
}

/// Forward-slash form of a logical path, independent of the platform.
fn logical_url(path: &std::path::Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Bridges the projection into a host registry.
pub struct SitemapProjector<'a> {
    config: &'a ThumbnailerConfig,
    paths: &'a SitePaths,
}

impl<'a> SitemapProjector<'a> {
    pub fn new(config: &'a ThumbnailerConfig, paths: &'a SitePaths) -> Self {
        Self { config, paths }
    }

    /// Append projected resources to an existing list, leaving the existing
    /// entries as they are.
    pub fn manipulate_resource_list(
        &self,
        mut resources: Vec<Resource>,
    ) -> Result<Vec<Resource>, SpecError> {
        resources.extend(project(self.config, self.paths)?);
        Ok(resources)
    }

    /// Register projected resources. Returns how many the registry accepted.
    pub fn project_into(&self, registry: &mut impl ResourceRegistry) -> Result<usize, SpecError> {
        let added = project(self.config, self.paths)?
            .into_iter()
            .filter(|resource| registry.register(resource.clone()))
            .count();
        Ok(added)
    }
}

/// In-memory resource registry keyed on `output_path`. The first registration
/// of a path wins.
#[derive(Debug, Default)]
pub struct Sitemap {
    resources: Vec<Resource>,
    seen: HashSet<String>,
}

impl Sitemap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, output_path: &str) -> bool {
        self.seen.contains(output_path)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceRegistry for Sitemap {
    fn resources(&self) -> &[Resource] {
        &self.resources
    }

    fn register(&mut self, resource: Resource) -> bool {
        if !self.seen.insert(resource.output_path.clone()) {
            return false;
        }
        self.resources.push(resource);
        true
    }
}
