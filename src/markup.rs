//! Template helpers for referencing variants from page markup.
//!
//! Image paths passed in are relative to the images directory (`cat.png`,
//! `blog/dog.jpg`), the way page authors write them.

use crate::config::ThumbnailerConfig;
use crate::specs::{SpecError, SpecSet, resolve};
use maud::{Markup, html};
use std::path::Path;

/// Optional attributes for a thumbnail `<img>`.
#[derive(Debug, Clone, Default)]
pub struct ImgAttrs {
    pub alt: Option<String>,
    pub class: Option<String>,
    pub id: Option<String>,
    pub lazy: bool,
}

pub struct Helpers<'a> {
    config: &'a ThumbnailerConfig,
}

impl<'a> Helpers<'a> {
    pub fn new(config: &'a ThumbnailerConfig) -> Self {
        Self { config }
    }

    /// Spec Set of an image, with paths relative to the images directory.
    pub fn thumbnail_specs(&self, image: &str) -> SpecSet {
        resolve(Path::new(image), &self.config.dimensions)
    }

    /// Path of one variant, optionally prefixed with the images directory.
    pub fn thumbnail_url(
        &self,
        image: &str,
        name: &str,
        include_images_dir: bool,
    ) -> Result<String, SpecError> {
        let specs = self.thumbnail_specs(image);
        let spec = specs.get(name).ok_or_else(|| SpecError::UnknownVariant {
            image: image.to_string(),
            name: name.to_string(),
        })?;
        let path = if include_images_dir {
            self.config.site.images_dir.join(&spec.path)
        } else {
            spec.path.clone()
        };
        Ok(url_path(&path))
    }

    /// `<img>` tag for one variant.
    ///
    /// With `include_data_thumbnails` on, every entry of the Spec Set is
    /// listed in `data-thumbnails` as `name:path` pairs joined by `|`.
    pub fn thumbnail(&self, image: &str, name: &str, attrs: &ImgAttrs) -> Result<Markup, SpecError> {
        let src = format!("/{}", self.thumbnail_url(image, name, true)?);
        let data_thumbnails = self.config.include_data_thumbnails.then(|| {
            self.thumbnail_specs(image)
                .iter()
                .map(|(variant, spec)| format!("{variant}:{}", url_path(&spec.path)))
                .collect::<Vec<_>>()
                .join("|")
        });
        let loading = attrs.lazy.then_some("lazy");

        Ok(html! {
            img src=(src)
                alt=[attrs.alt.as_deref()]
                class=[attrs.class.as_deref()]
                id=[attrs.id.as_deref()]
                loading=[loading]
                data-thumbnails=[data_thumbnails];
        })
    }
}

fn url_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::parse_config;

    fn config(include_data_thumbnails: bool) -> ThumbnailerConfig {
        parse_config(&format!(
            "include_data_thumbnails = {include_data_thumbnails}\n\
             [dimensions]\nthumb = \"100x100^\"\nlarge = \"800x\"\n"
        ))
        .unwrap()
    }

    #[test]
    fn specs_relative_to_images_dir() {
        let config = config(false);
        let specs = Helpers::new(&config).thumbnail_specs("blog/dog.jpg");
        assert_eq!(
            specs.get("thumb").unwrap().path,
            Path::new("blog/dog-thumb.jpg")
        );
    }

    #[test]
    fn url_with_and_without_images_dir() {
        let config = config(false);
        let helpers = Helpers::new(&config);
        assert_eq!(
            helpers.thumbnail_url("cat.png", "thumb", false).unwrap(),
            "cat-thumb.png"
        );
        assert_eq!(
            helpers.thumbnail_url("cat.png", "thumb", true).unwrap(),
            "images/cat-thumb.png"
        );
        assert_eq!(
            helpers.thumbnail_url("cat.png", "original", true).unwrap(),
            "images/cat.png"
        );
    }

    #[test]
    fn unknown_variant_is_error() {
        let config = config(false);
        let result = Helpers::new(&config).thumbnail_url("cat.png", "huge", false);
        assert!(matches!(result, Err(SpecError::UnknownVariant { name, .. }) if name == "huge"));
    }

    #[test]
    fn img_tag_without_data_attribute() {
        let config = config(false);
        let attrs = ImgAttrs {
            alt: Some("A cat".into()),
            ..ImgAttrs::default()
        };
        let markup = Helpers::new(&config)
            .thumbnail("cat.png", "thumb", &attrs)
            .unwrap()
            .into_string();
        assert_eq!(markup, r#"<img src="/images/cat-thumb.png" alt="A cat">"#);
    }

    #[test]
    fn img_tag_with_data_thumbnails() {
        let config = config(true);
        let markup = Helpers::new(&config)
            .thumbnail("cat.png", "thumb", &ImgAttrs::default())
            .unwrap()
            .into_string();
        assert_eq!(
            markup,
            r#"<img src="/images/cat-thumb.png" data-thumbnails="original:cat.png|thumb:cat-thumb.png|large:cat-large.png">"#
        );
    }

    #[test]
    fn attributes_are_escaped() {
        let config = config(false);
        let attrs = ImgAttrs {
            alt: Some("\"quoted\" <cat>".into()),
            lazy: true,
            ..ImgAttrs::default()
        };
        let markup = Helpers::new(&config)
            .thumbnail("cat.png", "thumb", &attrs)
            .unwrap()
            .into_string();
        assert!(markup.contains("alt=\"&quot;quoted&quot; &lt;cat&gt;\""));
        assert!(markup.contains("loading=\"lazy\""));
    }
}
