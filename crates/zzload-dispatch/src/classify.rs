//! Strategy classification
//!
//! Exactly one strategy applies to an element, chosen by the first match in
//! a fixed order:
//! 1. `source-img` (+ optional `source-srcset`)
//! 2. `source-background-img`
//! 3. `source-image` with a nested SVG `image`
//! 4. `source-iframe`
//! 5. `picture` element
//! 6. `source-container` marker
//!
//! The order is part of the contract. Changing it is a behavior change.

use tracing::warn;
use zzload_core::{AttrKey, Element, MarkupError, Namespace};

/// Strategy tag without payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Image,
    Background,
    SvgImage,
    Iframe,
    PictureContainer,
    ContainerMarker,
    Unrecognized,
}

impl SourceKind {
    /// Does this strategy go through a detached probe image?
    pub fn uses_probe(self) -> bool {
        matches!(
            self,
            SourceKind::Image
                | SourceKind::Background
                | SourceKind::SvgImage
                | SourceKind::PictureContainer
        )
    }
}

/// Classified element with the declarations its strategy needs
#[derive(Clone, Debug, PartialEq)]
pub enum Source<E> {
    Image { src: String, srcset: Option<String> },
    Background { src: String },
    /// `target` is the nested SVG `image` receiving `href`
    SvgImage { src: String, target: E },
    Iframe { src: String },
    PictureContainer,
    ContainerMarker,
    Unrecognized,
}

impl<E> Source<E> {
    pub fn kind(&self) -> SourceKind {
        match self {
            Source::Image { .. } => SourceKind::Image,
            Source::Background { .. } => SourceKind::Background,
            Source::SvgImage { .. } => SourceKind::SvgImage,
            Source::Iframe { .. } => SourceKind::Iframe,
            Source::PictureContainer => SourceKind::PictureContainer,
            Source::ContainerMarker => SourceKind::ContainerMarker,
            Source::Unrecognized => SourceKind::Unrecognized,
        }
    }
}

/// Classify an element. Evaluated once per dispatch.
pub fn classify<E: Element>(element: &E, ns: &Namespace) -> Source<E> {
    if let Some(src) = ns.declared(element, AttrKey::SourceImg) {
        let srcset = ns.declared(element, AttrKey::SourceSrcSet);
        return Source::Image { src, srcset };
    }

    if let Some(src) = ns.declared(element, AttrKey::SourceBackgroundImg) {
        return Source::Background { src };
    }

    if let Some(src) = ns.declared(element, AttrKey::SourceImage) {
        match element.first_descendant("image") {
            Some(target) => return Source::SvgImage { src, target },
            None => warn!(?element, error = %MarkupError::SvgImageMissing, "skipping source-image"),
        }
    }

    if let Some(src) = ns.declared(element, AttrKey::SourceIframe) {
        return Source::Iframe { src };
    }

    if element.is_tag("picture") {
        return Source::PictureContainer;
    }

    if ns.has_marker(element, AttrKey::SourceContainer) {
        return Source::ContainerMarker;
    }

    Source::Unrecognized
}
