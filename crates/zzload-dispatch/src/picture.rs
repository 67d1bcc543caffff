//! Picture candidate resolution
//!
//! The host has already chosen which child of a `picture` to render. The
//! dispatcher finds the child whose live source is that candidate and loads
//! that child's declared full-resolution source. Once the probe succeeds,
//! every child is rewritten from its own declarations.

use zzload_core::{AttrKey, Element, MarkupError, Namespace, Property};

use crate::{normalize_candidate, ProbeRequest};

/// Declared sources of the child matching the rendered candidate
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PictureSelection {
    pub src: String,
    pub srcset: Option<String>,
}

impl PictureSelection {
    pub fn probe_request(&self) -> ProbeRequest {
        ProbeRequest::new(self.src.clone()).with_srcset(self.srcset.clone())
    }
}

/// Live source a child advertises: `srcset` for `source`, `src` for `img`
fn live_candidate<E: Element>(child: &E) -> Option<String> {
    if child.is_tag("source") {
        Some(child.property(Property::SrcSet).unwrap_or_default())
    } else if child.is_tag("img") {
        Some(child.property(Property::Src).unwrap_or_default())
    } else {
        None
    }
}

/// Match the rendered candidate against the children's declarations.
/// When several children match, the last one wins.
pub fn select_candidate<E: Element>(
    picture: &E,
    ns: &Namespace,
    origin: Option<&str>,
) -> Result<PictureSelection, MarkupError> {
    let img = picture
        .first_descendant("img")
        .ok_or(MarkupError::PictureWithoutImage)?;
    let current = normalize_candidate(&img.current_src().unwrap_or_default(), origin);

    let mut selection = None;
    for child in picture.children() {
        let Some(candidate) = live_candidate(&child) else {
            continue;
        };
        if normalize_candidate(&candidate, origin) == current {
            selection = ns
                .declared(&child, AttrKey::SourceImg)
                .map(|src| PictureSelection {
                    src,
                    srcset: ns.declared(&child, AttrKey::SourceSrcSet),
                });
        }
    }

    selection.ok_or(MarkupError::PictureCandidateMismatch { current })
}

/// Rewrite every child's live sources from its declarations. `source`
/// children receive `srcset = "<source-img>, <source-srcset>"` (whichever
/// exist); `img` children receive `srcset` then `src`.
pub fn commit_children<E: Element>(picture: &E, ns: &Namespace, clear_declarations: bool) {
    for child in picture.children() {
        let src = ns.declared(&child, AttrKey::SourceImg);
        let srcset = ns.declared(&child, AttrKey::SourceSrcSet);

        if child.is_tag("source") {
            let combined: Vec<&str> = [src.as_deref(), srcset.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if !combined.is_empty() {
                child.set_property(Property::SrcSet, &combined.join(", "));
            }
        } else if child.is_tag("img") {
            if let Some(srcset) = &srcset {
                child.set_property(Property::SrcSet, srcset);
            }
            if let Some(src) = &src {
                child.set_property(Property::Src, src);
            }
        }

        if clear_declarations {
            for key in AttrKey::DECLARATIVE_SOURCES {
                child.remove_attribute(ns.attr(key));
            }
        }
    }
}
