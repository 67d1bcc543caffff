//! Element abstraction
//!
//! zzload never owns the elements it works on. It only reads declarative
//! attributes, writes lifecycle attributes and live properties, and dispatches
//! notifications. Hosts supply a cheap-clone handle implementing `Element`.

use std::fmt;

use crate::Notification;

/// Live (non-attribute) property of an element that the dispatcher writes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Property {
    /// `src` of images, iframes and anything else with a settable source
    Src,
    /// `srcset` of images and `source` children
    SrcSet,
    /// Inline `background-image` style
    BackgroundImage,
}

impl Property {
    /// DOM name of the property
    pub fn dom_name(self) -> &'static str {
        match self {
            Property::Src => "src",
            Property::SrcSet => "srcset",
            Property::BackgroundImage => "background-image",
        }
    }
}

/// Handle to a host element
///
/// Handles are clones of the same underlying node; mutation through one
/// handle is visible through every other.
pub trait Element: Clone + fmt::Debug + 'static {
    /// Lowercase local name (`img`, `picture`, `iframe`, ...)
    fn tag_name(&self) -> String;

    /// Attribute value, `None` when the attribute is absent
    fn attribute(&self, name: &str) -> Option<String>;

    fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    fn set_attribute(&self, name: &str, value: &str);

    fn remove_attribute(&self, name: &str);

    /// Direct element children, in document order
    fn children(&self) -> Vec<Self>;

    /// First descendant (depth-first, document order) with the given tag
    fn first_descendant(&self, tag: &str) -> Option<Self>;

    /// Current value of a live property
    fn property(&self, property: Property) -> Option<String>;

    fn set_property(&self, property: Property, value: &str);

    /// Candidate the host actually selected for rendering (`currentSrc`)
    fn current_src(&self) -> Option<String>;

    /// Dispatch a named notification on this element
    fn dispatch(&self, event_name: &str, notification: &Notification<Self>);

    fn is_tag(&self, tag: &str) -> bool {
        self.tag_name().eq_ignore_ascii_case(tag)
    }
}
