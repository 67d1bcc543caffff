//! zzload Web - Browser bindings
//!
//! This crate provides:
//! - `WebElement`, the `Element` implementation over `web_sys::Element`
//! - `WebPage`, the window as document, resource host and viewport host
//! - The `ZzLoad` class exported to JavaScript

pub mod element;
pub mod page;
pub mod bindings;

pub use element::*;
pub use page::*;
pub use bindings::*;

#[cfg(test)]
wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);
