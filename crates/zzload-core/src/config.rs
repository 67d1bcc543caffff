//! Loader configuration
//!
//! `LoaderConfig` mirrors the option object accepted by the public entry.
//! Missing keys fall back to defaults, so a partial document merges cleanly
//! over the defaults. `validate` turns it into the parsed settings the
//! monitor needs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult, Namespace, DEFAULT_ATTRIBUTE_PREFIX, DEFAULT_EVENT_PREFIX};

/// One or several intersection thresholds
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    Single(f64),
    List(Vec<f64>),
}

impl Default for Threshold {
    fn default() -> Self {
        Threshold::Single(0.0)
    }
}

impl Threshold {
    /// Sorted, de-duplicated thresholds, each checked to lie in [0, 1]
    pub fn normalized(&self) -> ConfigResult<Vec<f64>> {
        let mut values = match self {
            Threshold::Single(v) => vec![*v],
            Threshold::List(list) => list.clone(),
        };
        if values.is_empty() {
            return Err(ConfigError::EmptyThresholds);
        }
        if let Some(bad) = values.iter().find(|v| !(0.0..=1.0).contains(*v)) {
            return Err(ConfigError::ThresholdOutOfRange(*bad));
        }
        values.sort_by(f64::total_cmp);
        values.dedup();
        Ok(values)
    }
}

/// CSS length used by a root margin
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Length {
    Px(f64),
    /// Percentage of the root box along the same axis
    Percent(f64),
}

impl Length {
    /// Resolve against the root box size along this side's axis
    pub fn resolve(self, basis: f64) -> f64 {
        match self {
            Length::Px(v) => v,
            Length::Percent(p) => basis * p / 100.0,
        }
    }
}

impl FromStr for Length {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |n: &str| match n.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(format!("bad number in {s:?}")),
        };
        if let Some(n) = s.strip_suffix("px") {
            Ok(Length::Px(parse(n)?))
        } else if let Some(n) = s.strip_suffix('%') {
            Ok(Length::Percent(parse(n)?))
        } else if parse(s)? == 0.0 {
            Ok(Length::Px(0.0))
        } else {
            Err(format!("{s:?} must be in px or %"))
        }
    }
}

impl fmt::Display for Length {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Length::Px(v) => write!(f, "{v}px"),
            Length::Percent(v) => write!(f, "{v}%"),
        }
    }
}

/// Parsed root margin (CSS `margin` shorthand: top, right, bottom, left)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RootMargin {
    pub top: Length,
    pub right: Length,
    pub bottom: Length,
    pub left: Length,
}

impl Default for RootMargin {
    fn default() -> Self {
        RootMargin::uniform(Length::Px(0.0))
    }
}

impl RootMargin {
    pub fn uniform(length: Length) -> Self {
        RootMargin {
            top: length,
            right: length,
            bottom: length,
            left: length,
        }
    }

    /// Parse 1 to 4 whitespace separated lengths
    pub fn parse(margin: &str) -> ConfigResult<Self> {
        let invalid = |reason: String| ConfigError::InvalidRootMargin {
            margin: margin.to_owned(),
            reason,
        };

        let parts = margin
            .split_whitespace()
            .map(Length::from_str)
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;

        match parts.as_slice() {
            [all] => Ok(RootMargin::uniform(*all)),
            [v, h] => Ok(RootMargin {
                top: *v,
                right: *h,
                bottom: *v,
                left: *h,
            }),
            [t, h, b] => Ok(RootMargin {
                top: *t,
                right: *h,
                bottom: *b,
                left: *h,
            }),
            [t, r, b, l] => Ok(RootMargin {
                top: *t,
                right: *r,
                bottom: *b,
                left: *l,
            }),
            _ => Err(invalid(format!("expected 1 to 4 lengths, got {}", parts.len()))),
        }
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

/// Validated viewport settings handed to the visibility monitor
#[derive(Clone, Debug, PartialEq)]
pub struct ObserverSettings {
    /// Canonical four-side form with explicit units, for hosts that take a
    /// CSS string
    pub root_margin_css: String,
    pub root_margin: RootMargin,
    pub thresholds: Vec<f64>,
}

impl Default for ObserverSettings {
    fn default() -> Self {
        ObserverSettings {
            root_margin_css: RootMargin::default().to_string(),
            root_margin: RootMargin::default(),
            thresholds: vec![0.0],
        }
    }
}

/// User-facing loader configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LoaderConfig {
    pub root_margin: String,
    pub threshold: Threshold,
    /// Strip declarative source attributes after a successful load
    pub clear_source_attrs: bool,
    /// Write to the visible element only once the probe has loaded
    pub set_sources_only_on_load: bool,
    pub attribute_prefix: String,
    pub event_prefix: String,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        LoaderConfig {
            root_margin: "0px".into(),
            threshold: Threshold::default(),
            clear_source_attrs: true,
            set_sources_only_on_load: true,
            attribute_prefix: DEFAULT_ATTRIBUTE_PREFIX.into(),
            event_prefix: DEFAULT_EVENT_PREFIX.into(),
        }
    }
}

impl LoaderConfig {
    /// Parse a (possibly partial) JSON option object
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Defaults with the given root margin
    pub fn with_root_margin(margin: &str) -> Self {
        LoaderConfig {
            root_margin: margin.into(),
            ..LoaderConfig::default()
        }
    }

    /// Check every field and produce monitor settings
    pub fn validate(&self) -> ConfigResult<ObserverSettings> {
        if self.attribute_prefix.is_empty() {
            return Err(ConfigError::EmptyAttributePrefix);
        }
        let root_margin = RootMargin::parse(&self.root_margin)?;
        Ok(ObserverSettings {
            root_margin_css: root_margin.to_string(),
            root_margin,
            thresholds: self.threshold.normalized()?,
        })
    }

    pub fn namespace(&self) -> Namespace {
        Namespace::new(&self.attribute_prefix, &self.event_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_defaults() {
        let config = LoaderConfig::default();
        assert_eq!(config.root_margin, "0px");
        assert!(config.clear_source_attrs);
        assert!(config.set_sources_only_on_load);

        let settings = config.validate().unwrap();
        assert_eq!(settings.thresholds, vec![0.0]);
        assert_eq!(settings.root_margin, RootMargin::default());
    }

    #[test]
    fn test_partial_json_merges_over_defaults() {
        let config = LoaderConfig::from_json(r#"{"rootMargin": "100px 0px", "clearSourceAttrs": false}"#)
            .unwrap();
        assert_eq!(config.root_margin, "100px 0px");
        assert!(!config.clear_source_attrs);
        assert!(config.set_sources_only_on_load);
        assert_eq!(config.threshold, Threshold::Single(0.0));
    }

    #[test]
    fn test_threshold_list() {
        let config = LoaderConfig::from_json(r#"{"threshold": [0.5, 0, 0.5, 1]}"#).unwrap();
        assert_eq!(config.validate().unwrap().thresholds, vec![0.0, 0.5, 1.0]);

        let bad = LoaderConfig::from_json(r#"{"threshold": 1.5}"#).unwrap();
        assert_eq!(bad.validate(), Err(ConfigError::ThresholdOutOfRange(1.5)));

        let empty = LoaderConfig::from_json(r#"{"threshold": []}"#).unwrap();
        assert_eq!(empty.validate(), Err(ConfigError::EmptyThresholds));
    }

    #[test]
    fn test_root_margin_shorthand() {
        let m = RootMargin::parse("10px 5%").unwrap();
        assert_eq!(m.top, Length::Px(10.0));
        assert_eq!(m.right, Length::Percent(5.0));
        assert_eq!(m.bottom, Length::Px(10.0));
        assert_eq!(m.left, Length::Percent(5.0));

        let m = RootMargin::parse("1px 2px 3px").unwrap();
        assert_eq!(m.left, Length::Px(2.0));
        assert_eq!(m.bottom, Length::Px(3.0));

        assert_eq!(RootMargin::parse("0").unwrap(), RootMargin::default());
        assert!(RootMargin::parse("10em").is_err());
        assert!(RootMargin::parse("").is_err());
        assert!(RootMargin::parse("1px 1px 1px 1px 1px").is_err());
    }

    #[test]
    fn test_non_finite_margin_rejected() {
        for margin in ["NaNpx", "infpx", "-inf%", "NaN"] {
            let config = LoaderConfig::with_root_margin(margin);
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidRootMargin { .. })),
                "{margin} accepted"
            );
        }
    }

    #[test]
    fn test_margin_css_carries_units() {
        let settings = LoaderConfig::with_root_margin("0").validate().unwrap();
        assert_eq!(settings.root_margin_css, "0px 0px 0px 0px");

        let settings = LoaderConfig::with_root_margin("10px 5%").validate().unwrap();
        assert_eq!(settings.root_margin_css, "10px 5% 10px 5%");
        assert_eq!(ObserverSettings::default().root_margin_css, "0px 0px 0px 0px");
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            LoaderConfig::from_json("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let config = LoaderConfig {
            attribute_prefix: String::new(),
            ..LoaderConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::EmptyAttributePrefix));
    }

    proptest! {
        #[test]
        fn prop_uniform_px_margin_roundtrips(v in -500i32..500) {
            let css = format!("{v}px");
            let margin = RootMargin::parse(&css).unwrap();
            prop_assert_eq!(margin, RootMargin::uniform(Length::Px(v as f64)));
        }

        #[test]
        fn prop_thresholds_in_range_are_accepted(list in proptest::collection::vec(0.0f64..=1.0, 1..8)) {
            let normalized = Threshold::List(list).normalized().unwrap();
            prop_assert!(normalized.windows(2).all(|w| w[0] < w[1]));
        }
    }
}
