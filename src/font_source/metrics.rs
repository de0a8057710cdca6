//! Font metrics and naming data
//!
//! This module contains the measurement and naming information read from a
//! source font: units per em, vertical metrics, and the naming-table strings
//! a merged font may inherit.

use serde::{Deserialize, Serialize};

/// Units per em assumed when a source font does not declare one
pub const DEFAULT_UNITS_PER_EM: u16 = 1000;

/// Vertical metrics for line layout
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VerticalMetrics {
    pub units_per_em: u16,
    pub ascender: f64,
    pub descender: f64,
    pub line_gap: f64,
    pub x_height: Option<f64>,
    pub cap_height: Option<f64>,
}

impl Default for VerticalMetrics {
    fn default() -> Self {
        Self::with_defaults(DEFAULT_UNITS_PER_EM)
    }
}

impl VerticalMetrics {
    /// Metrics with sensible defaults based on UPM
    ///
    /// Ascender is 80% of the em, descender 20% below the baseline.
    pub fn with_defaults(units_per_em: u16) -> Self {
        let upm = f64::from(units_per_em.max(1));
        Self {
            units_per_em: units_per_em.max(1),
            ascender: upm * 0.8,
            descender: -(upm * 0.2),
            line_gap: 0.0,
            x_height: None,
            cap_height: None,
        }
    }

    /// Replace zero (undeclared) values with the UPM-based defaults
    pub fn or_defaults(self) -> Self {
        let units_per_em = if self.units_per_em == 0 {
            DEFAULT_UNITS_PER_EM
        } else {
            self.units_per_em
        };
        let defaults = Self::with_defaults(units_per_em);
        Self {
            units_per_em,
            ascender: if self.ascender == 0.0 {
                defaults.ascender
            } else {
                self.ascender
            },
            descender: if self.descender == 0.0 {
                defaults.descender
            } else {
                self.descender
            },
            ..self
        }
    }

    /// Scale factor that converts this font's units into `target` units
    pub fn scale_to(&self, target: &VerticalMetrics) -> f64 {
        if self.units_per_em == 0 || self.units_per_em == target.units_per_em {
            1.0
        } else {
            f64::from(target.units_per_em) / f64::from(self.units_per_em)
        }
    }
}

/// Naming table strings a merged font may inherit from its sources
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingInfo {
    pub family: Option<String>,
    pub subfamily: Option<String>,
    pub full_name: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub manufacturer: Option<String>,
    pub license: Option<String>,
    pub copyright: Option<String>,
}

impl NamingInfo {
    /// Get a display name combining family and style names
    pub fn display_name(&self) -> String {
        let parts: Vec<&str> = [&self.family, &self.subfamily]
            .iter()
            .filter_map(|s| s.as_deref())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.is_empty() {
            "Untitled Font".to_string()
        } else {
            parts.join(" ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_metrics_fall_back_to_upm_defaults() {
        let metrics = VerticalMetrics {
            units_per_em: 0,
            ascender: 0.0,
            descender: 0.0,
            line_gap: 0.0,
            x_height: None,
            cap_height: None,
        }
        .or_defaults();

        assert_eq!(metrics.units_per_em, 1000);
        assert_eq!(metrics.ascender, 800.0);
        assert_eq!(metrics.descender, -200.0);
    }

    #[test]
    fn scale_between_different_em_sizes() {
        let latin = VerticalMetrics::with_defaults(2048);
        let korean = VerticalMetrics::with_defaults(1024);
        assert_eq!(korean.scale_to(&latin), 2.0);
        assert_eq!(latin.scale_to(&latin), 1.0);
    }

    #[test]
    fn display_name_skips_missing_parts() {
        let naming = NamingInfo {
            family: Some("D2Coding".to_string()),
            ..Default::default()
        };
        assert_eq!(naming.display_name(), "D2Coding");
        assert_eq!(NamingInfo::default().display_name(), "Untitled Font");
    }
}
