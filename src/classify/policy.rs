use serde::{Deserialize, Serialize};

/// Urban/rural label of a populated cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Class {
    Urban,
    Rural,
}

impl Class {
    pub fn as_str(&self) -> &'static str {
        match self {
            Class::Urban => "urban",
            Class::Rural => "rural",
        }
    }
}

/// How a raster value encodes urban/rural class. Exactly one policy applies
/// per analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum ClassPolicy {
    /// A single signed raster: positive values are urban population,
    /// negative values rural, with magnitude = population.
    Sign,
    /// An unsigned density raster: values at or above the threshold are
    /// urban.
    Threshold { min_urban_density: f64 },
}

/// Default density threshold (people per cell) separating urban from rural.
pub const DEFAULT_URBAN_DENSITY: f64 = 300.0;

impl ClassPolicy {
    /// Classify a populated cell value, returning its class and the
    /// population magnitude to aggregate. Zero and no-data values must be
    /// filtered out before classification.
    #[inline]
    pub fn classify(&self, value: f64) -> (Class, f64) {
        match self {
            ClassPolicy::Sign => {
                if value > 0.0 {
                    (Class::Urban, value)
                } else {
                    (Class::Rural, -value)
                }
            }
            ClassPolicy::Threshold { min_urban_density } => {
                if value >= *min_urban_density {
                    (Class::Urban, value)
                } else {
                    (Class::Rural, value)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_policy_splits_on_sign_with_magnitudes() {
        let policy = ClassPolicy::Sign;
        assert_eq!(policy.classify(120.0), (Class::Urban, 120.0));
        assert_eq!(policy.classify(-45.0), (Class::Rural, 45.0));
    }

    #[test]
    fn threshold_policy_splits_on_density() {
        let policy = ClassPolicy::Threshold { min_urban_density: 300.0 };
        assert_eq!(policy.classify(300.0), (Class::Urban, 300.0));
        assert_eq!(policy.classify(299.9), (Class::Rural, 299.9));
        assert_eq!(policy.classify(12.0), (Class::Rural, 12.0));
    }
}
