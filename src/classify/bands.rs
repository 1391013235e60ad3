use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Ascending distance breakpoints defining the discrete bands used for
/// non-cumulative binning. Band `i` covers `(breaks[i-1], breaks[i]]`
/// kilometers, the first band starts at zero, and the final band is
/// unbounded above.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceBands {
    breaks: Vec<f64>,
}

impl DistanceBands {
    pub fn new(breaks: Vec<f64>) -> Result<Self> {
        if breaks.is_empty() {
            return Err(Error::Config("distance bands need at least one breakpoint".into()));
        }
        if breaks[0] <= 0.0 {
            return Err(Error::Config("distance breakpoints must be positive".into()));
        }
        if breaks.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::Config("distance breakpoints must be strictly ascending".into()));
        }
        Ok(Self { breaks })
    }

    /// The band layout used throughout the accessibility reports:
    /// 0-1, 1-2, 2-5, 5-10, 10-20, 20-50, 50-100, >100 km.
    pub fn standard() -> Self {
        Self { breaks: vec![1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0] }
    }

    /// Number of bands (breakpoints plus the unbounded tail).
    #[inline]
    pub fn len(&self) -> usize {
        self.breaks.len() + 1
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[inline]
    pub fn breaks(&self) -> &[f64] {
        &self.breaks
    }

    /// Index of the band containing a distance.
    #[inline]
    pub fn band_of(&self, distance_km: f64) -> usize {
        self.breaks.partition_point(|b| *b < distance_km)
    }

    /// Lower and upper bound of a band; the final band has no upper bound.
    pub fn bounds(&self, band: usize) -> (f64, Option<f64>) {
        let low = if band == 0 { 0.0 } else { self.breaks[band - 1] };
        (low, self.breaks.get(band).copied())
    }

    /// Human-readable label, e.g. "0-1km", "2-5km", ">100km".
    pub fn label(&self, band: usize) -> String {
        match self.bounds(band) {
            (low, Some(high)) => format!("{}-{}km", trim(low), trim(high)),
            (low, None) => format!(">{}km", trim(low)),
        }
    }

    pub fn labels(&self) -> Vec<String> {
        (0..self.len()).map(|band| self.label(band)).collect()
    }
}

fn trim(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_of_uses_closed_upper_bounds() {
        let bands = DistanceBands::standard();
        assert_eq!(bands.band_of(0.0), 0);
        assert_eq!(bands.band_of(1.0), 0);
        assert_eq!(bands.band_of(1.0001), 1);
        assert_eq!(bands.band_of(2f64.sqrt()), 1);
        assert_eq!(bands.band_of(5.0), 2);
        assert_eq!(bands.band_of(100.0), 6);
        assert_eq!(bands.band_of(250.0), 7);
    }

    #[test]
    fn labels_match_report_format() {
        let bands = DistanceBands::standard();
        assert_eq!(
            bands.labels(),
            vec!["0-1km", "1-2km", "2-5km", "5-10km", "10-20km", "20-50km", "50-100km", ">100km"]
        );
    }

    #[test]
    fn fractional_breaks_keep_their_precision() {
        let bands = DistanceBands::new(vec![0.5, 1.5]).unwrap();
        assert_eq!(bands.labels(), vec!["0-0.5km", "0.5-1.5km", ">1.5km"]);
    }

    #[test]
    fn invalid_breaks_are_config_errors() {
        assert!(DistanceBands::new(vec![]).is_err());
        assert!(DistanceBands::new(vec![-1.0, 2.0]).is_err());
        assert!(DistanceBands::new(vec![1.0, 1.0]).is_err());
        assert!(DistanceBands::new(vec![5.0, 2.0]).is_err());
    }

    #[test]
    fn bounds_cover_the_whole_axis() {
        let bands = DistanceBands::new(vec![1.0, 2.0]).unwrap();
        assert_eq!(bands.bounds(0), (0.0, Some(1.0)));
        assert_eq!(bands.bounds(1), (1.0, Some(2.0)));
        assert_eq!(bands.bounds(2), (2.0, None));
        assert_eq!(bands.len(), 3);
    }
}
