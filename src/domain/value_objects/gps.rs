use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpsCoordinates {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl GpsCoordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, String> {
        let coords = Self {
            latitude,
            longitude,
            accuracy: None,
            timestamp: None,
        };
        coords.validate()?;
        Ok(coords)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(format!("Latitude out of range: {}", self.latitude));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(format!("Longitude out of range: {}", self.longitude));
        }
        if let Some(accuracy) = self.accuracy {
            if !accuracy.is_finite() || accuracy < 0.0 {
                return Err(format!("GPS accuracy must be non-negative: {accuracy}"));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_ranges() {
        assert!(GpsCoordinates::new(17.385, 78.4867).is_ok());
        assert!(GpsCoordinates::new(91.0, 0.0).is_err());
        assert!(GpsCoordinates::new(0.0, -180.5).is_err());
        assert!(GpsCoordinates::new(f64::NAN, 0.0).is_err());
    }
}
