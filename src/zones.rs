use crate::models::HeartRateZone;

/// Zone calculation utilities
///
/// Zones are expressed against the athlete's working range, i.e. the span
/// between their baseline heart rate and their maximum heart rate:
/// - Peak: > 80%
/// - Cardio: > 70%
/// - Aerobic: > 60%
/// - Fat burn: > 50%
/// - Warm-up: > 0%
/// - Rest: otherwise
pub struct ZoneCalculator;

impl ZoneCalculator {
    /// Percentage of the working range a heart rate sits at
    ///
    /// May be negative when the heart rate is below baseline. A degenerate
    /// range (max at or below baseline) yields zero.
    pub fn hr_percentage(heart_rate: f64, baseline: f64, max_hr: f64) -> f64 {
        let range = max_hr - baseline;
        if range <= 0.0 {
            return 0.0;
        }
        (heart_rate - baseline) / range * 100.0
    }

    /// Determine which zone a working-range percentage falls into
    pub fn zone_for_percentage(hr_percentage: f64) -> HeartRateZone {
        if hr_percentage > 80.0 {
            HeartRateZone::Peak
        } else if hr_percentage > 70.0 {
            HeartRateZone::Cardio
        } else if hr_percentage > 60.0 {
            HeartRateZone::Aerobic
        } else if hr_percentage > 50.0 {
            HeartRateZone::FatBurn
        } else if hr_percentage > 0.0 {
            HeartRateZone::WarmUp
        } else {
            HeartRateZone::Rest
        }
    }

    /// Recommended training band, 70-85% of max heart rate (bpm)
    pub fn target_band(max_hr: u16) -> (u16, u16) {
        let max = f64::from(max_hr);
        ((max * 0.70).round() as u16, (max * 0.85).round() as u16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zone_thresholds() {
        assert_eq!(ZoneCalculator::zone_for_percentage(81.0), HeartRateZone::Peak);
        assert_eq!(ZoneCalculator::zone_for_percentage(75.0), HeartRateZone::Cardio);
        assert_eq!(ZoneCalculator::zone_for_percentage(65.0), HeartRateZone::Aerobic);
        assert_eq!(ZoneCalculator::zone_for_percentage(55.0), HeartRateZone::FatBurn);
        assert_eq!(ZoneCalculator::zone_for_percentage(10.0), HeartRateZone::WarmUp);
        assert_eq!(ZoneCalculator::zone_for_percentage(0.0), HeartRateZone::Rest);
    }

    #[test]
    fn test_zone_boundaries_are_exclusive() {
        assert_eq!(ZoneCalculator::zone_for_percentage(80.0), HeartRateZone::Cardio);
        assert_eq!(ZoneCalculator::zone_for_percentage(70.0), HeartRateZone::Aerobic);
        assert_eq!(ZoneCalculator::zone_for_percentage(50.0), HeartRateZone::WarmUp);
        assert_eq!(ZoneCalculator::zone_for_percentage(-12.0), HeartRateZone::Rest);
    }

    #[test]
    fn test_hr_percentage() {
        // 70 baseline, 190 max: 130 bpm is halfway
        assert_eq!(ZoneCalculator::hr_percentage(130.0, 70.0, 190.0), 50.0);
        assert!(ZoneCalculator::hr_percentage(65.0, 70.0, 190.0) < 0.0);
        assert_eq!(ZoneCalculator::hr_percentage(130.0, 190.0, 190.0), 0.0);
    }

    #[test]
    fn test_target_band() {
        assert_eq!(ZoneCalculator::target_band(190), (133, 162));
        assert_eq!(ZoneCalculator::target_band(160), (112, 136));
    }
}
