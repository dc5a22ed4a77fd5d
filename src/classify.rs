/// Categorical labels for blood pressure and pulse oximetry readings
///
/// Every function here is total: any integer input maps to exactly one
/// category, with `Unknown` as a regular terminal state rather than an error.
use crate::models::{
    BloodPressureCategory, BloodPressureStandard, PulseRateCategory, SignalQuality, Spo2Category,
};

/// Categorize a blood pressure reading (mmHg) under the selected guideline set
pub fn categorize_blood_pressure(
    systolic: i32,
    diastolic: i32,
    standard: BloodPressureStandard,
) -> BloodPressureCategory {
    match standard {
        BloodPressureStandard::Eu => categorize_eu(systolic, diastolic),
        BloodPressureStandard::Us => categorize_us(systolic, diastolic),
    }
}

fn categorize_eu(systolic: i32, diastolic: i32) -> BloodPressureCategory {
    use BloodPressureCategory::*;

    if systolic < 130 && diastolic < 85 {
        Normal
    } else if ((130..=139).contains(&systolic) && diastolic < 85)
        || (systolic < 130 && (85..=89).contains(&diastolic))
    {
        HighNormal
    } else if ((140..=159).contains(&systolic) && diastolic < 90)
        || (systolic < 140 && (90..=99).contains(&diastolic))
    {
        Grade1
    } else if ((160..=179).contains(&systolic) && diastolic < 100)
        || (systolic < 160 && (100..=109).contains(&diastolic))
        || systolic >= 180
        || diastolic >= 110
    {
        Grade2
    } else {
        // Both components in hypertensive bands at once
        match (eu_systolic_grade(systolic), eu_diastolic_grade(diastolic)) {
            (Grade1 | Grade2, Grade1 | Grade2) => Grade2,
            _ => Unknown,
        }
    }
}

fn eu_systolic_grade(systolic: i32) -> BloodPressureCategory {
    match systolic {
        i32::MIN..=129 => BloodPressureCategory::Normal,
        130..=139 => BloodPressureCategory::HighNormal,
        140..=159 => BloodPressureCategory::Grade1,
        _ => BloodPressureCategory::Grade2,
    }
}

fn eu_diastolic_grade(diastolic: i32) -> BloodPressureCategory {
    match diastolic {
        i32::MIN..=84 => BloodPressureCategory::Normal,
        85..=89 => BloodPressureCategory::HighNormal,
        90..=99 => BloodPressureCategory::Grade1,
        _ => BloodPressureCategory::Grade2,
    }
}

fn categorize_us(systolic: i32, diastolic: i32) -> BloodPressureCategory {
    use BloodPressureCategory::*;

    if systolic < 120 && diastolic < 80 {
        Normal
    } else if (120..=129).contains(&systolic) && diastolic <= 80 {
        // Elevated systolic with diastolic at the 80 boundary stays elevated
        HighNormal
    } else if (130..=139).contains(&systolic) || (80..=89).contains(&diastolic) {
        Grade1
    } else if systolic >= 140 || diastolic >= 90 {
        Grade2
    } else {
        Unknown
    }
}

/// Plausibility check for a complete blood pressure measurement
pub fn validate_blood_pressure(systolic: i32, diastolic: i32, pulse: i32) -> bool {
    (70..=300).contains(&systolic)
        && (40..=200).contains(&diastolic)
        && (30..=200).contains(&pulse)
        && systolic > diastolic
}

pub fn has_movement_error(mov: i32) -> bool {
    mov != 0
}

pub fn has_irregular_heartbeat(ihb: i32) -> bool {
    ihb != 0
}

pub fn risk_level(category: BloodPressureCategory) -> &'static str {
    match category {
        BloodPressureCategory::Normal => "Low",
        BloodPressureCategory::HighNormal => "Low-Medium",
        BloodPressureCategory::Grade1 => "Medium",
        BloodPressureCategory::Grade2 => "High",
        BloodPressureCategory::Unknown => "Unknown",
    }
}

pub fn health_recommendation(category: BloodPressureCategory) -> &'static str {
    match category {
        BloodPressureCategory::Normal => {
            "Your blood pressure is in the normal range. Maintain a healthy lifestyle."
        }
        BloodPressureCategory::HighNormal => {
            "Your blood pressure is high-normal. Consider lifestyle modifications and monitor regularly."
        }
        BloodPressureCategory::Grade1 => {
            "Stage 1 hypertension detected. Consult your healthcare provider and consider lifestyle changes."
        }
        BloodPressureCategory::Grade2 => {
            "Stage 2 hypertension detected. Seek immediate medical attention and treatment."
        }
        BloodPressureCategory::Unknown => {
            "Unable to categorize reading. Please verify measurements and consult healthcare provider."
        }
    }
}

pub fn spo2_category(spo2: i32) -> Spo2Category {
    match spo2 {
        95.. => Spo2Category::Normal,
        90..=94 => Spo2Category::Acceptable,
        85..=89 => Spo2Category::Low,
        1..=84 => Spo2Category::Critical,
        _ => Spo2Category::Unknown,
    }
}

pub fn pulse_rate_category(bpm: i32) -> PulseRateCategory {
    match bpm {
        i32::MIN..=59 => PulseRateCategory::Bradycardia,
        60..=100 => PulseRateCategory::Normal,
        101..=150 => PulseRateCategory::Tachycardia,
        _ => PulseRateCategory::SevereTachycardia,
    }
}

pub fn is_valid_spo2(spo2: i32) -> bool {
    (70..=100).contains(&spo2)
}

pub fn is_valid_pulse_rate(bpm: i32) -> bool {
    (40..=200).contains(&bpm)
}

/// Grade plethysmogram variability by its population standard deviation
pub fn signal_quality(samples: &[u8]) -> SignalQuality {
    if samples.is_empty() {
        return SignalQuality::NoSignal;
    }

    let count = samples.len() as f64;
    let mean = samples.iter().map(|&s| f64::from(s)).sum::<f64>() / count;
    let variance = samples
        .iter()
        .map(|&s| (f64::from(s) - mean).powi(2))
        .sum::<f64>()
        / count;
    let std_dev = variance.sqrt();

    if std_dev > 20.0 {
        SignalQuality::Excellent
    } else if std_dev > 15.0 {
        SignalQuality::Good
    } else if std_dev > 10.0 {
        SignalQuality::Fair
    } else if std_dev > 5.0 {
        SignalQuality::Poor
    } else {
        SignalQuality::NoSignal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use BloodPressureCategory::*;

    #[rstest]
    #[case(125, 80, Normal)]
    #[case(135, 80, HighNormal)]
    #[case(125, 87, HighNormal)]
    #[case(150, 85, Grade1)]
    #[case(135, 95, Grade1)]
    #[case(170, 95, Grade2)]
    #[case(150, 105, Grade2)]
    #[case(185, 70, Grade2)]
    #[case(120, 115, Grade2)]
    #[case(145, 95, Grade2)]
    #[case(135, 87, Unknown)]
    #[case(150, 92, Grade2)]
    fn eu_categories(#[case] sys: i32, #[case] dia: i32, #[case] expected: BloodPressureCategory) {
        assert_eq!(
            categorize_blood_pressure(sys, dia, BloodPressureStandard::Eu),
            expected
        );
    }

    #[rstest]
    #[case(115, 75, Normal)]
    #[case(125, 75, HighNormal)]
    #[case(125, 80, HighNormal)]
    #[case(135, 70, Grade1)]
    #[case(115, 85, Grade1)]
    #[case(145, 70, Grade2)]
    #[case(110, 95, Grade2)]
    fn us_categories(#[case] sys: i32, #[case] dia: i32, #[case] expected: BloodPressureCategory) {
        assert_eq!(
            categorize_blood_pressure(sys, dia, BloodPressureStandard::Us),
            expected
        );
    }

    #[test]
    fn unknown_only_for_combined_elevation() {
        for sys in (-10..320).step_by(7) {
            for dia in (-10..220).step_by(5) {
                let eu = categorize_blood_pressure(sys, dia, BloodPressureStandard::Eu);
                if eu == Unknown {
                    // Neither component alone decides the grade
                    assert!(sys >= 130 && dia >= 85, "{}/{}", sys, dia);
                    assert!(sys < 140 || dia < 90, "{}/{}", sys, dia);
                }
                let us = categorize_blood_pressure(sys, dia, BloodPressureStandard::Us);
                assert_ne!(us, Unknown, "{}/{}", sys, dia);
            }
        }
        assert_eq!(categorize_blood_pressure(135, 87, BloodPressureStandard::Eu), Unknown);
    }

    #[test]
    fn validates_blood_pressure_bounds() {
        assert!(validate_blood_pressure(120, 80, 70));
        assert!(!validate_blood_pressure(80, 80, 70));
        assert!(!validate_blood_pressure(69, 50, 70));
        assert!(!validate_blood_pressure(120, 80, 201));
    }

    #[test]
    fn labels_risk() {
        assert_eq!(risk_level(Grade2), "High");
        assert_eq!(risk_level(Unknown), "Unknown");
        assert!(health_recommendation(Grade1).starts_with("Stage 1"));
    }

    #[rstest]
    #[case(99, Spo2Category::Normal)]
    #[case(95, Spo2Category::Normal)]
    #[case(92, Spo2Category::Acceptable)]
    #[case(85, Spo2Category::Low)]
    #[case(40, Spo2Category::Critical)]
    #[case(0, Spo2Category::Unknown)]
    #[case(-3, Spo2Category::Unknown)]
    fn spo2_bands(#[case] spo2: i32, #[case] expected: Spo2Category) {
        assert_eq!(spo2_category(spo2), expected);
    }

    #[rstest]
    #[case(45, PulseRateCategory::Bradycardia)]
    #[case(60, PulseRateCategory::Normal)]
    #[case(100, PulseRateCategory::Normal)]
    #[case(150, PulseRateCategory::Tachycardia)]
    #[case(151, PulseRateCategory::SevereTachycardia)]
    fn pulse_rate_bands(#[case] bpm: i32, #[case] expected: PulseRateCategory) {
        assert_eq!(pulse_rate_category(bpm), expected);
    }

    #[test]
    fn oximetry_validity() {
        assert!(is_valid_spo2(70));
        assert!(!is_valid_spo2(101));
        assert!(is_valid_pulse_rate(200));
        assert!(!is_valid_pulse_rate(39));
    }

    #[rstest]
    #[case(&[], SignalQuality::NoSignal)]
    #[case(&[50, 50, 50, 50, 50], SignalQuality::NoSignal)]
    #[case(&[40, 60, 40, 60, 50], SignalQuality::Poor)]
    #[case(&[0, 60, 0, 60, 30], SignalQuality::Excellent)]
    fn grades_signal_quality(#[case] samples: &[u8], #[case] expected: SignalQuality) {
        assert_eq!(signal_quality(samples), expected);
    }
}
