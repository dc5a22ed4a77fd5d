/// Population reference tables for the two supported scale firmwares
///
/// Each table is static data banded by age, height or weight, with separate
/// reference vectors per sex. The numbers are the vendor firmware values and
/// must not be "corrected".
use crate::models::Sex;

/// Which vendor calibration the reference values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScaleTable {
    #[default]
    Xiaomi,
    Holtek,
}

impl std::str::FromStr for ScaleTable {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "xiaomi" => Ok(ScaleTable::Xiaomi),
            "holtek" => Ok(ScaleTable::Holtek),
            other => Err(format!("unknown scale table '{}'", other)),
        }
    }
}

/// Reference vector for ages in `[min, max)`
struct AgeBand<V> {
    min: u32,
    max: u32,
    female: V,
    male: V,
}

/// Reference vector applying from a per-sex lower bound upwards
struct ThresholdBand<K, V> {
    female_min: K,
    male_min: K,
    female: V,
    male: V,
}

impl<K: PartialOrd + Copy, V: Copy> ThresholdBand<K, V> {
    fn applies(&self, value: K, sex: Sex) -> bool {
        match sex {
            Sex::Female => value >= self.female_min,
            Sex::Male => value >= self.male_min,
        }
    }

    fn pick(&self, sex: Sex) -> V {
        match sex {
            Sex::Female => self.female,
            Sex::Male => self.male,
        }
    }
}

enum BoneMassBands {
    // Explicit [low, high] range per band
    Ranges(&'static [ThresholdBand<f64, [f64; 2]>]),
    // Optimal value per band; the range is optimal ± 1 kg
    Optimal(&'static [ThresholdBand<f64, f64>]),
}

/// BMR coefficient (kcal per kg) for ages below `max_age`
struct BmrBand {
    max_age: u32,
    female: f64,
    male: f64,
}

pub const BODY_TYPE_NAMES: [&str; 9] = [
    "obese",
    "overweight",
    "thick-set",
    "lack-exercise",
    "balanced",
    "balanced-muscular",
    "skinny",
    "balanced-skinny",
    "skinny-muscular",
];

pub struct PopulationReferenceTable {
    bmi: &'static [f64],
    fat: &'static [AgeBand<[f64; 4]>],
    muscle: &'static [ThresholdBand<u32, [f64; 2]>],
    water_female: [f64; 2],
    water_male: [f64; 2],
    bone: BoneMassBands,
    bmr: &'static [BmrBand],
}

pub static XIAOMI: PopulationReferenceTable = PopulationReferenceTable {
    bmi: &[18.5, 25.0, 28.0, 32.0],
    fat: &[
        AgeBand { min: 0, max: 12, female: [12.0, 21.0, 30.0, 34.0], male: [7.0, 16.0, 25.0, 30.0] },
        AgeBand { min: 12, max: 14, female: [15.0, 24.0, 33.0, 37.0], male: [7.0, 16.0, 25.0, 30.0] },
        AgeBand { min: 14, max: 16, female: [18.0, 27.0, 36.0, 40.0], male: [7.0, 16.0, 25.0, 30.0] },
        AgeBand { min: 16, max: 18, female: [20.0, 28.0, 37.0, 41.0], male: [7.0, 16.0, 25.0, 30.0] },
        AgeBand { min: 18, max: 40, female: [21.0, 28.0, 35.0, 40.0], male: [11.0, 17.0, 22.0, 27.0] },
        AgeBand { min: 40, max: 60, female: [22.0, 29.0, 36.0, 41.0], male: [12.0, 18.0, 23.0, 28.0] },
        AgeBand { min: 60, max: 100, female: [23.0, 30.0, 37.0, 42.0], male: [14.0, 20.0, 25.0, 30.0] },
    ],
    muscle: &[
        ThresholdBand { female_min: 160, male_min: 170, female: [36.5, 42.6], male: [49.4, 59.5] },
        ThresholdBand { female_min: 150, male_min: 160, female: [32.9, 37.6], male: [44.0, 52.5] },
        ThresholdBand { female_min: 0, male_min: 0, female: [29.1, 34.8], male: [38.5, 46.6] },
    ],
    water_female: [45.0, 60.1],
    water_male: [55.0, 65.1],
    bone: BoneMassBands::Ranges(&[
        ThresholdBand { female_min: 60.0, male_min: 75.0, female: [1.8, 3.9], male: [2.0, 4.2] },
        ThresholdBand { female_min: 45.0, male_min: 60.0, female: [1.5, 3.8], male: [1.9, 4.1] },
        ThresholdBand { female_min: 0.0, male_min: 0.0, female: [1.3, 3.6], male: [1.6, 3.9] },
    ]),
    bmr: &[
        BmrBand { max_age: 30, female: 21.24, male: 21.6 },
        BmrBand { max_age: 50, female: 19.53, male: 20.07 },
        BmrBand { max_age: 100, female: 18.63, male: 19.35 },
    ],
};

pub static HOLTEK: PopulationReferenceTable = PopulationReferenceTable {
    bmi: &[18.5, 25.0, 30.0],
    fat: &[
        AgeBand { min: 0, max: 21, female: [18.0, 23.0, 30.0, 35.0], male: [8.0, 14.0, 21.0, 25.0] },
        AgeBand { min: 21, max: 26, female: [19.0, 24.0, 30.0, 35.0], male: [10.0, 15.0, 22.0, 26.0] },
        AgeBand { min: 26, max: 31, female: [20.0, 25.0, 31.0, 36.0], male: [11.0, 16.0, 21.0, 27.0] },
        AgeBand { min: 31, max: 36, female: [21.0, 26.0, 33.0, 36.0], male: [13.0, 17.0, 25.0, 28.0] },
        AgeBand { min: 36, max: 41, female: [22.0, 27.0, 34.0, 37.0], male: [15.0, 20.0, 26.0, 29.0] },
        AgeBand { min: 41, max: 46, female: [23.0, 28.0, 35.0, 38.0], male: [16.0, 22.0, 27.0, 30.0] },
        AgeBand { min: 46, max: 51, female: [24.0, 30.0, 36.0, 38.0], male: [17.0, 23.0, 29.0, 31.0] },
        AgeBand { min: 51, max: 56, female: [26.0, 31.0, 36.0, 39.0], male: [19.0, 25.0, 30.0, 33.0] },
        AgeBand { min: 56, max: 100, female: [27.0, 32.0, 37.0, 40.0], male: [21.0, 26.0, 31.0, 34.0] },
    ],
    muscle: &[
        ThresholdBand { female_min: 170, male_min: 170, female: [36.5, 42.5], male: [49.5, 59.4] },
        ThresholdBand { female_min: 160, male_min: 160, female: [32.9, 37.5], male: [44.0, 52.4] },
        ThresholdBand { female_min: 0, male_min: 0, female: [29.1, 34.7], male: [38.5, 46.5] },
    ],
    water_female: [53.0, 67.0],
    water_male: [53.0, 67.0],
    bone: BoneMassBands::Optimal(&[
        ThresholdBand { female_min: 60.0, male_min: 75.0, female: 2.5, male: 3.2 },
        ThresholdBand { female_min: 45.0, male_min: 69.0, female: 2.2, male: 2.9 },
        ThresholdBand { female_min: 0.0, male_min: 0.0, female: 1.8, male: 2.5 },
    ]),
    bmr: &[
        BmrBand { max_age: 12, female: 34.0, male: 36.0 },
        BmrBand { max_age: 15, female: 29.0, male: 30.0 },
        BmrBand { max_age: 17, female: 24.0, male: 26.0 },
        BmrBand { max_age: 29, female: 22.0, male: 23.0 },
        BmrBand { max_age: 50, female: 20.0, male: 21.0 },
        BmrBand { max_age: 120, female: 19.0, male: 20.0 },
    ],
};

impl ScaleTable {
    pub fn reference(self) -> &'static PopulationReferenceTable {
        match self {
            ScaleTable::Xiaomi => &XIAOMI,
            ScaleTable::Holtek => &HOLTEK,
        }
    }
}

impl PopulationReferenceTable {
    pub fn bmi_scale(&self) -> &'static [f64] {
        self.bmi
    }

    /// Fat percentage thresholds `[low, normal, high, very high]` for the age band
    pub fn fat_percentage_scale(&self, age: u32, sex: Sex) -> Option<[f64; 4]> {
        self.fat
            .iter()
            .find(|band| age >= band.min && age < band.max)
            .map(|band| match sex {
                Sex::Female => band.female,
                Sex::Male => band.male,
            })
    }

    /// Muscle mass range `[low, high]` (kg) for the height band
    pub fn muscle_mass_scale(&self, height: u32, sex: Sex) -> Option<[f64; 2]> {
        self.muscle
            .iter()
            .find(|band| band.applies(height, sex))
            .map(|band| band.pick(sex))
    }

    pub fn water_percentage_scale(&self, sex: Sex) -> [f64; 2] {
        match sex {
            Sex::Female => self.water_female,
            Sex::Male => self.water_male,
        }
    }

    pub fn visceral_fat_scale(&self) -> [f64; 2] {
        [10.0, 15.0]
    }

    /// Bone mass range `[low, high]` (kg) for the weight band
    pub fn bone_mass_scale(&self, weight: f64, sex: Sex) -> Option<[f64; 2]> {
        match self.bone {
            BoneMassBands::Ranges(bands) => bands
                .iter()
                .find(|band| band.applies(weight, sex))
                .map(|band| band.pick(sex)),
            BoneMassBands::Optimal(bands) => bands
                .iter()
                .find(|band| band.applies(weight, sex))
                .map(|band| {
                    let optimal = band.pick(sex);
                    [optimal - 1.0, optimal + 1.0]
                }),
        }
    }

    /// Reference basal metabolic rate (kcal) for the age band and weight
    pub fn bmr_scale(&self, age: u32, weight: f64, sex: Sex) -> Option<f64> {
        self.bmr
            .iter()
            .find(|band| age < band.max_age)
            .map(|band| match sex {
                Sex::Female => weight * band.female,
                Sex::Male => weight * band.male,
            })
    }

    pub fn protein_percentage_scale(&self) -> [f64; 2] {
        [16.0, 20.0]
    }

    /// Weight (kg) at each BMI threshold for the given height
    pub fn ideal_weight_scale(&self, height: u32) -> Vec<f64> {
        let height = f64::from(height);
        self.bmi
            .iter()
            .map(|bmi| (bmi * height) * height / 10000.0)
            .collect()
    }

    pub fn body_score_scale(&self) -> [f64; 4] {
        [50.0, 60.0, 80.0, 90.0]
    }
}

/// Label for a body type in `1..=9`
pub fn body_type_name(body_type: u8) -> Option<&'static str> {
    body_type
        .checked_sub(1)
        .and_then(|index| BODY_TYPE_NAMES.get(usize::from(index)))
        .copied()
}
