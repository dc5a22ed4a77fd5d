/// Body composition estimation from weight, height, age, sex and impedance
///
/// The regressions and capping rules are the ones used by consumer scale
/// firmware. Every derived metric is clamped to its documented range before
/// it is returned, so the estimator never reports biologically impossible
/// values even when a regression overshoots.
use std::cmp::Ordering;

use super::scales::{PopulationReferenceTable, ScaleTable};
use crate::error::ValidationError;
use crate::models::{BodyComposition, FatMassToIdeal, Sex, UserProfile};

/// Set the value to a boundary if it overflows
fn check_value_overflow(value: f64, minimum: f64, maximum: f64) -> f64 {
    if value < minimum {
        minimum
    } else if value > maximum {
        maximum
    } else {
        value
    }
}

/// Validated inputs for one estimation run
///
/// Holds a snapshot of the profile; nothing is shared between runs.
#[derive(Clone, Copy)]
pub struct BodyMetrics {
    weight: f64,
    height: f64,
    age: f64,
    sex: Sex,
    impedance: f64,
    profile: UserProfile,
    scales: &'static PopulationReferenceTable,
}

impl BodyMetrics {
    /// Validate the inputs against the device / physiological sanity bounds
    pub fn new(
        profile: &UserProfile,
        impedance: f64,
        table: ScaleTable,
    ) -> Result<Self, ValidationError> {
        if profile.height > 220 {
            return Err(ValidationError::OutOfRange {
                field: "height",
                value: f64::from(profile.height),
                limit: ">220cm, or the scale is sleeping",
            });
        }
        if !(10.0..=200.0).contains(&profile.weight) {
            return Err(ValidationError::OutOfRange {
                field: "weight",
                value: profile.weight,
                limit: "<10kg and >200kg",
            });
        }
        if profile.age > 99 {
            return Err(ValidationError::OutOfRange {
                field: "age",
                value: f64::from(profile.age),
                limit: ">99 years",
            });
        }
        if impedance.is_nan() || impedance > 3000.0 {
            return Err(ValidationError::OutOfRange {
                field: "impedance",
                value: impedance,
                limit: ">3000 Ohm",
            });
        }

        Ok(BodyMetrics {
            weight: profile.weight,
            height: f64::from(profile.height),
            age: f64::from(profile.age),
            sex: profile.sex,
            impedance,
            profile: *profile,
            scales: table.reference(),
        })
    }

    fn is_female(&self) -> bool {
        self.sex == Sex::Female
    }

    /// Lean body mass coefficient, the shared intermediate of most formulas
    pub fn lbm_coefficient(&self) -> f64 {
        let mut lbm = (self.height * 9.058 / 100.0) * (self.height / 100.0);
        lbm += self.weight * 0.32 + 12.226;
        lbm -= self.impedance * 0.0068;
        lbm -= self.age * 0.0542;
        lbm
    }

    /// Lean body mass as reported, bounded by zero and the body weight
    pub fn lean_body_mass(&self) -> f64 {
        check_value_overflow(self.lbm_coefficient(), 0.0, self.weight)
    }

    pub fn bmr(&self) -> f64 {
        let bmr = if self.is_female() {
            let bmr = 864.6 + self.weight * 10.2036 - self.height * 0.39336 - self.age * 6.204;
            if bmr > 2996.0 {
                5000.0
            } else {
                bmr
            }
        } else {
            let bmr = 877.8 + self.weight * 14.916 - self.height * 0.726 - self.age * 8.976;
            if bmr > 2322.0 {
                5000.0
            } else {
                bmr
            }
        };

        check_value_overflow(bmr, 500.0, 10000.0)
    }

    pub fn fat_percentage(&self) -> f64 {
        // Constant removed from LBM
        let constant = match (self.sex, self.profile.age) {
            (Sex::Female, age) if age <= 49 => 9.25,
            (Sex::Female, _) => 7.25,
            (Sex::Male, _) => 0.8,
        };

        let height_boost = if self.height > 160.0 { 1.03 } else { 1.0 };
        let coefficient = match self.sex {
            Sex::Male if self.weight < 61.0 => 0.98,
            Sex::Female if self.weight > 60.0 => 0.96 * height_boost,
            Sex::Female if self.weight < 50.0 => 1.02 * height_boost,
            _ => 1.0,
        };

        let lbm = self.lbm_coefficient();
        let mut fat_percentage = (1.0 - ((lbm - constant) * coefficient) / self.weight) * 100.0;

        if fat_percentage > 63.0 {
            fat_percentage = 75.0;
        }

        check_value_overflow(fat_percentage, 5.0, 75.0)
    }

    pub fn water_percentage(&self) -> f64 {
        let mut water_percentage = (100.0 - self.fat_percentage()) * 0.7;
        let coefficient = if water_percentage <= 50.0 { 1.02 } else { 0.98 };

        if water_percentage * coefficient >= 65.0 {
            water_percentage = 75.0;
        } else {
            water_percentage *= coefficient;
        }

        check_value_overflow(water_percentage, 35.0, 75.0)
    }

    pub fn bone_mass(&self) -> f64 {
        let base = if self.is_female() { 0.245691014 } else { 0.18016894 };
        let mut bone_mass = (base - self.lbm_coefficient() * 0.05158) * -1.0;

        if bone_mass > 2.2 {
            bone_mass += 0.1;
        } else {
            bone_mass -= 0.1;
        }

        let cap = if self.is_female() { 5.1 } else { 5.2 };
        if bone_mass > cap {
            bone_mass = 8.0;
        }

        check_value_overflow(bone_mass, 0.5, 8.0)
    }

    pub fn muscle_mass(&self) -> f64 {
        let mut muscle_mass =
            self.weight - (self.fat_percentage() * 0.01) * self.weight - self.bone_mass();

        let cap = if self.is_female() { 84.0 } else { 93.5 };
        if muscle_mass >= cap {
            muscle_mass = 120.0;
        }

        check_value_overflow(muscle_mass, 10.0, 120.0)
    }

    /// Visceral fat rating
    ///
    /// Two regressions per sex, selected by a weight-versus-height condition.
    pub fn visceral_fat(&self) -> f64 {
        let (weight, height, age) = (self.weight, self.height, self.age);

        let vfal = if self.is_female() {
            if weight > (13.0 - height * 0.5) * -1.0 {
                let subsubcalc = (height * 1.45 + height * 0.1158 * height) - 120.0;
                let subcalc = weight * 500.0 / subsubcalc;
                (subcalc - 6.0) + age * 0.07
            } else {
                let subcalc = 0.691 + height * -0.0024 + height * -0.0024;
                ((height * 0.027 - subcalc * weight) * -1.0) + age * 0.07 - age
            }
        } else if height < weight * 1.6 {
            let subcalc = (height * 0.4 - height * (height * 0.0826)) * -1.0;
            (weight * 305.0) / (subcalc + 48.0) - 2.9 + age * 0.15
        } else {
            let subcalc = 0.765 + height * -0.0015;
            ((height * 0.143 - weight * subcalc) * -1.0) + age * 0.15 - 5.0
        };

        check_value_overflow(vfal, 1.0, 50.0)
    }

    pub fn bmi(&self) -> f64 {
        let meters = self.height / 100.0;
        check_value_overflow(self.weight / (meters * meters), 10.0, 90.0)
    }

    /// Ideal weight by the scale's own height-offset formula
    pub fn ideal_weight(&self) -> f64 {
        match self.sex {
            Sex::Female => (self.height - 70.0) * 0.6,
            Sex::Male => (self.height - 80.0) * 0.7,
        }
    }

    /// Ideal weight at BMI 22
    pub fn ideal_weight_from_bmi(&self) -> f64 {
        check_value_overflow(22.0 * self.height * self.height / 10000.0, 5.5, 198.0)
    }

    pub fn protein_percentage(&self) -> f64 {
        let protein = (self.muscle_mass() / self.weight) * 100.0 - self.water_percentage();
        check_value_overflow(protein, 5.0, 32.0)
    }

    /// Protein as the remainder after fat, water and bone, each truncated to
    /// two decimals
    pub fn protein_percentage_from_remainder(&self) -> f64 {
        let floor2 = |value: f64| (value * 100.0).floor() / 100.0;
        let protein = 100.0
            - floor2(self.fat_percentage())
            - floor2(self.water_percentage())
            - floor2(self.bone_mass() / self.weight * 100.0);
        check_value_overflow(protein, 5.0, 32.0)
    }

    pub fn metabolic_age(&self) -> f64 {
        let (weight, height, age, z) = (self.weight, self.height, self.age, self.impedance);
        let metabolic_age = match self.sex {
            Sex::Female => {
                height * -1.1165 + weight * 1.5784 + age * 0.4615 + z * 0.0415 + 83.2548
            }
            Sex::Male => height * -0.7471 + weight * 0.9161 + age * 0.4184 + z * 0.0517 + 54.2267,
        };

        check_value_overflow(metabolic_age, 15.0, 80.0)
    }

    /// Body type 1..=9 on the fat-percentage / muscle-mass grid
    ///
    /// Falls back to 5 ("balanced") when no reference band covers the user.
    pub fn body_type(&self) -> u8 {
        let (Some(fat_scale), Some(muscle_scale)) = (
            self.scales.fat_percentage_scale(self.profile.age, self.sex),
            self.scales.muscle_mass_scale(self.profile.height, self.sex),
        ) else {
            return 5;
        };

        let fat = self.fat_percentage();
        let factor = if fat > fat_scale[2] {
            0
        } else if fat < fat_scale[1] {
            2
        } else {
            1
        };

        let muscle = self.muscle_mass();
        if muscle > muscle_scale[1] {
            3 + factor * 3
        } else if muscle < muscle_scale[0] {
            1 + factor * 3
        } else {
            2 + factor * 3
        }
    }

    /// Fat mass (kg) to gain or lose to reach the top of the normal fat band
    pub fn fat_mass_to_ideal(&self) -> FatMassToIdeal {
        let Some(fat_scale) = self.scales.fat_percentage_scale(self.profile.age, self.sex) else {
            return FatMassToIdeal::Unknown;
        };

        let mass =
            self.weight * (self.fat_percentage() / 100.0) - self.weight * (fat_scale[2] / 100.0);
        match mass.partial_cmp(&0.0) {
            Some(Ordering::Less) => FatMassToIdeal::Gain(-mass),
            Some(_) => FatMassToIdeal::Lose(mass),
            None => FatMassToIdeal::Unknown,
        }
    }

    pub fn body_composition(&self) -> BodyComposition {
        BodyComposition {
            bmi: self.bmi(),
            fat_percentage: self.fat_percentage(),
            water_percentage: self.water_percentage(),
            bone_mass: self.bone_mass(),
            muscle_mass: self.muscle_mass(),
            visceral_fat: self.visceral_fat(),
            bmr: self.bmr(),
            protein_percentage: self.protein_percentage(),
            body_type: self.body_type(),
            metabolic_age: self.metabolic_age(),
            ideal_weight: self.ideal_weight(),
            fat_mass_to_ideal: self.fat_mass_to_ideal(),
            lean_body_mass: self.lean_body_mass(),
        }
    }
}

/// Full body composition against the default (Xiaomi) reference table
pub fn compute_body_composition(
    profile: &UserProfile,
    impedance: f64,
) -> Result<BodyComposition, ValidationError> {
    compute_body_composition_with(profile, impedance, ScaleTable::default())
}

pub fn compute_body_composition_with(
    profile: &UserProfile,
    impedance: f64,
    table: ScaleTable,
) -> Result<BodyComposition, ValidationError> {
    Ok(BodyMetrics::new(profile, impedance, table)?.body_composition())
}
