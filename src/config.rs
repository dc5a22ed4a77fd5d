use log::{debug, info, warn};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::str::FromStr;
use time::{format_description, Date, OffsetDateTime};
use url::Url;

use crate::body::ScaleTable;
use crate::error::ConfigError;
use crate::models::{BloodPressureStandard, Sex, UserProfile};

const DEFAULT_BROKER_URL: &str = "mqtt://localhost:1883";
const DEFAULT_CHANNEL_CAPACITY: usize = 64;
const DEFAULT_SCAN_DURATION_SECS: u64 = 20;
const FALLBACK_USER: &str = "unknown@example.com";

/// A person who steps on the scale, matched by weight window
#[derive(Debug, Clone, PartialEq)]
pub struct UserEntry {
    pub id: String,
    pub sex: Sex,
    pub height: u32,
    pub age: u32,
    pub min_weight: f64,
    pub max_weight: f64,
}

impl UserEntry {
    pub fn matches_weight(&self, weight: f64) -> bool {
        self.min_weight <= weight && weight <= self.max_weight
    }

    /// Snapshot of this user's profile at the measured weight
    pub fn profile(&self, weight: f64) -> UserProfile {
        UserProfile {
            weight,
            height: self.height,
            age: self.age,
            sex: self.sex,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BridgeConfig {
    pub devices: HashMap<String, String>,
    pub users: Vec<UserEntry>,
    pub default_user: String,
    pub bp_standard: BloodPressureStandard,
    pub scale_table: ScaleTable,
    pub broker_url: Url,
    pub channel_capacity: usize,
    pub scan_duration_secs: u64,
}

impl BridgeConfig {
    pub fn new() -> Result<Self, ConfigError> {
        // Load environment variables
        dotenv::dotenv().ok();

        let current_year = OffsetDateTime::now_utc().year();
        Self::from_vars(env::vars(), current_year)
    }

    /// Build the configuration from key/value pairs
    ///
    /// `current_year` anchors the age computed from a user's birth date.
    pub fn from_vars<I>(vars: I, current_year: i32) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();

        let devices = parse_devices(&vars)?;
        let users = parse_users(&vars, current_year)?;

        let default_user = vars
            .get("DEFAULT_USER")
            .map(|user| user.trim().to_string())
            .filter(|user| !user.is_empty())
            .or_else(|| users.first().map(|user| user.id.clone()))
            .unwrap_or_else(|| FALLBACK_USER.to_string());

        let bp_standard = match vars.get("BP_STANDARD").map(|s| s.trim().to_ascii_lowercase()) {
            None => BloodPressureStandard::default(),
            Some(s) if s == "eu" => BloodPressureStandard::Eu,
            Some(s) if s == "us" => BloodPressureStandard::Us,
            Some(other) => return Err(invalid("BP_STANDARD", &other)),
        };

        let scale_table = match vars.get("SCALE_TABLE") {
            None => ScaleTable::default(),
            Some(value) => value
                .parse()
                .map_err(|_| invalid("SCALE_TABLE", value))?,
        };

        let broker_url = Url::parse(
            vars.get("BROKER_URL")
                .map(String::as_str)
                .unwrap_or(DEFAULT_BROKER_URL),
        )?;

        let channel_capacity = parse_or(&vars, "CHANNEL_CAPACITY", DEFAULT_CHANNEL_CAPACITY)?;
        if channel_capacity == 0 {
            return Err(invalid("CHANNEL_CAPACITY", "0"));
        }
        let scan_duration_secs = parse_or(&vars, "SCAN_DURATION_SECS", DEFAULT_SCAN_DURATION_SECS)?;

        info!(
            "Loaded {} device(s), {} user(s), broker {}",
            devices.len(),
            users.len(),
            broker_url
        );

        Ok(BridgeConfig {
            devices,
            users,
            default_user,
            bp_standard,
            scale_table,
            broker_url,
            channel_capacity,
            scan_duration_secs,
        })
    }

    /// Display name of a configured device, or "Unknown"
    pub fn device_name(&self, address: &str) -> String {
        self.devices
            .get(&address.to_uppercase())
            .cloned()
            .unwrap_or_else(|| "Unknown".to_string())
    }
}

/// First user whose weight window contains `weight`
pub fn user_for_weight(users: &[UserEntry], weight: f64) -> Option<&UserEntry> {
    users.iter().find(|user| user.matches_weight(weight))
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_or<T: FromStr>(
    vars: &HashMap<String, String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError> {
    match vars.get(key) {
        Some(value) => value.trim().parse().map_err(|_| invalid(key, value)),
        None => Ok(default),
    }
}

fn parse_devices(vars: &HashMap<String, String>) -> Result<HashMap<String, String>, ConfigError> {
    let mut devices = HashMap::new();

    // Try HEALTH_DEVICES format first
    if let Some(list) = vars.get("HEALTH_DEVICES") {
        debug!("Found HEALTH_DEVICES: '{}'", list);
        for pair in list.split(',') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }
            match pair.split_once('=') {
                Some((mac, name)) if !mac.trim().is_empty() && !name.trim().is_empty() => {
                    devices.insert(mac.trim().to_uppercase(), name.trim().to_string());
                }
                _ => warn!("Ignoring malformed device entry '{}'", pair),
            }
        }
    } else {
        // Fallback to individual environment variables
        for (key, mac) in vars {
            if let Some(index) = key
                .strip_prefix("HEALTH_DEVICE_")
                .and_then(|s| s.strip_suffix("_MAC"))
            {
                let name_key = format!("HEALTH_DEVICE_{}_NAME", index);
                if let Some(name) = vars.get(&name_key) {
                    devices.insert(mac.trim().to_uppercase(), name.trim().to_string());
                }
            }
        }
    }

    for (mac, name) in &devices {
        debug!("Device: {} -> {}", mac, name);
    }

    if devices.is_empty() {
        return Err(ConfigError::NoDevices);
    }

    Ok(devices)
}

fn parse_users(
    vars: &HashMap<String, String>,
    current_year: i32,
) -> Result<Vec<UserEntry>, ConfigError> {
    // Ordered by index so the first matching weight window is stable
    let mut indices = BTreeMap::new();
    for key in vars.keys() {
        if let Some(index) = key
            .strip_prefix("HEALTH_USER_")
            .and_then(|s| s.strip_suffix("_EMAIL"))
        {
            if let Ok(n) = index.parse::<u32>() {
                indices.insert(n, index.to_string());
            }
        }
    }

    let mut users = Vec::with_capacity(indices.len());
    for index in indices.values() {
        let key = |field: &str| format!("HEALTH_USER_{}_{}", index, field);
        let get = |field: &str| -> Result<String, ConfigError> {
            let key = key(field);
            vars.get(&key)
                .map(|v| v.trim().to_string())
                .ok_or(ConfigError::Missing(key))
        };
        let parse = |field: &str| -> Result<f64, ConfigError> {
            let value = get(field)?;
            value.parse().map_err(|_| invalid(&key(field), &value))
        };

        let id = get("EMAIL")?;
        let sex_value = get("SEX")?;
        let sex: Sex = sex_value
            .parse()
            .map_err(|_| invalid(&key("SEX"), &sex_value))?;
        let height_value = get("HEIGHT")?;
        let height: u32 = height_value
            .parse()
            .map_err(|_| invalid(&key("HEIGHT"), &height_value))?;

        let age = match vars.get(&key("AGE")) {
            Some(age) => age.trim().parse().map_err(|_| invalid(&key("AGE"), age))?,
            None => {
                let birthdate = get("BIRTHDATE")?;
                age_from_birthdate(&birthdate, current_year)
                    .ok_or_else(|| invalid(&key("BIRTHDATE"), &birthdate))?
            }
        };

        let min_weight = parse("MIN_WEIGHT")?;
        let max_weight = parse("MAX_WEIGHT")?;
        if min_weight > max_weight {
            return Err(invalid(
                &key("MIN_WEIGHT"),
                &format!("{} > {}", min_weight, max_weight),
            ));
        }

        debug!(
            "User {}: {:?}, {} cm, {} years, {}-{} kg",
            id, sex, height, age, min_weight, max_weight
        );
        users.push(UserEntry {
            id,
            sex,
            height,
            age,
            min_weight,
            max_weight,
        });
    }

    Ok(users)
}

/// Age in whole years from a DD-MM-YYYY birth date, by calendar year only
pub fn age_from_birthdate(birthdate: &str, current_year: i32) -> Option<u32> {
    let format = format_description::parse("[day]-[month]-[year]").ok()?;
    let date = Date::parse(birthdate.trim(), &format).ok()?;
    u32::try_from(current_year - date.year()).ok()
}
