// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fs::read_to_string;
use std::path::Path;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::select::MAX_QUEUE_LENGTH;
use crate::types::rarity::Rarity;

/// Name of the optional configuration file in a collection directory.
pub const CONFIG_FILE_NAME: &str = "kanjiquest.toml";

#[derive(Clone, Default, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub session: SessionConfig,
    pub encounter: EncounterConfig,
    pub leveling: LevelingConfig,
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Number of choices in a multiple-choice question, answer included.
    pub choice_count: usize,
    /// Questions per session when none is requested.
    pub question_count: usize,
    /// Fixed seed for every random draw. Unset means a fresh seed per run.
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            choice_count: 4,
            question_count: 10,
            seed: None,
        }
    }
}

/// One value per rarity tier.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct PerRarity<T> {
    pub common: T,
    pub uncommon: T,
    pub rare: T,
    pub epic: T,
    pub legendary: T,
}

impl<T: Copy> PerRarity<T> {
    pub fn get(&self, rarity: Rarity) -> T {
        match rarity {
            Rarity::Common => self.common,
            Rarity::Uncommon => self.uncommon,
            Rarity::Rare => self.rare,
            Rarity::Epic => self.epic,
            Rarity::Legendary => self.legendary,
        }
    }

    /// Values from the lowest tier to the highest.
    pub fn in_order(&self) -> [T; 5] {
        Rarity::ALL.map(|rarity| self.get(rarity))
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EncounterConfig {
    /// Chance of each tier firing on a roll.
    pub rates: PerRarity<f64>,
    /// Rolls without that tier after which it fires unconditionally.
    pub thresholds: PerRarity<u32>,
}

impl Default for EncounterConfig {
    fn default() -> Self {
        Self {
            rates: PerRarity {
                common: 0.40,
                uncommon: 0.25,
                rare: 0.12,
                epic: 0.05,
                legendary: 0.02,
            },
            thresholds: PerRarity {
                common: 3,
                uncommon: 5,
                rare: 12,
                epic: 25,
                legendary: 50,
            },
        }
    }
}

impl EncounterConfig {
    pub fn validate(&self) -> Fallible<()> {
        let rates = self.rates.in_order();
        for rate in rates {
            if !(0.0..=1.0).contains(&rate) {
                return fail(format!("encounter rate {rate} is outside 0..=1."));
            }
        }
        if rates.windows(2).any(|w| w[1] > w[0]) {
            return fail("encounter rates must not increase with rarity.");
        }
        let thresholds = self.thresholds.in_order();
        if thresholds[0] == 0 {
            return fail("pity thresholds must be positive.");
        }
        if thresholds.windows(2).any(|w| w[1] <= w[0]) {
            return fail("pity thresholds must strictly increase with rarity.");
        }
        Ok(())
    }
}

#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelingConfig {
    pub xp_correct: u32,
    pub xp_wrong: u32,
    /// Combo at which correct answers earn half again their XP.
    pub combo_threshold: u32,
}

impl Default for LevelingConfig {
    fn default() -> Self {
        Self {
            xp_correct: 10,
            xp_wrong: 2,
            combo_threshold: 5,
        }
    }
}

impl Config {
    /// Loads `kanjiquest.toml` from the directory, or the defaults if the
    /// file does not exist.
    pub fn load(directory: &Path) -> Fallible<Self> {
        let path = directory.join(CONFIG_FILE_NAME);
        let config = if path.exists() {
            log::debug!("Loading configuration from {path:?}.");
            let content = read_to_string(&path)?;
            Self::parse(&content)?
        } else {
            Self::default()
        };
        Ok(config)
    }

    pub fn parse(content: &str) -> Fallible<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Fallible<()> {
        if self.session.choice_count < 2 {
            return fail("choice_count must be at least 2.");
        }
        if self.session.question_count == 0 {
            return fail("question_count must be at least 1.");
        }
        if self.session.question_count > MAX_QUEUE_LENGTH {
            return fail(format!("question_count must be at most {MAX_QUEUE_LENGTH}."));
        }
        self.encounter.validate()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_defaults_are_valid() -> Fallible<()> {
        Config::default().validate()
    }

    #[test]
    fn test_partial_file() -> Fallible<()> {
        let config = Config::parse(
            r#"
            [session]
            seed = 7

            [leveling]
            xp_correct = 15
            "#,
        )?;
        assert_eq!(config.session.seed, Some(7));
        assert_eq!(config.session.choice_count, 4);
        assert_eq!(config.leveling.xp_correct, 15);
        assert_eq!(config.leveling.xp_wrong, 2);
        assert_eq!(config.encounter, EncounterConfig::default());
        Ok(())
    }

    #[test]
    fn test_rejects_bad_tables() {
        let increasing_rates = r#"
            [encounter.rates]
            common = 0.1
            uncommon = 0.2
            rare = 0.1
            epic = 0.05
            legendary = 0.01
        "#;
        assert!(Config::parse(increasing_rates).is_err());
        let flat_thresholds = r#"
            [encounter.thresholds]
            common = 3
            uncommon = 3
            rare = 12
            epic = 25
            legendary = 50
        "#;
        assert!(Config::parse(flat_thresholds).is_err());
        assert!(Config::parse("[session]\nchoice_count = 1").is_err());
    }

    #[test]
    fn test_question_count_is_bounded() {
        assert!(Config::parse("[session]\nquestion_count = 0\n").is_err());
        assert!(Config::parse("[session]\nquestion_count = 500\n").is_ok());
        assert!(Config::parse("[session]\nquestion_count = 501\n").is_err());
    }

    #[test]
    fn test_zero_rates_are_allowed() -> Fallible<()> {
        let mut config = EncounterConfig::default();
        config.rates = PerRarity {
            common: 0.0,
            uncommon: 0.0,
            rare: 0.0,
            epic: 0.0,
            legendary: 0.0,
        };
        config.validate()
    }

    #[test]
    fn test_missing_file_uses_defaults() -> Fallible<()> {
        let dir = tempdir()?;
        assert_eq!(Config::load(dir.path())?, Config::default());
        Ok(())
    }
}
