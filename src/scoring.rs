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

//! XP rewards for answers, and player level from total XP.

use serde::Serialize;

use crate::types::mode::GameMode;

const NEW_CARD_BONUS: f64 = 1.5;

#[derive(Clone, Copy, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub base_xp: u32,
    pub combo_multiplier: f64,
    pub new_card_bonus: f64,
    pub total_xp: u32,
}

pub fn score(quality: u8, combo: u32, is_new: bool, mode: GameMode) -> ScoreResult {
    let base_xp = base_xp(quality, mode);
    let combo_multiplier = combo_multiplier(combo);
    let new_card_bonus = if is_new { NEW_CARD_BONUS } else { 1.0 };
    let total = f64::from(base_xp) * combo_multiplier * new_card_bonus;
    ScoreResult {
        base_xp,
        combo_multiplier,
        new_card_bonus,
        total_xp: total.floor() as u32,
    }
}

fn base_xp(quality: u8, mode: GameMode) -> u32 {
    // Rewards for quality 5, 4 and 3. Anything lower earns nothing.
    let table: [u32; 3] = match mode {
        GameMode::Writing | GameMode::KanaWriting => [20, 15, 10],
        GameMode::RadicalBuilder => [18, 14, 10],
        GameMode::KanaRecognition | GameMode::RadicalRecognition => [10, 8, 5],
        GameMode::Recognition => [15, 12, 8],
    };
    match quality {
        5.. => table[0],
        4 => table[1],
        3 => table[2],
        _ => 0,
    }
}

fn combo_multiplier(combo: u32) -> f64 {
    match combo {
        10.. => 2.0,
        5..=9 => 1.5,
        3..=4 => 1.2,
        _ => 1.0,
    }
}

/// Total XP needed to reach a player level.
pub fn xp_for_level(level: u32) -> u64 {
    let level = u64::from(level);
    level * level * 50
}

/// The player level reached with the given total XP. Never below 1.
pub fn level_for_xp(total_xp: u64) -> u32 {
    let mut level = 1;
    while xp_for_level(level + 1) <= total_xp {
        level += 1;
    }
    level
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODES: [GameMode; 6] = [
        GameMode::Recognition,
        GameMode::Writing,
        GameMode::KanaRecognition,
        GameMode::KanaWriting,
        GameMode::RadicalRecognition,
        GameMode::RadicalBuilder,
    ];

    #[test]
    fn test_base_tables() {
        assert_eq!(score(5, 0, false, GameMode::Writing).total_xp, 20);
        assert_eq!(score(4, 0, false, GameMode::RadicalBuilder).total_xp, 14);
        assert_eq!(score(3, 0, false, GameMode::KanaRecognition).total_xp, 5);
        assert_eq!(score(4, 0, false, GameMode::Recognition).total_xp, 12);
        assert_eq!(score(2, 10, true, GameMode::Writing).total_xp, 0);
    }

    #[test]
    fn test_multipliers() {
        let result = score(4, 5, true, GameMode::Recognition);
        assert_eq!(result.base_xp, 12);
        assert_eq!(result.combo_multiplier, 1.5);
        assert_eq!(result.new_card_bonus, 1.5);
        assert_eq!(result.total_xp, 27);
        // 8 * 1.2 = 9.6, floored.
        assert_eq!(score(3, 3, false, GameMode::Recognition).total_xp, 9);
        assert_eq!(score(5, 12, false, GameMode::KanaWriting).total_xp, 40);
    }

    #[test]
    fn test_monotonic_in_combo() {
        for mode in MODES {
            for quality in 3..=5 {
                let mut last = 0;
                for combo in 0..15 {
                    let xp = score(quality, combo, false, mode).total_xp;
                    assert!(xp >= last);
                    last = xp;
                }
            }
        }
    }

    #[test]
    fn test_monotonic_in_quality() {
        for mode in MODES {
            let mut last = 0;
            for quality in 0..=5 {
                let xp = score(quality, 0, false, mode).total_xp;
                assert!(xp >= last);
                last = xp;
            }
        }
    }

    #[test]
    fn test_player_level() {
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(199), 1);
        assert_eq!(level_for_xp(200), 2);
        assert_eq!(level_for_xp(450), 3);
    }
}
