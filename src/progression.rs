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

//! What a player level unlocks.

use serde::Serialize;

use crate::error::Fallible;
use crate::repo::CardRepository;
use crate::repo::Catalog;
use crate::types::card::CardState;
use crate::types::item_kind::ItemKind;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerTier {
    pub name: &'static str,
    pub name_jp: &'static str,
    /// The first level of the tier.
    pub min_level: u32,
    /// Kanji grades available to new questions and encounters.
    pub unlocked_grades: &'static [u8],
}

pub const TIERS: [PlayerTier; 8] = [
    PlayerTier {
        name: "Beginner",
        name_jp: "入門",
        min_level: 1,
        unlocked_grades: &[1],
    },
    PlayerTier {
        name: "Novice",
        name_jp: "初級",
        min_level: 5,
        unlocked_grades: &[1, 2],
    },
    PlayerTier {
        name: "Apprentice",
        name_jp: "見習い",
        min_level: 10,
        unlocked_grades: &[1, 2, 3],
    },
    PlayerTier {
        name: "Intermediate",
        name_jp: "中級",
        min_level: 15,
        unlocked_grades: &[1, 2, 3, 4],
    },
    PlayerTier {
        name: "Advanced",
        name_jp: "上級",
        min_level: 20,
        unlocked_grades: &[1, 2, 3, 4, 5],
    },
    PlayerTier {
        name: "Scholar",
        name_jp: "学者",
        min_level: 25,
        unlocked_grades: &[1, 2, 3, 4, 5, 6],
    },
    PlayerTier {
        name: "Expert",
        name_jp: "達人",
        min_level: 30,
        unlocked_grades: &[1, 2, 3, 4, 5, 6, 8],
    },
    PlayerTier {
        name: "Master",
        name_jp: "師範",
        min_level: 37,
        unlocked_grades: &[1, 2, 3, 4, 5, 6, 8],
    },
];

pub fn tier_for_level(level: u32) -> &'static PlayerTier {
    TIERS
        .iter()
        .rev()
        .find(|tier| level >= tier.min_level)
        .unwrap_or(&TIERS[0])
}

pub fn unlocked_grades(level: u32) -> &'static [u8] {
    tier_for_level(level).unlocked_grades
}

/// Highest radical priority introduced at a level: essential radicals
/// first, then common, then the rest.
pub fn max_radical_priority(level: u32) -> u8 {
    match level {
        0..=5 => 1,
        6..=15 => 2,
        _ => 3,
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MasteryLevel {
    Beginning,
    Developing,
    Proficient,
    Advanced,
}

impl MasteryLevel {
    pub fn label_jp(&self) -> &'static str {
        match self {
            MasteryLevel::Beginning => "初歩",
            MasteryLevel::Developing => "発展中",
            MasteryLevel::Proficient => "習熟",
            MasteryLevel::Advanced => "上級",
        }
    }
}

/// How well a player knows one kanji grade.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeMastery {
    pub grade: u8,
    pub total_kanji: usize,
    /// Kanji of the grade reviewed at least once.
    pub studied_count: usize,
    pub mastered_count: usize,
    /// Mean share of correct reviews over studied kanji, in `0.0..=1.0`.
    pub average_accuracy: f64,
    /// Share of the grade studied, in `0.0..=1.0`.
    pub coverage: f64,
}

impl GradeMastery {
    pub fn score(&self) -> f64 {
        self.coverage * 0.4 + self.average_accuracy * 0.6
    }

    pub fn level(&self) -> MasteryLevel {
        match self.score() {
            s if s >= 0.85 => MasteryLevel::Advanced,
            s if s >= 0.70 => MasteryLevel::Proficient,
            s if s >= 0.50 => MasteryLevel::Developing,
            _ => MasteryLevel::Beginning,
        }
    }

    /// Share of new kanji drawn from the next grade up.
    pub fn new_grade_ratio(&self) -> f64 {
        match self.level() {
            MasteryLevel::Advanced => 0.40,
            MasteryLevel::Proficient => 0.20,
            MasteryLevel::Developing => 0.10,
            MasteryLevel::Beginning => 0.0,
        }
    }
}

/// Computes the mastery of a grade from its kanji cards.
pub fn grade_mastery<S>(store: &S, grade: u8) -> Fallible<GradeMastery>
where
    S: CardRepository + Catalog + ?Sized,
{
    let kanji = store.kanji_by_grade(grade)?;
    let mut studied_count = 0;
    let mut mastered_count = 0;
    let mut accuracy_sum = 0.0;
    for k in &kanji {
        let Some(card) = store.get_card(ItemKind::Kanji, k.id)? else {
            continue;
        };
        if card.total_reviews == 0 {
            continue;
        }
        studied_count += 1;
        if card.state == CardState::Mastered {
            mastered_count += 1;
        }
        accuracy_sum += f64::from(card.correct_reviews) / f64::from(card.total_reviews);
    }
    let average_accuracy = if studied_count > 0 {
        accuracy_sum / studied_count as f64
    } else {
        0.0
    };
    let coverage = if kanji.is_empty() {
        0.0
    } else {
        studied_count as f64 / kanji.len() as f64
    };
    let mastery = GradeMastery {
        grade,
        total_kanji: kanji.len(),
        studied_count,
        mastered_count,
        average_accuracy,
        coverage,
    };
    log::debug!(
        "Grade {grade} mastery: {:.2} ({:?}), {studied_count}/{} studied.",
        mastery.score(),
        mastery.level(),
        mastery.total_kanji
    );
    Ok(mastery)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::types::card::Card;
    use crate::types::catalog::Kanji;
    use crate::types::timestamp::Timestamp;

    #[test]
    fn test_unlocked_grades() {
        assert_eq!(unlocked_grades(0), &[1]);
        assert_eq!(unlocked_grades(4), &[1]);
        assert_eq!(unlocked_grades(5), &[1, 2]);
        assert_eq!(unlocked_grades(29), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(unlocked_grades(30), &[1, 2, 3, 4, 5, 6, 8]);
        assert_eq!(tier_for_level(100).name, "Master");
    }

    #[test]
    fn test_radical_priority() {
        assert_eq!(max_radical_priority(1), 1);
        assert_eq!(max_radical_priority(5), 1);
        assert_eq!(max_radical_priority(6), 2);
        assert_eq!(max_radical_priority(15), 2);
        assert_eq!(max_radical_priority(16), 3);
    }

    fn mastery(coverage: f64, average_accuracy: f64) -> GradeMastery {
        GradeMastery {
            grade: 1,
            total_kanji: 10,
            studied_count: 0,
            mastered_count: 0,
            average_accuracy,
            coverage,
        }
    }

    #[test]
    fn test_mastery_levels() {
        assert_eq!(mastery(0.0, 0.0).level(), MasteryLevel::Beginning);
        assert_eq!(mastery(0.6, 0.6).level(), MasteryLevel::Developing);
        assert_eq!(mastery(0.5, 1.0).level(), MasteryLevel::Proficient);
        assert_eq!(mastery(1.0, 1.0).level(), MasteryLevel::Advanced);
        assert_eq!(mastery(0.0, 0.0).new_grade_ratio(), 0.0);
        assert_eq!(mastery(0.6, 0.6).new_grade_ratio(), 0.10);
        assert_eq!(mastery(0.5, 1.0).new_grade_ratio(), 0.20);
        assert_eq!(mastery(1.0, 1.0).new_grade_ratio(), 0.40);
        assert_eq!(MasteryLevel::Advanced.label_jp(), "上級");
    }

    #[test]
    fn test_grade_mastery_from_cards() -> Fallible<()> {
        let store = MemoryStore::new();
        for id in 1..=4 {
            store.add_kanji(Kanji {
                id,
                literal: format!("k{id}"),
                grade: Some(1),
                jlpt_level: None,
                frequency: None,
                stroke_count: 1,
                meanings: Vec::new(),
                on_readings: Vec::new(),
                kun_readings: Vec::new(),
                stroke_svg: None,
            });
        }
        let now = Timestamp::from_epoch_seconds(0);
        let mut card = Card::new(ItemKind::Kanji, 1, now);
        card.state = CardState::Mastered;
        card.total_reviews = 4;
        card.correct_reviews = 4;
        store.save_card(&card)?;
        let mut card = Card::new(ItemKind::Kanji, 2, now);
        card.state = CardState::Learning;
        card.total_reviews = 2;
        card.correct_reviews = 1;
        store.save_card(&card)?;
        // Tracked but never reviewed.
        store.ensure_card_exists(ItemKind::Kanji, 3, now)?;

        let mastery = grade_mastery(&store, 1)?;
        assert_eq!(mastery.total_kanji, 4);
        assert_eq!(mastery.studied_count, 2);
        assert_eq!(mastery.mastered_count, 1);
        assert!((mastery.average_accuracy - 0.75).abs() < 1e-9);
        assert!((mastery.coverage - 0.5).abs() < 1e-9);
        assert_eq!(mastery.level(), MasteryLevel::Developing);
        assert_eq!(grade_mastery(&store, 2)?.level(), MasteryLevel::Beginning);
        Ok(())
    }
}
