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

//! Rarity tiers derived from an item's static attributes.

use crate::types::catalog::Kana;
use crate::types::catalog::Kanji;
use crate::types::catalog::Radical;
use crate::types::item_kind::KanaVariant;
use crate::types::rarity::Rarity;

/// Grade assumed for kanji without one.
const DEFAULT_GRADE: u8 = 8;

pub fn classify_kanji(grade: Option<u8>, frequency: Option<u32>, stroke_count: u32) -> Rarity {
    let grade = grade.unwrap_or(DEFAULT_GRADE);
    let rare_or_unranked = frequency.is_none_or(|f| f > 3000);
    if grade == 8 && stroke_count >= 15 {
        Rarity::Legendary
    } else if grade == 6 || (grade < 6 && rare_or_unranked) {
        Rarity::Epic
    } else if (4..=5).contains(&grade) && frequency.is_some_and(|f| (1501..=3000).contains(&f)) {
        Rarity::Rare
    } else if (2..=3).contains(&grade) && frequency.is_some_and(|f| (501..=1500).contains(&f)) {
        Rarity::Uncommon
    } else if grade == 1 && frequency.is_some_and(|f| f <= 500) {
        Rarity::Common
    } else if grade >= 6 {
        Rarity::Epic
    } else if grade >= 4 {
        Rarity::Rare
    } else if grade >= 2 {
        Rarity::Uncommon
    } else {
        Rarity::Common
    }
}

pub fn classify_kana(variant: KanaVariant) -> Rarity {
    match variant {
        KanaVariant::Basic => Rarity::Common,
        KanaVariant::Dakuten | KanaVariant::Handakuten => Rarity::Uncommon,
        KanaVariant::Combination => Rarity::Rare,
    }
}

pub fn classify_radical(priority: u8) -> Rarity {
    match priority {
        1 => Rarity::Common,
        2 => Rarity::Uncommon,
        3 => Rarity::Rare,
        _ => Rarity::Common,
    }
}

impl Kanji {
    pub fn rarity(&self) -> Rarity {
        classify_kanji(self.grade, self.frequency, self.stroke_count)
    }
}

impl Kana {
    pub fn rarity(&self) -> Rarity {
        classify_kana(self.variant)
    }
}

impl Radical {
    pub fn rarity(&self) -> Rarity {
        classify_radical(self.priority)
    }
}
