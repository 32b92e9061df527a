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

//! The SM-2 review scheduler.

use crate::types::card::Card;
use crate::types::card::CardState;
use crate::types::timestamp::Timestamp;

pub const MAX_QUALITY: u8 = 5;
/// Answers of at least this quality count as a pass.
pub const PASSING_QUALITY: u8 = 3;
pub const MIN_EASE: f64 = 1.3;
const FAIL_EASE_PENALTY: f64 = 0.2;
const MAX_INTERVAL_DAYS: u32 = 365;
/// Interval at which a card counts as mastered.
const MASTERED_INTERVAL_DAYS: u32 = 21;

/// Applies one review of the given quality to a card. The input card is
/// left untouched.
pub fn review(card: &Card, quality: u8, now: Timestamp) -> Card {
    let quality = quality.min(MAX_QUALITY);
    let mut next = card.clone();
    next.total_reviews += 1;
    if quality >= PASSING_QUALITY {
        next.correct_reviews += 1;
        next.repetitions += 1;
        next.ease_factor = next_ease(card.ease_factor, quality);
        next.interval_days = match next.repetitions {
            1 => 1,
            2 => 6,
            _ => grow_interval(card.interval_days, next.ease_factor),
        };
        next.state = if next.interval_days >= MASTERED_INTERVAL_DAYS {
            CardState::Mastered
        } else if next.repetitions >= 2 {
            CardState::Review
        } else {
            CardState::Learning
        };
    } else {
        next.repetitions = 0;
        next.interval_days = 1;
        next.ease_factor = (card.ease_factor - FAIL_EASE_PENALTY).max(MIN_EASE);
        next.state = CardState::Learning;
    }
    next.due = now.plus_days(next.interval_days);
    log::debug!(
        "Reviewed {} {} with quality {quality}: {} -> {}, next in {} days.",
        card.kind,
        card.item_id,
        card.state.as_str(),
        next.state.as_str(),
        next.interval_days
    );
    next
}

fn next_ease(ease: f64, quality: u8) -> f64 {
    let miss = f64::from(MAX_QUALITY - quality);
    (ease + 0.1 - miss * (0.08 + miss * 0.02)).max(MIN_EASE)
}

fn grow_interval(interval_days: u32, ease: f64) -> u32 {
    let scaled = (f64::from(interval_days) * ease).ceil() as u32;
    scaled.max(interval_days + 1).min(MAX_INTERVAL_DAYS)
}
