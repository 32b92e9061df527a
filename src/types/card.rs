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

use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::fail;
use crate::types::item_kind::ItemId;
use crate::types::item_kind::ItemKind;
use crate::types::timestamp::Timestamp;

/// The starting ease factor of a new card.
pub const INITIAL_EASE: f64 = 2.5;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardState {
    /// Tracked, but never reviewed.
    New,
    /// Recently introduced or recently forgotten.
    Learning,
    Review,
    /// Long interval; reviewed rarely.
    Mastered,
}

impl CardState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardState::New => "new",
            CardState::Learning => "learning",
            CardState::Review => "review",
            CardState::Mastered => "mastered",
        }
    }
}

impl TryFrom<String> for CardState {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "new" => Ok(CardState::New),
            "learning" => Ok(CardState::Learning),
            "review" => Ok(CardState::Review),
            "mastered" => Ok(CardState::Mastered),
            _ => fail(format!("Invalid card state: {}", value)),
        }
    }
}

impl ToSql for CardState {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for CardState {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        CardState::try_from(string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// The scheduling record of one learnable item.
#[derive(Clone, PartialEq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub kind: ItemKind,
    pub item_id: ItemId,
    pub state: CardState,
    /// When the card is next due. Meaningless while the card is new.
    pub due: Timestamp,
    pub ease_factor: f64,
    pub interval_days: u32,
    /// Consecutive passing reviews.
    pub repetitions: u32,
    pub total_reviews: u32,
    pub correct_reviews: u32,
}

impl Card {
    pub fn new(kind: ItemKind, item_id: ItemId, created_at: Timestamp) -> Self {
        Self {
            kind,
            item_id,
            state: CardState::New,
            due: created_at,
            ease_factor: INITIAL_EASE,
            interval_days: 0,
            repetitions: 0,
            total_reviews: 0,
            correct_reviews: 0,
        }
    }

    pub fn is_new(&self) -> bool {
        self.state == CardState::New
    }

    pub fn is_due(&self, now: Timestamp) -> bool {
        !self.is_new() && self.due <= now
    }
}
