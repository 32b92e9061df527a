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

use std::fmt::Display;
use std::fmt::Formatter;

use clap::ValueEnum;
use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Deserialize;
use serde::Serialize;

use crate::error::ErrorReport;
use crate::error::fail;

/// Catalog identifier of a kanji, kana, or radical. Identifiers are only
/// unique within one kind.
pub type ItemId = i64;

/// The kind of a learnable item. Cards and collected items are keyed by
/// `(ItemKind, ItemId)`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Kanji,
    Hiragana,
    Katakana,
    Radical,
}

impl ItemKind {
    pub const ALL: [ItemKind; 4] = [
        ItemKind::Kanji,
        ItemKind::Hiragana,
        ItemKind::Katakana,
        ItemKind::Radical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemKind::Kanji => "kanji",
            ItemKind::Hiragana => "hiragana",
            ItemKind::Katakana => "katakana",
            ItemKind::Radical => "radical",
        }
    }
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<String> for ItemKind {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "kanji" => Ok(ItemKind::Kanji),
            "hiragana" => Ok(ItemKind::Hiragana),
            "katakana" => Ok(ItemKind::Katakana),
            "radical" => Ok(ItemKind::Radical),
            _ => fail(format!("Invalid item kind: {}", value)),
        }
    }
}

impl ToSql for ItemKind {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ItemKind {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        ItemKind::try_from(string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// The two kana syllabaries.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum KanaType {
    Hiragana,
    Katakana,
}

impl KanaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KanaType::Hiragana => "hiragana",
            KanaType::Katakana => "katakana",
        }
    }

    /// The card and collection kind used for kana of this type.
    pub fn item_kind(self) -> ItemKind {
        match self {
            KanaType::Hiragana => ItemKind::Hiragana,
            KanaType::Katakana => ItemKind::Katakana,
        }
    }
}

impl TryFrom<String> for KanaType {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "hiragana" => Ok(KanaType::Hiragana),
            "katakana" => Ok(KanaType::Katakana),
            _ => fail(format!("Invalid kana type: {}", value)),
        }
    }
}

impl ToSql for KanaType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for KanaType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        KanaType::try_from(string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

/// Kana variants, used for rarity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum KanaVariant {
    #[default]
    Basic,
    Dakuten,
    Handakuten,
    Combination,
}

impl KanaVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            KanaVariant::Basic => "basic",
            KanaVariant::Dakuten => "dakuten",
            KanaVariant::Handakuten => "handakuten",
            KanaVariant::Combination => "combination",
        }
    }
}

impl TryFrom<String> for KanaVariant {
    type Error = ErrorReport;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "basic" => Ok(KanaVariant::Basic),
            "dakuten" => Ok(KanaVariant::Dakuten),
            "handakuten" => Ok(KanaVariant::Handakuten),
            "combination" => Ok(KanaVariant::Combination),
            _ => fail(format!("Invalid kana variant: {}", value)),
        }
    }
}

impl ToSql for KanaVariant {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for KanaVariant {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        KanaVariant::try_from(string).map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}
