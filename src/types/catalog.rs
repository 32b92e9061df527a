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

use serde::Deserialize;

use crate::error::Fallible;
use crate::error::fail;
use crate::types::item_kind::ItemId;
use crate::types::item_kind::KanaType;
use crate::types::item_kind::KanaVariant;

#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kanji {
    pub id: ItemId,
    pub literal: String,
    /// School grade: 1 to 6 for elementary school, 8 for junior high.
    #[serde(default)]
    pub grade: Option<u8>,
    #[serde(default)]
    pub jlpt_level: Option<u8>,
    /// Newspaper frequency rank. Lower is more frequent.
    #[serde(default)]
    pub frequency: Option<u32>,
    pub stroke_count: u32,
    #[serde(default)]
    pub meanings: Vec<String>,
    #[serde(default)]
    pub on_readings: Vec<String>,
    #[serde(default)]
    pub kun_readings: Vec<String>,
    /// JSON array of SVG path strings, one per stroke.
    #[serde(default)]
    pub stroke_svg: Option<String>,
}

impl Kanji {
    pub fn primary_meaning(&self) -> &str {
        self.meanings.first().map(String::as_str).unwrap_or("")
    }

    /// The first on-reading, falling back to the first kun-reading. Empty
    /// if the kanji has no readings at all.
    pub fn primary_reading(&self) -> &str {
        self.on_readings
            .first()
            .or(self.kun_readings.first())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn grade_label(&self) -> Option<String> {
        match self.grade {
            Some(g @ 1..=6) => Some(format!("Grade {g}")),
            Some(8) => Some("Junior High".to_string()),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Kana {
    pub id: ItemId,
    pub literal: String,
    #[serde(rename = "type")]
    pub kana_type: KanaType,
    pub romanization: String,
    /// The row the kana belongs to, e.g. `"k"` for か, き, く, け, こ.
    pub group: String,
    pub stroke_count: u32,
    #[serde(default)]
    pub stroke_svg: Option<String>,
    #[serde(default)]
    pub variant: KanaVariant,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Radical {
    pub id: ItemId,
    pub literal: String,
    pub meaning: String,
    #[serde(default)]
    pub meaning_jp: Option<String>,
    pub stroke_count: u32,
    #[serde(default)]
    pub stroke_svg: Option<String>,
    /// 1 = essential, 2 = common, 3 = uncommon.
    pub priority: u8,
}

/// A link between a radical and a kanji that contains it.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadicalLink {
    pub radical_id: ItemId,
    pub kanji_id: ItemId,
}

/// The contents of a catalog file.
#[derive(Clone, Default, PartialEq, Debug, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CatalogData {
    pub kanji: Vec<Kanji>,
    pub kana: Vec<Kana>,
    pub radicals: Vec<Radical>,
    pub links: Vec<RadicalLink>,
}

impl CatalogData {
    pub fn from_json(content: &str) -> Fallible<Self> {
        let data: CatalogData = serde_json::from_str(content)?;
        Ok(data)
    }
}

/// Parses stroke data: a JSON array of SVG path strings. Fails on
/// malformed JSON and on an empty array.
pub fn parse_stroke_paths(raw: &str) -> Fallible<Vec<String>> {
    let paths: Vec<String> = serde_json::from_str(raw)?;
    if paths.is_empty() {
        return fail("stroke data is empty.");
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kanji(on: &[&str], kun: &[&str]) -> Kanji {
        Kanji {
            id: 1,
            literal: "日".to_string(),
            grade: Some(1),
            jlpt_level: Some(5),
            frequency: Some(1),
            stroke_count: 4,
            meanings: vec!["day".to_string()],
            on_readings: on.iter().map(|s| s.to_string()).collect(),
            kun_readings: kun.iter().map(|s| s.to_string()).collect(),
            stroke_svg: None,
        }
    }

    #[test]
    fn test_primary_reading_prefers_on_reading() {
        assert_eq!(kanji(&["ニチ"], &["ひ"]).primary_reading(), "ニチ");
        assert_eq!(kanji(&[], &["ひ"]).primary_reading(), "ひ");
        assert_eq!(kanji(&[], &[]).primary_reading(), "");
    }

    #[test]
    fn test_parse_stroke_paths() {
        assert_eq!(
            parse_stroke_paths(r#"["M1,1", "M2,2"]"#).ok(),
            Some(vec!["M1,1".to_string(), "M2,2".to_string()])
        );
        assert!(parse_stroke_paths("not json").is_err());
        assert!(parse_stroke_paths("[]").is_err());
    }

    #[test]
    fn test_catalog_from_json() -> Fallible<()> {
        let data = CatalogData::from_json(
            r#"{
                "kanji": [{"id": 1, "literal": "休", "grade": 1, "frequency": 642,
                           "strokeCount": 6, "meanings": ["rest"], "onReadings": ["キュウ"]}],
                "kana": [{"id": 10, "literal": "が", "type": "hiragana", "romanization": "ga",
                          "group": "g", "strokeCount": 5, "variant": "dakuten"}],
                "radicals": [{"id": 100, "literal": "木", "meaning": "tree",
                              "meaningJp": "き", "strokeCount": 4, "priority": 1}],
                "links": [{"radicalId": 100, "kanjiId": 1}]
            }"#,
        )?;
        assert_eq!(data.kanji[0].primary_reading(), "キュウ");
        assert!(data.kanji[0].kun_readings.is_empty());
        assert_eq!(data.kana[0].kana_type, KanaType::Hiragana);
        assert_eq!(data.kana[0].variant, KanaVariant::Dakuten);
        assert_eq!(data.radicals[0].meaning_jp.as_deref(), Some("き"));
        assert_eq!(
            data.links,
            vec![RadicalLink {
                radical_id: 100,
                kanji_id: 1
            }]
        );
        Ok(())
    }

    #[test]
    fn test_grade_label() {
        assert_eq!(kanji(&[], &[]).grade_label(), Some("Grade 1".to_string()));
        let mut k = kanji(&[], &[]);
        k.grade = Some(8);
        assert_eq!(k.grade_label(), Some("Junior High".to_string()));
        k.grade = None;
        assert_eq!(k.grade_label(), None);
    }
}
