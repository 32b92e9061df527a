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

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use rusqlite::Params;
use rusqlite::Row;
use rusqlite::Transaction;
use rusqlite::config::DbConfig;
use rusqlite::params_from_iter;

use crate::encounter::PityCounters;
use crate::error::ErrorReport;
use crate::error::Fallible;
use crate::repo::CardRepository;
use crate::repo::Catalog;
use crate::repo::CollectionRepository;
use crate::types::card::Card;
use crate::types::card::CardState;
use crate::types::catalog::CatalogData;
use crate::types::catalog::Kana;
use crate::types::catalog::Kanji;
use crate::types::catalog::Radical;
use crate::types::collected::CollectedItem;
use crate::types::collected::CollectionStats;
use crate::types::item_kind::ItemId;
use crate::types::item_kind::ItemKind;
use crate::types::item_kind::KanaType;
use crate::types::item_kind::KanaVariant;
use crate::types::rarity::Rarity;
use crate::types::timestamp::Timestamp;

const KANJI_COLUMNS: &str = "kanji_id, literal, grade, jlpt_level, frequency, stroke_count, meanings, on_readings, kun_readings, stroke_svg";
const KANA_COLUMNS: &str =
    "kana_id, literal, kana_type, romanization, kana_group, stroke_count, stroke_svg, variant";
const RADICAL_COLUMNS: &str =
    "radical_id, literal, meaning, meaning_jp, stroke_count, stroke_svg, priority";
const CARD_COLUMNS: &str = "item_kind, item_id, state, due_at, ease_factor, interval_days, repetitions, total_reviews, correct_reviews";
const ITEM_COLUMNS: &str =
    "item_id, item_kind, rarity, item_level, item_xp, discovered_at, source";

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn new(database_path: &str) -> Fallible<Self> {
        let mut conn = Connection::open(database_path)?;
        conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)?;
        {
            let tx = conn.transaction()?;
            if !schema_exists(&tx)? {
                log::debug!("Creating schema in {database_path}.");
                tx.execute_batch(include_str!("schema.sql"))?;
                tx.commit()?;
            }
        }
        let conn = Arc::new(Mutex::new(conn));
        Ok(Self { conn })
    }

    /// Loads a catalog, replacing records with the same ids.
    pub fn import_catalog(&self, data: &CatalogData) -> Fallible<()> {
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        for kanji in &data.kanji {
            insert_kanji(&tx, kanji)?;
        }
        for kana in &data.kana {
            insert_kana(&tx, kana)?;
        }
        for radical in &data.radicals {
            insert_radical(&tx, radical)?;
        }
        for link in &data.links {
            tx.execute(
                "insert or ignore into radical_links (radical_id, kanji_id) values (?, ?);",
                (link.radical_id, link.kanji_id),
            )?;
        }
        tx.commit()?;
        log::debug!(
            "Imported {} kanji, {} kana, {} radicals and {} links.",
            data.kanji.len(),
            data.kana.len(),
            data.radicals.len(),
            data.links.len()
        );
        Ok(())
    }

    /// The persisted pity counters, zero for tiers never saved.
    pub fn load_pity(&self) -> Fallible<PityCounters> {
        let conn = self.acquire()?;
        let mut counters: PityCounters = [0; 5];
        let mut stmt = conn.prepare("select rarity, counter from pity;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let rarity: Rarity = row.get(0)?;
            let counter: u32 = row.get(1)?;
            counters[rarity.index()] = counter;
        }
        Ok(counters)
    }

    pub fn save_pity(&self, counters: &PityCounters) -> Fallible<()> {
        let mut conn = self.acquire()?;
        let tx = conn.transaction()?;
        for rarity in Rarity::ALL {
            tx.execute(
                "insert or replace into pity (rarity, counter) values (?, ?);",
                (rarity, counters[rarity.index()]),
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn card_count_by_state(&self, state: CardState) -> Fallible<usize> {
        let conn = self.acquire()?;
        let count: i64 = conn.query_row(
            "select count(*) from cards where state = ?;",
            [state],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn due_count(&self, now: Timestamp) -> Fallible<usize> {
        let conn = self.acquire()?;
        let count: i64 = conn.query_row(
            "select count(*) from cards where state <> 'new' and due_at <= ?;",
            [now.epoch_seconds()],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn catalog_counts(&self) -> Fallible<(usize, usize, usize)> {
        let conn = self.acquire()?;
        let count = |table: &str| -> Fallible<usize> {
            let sql = format!("select count(*) from {table};");
            let n: i64 = conn.query_row(&sql, [], |row| row.get(0))?;
            Ok(n as usize)
        };
        Ok((count("kanji")?, count("kana")?, count("radicals")?))
    }

    fn acquire(&self) -> Fallible<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ErrorReport::new("database lock poisoned."))
    }

    fn query_kanji<P: Params>(&self, sql: &str, params: P) -> Fallible<Vec<Kanji>> {
        let conn = self.acquire()?;
        let mut stmt = conn.prepare(sql)?;
        let mut rows = stmt.query(params)?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            result.push(kanji_from_row(row)?);
        }
        Ok(result)
    }

    fn query_kana<P: Params>(&self, sql: &str, params: P) -> Fallible<Vec<Kana>> {
        let conn = self.acquire()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, kana_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn query_radicals<P: Params>(&self, sql: &str, params: P) -> Fallible<Vec<Radical>> {
        let conn = self.acquire()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, radical_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn query_cards<P: Params>(&self, sql: &str, params: P) -> Fallible<Vec<Card>> {
        let conn = self.acquire()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map(params, card_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl CardRepository for Database {
    fn due_cards(&self, kind: ItemKind, now: Timestamp) -> Fallible<Vec<Card>> {
        let sql = format!(
            "select {CARD_COLUMNS} from cards where item_kind = ? and state <> 'new' and due_at <= ? order by due_at, item_id;"
        );
        self.query_cards(&sql, (kind, now.epoch_seconds()))
    }

    fn learning_cards(&self, kind: ItemKind, now: Timestamp, limit: usize) -> Fallible<Vec<Card>> {
        let sql = format!(
            "select {CARD_COLUMNS} from cards where item_kind = ? and state = 'learning' and due_at > ? order by due_at, item_id limit ?;"
        );
        self.query_cards(&sql, (kind, now.epoch_seconds(), sql_limit(limit)))
    }

    fn new_cards(&self, kind: ItemKind, limit: usize) -> Fallible<Vec<Card>> {
        let sql = format!(
            "select {CARD_COLUMNS} from cards where item_kind = ? and state = 'new' order by item_id limit ?;"
        );
        self.query_cards(&sql, (kind, sql_limit(limit)))
    }

    fn get_card(&self, kind: ItemKind, item_id: ItemId) -> Fallible<Option<Card>> {
        let conn = self.acquire()?;
        let sql = format!("select {CARD_COLUMNS} from cards where item_kind = ? and item_id = ?;");
        let card = conn
            .query_row(&sql, (kind, item_id), card_from_row)
            .optional()?;
        Ok(card)
    }

    fn save_card(&self, card: &Card) -> Fallible<()> {
        let conn = self.acquire()?;
        let sql = format!(
            "insert or replace into cards ({CARD_COLUMNS}) values (?, ?, ?, ?, ?, ?, ?, ?, ?);"
        );
        conn.execute(
            &sql,
            (
                card.kind,
                card.item_id,
                card.state,
                card.due.epoch_seconds(),
                card.ease_factor,
                card.interval_days,
                card.repetitions,
                card.total_reviews,
                card.correct_reviews,
            ),
        )?;
        Ok(())
    }

    fn ensure_card_exists(
        &self,
        kind: ItemKind,
        item_id: ItemId,
        now: Timestamp,
    ) -> Fallible<()> {
        let card = Card::new(kind, item_id, now);
        let conn = self.acquire()?;
        let sql = format!(
            "insert or ignore into cards ({CARD_COLUMNS}) values (?, ?, ?, ?, ?, ?, ?, ?, ?);"
        );
        conn.execute(
            &sql,
            (
                card.kind,
                card.item_id,
                card.state,
                card.due.epoch_seconds(),
                card.ease_factor,
                card.interval_days,
                card.repetitions,
                card.total_reviews,
                card.correct_reviews,
            ),
        )?;
        Ok(())
    }
}

impl Catalog for Database {
    fn kanji_by_id(&self, id: ItemId) -> Fallible<Option<Kanji>> {
        let sql = format!("select {KANJI_COLUMNS} from kanji where kanji_id = ?;");
        Ok(self.query_kanji(&sql, [id])?.into_iter().next())
    }

    fn kanji_by_grade(&self, grade: u8) -> Fallible<Vec<Kanji>> {
        let sql = format!("select {KANJI_COLUMNS} from kanji where grade = ? order by kanji_id;");
        self.query_kanji(&sql, [grade])
    }

    fn unseen_kanji_by_grade(&self, grade: u8, limit: usize) -> Fallible<Vec<Kanji>> {
        let sql = format!(
            "select {KANJI_COLUMNS} from kanji where grade = ? and kanji_id not in (select item_id from cards where item_kind = 'kanji') order by frequency is null, frequency, kanji_id limit ?;"
        );
        self.query_kanji(&sql, (grade, sql_limit(limit)))
    }

    fn kana_by_id(&self, id: ItemId) -> Fallible<Option<Kana>> {
        let sql = format!("select {KANA_COLUMNS} from kana where kana_id = ?;");
        Ok(self.query_kana(&sql, [id])?.into_iter().next())
    }

    fn kana_by_type(&self, kana_type: KanaType) -> Fallible<Vec<Kana>> {
        let sql = format!("select {KANA_COLUMNS} from kana where kana_type = ? order by kana_id;");
        self.query_kana(&sql, [kana_type])
    }

    fn kana_by_type_and_variant(
        &self,
        kana_type: KanaType,
        variant: KanaVariant,
    ) -> Fallible<Vec<Kana>> {
        let sql = format!(
            "select {KANA_COLUMNS} from kana where kana_type = ? and variant = ? order by kana_id;"
        );
        self.query_kana(&sql, (kana_type, variant))
    }

    fn unseen_kana(&self, kana_type: KanaType, limit: usize) -> Fallible<Vec<Kana>> {
        let sql = format!(
            "select {KANA_COLUMNS} from kana where kana_type = ? and kana_id not in (select item_id from cards where item_kind = ?) order by kana_id limit ?;"
        );
        self.query_kana(&sql, (kana_type, kana_type.item_kind(), sql_limit(limit)))
    }

    fn radical_by_id(&self, id: ItemId) -> Fallible<Option<Radical>> {
        let sql = format!("select {RADICAL_COLUMNS} from radicals where radical_id = ?;");
        Ok(self.query_radicals(&sql, [id])?.into_iter().next())
    }

    fn all_radicals(&self) -> Fallible<Vec<Radical>> {
        let sql = format!("select {RADICAL_COLUMNS} from radicals order by radical_id;");
        self.query_radicals(&sql, [])
    }

    fn radicals_by_priority(&self, priority: u8) -> Fallible<Vec<Radical>> {
        let sql = format!(
            "select {RADICAL_COLUMNS} from radicals where priority = ? order by radical_id;"
        );
        self.query_radicals(&sql, [priority])
    }

    fn unseen_radicals(&self, max_priority: u8, limit: usize) -> Fallible<Vec<Radical>> {
        let sql = format!(
            "select {RADICAL_COLUMNS} from radicals where priority <= ? and radical_id not in (select item_id from cards where item_kind = 'radical') order by priority, radical_id limit ?;"
        );
        self.query_radicals(&sql, (max_priority, sql_limit(limit)))
    }

    fn kanji_ids_for_radical(&self, radical_id: ItemId) -> Fallible<Vec<ItemId>> {
        let conn = self.acquire()?;
        let mut stmt = conn
            .prepare("select kanji_id from radical_links where radical_id = ? order by kanji_id;")?;
        let rows = stmt.query_map([radical_id], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<ItemId>, _>>()?)
    }

    fn radicals_for_kanji(&self, kanji_id: ItemId) -> Fallible<Vec<Radical>> {
        let sql = format!(
            "select {RADICAL_COLUMNS} from radicals where radical_id in (select radical_id from radical_links where kanji_id = ?) order by radical_id;"
        );
        self.query_radicals(&sql, [kanji_id])
    }

    fn kanji_containing_some_radicals(
        &self,
        radical_ids: &[ItemId],
        limit: usize,
    ) -> Fallible<Vec<Kanji>> {
        if radical_ids.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; radical_ids.len()].join(", ");
        let sql = format!(
            "select {KANJI_COLUMNS} from kanji join (select kanji_id as linked_id, count(*) as overlap from radical_links where radical_id in ({placeholders}) group by kanji_id having count(*) < ?) on kanji_id = linked_id order by overlap desc, kanji_id limit ?;"
        );
        let mut params: Vec<i64> = radical_ids.to_vec();
        params.push(radical_ids.len() as i64);
        params.push(sql_limit(limit));
        self.query_kanji(&sql, params_from_iter(params))
    }
}

impl CollectionRepository for Database {
    fn is_collected(&self, item_id: ItemId, kind: ItemKind) -> Fallible<bool> {
        let conn = self.acquire()?;
        let count: i64 = conn.query_row(
            "select count(*) from collected_items where item_kind = ? and item_id = ?;",
            (kind, item_id),
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn collect(&self, item: &CollectedItem) -> Fallible<()> {
        let conn = self.acquire()?;
        let sql = format!(
            "insert or ignore into collected_items ({ITEM_COLUMNS}) values (?, ?, ?, ?, ?, ?, ?);"
        );
        conn.execute(
            &sql,
            (
                item.item_id,
                item.kind,
                item.rarity,
                item.level,
                item.xp,
                item.discovered_at,
                &item.source,
            ),
        )?;
        Ok(())
    }

    fn collected_ids(&self, kind: ItemKind) -> Fallible<Vec<ItemId>> {
        let conn = self.acquire()?;
        let mut stmt = conn
            .prepare("select item_id from collected_items where item_kind = ? order by item_id;")?;
        let rows = stmt.query_map([kind], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<ItemId>, _>>()?)
    }

    fn add_item_xp(&self, item_id: ItemId, kind: ItemKind, xp: u32) -> Fallible<()> {
        let conn = self.acquire()?;
        conn.execute(
            "update collected_items set item_xp = item_xp + ? where item_kind = ? and item_id = ?;",
            (xp, kind, item_id),
        )?;
        Ok(())
    }

    fn update_level(&self, item_id: ItemId, kind: ItemKind, level: u32, xp: u32) -> Fallible<()> {
        let conn = self.acquire()?;
        conn.execute(
            "update collected_items set item_level = ?, item_xp = ? where item_kind = ? and item_id = ?;",
            (level, xp, kind, item_id),
        )?;
        Ok(())
    }

    fn get_item(&self, item_id: ItemId, kind: ItemKind) -> Fallible<Option<CollectedItem>> {
        let conn = self.acquire()?;
        let sql = format!(
            "select {ITEM_COLUMNS} from collected_items where item_kind = ? and item_id = ?;"
        );
        let item = conn
            .query_row(&sql, (kind, item_id), item_from_row)
            .optional()?;
        Ok(item)
    }

    fn collection_stats(&self) -> Fallible<CollectionStats> {
        let conn = self.acquire()?;
        let mut stats = CollectionStats::default();
        let mut stmt = conn.prepare("select item_kind, rarity from collected_items;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let kind: ItemKind = row.get(0)?;
            let rarity: Rarity = row.get(1)?;
            stats.count(kind, rarity);
        }
        Ok(stats)
    }
}

/// SQLite limits are signed. Larger values mean no limit.
fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

/// An insert that updates the row in place when its key, the first column,
/// already exists.
fn upsert_sql(table: &str, columns: &str, count: usize) -> String {
    let mut names = columns.split(", ");
    let key = names.next().unwrap_or_default();
    let updates: Vec<String> = names.map(|c| format!("{c} = excluded.{c}")).collect();
    let placeholders = vec!["?"; count].join(", ");
    format!(
        "insert into {table} ({columns}) values ({placeholders}) on conflict ({key}) do update set {};",
        updates.join(", ")
    )
}

fn insert_kanji(tx: &Transaction, kanji: &Kanji) -> Fallible<()> {
    let sql = upsert_sql("kanji", KANJI_COLUMNS, 10);
    tx.execute(
        &sql,
        (
            kanji.id,
            &kanji.literal,
            kanji.grade,
            kanji.jlpt_level,
            kanji.frequency,
            kanji.stroke_count,
            serde_json::to_string(&kanji.meanings)?,
            serde_json::to_string(&kanji.on_readings)?,
            serde_json::to_string(&kanji.kun_readings)?,
            &kanji.stroke_svg,
        ),
    )?;
    Ok(())
}

fn insert_kana(tx: &Transaction, kana: &Kana) -> Fallible<()> {
    let sql = upsert_sql("kana", KANA_COLUMNS, 8);
    tx.execute(
        &sql,
        (
            kana.id,
            &kana.literal,
            kana.kana_type,
            &kana.romanization,
            &kana.group,
            kana.stroke_count,
            &kana.stroke_svg,
            kana.variant,
        ),
    )?;
    Ok(())
}

fn insert_radical(tx: &Transaction, radical: &Radical) -> Fallible<()> {
    let sql = upsert_sql("radicals", RADICAL_COLUMNS, 7);
    tx.execute(
        &sql,
        (
            radical.id,
            &radical.literal,
            &radical.meaning,
            &radical.meaning_jp,
            radical.stroke_count,
            &radical.stroke_svg,
            radical.priority,
        ),
    )?;
    Ok(())
}

fn kanji_from_row(row: &Row) -> Fallible<Kanji> {
    let meanings: String = row.get(6)?;
    let on_readings: String = row.get(7)?;
    let kun_readings: String = row.get(8)?;
    Ok(Kanji {
        id: row.get(0)?,
        literal: row.get(1)?,
        grade: row.get(2)?,
        jlpt_level: row.get(3)?,
        frequency: row.get(4)?,
        stroke_count: row.get(5)?,
        meanings: serde_json::from_str(&meanings)?,
        on_readings: serde_json::from_str(&on_readings)?,
        kun_readings: serde_json::from_str(&kun_readings)?,
        stroke_svg: row.get(9)?,
    })
}

fn kana_from_row(row: &Row) -> rusqlite::Result<Kana> {
    Ok(Kana {
        id: row.get(0)?,
        literal: row.get(1)?,
        kana_type: row.get(2)?,
        romanization: row.get(3)?,
        group: row.get(4)?,
        stroke_count: row.get(5)?,
        stroke_svg: row.get(6)?,
        variant: row.get(7)?,
    })
}

fn radical_from_row(row: &Row) -> rusqlite::Result<Radical> {
    Ok(Radical {
        id: row.get(0)?,
        literal: row.get(1)?,
        meaning: row.get(2)?,
        meaning_jp: row.get(3)?,
        stroke_count: row.get(4)?,
        stroke_svg: row.get(5)?,
        priority: row.get(6)?,
    })
}

fn card_from_row(row: &Row) -> rusqlite::Result<Card> {
    let due_at: i64 = row.get(3)?;
    Ok(Card {
        kind: row.get(0)?,
        item_id: row.get(1)?,
        state: row.get(2)?,
        due: Timestamp::from_epoch_seconds(due_at),
        ease_factor: row.get(4)?,
        interval_days: row.get(5)?,
        repetitions: row.get(6)?,
        total_reviews: row.get(7)?,
        correct_reviews: row.get(8)?,
    })
}

fn item_from_row(row: &Row) -> rusqlite::Result<CollectedItem> {
    Ok(CollectedItem {
        item_id: row.get(0)?,
        kind: row.get(1)?,
        rarity: row.get(2)?,
        level: row.get(3)?,
        xp: row.get(4)?,
        discovered_at: row.get(5)?,
        source: row.get(6)?,
    })
}

fn schema_exists(tx: &Transaction) -> Fallible<bool> {
    let sql = "select count(*) from sqlite_master where type='table' AND name=?;";
    let count: i64 = tx.query_row(sql, ["cards"], |row| row.get(0))?;
    Ok(count > 0)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::types::catalog::RadicalLink;

    fn open() -> Fallible<(tempfile::TempDir, Database)> {
        let dir = tempdir()?;
        let path = dir.path().join("test.db");
        let db = Database::new(path.to_str().ok_or_else(|| ErrorReport::new("invalid path"))?)?;
        Ok((dir, db))
    }

    fn kanji(id: ItemId, literal: &str, grade: u8, frequency: Option<u32>) -> Kanji {
        Kanji {
            id,
            literal: literal.to_string(),
            grade: Some(grade),
            jlpt_level: None,
            frequency,
            stroke_count: 4,
            meanings: vec!["meaning".to_string()],
            on_readings: vec!["オン".to_string()],
            kun_readings: vec![],
            stroke_svg: None,
        }
    }

    fn radical(id: ItemId, literal: &str, priority: u8) -> Radical {
        Radical {
            id,
            literal: literal.to_string(),
            meaning: "meaning".to_string(),
            meaning_jp: None,
            stroke_count: 3,
            stroke_svg: None,
            priority,
        }
    }

    fn catalog() -> CatalogData {
        CatalogData {
            kanji: vec![
                kanji(1, "林", 1, Some(900)),
                kanji(2, "休", 1, Some(100)),
                kanji(3, "体", 2, None),
            ],
            kana: vec![],
            radicals: vec![radical(10, "木", 1), radical(11, "亻", 2)],
            links: vec![
                RadicalLink {
                    radical_id: 10,
                    kanji_id: 1,
                },
                RadicalLink {
                    radical_id: 10,
                    kanji_id: 2,
                },
                RadicalLink {
                    radical_id: 11,
                    kanji_id: 2,
                },
                RadicalLink {
                    radical_id: 11,
                    kanji_id: 3,
                },
            ],
        }
    }

    #[test]
    fn test_reopen_keeps_schema() -> Fallible<()> {
        let dir = tempdir()?;
        let path = dir.path().join("test.db");
        let path = path.to_str().ok_or_else(|| ErrorReport::new("invalid path"))?;
        Database::new(path)?.import_catalog(&catalog())?;
        let db = Database::new(path)?;
        assert_eq!(db.catalog_counts()?, (3, 0, 2));
        Ok(())
    }

    #[test]
    fn test_catalog_queries() -> Fallible<()> {
        let (_dir, db) = open()?;
        db.import_catalog(&catalog())?;
        assert_eq!(db.kanji_by_id(2)?.map(|k| k.literal), Some("休".to_string()));
        let unseen: Vec<ItemId> = db
            .unseen_kanji_by_grade(1, 10)?
            .iter()
            .map(|k| k.id)
            .collect();
        assert_eq!(unseen, vec![2, 1]);
        db.ensure_card_exists(ItemKind::Kanji, 2, Timestamp::from_epoch_seconds(0))?;
        let unseen: Vec<ItemId> = db
            .unseen_kanji_by_grade(1, 10)?
            .iter()
            .map(|k| k.id)
            .collect();
        assert_eq!(unseen, vec![1]);
        assert_eq!(db.kanji_ids_for_radical(10)?, vec![1, 2]);
        let radicals: Vec<ItemId> = db.radicals_for_kanji(2)?.iter().map(|r| r.id).collect();
        assert_eq!(radicals, vec![10, 11]);
        let some: Vec<ItemId> = db
            .kanji_containing_some_radicals(&[10, 11], 10)?
            .iter()
            .map(|k| k.id)
            .collect();
        // 休 contains both radicals.
        assert_eq!(some, vec![1, 3]);
        assert_eq!(db.unseen_radicals(1, 10)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_cards() -> Fallible<()> {
        let (_dir, db) = open()?;
        let now = Timestamp::from_epoch_seconds(1_000_000);
        db.ensure_card_exists(ItemKind::Radical, 10, now)?;
        assert_eq!(db.new_cards(ItemKind::Radical, 5)?.len(), 1);
        let mut card = Card::new(ItemKind::Radical, 10, now);
        card.state = CardState::Learning;
        card.ease_factor = 2.36;
        card.due = now.plus_days(1);
        card.total_reviews = 1;
        db.save_card(&card)?;
        db.ensure_card_exists(ItemKind::Radical, 10, now)?;
        assert_eq!(db.get_card(ItemKind::Radical, 10)?, Some(card.clone()));
        assert!(db.due_cards(ItemKind::Radical, now)?.is_empty());
        assert_eq!(db.due_cards(ItemKind::Radical, now.plus_days(1))?, vec![card]);
        assert_eq!(db.learning_cards(ItemKind::Radical, now, 5)?.len(), 1);
        assert!(db.learning_cards(ItemKind::Radical, now.plus_days(1), 5)?.is_empty());
        assert_eq!(db.new_cards(ItemKind::Radical, usize::MAX)?.len(), 0);
        assert_eq!(db.card_count_by_state(CardState::Learning)?, 1);
        assert_eq!(db.due_count(now.plus_days(2))?, 1);
        Ok(())
    }

    #[test]
    fn test_collection() -> Fallible<()> {
        let (_dir, db) = open()?;
        let now = Timestamp::from_epoch_seconds(1_000_000);
        let item = CollectedItem::discovered(5, ItemKind::Hiragana, Rarity::Uncommon, now);
        db.collect(&item)?;
        db.collect(&item)?;
        assert!(db.is_collected(5, ItemKind::Hiragana)?);
        assert!(!db.is_collected(5, ItemKind::Katakana)?);
        db.add_item_xp(5, ItemKind::Hiragana, 12)?;
        assert_eq!(db.get_item(5, ItemKind::Hiragana)?.map(|i| i.xp), Some(12));
        db.update_level(5, ItemKind::Hiragana, 2, 3)?;
        let stored = db.get_item(5, ItemKind::Hiragana)?;
        assert_eq!(stored.as_ref().map(|i| (i.level, i.xp)), Some((2, 3)));
        assert_eq!(stored.map(|i| i.discovered_at), Some(now));
        assert_eq!(db.collected_ids(ItemKind::Hiragana)?, vec![5]);
        let stats = db.collection_stats()?;
        assert_eq!((stats.total, stats.hiragana, stats.uncommon), (1, 1, 1));
        Ok(())
    }

    #[test]
    fn test_pity_round_trip() -> Fallible<()> {
        let (_dir, db) = open()?;
        assert_eq!(db.load_pity()?, [0; 5]);
        db.save_pity(&[1, 2, 3, 4, 5])?;
        assert_eq!(db.load_pity()?, [1, 2, 3, 4, 5]);
        Ok(())
    }
}
