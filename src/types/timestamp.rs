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

use chrono::DateTime;
use chrono::Duration;
use chrono::TimeZone;
use chrono::Utc;
use rusqlite::ToSql;
use rusqlite::types::FromSql;
use rusqlite::types::FromSqlError;
use rusqlite::types::FromSqlResult;
use rusqlite::types::ToSqlOutput;
use rusqlite::types::ValueRef;
use serde::Serialize;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn new(ts: DateTime<Utc>) -> Self {
        Self(ts)
    }

    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Builds a timestamp from seconds since the Unix epoch. Out-of-range
    /// values saturate to the epoch.
    pub fn from_epoch_seconds(secs: i64) -> Self {
        match Utc.timestamp_opt(secs, 0).single() {
            Some(ts) => Self(ts),
            None => Self(DateTime::<Utc>::UNIX_EPOCH),
        }
    }

    pub fn epoch_seconds(self) -> i64 {
        self.0.timestamp()
    }

    pub fn plus_days(self, days: u32) -> Self {
        Self(self.0 + Duration::days(i64::from(days)))
    }

    pub fn plus_seconds(self, secs: i64) -> Self {
        Self(self.0 + Duration::seconds(secs))
    }

    /// Whole seconds elapsed since `earlier`, never negative.
    pub fn seconds_since(self, earlier: Timestamp) -> u64 {
        let secs = (self.0 - earlier.0).num_seconds();
        secs.max(0) as u64
    }

    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }
}

impl ToSql for Timestamp {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let str = self.0.to_rfc3339();
        Ok(ToSqlOutput::from(str))
    }
}

impl FromSql for Timestamp {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let string: String = FromSql::column_result(value)?;
        let ts =
            DateTime::parse_from_rfc3339(&string).map_err(|e| FromSqlError::Other(Box::new(e)))?;
        let ts = ts.with_timezone(&Utc);
        Ok(Timestamp(ts))
    }
}
