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

//! Fixture collections for command tests.

use std::fs::copy;
use std::path::PathBuf;

use tempfile::tempdir;

use crate::cmd::import::import_catalog;
use crate::collection::Collection;
use crate::error::Fallible;

/// Name of the fixture catalog under `./test`.
pub const CATALOG_FILE: &str = "catalog.json";

/// A collection in a fresh temporary directory holding a copy of the
/// fixture catalog, with nothing imported yet. The directory outlives the
/// test.
pub fn empty_collection() -> Fallible<Collection> {
    let directory: PathBuf = tempdir()?.keep();
    copy(PathBuf::from("./test").join(CATALOG_FILE), directory.join(CATALOG_FILE))?;
    Collection::new(Some(directory.display().to_string()))
}

/// Like [`empty_collection`], with the fixture catalog imported.
pub fn imported_collection() -> Fallible<Collection> {
    let collection = empty_collection()?;
    import_catalog(&collection, &catalog_path(&collection))?;
    Ok(collection)
}

/// Path of the catalog copy inside the collection directory.
pub fn catalog_path(collection: &Collection) -> PathBuf {
    collection.directory.join(CATALOG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::CardRepository;
    use crate::types::item_kind::ItemKind;

    #[test]
    fn test_fixture_collections() -> Fallible<()> {
        let empty = empty_collection()?;
        assert!(catalog_path(&empty).exists());
        assert_eq!(empty.db.catalog_counts()?, (0, 0, 0));

        let imported = imported_collection()?;
        assert_ne!(empty.directory, imported.directory);
        assert_eq!(imported.db.catalog_counts()?, (6, 5, 3));
        assert!(imported.db.new_cards(ItemKind::Kanji, 10)?.is_empty());
        Ok(())
    }
}
