//! Chirp repository

use std::str::FromStr;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::models::{Chirp, ChirpId, UserId, MAX_CHIRP_LENGTH};
use crate::store::{AccessMode, DocumentStore};

/// Ordering of chirp listings, by id
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl FromStr for SortOrder {
    type Err = Error;

    /// Parses the `sort` query values `asc` and `desc`
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            other => Err(Error::Validation(format!(
                "sort must be 'asc' or 'desc', got '{}'",
                other
            ))),
        }
    }
}

/// Check a chirp body before it is stored
pub fn validate_body(body: &str) -> Result<()> {
    if body.is_empty() {
        return Err(Error::Validation("chirp cannot be empty".to_string()));
    }
    if body.chars().count() > MAX_CHIRP_LENGTH {
        return Err(Error::Validation("chirp is too long".to_string()));
    }
    Ok(())
}

/// Typed access to chirps in the document store
#[derive(Debug, Clone)]
pub struct ChirpRepository {
    store: DocumentStore,
}

impl ChirpRepository {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// Store a new chirp under the next free id
    ///
    /// `body` must already be masked; it is validated here and rejected
    /// before the store is touched.
    pub fn create(&self, body: &str, author_id: UserId) -> Result<Chirp> {
        validate_body(body)?;

        let chirp = self.store.update(|snapshot| {
            let id = snapshot
                .allocate_chirp_id()
                .ok_or_else(|| Error::Validation("chirp id space exhausted".to_string()))?;
            let chirp = Chirp {
                id,
                body: body.to_string(),
                author_id,
            };
            snapshot.chirps.insert(id, chirp.clone());
            Ok::<_, Error>(chirp)
        })?;

        info!(chirp_id = chirp.id, author_id, "Chirp created");
        Ok(chirp)
    }

    /// Get a chirp by id
    pub fn get(&self, id: ChirpId) -> Result<Chirp> {
        self.store.read(|snapshot| {
            snapshot
                .chirps
                .get(&id)
                .cloned()
                .ok_or_else(|| Error::NotFound(format!("chirp {}", id)))
        })
    }

    /// List chirps, optionally only those by `author_id`, ordered by id
    pub fn list(&self, author_id: Option<UserId>, order: SortOrder) -> Result<Vec<Chirp>> {
        self.store.read(|snapshot| {
            // BTreeMap iteration is already ascending by id
            let matching = snapshot
                .chirps
                .values()
                .filter(|chirp| author_id.map_or(true, |author| chirp.author_id == author))
                .cloned();

            let chirps: Vec<Chirp> = match order {
                SortOrder::Ascending => matching.collect(),
                SortOrder::Descending => matching.rev().collect(),
            };
            Ok(chirps)
        })
    }

    /// Delete a chirp; deleting an absent id is a no-op
    pub fn delete(&self, id: ChirpId) -> Result<()> {
        let removed = self
            .store
            .with_snapshot(AccessMode::ReadWrite, |mut snapshot| {
                if snapshot.chirps.remove(&id).is_some() {
                    Ok::<_, Error>((true, Some(snapshot)))
                } else {
                    Ok((false, None))
                }
            })?;

        if removed {
            info!(chirp_id = id, "Chirp deleted");
        } else {
            debug!(chirp_id = id, "Delete of absent chirp ignored");
        }
        Ok(())
    }

    /// Number of stored chirps
    pub fn count(&self) -> Result<usize> {
        self.store.read(|snapshot| Ok(snapshot.chirps.len()))
    }

    /// Highest chirp id ever handed out
    pub fn last_id(&self) -> Result<ChirpId> {
        self.store.read(|snapshot| Ok(snapshot.last_chirp_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo(temp_dir: &TempDir) -> ChirpRepository {
        ChirpRepository::new(DocumentStore::open(temp_dir.path().join("database.json")).unwrap())
    }

    #[test]
    fn test_create_assigns_sequential_ids() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo(&temp_dir);

        for expected in 1..=5 {
            let chirp = repo.create("hello", 1).unwrap();
            assert_eq!(chirp.id, expected);
        }
        assert_eq!(repo.last_id().unwrap(), 5);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo(&temp_dir);

        repo.create("one", 1).unwrap();
        let two = repo.create("two", 1).unwrap();
        repo.delete(two.id).unwrap();

        assert_eq!(repo.create("three", 1).unwrap().id, 3);
    }

    #[test]
    fn test_exhausted_id_space_rejected_without_write() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("database.json");
        std::fs::write(&path, br#"{"last_chirp_id": 18446744073709551615}"#).unwrap();
        let repo = ChirpRepository::new(DocumentStore::open(&path).unwrap());

        let result = repo.create("one more", 1);
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(
            std::fs::read(&path).unwrap(),
            br#"{"last_chirp_id": 18446744073709551615}"#
        );
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_get() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo(&temp_dir);
        let created = repo.create("find me", 4).unwrap();

        assert_eq!(repo.get(created.id).unwrap(), created);
        assert!(matches!(repo.get(99), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_list_filter_and_order() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo(&temp_dir);
        repo.create("a1", 1).unwrap();
        repo.create("b1", 2).unwrap();
        repo.create("a2", 1).unwrap();
        repo.create("b2", 2).unwrap();

        let all: Vec<_> = repo
            .list(None, SortOrder::Ascending)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(all, vec![1, 2, 3, 4]);

        let by_author: Vec<_> = repo
            .list(Some(2), SortOrder::Ascending)
            .unwrap()
            .into_iter()
            .map(|c| c.body)
            .collect();
        assert_eq!(by_author, vec!["b1", "b2"]);

        for author in [None, Some(1), Some(2), Some(3)] {
            let mut asc = repo.list(author, SortOrder::Ascending).unwrap();
            let desc = repo.list(author, SortOrder::Descending).unwrap();
            asc.reverse();
            assert_eq!(asc, desc);
        }
    }

    #[test]
    fn test_list_sorts_numerically() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo(&temp_dir);
        for _ in 0..12 {
            repo.create("x", 1).unwrap();
        }

        let ids: Vec<_> = repo
            .list(None, SortOrder::Descending)
            .unwrap()
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, (1..=12).rev().collect::<Vec<_>>());
    }

    #[test]
    fn test_delete_absent_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo(&temp_dir);
        repo.create("stay", 1).unwrap();

        repo.delete(42).unwrap();
        assert_eq!(repo.count().unwrap(), 1);
        assert_eq!(repo.last_id().unwrap(), 1);
    }

    #[test]
    fn test_too_long_body_rejected_without_write() {
        let temp_dir = TempDir::new().unwrap();
        let repo = repo(&temp_dir);

        let result = repo.create(&"a".repeat(141), 1);
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(repo.count().unwrap(), 0);
        assert_eq!(repo.last_id().unwrap(), 0);

        // Exactly at the limit is fine; length counts characters, not bytes
        assert!(repo.create(&"é".repeat(140), 1).is_ok());
    }

    #[test]
    fn test_empty_body_rejected() {
        let temp_dir = TempDir::new().unwrap();
        assert!(matches!(
            repo(&temp_dir).create("", 1),
            Err(Error::Validation(_))
        ));
    }

    #[test]
    fn test_concurrent_creates_get_unique_ids() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("database.json");
        DocumentStore::open(&path).unwrap();

        let mut ids: Vec<ChirpId> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..16)
                .map(|i| {
                    let path = &path;
                    scope.spawn(move || {
                        let repo = ChirpRepository::new(DocumentStore::open(path).unwrap());
                        repo.create(&format!("chirp {}", i), 1).unwrap().id
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        ids.sort_unstable();
        assert_eq!(ids, (1..=16).collect::<Vec<_>>());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Ascending);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Descending);
        assert!(matches!(
            "sideways".parse::<SortOrder>(),
            Err(Error::Validation(_))
        ));
        assert_eq!(SortOrder::default(), SortOrder::Ascending);
    }
}
