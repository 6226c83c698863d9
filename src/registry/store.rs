//! SQLite-backed registry store.
//!
//! One connection per store. Schema is created idempotently on open. Point
//! lookups map `QueryReturnedNoRows` to `Ok(None)`; batch writes (searchable
//! flags, discovered organizations) run inside a single transaction so a
//! failed commit leaves no partial batch behind.

use crate::error::Result;
use crate::registry::models::{
    Disease, DiseaseUpdate, NewDisease, NewOrganization, Organization, OrganizationCategory,
    VerificationStatus,
};
use chrono::Utc;
use rusqlite::{params, Connection, Row};
use std::path::Path;

/// Registry store owning the SQLite connection.
pub struct RegistryStore {
    conn: Connection,
}

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS diseases (
    id INTEGER PRIMARY KEY,
    external_id TEXT UNIQUE,
    name TEXT NOT NULL,
    name_kana TEXT,
    name_english TEXT,
    overview TEXT,
    parent_external_id TEXT,
    search_keywords TEXT,
    is_searchable INTEGER NOT NULL DEFAULT 0,
    is_designated_intractable INTEGER NOT NULL DEFAULT 0,
    is_chronic_childhood INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_diseases_external ON diseases(external_id);
CREATE INDEX IF NOT EXISTS idx_diseases_parent ON diseases(parent_external_id);

CREATE TABLE IF NOT EXISTS organizations (
    id INTEGER PRIMARY KEY,
    disease_id INTEGER NOT NULL REFERENCES diseases(id),
    name TEXT NOT NULL,
    url TEXT,
    description TEXT,
    contact TEXT,
    category TEXT NOT NULL DEFAULT 'patient',
    source_url TEXT,
    relevance_score REAL NOT NULL DEFAULT 0,
    verification_status TEXT NOT NULL DEFAULT 'pending',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_organizations_disease ON organizations(disease_id);
";

const DISEASE_COLUMNS: &str = "id, external_id, name, name_kana, name_english, overview, \
     parent_external_id, search_keywords, is_searchable, is_designated_intractable, \
     is_chronic_childhood, created_at, updated_at";

const ORGANIZATION_COLUMNS: &str = "id, disease_id, name, url, description, contact, category, \
     source_url, relevance_score, verification_status, created_at, updated_at";

fn disease_from_row(row: &Row) -> rusqlite::Result<Disease> {
    let keywords_json: Option<String> = row.get(7)?;
    let search_keywords = keywords_json
        .as_deref()
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default();
    Ok(Disease {
        id: row.get(0)?,
        external_id: row.get(1)?,
        name: row.get(2)?,
        name_kana: row.get(3)?,
        name_english: row.get(4)?,
        overview: row.get(5)?,
        parent_external_id: row.get(6)?,
        search_keywords,
        is_searchable: row.get(8)?,
        is_designated_intractable: row.get(9)?,
        is_chronic_childhood: row.get(10)?,
        created_at: row.get(11)?,
        updated_at: row.get(12)?,
    })
}

fn organization_from_row(row: &Row) -> rusqlite::Result<Organization> {
    let category: String = row.get(6)?;
    let status: String = row.get(9)?;
    Ok(Organization {
        id: row.get(0)?,
        disease_id: row.get(1)?,
        name: row.get(2)?,
        url: row.get(3)?,
        description: row.get(4)?,
        contact: row.get(5)?,
        category: OrganizationCategory::parse(&category).unwrap_or(OrganizationCategory::Patient),
        source_url: row.get(7)?,
        relevance_score: row.get(8)?,
        verification_status: VerificationStatus::parse(&status)
            .unwrap_or(VerificationStatus::Pending),
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn keywords_to_json(keywords: &[String]) -> Option<String> {
    if keywords.is_empty() {
        None
    } else {
        serde_json::to_string(keywords).ok()
    }
}

fn lookup_id(conn: &Connection, sql: &str, param: &str) -> rusqlite::Result<Option<i64>> {
    match conn.query_row(sql, params![param], |row| row.get(0)) {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Result of a bulk import transaction.
#[derive(Debug, Default)]
pub struct UpsertOutcome {
    pub inserted: usize,
    pub updated: usize,
    /// (caller marker, reason) for rows that failed inside the transaction.
    pub row_errors: Vec<(usize, String)>,
}

impl RegistryStore {
    /// Open or create the registry database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Open an in-memory database (tests, dry runs).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ── Diseases ────────────────────────────────────────────────────

    /// Insert a disease and return the stored row.
    pub fn insert_disease(&self, new: &NewDisease) -> Result<Disease> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO diseases (external_id, name, name_kana, name_english, overview, \
             parent_external_id, search_keywords, is_searchable, is_designated_intractable, \
             is_chronic_childhood, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            params![
                new.external_id,
                new.name,
                new.name_kana,
                new.name_english,
                new.overview,
                new.parent_external_id,
                keywords_to_json(&new.search_keywords),
                new.is_searchable,
                new.is_designated_intractable,
                new.is_chronic_childhood,
                now,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {DISEASE_COLUMNS} FROM diseases WHERE id = ?1"))?;
        Ok(stmt.query_row(params![id], disease_from_row)?)
    }

    /// Fetch a disease by primary key.
    pub fn get_disease(&self, id: i64) -> Result<Option<Disease>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {DISEASE_COLUMNS} FROM diseases WHERE id = ?1"))?;
        match stmt.query_row(params![id], disease_from_row) {
            Ok(d) => Ok(Some(d)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch a disease by NANDO identifier.
    pub fn get_disease_by_external_id(&self, external_id: &str) -> Result<Option<Disease>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DISEASE_COLUMNS} FROM diseases WHERE external_id = ?1"
        ))?;
        match stmt.query_row(params![external_id], disease_from_row) {
            Ok(d) => Ok(Some(d)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch a disease by exact name. Returns the first match.
    pub fn get_disease_by_name(&self, name: &str) -> Result<Option<Disease>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DISEASE_COLUMNS} FROM diseases WHERE name = ?1 ORDER BY id LIMIT 1"
        ))?;
        match stmt.query_row(params![name], disease_from_row) {
            Ok(d) => Ok(Some(d)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Paginated listing. `limit < 0` means no limit.
    pub fn list_diseases(
        &self,
        limit: i64,
        offset: i64,
        searchable_only: bool,
    ) -> Result<Vec<Disease>> {
        let sql = if searchable_only {
            format!(
                "SELECT {DISEASE_COLUMNS} FROM diseases WHERE is_searchable = 1 \
                 ORDER BY id LIMIT ?1 OFFSET ?2"
            )
        } else {
            format!("SELECT {DISEASE_COLUMNS} FROM diseases ORDER BY id LIMIT ?1 OFFSET ?2")
        };
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![limit, offset], disease_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Every disease row, in insertion order.
    pub fn all_diseases(&self) -> Result<Vec<Disease>> {
        self.list_diseases(-1, 0, false)
    }

    /// Diseases with the operator flag set (manual classifier mode).
    pub fn searchable_flagged(&self) -> Result<Vec<Disease>> {
        self.list_diseases(-1, 0, true)
    }

    /// Direct children of a taxonomy node, by its external id.
    pub fn children_of(&self, external_id: &str) -> Result<Vec<Disease>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DISEASE_COLUMNS} FROM diseases WHERE parent_external_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![external_id], disease_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Substring search across name, kana, english name, and the keyword
    /// blob.
    pub fn search_diseases(&self, query: &str) -> Result<Vec<Disease>> {
        let pattern = format!("%{query}%");
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {DISEASE_COLUMNS} FROM diseases \
             WHERE name LIKE ?1 OR name_kana LIKE ?1 OR name_english LIKE ?1 \
                OR search_keywords LIKE ?1 \
             ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![pattern], disease_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Apply a partial update. Returns the updated row, or None if the id
    /// does not exist.
    pub fn update_disease(&self, id: i64, update: &DiseaseUpdate) -> Result<Option<Disease>> {
        let Some(mut disease) = self.get_disease(id)? else {
            return Ok(None);
        };
        if let Some(name) = &update.name {
            disease.name = name.clone();
        }
        if update.name_kana.is_some() {
            disease.name_kana = update.name_kana.clone();
        }
        if update.name_english.is_some() {
            disease.name_english = update.name_english.clone();
        }
        if update.overview.is_some() {
            disease.overview = update.overview.clone();
        }
        if let Some(keywords) = &update.search_keywords {
            disease.search_keywords = keywords.clone();
        }
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "UPDATE diseases SET name = ?1, name_kana = ?2, name_english = ?3, overview = ?4, \
             search_keywords = ?5, updated_at = ?6 WHERE id = ?7",
            params![
                disease.name,
                disease.name_kana,
                disease.name_english,
                disease.overview,
                keywords_to_json(&disease.search_keywords),
                now,
                id,
            ],
        )?;
        self.get_disease(id)
    }

    /// Import path: refresh name (and english name when the label is
    /// non-Japanese) on an existing row.
    pub fn update_imported_names(
        &self,
        id: i64,
        name: &str,
        name_english: Option<&str>,
    ) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        match name_english {
            Some(en) => self.conn.execute(
                "UPDATE diseases SET name = ?1, name_english = ?2, updated_at = ?3 WHERE id = ?4",
                params![name, en, now, id],
            )?,
            None => self.conn.execute(
                "UPDATE diseases SET name = ?1, updated_at = ?2 WHERE id = ?3",
                params![name, now, id],
            )?,
        };
        Ok(())
    }

    /// Set the operator searchable flag. Returns false if the id is unknown.
    pub fn set_searchable(&self, id: i64, flag: bool) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let rows = self.conn.execute(
            "UPDATE diseases SET is_searchable = ?1, updated_at = ?2 WHERE id = ?3",
            params![flag, now, id],
        )?;
        Ok(rows > 0)
    }

    /// Batch searchable-flag update inside one transaction. Unknown ids are
    /// skipped; returns the count actually updated.
    pub fn set_searchable_batch(&mut self, updates: &[(i64, bool)]) -> Result<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut updated = 0usize;
        for (id, flag) in updates {
            updated += tx.execute(
                "UPDATE diseases SET is_searchable = ?1, updated_at = ?2 WHERE id = ?3",
                params![flag, now, id],
            )?;
        }
        tx.commit()?;
        Ok(updated)
    }

    /// Upsert a parsed import batch in one transaction. Each row carries a
    /// caller marker (source row number) used to report per-row failures;
    /// a failed row is skipped, the rest of the batch still commits.
    pub fn upsert_imported(&mut self, rows: &[(usize, NewDisease)]) -> Result<UpsertOutcome> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut outcome = UpsertOutcome::default();
        for (marker, row) in rows {
            let existing = match &row.external_id {
                Some(ext) => lookup_id(
                    &tx,
                    "SELECT id FROM diseases WHERE external_id = ?1",
                    ext,
                ),
                None => lookup_id(
                    &tx,
                    "SELECT id FROM diseases WHERE name = ?1 ORDER BY id LIMIT 1",
                    &row.name,
                ),
            };
            let result = match existing {
                Ok(Some(id)) => tx
                    .execute(
                        "UPDATE diseases SET name = ?1, \
                         name_english = COALESCE(?2, name_english), \
                         name_kana = COALESCE(?3, name_kana), \
                         overview = COALESCE(?4, overview), \
                         updated_at = ?5 WHERE id = ?6",
                        params![row.name, row.name_english, row.name_kana, row.overview, now, id],
                    )
                    .map(|_| {
                        outcome.updated += 1;
                    }),
                Ok(None) => tx
                    .execute(
                        "INSERT INTO diseases (external_id, name, name_kana, name_english, \
                         overview, parent_external_id, search_keywords, is_searchable, \
                         is_designated_intractable, is_chronic_childhood, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                        params![
                            row.external_id,
                            row.name,
                            row.name_kana,
                            row.name_english,
                            row.overview,
                            row.parent_external_id,
                            keywords_to_json(&row.search_keywords),
                            row.is_searchable,
                            row.is_designated_intractable,
                            row.is_chronic_childhood,
                            now,
                        ],
                    )
                    .map(|_| {
                        outcome.inserted += 1;
                    }),
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                outcome.row_errors.push((*marker, e.to_string()));
            }
        }
        tx.commit()?;
        Ok(outcome)
    }

    /// Total disease count.
    pub fn count_diseases(&self) -> Result<i64> {
        let count =
            self.conn
                .query_row("SELECT COUNT(*) FROM diseases", [], |row| row.get(0))?;
        Ok(count)
    }

    // ── Organizations ───────────────────────────────────────────────

    /// Persist one discovery run's accepted organizations in a single
    /// transaction. All rows start `pending`.
    pub fn insert_organizations(
        &mut self,
        disease_id: i64,
        orgs: &[NewOrganization],
    ) -> Result<Vec<i64>> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let mut ids = Vec::with_capacity(orgs.len());
        for org in orgs {
            tx.execute(
                "INSERT INTO organizations (disease_id, name, url, description, contact, \
                 category, source_url, relevance_score, verification_status, created_at, \
                 updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 'pending', ?9, ?9)",
                params![
                    disease_id,
                    org.name,
                    org.url,
                    org.description,
                    org.contact,
                    org.category.as_str(),
                    org.source_url,
                    org.relevance_score,
                    now,
                ],
            )?;
            ids.push(tx.last_insert_rowid());
        }
        tx.commit()?;
        Ok(ids)
    }

    /// Stored organizations for a disease.
    pub fn organizations_for_disease(&self, disease_id: i64) -> Result<Vec<Organization>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE disease_id = ?1 ORDER BY id"
        ))?;
        let rows = stmt
            .query_map(params![disease_id], organization_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    /// Fetch one organization.
    pub fn get_organization(&self, id: i64) -> Result<Option<Organization>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE id = ?1"
        ))?;
        match stmt.query_row(params![id], organization_from_row) {
            Ok(o) => Ok(Some(o)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Move an organization's verification status. Returns false if the id
    /// is unknown.
    pub fn set_organization_status(&self, id: i64, status: VerificationStatus) -> Result<bool> {
        let now = Utc::now().to_rfc3339();
        let rows = self.conn.execute(
            "UPDATE organizations SET verification_status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status.as_str(), now, id],
        )?;
        Ok(rows > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_disease(name: &str, external_id: Option<&str>) -> NewDisease {
        NewDisease {
            external_id: external_id.map(String::from),
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_disease_roundtrip() {
        let store = RegistryStore::open_in_memory().unwrap();
        let mut new = sample_disease("筋萎縮性側索硬化症", Some("NANDO:1200003"));
        new.name_kana = Some("きんいしゅくせいそくさくこうかしょう".into());
        new.name_english = Some("Amyotrophic lateral sclerosis".into());
        new.search_keywords = vec!["ALS".into(), "運動ニューロン病".into()];

        let stored = store.insert_disease(&new).unwrap();
        assert!(stored.id > 0);

        let fetched = store.get_disease(stored.id).unwrap().unwrap();
        assert_eq!(fetched.name, "筋萎縮性側索硬化症");
        assert_eq!(fetched.search_keywords, vec!["ALS", "運動ニューロン病"]);
        assert!(!fetched.is_searchable);
        assert!(!fetched.created_at.is_empty());
    }

    #[test]
    fn test_get_disease_missing_is_none() {
        let store = RegistryStore::open_in_memory().unwrap();
        assert!(store.get_disease(999).unwrap().is_none());
        assert!(store
            .get_disease_by_external_id("NANDO:0000000")
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_open_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("registry.db");
        let store = RegistryStore::open(&path).unwrap();
        store
            .insert_disease(&sample_disease("テスト疾患", None))
            .unwrap();
        drop(store);

        let reopened = RegistryStore::open(&path).unwrap();
        assert_eq!(reopened.count_diseases().unwrap(), 1);
    }

    #[test]
    fn test_search_hits_kana_and_keywords() {
        let store = RegistryStore::open_in_memory().unwrap();
        let mut a = sample_disease("筋萎縮性側索硬化症", Some("NANDO:1200003"));
        a.search_keywords = vec!["ALS".into()];
        store.insert_disease(&a).unwrap();
        let mut b = sample_disease("パーキンソン病", Some("NANDO:1200014"));
        b.name_kana = Some("ぱーきんそんびょう".into());
        store.insert_disease(&b).unwrap();

        assert_eq!(store.search_diseases("ALS").unwrap().len(), 1);
        assert_eq!(store.search_diseases("ぱーきんそん").unwrap().len(), 1);
        assert_eq!(store.search_diseases("該当なし").unwrap().len(), 0);
    }

    #[test]
    fn test_list_pagination_and_flag_filter() {
        let store = RegistryStore::open_in_memory().unwrap();
        for i in 0..5 {
            let d = store
                .insert_disease(&sample_disease(&format!("疾患{i}"), None))
                .unwrap();
            if i % 2 == 0 {
                store.set_searchable(d.id, true).unwrap();
            }
        }
        assert_eq!(store.list_diseases(2, 0, false).unwrap().len(), 2);
        assert_eq!(store.list_diseases(2, 4, false).unwrap().len(), 1);
        assert_eq!(store.searchable_flagged().unwrap().len(), 3);
    }

    #[test]
    fn test_searchable_batch_skips_unknown_ids() {
        let mut store = RegistryStore::open_in_memory().unwrap();
        let a = store.insert_disease(&sample_disease("疾患A", None)).unwrap();
        let b = store.insert_disease(&sample_disease("疾患B", None)).unwrap();

        let updated = store
            .set_searchable_batch(&[(a.id, true), (b.id, true), (9999, true)])
            .unwrap();
        assert_eq!(updated, 2);
        assert!(store.get_disease(a.id).unwrap().unwrap().is_searchable);
    }

    #[test]
    fn test_update_disease_partial() {
        let store = RegistryStore::open_in_memory().unwrap();
        let d = store.insert_disease(&sample_disease("疾患A", None)).unwrap();

        let update = DiseaseUpdate {
            search_keywords: Some(vec!["キーワード".into()]),
            overview: Some("概要".into()),
            ..Default::default()
        };
        let updated = store.update_disease(d.id, &update).unwrap().unwrap();
        assert_eq!(updated.name, "疾患A");
        assert_eq!(updated.overview.as_deref(), Some("概要"));
        assert_eq!(updated.search_keywords, vec!["キーワード"]);

        assert!(store.update_disease(9999, &update).unwrap().is_none());
    }

    #[test]
    fn test_upsert_imported_inserts_then_updates() {
        let mut store = RegistryStore::open_in_memory().unwrap();
        let rows = vec![
            (
                0usize,
                NewDisease {
                    external_id: Some("NANDO:1".into()),
                    name: "疾患A".into(),
                    ..Default::default()
                },
            ),
            (
                1usize,
                NewDisease {
                    name: "疾患B".into(),
                    ..Default::default()
                },
            ),
        ];
        let outcome = store.upsert_imported(&rows).unwrap();
        assert_eq!(outcome.inserted, 2);
        assert_eq!(outcome.updated, 0);
        assert!(outcome.row_errors.is_empty());

        // re-import matches by external id, then by exact name
        let rows = vec![
            (
                0usize,
                NewDisease {
                    external_id: Some("NANDO:1".into()),
                    name: "疾患A改".into(),
                    name_english: Some("Disease A".into()),
                    ..Default::default()
                },
            ),
            (
                1usize,
                NewDisease {
                    name: "疾患B".into(),
                    name_kana: Some("しっかんびー".into()),
                    ..Default::default()
                },
            ),
        ];
        let outcome = store.upsert_imported(&rows).unwrap();
        assert_eq!(outcome.inserted, 0);
        assert_eq!(outcome.updated, 2);

        let a = store.get_disease_by_external_id("NANDO:1").unwrap().unwrap();
        assert_eq!(a.name, "疾患A改");
        assert_eq!(a.name_english.as_deref(), Some("Disease A"));
        let b = store.get_disease_by_name("疾患B").unwrap().unwrap();
        assert_eq!(b.name_kana.as_deref(), Some("しっかんびー"));
        assert_eq!(store.count_diseases().unwrap(), 2);
    }

    #[test]
    fn test_organization_batch_roundtrip() {
        let mut store = RegistryStore::open_in_memory().unwrap();
        let d = store
            .insert_disease(&sample_disease("筋萎縮性側索硬化症", None))
            .unwrap();

        let orgs = vec![
            NewOrganization {
                name: "日本ALS協会".into(),
                url: Some("https://alsjapan.org".into()),
                description: Some("患者と家族の会".into()),
                contact: Some("03-0000-0000".into()),
                category: OrganizationCategory::Patient,
                source_url: Some("https://example.com/page".into()),
                relevance_score: 90.0,
            },
            NewOrganization {
                name: "難病支援ネット".into(),
                url: None,
                description: None,
                contact: None,
                category: OrganizationCategory::Support,
                source_url: None,
                relevance_score: 90.0,
            },
        ];
        let ids = store.insert_organizations(d.id, &orgs).unwrap();
        assert_eq!(ids.len(), 2);

        let stored = store.organizations_for_disease(d.id).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].verification_status, VerificationStatus::Pending);
        assert_eq!(stored[0].relevance_score, 90.0);
        assert_eq!(stored[1].category, OrganizationCategory::Support);
    }

    #[test]
    fn test_organization_status_update() {
        let mut store = RegistryStore::open_in_memory().unwrap();
        let d = store.insert_disease(&sample_disease("疾患A", None)).unwrap();
        let ids = store
            .insert_organizations(
                d.id,
                &[NewOrganization {
                    name: "患者会".into(),
                    url: None,
                    description: None,
                    contact: None,
                    category: OrganizationCategory::Patient,
                    source_url: None,
                    relevance_score: 90.0,
                }],
            )
            .unwrap();

        assert!(store
            .set_organization_status(ids[0], VerificationStatus::Verified)
            .unwrap());
        let org = store.get_organization(ids[0]).unwrap().unwrap();
        assert_eq!(org.verification_status, VerificationStatus::Verified);

        assert!(!store
            .set_organization_status(9999, VerificationStatus::Rejected)
            .unwrap());
    }
}
