//! Registry repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide line, image and publishing-name access over the registry schema.
//! - Resolve controlled-vocabulary terms inside SQL so callers pass plain names.
//!
//! # Invariants
//! - Unknown vocabulary terms surface as constraint errors, never as silent nulls.
//! - Deleting a line row does not cascade; callers delete dependents first.
//! - Line names are unique, and a line holds each publishing name at most once.

use crate::model::line::{CrossImage, LineId, SourcedNameEntry, SourcedPublishingName};
use crate::repo::{bool_to_int, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for `line` rows and their properties and relationships.
pub trait LineRepository {
    /// Returns ids of all lines with this exact name.
    fn find_line_ids(&self, name: &str) -> RepoResult<Vec<LineId>>;
    /// Returns the first line id with this name, if any.
    fn find_line_id(&self, name: &str) -> RepoResult<Option<LineId>> {
        Ok(self.find_line_ids(name)?.into_iter().next())
    }
    /// Behavioural sessions recorded for the line.
    fn count_sessions(&self, line: &str) -> RepoResult<i64>;
    /// Inserts a Fly Light line and returns its id.
    fn insert_line(&self, name: &str) -> RepoResult<LineId>;
    fn rename_line(&self, line_id: LineId, new_name: &str) -> RepoResult<usize>;
    /// Deletes relationships where the line is subject or object.
    fn delete_relationships(&self, line_id: LineId) -> RepoResult<usize>;
    fn delete_events(&self, line_id: LineId) -> RepoResult<usize>;
    fn delete_properties(&self, line_id: LineId) -> RepoResult<usize>;
    fn delete_line_row(&self, line_id: LineId) -> RepoResult<usize>;
    fn insert_property(&self, line_id: LineId, term: &str, value: &str) -> RepoResult<()>;
    fn update_property(&self, line_id: LineId, term: &str, value: &str) -> RepoResult<usize>;
    /// Records `child` as `child_of` `parent`.
    fn create_child_relationship(&self, child: LineId, parent: LineId) -> RepoResult<()>;
    /// Ids of the lines `line` is a `child_of`.
    fn parent_ids(&self, line: &str) -> RepoResult<Vec<LineId>>;
}

/// Repository interface for images, crosses and release metadata.
pub trait ImageRepository {
    fn count_images(&self, line: &str) -> RepoResult<i64>;
    /// Moves every image of `from` onto `to`.
    fn relink_images(&self, from: LineId, to: LineId) -> RepoResult<usize>;
    fn cross_type(&self, cross_barcode: &str) -> RepoResult<Option<String>>;
    fn cross_images(&self, cross_barcode: &str) -> RepoResult<Vec<CrossImage>>;
    /// Moves the images of one cross from `from` onto `to`.
    fn relink_cross_images(&self, cross_barcode: &str, from: LineId, to: LineId)
        -> RepoResult<usize>;
    fn move_cross_events(&self, cross_barcode: &str, to: LineId) -> RepoResult<usize>;
    /// Distinct non-empty ALPS release names attached to images.
    fn release_names(&self) -> RepoResult<Vec<String>>;
}

/// Repository interface for `publishing_name` rows.
pub trait PublishingNameRepository {
    fn delete_for_line(&self, line_id: LineId) -> RepoResult<usize>;
    /// Whether `line` (by name) already has `publishing_name`.
    fn has_line_publishing_name(&self, line: &str, publishing_name: &str) -> RepoResult<bool>;
    /// Whether the line id already has `publishing_name`.
    fn has_publishing_name(&self, line_id: LineId, publishing_name: &str) -> RepoResult<bool>;
    /// Inserts a published, preferred name noted with its release.
    fn insert_release_name(
        &self,
        line_id: LineId,
        publishing_name: &str,
        release: &str,
    ) -> RepoResult<()>;
    /// Writes a records-service name. An existing row with the same line and
    /// name takes over the serial; otherwise the row keyed on the serial is
    /// inserted or updated.
    fn upsert_sourced(&self, name: &SourcedPublishingName) -> RepoResult<()>;
    /// Names that carry a records-service serial.
    fn sourced_names(&self) -> RepoResult<Vec<SourcedNameEntry>>;
    fn delete_by_id(&self, id: i64) -> RepoResult<usize>;
}

/// Everything the registry programs need, implemented by one SQLite handle.
pub trait RegistryStore: LineRepository + ImageRepository + PublishingNameRepository {}

impl<T: LineRepository + ImageRepository + PublishingNameRepository> RegistryStore for T {}

/// SQLite-backed registry repository.
pub struct SqliteRegistryRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRegistryRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl LineRepository for SqliteRegistryRepository<'_> {
    fn find_line_ids(&self, name: &str) -> RepoResult<Vec<LineId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM line WHERE name = ?1 ORDER BY id;")?;
        let ids = stmt
            .query_map([name], |row| row.get::<_, LineId>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    fn count_sessions(&self, line: &str) -> RepoResult<i64> {
        let sessions = self
            .conn
            .query_row(
                "SELECT sessions FROM line_summary_vw WHERE line = ?1 LIMIT 1;",
                [line],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()?
            .flatten();
        Ok(sessions.unwrap_or(0))
    }

    fn insert_line(&self, name: &str) -> RepoResult<LineId> {
        self.conn.execute(
            "INSERT INTO line (name, lab_id, organism_id)
             VALUES (
                ?1,
                (SELECT id FROM cv_term WHERE cv = 'lab' AND name = 'flylight'),
                1
             );",
            [name],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn rename_line(&self, line_id: LineId, new_name: &str) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE line SET name = ?1 WHERE id = ?2;",
            params![new_name, line_id],
        )?;
        Ok(changed)
    }

    fn delete_relationships(&self, line_id: LineId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "DELETE FROM line_relationship WHERE subject_id = ?1 OR object_id = ?1;",
            [line_id],
        )?;
        Ok(changed)
    }

    fn delete_events(&self, line_id: LineId) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM line_event WHERE line_id = ?1;", [line_id])?;
        Ok(changed)
    }

    fn delete_properties(&self, line_id: LineId) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM line_property WHERE line_id = ?1;", [line_id])?;
        Ok(changed)
    }

    fn delete_line_row(&self, line_id: LineId) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM line WHERE id = ?1;", [line_id])?;
        Ok(changed)
    }

    fn insert_property(&self, line_id: LineId, term: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO line_property (line_id, type_id, value)
             VALUES (?1, (SELECT id FROM cv_term WHERE cv = 'line' AND name = ?2), ?3);",
            params![line_id, term, value],
        )?;
        Ok(())
    }

    fn update_property(&self, line_id: LineId, term: &str, value: &str) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE line_property
             SET value = ?1
             WHERE line_id = ?2
               AND type_id = (SELECT id FROM cv_term WHERE cv = 'line' AND name = ?3);",
            params![value, line_id, term],
        )?;
        Ok(changed)
    }

    fn create_child_relationship(&self, child: LineId, parent: LineId) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO line_relationship (subject_id, object_id, type_id)
             VALUES (
                ?1,
                ?2,
                (SELECT id FROM cv_term WHERE cv = 'line_relationship' AND name = 'child_of')
             );",
            params![child, parent],
        )?;
        Ok(())
    }

    fn parent_ids(&self, line: &str) -> RepoResult<Vec<LineId>> {
        let mut stmt = self.conn.prepare(
            "SELECT object_id FROM line_relationship_vw
             WHERE subject = ?1 AND relationship = 'child_of'
             ORDER BY object_id;",
        )?;
        let ids = stmt
            .query_map([line], |row| row.get::<_, LineId>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

impl ImageRepository for SqliteRegistryRepository<'_> {
    fn count_images(&self, line: &str) -> RepoResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(1) FROM image_data_mv WHERE line = ?1;",
            [line],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(count)
    }

    fn relink_images(&self, from: LineId, to: LineId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE image SET line_id = ?1 WHERE line_id = ?2;",
            params![to, from],
        )?;
        Ok(changed)
    }

    fn cross_type(&self, cross_barcode: &str) -> RepoResult<Option<String>> {
        let cross_type = self
            .conn
            .query_row(
                "SELECT cross_type FROM cross_event_vw WHERE cross_barcode = ?1 LIMIT 1;",
                [cross_barcode],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(cross_type)
    }

    fn cross_images(&self, cross_barcode: &str) -> RepoResult<Vec<CrossImage>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, line FROM image_data_mv WHERE cross_barcode = ?1 ORDER BY id;",
        )?;
        let images = stmt
            .query_map([cross_barcode], |row| {
                Ok(CrossImage {
                    image_id: row.get("id")?,
                    line: row.get("line")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(images)
    }

    fn relink_cross_images(
        &self,
        cross_barcode: &str,
        from: LineId,
        to: LineId,
    ) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE image SET line_id = ?1 WHERE cross_barcode = ?2 AND line_id = ?3;",
            params![to, cross_barcode, from],
        )?;
        Ok(changed)
    }

    fn move_cross_events(&self, cross_barcode: &str, to: LineId) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE cross_event SET line_id = ?1 WHERE cross_barcode = ?2;",
            params![to, cross_barcode],
        )?;
        Ok(changed)
    }

    fn release_names(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT value FROM image_property_vw
             WHERE type = 'alps_release' AND value != ''
             ORDER BY 1;",
        )?;
        let releases = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(releases)
    }
}

impl PublishingNameRepository for SqliteRegistryRepository<'_> {
    fn delete_for_line(&self, line_id: LineId) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM publishing_name WHERE line_id = ?1;", [line_id])?;
        Ok(changed)
    }

    fn has_line_publishing_name(&self, line: &str, publishing_name: &str) -> RepoResult<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM publishing_name_vw
                WHERE line = ?1 AND publishing_name = ?2
            );",
            params![line, publishing_name],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(exists == 1)
    }

    fn has_publishing_name(&self, line_id: LineId, publishing_name: &str) -> RepoResult<bool> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM publishing_name
                WHERE line_id = ?1 AND publishing_name = ?2
            );",
            params![line_id, publishing_name],
            |row| row.get::<_, i64>(0),
        )?;
        Ok(exists == 1)
    }

    fn insert_release_name(
        &self,
        line_id: LineId,
        publishing_name: &str,
        release: &str,
    ) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO publishing_name (
                publishing_name,
                line_id,
                for_publishing,
                published,
                display_genotype,
                requester,
                notes,
                preferred_name
            ) VALUES (?1, ?2, 1, 1, 0, '', ?3, 1);",
            params![publishing_name, line_id, release],
        )?;
        Ok(())
    }

    fn upsert_sourced(&self, name: &SourcedPublishingName) -> RepoResult<()> {
        let existing = self
            .conn
            .query_row(
                "SELECT id FROM publishing_name WHERE line_id = ?1 AND publishing_name = ?2;",
                params![name.line_id, name.publishing_name.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        let Some(id) = existing else {
            self.conn.execute(
                "INSERT INTO publishing_name (
                    line_id,
                    source_id,
                    publishing_name,
                    for_publishing,
                    published,
                    label,
                    requester,
                    notes,
                    source_create_date,
                    preferred_name
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT (source_id) DO UPDATE SET
                    line_id = excluded.line_id,
                    publishing_name = excluded.publishing_name,
                    for_publishing = excluded.for_publishing,
                    published = excluded.published,
                    label = excluded.label,
                    requester = excluded.requester,
                    notes = excluded.notes;",
                params![
                    name.line_id,
                    name.source_id,
                    name.publishing_name.as_str(),
                    bool_to_int(name.for_publishing),
                    bool_to_int(name.published),
                    bool_to_int(name.label),
                    name.requester.as_str(),
                    name.notes.as_str(),
                    name.source_create_date.as_str(),
                    bool_to_int(name.preferred_name),
                ],
            )?;
            return Ok(());
        };

        // The serial now belongs to the existing (line, name) row.
        self.conn.execute(
            "DELETE FROM publishing_name WHERE source_id = ?1 AND id <> ?2;",
            params![name.source_id, id],
        )?;
        self.conn.execute(
            "UPDATE publishing_name SET
                source_id = ?2,
                for_publishing = ?3,
                published = ?4,
                label = ?5,
                requester = ?6,
                notes = ?7,
                source_create_date = COALESCE(source_create_date, ?8)
            WHERE id = ?1;",
            params![
                id,
                name.source_id,
                bool_to_int(name.for_publishing),
                bool_to_int(name.published),
                bool_to_int(name.label),
                name.requester.as_str(),
                name.notes.as_str(),
                name.source_create_date.as_str(),
            ],
        )?;
        Ok(())
    }

    fn sourced_names(&self) -> RepoResult<Vec<SourcedNameEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, source_id, line FROM publishing_name_vw
             WHERE source_id IS NOT NULL
             ORDER BY source_id;",
        )?;
        let entries = stmt
            .query_map([], |row| {
                Ok(SourcedNameEntry {
                    id: row.get("id")?,
                    source_id: row.get("source_id")?,
                    line: row.get("line")?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    fn delete_by_id(&self, id: i64) -> RepoResult<usize> {
        let changed = self
            .conn
            .execute("DELETE FROM publishing_name WHERE id = ?1;", [id])?;
        Ok(changed)
    }
}
