use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use rusqlite::{params, Connection};

use fleetwatch_core::{ClassState, DeviceClass, DeviceRecord};
use fleetwatch_store::{StateStore, StoreError};

/// Sqlite-backed state store. Device records are stored as JSON columns;
/// commit replaces the staged classes' rows inside a single transaction, so
/// snapshot table and actionable set can never go durable separately.
pub struct SqliteStore {
    conn: Connection,
    pending: HashMap<DeviceClass, ClassState>,
}

impl SqliteStore {
    pub fn open(db_path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(db_path)
            .map_err(|e| StoreError::Backend(format!("open {}: {e}", db_path.display())))?;
        let init_sql = include_str!("../migrations/0001_init.sql");
        conn.execute_batch(init_sql).map_err(backend)?;
        Ok(Self {
            conn,
            pending: HashMap::new(),
        })
    }

    fn decode_record(json: &str) -> Result<DeviceRecord, StoreError> {
        serde_json::from_str(json).map_err(|e| StoreError::Corrupt(format!("device record: {e}")))
    }

    fn encode_record(record: &DeviceRecord) -> Result<String, StoreError> {
        serde_json::to_string(record).map_err(|e| StoreError::Backend(e.to_string()))
    }
}

fn backend(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

impl StateStore for SqliteStore {
    fn load(&self, class: DeviceClass) -> Result<Option<ClassState>, StoreError> {
        let known: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(1) FROM classes WHERE class = ?1",
                params![class.as_str()],
                |r| r.get(0),
            )
            .map_err(backend)?;
        if known == 0 {
            return Ok(None);
        }

        let mut devices = Vec::new();
        {
            let mut stmt = self
                .conn
                .prepare("SELECT record_json FROM devices WHERE class = ?1 ORDER BY position")
                .map_err(backend)?;
            let rows = stmt
                .query_map(params![class.as_str()], |r| r.get::<_, String>(0))
                .map_err(backend)?;
            for row in rows {
                devices.push(Self::decode_record(&row.map_err(backend)?)?);
            }
        }

        let mut actionable = BTreeMap::new();
        {
            let mut stmt = self
                .conn
                .prepare("SELECT global_identifier, record_json FROM actionable WHERE class = ?1")
                .map_err(backend)?;
            let rows = stmt
                .query_map(params![class.as_str()], |r| {
                    Ok((r.get::<_, String>(0)?, r.get::<_, String>(1)?))
                })
                .map_err(backend)?;
            for row in rows {
                let (global, json) = row.map_err(backend)?;
                actionable.insert(global, Self::decode_record(&json)?);
            }
        }

        Ok(Some(ClassState { devices, actionable }))
    }

    fn stage(&mut self, class: DeviceClass, state: ClassState) {
        self.pending.insert(class, state);
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let staged: Vec<(DeviceClass, ClassState)> = self.pending.drain().collect();

        let tx = self.conn.transaction().map_err(backend)?;
        for (class, state) in &staged {
            tx.execute(
                "INSERT OR IGNORE INTO classes (class) VALUES (?1)",
                params![class.as_str()],
            )
            .map_err(backend)?;
            tx.execute(
                "DELETE FROM devices WHERE class = ?1",
                params![class.as_str()],
            )
            .map_err(backend)?;
            tx.execute(
                "DELETE FROM actionable WHERE class = ?1",
                params![class.as_str()],
            )
            .map_err(backend)?;

            for (position, record) in state.devices.iter().enumerate() {
                tx.execute(
                    "INSERT INTO devices (class, position, global_identifier, record_json)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![
                        class.as_str(),
                        position as i64,
                        record.global_identifier.as_str(),
                        Self::encode_record(record)?
                    ],
                )
                .map_err(backend)?;
            }
            for (global, record) in &state.actionable {
                tx.execute(
                    "INSERT INTO actionable (class, global_identifier, record_json)
                     VALUES (?1, ?2, ?3)",
                    params![class.as_str(), global, Self::encode_record(record)?],
                )
                .map_err(backend)?;
            }
        }
        tx.commit().map_err(backend)?;
        Ok(())
    }
}
