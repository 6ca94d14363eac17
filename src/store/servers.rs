//! Server repository
//!
//! Administrative surface for the monitored-server registry: create,
//! list, fetch with its log entries, delete. Deleting a server cascades
//! to its entries at the store level.

use super::db::{Database, StoreError};
use super::model::{log_entry_from_row, LogEntry, NewServer, Server};
use rusqlite::params;

pub struct ServerRepository {
    db: Database,
}

impl ServerRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn create(&self, server: NewServer) -> Result<Server, StoreError> {
        let conn = self.db.conn();

        conn.execute(
            "INSERT INTO servers (name, description, ip_address) VALUES (?1, ?2, ?3)",
            params![server.name, server.description, server.ip_address],
        )?;

        let id = conn.last_insert_rowid();
        log::info!("Registered server '{}' (id={})", server.name, id);

        Ok(Server {
            id,
            name: server.name,
            description: server.description,
            ip_address: server.ip_address,
        })
    }

    pub fn list(&self) -> Result<Vec<Server>, StoreError> {
        let conn = self.db.conn();
        let mut stmt =
            conn.prepare("SELECT id, name, description, ip_address FROM servers ORDER BY id")?;

        let servers = stmt
            .query_map([], |row| {
                Ok(Server {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    ip_address: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(servers)
    }

    pub fn get(&self, id: i64) -> Result<Server, StoreError> {
        let conn = self.db.conn();

        conn.query_row(
            "SELECT id, name, description, ip_address FROM servers WHERE id = ?1",
            [id],
            |row| {
                Ok(Server {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    ip_address: row.get(3)?,
                })
            },
        )
        .map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                StoreError::NotFound(format!("server {}", id))
            }
            other => StoreError::Database(other),
        })
    }

    /// Fetch a server together with its log entries, oldest first
    pub fn get_with_entries(&self, id: i64) -> Result<(Server, Vec<LogEntry>), StoreError> {
        let server = self.get(id)?;

        let conn = self.db.conn();
        let mut stmt = conn.prepare(
            "SELECT id, server_id, timestamp, tz_offset, remote_addr, method,
                    uri, http_version, status, size, referrer, user_agent
             FROM log_entries
             WHERE server_id = ?1
             ORDER BY timestamp",
        )?;

        let entries = stmt
            .query_map([id], log_entry_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((server, entries))
    }

    pub fn delete(&self, id: i64) -> Result<(), StoreError> {
        let conn = self.db.conn();
        let affected = conn.execute("DELETE FROM servers WHERE id = ?1", [id])?;

        if affected == 0 {
            return Err(StoreError::NotFound(format!("server {}", id)));
        }

        log::info!("Deleted server {} (entries cascade)", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, Database, ServerRepository) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(dir.path().join("test.db")).unwrap();
        db.run_schema_migrations("sql").unwrap();
        let repo = ServerRepository::new(db.clone());
        (dir, db, repo)
    }

    fn make_server(name: &str) -> NewServer {
        NewServer {
            name: name.to_string(),
            description: Some("edge node".to_string()),
            ip_address: "10.0.0.1".to_string(),
        }
    }

    fn insert_entry(db: &Database, server_id: i64, epoch: i64) {
        db.conn()
            .execute(
                "INSERT INTO log_entries (server_id, timestamp, tz_offset, remote_addr, method,
                                          uri, http_version, status, size, referrer, user_agent)
                 VALUES (?1, ?2, 0, '203.0.113.5', 'GET', '/', 'HTTP/1.1', 200, 100, NULL, NULL)",
                params![server_id, epoch],
            )
            .unwrap();
    }

    #[test]
    fn test_create_and_get() {
        let (_dir, _db, repo) = setup();

        let created = repo.create(make_server("web-1")).unwrap();
        assert!(created.id > 0);

        let fetched = repo.get(created.id).unwrap();
        assert_eq!(fetched.name, "web-1");
        assert_eq!(fetched.description.as_deref(), Some("edge node"));
    }

    #[test]
    fn test_names_are_unique() {
        let (_dir, _db, repo) = setup();

        repo.create(make_server("web-1")).unwrap();
        assert!(repo.create(make_server("web-1")).is_err());
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let (_dir, _db, repo) = setup();

        match repo.get(42) {
            Err(StoreError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {:?}", other.map(|s| s.id)),
        }
    }

    #[test]
    fn test_get_with_entries_orders_by_timestamp() {
        let (_dir, db, repo) = setup();
        let server = repo.create(make_server("web-1")).unwrap();

        insert_entry(&db, server.id, 1_700_000_300);
        insert_entry(&db, server.id, 1_700_000_100);
        insert_entry(&db, server.id, 1_700_000_200);

        let (_, entries) = repo.get_with_entries(server.id).unwrap();
        let stamps: Vec<i64> = entries.iter().map(|e| e.timestamp.timestamp()).collect();
        assert_eq!(stamps, vec![1_700_000_100, 1_700_000_200, 1_700_000_300]);
    }

    #[test]
    fn test_delete_cascades_to_entries() {
        let (_dir, db, repo) = setup();
        let server = repo.create(make_server("web-1")).unwrap();
        insert_entry(&db, server.id, 1_700_000_000);

        repo.delete(server.id).unwrap();

        let count: i64 = db
            .conn()
            .query_row("SELECT COUNT(*) FROM log_entries", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);

        assert!(matches!(repo.delete(server.id), Err(StoreError::NotFound(_))));
    }
}
