use std::collections::BTreeMap;

use rusqlite::Connection;

use crate::db::savepoint;
use crate::error::Result;

const UPSERT_SETTING: &str = "
INSERT INTO settings (key, value) VALUES (?1, ?2)
ON CONFLICT(key) DO UPDATE SET value = excluded.value
";

/// Insert or overwrite every entry of `values` in one transaction.
pub fn set_many(conn: &Connection, values: &BTreeMap<String, String>) -> Result<()> {
    savepoint(conn, "set_settings", |conn| {
        let mut stmt = conn.prepare_cached(UPSERT_SETTING)?;
        for (key, value) in values {
            stmt.execute([key, value])?;
        }
        Ok(())
    })
}

pub fn get_all(conn: &Connection) -> Result<BTreeMap<String, String>> {
    let mut stmt = conn.prepare("SELECT key, value FROM settings")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        ))
    })?;
    rows.collect::<rusqlite::Result<_>>().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    fn map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn empty_by_default() {
        let conn = db::open_memory().unwrap();
        assert!(get_all(&conn).unwrap().is_empty());
    }

    #[test]
    fn upsert_overwrites() {
        let conn = db::open_memory().unwrap();
        set_many(&conn, &map(&[("intro_shown", "false"), ("theme", "dark")])).unwrap();
        set_many(&conn, &map(&[("intro_shown", "true")])).unwrap();
        assert_eq!(
            get_all(&conn).unwrap(),
            map(&[("intro_shown", "true"), ("theme", "dark")])
        );
    }

    #[test]
    fn upsert_is_idempotent() {
        let conn = db::open_memory().unwrap();
        let values = map(&[("a", "1"), ("b", "")]);
        set_many(&conn, &values).unwrap();
        let once = get_all(&conn).unwrap();
        set_many(&conn, &values).unwrap();
        assert_eq!(get_all(&conn).unwrap(), once);
        assert_eq!(once, values);
    }

    #[test]
    fn settings_are_independent_of_tasks() {
        let conn = db::open_memory().unwrap();
        set_many(&conn, &map(&[("k", "v")])).unwrap();
        conn.execute("DELETE FROM todos", []).unwrap();
        assert_eq!(get_all(&conn).unwrap(), map(&[("k", "v")]));
    }

    #[test]
    fn failed_upsert_writes_nothing() {
        let conn = db::open_memory().unwrap();
        set_many(&conn, &map(&[("theme", "dark")])).unwrap();
        conn.execute_batch(
            "CREATE TRIGGER refuse_poison BEFORE INSERT ON settings
             WHEN NEW.key = 'poison'
             BEGIN SELECT RAISE(ABORT, 'poisoned key'); END;",
        )
        .unwrap();

        // BTreeMap order: "alpha" is written before "poison" fails
        let err = set_many(
            &conn,
            &map(&[("alpha", "1"), ("poison", "x"), ("theme", "light")]),
        )
        .unwrap_err();
        assert!(!err.is_validation());
        assert_eq!(get_all(&conn).unwrap(), map(&[("theme", "dark")]));
    }
}
