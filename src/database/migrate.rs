//! Ordered, checksummed, idempotent schema migrations.
//!
//! Applied migrations are recorded in the `_migrations` table together with
//! a SHA-512 checksum of their SQL. Re-presenting an already-applied
//! migration with different SQL (or a different version at the same
//! position) aborts the whole run and rolls back.

use sha2::{Digest, Sha512};

use crate::database::Connection;
use crate::error::{Error, Result};

/// One step of schema evolution.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: String,
    pub sql: String,
    /// Execute as a single batch statement rather than a prepared and
    /// iterated one. Required for multi-statement DDL.
    pub exec: bool,
}

/// A migration that has been applied to the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMigration {
    pub version: i64,
    pub checksum: String,
}

/// Applies migrations in version order and tracks what has been applied.
pub struct Migrate<'conn, C> {
    connection: &'conn mut C,
    migrations: Vec<Migration>,
}

impl<'conn, C: Connection> Migrate<'conn, C> {
    pub fn new(connection: &'conn mut C, mut migrations: Vec<Migration>) -> Self {
        migrations.sort_by_key(|migration| migration.version);
        Self {
            connection,
            migrations,
        }
    }

    /// Apply the migrations within a single transaction. On any failure the
    /// transaction is rolled back and the first error surfaced.
    pub fn apply_migrations(&mut self) -> Result<()> {
        self.connection.transaction()?;

        let result = self.apply_inner();
        match result {
            Ok(()) => self.connection.commit(),
            Err(error) => {
                self.connection.rollback()?;
                Err(error)
            }
        }
    }

    fn apply_inner(&mut self) -> Result<()> {
        Self::create_migrations_table(self.connection)?;
        let applied = Self::applied_migrations(self.connection)?;

        for (position, migration) in self.migrations.iter().enumerate() {
            let checksum = Self::checksum(migration);

            if let Some(applied_migration) = applied.get(position) {
                if applied_migration.version != migration.version
                    || applied_migration.checksum != checksum
                {
                    return Err(Error::Database(
                        "applied migrations do not match current migrations".into(),
                    ));
                }

                continue;
            }

            Self::apply_migration(self.connection, migration, &checksum)?;
            tracing::info!(
                "applied migration version {} with checksum: {checksum}",
                migration.version
            );
        }

        Ok(())
    }

    fn create_migrations_table(connection: &C) -> Result<()> {
        let mut query = connection.build_query(
            "create table if not exists _migrations (\
             version integer primary key,\
             description text not null,\
             installed_on timestamp not null default current_timestamp,\
             checksum text not null\
             );",
        );

        query.next_while()?;
        query.reset()
    }

    fn applied_migrations(connection: &C) -> Result<Vec<AppliedMigration>> {
        let mut query =
            connection.build_query("select version, checksum from _migrations order by version;");

        let mut migrations = Vec::new();
        while query.next()? {
            migrations.push(AppliedMigration {
                version: query.as_int(0)?,
                checksum: query.as_string(1)?,
            });
        }

        query.reset()?;
        Ok(migrations)
    }

    fn apply_migration(connection: &C, migration: &Migration, checksum: &str) -> Result<()> {
        Self::apply_migration_sql(connection, migration)?;

        let mut query = connection.build_query(
            "insert into _migrations (version, description, checksum) values (?1, ?2, ?3);",
        );
        query.bind_int(0, migration.version);
        query.bind_chars(1, &migration.description);
        query.bind_chars(2, checksum);

        query.next_while()?;
        query.reset()
    }

    fn apply_migration_sql(connection: &C, migration: &Migration) -> Result<()> {
        let mut query = connection.build_query(&migration.sql);

        if migration.exec {
            return query.exec();
        }

        query.next_while()?;
        query.reset()
    }

    fn checksum(migration: &Migration) -> String {
        hex::encode(Sha512::digest(migration.sql.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{ConnectOptions, SqliteConnection};

    const TEST_TABLE: &str = "create table t (position integer primary key, c text);";

    fn connected() -> (tempfile::TempDir, SqliteConnection) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migrate.sqlite");
        let mut connection = SqliteConnection::new();
        connection
            .connect(path.to_str().unwrap(), ConnectOptions::ReadWriteCreate)
            .unwrap();
        connection.build_query(TEST_TABLE).exec().unwrap();
        (dir, connection)
    }

    fn insert_migration(version: i64, value: &str) -> Migration {
        Migration {
            version,
            description: "description".to_owned(),
            sql: format!("insert into t (c) values ('{value}');"),
            exec: true,
        }
    }

    fn table_values(connection: &SqliteConnection) -> Vec<(String, String)> {
        let mut query = connection.build_query("select position, c from t;");
        let mut values = Vec::new();
        while query.next().unwrap() {
            values.push((
                query.as_string(0).unwrap(),
                query.as_string(1).unwrap(),
            ));
        }
        values
    }

    #[test]
    fn migrate_records_version_description_and_checksum() {
        let (_dir, mut connection) = connected();

        Migrate::new(&mut connection, vec![insert_migration(1, "x")])
            .apply_migrations()
            .unwrap();

        let mut query = connection.build_query("select * from _migrations;");
        assert!(query.next().unwrap());
        assert_eq!(query.as_string(0).unwrap(), "1");
        assert_eq!(query.as_string(1).unwrap(), "description");
        assert!(!query.as_string(2).unwrap().is_empty());
        assert!(!query.as_string(3).unwrap().is_empty());
        assert!(!query.next().unwrap());

        assert_eq!(table_values(&connection), [("1".to_owned(), "x".to_owned())]);
    }

    #[test]
    fn migrate_twice_is_a_no_op() {
        let (_dir, mut connection) = connected();

        Migrate::new(&mut connection, vec![insert_migration(1, "x")])
            .apply_migrations()
            .unwrap();
        Migrate::new(&mut connection, vec![insert_migration(1, "x")])
            .apply_migrations()
            .unwrap();

        assert_eq!(table_values(&connection), [("1".to_owned(), "x".to_owned())]);
    }

    #[test]
    fn conflicting_checksum_aborts_and_preserves_state() {
        let (_dir, mut connection) = connected();

        Migrate::new(&mut connection, vec![insert_migration(1, "x")])
            .apply_migrations()
            .unwrap();

        let result = Migrate::new(&mut connection, vec![insert_migration(1, "y")])
            .apply_migrations();

        assert_eq!(
            result,
            Err(Error::Database(
                "applied migrations do not match current migrations".into()
            ))
        );
        assert_eq!(table_values(&connection), [("1".to_owned(), "x".to_owned())]);
    }

    #[test]
    fn conflicting_version_aborts_and_preserves_state() {
        let (_dir, mut connection) = connected();

        Migrate::new(&mut connection, vec![insert_migration(1, "x")])
            .apply_migrations()
            .unwrap();

        let result = Migrate::new(&mut connection, vec![insert_migration(2, "x")])
            .apply_migrations();

        assert_eq!(
            result,
            Err(Error::Database(
                "applied migrations do not match current migrations".into()
            ))
        );
        assert_eq!(table_values(&connection), [("1".to_owned(), "x".to_owned())]);
    }

    #[test]
    fn failed_migration_sql_rolls_back() {
        let (_dir, mut connection) = connected();

        let broken = Migration {
            version: 1,
            description: "description".to_owned(),
            sql: "insert into missing_table (c) values ('x');".to_owned(),
            exec: true,
        };

        assert!(Migrate::new(&mut connection, vec![broken])
            .apply_migrations()
            .is_err());

        // The transaction rolled back, so _migrations was never created.
        let mut query = connection.build_query(
            "select count(*) from sqlite_master where type = 'table' and name = '_migrations';",
        );
        assert!(query.next().unwrap());
        assert_eq!(query.as_int(0).unwrap(), 0);
    }

    #[test]
    fn empty_migration_list_creates_only_the_migrations_table() {
        let (_dir, mut connection) = connected();

        Migrate::new(&mut connection, Vec::new())
            .apply_migrations()
            .unwrap();

        let mut query = connection.build_query(
            "select count(*) from sqlite_master where type = 'table' and name = '_migrations';",
        );
        assert!(query.next().unwrap());
        assert_eq!(query.as_int(0).unwrap(), 1);

        let mut rows = connection.build_query("select count(*) from _migrations;");
        assert!(rows.next().unwrap());
        assert_eq!(rows.as_int(0).unwrap(), 0);
    }

    #[test]
    fn migrations_apply_in_version_order() {
        let (_dir, mut connection) = connected();

        Migrate::new(
            &mut connection,
            vec![insert_migration(2, "second"), insert_migration(1, "first")],
        )
        .apply_migrations()
        .unwrap();

        assert_eq!(
            table_values(&connection),
            [
                ("1".to_owned(), "first".to_owned()),
                ("2".to_owned(), "second".to_owned())
            ]
        );
    }
}
