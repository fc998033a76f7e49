//! Database sink: writes typed entries as SQL rows.
//!
//! Each entry type gets two tables: an entry table keyed by UUID whose
//! columns follow the type's field dictionary, and a modifiers table keyed
//! by its own UUID referencing the entry. Schema and insert statements are
//! generated from the dictionaries so the two cannot drift apart.

use std::fmt::Write;
use std::sync::Mutex;

use uuid::Uuid;

use crate::database::{ConnectOptions, Connection, Migrate, Migration, Query};
use crate::error::Result;
use crate::event::entry::Entry;
use crate::event::{Data, DataType, EntryType};
use crate::storage::Store;

const ENTRY_TYPES: [EntryType; 4] = [
    EntryType::Key,
    EntryType::MouseClick,
    EntryType::MouseMove,
    EntryType::MouseScroll,
];

fn table_name(entry_type: EntryType) -> &'static str {
    match entry_type {
        EntryType::Key => "key_events",
        EntryType::MouseClick => "mouse_click_events",
        EntryType::MouseMove => "mouse_move_events",
        EntryType::MouseScroll => "mouse_scroll_events",
    }
}

fn modifier_table_name(entry_type: EntryType) -> &'static str {
    match entry_type {
        EntryType::Key => "key_modifiers",
        EntryType::MouseClick => "mouse_click_modifiers",
        EntryType::MouseMove => "mouse_move_modifiers",
        EntryType::MouseScroll => "mouse_scroll_modifiers",
    }
}

fn column_type(data_type: DataType) -> &'static str {
    match data_type {
        DataType::String => "text",
        DataType::Integer => "integer",
        DataType::Timestamp => "timestamp",
        DataType::Interval => "integer",
        DataType::Double => "real",
    }
}

fn type_index(entry_type: EntryType) -> usize {
    match entry_type {
        EntryType::Key => 0,
        EntryType::MouseClick => 1,
        EntryType::MouseMove => 2,
        EntryType::MouseScroll => 3,
    }
}

/// The bootstrap schema applied by [`DatabaseStorage::init`].
pub fn initialize_schema() -> String {
    let mut sql = String::new();
    for entry_type in ENTRY_TYPES {
        let table = table_name(entry_type);

        let _ = write!(sql, "create table if not exists {table} (id text primary key");
        for field in entry_type.fields() {
            let _ = write!(sql, ", {} {}", field.name, column_type(field.data_type));
        }
        sql.push_str(");\n");

        let _ = write!(
            sql,
            "create table if not exists {} (id text primary key, \
             entry_id text not null references {table} (id), \
             modifier text not null);\n",
            modifier_table_name(entry_type)
        );
    }
    sql
}

fn insert_entry_sql(entry_type: EntryType) -> String {
    let fields = entry_type.fields();

    let mut sql = format!("insert into {} (id", table_name(entry_type));
    for field in fields {
        let _ = write!(sql, ", {}", field.name);
    }
    sql.push_str(") values (?1");
    for position in 0..fields.len() {
        let _ = write!(sql, ", ?{}", position + 2);
    }
    sql.push_str(");");
    sql
}

fn insert_modifier_sql(entry_type: EntryType) -> String {
    format!(
        "insert into {} (id, entry_id, modifier) values (?1, ?2, ?3);",
        modifier_table_name(entry_type)
    )
}

/// A storage sink backed by a relational database.
pub struct DatabaseStorage<C> {
    connection: Mutex<C>,
    database: String,
}

impl<C: Connection> DatabaseStorage<C> {
    pub fn new(connection: C, database: impl Into<String>) -> Self {
        Self {
            connection: Mutex::new(connection),
            database: database.into(),
        }
    }

    /// Connect and bring the schema up to date.
    pub fn init(&self) -> Result<()> {
        let mut connection = self.connection.lock().unwrap();
        connection.connect(&self.database, ConnectOptions::ReadWriteCreate)?;

        let migrations = vec![Migration {
            version: 1,
            description: "initialize database tables".to_owned(),
            sql: initialize_schema(),
            exec: true,
        }];

        Migrate::new(&mut *connection, migrations).apply_migrations()
    }

    fn insert_entries(connection: &C, events: &Data) -> Result<()> {
        // One lazily built statement pair per entry type, reused across the
        // records of the batch.
        let mut statements: [Option<(Box<dyn Query + '_>, Box<dyn Query + '_>)>; 4] =
            [None, None, None, None];

        for entry in events.entries() {
            if entry.data().is_empty() {
                continue;
            }

            let entry_type = entry.entry_type();
            let (insert, insert_modifier) = statements[type_index(entry_type)]
                .get_or_insert_with(|| {
                    (
                        connection.build_query(&insert_entry_sql(entry_type)),
                        connection.build_query(&insert_modifier_sql(entry_type)),
                    )
                });

            Self::insert_entry(insert.as_mut(), insert_modifier.as_mut(), entry)?;
        }

        Ok(())
    }

    fn insert_entry(
        insert: &mut dyn Query,
        insert_modifier: &mut dyn Query,
        entry: &Entry,
    ) -> Result<()> {
        let entry_id = Uuid::new_v4().to_string();

        insert.bind_chars(0, &entry_id);
        for (position, value) in entry.data().iter().enumerate() {
            insert.bind_chars(position + 1, value);
        }
        insert.next_while()?;
        insert.reset()?;

        for modifier in entry.modifiers() {
            let modifier_id = Uuid::new_v4().to_string();
            insert_modifier.bind_chars(0, &modifier_id);
            insert_modifier.bind_chars(1, &entry_id);
            insert_modifier.bind_chars(2, modifier);
            insert_modifier.next_while()?;
            insert_modifier.reset()?;
        }

        Ok(())
    }
}

impl<C: Connection> Store for DatabaseStorage<C> {
    fn store_event(&self, events: Data) -> Result<()> {
        let mut connection = self.connection.lock().unwrap();
        connection.connect(&self.database, ConnectOptions::ReadWriteCreate)?;
        connection.transaction()?;

        match Self::insert_entries(&*connection, &events) {
            Ok(()) => connection.commit(),
            Err(error) => {
                connection.rollback()?;
                Err(error)
            }
        }
    }
}
