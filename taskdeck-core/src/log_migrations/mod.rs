//! Log database migrations - embedded SQL files
//!
//! Each migration is a (name, sql) pair compiled in with include_str! and
//! applied in order. `000_migrations.sql` bootstraps the bookkeeping table.

/// All log migrations, in application order
///
/// New migrations get a `NNN_description.sql` file and an entry here.
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
];
