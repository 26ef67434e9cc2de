use silo_core::SqlWriter;

/// Sqlite dialect. The generic templates all apply; the only deviation is
/// locking, which sqlite handles at database level, so the row lock suffix
/// is dropped.
pub struct SqliteSqlWriter;

impl SqlWriter for SqliteSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn write_select_lock(&self, _out: &mut String) {}
}
