//! The plan recorder: commands already compiled in the current migration.
//!
//! The compiler consults the plan when deciding whether live-database state
//! still reflects what this migration will have done by the time a statement
//! runs. A linear scan is fine at migration scale (tens of commands).

use crate::command::{AlterTable, Command, PRIMARY_KEY_SENTINEL};

#[derive(Debug, Default)]
pub struct Plan {
    commands: Vec<Command>,
}

impl Plan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a command after it compiled successfully.
    pub fn record(&mut self, command: Command) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    fn alters_of<'a>(&'a self, table: &'a str) -> impl Iterator<Item = &'a AlterTable> {
        self.commands.iter().filter_map(move |c| match c {
            Command::AlterTable(at) if at.table == table => Some(at),
            _ => None,
        })
    }

    /// Any prior `drop-table` for this table?
    pub fn drops_table(&self, table: &str) -> bool {
        self.commands
            .iter()
            .any(|c| matches!(c, Command::DropTable(dt) if dt.table == table))
    }

    /// Any prior `alter-table` dropping this column on this table?
    pub fn drops_column(&self, table: &str, column: &str) -> bool {
        self.alters_of(table)
            .any(|at| at.drop_columns.iter().any(|c| c == column))
    }

    /// Any prior `alter-table` dropping this named constraint on this table?
    pub fn drops_constraint(&self, table: &str, constraint: &str) -> bool {
        self.alters_of(table)
            .any(|at| at.drop_constraints.iter().any(|c| c == constraint))
    }

    /// Any prior `alter-table` dropping the primary key on this table?
    pub fn drops_primary_key(&self, table: &str) -> bool {
        self.drops_constraint(table, PRIMARY_KEY_SENTINEL)
    }

    /// Any prior `drop-index` for this (table, index)?
    pub fn drops_index(&self, table: &str, index: &str) -> bool {
        self.commands.iter().any(|c| {
            matches!(c, Command::DropIndex(di) if di.on == table && di.index == index)
        })
    }

    /// The type a prior `create-table` or `alter-table add-columns` declared
    /// for a column, taken from the first type token.
    pub fn declared_column_type(&self, table: &str, column: &str) -> Option<String> {
        for command in &self.commands {
            match command {
                Command::CreateTable(ct) if ct.table == table => {
                    if let Some(col) = ct.columns.iter().find(|c| c.name == column) {
                        return col.tokens.first().cloned();
                    }
                }
                Command::AlterTable(at) if at.table == table => {
                    if let Some(col) = at.add_columns.iter().find(|c| c.name == column) {
                        return col.tokens.first().cloned();
                    }
                }
                _ => {}
            }
        }
        None
    }
}
