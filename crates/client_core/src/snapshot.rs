use shared::{
    domain::{Table, TableName, TableStatus, TeamId},
    error::{TransitionError, WireError},
    protocol::{TableAction, TablesResponse},
};

/// Watermark sent before the first successful sync.
pub const INITIAL_WATERMARK: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The snapshot was replaced and the watermark advanced.
    Applied { last_update: i64 },
    /// The store reported no change since our watermark.
    Unchanged,
    /// The response predates what we already hold and was discarded.
    Stale { received: i64, current: i64 },
    /// Another refresh was in flight; this tick was dropped.
    Skipped,
}

/// Adjacent tables working on the same problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProblemGroup {
    pub problem: String,
    pub tables: Vec<TableName>,
}

/// Last-known state of every table plus the watermark it was taken at.
#[derive(Debug, Clone, PartialEq)]
pub struct BoardSnapshot {
    tables: Vec<Table>,
    last_update: i64,
}

impl Default for BoardSnapshot {
    fn default() -> Self {
        Self {
            tables: Vec::new(),
            last_update: INITIAL_WATERMARK,
        }
    }
}

impl BoardSnapshot {
    pub fn new(tables: Vec<Table>, last_update: i64) -> Self {
        Self {
            tables,
            last_update,
        }
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn last_update(&self) -> i64 {
        self.last_update
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn table(&self, name: &TableName) -> Option<&Table> {
        self.tables.iter().find(|table| table.name == *name)
    }

    /// Merges a `tables/get_all` reply. Whole-snapshot replacement, keyed by
    /// the watermark: no-op replies and out-of-order replies leave the
    /// snapshot untouched.
    pub fn apply_tables_response(
        &mut self,
        response: &TablesResponse,
    ) -> Result<RefreshOutcome, WireError> {
        if !response.changed {
            return Ok(RefreshOutcome::Unchanged);
        }
        if response.last_update < self.last_update {
            return Ok(RefreshOutcome::Stale {
                received: response.last_update,
                current: self.last_update,
            });
        }
        self.tables = response.decode_tables()?;
        self.last_update = response.last_update;
        Ok(RefreshOutcome::Applied {
            last_update: self.last_update,
        })
    }

    /// Replaces one table from a `table/<name>/get_all` reply. The watermark
    /// only tracks collection syncs and is not touched.
    pub fn replace_table(&mut self, table: Table) {
        match self
            .tables
            .iter_mut()
            .find(|existing| existing.name == table.name)
        {
            Some(existing) => *existing = table,
            None => self.tables.push(table),
        }
    }

    /// Checks `action` against the known state of `table`. Unknown tables
    /// pass; the store has the final word.
    pub fn validate(
        &self,
        table: &TableName,
        action: &TableAction,
        now: i64,
    ) -> Result<(), TransitionError> {
        match self.table(table) {
            Some(known) => known.check(action, now),
            None => Ok(()),
        }
    }

    /// Teams that cannot be summoned elsewhere: those being corrected and
    /// those at the head of a calling table.
    pub fn unavailable_teams(&self) -> Vec<TeamId> {
        self.tables
            .iter()
            .filter_map(|table| match table.status {
                TableStatus::Correcting => table.current_coordination_team.clone(),
                TableStatus::Calling => table.head().cloned(),
                TableStatus::Busy => None,
            })
            .collect()
    }

    pub fn problem_groups(&self) -> Vec<ProblemGroup> {
        let mut groups: Vec<ProblemGroup> = Vec::new();
        for table in &self.tables {
            match groups.last_mut() {
                Some(group) if group.problem == table.problem => {
                    group.tables.push(table.name.clone());
                }
                _ => groups.push(ProblemGroup {
                    problem: table.problem.clone(),
                    tables: vec![table.name.clone()],
                }),
            }
        }
        groups
    }
}

#[cfg(test)]
#[path = "tests/snapshot_tests.rs"]
mod tests;
