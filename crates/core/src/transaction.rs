use tracing::warn;

use crate::{Connection, Error, Result};

/// Open transaction on a borrowed connection. Dropping it without calling
/// [`Transaction::commit`] rolls back.
pub struct Transaction<'c> {
    connection: &'c mut dyn Connection,
    executed: usize,
    finished: bool,
}

impl<'c> Transaction<'c> {
    pub fn begin(connection: &'c mut dyn Connection) -> Result<Self> {
        connection.begin()?;
        Ok(Self {
            connection,
            executed: 0,
            finished: false,
        })
    }

    /// Runs one statement; failures report their position within this
    /// transaction.
    pub fn execute(&mut self, sql: &str) -> Result<()> {
        let index = self.executed;
        self.connection
            .execute(sql)
            .map_err(|error| at_position(error, index, index))?;
        self.executed += 1;
        Ok(())
    }

    #[must_use]
    pub const fn executed_statements(&self) -> usize {
        self.executed
    }

    pub fn commit(mut self) -> Result<()> {
        self.finished = true;
        self.connection.commit()
    }

    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.connection.rollback()
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }

        if let Err(error) = self.connection.rollback() {
            warn!(%error, "rollback of abandoned transaction failed");
        }
    }
}

pub(crate) fn at_position(error: Error, statement_index: usize, executed: usize) -> Error {
    match error {
        Error::Execute(error) => Error::Execute(error.at_position(statement_index, executed)),
        other => other,
    }
}
