use dialectkit_core::{
    Connection, ConnectionManager, Result, RowSet, UnsupportedOperationError,
};

/// Pool manager for commands that only diff and render.
pub(crate) struct OfflineManager;

pub(crate) enum OfflineConnection {}

impl ConnectionManager for OfflineManager {
    type Connection = OfflineConnection;

    fn connect(&self) -> Result<Self::Connection> {
        Err(UnsupportedOperationError::new(
            "connect",
            "offline",
            "this command never opens a connection",
        )
        .into())
    }
}

impl Connection for OfflineConnection {
    fn execute(&mut self, _sql: &str) -> Result<()> {
        match *self {}
    }

    fn query(&mut self, _sql: &str) -> Result<RowSet> {
        match *self {}
    }

    fn ping(&mut self) -> Result<()> {
        match *self {}
    }

    fn begin(&mut self) -> Result<()> {
        match *self {}
    }

    fn commit(&mut self) -> Result<()> {
        match *self {}
    }

    fn rollback(&mut self) -> Result<()> {
        match *self {}
    }
}
