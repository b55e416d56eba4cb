//! Fallback for platforms without a connection table adapter.

use crate::domain::ConnectionRecord;
use crate::error::{Error, Result};

use super::Enumerator;

pub struct UnsupportedConnections;

impl UnsupportedConnections {
    pub fn new() -> Self {
        Self
    }
}

impl Enumerator for UnsupportedConnections {
    async fn list(&self) -> Result<Vec<ConnectionRecord>> {
        Err(Error::UnsupportedPlatform(format!(
            "no connection table adapter for {}",
            std::env::consts::OS
        )))
    }
}
