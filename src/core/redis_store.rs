use crate::core::store::{Store, StoreError, WriteOp};
use redis::{Client, Commands, Connection, RedisError};
use std::collections::HashSet;
use tracing::{debug, info};

impl From<RedisError> for StoreError {
    fn from(err: RedisError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// [`Store`] over a Redis server. Every call is one network round trip;
/// [`Store::execute`] sends the whole batch as a single pipeline.
pub struct RedisStore {
    con: Connection,
}

impl RedisStore {
    pub fn open(url: &str) -> Result<Self, StoreError> {
        let client = Client::open(url).map_err(|e| StoreError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let con = client.get_connection()?;
        info!(url, "connected to redis");
        Ok(Self { con })
    }
}

impl Store for RedisStore {
    fn get(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.con.get(key)?)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        Ok(self.con.set(key, value)?)
    }

    fn set_add(&mut self, key: &str, member: &str) -> Result<(), StoreError> {
        Ok(self.con.sadd(key, member)?)
    }

    fn set_members(&mut self, key: &str) -> Result<HashSet<String>, StoreError> {
        Ok(self.con.smembers(key)?)
    }

    fn flush_all(&mut self) -> Result<(), StoreError> {
        Ok(redis::cmd("FLUSHALL").query(&mut self.con)?)
    }

    fn execute(&mut self, ops: Vec<WriteOp>) -> Result<(), StoreError> {
        let mut pipe = redis::pipe();
        let sent = ops.len();
        for op in ops {
            match op {
                WriteOp::Set { key, value } => pipe.set(key, value).ignore(),
                WriteOp::SetAdd { key, member } => pipe.sadd(key, member).ignore(),
            };
        }
        pipe.query::<()>(&mut self.con)?;
        debug!(ops = sent, "redis pipeline executed");
        Ok(())
    }
}
