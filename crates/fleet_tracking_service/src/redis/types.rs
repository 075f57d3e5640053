/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use fred::{
    clients::RedisPool,
    interfaces::ClientLike,
    types::{Builder, ReconnectPolicy, RedisConfig},
};
use serde::{Deserialize, Serialize};

use super::error::RedisError;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RedisSettings {
    pub host: String,
    pub port: u16,
    pub pool_size: usize,
    pub partition: usize,
    pub reconnect_max_attempts: u32,
    /// Reconnect delay in milliseconds
    pub reconnect_delay: u32,
}

impl Default for RedisSettings {
    fn default() -> Self {
        RedisSettings {
            host: String::from("localhost"),
            port: 6379,
            pool_size: 10,
            partition: 0,
            reconnect_max_attempts: 5,
            reconnect_delay: 1000,
        }
    }
}

pub struct RedisConnectionPool {
    pub pool: RedisPool,
}

impl RedisConnectionPool {
    pub async fn new(conf: RedisSettings) -> Result<Self, RedisError> {
        let redis_connection_url = format!(
            "redis://{}:{}/{}", //URI Schema
            conf.host, conf.port, conf.partition
        );

        let config = RedisConfig::from_url(&redis_connection_url)
            .map_err(|err| RedisError::RedisConnectionError(err.to_string()))?;

        let pool = Builder::from_config(config)
            .set_policy(ReconnectPolicy::new_constant(
                conf.reconnect_max_attempts,
                conf.reconnect_delay,
            ))
            .build_pool(conf.pool_size)
            .map_err(|err| RedisError::RedisConnectionError(err.to_string()))?;

        let _ = pool.connect();
        pool.wait_for_connect()
            .await
            .map_err(|err| RedisError::RedisConnectionError(err.to_string()))?;

        Ok(Self { pool })
    }
}
