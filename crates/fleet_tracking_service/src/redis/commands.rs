/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use fred::{interfaces::KeysInterface, types::Expiration};
use serde::{de::DeserializeOwned, Serialize};

use super::{error::RedisError, types::RedisConnectionPool};

impl RedisConnectionPool {
    pub async fn get_key<T>(&self, key: &str) -> Result<Option<T>, RedisError>
    where
        T: DeserializeOwned,
    {
        let value: Option<String> = self
            .pool
            .get(key)
            .await
            .map_err(|err| RedisError::CommandError(err.to_string()))?;

        match value {
            Some(value) => serde_json::from_str::<T>(&value)
                .map(Some)
                .map_err(|err| RedisError::DeserializationError(err.to_string())),
            None => Ok(None),
        }
    }

    pub async fn set_with_expiry<T>(
        &self,
        key: &str,
        value: &T,
        expiry_seconds: u32,
    ) -> Result<(), RedisError>
    where
        T: Serialize,
    {
        let value = serde_json::to_string(value)
            .map_err(|err| RedisError::SerializationError(err.to_string()))?;

        let _: () = self
            .pool
            .set(
                key,
                value,
                Some(Expiration::EX(i64::from(expiry_seconds))),
                None,
                false,
            )
            .await
            .map_err(|err| RedisError::CommandError(err.to_string()))?;

        Ok(())
    }

    pub async fn delete_key(&self, key: &str) -> Result<(), RedisError> {
        let _: () = self
            .pool
            .del(key)
            .await
            .map_err(|err| RedisError::CommandError(err.to_string()))?;

        Ok(())
    }
}
