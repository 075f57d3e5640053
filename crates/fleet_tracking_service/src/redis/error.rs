/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use crate::tools::error::AppError;

#[derive(Debug, thiserror::Error)]
pub enum RedisError {
    #[error("Redis connection failure : {0}")]
    RedisConnectionError(String),
    #[error("Redis command failure : {0}")]
    CommandError(String),
    #[error("Failed to encode cached value : {0}")]
    SerializationError(String),
    #[error("Failed to decode cached value : {0}")]
    DeserializationError(String),
}

impl From<RedisError> for AppError {
    fn from(error: RedisError) -> Self {
        match error {
            RedisError::RedisConnectionError(err) => AppError::InternalError(err),
            RedisError::CommandError(err) => AppError::InternalError(err),
            RedisError::SerializationError(err) => AppError::SerializationError(err),
            RedisError::DeserializationError(err) => AppError::DeserializationError(err),
        }
    }
}
