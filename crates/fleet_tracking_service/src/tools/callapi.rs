/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use crate::tools::error::AppError;
use reqwest::{Client, Method, Url};
use serde::{de::DeserializeOwned, Serialize};
use tracing::error;

/// Typed JSON call to an upstream service. Non-success status codes and
/// undecodable bodies both surface as errors, never as partial data.
pub async fn call_api<T, B>(
    client: &Client,
    method: Method,
    url: &Url,
    headers: Vec<(&str, &str)>,
    body: Option<B>,
) -> Result<T, AppError>
where
    T: DeserializeOwned,
    B: Serialize,
{
    let mut request_builder = client.request(method, url.to_owned());

    for (header_name, header_value) in headers {
        request_builder = request_builder.header(header_name, header_value);
    }

    if let Some(body) = body {
        let body = serde_json::to_string(&body)
            .map_err(|err| AppError::SerializationError(err.to_string()))?;
        request_builder = request_builder.body(body);
    }

    let resp = request_builder
        .send()
        .await
        .map_err(|err| AppError::ExternalAPICallError(err.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        error!(tag = "[External API Call Failed]", url = %url, status = %status, body = %body);
        return Err(AppError::ExternalAPICallError(format!(
            "{url} responded with status {status}"
        )));
    }

    resp.json::<T>()
        .await
        .map_err(|err| AppError::DeserializationError(err.to_string()))
}
