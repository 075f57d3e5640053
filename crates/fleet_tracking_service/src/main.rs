/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use actix_web::{web, App, HttpServer};
use fleet_tracking_service::{
    domain::api,
    environment::{AppConfig, AppState},
    middleware::*,
    routing::cache::run_cache_eviction,
    tools::{error::AppError, logger::setup_tracing, prometheus::prometheus_metrics},
    tracking::registry::run_subscription_sweeper,
};
use std::env::var;
use tracing_actix_web::TracingLogger;

pub fn read_dhall_config(config_path: &str) -> Result<AppConfig, String> {
    let config = serde_dhall::from_file(config_path).parse::<AppConfig>();
    match config {
        Ok(config) => Ok(config),
        Err(e) => Err(format!("Error reading config: {}", e)),
    }
}

#[actix_web::main]
async fn start_server() -> std::io::Result<()> {
    let dhall_config_path = var("DHALL_CONFIG")
        .unwrap_or_else(|_| "./dhall_config/fleet_tracking_service.dhall".to_string());
    let app_config = read_dhall_config(&dhall_config_path).unwrap_or_else(|err| {
        println!("Dhall Config Reading Error : {}", err);
        std::process::exit(1);
    });

    let _guard = setup_tracing(app_config.logger_cfg);

    let port = app_config.port;
    let workers = app_config.workers;

    let app_state = AppState::new(app_config).await;

    let data = web::Data::new(app_state);

    // Background maintenance runs independently of request handling: the
    // idle-subscription sweep and, for the in-process backend, route cache
    // eviction.
    tokio::spawn(run_subscription_sweeper(
        data.registry.to_owned(),
        data.sweep_interval_seconds,
        data.subscription_max_age_seconds,
    ));
    if let Some(cache) = data.in_memory_cache.to_owned() {
        tokio::spawn(run_cache_eviction(
            cache,
            data.cache_eviction_interval_seconds,
        ));
    }

    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .app_data(
                web::JsonConfig::default()
                    .error_handler(|err, _| AppError::InvalidRequest(err.to_string()).into()),
            )
            .wrap(RequestTimeout)
            .wrap(TracingLogger::<DomainRootSpanBuilder>::new())
            .wrap(prometheus_metrics())
            .configure(api::handler)
    })
    .workers(workers)
    .bind(("0.0.0.0", port))?
    .run()
    .await
}

fn main() {
    start_server().expect("Failed to start the server");
}
