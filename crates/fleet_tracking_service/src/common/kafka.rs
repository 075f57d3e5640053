use std::time::Duration;

use rdkafka::{
    producer::{FutureProducer, FutureRecord},
    util::Timeout,
};
use serde::Serialize;
use tracing::{info, warn};

/// Best-effort push. Persistence must never abort the real-time path, so
/// serialization and broker failures are logged and swallowed.
pub async fn push_to_kafka<T>(producer: &Option<FutureProducer>, topic: &str, key: &str, message: T)
where
    T: Serialize,
{
    let message = match serde_json::to_string(&message) {
        Ok(message) => message,
        Err(err) => {
            warn!(tag = "[Kafka Serialization]", error = %err, "Dropping unserializable payload");
            return;
        }
    };

    match producer {
        Some(producer) => {
            if let Err((err, _)) = producer
                .send(
                    FutureRecord::to(topic).key(key).payload(&message),
                    Timeout::After(Duration::from_secs(1)),
                )
                .await
            {
                warn!(tag = "[Kafka Push Failed]", error = %err);
            }
        }
        None => {
            info!("Producer is None, unable to send message");
        }
    }
}
