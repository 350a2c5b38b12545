// Dispatch Module
// Routes race events to the IoT gateway and tracks their delivery.

use crate::cli::TargetConfig;
use crate::context::SimulationContext;
use crate::event::{EventType, RaceEvent};
use crate::stats::SharedTracker;
use reqwest::StatusCode;
use serde_json::Value;

/// A race event ready to be posted
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// Position of the record in the timeline
    pub index: usize,
    pub event_type: EventType,
    pub target_id: String,
    pub url: String,
    /// Event payload with the simulation context applied
    pub body: Value,
}

/// Sends race events to the gateway.
///
/// Cloning is cheap: the HTTP client and the delivery tracker are shared.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
    target: TargetConfig,
    context: SimulationContext,
    tracker: SharedTracker,
}

impl Dispatcher {
    pub fn new(
        target: TargetConfig,
        context: SimulationContext,
        tracker: SharedTracker,
    ) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(target.connect_timeout())
            .timeout(target.request_timeout())
            .build()
            .map_err(DispatchError::Client)?;

        Ok(Self {
            client,
            target,
            context,
            tracker,
        })
    }

    /// Endpoint for an event: `data` goes to the data path, anything else
    /// to the alert path.
    pub fn endpoint(&self, event: &RaceEvent) -> String {
        if event.event_type.is_data() {
            self.target.data_url(&event.target_id)
        } else {
            self.target.alert_url(&event.target_id)
        }
    }

    /// Resolve the URL and apply the simulation context to the payload
    pub fn prepare(&self, index: usize, event: RaceEvent) -> OutboundMessage {
        let url = self.endpoint(&event);
        let RaceEvent {
            event_type,
            target_id,
            mut payload,
            ..
        } = event;
        self.context.inject(&mut payload);

        OutboundMessage {
            index,
            event_type,
            target_id,
            url,
            body: Value::Object(payload),
        }
    }

    /// Post one message and count it as delivered once any response arrives.
    ///
    /// Non-success statuses are logged and still counted. Only transport
    /// failures (refused connection, timeout) are returned as errors.
    pub async fn send(&self, message: OutboundMessage) -> Result<StatusCode, DispatchError> {
        let response = self
            .client
            .post(&message.url)
            .json(&message.body)
            .send()
            .await
            .map_err(|source| DispatchError::Transport {
                index: message.index,
                url: message.url.clone(),
                source,
            })?;

        let status = response.status();
        self.tracker.record_delivery(&message.target_id);

        if status.is_success() {
            tracing::debug!(
                index = message.index,
                status = status.as_u16(),
                headers = ?response.headers(),
                "Delivered"
            );
        } else {
            tracing::warn!(
                index = message.index,
                status = status.as_u16(),
                url = %message.url,
                "Gateway returned non-success status"
            );
        }

        match response.text().await {
            Ok(body) if !body.is_empty() => {
                let body = serde_json::from_str::<Value>(&body)
                    .map(|json| json.to_string())
                    .unwrap_or(body);
                tracing::debug!(index = message.index, %body, "Gateway response");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(index = message.index, error = %e, "Failed to read response body");
            }
        }

        Ok(status)
    }
}

/// Dispatch errors
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("Failed to send record {index} to {url}: {source}")]
    Transport {
        index: usize,
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Demozone;
    use crate::stats::new_shared_tracker;
    use serde_json::json;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(
            TargetConfig::default(),
            SimulationContext::new(42, Demozone::Paris),
            new_shared_tracker(),
        )
        .unwrap()
    }

    #[test]
    fn test_data_event_routes_to_data_endpoint() {
        let event = RaceEvent::parse(r#"10:00:00;data;car-1;{"speed":80}"#).unwrap();
        assert_eq!(
            dispatcher().endpoint(&event),
            "http://localhost:8888/iot/send/data/car-1"
        );
    }

    #[test]
    fn test_other_events_route_to_alert_endpoint() {
        let dispatcher = dispatcher();
        for line in [
            r#"10:00:02;alert;car-1;{"code":5}"#,
            r#"10:00:02;pitstop;car-1;{}"#,
        ] {
            let event = RaceEvent::parse(line).unwrap();
            assert_eq!(
                dispatcher.endpoint(&event),
                "http://localhost:8888/iot/send/alert/car-1"
            );
        }
    }

    #[test]
    fn test_prepare_injects_context() {
        let event = RaceEvent::parse(r#"10:00:00;data;car-1;{"speed":80}"#).unwrap();
        let message = dispatcher().prepare(0, event);
        assert_eq!(
            message.body,
            json!({"speed": 80, "raceId": 42, "demozone": "PARIS"})
        );
        assert_eq!(
            message.body.to_string(),
            r#"{"speed":80,"raceId":42,"demozone":"PARIS"}"#
        );
        assert_eq!(message.target_id, "car-1");
        assert_eq!(message.event_type, EventType::Data);
    }

    #[test]
    fn test_prepare_overrides_source_context_fields() {
        let event =
            RaceEvent::parse(r#"10:00:00;alert;car-1;{"raceId":1,"demozone":"TOKYO"}"#).unwrap();
        let message = dispatcher().prepare(3, event);
        assert_eq!(message.index, 3);
        assert_eq!(message.body["raceId"], json!(42));
        assert_eq!(message.body["demozone"], json!("PARIS"));
    }
}
