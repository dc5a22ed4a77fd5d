/// Sinks accepting publications at the broker boundary
use log::debug;
use std::io::Write;
use std::sync::Arc;

use super::broker::BrokerHandle;
use super::Publication;
use crate::error::PublishError;

pub trait ReadingSink {
    fn publish(&mut self, publication: &Publication) -> Result<(), PublishError>;
}

/// Writes one `<topic> <json>` line per publication
///
/// Meant to be piped into a broker client such as `mosquitto_pub -l`.
pub struct LineSink<W: Write> {
    writer: W,
    broker: Arc<dyn BrokerHandle>,
}

impl<W: Write> LineSink<W> {
    pub fn new(writer: W, broker: Arc<dyn BrokerHandle>) -> Self {
        LineSink { writer, broker }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ReadingSink for LineSink<W> {
    fn publish(&mut self, publication: &Publication) -> Result<(), PublishError> {
        if !self.broker.is_running() {
            return Err(PublishError::BrokerUnavailable(self.broker.address()));
        }

        let payload = serde_json::to_string(&publication.payload)?;
        writeln!(self.writer, "{} {}", publication.topic, payload)?;
        self.writer.flush()?;

        debug!("Published to {}", publication.topic);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::ExternalBroker;
    use serde_json::json;
    use url::Url;

    fn publication() -> Publication {
        Publication {
            topic: "healthdata/user_at_example_com/temperature".to_string(),
            payload: json!({ "temperature_celsius": 36.5 }),
        }
    }

    #[test]
    fn writes_topic_and_payload_line() {
        let broker = Arc::new(ExternalBroker::new(Url::parse("mqtt://localhost").unwrap()));
        broker.start().unwrap();

        let mut sink = LineSink::new(Vec::new(), broker);
        sink.publish(&publication()).unwrap();

        let written = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(
            written,
            "healthdata/user_at_example_com/temperature {\"temperature_celsius\":36.5}\n"
        );
    }

    #[test]
    fn refuses_when_broker_is_down() {
        let broker = Arc::new(ExternalBroker::new(Url::parse("mqtt://localhost").unwrap()));
        let mut sink = LineSink::new(Vec::new(), broker.clone());

        assert!(matches!(
            sink.publish(&publication()),
            Err(PublishError::BrokerUnavailable(_))
        ));

        broker.start().unwrap();
        broker.stop();
        assert!(sink.publish(&publication()).is_err());
        assert!(sink.into_inner().is_empty());
    }
}
