/// Broker lifecycle handle passed to whatever needs to know if it is up
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

use crate::error::PublishError;

pub trait BrokerHandle: Send + Sync {
    fn start(&self) -> Result<(), PublishError>;
    fn stop(&self);
    fn is_running(&self) -> bool;
    fn address(&self) -> String;
}

/// A broker process managed outside this service, reached at `url`
///
/// `start` only checks the address; the connection belongs to the client
/// reading the sink output.
#[derive(Debug)]
pub struct ExternalBroker {
    url: Url,
    running: AtomicBool,
}

impl ExternalBroker {
    pub fn new(url: Url) -> Self {
        ExternalBroker {
            url,
            running: AtomicBool::new(false),
        }
    }
}

impl BrokerHandle for ExternalBroker {
    fn start(&self) -> Result<(), PublishError> {
        match (self.url.scheme(), self.url.host_str()) {
            ("mqtt" | "mqtts" | "tcp" | "ssl", Some(_)) => {
                self.running.store(true, Ordering::SeqCst);
                info!("Broker address accepted: {}", self.url);
                Ok(())
            }
            _ => {
                warn!("Unsupported broker address {}", self.url);
                Err(PublishError::BrokerUnavailable(self.address()))
            }
        }
    }

    fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("Broker address released: {}", self.url);
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn address(&self) -> String {
        self.url.to_string()
    }
}
