//! Wiretap record construction

use std::sync::Arc;

use chrono::{Duration, Utc};

use super::errors::{WiretapError, WiretapResult};
use super::event::WiretapEvent;
use super::serialiser::WiretapSerialiser;

/// Builds wiretap records for payloads of type `T`
pub struct WiretapEventFactory<T: ?Sized> {
    serialiser: Arc<dyn WiretapSerialiser<T>>,
}

impl<T: ?Sized> WiretapEventFactory<T> {
    pub fn new(serialiser: Arc<dyn WiretapSerialiser<T>>) -> Self {
        Self { serialiser }
    }

    pub fn builder() -> WiretapEventFactoryBuilder<T> {
        WiretapEventFactoryBuilder { serialiser: None }
    }

    /// Serialise `payload` and stamp the record with the current time
    pub fn new_event(
        &self,
        module_name: &str,
        flow_name: &str,
        component_name: &str,
        payload: &T,
        expiry: i64,
    ) -> WiretapResult<WiretapEvent> {
        let bytes = self.serialiser.serialise(payload)?;
        let timestamp = Utc::now().timestamp_millis();
        Ok(WiretapEvent::new(
            module_name,
            flow_name,
            component_name,
            bytes,
            timestamp,
            expiry,
        ))
    }

    /// As [`new_event`](Self::new_event), expiring `ttl` after creation
    pub fn new_event_with_ttl(
        &self,
        module_name: &str,
        flow_name: &str,
        component_name: &str,
        payload: &T,
        ttl: Duration,
    ) -> WiretapResult<WiretapEvent> {
        let bytes = self.serialiser.serialise(payload)?;
        let timestamp = Utc::now().timestamp_millis();
        Ok(WiretapEvent::new(
            module_name,
            flow_name,
            component_name,
            bytes,
            timestamp,
            timestamp.saturating_add(ttl.num_milliseconds()),
        ))
    }
}

/// Builder that refuses to produce a factory without a serialiser
pub struct WiretapEventFactoryBuilder<T: ?Sized> {
    serialiser: Option<Arc<dyn WiretapSerialiser<T>>>,
}

impl<T: ?Sized> WiretapEventFactoryBuilder<T> {
    pub fn with_serialiser(mut self, serialiser: Arc<dyn WiretapSerialiser<T>>) -> Self {
        self.serialiser = Some(serialiser);
        self
    }

    pub fn build(self) -> WiretapResult<WiretapEventFactory<T>> {
        self.serialiser
            .map(WiretapEventFactory::new)
            .ok_or(WiretapError::MissingSerialiser)
    }
}
