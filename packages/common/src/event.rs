//! Payloads carried through the [`HookRegistry`](crate::hook::HookRegistry).
//!
//! A lifecycle notification (for instance "media.saving" with the nodes about
//! to be saved) is serialized once into a [`GenericEvent`] and handed to every
//! subscriber of its topic. Typed hooks decode it back on the way in.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// A notification payload addressed to one topic.
pub trait Event: Send + Sync + Sized + Serialize + DeserializeOwned {
    /// Topic subscribers register for, `<kind>.<phase>` such as "content.deleted".
    fn topic(&self) -> &str;

    /// Serialize into the envelope the registry dispatches.
    fn to_generic_event(&self) -> anyhow::Result<GenericEvent> {
        Ok(GenericEvent {
            topic: self.topic().to_string(),
            payload: serde_json::to_value(self)?,
        })
    }

    /// Decode a dispatched envelope. Fails when the payload is not this type.
    fn from_generic_event(e: &GenericEvent) -> anyhow::Result<Self> {
        Ok(serde_json::from_value(e.payload.clone())?)
    }
}

/// Topic plus JSON payload; what untyped hooks receive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenericEvent {
    pub topic: String,
    pub payload: serde_json::Value,
}

impl Event for GenericEvent {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn to_generic_event(&self) -> anyhow::Result<GenericEvent> {
        Ok(self.clone())
    }

    fn from_generic_event(e: &GenericEvent) -> anyhow::Result<Self> {
        Ok(e.clone())
    }
}
