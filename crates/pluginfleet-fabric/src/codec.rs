//! JSON payload encoding.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Broker, FabricError};

/// Encode a message as a JSON payload.
pub fn encode<T: Serialize>(message: &T) -> Result<Vec<u8>, FabricError> {
    Ok(serde_json::to_vec(message)?)
}

/// Decode a JSON payload.
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, FabricError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Encode `message` and publish it under `routing_key`.
pub async fn publish_json<B, T>(broker: &B, routing_key: &str, message: &T) -> Result<(), FabricError>
where
    B: Broker + ?Sized,
    T: Serialize + Sync,
{
    let payload = encode(message)?;
    broker.publish(routing_key, &payload).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pluginfleet_core::{BroadcastMessage, LEADER_ID};

    #[test]
    fn test_decode_rejects_garbage() {
        let result: Result<BroadcastMessage, _> = decode(b"not json");
        assert!(matches!(result, Err(FabricError::Json(_))));
    }

    #[test]
    fn test_encode_then_decode() {
        let msg = BroadcastMessage::new("maintenance at noon", LEADER_ID);
        let back: BroadcastMessage = decode(&encode(&msg).unwrap()).unwrap();
        assert_eq!(back, msg);
    }
}
