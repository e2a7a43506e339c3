use dataapi_core::Result;
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

/// Command name plus payload, in wire form.
///
/// Named envelopes encode as `{"<name>": <payload>}`; unnamed ones encode as
/// the bare payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    name: Option<String>,
    payload: Value,
}

impl Envelope {
    /// Creates a named envelope from any serializable payload.
    pub fn new(name: impl Into<String>, payload: impl Serialize) -> Result<Self> {
        Ok(Self {
            name: Some(name.into()),
            payload: serde_json::to_value(payload)?,
        })
    }

    /// Creates an envelope sent as the bare payload.
    pub fn unnamed(payload: impl Serialize) -> Result<Self> {
        Ok(Self {
            name: None,
            payload: serde_json::to_value(payload)?,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// Encodes the wire body.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl Serialize for Envelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match &self.name {
            Some(name) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(name, &self.payload)?;
                map.end()
            }
            None => self.payload.serialize(serializer),
        }
    }
}

/// A single-key object decodes as a named envelope; anything else is an
/// unnamed payload.
///
/// The wire form cannot tell an unnamed single-key payload such as
/// `{"filter": {...}}` from a named envelope, so such payloads decode as
/// named. Re-encoding yields the same bytes either way.
impl<'de> Deserialize<'de> for Envelope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut payload = Value::deserialize(deserializer)?;

        if let Value::Object(map) = &mut payload
            && map.len() == 1
            && let Some(name) = map.keys().next().cloned()
            && let Some(inner) = map.remove(&name)
        {
            return Ok(Self {
                name: Some(name),
                payload: inner,
            });
        }

        Ok(Self {
            name: None,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_named_envelope() {
        let envelope = Envelope::new("insertOne", json!({"document": {"_id": "1"}})).unwrap();
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({"insertOne": {"document": {"_id": "1"}}})
        );
    }

    #[test]
    fn test_unnamed_envelope() {
        let envelope = Envelope::unnamed(json!({"filter": {}})).unwrap();
        assert_eq!(serde_json::to_value(&envelope).unwrap(), json!({"filter": {}}));
        assert!(envelope.name().is_none());
    }

    #[test]
    fn test_envelope_round_trip() {
        let wire = json!({"insertOne": {"document": {"title": "Dune", "pages": 412}}});
        let envelope: Envelope = serde_json::from_value(wire.clone()).unwrap();

        assert_eq!(envelope.name(), Some("insertOne"));
        assert_eq!(envelope.payload()["document"]["title"], "Dune");
        assert_eq!(serde_json::to_value(&envelope).unwrap(), wire);
    }

    #[test]
    fn test_unnamed_envelope_round_trip() {
        let envelope = Envelope::unnamed(json!({"filter": {"a": 1}})).unwrap();
        let bytes = envelope.to_bytes().unwrap();
        let decoded: Envelope = serde_json::from_slice(&bytes).unwrap();

        // A single-key payload reads back as named but keeps its wire form.
        assert_eq!(decoded.name(), Some("filter"));
        assert_eq!(decoded.to_bytes().unwrap(), bytes);

        let multi = Envelope::unnamed(json!({"filter": {}, "sort": {"a": 1}})).unwrap();
        let decoded: Envelope = serde_json::from_slice(&multi.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, multi);
    }

    #[test]
    fn test_scalar_payload_is_unnamed() {
        let decoded: Envelope = serde_json::from_value(json!([1, 2])).unwrap();
        assert!(decoded.name().is_none());
        assert_eq!(decoded.payload(), &json!([1, 2]));
    }
}
