use crate::domain::event::{DomainEvent, EVENT_SCHEMA_VERSION};
use thiserror::Error;

/// シリアライゼーションエラー
#[derive(Debug, Error, Clone)]
pub enum SerializationError {
    #[error("JSON serialization failed: {message}. Event type: {event_type}")]
    JsonSerializationFailed { message: String, event_type: String },

    #[error("JSON deserialization failed: {message}. Input: {input_preview}")]
    JsonDeserializationFailed {
        message: String,
        input_preview: String,
    },

    #[error("Schema version incompatibility: expected <= {expected}, found {actual}. Event type: {event_type}")]
    SchemaVersionIncompatible {
        expected: u32,
        actual: u32,
        event_type: String,
    },
}

/// イベントシリアライザー
/// ドメインイベントのJSON変換とスキーマバージョン検証を担当する
#[derive(Debug, Clone, Default)]
pub struct EventSerializer;

impl EventSerializer {
    /// 新しいイベントシリアライザーを作成
    pub fn new() -> Self {
        Self
    }

    /// イベントをJSON文字列に変換する
    pub fn serialize(&self, event: &DomainEvent) -> Result<String, SerializationError> {
        self.validate_schema_version(event)?;
        serde_json::to_string(event).map_err(|e| SerializationError::JsonSerializationFailed {
            message: e.to_string(),
            event_type: event.event_type().to_string(),
        })
    }

    /// JSON文字列からイベントを復元する
    pub fn deserialize(&self, input: &str) -> Result<DomainEvent, SerializationError> {
        let event: DomainEvent = serde_json::from_str(input).map_err(|e| {
            SerializationError::JsonDeserializationFailed {
                message: e.to_string(),
                input_preview: input.chars().take(120).collect(),
            }
        })?;
        self.validate_schema_version(&event)?;
        Ok(event)
    }

    /// スキーマバージョンの互換性を検証する
    pub fn validate_schema_version(&self, event: &DomainEvent) -> Result<(), SerializationError> {
        let version = event.metadata().event_version;
        if version == 0 || version > EVENT_SCHEMA_VERSION {
            return Err(SerializationError::SchemaVersionIncompatible {
                expected: EVENT_SCHEMA_VERSION,
                actual: version,
                event_type: event.event_type().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::event::{NightAuditSubmitted, ReservationBooked};
    use crate::domain::model::{CompanyCode, GuestId, Money, ReservationId, StayRange};
    use chrono::NaiveDate;

    fn booked_event() -> DomainEvent {
        let stay = StayRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 12).unwrap(),
        )
        .unwrap();
        DomainEvent::ReservationBooked(ReservationBooked::new(
            ReservationId::new(),
            GuestId::new(),
            stay,
            Money::jpy(200),
        ))
    }

    #[test]
    fn test_serialize_deserialize_round_trip() {
        let serializer = EventSerializer::new();
        let event = booked_event();
        let json = serializer.serialize(&event).unwrap();
        let restored = serializer.deserialize(&json).unwrap();
        assert_eq!(restored.event_type(), "ReservationBooked");
        assert_eq!(restored.metadata().event_id, event.metadata().event_id);
    }

    #[test]
    fn test_incompatible_version_rejected() {
        let serializer = EventSerializer::new();
        let mut event = NightAuditSubmitted::new(
            CompanyCode::new("GRAND-HOTEL").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            3,
        );
        event.metadata.event_version = EVENT_SCHEMA_VERSION + 1;
        let result = serializer.validate_schema_version(&DomainEvent::NightAuditSubmitted(event));
        assert!(matches!(
            result,
            Err(SerializationError::SchemaVersionIncompatible { .. })
        ));
    }

    #[test]
    fn test_deserialize_invalid_json_fails() {
        let serializer = EventSerializer::new();
        let result = serializer.deserialize("{not json");
        assert!(matches!(
            result,
            Err(SerializationError::JsonDeserializationFailed { .. })
        ));
    }
}
