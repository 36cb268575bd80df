//! Network message marker trait.

/// Implemented by every type that crosses the wire.
///
/// The id names the protocol topic a message belongs to; transports use it
/// for routing and logging. Serialization itself is SBOR and lives with the
/// message definitions.
pub trait NetworkMessage {
    fn message_type_id() -> &'static str;
}
