//! # Packet Serialization
//!
//! Little-endian, fixed-width encoding of [`Packet`].
//!
//! ## Layout
//!
//! ```text
//! lane u8 | sequence u64 | payload_type u8 | payload
//!
//! Input          tick u64 | mask u8 | angle f32
//! StateSnapshot  server_tick u64 | count u32 | count * (id, x, y, kind) f32
//! Admin          command u8 | value f32
//! ```
//!
//! Decoding is all-or-nothing: every length is checked before anything is
//! allocated, and trailing bytes are rejected.

use lockstep_core::SnapshotRecord;

use super::packets::{
    AdminCommand, AdminMessage, InputMask, InputMessage, Lane, Packet, Payload, PayloadType,
    StateSnapshot,
};
use crate::error::{ProtocolError, ProtocolResult};

/// Appends little-endian primitives to a caller-owned buffer.
struct PacketWriter<'a> {
    buffer: &'a mut Vec<u8>,
}

impl<'a> PacketWriter<'a> {
    #[inline]
    fn new(buffer: &'a mut Vec<u8>) -> Self {
        Self { buffer }
    }

    #[inline]
    fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    #[inline]
    fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    fn write_u64(&mut self, value: u64) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    #[inline]
    fn write_f32(&mut self, value: f32) {
        self.buffer.extend_from_slice(&value.to_le_bytes());
    }

    fn write_records(&mut self, records: &[SnapshotRecord]) {
        if cfg!(target_endian = "little") {
            self.buffer.extend_from_slice(bytemuck::cast_slice(records));
        } else {
            for record in records {
                self.write_f32(record.id);
                self.write_f32(record.x);
                self.write_f32(record.y);
                self.write_f32(record.kind);
            }
        }
    }
}

/// Bounds-checked cursor over a received buffer.
struct PacketReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> PacketReader<'a> {
    #[inline]
    const fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, position: 0 }
    }

    #[inline]
    const fn remaining(&self) -> usize {
        self.buffer.len() - self.position
    }

    /// Fails unless `len` more bytes are available.
    #[inline]
    fn require(&self, len: usize) -> ProtocolResult<()> {
        if self.remaining() < len {
            return Err(ProtocolError::Truncated {
                needed: self.position.saturating_add(len),
                available: self.buffer.len(),
            });
        }
        Ok(())
    }

    #[inline]
    fn take<const N: usize>(&mut self) -> ProtocolResult<[u8; N]> {
        self.require(N)?;
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.buffer[self.position..self.position + N]);
        self.position += N;
        Ok(bytes)
    }

    #[inline]
    fn read_u8(&mut self) -> ProtocolResult<u8> {
        self.take::<1>().map(|[b]| b)
    }

    #[inline]
    fn read_u32(&mut self) -> ProtocolResult<u32> {
        self.take().map(u32::from_le_bytes)
    }

    #[inline]
    fn read_u64(&mut self) -> ProtocolResult<u64> {
        self.take().map(u64::from_le_bytes)
    }

    #[inline]
    fn read_f32(&mut self) -> ProtocolResult<f32> {
        self.take().map(f32::from_le_bytes)
    }

    fn read_records(&mut self, count: usize) -> ProtocolResult<Vec<SnapshotRecord>> {
        let len = count * SnapshotRecord::SIZE;
        self.require(len)?;
        let bytes = &self.buffer[self.position..self.position + len];
        self.position += len;

        let field = |chunk: &[u8], at: usize| {
            f32::from_le_bytes([chunk[at], chunk[at + 1], chunk[at + 2], chunk[at + 3]])
        };
        Ok(bytes
            .chunks_exact(SnapshotRecord::SIZE)
            .map(|chunk| SnapshotRecord {
                id: field(chunk, 0),
                x: field(chunk, 4),
                y: field(chunk, 8),
                kind: field(chunk, 12),
            })
            .collect())
    }
}

/// Exact encoded size of `packet` in bytes.
#[must_use]
pub fn encoded_len(packet: &Packet) -> usize {
    Packet::HEADER_SIZE
        + match &packet.payload {
            Payload::Input(_) => InputMessage::SIZE,
            Payload::StateSnapshot(snapshot) => {
                StateSnapshot::PREFIX_SIZE + snapshot.records.len() * SnapshotRecord::SIZE
            }
            Payload::Admin(_) => AdminMessage::SIZE,
        }
}

/// Replaces the contents of `out` with the encoding of `packet`.
///
/// Does not allocate once `out` has grown to the largest packet sent.
///
/// # Errors
///
/// [`ProtocolError::TooManyRecords`] if a snapshot exceeds
/// [`StateSnapshot::MAX_RECORDS`]; `out` is left empty.
pub fn encode_into(packet: &Packet, out: &mut Vec<u8>) -> ProtocolResult<()> {
    out.clear();

    if let Payload::StateSnapshot(snapshot) = &packet.payload {
        if snapshot.records.len() > StateSnapshot::MAX_RECORDS {
            return Err(ProtocolError::TooManyRecords(snapshot.records.len()));
        }
    }

    out.reserve(encoded_len(packet));
    let mut writer = PacketWriter::new(out);
    writer.write_u8(packet.lane as u8);
    writer.write_u64(packet.sequence);
    writer.write_u8(packet.payload.payload_type() as u8);

    match &packet.payload {
        Payload::Input(input) => {
            writer.write_u64(input.tick);
            writer.write_u8(input.mask.bits());
            writer.write_f32(input.angle);
        }
        Payload::StateSnapshot(snapshot) => {
            writer.write_u64(snapshot.server_tick);
            #[allow(clippy::cast_possible_truncation)]
            let count = snapshot.records.len() as u32;
            writer.write_u32(count);
            writer.write_records(&snapshot.records);
        }
        Payload::Admin(admin) => {
            writer.write_u8(admin.command as u8);
            writer.write_f32(admin.value);
        }
    }

    Ok(())
}

/// Encodes `packet` into a fresh buffer.
///
/// # Errors
///
/// See [`encode_into`].
pub fn encode(packet: &Packet) -> ProtocolResult<Vec<u8>> {
    let mut out = Vec::with_capacity(encoded_len(packet));
    encode_into(packet, &mut out)?;
    Ok(out)
}

/// Decodes exactly one packet from `bytes`.
///
/// # Errors
///
/// - [`ProtocolError::Truncated`] if the header or payload is cut short.
/// - [`ProtocolError::UnknownLane`], [`ProtocolError::UnknownPayloadType`],
///   [`ProtocolError::UnknownAdminCommand`] for out-of-set discriminators.
/// - [`ProtocolError::TooManyRecords`] for an oversized snapshot count.
/// - [`ProtocolError::TrailingBytes`] if bytes remain after the payload.
pub fn decode(bytes: &[u8]) -> ProtocolResult<Packet> {
    let mut reader = PacketReader::new(bytes);
    reader.require(Packet::HEADER_SIZE)?;

    let lane_id = reader.read_u8()?;
    let lane = Lane::from_u8(lane_id).ok_or(ProtocolError::UnknownLane(lane_id))?;
    let sequence = reader.read_u64()?;
    let type_id = reader.read_u8()?;
    let payload_type =
        PayloadType::from_u8(type_id).ok_or(ProtocolError::UnknownPayloadType(type_id))?;

    let payload = match payload_type {
        PayloadType::Input => {
            reader.require(InputMessage::SIZE)?;
            let tick = reader.read_u64()?;
            let mask = InputMask::from_bits_retain(reader.read_u8()?);
            let angle = reader.read_f32()?;
            Payload::Input(InputMessage { tick, mask, angle })
        }
        PayloadType::StateSnapshot => {
            reader.require(StateSnapshot::PREFIX_SIZE)?;
            let server_tick = reader.read_u64()?;
            let count = reader.read_u32()? as usize;
            if count > StateSnapshot::MAX_RECORDS {
                return Err(ProtocolError::TooManyRecords(count));
            }
            let records = reader.read_records(count)?;
            Payload::StateSnapshot(StateSnapshot {
                server_tick,
                records,
            })
        }
        PayloadType::Admin => {
            reader.require(AdminMessage::SIZE)?;
            let command_id = reader.read_u8()?;
            let command = AdminCommand::from_u8(command_id)
                .ok_or(ProtocolError::UnknownAdminCommand(command_id))?;
            let value = reader.read_f32()?;
            Payload::Admin(AdminMessage { command, value })
        }
    };

    match reader.remaining() {
        0 => Ok(Packet::new(lane, sequence, payload)),
        extra => Err(ProtocolError::TrailingBytes(extra)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lockstep_core::{EntityFlags, Handle};
    use proptest::prelude::*;

    fn input_packet() -> Packet {
        Packet::new(
            Lane::Unreliable,
            7,
            Payload::Input(InputMessage::new(100, InputMask::UP | InputMask::SHOOT, 1.5)),
        )
    }

    fn snapshot_packet(count: u16) -> Packet {
        let records = (0..count)
            .map(|i| {
                SnapshotRecord::new(
                    Handle::new(i, 1),
                    f32::from(i) * 10.0,
                    100.0,
                    EntityFlags::ENEMY,
                )
            })
            .collect();
        Packet::new(
            Lane::Unreliable,
            3,
            Payload::StateSnapshot(StateSnapshot {
                server_tick: 42,
                records,
            }),
        )
    }

    #[test]
    fn test_input_layout() {
        let bytes = encode(&input_packet()).unwrap();
        assert_eq!(bytes.len(), 23);
        assert_eq!(bytes[0], 1);
        assert_eq!(&bytes[1..9], &7u64.to_le_bytes());
        assert_eq!(bytes[9], 0);
        assert_eq!(&bytes[10..18], &100u64.to_le_bytes());
        assert_eq!(bytes[18], 0b1_0001);
        assert_eq!(&bytes[19..23], &1.5f32.to_le_bytes());
    }

    #[test]
    fn test_snapshot_layout() {
        let packet = snapshot_packet(2);
        let bytes = encode(&packet).unwrap();
        assert_eq!(bytes.len(), encoded_len(&packet));
        assert_eq!(bytes.len(), 10 + 12 + 2 * 16);
        assert_eq!(&bytes[18..22], &2u32.to_le_bytes());
        // Second record's id column carries the handle bits.
        assert_eq!(&bytes[38..42], &Handle::new(1, 1).raw().to_le_bytes());
        assert_eq!(&bytes[42..46], &10.0f32.to_le_bytes());
    }

    #[test]
    fn test_round_trip_each_kind() {
        let packets = [
            input_packet(),
            snapshot_packet(0),
            snapshot_packet(5),
            Packet::new(Lane::Reliable, 0, Payload::Admin(AdminMessage::set_tick_rate(30.0))),
            Packet::new(Lane::Reliable, u64::MAX, Payload::Admin(AdminMessage::force_resync())),
        ];
        for packet in packets {
            assert_eq!(decode(&encode(&packet).unwrap()).unwrap(), packet);
        }
    }

    #[test]
    fn test_encode_into_reuses_buffer() {
        let mut buffer = Vec::new();
        encode_into(&snapshot_packet(8), &mut buffer).unwrap();
        let capacity = buffer.capacity();

        encode_into(&input_packet(), &mut buffer).unwrap();
        assert_eq!(buffer.len(), 23);
        assert_eq!(buffer.capacity(), capacity);
    }

    #[test]
    fn test_truncated_header() {
        assert_eq!(
            decode(&[]),
            Err(ProtocolError::Truncated { needed: 10, available: 0 })
        );
        assert_eq!(
            decode(&[0, 1, 2]),
            Err(ProtocolError::Truncated { needed: 10, available: 3 })
        );
    }

    #[test]
    fn test_truncated_payload() {
        let bytes = encode(&input_packet()).unwrap();
        assert_eq!(
            decode(&bytes[..bytes.len() - 1]),
            Err(ProtocolError::Truncated { needed: 23, available: 22 })
        );

        let bytes = encode(&snapshot_packet(3)).unwrap();
        assert!(matches!(
            decode(&bytes[..bytes.len() - 4]),
            Err(ProtocolError::Truncated { .. })
        ));
    }

    #[test]
    fn test_snapshot_count_checked_before_allocation() {
        let mut bytes = encode(&snapshot_packet(0)).unwrap();
        bytes[18..22].copy_from_slice(&1000u32.to_le_bytes());
        assert_eq!(
            decode(&bytes),
            Err(ProtocolError::Truncated { needed: 22 + 16_000, available: 22 })
        );

        bytes[18..22].copy_from_slice(&u32::MAX.to_le_bytes());
        assert_eq!(
            decode(&bytes),
            Err(ProtocolError::TooManyRecords(u32::MAX as usize))
        );
    }

    #[test]
    fn test_unknown_discriminators() {
        let mut bytes = encode(&input_packet()).unwrap();
        bytes[9] = 9;
        assert_eq!(decode(&bytes), Err(ProtocolError::UnknownPayloadType(9)));

        let mut bytes = encode(&input_packet()).unwrap();
        bytes[0] = 2;
        assert_eq!(decode(&bytes), Err(ProtocolError::UnknownLane(2)));

        let mut bytes = encode(&Packet::new(
            Lane::Reliable,
            0,
            Payload::Admin(AdminMessage::force_resync()),
        ))
        .unwrap();
        bytes[10] = 0;
        assert_eq!(decode(&bytes), Err(ProtocolError::UnknownAdminCommand(0)));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let mut bytes = encode(&input_packet()).unwrap();
        bytes.extend_from_slice(&[0, 0]);
        assert_eq!(decode(&bytes), Err(ProtocolError::TrailingBytes(2)));
    }

    #[test]
    fn test_oversized_snapshot_not_encoded() {
        let mut packet = snapshot_packet(0);
        if let Payload::StateSnapshot(snapshot) = &mut packet.payload {
            snapshot.records = vec![SnapshotRecord::default(); StateSnapshot::MAX_RECORDS + 1];
        }
        let mut out = vec![1, 2, 3];
        assert_eq!(
            encode_into(&packet, &mut out),
            Err(ProtocolError::TooManyRecords(StateSnapshot::MAX_RECORDS + 1))
        );
        assert!(out.is_empty());
    }

    fn arb_lane() -> impl Strategy<Value = Lane> {
        prop_oneof![Just(Lane::Reliable), Just(Lane::Unreliable)]
    }

    fn arb_f32() -> impl Strategy<Value = f32> {
        any::<u32>().prop_map(f32::from_bits)
    }

    fn arb_payload() -> impl Strategy<Value = Payload> {
        let input = (any::<u64>(), any::<u8>(), arb_f32()).prop_map(|(tick, mask, angle)| {
            Payload::Input(InputMessage::new(tick, InputMask::from_bits_retain(mask), angle))
        });
        let record = (any::<u32>(), arb_f32(), arb_f32(), arb_f32()).prop_map(|(id, x, y, kind)| {
            SnapshotRecord {
                id: f32::from_bits(id),
                x,
                y,
                kind,
            }
        });
        let snapshot = (any::<u64>(), prop::collection::vec(record, 0..64)).prop_map(
            |(server_tick, records)| Payload::StateSnapshot(StateSnapshot { server_tick, records }),
        );
        let admin = (
            prop_oneof![Just(AdminCommand::SetTickRate), Just(AdminCommand::ForceResync)],
            arb_f32(),
        )
            .prop_map(|(command, value)| Payload::Admin(AdminMessage { command, value }));
        prop_oneof![input, snapshot, admin]
    }

    proptest! {
        #[test]
        fn prop_round_trip(lane in arb_lane(), sequence in any::<u64>(), payload in arb_payload()) {
            let packet = Packet::new(lane, sequence, payload);
            let bytes = encode(&packet).unwrap();
            prop_assert_eq!(bytes.len(), encoded_len(&packet));
            prop_assert_eq!(decode(&bytes).unwrap(), packet);
        }

        #[test]
        fn prop_every_strict_prefix_is_truncated(payload in arb_payload()) {
            let bytes = encode(&Packet::new(Lane::Reliable, 1, payload)).unwrap();
            for cut in 0..bytes.len() {
                let is_truncated = matches!(decode(&bytes[..cut]), Err(ProtocolError::Truncated { .. }));
                prop_assert!(is_truncated);
            }
        }
    }
}
