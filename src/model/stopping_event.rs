use std::sync::Arc;

use thiserror::Error;

use crate::model::feed::FeedId;
use crate::model::trip::TripDescriptor;
use crate::shared::time::Time;

/// `(feed, trip, stopSequence)` — the fundamental unit of the trip-based
/// search: "trip T visits its stop-sequence s".
///
/// Hashable, `Eq` componentwise. A [`StoppingEvent`] never denotes the last
/// stop of its trip (that stop can only be alighted at, never boarded).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoppingEvent {
    pub trip: TripDescriptor,
    pub stop_sequence: u32,
}

impl StoppingEvent {
    pub fn new(trip: TripDescriptor, stop_sequence: u32) -> Self {
        Self { trip, stop_sequence }
    }

    pub fn feed(&self) -> &FeedId {
        &self.trip.feed
    }

    /// Encodes this event as `utf8(feedId)`, a length-prefixed binary trip
    /// descriptor, then a big-endian `i32` stop sequence, per `spec.md` §4.3.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);

        let feed_bytes = self.trip.feed.as_str().as_bytes();
        out.extend_from_slice(&(feed_bytes.len() as u32).to_be_bytes());
        out.extend_from_slice(feed_bytes);

        let trip_bytes = encode_trip_descriptor(&self.trip);
        out.extend_from_slice(&(trip_bytes.len() as u32).to_be_bytes());
        out.extend_from_slice(&trip_bytes);

        out.extend_from_slice(&(self.stop_sequence as i32).to_be_bytes());
        out
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut cursor = Cursor::new(bytes);

        let feed_len = cursor.read_u32()? as usize;
        let feed_bytes = cursor.read_bytes(feed_len)?;
        let feed = FeedId::new(
            std::str::from_utf8(feed_bytes)
                .map_err(|_| DecodeError::InvalidUtf8)?
                .to_string(),
        );

        let trip_len = cursor.read_u32()? as usize;
        let trip_bytes = cursor.read_bytes(trip_len)?;
        let trip = decode_trip_descriptor(feed, trip_bytes)?;

        let stop_sequence = cursor.read_i32()? as u32;

        Ok(StoppingEvent::new(trip, stop_sequence))
    }
}

fn encode_trip_descriptor(trip: &TripDescriptor) -> Vec<u8> {
    let mut out = Vec::with_capacity(32);

    let trip_id_bytes = trip.trip_id.as_bytes();
    out.extend_from_slice(&(trip_id_bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(trip_id_bytes);

    match trip.start_time {
        Some(time) => {
            out.push(1);
            out.extend_from_slice(&time.as_seconds().to_be_bytes());
        }
        None => out.push(0),
    }

    let route_id_bytes = trip.route_id.as_bytes();
    out.extend_from_slice(&(route_id_bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(route_id_bytes);

    out
}

fn decode_trip_descriptor(feed: FeedId, bytes: &[u8]) -> Result<TripDescriptor, DecodeError> {
    let mut cursor = Cursor::new(bytes);

    let trip_id_len = cursor.read_u32()? as usize;
    let trip_id: Arc<str> = std::str::from_utf8(cursor.read_bytes(trip_id_len)?)
        .map_err(|_| DecodeError::InvalidUtf8)?
        .into();

    let has_start_time = cursor.read_u8()?;
    let start_time = match has_start_time {
        0 => None,
        1 => Some(Time::from_seconds(cursor.read_u32()?)),
        other => return Err(DecodeError::InvalidTag(other)),
    };

    let route_id_len = cursor.read_u32()? as usize;
    let route_id: Arc<str> = std::str::from_utf8(cursor.read_bytes(route_id_len)?)
        .map_err(|_| DecodeError::InvalidUtf8)?
        .into();

    Ok(TripDescriptor {
        feed,
        trip_id,
        start_time,
        route_id,
    })
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("unexpected end of input while decoding a stopping event")]
    Truncated,
    #[error("stopping event contained invalid utf-8")]
    InvalidUtf8,
    #[error("unrecognized tag byte {0} while decoding a stopping event")]
    InvalidTag(u8),
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.pos.checked_add(len).ok_or(DecodeError::Truncated)?;
        let slice = self.bytes.get(self.pos..end).ok_or(DecodeError::Truncated)?;
        self.pos = end;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_bytes(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32, DecodeError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_be_bytes(bytes.try_into().unwrap()))
    }

    fn read_i32(&mut self) -> Result<i32, DecodeError> {
        let bytes = self.read_bytes(4)?;
        Ok(i32::from_be_bytes(bytes.try_into().unwrap()))
    }
}
