//! IdGenerator port - イベント ID 生成の抽象化
//!
//! 通常 event id はイベントシステムから来る。自前でイベントを発行する側
//! （とデモ用バイナリ）はここで採番する。

use crate::domain::ids::EventId;
use crate::ports::Clock;
use ulid::Ulid;

/// Mints event ids that are unique without coordination.
pub trait EventIdGenerator: Send + Sync {
    fn next_event_id(&self) -> EventId;
}

/// ULID based generator.
///
/// The timestamp part comes from the injected [`Clock`], so a
/// [`FixedClock`](crate::ports::FixedClock) gives ids that share a prefix
/// but still differ in their random part.
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> EventIdGenerator for UlidGenerator<C> {
    fn next_event_id(&self) -> EventId {
        EventId::new(self.next_ulid().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{FixedClock, SystemClock};
    use chrono::{TimeZone, Utc};

    #[test]
    fn ulid_generator_generates_unique_ids() {
        let id_gen = UlidGenerator::new(SystemClock);

        let id1 = id_gen.next_event_id();
        let id2 = id_gen.next_event_id();
        let id3 = id_gen.next_event_id();

        assert_ne!(id1, id2);
        assert_ne!(id2, id3);
        assert_ne!(id1, id3);
    }

    #[test]
    fn ulid_generator_with_fixed_clock_shares_timestamp() {
        let fixed_time = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let id_gen = UlidGenerator::new(FixedClock::new(fixed_time));

        let id1 = id_gen.next_event_id();
        let id2 = id_gen.next_event_id();

        // ランダム部分があるので ID は異なる
        assert_ne!(id1, id2);

        let u1 = Ulid::from_string(id1.as_str()).unwrap();
        let u2 = Ulid::from_string(id2.as_str()).unwrap();
        assert_eq!(u1.timestamp_ms(), u2.timestamp_ms());
        assert_eq!(u1.timestamp_ms(), fixed_time.timestamp_millis() as u64);
    }
}
