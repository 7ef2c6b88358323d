use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use uuid::Uuid;

/// Stable identity of a launch complex
pub type FacilityId = Uuid;
/// Identity of a physical pad
pub type PadId = Uuid;
/// Identity of an efficiency pool
pub type PoolId = Uuid;
/// Identity of a queued item
pub type ItemId = Uuid;

/// Supplies fresh, globally unique identities.
///
/// Facilities, pads, pools and queue items all draw from one source owned by
/// the space center, so a seeded source makes a whole run reproducible.
pub trait IdSource {
    /// Next identity. Never returns the nil uuid.
    fn next_id(&mut self) -> Uuid;
}

/// Random v4 identities from the OS-seeded thread rng
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomIds;

impl IdSource for RandomIds {
    fn next_id(&mut self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Deterministic v4 identities from a ChaCha8 stream
#[derive(Debug, Clone)]
pub struct SeededIds {
    rng: ChaCha8Rng,
}

impl SeededIds {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl IdSource for SeededIds {
    fn next_id(&mut self) -> Uuid {
        let bytes: [u8; 16] = self.rng.gen();
        // Version/variant bits are forced, so the result is never nil
        uuid::Builder::from_random_bytes(bytes).into_uuid()
    }
}
