//! Identifier generation.
//!
//! Session and event ids are UUIDv7: a 48-bit millisecond timestamp in the
//! high bits, so the hyphenated hex form sorts lexicographically by creation
//! time and "the latest session" is simply the row with the largest id.
//!
//! Two calls can land in the same millisecond, so the generator carries a
//! [`ContextV7`] whose counter bits keep ids strictly increasing within one
//! process. Event ordering across processes follows from the timestamp and
//! the store's write serialization.

use uuid::timestamp::context::ContextV7;
use uuid::{Timestamp, Uuid};

/// Produces strictly increasing UUIDv7 identifiers.
pub struct IdGenerator {
    context: ContextV7,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            context: ContextV7::new(),
        }
    }

    /// The next identifier; strictly greater than every id this generator
    /// has returned before.
    pub fn generate(&self) -> Uuid {
        Uuid::new_v7(Timestamp::now(&self.context))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
