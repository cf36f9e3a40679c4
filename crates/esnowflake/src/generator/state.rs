use core::num::NonZeroUsize;

use crate::{RANDOM_TAIL_LEN, RandSource, RandomPool, SEQUENCE_RANDOM_LEN};

const RANDOM_UNIT: NonZeroUsize = NonZeroUsize::new(RANDOM_TAIL_LEN).unwrap();
const SEQUENCE_UNIT: NonZeroUsize = NonZeroUsize::new(SEQUENCE_RANDOM_LEN).unwrap();

/// Everything a generation call mutates, guarded by one lock so pool refills
/// and sequence updates are serialized together.
#[derive(Debug)]
pub(crate) struct GenerationState<R> {
    pub(crate) last_ms: u64,
    pub(crate) sequence: u16,
    pub(crate) random_pool: RandomPool<R>,
    pub(crate) sequence_pool: RandomPool<R>,
}

impl<R> GenerationState<R>
where
    R: RandSource + Clone,
{
    pub(crate) fn new(last_ms: u64, sequence: u16, rand: R, pool_chunks: NonZeroUsize) -> Self {
        Self {
            last_ms,
            sequence,
            random_pool: RandomPool::new(rand.clone(), RANDOM_UNIT, pool_chunks),
            sequence_pool: RandomPool::new(rand, SEQUENCE_UNIT, pool_chunks),
        }
    }
}
