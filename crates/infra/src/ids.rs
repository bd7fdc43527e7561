//! Job identifier generation.

use rand::RngCore;
use rand::rngs::OsRng;
use uuid::Builder;

use printmaps_core::JobId;

/// The entropy source could not produce an identifier.
#[derive(Debug, Clone, thiserror::Error)]
#[error("entropy source unavailable: {0}")]
pub struct IdGenerationError(pub String);

/// Source of fresh job identifiers.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Result<JobId, IdGenerationError>;
}

impl<G: IdGenerator + ?Sized> IdGenerator for std::sync::Arc<G> {
    fn generate(&self) -> Result<JobId, IdGenerationError> {
        (**self).generate()
    }
}

/// Random version-4 UUIDs drawn from the operating system's RNG.
///
/// Unlike `Uuid::new_v4`, a failing entropy source is reported as an error
/// instead of a panic.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn generate(&self) -> Result<JobId, IdGenerationError> {
        let mut bytes = [0u8; 16];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|e| IdGenerationError(e.to_string()))?;
        Ok(JobId::from_uuid(Builder::from_random_bytes(bytes).into_uuid()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generates_version_4_ids() {
        let id = RandomIdGenerator.generate().unwrap();
        assert_eq!(id.as_uuid().get_version_num(), 4);
        assert_eq!(id.as_uuid().get_variant(), uuid::Variant::RFC4122);
    }

    #[test]
    fn ids_do_not_repeat() {
        let ids: HashSet<_> = (0..1_000)
            .map(|_| RandomIdGenerator.generate().unwrap())
            .collect();
        assert_eq!(ids.len(), 1_000);
    }
}
