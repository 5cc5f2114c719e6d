//! Error types for registry wiring and scene configuration.
//!
//! The per-frame force pass never fails; these errors only surface while a
//! scene is being assembled.

use std::fmt;

/// Errors raised while building particles, registrations, or scenes.
#[derive(Debug, Clone, PartialEq)]
pub enum ForceError {
    /// The generator handle does not resolve in the registry (freed or foreign).
    UnknownGenerator,
    /// A scene description referenced a particle index that does not exist.
    UnknownParticle { index: usize },
    /// A scene description referenced a generator index that does not exist.
    UnknownGeneratorIndex { index: usize },
    /// Mass must be strictly positive; use infinite mass for immovable particles.
    InvalidMass(f32),
    /// A generator parameter is outside the range its force law accepts.
    InvalidParameter {
        generator: &'static str,
        reason: String,
    },
}

impl ForceError {
    pub(crate) fn invalid(generator: &'static str, reason: impl Into<String>) -> Self {
        ForceError::InvalidParameter {
            generator,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for ForceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ForceError::UnknownGenerator => write!(f, "generator handle is not registered"),
            ForceError::UnknownParticle { index } => {
                write!(f, "particle index {} is out of range", index)
            }
            ForceError::UnknownGeneratorIndex { index } => {
                write!(f, "generator index {} is out of range", index)
            }
            ForceError::InvalidMass(mass) => {
                write!(f, "mass must be positive and finite, got {}", mass)
            }
            ForceError::InvalidParameter { generator, reason } => {
                write!(f, "invalid {} parameter: {}", generator, reason)
            }
        }
    }
}

impl std::error::Error for ForceError {}
