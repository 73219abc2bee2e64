//! Value objects: equality by value, not identity.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

/// A line quantity: always at least 1.
///
/// Cart items and order items both carry one. A zero quantity is never a
/// valid line; callers that mean "remove" must say so explicitly.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Validate a raw quantity coming from a caller.
    pub fn new(value: i64) -> DomainResult<Self> {
        if value < 1 {
            return Err(DomainError::InvalidQuantity(value));
        }
        let value = u32::try_from(value).map_err(|_| DomainError::InvalidQuantity(value))?;
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Add two quantities, failing instead of saturating when the sum exceeds `max`.
    pub fn checked_add(self, other: Quantity, max: u32) -> DomainResult<Self> {
        let sum = u64::from(self.0) + u64::from(other.0);
        if sum > u64::from(max) {
            return Err(DomainError::InvalidQuantity(sum as i64));
        }
        Ok(Self(sum as u32))
    }

    /// Reject quantities above `max`.
    pub fn ensure_at_most(self, max: u32) -> DomainResult<Self> {
        if self.0 > max {
            return Err(DomainError::InvalidQuantity(i64::from(self.0)));
        }
        Ok(self)
    }
}

impl TryFrom<u32> for Quantity {
    type Error = DomainError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(i64::from(value))
    }
}

impl From<Quantity> for u32 {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
