//! Checked arithmetic over prices in minor currency units (e.g. cents).

use crate::error::{DomainError, DomainResult};
use crate::value_object::Quantity;

/// `unit_price × quantity`, failing on overflow.
pub fn checked_line_total(unit_price: u64, quantity: Quantity) -> DomainResult<u64> {
    unit_price
        .checked_mul(u64::from(quantity.get()))
        .ok_or_else(|| DomainError::invariant("line total overflows"))
}

/// Sum of line totals, failing on overflow.
pub fn checked_sum<I>(amounts: I) -> DomainResult<u64>
where
    I: IntoIterator<Item = u64>,
{
    amounts.into_iter().try_fold(0u64, |acc, amount| {
        acc.checked_add(amount)
            .ok_or_else(|| DomainError::invariant("total overflows"))
    })
}
