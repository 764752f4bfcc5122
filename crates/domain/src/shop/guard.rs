//! Ownership gate for mutating shop operations.

use shop_store::Shop;

use crate::Principal;
use crate::error::{Result, ShopError};

/// Returns true iff both sides are present and the shop's owner is the principal.
///
/// Identities are compared in their canonical string form, so a joined owner
/// record and a bare owner id are treated alike.
pub fn is_owner(shop: Option<&Shop>, principal: Option<&Principal>) -> bool {
    match (shop, principal) {
        (Some(shop), Some(principal)) => {
            shop.owner.id().to_string() == principal.id().to_string()
        }
        _ => false,
    }
}

/// Lets the request proceed only when the principal owns the shop.
pub fn check_owner(shop: Option<&Shop>, principal: Option<&Principal>) -> Result<()> {
    if !is_owner(shop, principal) {
        tracing::debug!(
            shop_id = ?shop.map(|s| s.id),
            principal = ?principal.map(|p| p.id()),
            "ownership check failed"
        );
        return Err(ShopError::NotOwner);
    }
    Ok(())
}
