//! Fungible token interface.

use crate::error::ProtocolError;
use clmm_vault_domain::token::Address;
use clmm_vault_domain::U256;

/// Balance-holding token primitive.
///
/// Every mutating call names the account that issued it, the way the
/// message sender is implicit on chain.
pub trait TokenClient: Send + Sync {
    /// Token contract address.
    fn address(&self) -> Address;
    /// Ticker symbol.
    fn symbol(&self) -> &str;
    /// Decimal places of one whole unit.
    fn decimals(&self) -> u8;
    /// Raw balance of `account`.
    fn balance_of(&self, account: Address) -> U256;
    /// Remaining amount `spender` may pull from `owner`.
    fn allowance(&self, owner: Address, spender: Address) -> U256;

    /// Moves `amount` from `caller` to `to`.
    fn transfer(&self, caller: Address, to: Address, amount: U256) -> Result<(), ProtocolError>;

    /// Moves `amount` from `from` to `to`, spending `caller`'s allowance.
    fn transfer_from(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ProtocolError>;

    /// Sets the allowance of `spender` over `caller`'s balance.
    fn approve(&self, caller: Address, spender: Address, amount: U256) -> Result<(), ProtocolError>;
}
