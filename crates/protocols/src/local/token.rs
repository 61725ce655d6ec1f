use crate::error::ProtocolError;
use crate::token::TokenClient;
use clmm_vault_domain::token::{Address, Token};
use clmm_vault_domain::U256;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct Ledger {
    balances: HashMap<Address, U256>,
    allowances: HashMap<(Address, Address), U256>,
    total_supply: U256,
}

impl Ledger {
    fn debit(&mut self, token: Address, account: Address, amount: U256) -> Result<(), ProtocolError> {
        let available = self.balances.get(&account).copied().unwrap_or_default();
        if available < amount {
            return Err(ProtocolError::InsufficientBalance {
                token,
                account,
                required: amount,
                available,
            });
        }
        self.balances.insert(account, available - amount);
        Ok(())
    }

    fn credit(&mut self, account: Address, amount: U256) {
        let entry = self.balances.entry(account).or_default();
        *entry = entry.saturating_add(amount);
    }
}

/// Token balances held in memory.
#[derive(Debug)]
pub struct LocalToken {
    meta: Token,
    ledger: RwLock<Ledger>,
}

impl LocalToken {
    pub fn new(meta: Token) -> Self {
        Self {
            meta,
            ledger: RwLock::new(Ledger::default()),
        }
    }

    pub fn meta(&self) -> &Token {
        &self.meta
    }

    /// Issues new units to `to`, the local stand-in for a faucet or wrap.
    pub fn mint(&self, to: Address, amount: U256) {
        let mut ledger = self.ledger.write().unwrap_or_else(|e| e.into_inner());
        ledger.credit(to, amount);
        ledger.total_supply = ledger.total_supply.saturating_add(amount);
        debug!(token = %self.meta.symbol, to = ?to, amount = %amount, "Minted");
    }

    pub fn total_supply(&self) -> U256 {
        self.ledger.read().unwrap_or_else(|e| e.into_inner()).total_supply
    }
}

impl TokenClient for LocalToken {
    fn address(&self) -> Address {
        self.meta.address
    }

    fn symbol(&self) -> &str {
        &self.meta.symbol
    }

    fn decimals(&self) -> u8 {
        self.meta.decimals
    }

    fn balance_of(&self, account: Address) -> U256 {
        let ledger = self.ledger.read().unwrap_or_else(|e| e.into_inner());
        ledger.balances.get(&account).copied().unwrap_or_default()
    }

    fn allowance(&self, owner: Address, spender: Address) -> U256 {
        let ledger = self.ledger.read().unwrap_or_else(|e| e.into_inner());
        ledger
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn transfer(&self, caller: Address, to: Address, amount: U256) -> Result<(), ProtocolError> {
        let mut ledger = self.ledger.write().unwrap_or_else(|e| e.into_inner());
        ledger.debit(self.meta.address, caller, amount)?;
        ledger.credit(to, amount);
        Ok(())
    }

    fn transfer_from(
        &self,
        caller: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), ProtocolError> {
        let mut ledger = self.ledger.write().unwrap_or_else(|e| e.into_inner());
        let allowed = ledger
            .allowances
            .get(&(from, caller))
            .copied()
            .unwrap_or_default();
        if allowed < amount {
            return Err(ProtocolError::InsufficientAllowance {
                token: self.meta.address,
                owner: from,
                spender: caller,
                required: amount,
                available: allowed,
            });
        }
        ledger.debit(self.meta.address, from, amount)?;
        ledger.credit(to, amount);
        if allowed != U256::MAX {
            ledger.allowances.insert((from, caller), allowed - amount);
        }
        Ok(())
    }

    fn approve(&self, caller: Address, spender: Address, amount: U256) -> Result<(), ProtocolError> {
        let mut ledger = self.ledger.write().unwrap_or_else(|e| e.into_inner());
        ledger.allowances.insert((caller, spender), amount);
        Ok(())
    }
}
