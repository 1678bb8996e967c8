use crate::transport::Transport;
use alloy_primitives::Address;

/// A connected wallet with a single account.
#[derive(Clone, Debug)]
pub struct LocalWallet {
    name: String,
    chain_id: u64,
    account: Address,
}

impl LocalWallet {
    pub fn new(name: impl Into<String>, chain_id: u64, account: Address) -> Self {
        Self {
            name: name.into(),
            chain_id,
            account,
        }
    }

    pub fn account(&self) -> Address {
        self.account
    }
}

impl Transport for LocalWallet {
    fn name(&self) -> &str {
        &self.name
    }

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn accounts(&self) -> Vec<Address> {
        vec![self.account]
    }
}
