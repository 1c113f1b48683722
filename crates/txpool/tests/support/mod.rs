//! Test doubles for the crate's external interfaces.

use std::collections::HashSet;
use std::sync::Arc;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use parking_lot::RwLock;
use txpool::{
    BlocklistCheck, ChainRepository, DependencyState, RecoveryError, Signature, SignatureRecovery, StateProvider,
    Stater,
};
use fee_market::{Header, HeaderView};

#[derive(Debug)]
pub struct FakeChain {
    head: RwLock<HeaderView>,
    chain_tag: u8,
    dependency: RwLock<DependencyState>,
}

impl FakeChain {
    pub fn new(head: HeaderView, chain_tag: u8) -> Self {
        Self { head: RwLock::new(head), chain_tag, dependency: RwLock::new(DependencyState::Settled) }
    }

    pub fn set_head(&self, head: HeaderView) {
        *self.head.write() = head;
    }
}

#[async_trait]
impl ChainRepository for FakeChain {
    async fn best_block_summary(&self) -> HeaderView {
        *self.head.read()
    }

    async fn get_block_id(&self, _number: u64) -> Option<B256> {
        Some(Header::id(&*self.head.read()))
    }

    fn chain_tag(&self) -> u8 {
        self.chain_tag
    }

    async fn dependency_state(&self, _tx_id: B256) -> DependencyState {
        *self.dependency.read()
    }
}

#[derive(Debug)]
pub struct FakeState {
    energy: U256,
}

impl FakeState {
    pub fn new(energy: U256) -> Self {
        Self { energy }
    }
}

#[async_trait]
impl StateProvider for FakeState {
    async fn account_exists(&self, _address: Address) -> bool {
        true
    }

    async fn balance(&self, _address: Address) -> U256 {
        U256::ZERO
    }

    async fn energy_balance(&self, _address: Address, _at_timestamp: u64) -> U256 {
        self.energy
    }

    async fn storage(&self, _address: Address, _key: B256) -> B256 {
        B256::ZERO
    }

    async fn for_each_storage(&self, _address: Address, _f: &mut dyn FnMut(B256, B256) -> bool) {}
}

#[derive(Debug)]
pub struct FakeStater {
    state: Arc<dyn StateProvider>,
}

impl FakeStater {
    pub fn new(state: Arc<dyn StateProvider>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Stater for FakeStater {
    async fn new_state(&self, _state_root: B256) -> Arc<dyn StateProvider> {
        Arc::clone(&self.state)
    }
}

#[derive(Debug, Default)]
pub struct FakeBlocklist {
    blocked: RwLock<HashSet<Address>>,
}

impl FakeBlocklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&self, address: Address) {
        self.blocked.write().insert(address);
    }
}

impl BlocklistCheck for FakeBlocklist {
    fn contains(&self, address: Address) -> bool {
        self.blocked.read().contains(&address)
    }
}

/// Recovers the address encoded in the signature's first byte, so tests can
/// pick a transaction's `origin` without real ECDSA.
#[derive(Debug, Default)]
pub struct FakeSigner;

impl SignatureRecovery for FakeSigner {
    fn recover(&self, _signing_hash: B256, signature: &Signature) -> Result<Address, RecoveryError> {
        Ok(Address::with_last_byte(signature.0[0]))
    }
}

pub fn signature_for(origin_byte: u8) -> Signature {
    let mut bytes = [0u8; 65];
    bytes[0] = origin_byte;
    Signature(bytes)
}
