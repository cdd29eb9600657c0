#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};

use candy_mint::accounts::metadata::metadata_pda;
use candy_mint::constants::{
    CANDY_GUARD_DISCRIMINATOR, CANDY_MACHINE_DISCRIMINATOR, HIDDEN_SECTION, MAX_NAME_LENGTH, MAX_URI_LENGTH,
};
use candy_mint::{
    ChainClient, Descriptor, DescriptorFetcher, MintConfig, MintError, MintSession, Result,
    SubmitOptions,
};
use solana_sdk::{
    hash::Hash, pubkey::Pubkey, signature::Keypair, signature::Signature, signer::Signer,
    transaction::Transaction,
};

pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;
pub const GROUP: &str = "GABU";
pub const MINTED_URI: &str = "https://arweave.example/minted.json";

/// Offset of `items_redeemed` in a Candy Machine account.
const ITEMS_REDEEMED_OFFSET: usize = 8 + 1 + 1 + 6 + 32 * 3;
const NAME_LENGTH: usize = 16;
const URI_LENGTH: usize = 48;

// ---------------------------------------------------------------------------
// Fake chain
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
pub enum SubmitBehavior {
    Confirm,
    Fail(String),
    Timeout,
}

pub struct FakeChain {
    accounts: Mutex<HashMap<Pubkey, Vec<u8>>>,
    balances: Mutex<HashMap<Pubkey, u64>>,
    behavior: Mutex<SubmitBehavior>,
    gate: Mutex<Option<Receiver<()>>>,
    candy_machine: Pubkey,
    pub candy_machine_reads: AtomicUsize,
    pub submits: AtomicUsize,
}

impl FakeChain {
    pub fn new(candy_machine: Pubkey) -> Self {
        Self {
            accounts: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
            behavior: Mutex::new(SubmitBehavior::Confirm),
            gate: Mutex::new(None),
            candy_machine,
            candy_machine_reads: AtomicUsize::new(0),
            submits: AtomicUsize::new(0),
        }
    }

    pub fn plant_account(&self, address: &Pubkey, data: Vec<u8>) {
        self.accounts.lock().unwrap().insert(*address, data);
    }

    pub fn set_balance(&self, address: &Pubkey, lamports: u64) {
        self.balances.lock().unwrap().insert(*address, lamports);
    }

    pub fn set_behavior(&self, behavior: SubmitBehavior) {
        *self.behavior.lock().unwrap() = behavior;
    }

    /// Make the next submission block until the returned sender fires.
    pub fn hold_submit(&self) -> Sender<()> {
        let (tx, rx) = channel();
        *self.gate.lock().unwrap() = Some(rx);
        tx
    }

    pub fn items_redeemed(&self) -> u64 {
        let accounts = self.accounts.lock().unwrap();
        let data = &accounts[&self.candy_machine];
        u64::from_le_bytes(data[ITEMS_REDEEMED_OFFSET..ITEMS_REDEEMED_OFFSET + 8].try_into().unwrap())
    }

    fn settle_mint(&self, tx: &Transaction) {
        // mint_v2 follows the compute-budget instruction; nft_mint is its 7th account.
        let ix = &tx.message.instructions[1];
        let nft_mint = tx.message.account_keys[ix.accounts[6] as usize];

        let mut accounts = self.accounts.lock().unwrap();
        let cm = accounts.get_mut(&self.candy_machine).unwrap();
        let redeemed = u64::from_le_bytes(
            cm[ITEMS_REDEEMED_OFFSET..ITEMS_REDEEMED_OFFSET + 8].try_into().unwrap(),
        );
        cm[ITEMS_REDEEMED_OFFSET..ITEMS_REDEEMED_OFFSET + 8]
            .copy_from_slice(&(redeemed + 1).to_le_bytes());
        accounts.insert(metadata_pda(&nft_mint), metadata_bytes(&nft_mint, MINTED_URI));
    }
}

impl ChainClient for FakeChain {
    fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>> {
        if *address == self.candy_machine {
            self.candy_machine_reads.fetch_add(1, Ordering::SeqCst);
        }
        Ok(self.accounts.lock().unwrap().get(address).cloned())
    }

    fn balance(&self, address: &Pubkey) -> Result<u64> {
        Ok(self.balances.lock().unwrap().get(address).copied().unwrap_or(0))
    }

    fn latest_blockhash(&self) -> Result<Hash> {
        Ok(Hash::new_unique())
    }

    fn submit(&self, tx: &Transaction, _opts: &SubmitOptions) -> Result<Signature> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().unwrap().take();
        if let Some(rx) = gate {
            let _ = rx.recv();
        }

        let signature = tx.signatures[0];
        let behavior = self.behavior.lock().unwrap().clone();
        match behavior {
            SubmitBehavior::Confirm => {
                self.settle_mint(tx);
                Ok(signature)
            }
            SubmitBehavior::Fail(reason) => Err(MintError::Submission(reason)),
            SubmitBehavior::Timeout => Err(MintError::ConfirmationTimeout {
                signature: signature.to_string(),
                waited_secs: 90,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Fake descriptor host
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeFetcher {
    payloads: Mutex<HashMap<String, Descriptor>>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl FakeFetcher {
    pub fn serve(&self, uri: &str, name: &str, image: &str) {
        self.payloads.lock().unwrap().insert(
            uri.to_string(),
            Descriptor {
                name: name.to_string(),
                image: image.to_string(),
            },
        );
    }

    pub fn fetch_count(&self, uri: &str) -> usize {
        self.fetches.lock().unwrap().get(uri).copied().unwrap_or(0)
    }
}

impl DescriptorFetcher for FakeFetcher {
    fn fetch(&self, uri: &str) -> Result<Descriptor> {
        *self.fetches.lock().unwrap().entry(uri.to_string()).or_default() += 1;
        match self.payloads.lock().unwrap().get(uri) {
            Some(d) if d.image.is_empty() => Err(MintError::descriptor(uri, "missing image")),
            Some(d) => Ok(d.clone()),
            None => Err(MintError::descriptor(uri, "request failed: 404")),
        }
    }
}

// ---------------------------------------------------------------------------
// Account builders
// ---------------------------------------------------------------------------

fn push_string(data: &mut Vec<u8>, s: &str) {
    data.extend_from_slice(&(s.len() as u32).to_le_bytes());
    data.extend_from_slice(s.as_bytes());
}

fn padded(s: &str, width: usize) -> Vec<u8> {
    let mut out = s.as_bytes().to_vec();
    out.resize(width, 0);
    out
}

fn candy_machine_header(mint_authority: &Pubkey, redeemed: u64, available: usize) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&CANDY_MACHINE_DISCRIMINATOR);
    data.push(1); // version
    data.push(4); // programmable NFT
    data.extend_from_slice(&[0u8; 6]);
    data.extend_from_slice(Pubkey::new_unique().as_ref()); // authority
    data.extend_from_slice(mint_authority.as_ref());
    data.extend_from_slice(Pubkey::new_unique().as_ref()); // collection mint
    data.extend_from_slice(&redeemed.to_le_bytes());
    data.extend_from_slice(&(available as u64).to_le_bytes());
    push_string(&mut data, "BUBU");
    data.extend_from_slice(&500u16.to_le_bytes());
    data.extend_from_slice(&0u64.to_le_bytes());
    data.push(1);
    data.extend_from_slice(&0u32.to_le_bytes()); // creators
    data
}

fn push_loaded_bitmask(data: &mut Vec<u8>, count: usize) {
    let mut bitmask = vec![0u8; count / 8 + 1];
    for i in 0..count {
        bitmask[i / 8] |= 0b1000_0000 >> (i % 8);
    }
    data.extend_from_slice(&bitmask);
}

/// A config-line Candy Machine with every line loaded.
pub fn candy_machine_bytes(mint_authority: &Pubkey, redeemed: u64, lines: &[(String, String)]) -> Vec<u8> {
    let mut data = candy_machine_header(mint_authority, redeemed, lines.len());
    data.push(1); // config line settings
    push_string(&mut data, "");
    data.extend_from_slice(&(NAME_LENGTH as u32).to_le_bytes());
    push_string(&mut data, "");
    data.extend_from_slice(&(URI_LENGTH as u32).to_le_bytes());
    data.push(0);
    data.push(0); // hidden settings
    data.resize(HIDDEN_SECTION, 0);

    data.extend_from_slice(&(lines.len() as u32).to_le_bytes());
    for (name, uri) in lines {
        data.extend_from_slice(&padded(name, NAME_LENGTH));
        data.extend_from_slice(&padded(uri, URI_LENGTH));
    }
    push_loaded_bitmask(&mut data, lines.len());
    data
}

/// A Candy Machine without config line settings: every line is stored as two
/// length-prefixed strings in full-width slots.
pub fn candy_machine_bytes_unconfigured(
    mint_authority: &Pubkey,
    redeemed: u64,
    lines: &[(String, String)],
) -> Vec<u8> {
    let mut data = candy_machine_header(mint_authority, redeemed, lines.len());
    data.push(0); // config line settings
    data.push(0); // hidden settings
    data.resize(HIDDEN_SECTION, 0);

    data.extend_from_slice(&(lines.len() as u32).to_le_bytes());
    for (name, uri) in lines {
        data.extend_from_slice(&(name.len() as u32).to_le_bytes());
        data.extend_from_slice(&padded(name, MAX_NAME_LENGTH));
        data.extend_from_slice(&(uri.len() as u32).to_le_bytes());
        data.extend_from_slice(&padded(uri, MAX_URI_LENGTH));
    }
    push_loaded_bitmask(&mut data, lines.len());
    data
}

/// Guards the builders know how to serialize.
#[derive(Clone, Copy, Default)]
pub struct GuardSpec {
    pub sol_payment: Option<(u64, Pubkey)>,
    pub token_gate: Option<(u64, Pubkey)>,
}

fn push_guard_set(data: &mut Vec<u8>, spec: &GuardSpec) {
    let mut features = 0u64;
    if spec.sol_payment.is_some() {
        features |= 1 << 1;
    }
    if spec.token_gate.is_some() {
        features |= 1 << 5;
    }
    data.extend_from_slice(&features.to_le_bytes());
    if let Some((lamports, destination)) = spec.sol_payment {
        data.extend_from_slice(&lamports.to_le_bytes());
        data.extend_from_slice(destination.as_ref());
    }
    if let Some((amount, mint)) = spec.token_gate {
        data.extend_from_slice(&amount.to_le_bytes());
        data.extend_from_slice(mint.as_ref());
    }
}

pub fn candy_guard_bytes(default: &GuardSpec, groups: &[(&str, GuardSpec)]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&CANDY_GUARD_DISCRIMINATOR);
    data.extend_from_slice(Pubkey::new_unique().as_ref()); // base
    data.push(254);
    data.extend_from_slice(Pubkey::new_unique().as_ref()); // authority
    push_guard_set(&mut data, default);
    data.extend_from_slice(&(groups.len() as u32).to_le_bytes());
    for (label, spec) in groups {
        data.extend_from_slice(&padded(label, 6));
        push_guard_set(&mut data, spec);
    }
    data
}

pub fn metadata_bytes(mint: &Pubkey, uri: &str) -> Vec<u8> {
    let mut data = vec![4u8];
    data.extend_from_slice(Pubkey::new_unique().as_ref());
    data.extend_from_slice(mint.as_ref());
    for (s, width) in [("Bubu", 32), ("BUBU", 10), (uri, 200)] {
        data.extend_from_slice(&(width as u32).to_le_bytes());
        data.extend_from_slice(&padded(s, width));
    }
    data
}

pub fn item_uri(i: usize) -> String {
    format!("https://arweave.example/{}.json", i)
}

pub fn lines(count: usize) -> Vec<(String, String)> {
    (0..count).map(|i| (format!("#{}", i + 1), item_uri(i))).collect()
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

pub struct Fixture {
    pub chain: Arc<FakeChain>,
    pub fetcher: Arc<FakeFetcher>,
    pub candy_machine: Pubkey,
    pub candy_guard: Pubkey,
    pub wallet: Pubkey,
    pub session: MintSession,
}

/// A 100-item sale through the `GABU` group priced at 0.5 SOL, 97 minted,
/// with a wallet holding `balance` lamports.
pub fn setup(balance: u64) -> Fixture {
    setup_with(
        &lines(100),
        97,
        &[(GROUP, GuardSpec { sol_payment: Some((LAMPORTS_PER_SOL / 2, Pubkey::new_unique())), ..Default::default() })],
        balance,
        true,
    )
}

pub fn setup_with(
    items: &[(String, String)],
    redeemed: u64,
    groups: &[(&str, GuardSpec)],
    balance: u64,
    with_wallet: bool,
) -> Fixture {
    let candy_machine = Pubkey::new_unique();
    let candy_guard = Pubkey::new_unique();
    let chain = Arc::new(FakeChain::new(candy_machine));
    chain.plant_account(&candy_machine, candy_machine_bytes(&candy_guard, redeemed, items));
    chain.plant_account(&candy_guard, candy_guard_bytes(&GuardSpec::default(), groups));

    let fetcher = Arc::new(FakeFetcher::default());
    for (name, uri) in items {
        fetcher.serve(uri, &format!("Bubu {}", name), &format!("{}.png", uri));
    }
    fetcher.serve(MINTED_URI, "Bubu #98", "https://arweave.example/98.png");

    let keypair = Keypair::new();
    let wallet = keypair.pubkey();
    chain.set_balance(&wallet, balance);

    let config = MintConfig {
        candy_machine: Some(candy_machine),
        group_label: GROUP.to_string(),
        ..Default::default()
    };
    let session = MintSession::new(
        config,
        chain.clone(),
        fetcher.clone(),
        with_wallet.then_some(keypair),
    );

    Fixture {
        chain,
        fetcher,
        candy_machine,
        candy_guard,
        wallet,
        session,
    }
}
