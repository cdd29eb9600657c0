use std::io;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use candy_mint::{EligibilityDecision, MintError, MintSession, PurchaseResult};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::prelude::*;
use solana_sdk::pubkey::Pubkey;

use crate::ui;

const LOG_CAPACITY: usize = 100;
const INPUT_POLL: Duration = Duration::from_millis(100);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    Confirm,
    Result,
}

/// Outcome of a background job, delivered to the event loop.
enum JobOutcome {
    /// Sale and wallet re-read; carries the wallet's token-gate balance if one applies.
    Refreshed(Result<Option<u64>, MintError>),
    /// A purchase finished; `wallet_error` is set when the follow-up wallet read failed.
    Minted {
        outcome: Result<PurchaseResult, MintError>,
        wallet_error: Option<MintError>,
    },
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    pub session: Arc<MintSession>,
    pub should_quit: bool,
    pub screen: Screen,
    pub message_log: Vec<String>,
    pub verbose: bool,

    /// Label of the job running in the background, if any.
    pub busy: Option<&'static str>,
    /// A read failure that leaves the dashboard without a sale.
    pub load_error: Option<String>,
    pub last_refresh: Option<Instant>,
    pub token_gate_balance: Option<u64>,

    // Item list navigation
    pub item_cursor: usize,

    // Result screen state
    pub last_outcome: Option<Result<PurchaseResult, String>>,

    jobs_tx: Sender<JobOutcome>,
    jobs_rx: Receiver<JobOutcome>,
}

impl App {
    pub fn new(session: MintSession, verbose: bool) -> Self {
        let (jobs_tx, jobs_rx) = channel();
        let mut app = Self {
            session: Arc::new(session),
            should_quit: false,
            screen: Screen::Dashboard,
            message_log: Vec::new(),
            verbose,
            busy: None,
            load_error: None,
            last_refresh: None,
            token_gate_balance: None,
            item_cursor: 0,
            last_outcome: None,
            jobs_tx,
            jobs_rx,
        };
        app.push_log("Welcome to Candy Mint");
        match app.session.wallet_address() {
            Some(wallet) => app.push_log(format!("Wallet: {}", wallet)),
            None => app.push_log("No wallet loaded. Pass --keypair to mint."),
        }
        app.start_refresh();
        app
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        if self.verbose {
            eprintln!("[INFO] {}", msg);
        }
        self.message_log.push(msg);
        if self.message_log.len() > LOG_CAPACITY {
            self.message_log.remove(0);
        }
    }

    pub fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> io::Result<()> {
        while !self.should_quit {
            self.drain_jobs();
            terminal.draw(|frame| ui::draw(frame, self))?;

            if !event::poll(INPUT_POLL)? {
                continue;
            }
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL)
                    && key.code == KeyCode::Char('c')
                {
                    self.should_quit = true;
                    continue;
                }
                match self.screen {
                    Screen::Dashboard => self.handle_dashboard(key.code),
                    Screen::Confirm => self.handle_confirm(key.code),
                    Screen::Result => self.handle_result(key.code),
                }
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Key handlers
    // -----------------------------------------------------------------------

    fn handle_dashboard(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('r') => self.start_refresh(),
            KeyCode::Char('m') => {
                if self.can_mint() {
                    self.screen = Screen::Confirm;
                } else if let Some(reason) = self.blocking_message() {
                    self.push_log(reason);
                }
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.item_cursor = self.item_cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let count = self.session.snapshot().map(|s| s.items.len()).unwrap_or(0);
                if count > 0 && self.item_cursor < count - 1 {
                    self.item_cursor += 1;
                }
            }
            _ => {}
        }
    }

    fn handle_confirm(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                self.screen = Screen::Dashboard;
                self.start_mint();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.screen = Screen::Dashboard;
                self.push_log("Mint cancelled.");
            }
            _ => {}
        }
    }

    fn handle_result(&mut self, _key: KeyCode) {
        self.last_outcome = None;
        self.screen = Screen::Dashboard;
    }

    // -----------------------------------------------------------------------
    // State queries
    // -----------------------------------------------------------------------

    pub fn decision(&self) -> Option<EligibilityDecision> {
        self.session.decision()
    }

    pub fn can_mint(&self) -> bool {
        self.busy.is_none() && self.session.can_purchase()
    }

    /// Why the mint trigger is disabled, in the words shown to the user.
    pub fn blocking_message(&self) -> Option<String> {
        if let Some(job) = self.busy {
            return Some(format!("{} in progress...", job));
        }
        if let Some(err) = &self.load_error {
            return Some(err.clone());
        }
        let decision = self.decision()?;
        let balance = self.session.identity().map(|i| i.lamports);
        decision
            .blocking_error(balance)
            .map(|e| e.to_string())
            .or_else(|| {
                decision
                    .cohort_missing
                    .then(|| format!("Mint group '{}' not found on the candy guard.", self.session.config().group_label))
            })
    }

    // -----------------------------------------------------------------------
    // Background jobs
    // -----------------------------------------------------------------------

    pub fn start_refresh(&mut self) {
        if self.busy.is_some() {
            return;
        }
        self.busy = Some("Refresh");
        self.push_log("Refreshing...");

        let session = Arc::clone(&self.session);
        let tx = self.jobs_tx.clone();
        thread::spawn(move || {
            let _ = tx.send(JobOutcome::Refreshed(refresh_all(&session)));
        });
    }

    fn start_mint(&mut self) {
        if self.busy.is_some() {
            return;
        }
        self.busy = Some("Mint");
        self.push_log(format!("Minting from group {}...", self.session.config().group_label));

        let session = Arc::clone(&self.session);
        let tx = self.jobs_tx.clone();
        thread::spawn(move || {
            let outcome = session.purchase();
            // The sale was re-read by the purchase; the wallet balance changed too.
            let wallet_error = session.refresh_identity().err();
            let _ = tx.send(JobOutcome::Minted { outcome, wallet_error });
        });
    }

    fn drain_jobs(&mut self) {
        while let Ok(outcome) = self.jobs_rx.try_recv() {
            self.busy = None;
            match outcome {
                JobOutcome::Refreshed(Ok(gate_balance)) => {
                    self.load_error = None;
                    self.token_gate_balance = gate_balance;
                    self.last_refresh = Some(Instant::now());
                    self.clamp_cursor();
                    self.log_sale_summary();
                    self.push_log("Refresh complete.");
                }
                JobOutcome::Refreshed(Err(e)) => {
                    self.push_log(e.to_string());
                    self.load_error = Some(e.to_string());
                }
                JobOutcome::Minted { outcome, wallet_error } => {
                    if let Some(e) = wallet_error {
                        self.push_log(format!("Wallet balance may be stale: {}", e));
                    }
                    self.finish_mint(outcome);
                }
            }
        }
    }

    fn finish_mint(&mut self, outcome: Result<PurchaseResult, MintError>) {
        match outcome {
            Ok(result) => {
                self.push_log(format!("TX confirmed: {}", result.signature));
                self.push_log(format!(
                    "Minted {} ({})",
                    result.name,
                    short_pubkey(&result.minted_asset_id)
                ));
                self.last_refresh = Some(Instant::now());
                self.clamp_cursor();
                self.last_outcome = Some(Ok(result));
            }
            Err(e) => {
                self.push_log(e.to_string());
                self.last_outcome = Some(Err(e.to_string()));
            }
        }
        self.screen = Screen::Result;
    }

    fn log_sale_summary(&mut self) {
        let Some(snapshot) = self.session.snapshot() else {
            return;
        };
        let config = &snapshot.config;
        self.push_log(format!(
            "{} / {} minted, {} items displayable",
            config.redeemed_items,
            config.total_items,
            snapshot.items.len()
        ));
        if config.cohort_missing() {
            self.push_log(format!(
                "Group '{}' not found (available: {})",
                self.session.config().group_label,
                config.cohort_labels.join(", ")
            ));
        }
    }

    fn clamp_cursor(&mut self) {
        let count = self.session.snapshot().map(|s| s.items.len()).unwrap_or(0);
        if self.item_cursor >= count {
            self.item_cursor = count.saturating_sub(1);
        }
    }
}

/// Re-read the sale and wallet, then the token-gate balance when a gate applies.
pub fn refresh_all(session: &MintSession) -> Result<Option<u64>, MintError> {
    session.refresh_sale()?;
    session.refresh_identity()?;
    match session.decision().and_then(|d| d.token_gate) {
        Some((mint, _)) => session.token_balance(&mint),
        None => Ok(None),
    }
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

pub fn short_pubkey(pubkey: &Pubkey) -> String {
    let s = pubkey.to_string();
    if s.len() > 12 {
        format!("{}..{}", &s[..4], &s[s.len() - 4..])
    } else {
        s
    }
}

pub fn lamports_to_sol(lamports: u64) -> String {
    let sol = lamports as f64 / 1_000_000_000.0;
    if sol == 0.0 {
        "0".to_string()
    } else if sol < 0.001 {
        format!("{:.9}", sol)
    } else {
        format!("{:.4}", sol)
    }
}
