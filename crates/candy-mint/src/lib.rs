//! Candy Machine v3 sale reader, eligibility evaluator and mint orchestrator.

pub mod accounts;
pub mod chain;
pub mod config;
pub mod constants;
pub mod descriptor;
pub mod eligibility;
pub mod errors;
pub mod purchase;
pub mod reader;
pub mod sale;
pub mod session;

pub use chain::{ChainClient, RpcChain, SubmitOptions};
pub use config::{Cluster, MintConfig};
pub use descriptor::{Descriptor, DescriptorFetcher, HttpDescriptorFetcher};
pub use eligibility::{evaluate, BlockingReason, EligibilityDecision};
pub use errors::{MintError, Result};
pub use purchase::{payment_destination, PurchaseResult};
pub use sale::{DisplayItem, Identity, Rule, SaleConfiguration, SaleSnapshot};
pub use session::MintSession;
