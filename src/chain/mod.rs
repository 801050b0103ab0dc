//! Chain collaborator services
//!
//! Trait seams for everything the engine needs from the two chains:
//! paginated log queries, the L2-to-L1 message surface, the token
//! counterpart registry, and transaction submission. Concrete
//! implementations talk to EVM nodes through alloy providers; tests
//! substitute mocks.

pub mod logs;
pub mod nitro;
pub mod registry;
pub mod submitter;

pub use logs::{EvmLogClient, LogQueryService, LogQuerySpec};
pub use nitro::{MessageService, NitroMessageClient};
pub use registry::{StaticTokenRegistry, TokenInfo, TokenRegistry};
pub use submitter::{TransactionSubmitter, WalletSubmitter};
