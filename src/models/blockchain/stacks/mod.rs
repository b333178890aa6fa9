//! Stacks model definitions.
//!
//! - `address`: c32check principals
//! - `clarity`: Clarity value codec used by print events and call arguments
//! - `contract_call`: contract-call transaction encoding and signing
//! - `transaction`: socket notification and REST documents

mod address;
mod clarity;
mod contract_call;
mod transaction;

pub use address::{
	c32check_decode, c32check_encode, C32Error, StacksAddress, ADDRESS_VERSION_MAINNET_SINGLESIG,
	ADDRESS_VERSION_TESTNET_SINGLESIG,
};
pub use clarity::{ClarityError, ClarityValue};
pub use contract_call::{AnchorMode, ContractCallPayload, ContractCallTransaction, PostConditionMode};
pub use transaction::{
	AccountInfo, AddressTxNotification, BroadcastRejection, ClarityHex, ContractLog,
	ReadOnlyResponse, TransactionDetail, TransactionEvent, TransactionSummary,
	TX_STATUS_SUCCESS,
};
