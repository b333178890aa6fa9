use dlc_observer::models::{
	blockchain::stacks::StacksAddress, ChainTag, ClarityValue, EvmNetwork, StacksNetwork,
};
use proptest::prelude::*;

const MAX_COLLECTION_SIZE: usize = 4;

pub fn chain_tag_strategy() -> impl Strategy<Value = ChainTag> {
	prop_oneof![
		prop::sample::select(vec![
			EvmNetwork::Mainnet,
			EvmNetwork::Sepolia,
			EvmNetwork::Goerli,
			EvmNetwork::Localhost,
			EvmNetwork::X1Test,
		])
		.prop_map(ChainTag::Evm),
		prop::sample::select(vec![
			StacksNetwork::Mainnet,
			StacksNetwork::Testnet,
			StacksNetwork::Mocknet,
			StacksNetwork::Local,
		])
		.prop_map(ChainTag::Stacks),
	]
}

pub fn stacks_address_strategy() -> impl Strategy<Value = StacksAddress> {
	(0u8..32, any::<[u8; 20]>()).prop_map(|(version, hash160)| StacksAddress::new(version, hash160))
}

fn clarity_leaf_strategy() -> impl Strategy<Value = ClarityValue> {
	prop_oneof![
		any::<i128>().prop_map(ClarityValue::Int),
		any::<u128>().prop_map(ClarityValue::UInt),
		prop::collection::vec(any::<u8>(), 0..40).prop_map(ClarityValue::Buffer),
		any::<bool>().prop_map(ClarityValue::Bool),
		Just(ClarityValue::None),
		stacks_address_strategy().prop_map(ClarityValue::StandardPrincipal),
		(stacks_address_strategy(), "[a-z][a-z0-9-]{0,30}")
			.prop_map(|(address, name)| ClarityValue::ContractPrincipal(address, name)),
		"[ -~]{0,40}".prop_map(ClarityValue::StringAscii),
		".{0,20}".prop_map(ClarityValue::StringUtf8),
	]
}

pub fn clarity_value_strategy() -> impl Strategy<Value = ClarityValue> {
	clarity_leaf_strategy().prop_recursive(4, 32, MAX_COLLECTION_SIZE as u32, |inner| {
		prop_oneof![
			inner.clone().prop_map(|v| ClarityValue::ResponseOk(Box::new(v))),
			inner.clone().prop_map(|v| ClarityValue::ResponseErr(Box::new(v))),
			inner.clone().prop_map(|v| ClarityValue::Some(Box::new(v))),
			prop::collection::vec(inner.clone(), 0..MAX_COLLECTION_SIZE).prop_map(ClarityValue::List),
			prop::collection::btree_map("[a-z][a-z-]{0,15}", inner, 0..MAX_COLLECTION_SIZE)
				.prop_map(ClarityValue::Tuple),
		]
	})
}
