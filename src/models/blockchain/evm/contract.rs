use alloy::sol;

sol! {
	/// DLC manager contract, v1 interface.
	#[sol(rpc)]
	contract DLCManager {
		struct DLC {
			bytes32 uuid;
			string[] attestorList;
			address protocolWallet;
			address creator;
			uint256 outcome;
			uint8 status;
			string fundingTxId;
			string closingTxId;
		}

		event CreateDLC(bytes32 uuid, string[] attestorList, address creator, address protocolWallet, string eventSource);
		event SetStatusFunded(bytes32 uuid, address creator, address protocolWallet, address sender, string eventSource);
		event CloseDLC(bytes32 uuid, uint256 outcome, address creator, address protocolWallet, address sender, string eventSource);
		event PostCloseDLC(bytes32 uuid, uint256 outcome, address creator, address protocolWallet, address sender, string btcTxId, string eventSource);

		function setStatusFunded(bytes32 uuid, string btcTxId) external;
		function postCloseDLC(bytes32 uuid, string btcTxId) external;
		function getDLC(bytes32 uuid) external view returns (DLC memory);
	}
}
