//! c32check address encoding.
//!
//! Stacks principals are rendered as `S` + c32check(version, hash160). The
//! checksum is the first four bytes of a double SHA-256 over `version || hash160`.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use thiserror::Error;

const C32_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Mainnet single-sig address version (`SP...`)
pub const ADDRESS_VERSION_MAINNET_SINGLESIG: u8 = 22;
/// Testnet single-sig address version (`ST...`)
pub const ADDRESS_VERSION_TESTNET_SINGLESIG: u8 = 26;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum C32Error {
	#[error("invalid c32 character: {0}")]
	InvalidCharacter(char),
	#[error("invalid address: {0}")]
	InvalidAddress(String),
	#[error("checksum mismatch")]
	BadChecksum,
}

/// A decoded standard principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StacksAddress {
	pub version: u8,
	pub hash160: [u8; 20],
}

impl StacksAddress {
	pub fn new(version: u8, hash160: [u8; 20]) -> Self {
		Self { version, hash160 }
	}

	/// Single-sig address of a SEC1 public key: `RIPEMD160(SHA256(key))`.
	pub fn from_public_key(version: u8, public_key: &[u8]) -> Self {
		let digest = Ripemd160::digest(Sha256::digest(public_key));
		let mut hash160 = [0u8; 20];
		hash160.copy_from_slice(&digest);
		Self { version, hash160 }
	}

	/// Parses an `S...` address.
	pub fn from_string(address: &str) -> Result<Self, C32Error> {
		let body = address
			.strip_prefix('S')
			.ok_or_else(|| C32Error::InvalidAddress(address.to_string()))?;
		let (version, data) = c32check_decode(body)?;
		let hash160: [u8; 20] = data
			.try_into()
			.map_err(|_| C32Error::InvalidAddress(address.to_string()))?;
		Ok(Self { version, hash160 })
	}
}

impl std::fmt::Display for StacksAddress {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "S{}", c32check_encode(self.version, &self.hash160))
	}
}

impl std::str::FromStr for StacksAddress {
	type Err = C32Error;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_string(s)
	}
}

fn checksum(version: u8, data: &[u8]) -> [u8; 4] {
	let mut hasher = Sha256::new();
	hasher.update([version]);
	hasher.update(data);
	let first = hasher.finalize();
	let second = Sha256::digest(first);
	[second[0], second[1], second[2], second[3]]
}

fn c32_encode(input: &[u8]) -> String {
	let mut result: Vec<u8> = Vec::with_capacity(input.len() * 8 / 5 + 1);
	let mut carry: u16 = 0;
	let mut carry_bits: u16 = 0;

	for byte in input.iter().rev() {
		let value = *byte as u16;
		let low_bits_to_take = 5 - carry_bits;
		let low_bits = value & ((1 << low_bits_to_take) - 1);
		let c32_value = (low_bits << carry_bits) + carry;
		result.push(C32_ALPHABET[c32_value as usize]);
		carry_bits = (8 + carry_bits) - 5;
		carry = value >> (8 - carry_bits);

		if carry_bits >= 5 {
			result.push(C32_ALPHABET[(carry & 0x1f) as usize]);
			carry_bits -= 5;
			carry >>= 5;
		}
	}

	if carry_bits > 0 {
		result.push(C32_ALPHABET[carry as usize]);
	}

	// strip encoding zeros, then restore one '0' per leading zero byte
	while result.last() == Some(&C32_ALPHABET[0]) {
		result.pop();
	}
	for byte in input.iter() {
		if *byte != 0 {
			break;
		}
		result.push(C32_ALPHABET[0]);
	}

	result.reverse();
	String::from_utf8_lossy(&result).into_owned()
}

fn c32_value(c: char) -> Result<u8, C32Error> {
	let normalized = match c.to_ascii_uppercase() {
		'O' => '0',
		'I' | 'L' => '1',
		other => other,
	};
	C32_ALPHABET
		.iter()
		.position(|a| *a as char == normalized)
		.map(|p| p as u8)
		.ok_or(C32Error::InvalidCharacter(c))
}

fn c32_decode(input: &str) -> Result<Vec<u8>, C32Error> {
	let mut result: Vec<u8> = Vec::with_capacity(input.len());
	let mut carry: u16 = 0;
	let mut carry_bits: u16 = 0;

	let leading_zeros = input.chars().take_while(|c| *c == '0').count();

	for c in input.chars().rev() {
		carry += (c32_value(c)? as u16) << carry_bits;
		carry_bits += 5;
		if carry_bits >= 8 {
			result.push((carry & 0xff) as u8);
			carry_bits -= 8;
			carry >>= 8;
		}
	}

	if carry_bits > 0 {
		result.push(carry as u8);
	}

	while result.last() == Some(&0) {
		result.pop();
	}
	result.extend(std::iter::repeat_n(0u8, leading_zeros));
	result.reverse();
	Ok(result)
}

/// Encodes `data` with a version character and a 4 byte checksum.
pub fn c32check_encode(version: u8, data: &[u8]) -> String {
	let mut payload = data.to_vec();
	payload.extend_from_slice(&checksum(version, data));
	let mut encoded = String::with_capacity(payload.len() * 2);
	encoded.push(C32_ALPHABET[(version & 0x1f) as usize] as char);
	encoded.push_str(&c32_encode(&payload));
	encoded
}

/// Decodes a c32check string into its version and payload.
pub fn c32check_decode(input: &str) -> Result<(u8, Vec<u8>), C32Error> {
	if !input.is_ascii() || input.len() < 2 {
		return Err(C32Error::InvalidAddress(input.to_string()));
	}
	let (version_char, body) = input.split_at(1);
	let version = c32_value(version_char.chars().next().unwrap_or('?'))?;
	let decoded = c32_decode(body)?;
	if decoded.len() < 4 {
		return Err(C32Error::InvalidAddress(input.to_string()));
	}
	let (data, sum) = decoded.split_at(decoded.len() - 4);
	if checksum(version, data) != sum {
		return Err(C32Error::BadChecksum);
	}
	Ok((version, data.to_vec()))
}
