//! Clarity value codec.
//!
//! Print events arrive as hex encoded, consensus serialized Clarity values and
//! contract-call arguments leave in the same encoding. Only the value types a
//! DLC manager can emit or accept are modelled, which is the full set of
//! serializable Clarity types.

use std::collections::BTreeMap;

use thiserror::Error;

use super::address::StacksAddress;

const TYPE_INT: u8 = 0x00;
const TYPE_UINT: u8 = 0x01;
const TYPE_BUFFER: u8 = 0x02;
const TYPE_TRUE: u8 = 0x03;
const TYPE_FALSE: u8 = 0x04;
const TYPE_STANDARD_PRINCIPAL: u8 = 0x05;
const TYPE_CONTRACT_PRINCIPAL: u8 = 0x06;
const TYPE_RESPONSE_OK: u8 = 0x07;
const TYPE_RESPONSE_ERR: u8 = 0x08;
const TYPE_NONE: u8 = 0x09;
const TYPE_SOME: u8 = 0x0a;
const TYPE_LIST: u8 = 0x0b;
const TYPE_TUPLE: u8 = 0x0c;
const TYPE_STRING_ASCII: u8 = 0x0d;
const TYPE_STRING_UTF8: u8 = 0x0e;

/// Nesting limit for untrusted input
const MAX_DEPTH: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClarityError {
	#[error("unexpected end of input at offset {0}")]
	UnexpectedEof(usize),
	#[error("unknown type prefix 0x{0:02x}")]
	UnknownType(u8),
	#[error("invalid hex: {0}")]
	InvalidHex(String),
	#[error("invalid string: {0}")]
	InvalidString(String),
	#[error("value nested too deeply")]
	TooDeep,
	#[error("trailing bytes after value")]
	TrailingBytes,
	#[error("name {0:?} is longer than 128 bytes")]
	NameTooLong(String),
}

/// A deserialized Clarity value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClarityValue {
	Int(i128),
	UInt(u128),
	Buffer(Vec<u8>),
	Bool(bool),
	StandardPrincipal(StacksAddress),
	ContractPrincipal(StacksAddress, String),
	ResponseOk(Box<ClarityValue>),
	ResponseErr(Box<ClarityValue>),
	None,
	Some(Box<ClarityValue>),
	List(Vec<ClarityValue>),
	Tuple(BTreeMap<String, ClarityValue>),
	StringAscii(String),
	StringUtf8(String),
}

struct Reader<'a> {
	bytes: &'a [u8],
	offset: usize,
}

impl<'a> Reader<'a> {
	fn take(&mut self, len: usize) -> Result<&'a [u8], ClarityError> {
		let end = self
			.offset
			.checked_add(len)
			.filter(|end| *end <= self.bytes.len())
			.ok_or(ClarityError::UnexpectedEof(self.offset))?;
		let slice = &self.bytes[self.offset..end];
		self.offset = end;
		Ok(slice)
	}

	fn u8(&mut self) -> Result<u8, ClarityError> {
		Ok(self.take(1)?[0])
	}

	fn u32(&mut self) -> Result<u32, ClarityError> {
		let mut buf = [0u8; 4];
		buf.copy_from_slice(self.take(4)?);
		Ok(u32::from_be_bytes(buf))
	}

	fn array<const N: usize>(&mut self) -> Result<[u8; N], ClarityError> {
		let mut buf = [0u8; N];
		buf.copy_from_slice(self.take(N)?);
		Ok(buf)
	}

	fn remaining(&self) -> usize {
		self.bytes.len() - self.offset
	}

	fn name(&mut self) -> Result<String, ClarityError> {
		let len = self.u8()? as usize;
		let raw = self.take(len)?;
		String::from_utf8(raw.to_vec()).map_err(|e| ClarityError::InvalidString(e.to_string()))
	}

	fn principal(&mut self) -> Result<StacksAddress, ClarityError> {
		let version = self.u8()?;
		let hash160 = self.array::<20>()?;
		Ok(StacksAddress::new(version, hash160))
	}

	fn value(&mut self, depth: usize) -> Result<ClarityValue, ClarityError> {
		if depth > MAX_DEPTH {
			return Err(ClarityError::TooDeep);
		}
		let prefix = self.u8()?;
		let value = match prefix {
			TYPE_INT => ClarityValue::Int(i128::from_be_bytes(self.array::<16>()?)),
			TYPE_UINT => ClarityValue::UInt(u128::from_be_bytes(self.array::<16>()?)),
			TYPE_BUFFER => {
				let len = self.u32()? as usize;
				ClarityValue::Buffer(self.take(len)?.to_vec())
			}
			TYPE_TRUE => ClarityValue::Bool(true),
			TYPE_FALSE => ClarityValue::Bool(false),
			TYPE_STANDARD_PRINCIPAL => ClarityValue::StandardPrincipal(self.principal()?),
			TYPE_CONTRACT_PRINCIPAL => {
				let address = self.principal()?;
				ClarityValue::ContractPrincipal(address, self.name()?)
			}
			TYPE_RESPONSE_OK => ClarityValue::ResponseOk(Box::new(self.value(depth + 1)?)),
			TYPE_RESPONSE_ERR => ClarityValue::ResponseErr(Box::new(self.value(depth + 1)?)),
			TYPE_NONE => ClarityValue::None,
			TYPE_SOME => ClarityValue::Some(Box::new(self.value(depth + 1)?)),
			TYPE_LIST => {
				let len = self.u32()? as usize;
				// every element takes at least one byte
				if len > self.remaining() {
					return Err(ClarityError::UnexpectedEof(self.offset));
				}
				let mut items = Vec::with_capacity(len);
				for _ in 0..len {
					items.push(self.value(depth + 1)?);
				}
				ClarityValue::List(items)
			}
			TYPE_TUPLE => {
				let len = self.u32()? as usize;
				if len > self.remaining() {
					return Err(ClarityError::UnexpectedEof(self.offset));
				}
				let mut fields = BTreeMap::new();
				for _ in 0..len {
					let key = self.name()?;
					let value = self.value(depth + 1)?;
					fields.insert(key, value);
				}
				ClarityValue::Tuple(fields)
			}
			TYPE_STRING_ASCII => {
				let len = self.u32()? as usize;
				let raw = self.take(len)?;
				if !raw.is_ascii() {
					return Err(ClarityError::InvalidString("non-ascii byte".to_string()));
				}
				ClarityValue::StringAscii(String::from_utf8_lossy(raw).into_owned())
			}
			TYPE_STRING_UTF8 => {
				let len = self.u32()? as usize;
				let raw = self.take(len)?;
				ClarityValue::StringUtf8(
					String::from_utf8(raw.to_vec())
						.map_err(|e| ClarityError::InvalidString(e.to_string()))?,
				)
			}
			other => return Err(ClarityError::UnknownType(other)),
		};
		Ok(value)
	}
}

impl ClarityValue {
	/// Deserializes one value that must span the whole input.
	pub fn deserialize(bytes: &[u8]) -> Result<Self, ClarityError> {
		let mut reader = Reader { bytes, offset: 0 };
		let value = reader.value(0)?;
		if reader.remaining() != 0 {
			return Err(ClarityError::TrailingBytes);
		}
		Ok(value)
	}

	/// Deserializes a `0x` prefixed (or bare) hex string.
	pub fn from_hex(hex_str: &str) -> Result<Self, ClarityError> {
		let trimmed = hex_str.strip_prefix("0x").unwrap_or(hex_str);
		let bytes = hex::decode(trimmed).map_err(|e| ClarityError::InvalidHex(e.to_string()))?;
		Self::deserialize(&bytes)
	}

	/// Consensus serialization.
	pub fn serialize(&self) -> Vec<u8> {
		let mut out = Vec::new();
		self.write_to(&mut out);
		out
	}

	/// Consensus serialization as `0x` prefixed hex, the form read-only calls expect.
	pub fn to_hex(&self) -> String {
		format!("0x{}", hex::encode(self.serialize()))
	}

	fn write_to(&self, out: &mut Vec<u8>) {
		match self {
			Self::Int(v) => {
				out.push(TYPE_INT);
				out.extend_from_slice(&v.to_be_bytes());
			}
			Self::UInt(v) => {
				out.push(TYPE_UINT);
				out.extend_from_slice(&v.to_be_bytes());
			}
			Self::Buffer(bytes) => {
				out.push(TYPE_BUFFER);
				out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
				out.extend_from_slice(bytes);
			}
			Self::Bool(true) => out.push(TYPE_TRUE),
			Self::Bool(false) => out.push(TYPE_FALSE),
			Self::StandardPrincipal(address) => {
				out.push(TYPE_STANDARD_PRINCIPAL);
				out.push(address.version);
				out.extend_from_slice(&address.hash160);
			}
			Self::ContractPrincipal(address, name) => {
				out.push(TYPE_CONTRACT_PRINCIPAL);
				out.push(address.version);
				out.extend_from_slice(&address.hash160);
				out.push(name.len() as u8);
				out.extend_from_slice(name.as_bytes());
			}
			Self::ResponseOk(inner) => {
				out.push(TYPE_RESPONSE_OK);
				inner.write_to(out);
			}
			Self::ResponseErr(inner) => {
				out.push(TYPE_RESPONSE_ERR);
				inner.write_to(out);
			}
			Self::None => out.push(TYPE_NONE),
			Self::Some(inner) => {
				out.push(TYPE_SOME);
				inner.write_to(out);
			}
			Self::List(items) => {
				out.push(TYPE_LIST);
				out.extend_from_slice(&(items.len() as u32).to_be_bytes());
				for item in items {
					item.write_to(out);
				}
			}
			Self::Tuple(fields) => {
				out.push(TYPE_TUPLE);
				out.extend_from_slice(&(fields.len() as u32).to_be_bytes());
				for (key, value) in fields {
					out.push(key.len() as u8);
					out.extend_from_slice(key.as_bytes());
					value.write_to(out);
				}
			}
			Self::StringAscii(s) => {
				out.push(TYPE_STRING_ASCII);
				out.extend_from_slice(&(s.len() as u32).to_be_bytes());
				out.extend_from_slice(s.as_bytes());
			}
			Self::StringUtf8(s) => {
				out.push(TYPE_STRING_UTF8);
				out.extend_from_slice(&(s.len() as u32).to_be_bytes());
				out.extend_from_slice(s.as_bytes());
			}
		}
	}

	/// Parses `SP...` or `SP....contract-name` into a principal value.
	pub fn principal(principal: &str) -> Result<Self, super::address::C32Error> {
		match principal.split_once('.') {
			Some((address, name)) => Ok(Self::ContractPrincipal(
				address.parse()?,
				name.to_string(),
			)),
			None => Ok(Self::StandardPrincipal(principal.parse()?)),
		}
	}

	/// Field lookup on a tuple.
	pub fn get(&self, key: &str) -> Option<&ClarityValue> {
		match self {
			Self::Tuple(fields) => fields.get(key),
			_ => None,
		}
	}

	/// Strips `some`/`ok` wrappers.
	pub fn unwrapped(&self) -> &ClarityValue {
		match self {
			Self::Some(inner) | Self::ResponseOk(inner) => inner.unwrapped(),
			other => other,
		}
	}

	pub fn as_str(&self) -> Option<&str> {
		match self.unwrapped() {
			Self::StringAscii(s) | Self::StringUtf8(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_buffer(&self) -> Option<&[u8]> {
		match self.unwrapped() {
			Self::Buffer(bytes) => Some(bytes),
			_ => None,
		}
	}

	/// Integer value of an `int` or `uint`, if it fits a signed 128 bit integer.
	pub fn as_i128(&self) -> Option<i128> {
		match self.unwrapped() {
			Self::Int(v) => Some(*v),
			Self::UInt(v) => i128::try_from(*v).ok(),
			_ => None,
		}
	}

	pub fn as_list(&self) -> Option<&[ClarityValue]> {
		match self.unwrapped() {
			Self::List(items) => Some(items),
			_ => None,
		}
	}

	/// Plain JSON rendering for API responses. Integers become decimal strings
	/// and buffers `0x` hex, so no precision is lost.
	pub fn to_json(&self) -> serde_json::Value {
		use serde_json::{json, Value};
		match self {
			Self::Int(v) => Value::String(v.to_string()),
			Self::UInt(v) => Value::String(v.to_string()),
			Self::Buffer(bytes) => Value::String(format!("0x{}", hex::encode(bytes))),
			Self::Bool(b) => Value::Bool(*b),
			Self::StandardPrincipal(_) | Self::ContractPrincipal(..) => {
				Value::String(self.as_principal().unwrap_or_default())
			}
			Self::ResponseOk(inner) => json!({ "ok": inner.to_json() }),
			Self::ResponseErr(inner) => json!({ "err": inner.to_json() }),
			Self::None => Value::Null,
			Self::Some(inner) => inner.to_json(),
			Self::List(items) => Value::Array(items.iter().map(|i| i.to_json()).collect()),
			Self::Tuple(fields) => Value::Object(
				fields
					.iter()
					.map(|(k, v)| (k.clone(), v.to_json()))
					.collect(),
			),
			Self::StringAscii(s) | Self::StringUtf8(s) => Value::String(s.clone()),
		}
	}

	/// Principal rendered in its textual form.
	pub fn as_principal(&self) -> Option<String> {
		match self.unwrapped() {
			Self::StandardPrincipal(address) => Some(address.to_string()),
			Self::ContractPrincipal(address, name) => Some(format!("{}.{}", address, name)),
			_ => None,
		}
	}
}
