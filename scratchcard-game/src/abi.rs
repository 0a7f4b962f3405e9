//! Just enough of the Solidity ABI for static argument lists: 4-byte
//! selectors followed by 32-byte big-endian words.

use alloy_primitives::{keccak256, Address, Bytes, B256, U256};

pub const WORD: usize = 32;

pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

pub fn event_topic(signature: &str) -> B256 {
    keccak256(signature.as_bytes())
}

pub fn uint_word(value: U256) -> [u8; WORD] {
    value.to_be_bytes::<WORD>()
}

pub fn address_word(address: Address) -> [u8; WORD] {
    address.into_word().0
}

pub fn encode_call(selector: [u8; 4], args: &[[u8; WORD]]) -> Bytes {
    let mut data = Vec::with_capacity(4 + args.len() * WORD);
    data.extend_from_slice(&selector);
    for arg in args {
        data.extend_from_slice(arg);
    }
    Bytes::from(data)
}

/// The `index`-th word of `data`, if present.
pub fn word(data: &[u8], index: usize) -> Option<U256> {
    data.get(index * WORD..(index + 1) * WORD)
        .map(U256::from_be_slice)
}

pub fn word_as_u32(data: &[u8], index: usize) -> Option<u32> {
    let value = word(data, index)?;
    if value > U256::from(u32::MAX) {
        return None;
    }
    Some(value.as_limbs()[0] as u32)
}
