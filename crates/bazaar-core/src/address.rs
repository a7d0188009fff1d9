//! Address/credential codec.
//!
//! Converts between bech32 chain addresses (`addr1…`, `addr_test1…`) and the
//! structured form validators see: a payment credential plus an optional
//! stake credential.
//!
//! Supported Shelley-era kinds, by header type nibble:
//!
//! | type | payment | stake     |
//! |------|---------|-----------|
//! | 0    | key     | key       |
//! | 1    | script  | key       |
//! | 2    | key     | script    |
//! | 3    | script  | script    |
//! | 4    | key     | pointer   |
//! | 5    | script  | pointer   |
//! | 6    | key     | -         |
//! | 7    | script  | -         |
//!
//! Bootstrap (Byron) addresses and reward addresses are rejected with
//! [`CoreError::UnsupportedAddressForm`].

use std::fmt;

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::hash::{KeyHash, ScriptHash};

const CREDENTIAL_LEN: usize = 28;

/// Ledger network an address belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    /// Production network (network id 1, `addr` prefix).
    Mainnet,
    /// Any test network (network id 0, `addr_test` prefix).
    #[default]
    Testnet,
}

impl Network {
    /// Network id carried in the address header.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Mainnet => 1,
            Self::Testnet => 0,
        }
    }

    /// Human-readable bech32 prefix for payment addresses.
    #[must_use]
    pub const fn hrp(self) -> &'static str {
        match self {
            Self::Mainnet => "addr",
            Self::Testnet => "addr_test",
        }
    }

    fn from_id(id: u8) -> Result<Self> {
        match id {
            1 => Ok(Self::Mainnet),
            0 => Ok(Self::Testnet),
            other => Err(CoreError::invalid_address(format!("unknown network id {other}"))),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Testnet => write!(f, "testnet"),
        }
    }
}

/// Spending authority: either a verification-key hash or a script hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Credential {
    /// Authorized by a signature from the key with this hash.
    VerificationKey(KeyHash),
    /// Authorized by running the script with this hash.
    Script(ScriptHash),
}

impl Credential {
    /// The underlying 28-byte hash.
    #[must_use]
    pub const fn hash(&self) -> &KeyHash {
        match self {
            Self::VerificationKey(h) | Self::Script(h) => h,
        }
    }

    /// The key hash, if this is a key credential.
    #[must_use]
    pub const fn key_hash(&self) -> Option<KeyHash> {
        match self {
            Self::VerificationKey(h) => Some(*h),
            Self::Script(_) => None,
        }
    }

    /// The script hash, if this is a script credential.
    #[must_use]
    pub const fn script_hash(&self) -> Option<ScriptHash> {
        match self {
            Self::Script(h) => Some(*h),
            Self::VerificationKey(_) => None,
        }
    }

    const fn is_script(&self) -> bool {
        matches!(self, Self::Script(_))
    }
}

/// Location of a stake registration certificate on chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pointer {
    /// Slot of the registering transaction.
    pub slot: u64,
    /// Index of the transaction within the block.
    pub tx_index: u64,
    /// Index of the certificate within the transaction.
    pub cert_index: u64,
}

/// Delegation part of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeCredential {
    /// Stake credential given directly.
    Inline(Credential),
    /// Stake credential given by certificate pointer.
    Pointer(Pointer),
}

/// Structured address as consumed by validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address {
    /// Who may spend outputs at this address.
    pub payment: Credential,
    /// Who receives staking rights, if anyone.
    pub stake: Option<StakeCredential>,
}

impl Address {
    /// Create an address from its parts.
    #[must_use]
    pub const fn new(payment: Credential, stake: Option<StakeCredential>) -> Self {
        Self { payment, stake }
    }

    /// Create an address with no stake part.
    #[must_use]
    pub const fn enterprise(payment: Credential) -> Self {
        Self::new(payment, None)
    }

    /// Address locked by a script, with no stake part.
    #[must_use]
    pub const fn script(hash: ScriptHash) -> Self {
        Self::enterprise(Credential::Script(hash))
    }

    /// Payment key hash, if the payment part is a key credential.
    #[must_use]
    pub const fn payment_key_hash(&self) -> Option<KeyHash> {
        self.payment.key_hash()
    }

    /// Header type nibble for this shape.
    const fn header_type(&self) -> u8 {
        let script_payment = self.payment.is_script() as u8;
        match &self.stake {
            Some(StakeCredential::Inline(stake)) => ((stake.is_script() as u8) << 1) | script_payment,
            Some(StakeCredential::Pointer(_)) => 0b0100 | script_payment,
            None => 0b0110 | script_payment,
        }
    }

    /// Short name of this address kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self.stake {
            Some(StakeCredential::Inline(_)) => "base",
            Some(StakeCredential::Pointer(_)) => "pointer",
            None => "enterprise",
        }
    }

    /// Raw address bytes (header, payment hash, stake part).
    #[must_use]
    pub fn to_bytes(&self, network: Network) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + 2 * CREDENTIAL_LEN);
        bytes.push((self.header_type() << 4) | network.id());
        bytes.extend_from_slice(self.payment.hash().as_bytes());
        match &self.stake {
            Some(StakeCredential::Inline(stake)) => bytes.extend_from_slice(stake.hash().as_bytes()),
            Some(StakeCredential::Pointer(pointer)) => {
                write_varuint(&mut bytes, pointer.slot);
                write_varuint(&mut bytes, pointer.tx_index);
                write_varuint(&mut bytes, pointer.cert_index);
            }
            None => {}
        }
        bytes
    }

    /// Parse raw address bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedAddressForm`] for bootstrap, reward, or
    /// unknown header types, and [`CoreError::InvalidAddress`] for truncated or
    /// oversized payloads.
    pub fn from_bytes(bytes: &[u8]) -> Result<(Network, Self)> {
        let (&header, body) = bytes
            .split_first()
            .ok_or_else(|| CoreError::invalid_address("empty address"))?;
        let header_type = header >> 4;

        match header_type {
            0b1000 => return Err(CoreError::unsupported_address("bootstrap")),
            0b1110 | 0b1111 => return Err(CoreError::unsupported_address("reward")),
            0b1001..=0b1101 => {
                return Err(CoreError::unsupported_address(format!(
                    "unknown header type {header_type}"
                )));
            }
            _ => {}
        }

        let network = Network::from_id(header & 0x0f)?;
        if body.len() < CREDENTIAL_LEN {
            return Err(CoreError::invalid_address("payment credential truncated"));
        }
        let (payment_bytes, rest) = body.split_at(CREDENTIAL_LEN);
        let payment = credential(header_type & 0b0001 != 0, payment_bytes)?;

        let stake = match header_type {
            0b0000..=0b0011 => {
                if rest.len() != CREDENTIAL_LEN {
                    return Err(CoreError::invalid_address(format!(
                        "base address stake part must be {CREDENTIAL_LEN} bytes, got {}",
                        rest.len()
                    )));
                }
                Some(StakeCredential::Inline(credential(header_type & 0b0010 != 0, rest)?))
            }
            0b0100 | 0b0101 => {
                let mut cursor = rest;
                let pointer = Pointer {
                    slot: read_varuint(&mut cursor)?,
                    tx_index: read_varuint(&mut cursor)?,
                    cert_index: read_varuint(&mut cursor)?,
                };
                if !cursor.is_empty() {
                    return Err(CoreError::invalid_address("trailing bytes after pointer"));
                }
                Some(StakeCredential::Pointer(pointer))
            }
            _ => {
                if !rest.is_empty() {
                    return Err(CoreError::invalid_address("trailing bytes after enterprise address"));
                }
                None
            }
        };

        Ok((network, Self { payment, stake }))
    }

    /// Encode as bech32 for `network`.
    ///
    /// # Errors
    ///
    /// Returns an error if bech32 encoding fails.
    pub fn to_bech32(&self, network: Network) -> Result<String> {
        let hrp = Hrp::parse(network.hrp()).map_err(|e| CoreError::invalid_address(e.to_string()))?;
        bech32::encode::<Bech32>(hrp, &self.to_bytes(network))
            .map_err(|e| CoreError::invalid_address(e.to_string()))
    }

    /// Decode a bech32 address, keeping the network it was encoded for.
    ///
    /// # Errors
    ///
    /// See [`Address::from_bytes`]; additionally fails if the prefix does not
    /// match the header's network.
    pub fn decode_with_network(address: &str) -> Result<(Network, Self)> {
        if looks_like_bootstrap(address) {
            return Err(CoreError::unsupported_address("bootstrap"));
        }

        let (hrp, bytes) =
            bech32::decode(address).map_err(|e| CoreError::invalid_address(e.to_string()))?;
        let prefix = hrp.to_lowercase();
        if prefix == "stake" || prefix == "stake_test" {
            return Err(CoreError::unsupported_address("reward"));
        }

        let (network, decoded) = Self::from_bytes(&bytes)?;
        if prefix != network.hrp() {
            return Err(CoreError::invalid_address(format!(
                "prefix '{prefix}' does not match {network} header"
            )));
        }
        Ok((network, decoded))
    }

    /// Decode a bech32 address into its structured form.
    ///
    /// # Errors
    ///
    /// See [`Address::decode_with_network`].
    pub fn from_bech32(address: &str) -> Result<Self> {
        Self::decode_with_network(address).map(|(_, decoded)| decoded)
    }
}

/// Decode a bech32 address into its structured form.
///
/// # Errors
///
/// Returns [`CoreError::UnsupportedAddressForm`] for bootstrap and reward
/// addresses, [`CoreError::InvalidAddress`] for anything unparseable.
pub fn decode(address: &str) -> Result<Address> {
    Address::from_bech32(address)
}

/// Encode a structured address as bech32 for `network`.
///
/// # Errors
///
/// Returns an error if bech32 encoding fails.
pub fn encode(address: &Address, network: Network) -> Result<String> {
    address.to_bech32(network)
}

fn credential(is_script: bool, bytes: &[u8]) -> Result<Credential> {
    let hash = KeyHash::from_slice(bytes)?;
    Ok(if is_script {
        Credential::Script(hash)
    } else {
        Credential::VerificationKey(hash)
    })
}

// Byron addresses are base58, not bech32.
fn looks_like_bootstrap(address: &str) -> bool {
    address.starts_with("Ae2") || address.starts_with("DdzFF")
}

fn write_varuint(out: &mut Vec<u8>, mut value: u64) {
    let mut groups = vec![(value & 0x7f) as u8];
    value >>= 7;
    while value > 0 {
        groups.push(((value & 0x7f) as u8) | 0x80);
        value >>= 7;
    }
    out.extend(groups.iter().rev());
}

fn read_varuint(cursor: &mut &[u8]) -> Result<u64> {
    let mut value: u64 = 0;
    loop {
        let (&byte, rest) = cursor
            .split_first()
            .ok_or_else(|| CoreError::invalid_address("pointer truncated"))?;
        *cursor = rest;
        if value > (u64::MAX >> 7) {
            return Err(CoreError::invalid_address("pointer component overflows u64"));
        }
        value = (value << 7) | u64::from(byte & 0x7f);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u8) -> Credential {
        Credential::VerificationKey(KeyHash::new([n; 28]))
    }

    fn script(n: u8) -> Credential {
        Credential::Script(ScriptHash::new([n; 28]))
    }

    #[test]
    fn test_header_prefixes() {
        let base = Address::new(key(1), Some(StakeCredential::Inline(key(2))));
        assert!(base.to_bech32(Network::Mainnet).unwrap().starts_with("addr1q"));
        assert!(base.to_bech32(Network::Testnet).unwrap().starts_with("addr_test1q"));

        let script_base = Address::new(script(1), Some(StakeCredential::Inline(key(2))));
        assert!(script_base.to_bech32(Network::Mainnet).unwrap().starts_with("addr1z"));

        let enterprise = Address::enterprise(key(3));
        assert!(enterprise.to_bech32(Network::Mainnet).unwrap().starts_with("addr1v"));

        let pointer = Address::new(
            key(4),
            Some(StakeCredential::Pointer(Pointer { slot: 2_498_243, tx_index: 27, cert_index: 3 })),
        );
        assert!(pointer.to_bech32(Network::Mainnet).unwrap().starts_with("addr1g"));
    }

    #[test]
    fn test_roundtrip_all_shapes() {
        let shapes = [
            Address::new(key(1), Some(StakeCredential::Inline(key(2)))),
            Address::new(script(1), Some(StakeCredential::Inline(key(2)))),
            Address::new(key(1), Some(StakeCredential::Inline(script(2)))),
            Address::new(script(1), Some(StakeCredential::Inline(script(2)))),
            Address::new(key(1), Some(StakeCredential::Pointer(Pointer { slot: 0, tx_index: 0, cert_index: 0 }))),
            Address::new(script(1), Some(StakeCredential::Pointer(Pointer { slot: u64::MAX, tx_index: 128, cert_index: 127 }))),
            Address::enterprise(key(9)),
            Address::script(ScriptHash::new([9; 28])),
        ];
        for network in [Network::Mainnet, Network::Testnet] {
            for shape in shapes {
                let encoded = shape.to_bech32(network).unwrap();
                let (decoded_network, decoded) = Address::decode_with_network(&encoded).unwrap();
                assert_eq!(decoded, shape);
                assert_eq!(decoded_network, network);
            }
        }
    }

    #[test]
    fn test_bootstrap_rejected() {
        let err = decode("Ae2tdPwUPEZFRbyhz3cpfC2CumGzNkFBN2L42rcUc2yjQpEkxDbkPodpMAi").unwrap_err();
        assert_eq!(err, CoreError::unsupported_address("bootstrap"));

        let mut bytes = Address::enterprise(key(1)).to_bytes(Network::Mainnet);
        bytes[0] = 0x81;
        let err = Address::from_bytes(&bytes).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedAddressForm { .. }));
    }

    #[test]
    fn test_reward_rejected() {
        let mut bytes = vec![0xe1];
        bytes.extend_from_slice(&[5u8; 28]);
        let hrp = Hrp::parse("stake").unwrap();
        let encoded = bech32::encode::<Bech32>(hrp, &bytes).unwrap();
        let err = decode(&encoded).unwrap_err();
        assert_eq!(err, CoreError::unsupported_address("reward"));

        let err = Address::from_bytes(&bytes).unwrap_err();
        assert_eq!(err, CoreError::unsupported_address("reward"));
    }

    #[test]
    fn test_garbage_is_invalid_not_unsupported() {
        let err = decode("not an address").unwrap_err();
        assert!(matches!(err, CoreError::InvalidAddress { .. }));
    }

    #[test]
    fn test_prefix_must_match_network() {
        let bytes = Address::enterprise(key(1)).to_bytes(Network::Testnet);
        let hrp = Hrp::parse("addr").unwrap();
        let encoded = bech32::encode::<Bech32>(hrp, &bytes).unwrap();
        assert!(matches!(decode(&encoded), Err(CoreError::InvalidAddress { .. })));
    }

    #[test]
    fn test_truncated_base_rejected() {
        let mut bytes = Address::new(key(1), Some(StakeCredential::Inline(key(2)))).to_bytes(Network::Testnet);
        bytes.pop();
        assert!(matches!(Address::from_bytes(&bytes), Err(CoreError::InvalidAddress { .. })));
    }

    #[test]
    fn test_varuint_encoding() {
        let mut out = Vec::new();
        write_varuint(&mut out, 0);
        write_varuint(&mut out, 127);
        write_varuint(&mut out, 128);
        assert_eq!(out, vec![0x00, 0x7f, 0x81, 0x00]);

        let mut cursor: &[u8] = &out;
        assert_eq!(read_varuint(&mut cursor).unwrap(), 0);
        assert_eq!(read_varuint(&mut cursor).unwrap(), 127);
        assert_eq!(read_varuint(&mut cursor).unwrap(), 128);
        assert!(cursor.is_empty());
    }

    #[test]
    fn test_payment_key_hash() {
        assert_eq!(Address::enterprise(key(7)).payment_key_hash(), Some(KeyHash::new([7; 28])));
        assert_eq!(Address::enterprise(script(7)).payment_key_hash(), None);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_credential() -> impl Strategy<Value = Credential> {
            (any::<bool>(), any::<[u8; 28]>()).prop_map(|(is_script, bytes)| {
                if is_script {
                    Credential::Script(ScriptHash::new(bytes))
                } else {
                    Credential::VerificationKey(KeyHash::new(bytes))
                }
            })
        }

        fn arb_stake() -> impl Strategy<Value = Option<StakeCredential>> {
            prop_oneof![
                Just(None),
                arb_credential().prop_map(|c| Some(StakeCredential::Inline(c))),
                (any::<u64>(), any::<u64>(), any::<u64>()).prop_map(|(slot, tx_index, cert_index)| {
                    Some(StakeCredential::Pointer(Pointer { slot, tx_index, cert_index }))
                }),
            ]
        }

        proptest! {
            #[test]
            fn decode_inverts_encode(payment in arb_credential(), stake in arb_stake(), mainnet in any::<bool>()) {
                let network = if mainnet { Network::Mainnet } else { Network::Testnet };
                let address = Address::new(payment, stake);
                let encoded = encode(&address, network).unwrap();
                prop_assert_eq!(decode(&encoded).unwrap(), address);
            }
        }
    }
}
