//! Receiving key pair generation.
//!
//! Every wallet-backed transaction gets a fresh secp256k1 key pair and a
//! legacy P2PKH address in the requested network's format. The network is
//! an explicit argument on every call; there is no process-wide default.

use bitcoin::base58;
use bitcoin::hashes::{hash160, Hash};
use bitcoin::secp256k1::{rand, Secp256k1};
use paygate_types::Currency;
use std::fmt;

/// Address network for generated key pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyNetwork {
    Bitcoin,
    BitcoinTestnet,
    Dogecoin,
}

impl KeyNetwork {
    /// Network for a payment currency. `use_testnet` selects the Bitcoin
    /// test network; Dogecoin has a single supported network here.
    pub fn for_currency(currency: Currency, use_testnet: bool) -> Option<Self> {
        match currency {
            Currency::Bitcoin if use_testnet => Some(KeyNetwork::BitcoinTestnet),
            Currency::Bitcoin => Some(KeyNetwork::Bitcoin),
            Currency::Doge => Some(KeyNetwork::Dogecoin),
            _ => None,
        }
    }

    /// P2PKH address version byte.
    fn p2pkh_version(&self) -> u8 {
        match self {
            KeyNetwork::Bitcoin => 0x00,
            KeyNetwork::BitcoinTestnet => 0x6f,
            KeyNetwork::Dogecoin => 0x1e,
        }
    }

    /// WIF private key version byte.
    fn wif_version(&self) -> u8 {
        match self {
            KeyNetwork::Bitcoin => 0x80,
            KeyNetwork::BitcoinTestnet => 0xef,
            KeyNetwork::Dogecoin => 0x9e,
        }
    }
}

impl fmt::Display for KeyNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyNetwork::Bitcoin => write!(f, "bitcoin"),
            KeyNetwork::BitcoinTestnet => write!(f, "bitcoin-testnet"),
            KeyNetwork::Dogecoin => write!(f, "dogecoin"),
        }
    }
}

/// A freshly generated key pair: public address plus WIF-encoded private
/// key. The WIF is secret material and is redacted from `Debug` output.
#[derive(Clone)]
pub struct GeneratedKeypair {
    pub address: String,
    pub wif: String,
}

impl fmt::Debug for GeneratedKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratedKeypair")
            .field("address", &self.address)
            .field("wif", &"<redacted>")
            .finish()
    }
}

/// Generate a fresh key pair for the given network.
///
/// Address = Base58Check(version || HASH160(compressed pubkey)); private
/// key is exported as compressed WIF. Randomness comes from the OS rng,
/// so two calls never yield the same pair.
pub fn generate_keypair(network: KeyNetwork) -> GeneratedKeypair {
    let secp = Secp256k1::new();
    let (secret_key, public_key) = secp.generate_keypair(&mut rand::thread_rng());

    let pubkey_hash = hash160::Hash::hash(&public_key.serialize());

    let mut address_payload = Vec::with_capacity(21);
    address_payload.push(network.p2pkh_version());
    address_payload.extend_from_slice(pubkey_hash.as_byte_array());

    let mut wif_payload = Vec::with_capacity(34);
    wif_payload.push(network.wif_version());
    wif_payload.extend_from_slice(&secret_key.secret_bytes());
    // compressed pubkey marker
    wif_payload.push(0x01);

    GeneratedKeypair {
        address: base58::encode_check(&address_payload),
        wif: base58::encode_check(&wif_payload),
    }
}
