//! Test utilities for the solo machine light client

#[cfg(any(test, feature = "test-utils"))]
pub use fixtures::*;

#[allow(
    missing_docs,
    clippy::borrow_interior_mutable_const,
    clippy::declare_interior_mutable_const,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
#[cfg(any(test, feature = "test-utils"))]
mod fixtures {
    use std::cell::LazyCell;

    use ed25519_dalek::Signer as _;
    use interchain_commitment::MerklePath;
    use interchain_host::{codec, Height};

    use crate::{
        client_state::ClientState,
        consensus_state::ConsensusState,
        crypto::{MultiSignature, PublicKey},
        header::Header,
        misbehaviour::{Misbehaviour, SignatureAndData},
        proof::{DataType, SignBytes, TimestampedSignatureData},
    };

    /// Initial timestamp of every test machine.
    pub const INITIAL_TIMESTAMP: u64 = 10;

    #[derive(Clone, Debug)]
    pub enum TestKey {
        Secp256k1(k256::ecdsa::SigningKey),
        Ed25519(ed25519_dalek::SigningKey),
    }

    impl TestKey {
        pub fn public_key(&self) -> PublicKey {
            match self {
                Self::Secp256k1(key) => PublicKey::Secp256k1(
                    key.verifying_key().to_encoded_point(true).as_bytes().to_vec(),
                ),
                Self::Ed25519(key) => PublicKey::Ed25519(key.verifying_key().to_bytes()),
            }
        }

        pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
            match self {
                Self::Secp256k1(key) => {
                    let signature: k256::ecdsa::Signature = key.sign(msg);
                    signature.to_bytes().to_vec()
                }
                Self::Ed25519(key) => key.sign(msg).to_bytes().to_vec(),
            }
        }
    }

    pub const SECP256K1_KEYS: LazyCell<Vec<TestKey>> = LazyCell::new(|| {
        [0xcd, 0x02, 0x03, 0x10, 0x1F]
            .into_iter()
            .map(|b| {
                TestKey::Secp256k1(
                    k256::ecdsa::SigningKey::from_bytes(&[b; 32].into()).expect("valid key"),
                )
            })
            .collect()
    });

    pub const ED25519_KEY: LazyCell<TestKey> =
        LazyCell::new(|| TestKey::Ed25519(ed25519_dalek::SigningKey::from_bytes(&[0x42; 32])));

    /// Signer side of a solo machine. Every signature it hands out consumes a
    /// sequence, mirroring the client's bookkeeping.
    #[derive(Clone, Debug)]
    pub struct TestSoloMachine {
        pub keys: Vec<TestKey>,
        /// `Some` for a multisig
        pub threshold: Option<u32>,
        pub diversifier: String,
        pub sequence: u64,
        pub timestamp: u64,
    }

    impl TestSoloMachine {
        pub fn new(diversifier: &str) -> Self {
            Self::with_keys(diversifier, vec![SECP256K1_KEYS[0].clone()], None)
        }

        pub fn new_ed25519(diversifier: &str) -> Self {
            Self::with_keys(diversifier, vec![ED25519_KEY.clone()], None)
        }

        pub fn new_multisig(diversifier: &str, members: usize, threshold: u32) -> Self {
            let keys = SECP256K1_KEYS.iter().take(members).cloned().collect();
            Self::with_keys(diversifier, keys, Some(threshold))
        }

        fn with_keys(diversifier: &str, keys: Vec<TestKey>, threshold: Option<u32>) -> Self {
            Self {
                keys,
                threshold,
                diversifier: diversifier.to_string(),
                sequence: 1,
                timestamp: INITIAL_TIMESTAMP,
            }
        }

        pub fn public_key(&self) -> PublicKey {
            match self.threshold {
                Some(threshold) => PublicKey::Multisig {
                    threshold,
                    public_keys: self.keys.iter().map(TestKey::public_key).collect(),
                },
                None => self.keys[0].public_key(),
            }
        }

        pub fn consensus_state(&self) -> ConsensusState {
            ConsensusState {
                public_key: self.public_key(),
                diversifier: self.diversifier.clone(),
                timestamp: self.timestamp,
            }
        }

        pub fn client_state(&self) -> ClientState {
            ClientState::new(self.sequence, self.consensus_state())
        }

        /// Signs with the single key, or with the first `threshold` members.
        pub fn sign(&self, msg: &[u8]) -> Vec<u8> {
            let Some(threshold) = self.threshold else {
                return self.keys[0].sign(msg);
            };
            let threshold = threshold as usize;
            let signers = (0..self.keys.len()).map(|i| i < threshold).collect();
            let signatures = self
                .keys
                .iter()
                .take(threshold)
                .map(|k| k.sign(msg))
                .collect();
            codec::encode(&MultiSignature {
                signers,
                signatures,
            })
            .expect("encodable")
        }

        /// Header rotating to `new_key`; the machine switches over.
        pub fn create_header(&mut self, new_key: TestKey, new_diversifier: &str) -> Header {
            let mut header = Header {
                sequence: self.sequence,
                timestamp: self.timestamp,
                signature: Vec::new(),
                new_public_key: new_key.public_key(),
                new_diversifier: new_diversifier.to_string(),
            };
            header.signature = self.sign(&header.sign_bytes(&self.diversifier).expect("encodable"));

            self.keys = vec![new_key];
            self.threshold = None;
            self.diversifier = new_diversifier.to_string();
            self.sequence += 1;
            header
        }

        /// Proof that `value` is stored at `path`.
        pub fn prove(&mut self, path: &MerklePath, value: &[u8]) -> (Height, Vec<u8>) {
            self.sign_proof(path, DataType::for_path(&path.path), value.to_vec())
        }

        /// Proof that nothing is stored at `path`.
        pub fn prove_absence(&mut self, path: &MerklePath) -> (Height, Vec<u8>) {
            self.sign_proof(path, DataType::absence_for_path(&path.path), Vec::new())
        }

        fn sign_proof(
            &mut self,
            path: &MerklePath,
            data_type: DataType,
            data: Vec<u8>,
        ) -> (Height, Vec<u8>) {
            let sign_bytes = SignBytes {
                sequence: self.sequence,
                timestamp: self.timestamp,
                diversifier: self.diversifier.clone(),
                data_type,
                path: path.to_bytes(),
                data,
            }
            .to_bytes()
            .expect("encodable");
            let proof = TimestampedSignatureData {
                signature_data: self.sign(&sign_bytes),
                timestamp: self.timestamp,
            }
            .to_proof()
            .expect("encodable");

            let height = Height::new(0, self.sequence);
            self.sequence += 1;
            (height, proof)
        }

        /// Two signatures over different data at the current sequence.
        pub fn create_misbehaviour(&self, data_one: &[u8], data_two: &[u8]) -> Misbehaviour {
            let sign = |data: &[u8]| {
                let mut signed = SignatureAndData {
                    signature: Vec::new(),
                    path: b"ibc/channelEnds/ports/transfer/channels/channel-0".to_vec(),
                    data: data.to_vec(),
                    data_type: DataType::Channel,
                    timestamp: self.timestamp,
                };
                signed.signature = self.sign(
                    &signed
                        .sign_bytes(self.sequence, &self.diversifier)
                        .expect("encodable"),
                );
                signed
            };
            Misbehaviour {
                sequence: self.sequence,
                signature_one: sign(data_one),
                signature_two: sign(data_two),
            }
        }
    }
}
