//! End-to-end scenarios for the transaction core.
//!
//! Each test drives the public API the way a wallet would: derive keys,
//! build a transfer, sign it, put it on the wire, read it back, and fold in
//! what the network reported. Reference bytes come from independently
//! produced vectors, so a pass here means the wire formats are bit-exact.

use std::cmp::Ordering;
use std::collections::HashSet;

use ethereum_types::{H160, H256, U256};

use polyledger_protocol::config::{
    DEFAULT_TRANSFER_GAS_LIMIT, GAS_LIMIT_MARGIN_PERCENT, HEDERA_DEFAULT_FEE_BOUND, TINYBAR_PER_HBAR,
};
use polyledger_protocol::crypto::keys::EthereumSigningKey;
use polyledger_protocol::crypto::hash::sha384;
use polyledger_protocol::ethereum::{
    EthereumAccount, EthereumNetwork, EthereumTransaction, Inclusion, RlpPurpose, StatusError,
};
use polyledger_protocol::hedera::{
    HederaAccount, HederaAddress, HederaError, HederaTimestamp, HederaTransaction, HederaWallet,
};
use polyledger_protocol::units::{Ether, EtherUnit, Gas, GasPrice};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const PAPER_KEY_24: &str = "inmate flip alley wear offer often piece magnet surge toddler submit \
                            right radio absent pear floor belt raven price stove replace reduce \
                            plate home";

const REFERENCE_ENVELOPE: &str = concat!(
    "1a660a640a20b63b3815f453cf697b53b290b1d78e88c725d39bde52c34c79fb5b4c9389",
    "46731a401a27eaa0d2f04302ea1722cf111b5f91429c0cba10eca1f7417154779c37c2e4",
    "87b07a36706a75cbafaf048326a8c199b7832d6668c88585934dcf639ff6bd0d",
    "222e0a0a0a0408191004120218371202180218a08d062202087872140a120a070a021837",
    "109f060a070a02184e10a006",
);

/// Routes library logs to the test harness when `RUST_LOG` is set.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn ether_transfer(nonce: u64, gas_price: GasPrice) -> EthereumTransaction {
    EthereumTransaction::new(
        H160::repeat_byte(0xaa),
        H160::repeat_byte(0xbb),
        Ether::create(1, EtherUnit::Ether).unwrap(),
        gas_price,
        Gas::new(DEFAULT_TRANSFER_GAS_LIMIT),
        Vec::new(),
        nonce,
    )
}

fn sign_reference_hedera(account: &HederaAccount) -> HederaTransaction {
    let mut tx = HederaTransaction::create_new(
        HederaAddress::new(0, 0, 55),
        HederaAddress::new(0, 0, 78),
        400,
    );
    account
        .sign_transaction(
            &mut tx,
            HederaAddress::new(0, 0, 2),
            HederaTimestamp::new(25, 4).unwrap(),
            HEDERA_DEFAULT_FEE_BOUND,
        )
        .unwrap();
    tx
}

// ---------------------------------------------------------------------------
// Hedera
// ---------------------------------------------------------------------------

#[test]
fn hedera_reference_transfer_serializes_byte_for_byte() {
    init_tracing();
    let account = HederaAccount::create_with_phrase(PAPER_KEY_24).unwrap();
    assert_eq!(
        account.public_key().to_hex(),
        "b63b3815f453cf697b53b290b1d78e88c725d39bde52c34c79fb5b4c93894673"
    );

    let tx = sign_reference_hedera(&account);
    assert_eq!(hex::encode(tx.serialize().unwrap()), REFERENCE_ENVELOPE);
    assert_eq!(tx.transaction_id().unwrap().to_string(), "0.0.55-25-4");
}

#[test]
fn hedera_identity_is_stable_across_signings() {
    let account = HederaAccount::create_with_phrase(PAPER_KEY_24).unwrap();
    let first = sign_reference_hedera(&account);
    let second = sign_reference_hedera(&account);

    assert_eq!(first.serialize().unwrap(), second.serialize().unwrap());
    assert_eq!(first.transaction_id(), second.transaction_id());
    assert_eq!(first.hash(), second.hash());
}

#[test]
fn hedera_reconstruction_returns_inputs_verbatim() {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&sha384(PAPER_KEY_24.as_bytes())[..32]);

    let tx = HederaTransaction::create(
        HederaAddress::new(0, 0, 55),
        HederaAddress::new(0, 0, 78),
        400,
        "0.0.14623-1568420904-460838529",
        hash.to_vec(),
    )
    .unwrap();

    assert_eq!(
        tx.transaction_id_string().as_deref(),
        Some("0.0.14623-1568420904-460838529")
    );
    assert_eq!(tx.hash(), Some(&hash[..]));
    assert_eq!(tx.source(), HederaAddress::new(0, 0, 55));
    assert_eq!(tx.target(), HederaAddress::new(0, 0, 78));
    assert_eq!(tx.amount(), 400);
}

#[test]
fn hedera_wire_roundtrip_preserves_balance() {
    let account = HederaAccount::create_with_phrase(PAPER_KEY_24).unwrap();
    let bytes = hex::decode(REFERENCE_ENVELOPE).unwrap();

    let tx = HederaTransaction::deserialize(&bytes).unwrap();
    assert_eq!(tx.public_key(), Some(account.public_key()));
    assert_eq!(tx.amount(), 400);
    assert!(tx.verify());
    assert_eq!(tx.serialize().unwrap(), bytes);
}

#[test]
fn hedera_truncated_envelope_is_malformed() {
    let bytes = hex::decode(REFERENCE_ENVELOPE).unwrap();
    assert!(matches!(
        HederaTransaction::deserialize(&bytes[..bytes.len() - 1]),
        Err(HederaError::Malformed(_))
    ));
}

#[test]
fn hedera_address_equality() {
    let a = HederaAddress::new(0, 0, 1_000_000);
    let b: HederaAddress = "0.0.1000000".parse().unwrap();
    let c = HederaAddress::new(0, 0, 1_000_001);
    assert_eq!(a, b);
    assert_ne!(a, c);

    let copy = a;
    assert_eq!(copy, a);
}

#[test]
fn hedera_wallet_uses_account_address() {
    let mut account = HederaAccount::create_with_phrase(PAPER_KEY_24).unwrap();
    let address: HederaAddress = "0.0.114008".parse().unwrap();
    account.set_address(address);

    let mut wallet = HederaWallet::new(&account);
    assert_eq!(wallet.source_address(), Some(address));
    assert_eq!(wallet.target_address(), Some(address));

    wallet.set_balance(10 * TINYBAR_PER_HBAR);
    assert_eq!(wallet.balance(), 1_000_000_000);
}

// ---------------------------------------------------------------------------
// Ethereum
// ---------------------------------------------------------------------------

#[test]
fn ethereum_fee_switches_from_estimate_to_gas_used() {
    init_tracing();
    let price = GasPrice::gwei(20);
    let mut tx = ether_transfer(0, price);

    // Unconfirmed: estimate, which defaults to the limit.
    assert_eq!(tx.fee().unwrap(), price.fee_for(Gas::new(21_000)).unwrap());
    tx.submit().unwrap();
    assert_eq!(tx.fee().unwrap(), price.fee_for(tx.gas_estimate()).unwrap());

    tx.include(Inclusion {
        block_hash: H256::repeat_byte(0x0c),
        block_number: 8_000_000,
        transaction_index: 12,
        block_timestamp: 1_561_000_000,
        gas_used: Gas::new(19_000),
    })
    .unwrap();
    assert_eq!(
        tx.fee().unwrap().as_wei(),
        U256::from(19_000u64) * U256::from(20_000_000_000u64)
    );
}

#[test]
fn ethereum_gas_limit_margin() {
    assert_eq!(GAS_LIMIT_MARGIN_PERCENT, 20);
    assert_eq!(Gas::new(10_000).with_limit_margin(), Gas::new(12_000));

    let mut tx = ether_transfer(0, GasPrice::gwei(1));
    tx.apply_gas_estimate(Gas::new(10_000));
    assert_eq!(tx.gas_limit(), Gas::new(12_000));
}

#[test]
fn ethereum_compare_orders_by_nonce() {
    let three = ether_transfer(3, GasPrice::gwei(1));
    let five = ether_transfer(5, GasPrice::gwei(1));
    assert_eq!(three.compare(&five), Ordering::Less);
    assert_eq!(five.compare(&three), Ordering::Greater);
}

#[test]
fn ethereum_signed_roundtrip_through_account() {
    let mut account = EthereumAccount::new(EthereumSigningKey::from_bytes(&[0x46; 32]).unwrap())
        .with_next_nonce(9);

    for network in [
        EthereumNetwork::MAINNET,
        EthereumNetwork::ROPSTEN,
        EthereumNetwork::RINKEBY,
    ] {
        let mut tx = account.create_transaction(
            H160::repeat_byte(0x35),
            Ether::create(1, EtherUnit::Ether).unwrap(),
            GasPrice::gwei(20),
            Gas::new(21_000),
            Vec::new(),
        );
        account.sign_transaction(&mut tx, &network).unwrap();

        let wire = tx.to_hex_string(&network, RlpPurpose::Signed, "0x").unwrap();
        let bytes = hex::decode(wire.trim_start_matches("0x")).unwrap();
        let decoded = EthereumTransaction::decode(&bytes, &network, RlpPurpose::Signed).unwrap();

        assert_eq!(decoded, tx);
        assert_eq!(decoded.source(), account.address());
        assert_eq!(decoded.nonce(), tx.nonce());
        assert_eq!(decoded.extract_signer_address(&network), account.address());
    }
    assert_eq!(account.next_nonce(), 12);
}

#[test]
fn ethereum_eip155_reference_vector() {
    let mut account = EthereumAccount::new(EthereumSigningKey::from_bytes(&[0x46; 32]).unwrap())
        .with_next_nonce(9);
    let mut tx = account.create_transaction(
        H160::repeat_byte(0x35),
        Ether::create(1, EtherUnit::Ether).unwrap(),
        GasPrice::gwei(20),
        Gas::new(21_000),
        Vec::new(),
    );
    account
        .sign_transaction(&mut tx, &EthereumNetwork::MAINNET)
        .unwrap();

    assert_eq!(
        tx.to_hex_string(&EthereumNetwork::MAINNET, RlpPurpose::Signed, "0x")
            .unwrap(),
        concat!(
            "0xf86c098504a817c800825208943535353535353535353535353535353535353535",
            "880de0b6b3a76400008025a028ef61340bd939bc2195fe537567866003e1a15d",
            "3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9",
            "f3dc64214b297fb1966a3b6d83",
        )
    );
}

#[test]
fn ethereum_transactions_in_a_set() {
    let mut account = EthereumAccount::generate();
    let mut set = HashSet::new();
    for _ in 0..3 {
        let mut tx = account.create_transaction(
            H160::repeat_byte(0x01),
            Ether::from_wei(U256::one()),
            GasPrice::gwei(1),
            Gas::new(21_000),
            Vec::new(),
        );
        account
            .sign_transaction(&mut tx, &EthereumNetwork::MAINNET)
            .unwrap();
        assert!(set.insert(tx.clone()));
        assert!(!set.insert(tx));
    }
    assert_eq!(set.len(), 3);
}

#[test]
fn ethereum_terminal_status_requires_reopen() {
    let mut tx = ether_transfer(0, GasPrice::gwei(1));
    tx.submit().unwrap();
    tx.error(-32000, "nonce too low").unwrap();
    assert!(tx.is_errored());

    assert!(matches!(tx.submit(), Err(StatusError::Terminal { .. })));
    tx.reopen().unwrap();
    assert!(tx.is_submitted());
}
