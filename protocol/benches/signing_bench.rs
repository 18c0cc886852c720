// Encoding & signing benchmarks for the transaction core.
//
// Covers the hot paths a wallet hits per transaction: RLP encoding,
// secp256k1 signing with EIP-155, signed-payload decoding with signer
// recovery, and Hedera body signing.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use ethereum_types::{H160, U256};

use polyledger_protocol::crypto::keys::{EthereumSigningKey, HederaKeypair};
use polyledger_protocol::ethereum::{EthereumNetwork, EthereumTransaction, RlpPurpose};
use polyledger_protocol::hedera::{HederaAddress, HederaTimestamp, HederaTransaction};
use polyledger_protocol::units::{Ether, Gas, GasPrice};

fn transfer(data_len: usize) -> EthereumTransaction {
    EthereumTransaction::new(
        H160::repeat_byte(0x11),
        H160::repeat_byte(0x22),
        Ether::from_wei(U256::exp10(18)),
        GasPrice::gwei(20),
        Gas::new(21_000),
        vec![0xab; data_len],
        42,
    )
}

fn bench_rlp_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("ethereum/rlp_encode_unsigned");

    for size in [0usize, 68, 1024] {
        let tx = transfer(size);
        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &tx, |b, tx| {
            b.iter(|| tx.encode(&EthereumNetwork::MAINNET, RlpPurpose::Unsigned).unwrap());
        });
    }

    group.finish();
}

fn bench_ethereum_sign(c: &mut Criterion) {
    let key = EthereumSigningKey::generate();

    c.bench_function("ethereum/sign_with_key", |b| {
        b.iter(|| {
            let mut tx = transfer(0);
            tx.sign_with_key(&EthereumNetwork::MAINNET, &key).unwrap();
        });
    });
}

fn bench_ethereum_decode_signed(c: &mut Criterion) {
    let key = EthereumSigningKey::generate();
    let mut tx = transfer(68);
    tx.sign_with_key(&EthereumNetwork::MAINNET, &key).unwrap();
    let bytes = tx.encode(&EthereumNetwork::MAINNET, RlpPurpose::Signed).unwrap();

    c.bench_function("ethereum/decode_signed_and_recover", |b| {
        b.iter(|| {
            EthereumTransaction::decode(&bytes, &EthereumNetwork::MAINNET, RlpPurpose::Signed)
                .unwrap()
        });
    });
}

fn bench_hedera_sign(c: &mut Criterion) {
    let key = HederaKeypair::generate();
    let public_key = key.public_key();

    c.bench_function("hedera/sign_and_serialize", |b| {
        b.iter(|| {
            let mut tx = HederaTransaction::create_new(
                HederaAddress::new(0, 0, 55),
                HederaAddress::new(0, 0, 78),
                400,
            );
            tx.sign(
                &public_key,
                HederaAddress::new(0, 0, 3),
                HederaTimestamp::new(1_700_000_000, 0).unwrap(),
                100_000,
                &key,
            )
            .unwrap();
            tx.serialize().unwrap()
        });
    });
}

criterion_group!(
    benches,
    bench_rlp_encode,
    bench_ethereum_sign,
    bench_ethereum_decode_signed,
    bench_hedera_sign,
);
criterion_main!(benches);
