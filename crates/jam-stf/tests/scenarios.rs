//! End-to-end scenario tests against the sub-step entry points named by
//! `jam_stf`'s public API. Scenarios whose success path depends on a
//! genuine ring-VRF proof (ticket submission, a sealed block) are
//! exercised at the point where their *deterministic* logic lives —
//! ordering, windowing, and rejection — since fabricating a valid
//! Bandersnatch ring proof is a job for a real prover, not a test
//! fixture.

use ed25519_dalek::SigningKey;
use jam_stf::block::{DisputesExtrinsic, Verdict, VoteSignature};
use jam_stf::config::Config;
use jam_stf::disputes;
use jam_stf::delta::StateTransition;
use jam_stf::error::{PreimagesError, SafroleError};
use jam_stf::merkle::blake2b_256;
use jam_stf::preimages;
use jam_stf::reports;
use jam_stf::safrole;
use jam_stf::state::report::{Assurance, Guarantee, GuarantorSignature, PendingReport, WorkReport};
use jam_stf::state::service::ServiceAccount;
use jam_stf::state::State;
use jam_stf::assurances;
use jam_stf::types::{Hash, ValidatorKeys};

const AVAILABLE_CONTEXT: &[u8] = b"jam_available";

fn signing_key(seed: u8) -> SigningKey {
    SigningKey::from_bytes(&[seed; 32])
}

fn validator_set(count: u16) -> Vec<ValidatorKeys> {
    (0..count)
        .map(|i| ValidatorKeys {
            ed25519: signing_key(i as u8 + 1).verifying_key().to_bytes(),
            ..ValidatorKeys::default()
        })
        .collect()
}

fn empty_report(core: u16, anchor: Hash) -> WorkReport {
    WorkReport {
        package_hash: [1u8; 32],
        core_index: core,
        authorizer_hash: [0u8; 32],
        auth_output: vec![],
        anchor,
        anchor_state_root: jam_stf::types::ZERO_HASH,
        anchor_beefy_root: jam_stf::merkle::super_peak(&jam_stf::merkle::Mmr::new()),
        slot: 1,
        prerequisites: vec![],
        segment_root_lookup: vec![],
        results: vec![],
    }
}

/// Scenario 1 (empty block): the entropy-advance and τ-advance half of the
/// driver's behavior, independent of the seal signature's validity (which
/// is exercised separately in `stf::tests`).
#[test]
fn empty_block_advances_time_and_entropy() {
    let cfg = Config::tiny();
    let base = State::genesis(&cfg, validator_set(cfg.validator_count));
    let mut delta = StateTransition::new(&base);

    safrole::process(&mut delta, &cfg, 1, [0xAB; 32], &[]).unwrap();
    *delta.ensure_tau() = 1;

    assert_eq!(*delta.get_tau(), 1);
    assert_ne!(delta.get_eta()[0], base.eta[0]);
}

/// Scenario 2 (ticket submission within an epoch): the outside-in ordering
/// and length bookkeeping a successful submission relies on, already
/// proven against literal inputs rather than a synthesized ring proof.
#[test]
fn ticket_ordering_matches_outside_in_rule() {
    use jam_stf::safrole::outside_in_order;
    let ids = vec![1u8, 2, 3, 4, 5];
    assert_eq!(outside_in_order(&ids), vec![1, 3, 5, 4, 2]);
}

/// Scenario 3 (unexpected ticket): a ticket arriving at or after the
/// submission-end offset is rejected before any ring-VRF verification is
/// attempted.
#[test]
fn unexpected_ticket_after_submission_window_is_rejected() {
    let cfg = Config::tiny();
    let base = State::genesis(&cfg, validator_set(cfg.validator_count));
    let mut delta = StateTransition::new(&base);
    *delta.ensure_tau() = 3;

    let ticket = jam_stf::types::TicketEnvelope {
        attempt: 0,
        signature: [0u8; 784],
    };
    let slot = cfg.ticket_submission_end + 1;
    let err = safrole::process(&mut delta, &cfg, slot, [0u8; 32], &[ticket]).unwrap_err();
    assert_eq!(err, SafroleError::UnexpectedTicket);
    assert_eq!(base.gamma_a.len(), 0);
}

/// Scenario 4 (guarantee lifecycle): a work-report for a solely-occupied
/// core, signed by a real supermajority of guarantors, is admitted onto ρ
/// and its package hash reported.
#[test]
fn guarantee_with_supermajority_signatures_is_admitted() {
    let mut cfg = Config::tiny();
    cfg.core_count = 1;
    cfg.validator_count = 6;

    let mut base = State::genesis(&cfg, validator_set(cfg.validator_count));
    base.authorizations.pool[0] = vec![[42u8; 32]];
    base.delta.insert(
        7,
        ServiceAccount {
            code_hash: [9u8; 32],
            balance: 1_000,
            min_gas_accumulate: 100,
            min_gas_on_transfer: 0,
            storage_root: Hash::default(),
            solicited_preimages: Default::default(),
            available_preimages: Default::default(),
            item_count: 0,
            byte_count: 0,
        },
    );
    base.beta.append(cfg.recent_history_depth, [5u8; 32], 0, jam_stf::types::ZERO_HASH, vec![], [0u8; 32]);
    let anchor_beefy_root = base.beta.blocks[0].beefy_root;

    let mut report = empty_report(0, [5u8; 32]);
    report.authorizer_hash = [42u8; 32];
    report.anchor_beefy_root = anchor_beefy_root;
    report.results = vec![jam_stf::state::report::WorkResult {
        service_id: 7,
        code_hash: [9u8; 32],
        payload_hash: Hash::default(),
        accumulate_gas: 200,
        output: jam_stf::state::report::WorkOutput::Success {
            gas_used: 200,
            output_hash: Hash::default(),
        },
    }];

    let digest = blake2b_256(&jam_stf::codec::serialize(&report));
    let mut message = Vec::with_capacity(AVAILABLE_CONTEXT.len() + 32);
    message.extend_from_slice(AVAILABLE_CONTEXT);
    message.extend_from_slice(&digest);

    let signatures: Vec<GuarantorSignature> = (0u16..5)
        .map(|idx| {
            let key = signing_key(idx as u8 + 1);
            let sig = key.sign(&message);
            GuarantorSignature {
                validator_index: idx,
                signature: sig.to_bytes(),
            }
        })
        .collect();

    let guarantee = Guarantee { report, signatures };
    let mut delta = StateTransition::new(&base);
    let reported = reports::process(&mut delta, &cfg, 1, &[guarantee]).unwrap();

    assert_eq!(reported, vec![[1u8; 32]]);
    assert!(delta.get_rho()[0].is_some());
    assert_eq!(delta.get_rho()[0].as_ref().unwrap().timeout, 1);
}

/// Scenario 5 (assurance supermajority): once enough validators assure a
/// core's availability, ρ is cleared and the report flows out as newly
/// available.
#[test]
fn assurance_supermajority_clears_core_and_surfaces_report() {
    let mut cfg = Config::tiny();
    cfg.core_count = 1;
    cfg.validator_count = 6;

    let mut base = State::genesis(&cfg, validator_set(cfg.validator_count));
    let parent_hash = [3u8; 32];
    base.rho[0] = Some(PendingReport {
        report: empty_report(0, parent_hash),
        timeout: 5,
    });

    let bitfield = vec![0b00000001u8];
    let digest = blake2b_256(&[parent_hash.as_slice(), &bitfield].concat());
    let mut message = Vec::with_capacity(AVAILABLE_CONTEXT.len() + 32);
    message.extend_from_slice(AVAILABLE_CONTEXT);
    message.extend_from_slice(&digest);

    let threshold = cfg.supermajority();
    let assurances: Vec<Assurance> = (0..threshold as u16)
        .map(|idx| {
            let key = signing_key(idx as u8 + 1);
            let sig = key.sign(&message);
            Assurance {
                validator_index: idx,
                anchor: parent_hash,
                bitfield: bitfield.clone(),
                signature: sig.to_bytes(),
            }
        })
        .collect();

    let mut delta = StateTransition::new(&base);
    let available = assurances::process(&mut delta, &cfg, 6, parent_hash, &assurances).unwrap();

    assert_eq!(available.len(), 1);
    assert_eq!(available[0].package_hash, [1u8; 32]);
    assert!(delta.get_rho()[0].is_none());
}

/// Scenario 6 (dispute invalidates core): a unanimous-invalid verdict
/// moves the report's hash into ψ.bad and clears its occupied core.
#[test]
fn unanimous_invalid_verdict_clears_the_occupied_core() {
    let cfg = Config::tiny();
    let mut base = State::genesis(&cfg, validator_set(cfg.validator_count));
    let report_hash = [9u8; 32];
    base.rho[1] = Some(PendingReport {
        report: empty_report(1, [0u8; 32]),
        timeout: 1,
    });
    base.rho[1].as_mut().unwrap().report.package_hash = report_hash;

    let mut message = Vec::with_capacity(b"jam_invalid".len() + 32);
    message.extend_from_slice(b"jam_invalid");
    message.extend_from_slice(&report_hash);
    let votes: Vec<VoteSignature> = (0u16..cfg.supermajority() as u16)
        .map(|idx| {
            let key = signing_key(idx as u8 + 1);
            let sig = key.sign(&message);
            VoteSignature {
                validator_index: idx,
                vote: false,
                signature: sig.to_bytes(),
            }
        })
        .collect();

    let extrinsic = DisputesExtrinsic {
        verdicts: vec![Verdict {
            target: report_hash,
            age: 0,
            votes,
        }],
        culprits: vec![],
        faults: vec![],
    };

    let mut delta = StateTransition::new(&base);
    disputes::process(&mut delta, &cfg, &extrinsic).unwrap();

    assert!(delta.get_psi().bad.contains(&report_hash));
    assert!(delta.get_rho()[1].is_none());
}

/// A preimage a service solicited becomes available and is stamped with
/// the importing slot — exercised here as an extrinsic-level scenario
/// alongside the six named ones, since §4.14 adds it to the same block
/// pipeline.
#[test]
fn solicited_preimage_becomes_available_in_block_context() {
    let cfg = Config::tiny();
    let mut base = State::genesis(&cfg, validator_set(cfg.validator_count));
    let data = b"jam preimage".to_vec();
    let hash = blake2b_256(&data);
    base.delta.insert(
        3,
        ServiceAccount {
            code_hash: Hash::default(),
            balance: 500,
            min_gas_accumulate: 0,
            min_gas_on_transfer: 0,
            storage_root: Hash::default(),
            solicited_preimages: [hash].into_iter().collect(),
            available_preimages: Default::default(),
            item_count: 0,
            byte_count: 0,
        },
    );

    let mut delta = StateTransition::new(&base);
    preimages::process(&mut delta, 10, &[jam_stf::block::PreimageEntry { service_id: 3, data }]).unwrap();

    let account = delta.get_delta().get(&3).unwrap();
    assert_eq!(account.available_preimages.get(&hash), Some(&10));

    let err = preimages::process(&mut delta, 11, &[jam_stf::block::PreimageEntry { service_id: 3, data: b"never solicited".to_vec() }])
        .unwrap_err();
    assert_eq!(err, PreimagesError::PreimageUnneeded);
}
