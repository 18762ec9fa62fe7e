//! Typed error taxonomy, one enum per sub-step, unified by [`StfError`].
//!
//! Every fallible operation returns one of these; the driver never produces
//! a partially-applied state (see `delta.rs`).

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("invalid encoding")]
    InvalidEncoding,
    #[error("encoded length exceeds declared maximum")]
    LengthExceedsMax,
    #[error("invalid existence marker byte")]
    InvalidExistenceMarker,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("header parent does not match recent history")]
    InvalidParentHash,
    #[error("header prior state root does not match pre-state")]
    InvalidPriorStateRoot,
    #[error("header extrinsic hash does not match serialized extrinsic")]
    InvalidExtrinsicHash,
    #[error("header slot is not greater than the parent slot")]
    SlotNotGreaterThanParent,
    #[error("header author index is out of range")]
    InvalidAuthorIndex,
    #[error("epoch marker presence does not match epoch transition")]
    InvalidEpochMarkerTiming,
    #[error("tickets marker presence does not match ticket-accumulator state")]
    InvalidTicketsMarkerTiming,
    #[error("ticket-mode seal signature failed to verify")]
    TicketSealVerificationFailed,
    #[error("fallback-mode seal signature failed to verify")]
    FallbackSealVerificationFailed,
    #[error("seal VRF output does not match the assigned ticket id")]
    InvalidTicketId,
    #[error("entropy-source VRF signature failed to verify")]
    EntropySourceVerificationFailed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SafroleError {
    #[error("block slot is not greater than the current slot")]
    BadSlot,
    #[error("ticket attempt is out of range")]
    BadTicketAttempt,
    #[error("too many tickets in extrinsic")]
    TooManyTicketsInExtrinsic,
    #[error("ticket submitted after the submission window closed")]
    UnexpectedTicket,
    #[error("ring-VRF proof failed to verify")]
    BadTicketProof,
    #[error("ticket id collides with one already accumulated")]
    DuplicateTicket,
    #[error("tickets are not strictly increasing by id")]
    BadTicketOrder,
    #[error("failed to build a ring commitment over the next epoch's Bandersnatch keys")]
    BadRingCommitment,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DisputesError {
    #[error("one or more dispute signatures failed to verify")]
    BadSignatures,
    #[error("report already belongs to a disjoint dispute set")]
    SetConflict,
    #[error("culprit targets a report outside the bad set")]
    UnknownCulpritTarget,
    #[error("fault targets a report outside the good set")]
    UnknownFaultTarget,
    #[error("verdict carries fewer than the required super-majority of votes")]
    InsufficientVotes,
    #[error("fault vote must dissent from the report's good-set classification")]
    FaultDoesNotDissent,
    #[error("culprit or fault key is not a member of the current or previous validator set")]
    UnknownValidatorKey,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportsError {
    #[error("core index out of range")]
    BadCoreIndex,
    #[error("guarantees are not strictly increasing by core index")]
    OutOfOrderGuarantee,
    #[error("work report exceeds the maximum serialized size")]
    WorkReportTooBig,
    #[error("declared accumulate-gas exceeds the per-core budget")]
    WorkReportGasTooHigh,
    #[error("too many dependencies declared")]
    TooManyDependencies,
    #[error("guarantee references a future slot")]
    FutureReportSlot,
    #[error("guarantee's epoch is older than the previous epoch")]
    ReportEpochBeforeLast,
    #[error("anchor is not within recent history")]
    AnchorNotRecent,
    #[error("anchor hash does not match recent history")]
    BadAnchor,
    #[error("anchor state root does not match recent history")]
    BadStateRoot,
    #[error("anchor BEEFY root does not match recent history")]
    BadBeefyMmrRoot,
    #[error("guarantor indices are not sorted and unique")]
    NotSortedOrUniqueGuarantors,
    #[error("too few guarantor signatures")]
    InsufficientGuarantees,
    #[error("too many guarantor signatures")]
    TooManyGuarantees,
    #[error("unknown service id")]
    BadServiceId,
    #[error("code hash does not match the service's registered code")]
    BadCodeHash,
    #[error("declared gas is below the service's minimum")]
    ServiceItemGasTooLow,
    #[error("core is already engaged and its prior report has not timed out")]
    CoreEngaged,
    #[error("authorizer hash is not in the core's authorization pool")]
    CoreUnauthorized,
    #[error("guarantor-to-core assignment does not match the rotation")]
    WrongAssignment,
    #[error("rotation period configuration is invalid")]
    InvalidRotationPeriod,
    #[error("a declared dependency is missing from recent history")]
    DependencyMissing,
    #[error("segment-root lookup is invalid")]
    SegmentRootLookupInvalid,
    #[error("validator index out of range")]
    BadValidatorIndex,
    #[error("signature failed to verify")]
    BadSignature,
    #[error("validator public key is malformed")]
    InvalidValidatorPublicKey,
    #[error("package hash duplicates a report in recent history or this batch")]
    DuplicatePackage,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AssurancesError {
    #[error("bitfield length does not equal ceil(C/8)")]
    InvalidBitfieldSize,
    #[error("validator indices are not sorted and unique")]
    NotSortedOrUniqueValidatorIndex,
    #[error("anchor hash does not match the parent header hash")]
    InvalidAnchorHash,
    #[error("validator index out of range")]
    InvalidValidatorIndex,
    #[error("validator public key is malformed")]
    InvalidPublicKey,
    #[error("signature failed to verify")]
    InvalidSignature,
    #[error("a set bit references a core with no pending report")]
    BitSetForEmptyCore,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AccumulationError {
    #[error("unknown service id in accumulation output")]
    UnknownService,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthorizationsError {
    #[error("core index out of range")]
    BadCoreIndex,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PreimagesError {
    #[error("unknown service id")]
    BadServiceId,
    #[error("service did not request this preimage")]
    PreimageUnneeded,
    #[error("preimage has already been provided")]
    PreimageAlreadyProvided,
}

/// Top-level error returned by [`crate::Stf::apply`]. The base state is
/// never touched when any variant is produced (see `delta.rs`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StfError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error(transparent)]
    Safrole(#[from] SafroleError),
    #[error(transparent)]
    Disputes(#[from] DisputesError),
    #[error(transparent)]
    Reports(#[from] ReportsError),
    #[error(transparent)]
    Assurances(#[from] AssurancesError),
    #[error(transparent)]
    Accumulation(#[from] AccumulationError),
    #[error(transparent)]
    Authorizations(#[from] AuthorizationsError),
    #[error(transparent)]
    Preimages(#[from] PreimagesError),
}
