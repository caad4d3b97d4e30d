//! Proptest generators for property-based testing.

use proptest::prelude::*;

use namewrap_core::{DnsName, Label, Principal};
use namewrap_perms::Fuses;

/// Any combination of known fuses, valid or not.
pub fn fuses() -> impl Strategy<Value = Fuses> {
    any::<u32>().prop_map(Fuses::from_bits_truncate)
}

/// Fuse sets that satisfy the validity rule.
pub fn valid_fuses() -> impl Strategy<Value = Fuses> {
    fuses().prop_map(|f| {
        if f.restricting().is_empty() {
            f
        } else {
            f | Fuses::CANNOT_UNWRAP
        }
    })
}

/// Fuses an owner may burn on their own record.
pub fn owner_fuses() -> impl Strategy<Value = Fuses> {
    valid_fuses().prop_map(|f| f - Fuses::PARENT_CANNOT_CONTROL)
}

/// A non-zero principal.
pub fn principal() -> impl Strategy<Value = Principal> {
    any::<[u8; 32]>()
        .prop_filter("principal must be non-zero", |b| b.iter().any(|&x| x != 0))
        .prop_map(Principal::from_bytes)
}

/// A text label.
pub fn label() -> impl Strategy<Value = Label> {
    "[a-z0-9][a-z0-9-]{0,31}".prop_map(|s| Label::parse(&s).expect("pattern yields valid labels"))
}

/// A name of one to four labels.
pub fn dns_name() -> impl Strategy<Value = DnsName> {
    prop::collection::vec(label(), 1..=4).prop_map(DnsName::from_labels)
}

/// One record-writing step against a wrapped leaf and its child.
#[derive(Debug, Clone)]
pub enum FuseOp {
    /// Owner burns fuses on the child.
    SetFuses(Fuses),
    /// Parent burns fuses on the child and requests an expiry.
    SetChildFuses { fuses: Fuses, expiry_offset: u64 },
    /// Parent re-issues the child through subnode creation.
    ReplaceChild { fuses: Fuses, expiry_offset: u64 },
    /// A controller renews the parent leaf's registration.
    Renew(u64),
    /// The registrar notification for the parent leaf arrives again.
    ReplayInbound(Fuses),
    /// Time moves forward.
    Advance(u64),
}

pub fn fuse_op() -> impl Strategy<Value = FuseOp> {
    let year = crate::fixtures::YEAR;
    prop_oneof![
        owner_fuses().prop_map(FuseOp::SetFuses),
        (valid_fuses(), 0u64..=2 * year).prop_map(|(fuses, expiry_offset)| {
            FuseOp::SetChildFuses {
                fuses,
                expiry_offset,
            }
        }),
        (fuses(), 0u64..=2 * year).prop_map(|(fuses, expiry_offset)| FuseOp::ReplaceChild {
            fuses,
            expiry_offset,
        }),
        (0u64..=year).prop_map(FuseOp::Renew),
        fuses().prop_map(FuseOp::ReplayInbound),
        (0u64..=year).prop_map(FuseOp::Advance),
    ]
}

/// Parameters for a sequence of fuse operations.
#[derive(Debug, Clone)]
pub struct FuseScenario {
    pub parent_fuses: Fuses,
    pub child_fuses: Fuses,
    pub ops: Vec<FuseOp>,
}

impl Arbitrary for FuseScenario {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            owner_fuses(),
            valid_fuses(),
            prop::collection::vec(fuse_op(), 1..12),
        )
            .prop_map(|(parent_fuses, child_fuses, ops)| FuseScenario {
                parent_fuses,
                child_fuses,
                ops,
            })
            .boxed()
    }
}
