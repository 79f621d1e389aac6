//! Explicit implementation registration tables.
//!
//! Each operator family lists its candidate implementations as plain
//! (name, factory) entries, populated at process start. Negotiation walks the
//! table in order, skipping candidates that answer `Unimplemented`; hard
//! errors stop the walk.

use crate::attr::PrimitiveAttr;
use crate::batch_norm::{BatchNormDesc, NcspBatchNormBwdPd, NcspBatchNormFwdPd};
use crate::engine::Engine;
use crate::inner_product::{InnerProductDesc, InnerProductPd};
use crate::status::{PlanError, PlanResult};

/// One registered implementation.
pub struct ImplEntry<F: 'static> {
    pub name: &'static str,
    pub create: F,
}

/// Walk a registration table, calling each factory until one accepts.
pub fn first_available<T, F>(
    entries: &[ImplEntry<F>],
    mut call: impl FnMut(&F) -> PlanResult<T>,
) -> PlanResult<T> {
    for entry in entries {
        match call(&entry.create) {
            Ok(pd) => {
                log::debug!("selected implementation {}", entry.name);
                return Ok(pd);
            }
            Err(err) if err.is_unimplemented() => {
                log::debug!("{} declined: {}", entry.name, err);
            }
            Err(err) => return Err(err),
        }
    }
    Err(PlanError::Unimplemented("no candidate implementation accepted"))
}

pub type BnormFwdFactory = fn(&Engine, &BatchNormDesc, &PrimitiveAttr) -> PlanResult<NcspBatchNormFwdPd>;

pub type BnormBwdFactory = fn(
    &Engine,
    &BatchNormDesc,
    &PrimitiveAttr,
    Option<&NcspBatchNormFwdPd>,
) -> PlanResult<NcspBatchNormBwdPd>;

pub type IpFactory =
    fn(InnerProductDesc, PrimitiveAttr, Option<&InnerProductPd>) -> PlanResult<InnerProductPd>;

pub static BNORM_FWD_IMPLS: &[ImplEntry<BnormFwdFactory>] = &[ImplEntry {
    name: NcspBatchNormFwdPd::NAME,
    create: NcspBatchNormFwdPd::create,
}];

pub static BNORM_BWD_IMPLS: &[ImplEntry<BnormBwdFactory>] = &[ImplEntry {
    name: NcspBatchNormBwdPd::NAME,
    create: NcspBatchNormBwdPd::create,
}];

pub static IP_IMPLS: &[ImplEntry<IpFactory>] = &[ImplEntry {
    name: InnerProductPd::NAME,
    create: InnerProductPd::new,
}];

/// Negotiate a forward batch-normalization descriptor.
pub fn select_bnorm_fwd(
    engine: &Engine,
    desc: &BatchNormDesc,
    attr: &PrimitiveAttr,
) -> PlanResult<NcspBatchNormFwdPd> {
    first_available(BNORM_FWD_IMPLS, |create| create(engine, desc, attr))
}

/// Negotiate a backward batch-normalization descriptor against its paired
/// forward descriptor.
pub fn select_bnorm_bwd(
    engine: &Engine,
    desc: &BatchNormDesc,
    attr: &PrimitiveAttr,
    hint_fwd_pd: Option<&NcspBatchNormFwdPd>,
) -> PlanResult<NcspBatchNormBwdPd> {
    first_available(BNORM_BWD_IMPLS, |create| {
        create(engine, desc, attr, hint_fwd_pd)
    })
}

/// Negotiate an inner-product descriptor.
pub fn select_inner_product(
    desc: &InnerProductDesc,
    attr: &PrimitiveAttr,
    hint_fwd_pd: Option<&InnerProductPd>,
) -> PlanResult<InnerProductPd> {
    first_available(IP_IMPLS, |create| create(*desc, attr.clone(), hint_fwd_pd))
}
