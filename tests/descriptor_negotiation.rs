//! End-to-end descriptor negotiation: build forward/backward pairs, exercise
//! the generic query interface, and check the execution-time scratchpad
//! contract against the planned layout.

use kernel_plan::{
    select_bnorm_bwd, select_bnorm_fwd, select_inner_product, ArgId, ArgUsage, BatchNormDesc,
    BnormFlags, DataType, Engine, FormatTag, InnerProductDesc, IsaLevel, MemoryDesc, OpDescRef,
    PrimitiveAttr, PrimitiveDesc, PropKind, Query, QueryAnswer, ScratchKey,
};

fn engine() -> Engine {
    Engine::with_caps(IsaLevel::Avx512, 8)
}

fn nchw(dims: &[i64], dt: DataType) -> MemoryDesc {
    MemoryDesc::new(dims, dt, FormatTag::Nchw).unwrap()
}

#[test]
fn bnorm_training_pair_round_trip() {
    let eng = engine();
    let flags = BnormFlags {
        use_scale_shift: true,
        fuse_norm_relu: true,
        ..Default::default()
    };
    let src = nchw(&[16, 32, 14, 14], DataType::F32);

    let fwd_desc = BatchNormDesc::forward(PropKind::ForwardTraining, src, 1e-5, flags).unwrap();
    let fwd = select_bnorm_fwd(&eng, &fwd_desc, &PrimitiveAttr::new()).unwrap();

    // The frozen operator description queried back is identity-equal.
    match fwd.query(Query::BatchNormDesc).unwrap() {
        QueryAnswer::OpDesc(OpDescRef::BatchNorm(queried)) => assert_eq!(*queried, fwd_desc),
        other => panic!("unexpected answer: {other:?}"),
    }

    // Backward paired against the forward descriptor succeeds and sees the
    // same workspace.
    let bwd_desc = BatchNormDesc::backward(PropKind::Backward, src, src, 1e-5, flags).unwrap();
    let bwd = select_bnorm_bwd(&eng, &bwd_desc, &PrimitiveAttr::new(), Some(&fwd)).unwrap();
    assert_eq!(bwd.workspace_md(), fwd.workspace_md());
    assert_eq!(bwd.arg_usage(ArgId::Workspace), ArgUsage::Input);
}

#[test]
fn bnorm_workspace_mismatch_fails_pairing() {
    let eng = engine();
    let flags = BnormFlags {
        fuse_norm_relu: true,
        ..Default::default()
    };
    let fwd_desc = BatchNormDesc::forward(
        PropKind::ForwardTraining,
        nchw(&[16, 32, 14, 14], DataType::F32),
        1e-5,
        flags,
    )
    .unwrap();
    let fwd = select_bnorm_fwd(&eng, &fwd_desc, &PrimitiveAttr::new()).unwrap();

    let smaller = nchw(&[16, 32, 7, 7], DataType::F32);
    let bwd_desc =
        BatchNormDesc::backward(PropKind::Backward, smaller, smaller, 1e-5, flags).unwrap();
    let err = select_bnorm_bwd(&eng, &bwd_desc, &PrimitiveAttr::new(), Some(&fwd)).unwrap_err();
    assert!(err.is_unimplemented());
}

#[test]
fn bf16_gate_depends_on_engine_not_shape() {
    let src = nchw(&[16, 32, 14, 14], DataType::BF16);
    let desc = BatchNormDesc::forward(
        PropKind::ForwardTraining,
        src,
        1e-5,
        BnormFlags::default(),
    )
    .unwrap();

    let narrow = Engine::with_caps(IsaLevel::Avx2, 8);
    assert!(select_bnorm_fwd(&narrow, &desc, &PrimitiveAttr::new())
        .unwrap_err()
        .is_unimplemented());
    assert!(select_bnorm_fwd(&engine(), &desc, &PrimitiveAttr::new()).is_ok());
}

#[test]
fn scratchpad_block_slices_match_the_plan() {
    let eng = engine();
    let desc = BatchNormDesc::forward(
        PropKind::ForwardInference,
        MemoryDesc::new(&[8, 64], DataType::F32, FormatTag::Nc).unwrap(),
        1e-5,
        BnormFlags::default(),
    )
    .unwrap();
    let pd = select_bnorm_fwd(&eng, &desc, &PrimitiveAttr::new()).unwrap();
    let reg = pd.scratchpad_registry();

    let mut block = vec![0u8; reg.total_size()];
    let keys = [
        ScratchKey::BnormReduction,
        ScratchKey::BnormTmpMean,
        ScratchKey::BnormTmpVar,
    ];
    let mut ranges = Vec::new();
    for key in keys {
        let range = reg.range_of(key).unwrap();
        assert_eq!(reg.grab(&mut block, key).unwrap().len(), range.len());
        ranges.push(range);
    }
    // Regions never alias.
    for i in 0..ranges.len() {
        for j in i + 1..ranges.len() {
            assert!(ranges[i].end <= ranges[j].start || ranges[j].end <= ranges[i].start);
        }
    }
}

#[test]
fn inner_product_negotiation_and_queries() {
    let src = MemoryDesc::new(&[16, 32], DataType::F32, FormatTag::Nc).unwrap();
    let wei = MemoryDesc::new(&[8, 32], DataType::F32, FormatTag::Nc).unwrap();
    let bias = MemoryDesc::new(&[8], DataType::F32, FormatTag::X).unwrap();
    let dst = MemoryDesc::new(&[16, 8], DataType::F32, FormatTag::Nc).unwrap();

    let desc = InnerProductDesc::forward(
        PropKind::ForwardTraining,
        src,
        wei,
        Some(bias),
        dst,
        DataType::F32,
    )
    .unwrap();
    let pd = select_inner_product(&desc, &PrimitiveAttr::new(), None).unwrap();

    match pd.query(Query::InnerProductDesc).unwrap() {
        QueryAnswer::OpDesc(OpDescRef::InnerProduct(queried)) => assert_eq!(*queried, desc),
        other => panic!("unexpected answer: {other:?}"),
    }
    assert_eq!(pd.query(Query::NumInputs).unwrap(), QueryAnswer::Count(3));
    assert_eq!(
        pd.query(Query::ScratchpadSize).unwrap(),
        QueryAnswer::Size(0)
    );

    // A batch-norm-only query on an inner-product descriptor is unsupported.
    let err = pd.query(Query::BatchNormDesc).unwrap_err();
    assert_eq!(
        err,
        kernel_plan::PlanError::UnsupportedQuery("op desc kind mismatch")
    );
}
