//! Integration tests for the tensor layer, exercised through the
//! public API the graph crate consumes.

use tensorgate_core::{Error, Shape, Tensor};

// ============================================================================
// Algebraic Properties
// ============================================================================

#[test]
fn sub_then_add_restores_operand() {
    let a = Tensor::new(vec![vec![1.5, -2.0], vec![0.0, 7.25]]).unwrap();
    let b = Tensor::new(vec![vec![0.5, 3.0], vec![-1.0, 2.0]]).unwrap();
    assert_eq!(a.sub(&b).unwrap().add(&b).unwrap(), a);
}

#[test]
fn mul_by_ones_is_identity() {
    let a = Tensor::new(vec![vec![1.5, -2.0, 3.0], vec![0.0, 7.25, -4.5]]).unwrap();
    let ones = Tensor::ones(a.shape().clone());
    assert_eq!(a.mul(&ones).unwrap(), a);
    assert_eq!(ones.mul(&a).unwrap(), a);
}

#[test]
fn scalar_broadcast_agrees_with_apply() {
    let a = Tensor::new(vec![vec![1.0, -2.0], vec![3.0, -4.0]]).unwrap();
    for c in [0.0, -1.5, 2.0, 10.0] {
        let scaled = Tensor::scalar(c).mul(&a).unwrap();
        assert_eq!(scaled, a.apply(|x| c * x));
        assert_eq!(a.mul(&Tensor::scalar(c)).unwrap(), scaled);
    }
}

#[test]
fn transpose_is_an_involution() {
    let a = Tensor::new(vec![
        vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        vec![vec![5.0, 6.0], vec![7.0, 8.0]],
        vec![vec![9.0, 10.0], vec![11.0, 12.0]],
    ])
    .unwrap();
    assert_eq!(a.transpose().transpose(), a);
    assert_eq!(a.transpose().shape(), &Shape::new(vec![2, 2, 3]));
}

// ============================================================================
// Matrix Product
// ============================================================================

#[test]
fn matmul_matches_hand_computed_values() {
    let w = Tensor::new(vec![vec![2.0, 0.0, 1.0], vec![0.0, 1.0, -1.0]]).unwrap();
    let x = Tensor::vector(vec![3.0, 4.0, 5.0]);
    assert_eq!(w.matmul(&x).unwrap(), Tensor::vector(vec![11.0, -1.0]));
}

#[test]
fn matmul_rejects_mismatched_inner_dimensions() {
    let a = Tensor::new(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
    let b = Tensor::new(vec![vec![1.0], vec![2.0], vec![3.0]]).unwrap();
    let err = a.matmul(&b).unwrap_err();
    assert_eq!(
        err,
        Error::DimensionMismatch {
            left: Shape::matrix(2, 2),
            right: Shape::matrix(3, 1),
        }
    );
}

#[test]
fn matmul_of_vectors_is_the_dot_product() {
    let a = Tensor::vector(vec![1.0, -1.0, 2.0]);
    let b = Tensor::vector(vec![4.0, 2.0, 0.5]);
    assert_eq!(a.matmul(&b).unwrap(), Tensor::scalar(3.0));
}

// ============================================================================
// Construction and Bias Folding
// ============================================================================

#[test]
fn ragged_literals_never_build() {
    let err = Tensor::new(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0]]).unwrap_err();
    assert!(matches!(err, Error::Ragged { .. }));
    let msg = err.to_string();
    assert!(msg.contains("ragged"), "unexpected message: {msg}");
}

#[test]
fn bias_column_folds_into_weight_matrix() {
    // Appending a bias column turns a (2,2) weight into (2,3), so the
    // product with a bias-extended input stays well-formed.
    let w = Tensor::new(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
    let bias = Tensor::vector(vec![5.0, -5.0]);
    let wb = w.v_append(&bias).unwrap();
    assert_eq!(wb.shape(), &Shape::matrix(2, 3));

    let x = Tensor::vector(vec![2.0, 3.0])
        .v_append(&Tensor::vector(vec![1.0, 1.0]))
        .unwrap();
    assert_eq!(wb.matmul(&x).unwrap(), Tensor::vector(vec![7.0, -2.0]));
}

#[test]
fn error_messages_name_both_shapes() {
    let a = Tensor::vector(vec![1.0, 2.0]);
    let b = Tensor::vector(vec![1.0, 2.0, 3.0]);
    let msg = a.add(&b).unwrap_err().to_string();
    assert!(msg.contains("[2]"), "unexpected message: {msg}");
    assert!(msg.contains("[3]"), "unexpected message: {msg}");
}
