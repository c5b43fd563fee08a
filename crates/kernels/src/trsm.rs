//! Triangular solve on one tile.

use num_traits::{One, Zero};
use tessera_core::{Diag, Scalar, Side, Trans, Uplo};

#[inline]
fn opel<T: Scalar>(trans: Trans, v: T) -> T {
    match trans {
        Trans::ConjTrans => v.conj(),
        _ => v,
    }
}

/// Solve `op(A) * X = alpha * B` (`side = Left`) or
/// `X * op(A) = alpha * B` (`side = Right`) for `X`, overwriting `B`.
/// `A` is triangular `uplo` with an implicit unit diagonal when
/// `diag = Unit`; `B` is `m x n`.
#[allow(clippy::too_many_arguments)]
pub fn trsm<T: Scalar>(
    side: Side,
    uplo: Uplo,
    transa: Trans,
    diag: Diag,
    m: usize,
    n: usize,
    alpha: T,
    a: &[T],
    lda: usize,
    b: &mut [T],
    ldb: usize,
) {
    debug_assert!(!matches!(uplo, Uplo::General));
    let nonunit = matches!(diag, Diag::NonUnit);
    let upper = matches!(uplo, Uplo::Upper);

    match (side, transa) {
        (Side::Left, Trans::NoTrans) => {
            // B := alpha * inv(A) * B
            for j in 0..n {
                for i in 0..m {
                    b[i + j * ldb] = alpha * b[i + j * ldb];
                }
                if upper {
                    for k in (0..m).rev() {
                        if !b[k + j * ldb].is_zero() {
                            if nonunit {
                                b[k + j * ldb] = b[k + j * ldb] / a[k + k * lda];
                            }
                            let bk = b[k + j * ldb];
                            for i in 0..k {
                                b[i + j * ldb] -= bk * a[i + k * lda];
                            }
                        }
                    }
                } else {
                    for k in 0..m {
                        if !b[k + j * ldb].is_zero() {
                            if nonunit {
                                b[k + j * ldb] = b[k + j * ldb] / a[k + k * lda];
                            }
                            let bk = b[k + j * ldb];
                            for i in k + 1..m {
                                b[i + j * ldb] -= bk * a[i + k * lda];
                            }
                        }
                    }
                }
            }
        }
        (Side::Left, _) => {
            // B := alpha * inv(op(A)) * B
            for j in 0..n {
                if upper {
                    // op(A) is lower: forward substitution
                    for i in 0..m {
                        let mut temp = alpha * b[i + j * ldb];
                        for k in 0..i {
                            temp -= opel(transa, a[k + i * lda]) * b[k + j * ldb];
                        }
                        if nonunit {
                            temp = temp / opel(transa, a[i + i * lda]);
                        }
                        b[i + j * ldb] = temp;
                    }
                } else {
                    // op(A) is upper: backward substitution
                    for i in (0..m).rev() {
                        let mut temp = alpha * b[i + j * ldb];
                        for k in i + 1..m {
                            temp -= opel(transa, a[k + i * lda]) * b[k + j * ldb];
                        }
                        if nonunit {
                            temp = temp / opel(transa, a[i + i * lda]);
                        }
                        b[i + j * ldb] = temp;
                    }
                }
            }
        }
        (Side::Right, Trans::NoTrans) => {
            // B := alpha * B * inv(A)
            if upper {
                for j in 0..n {
                    for i in 0..m {
                        b[i + j * ldb] = alpha * b[i + j * ldb];
                    }
                    for k in 0..j {
                        let akj = a[k + j * lda];
                        if !akj.is_zero() {
                            for i in 0..m {
                                let bik = b[i + k * ldb];
                                b[i + j * ldb] -= akj * bik;
                            }
                        }
                    }
                    if nonunit {
                        for i in 0..m {
                            b[i + j * ldb] = b[i + j * ldb] / a[j + j * lda];
                        }
                    }
                }
            } else {
                for j in (0..n).rev() {
                    for i in 0..m {
                        b[i + j * ldb] = alpha * b[i + j * ldb];
                    }
                    for k in j + 1..n {
                        let akj = a[k + j * lda];
                        if !akj.is_zero() {
                            for i in 0..m {
                                let bik = b[i + k * ldb];
                                b[i + j * ldb] -= akj * bik;
                            }
                        }
                    }
                    if nonunit {
                        for i in 0..m {
                            b[i + j * ldb] = b[i + j * ldb] / a[j + j * lda];
                        }
                    }
                }
            }
        }
        (Side::Right, _) => {
            // B := alpha * B * inv(op(A))
            if upper {
                for k in (0..n).rev() {
                    if nonunit {
                        let d = opel(transa, a[k + k * lda]);
                        for i in 0..m {
                            b[i + k * ldb] = b[i + k * ldb] / d;
                        }
                    }
                    for j in 0..k {
                        let t = opel(transa, a[j + k * lda]);
                        if !t.is_zero() {
                            for i in 0..m {
                                let bik = b[i + k * ldb];
                                b[i + j * ldb] -= t * bik;
                            }
                        }
                    }
                    if !alpha.is_one() {
                        for i in 0..m {
                            b[i + k * ldb] = alpha * b[i + k * ldb];
                        }
                    }
                }
            } else {
                for k in 0..n {
                    if nonunit {
                        let d = opel(transa, a[k + k * lda]);
                        for i in 0..m {
                            b[i + k * ldb] = b[i + k * ldb] / d;
                        }
                    }
                    for j in k + 1..n {
                        let t = opel(transa, a[j + k * lda]);
                        if !t.is_zero() {
                            for i in 0..m {
                                let bik = b[i + k * ldb];
                                b[i + j * ldb] -= t * bik;
                            }
                        }
                    }
                    if !alpha.is_one() {
                        for i in 0..m {
                            b[i + k * ldb] = alpha * b[i + k * ldb];
                        }
                    }
                }
            }
        }
    }
}
