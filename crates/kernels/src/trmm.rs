//! Triangular matrix multiply on one tile.

use num_traits::{One, Zero};
use tessera_core::{Diag, Scalar, Side, Trans, Uplo};

#[inline]
fn opel<T: Scalar>(trans: Trans, v: T) -> T {
    match trans {
        Trans::ConjTrans => v.conj(),
        _ => v,
    }
}

/// `B := alpha * op(A) * B` (`side = Left`) or `B := alpha * B * op(A)`
/// (`side = Right`), with `A` triangular `uplo` and `B` of shape `m x n`.
#[allow(clippy::too_many_arguments)]
pub fn trmm<T: Scalar>(
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
            // B := alpha * A * B
            if upper {
                for j in 0..n {
                    for k in 0..m {
                        if !b[k + j * ldb].is_zero() {
                            let temp = alpha * b[k + j * ldb];
                            for i in 0..k {
                                let aik = a[i + k * lda];
                                b[i + j * ldb] += temp * aik;
                            }
                            let mut t2 = temp;
                            if nonunit {
                                t2 = temp * a[k + k * lda];
                            }
                            b[k + j * ldb] = t2;
                        }
                    }
                }
            } else {
                for j in 0..n {
                    for k in (0..m).rev() {
                        if !b[k + j * ldb].is_zero() {
                            let temp = alpha * b[k + j * ldb];
                            b[k + j * ldb] = temp;
                            if nonunit {
                                b[k + j * ldb] = b[k + j * ldb] * a[k + k * lda];
                            }
                            for i in k + 1..m {
                                let aik = a[i + k * lda];
                                b[i + j * ldb] += temp * aik;
                            }
                        }
                    }
                }
            }
        }
        (Side::Left, _) => {
            // B := alpha * op(A) * B, op in {T, H}
            if upper {
                for j in 0..n {
                    for i in (0..m).rev() {
                        let mut temp = b[i + j * ldb];
                        if nonunit {
                            temp = temp * opel(transa, a[i + i * lda]);
                        }
                        for k in 0..i {
                            temp += opel(transa, a[k + i * lda]) * b[k + j * ldb];
                        }
                        b[i + j * ldb] = alpha * temp;
                    }
                }
            } else {
                for j in 0..n {
                    for i in 0..m {
                        let mut temp = b[i + j * ldb];
                        if nonunit {
                            temp = temp * opel(transa, a[i + i * lda]);
                        }
                        for k in i + 1..m {
                            temp += opel(transa, a[k + i * lda]) * b[k + j * ldb];
                        }
                        b[i + j * ldb] = alpha * temp;
                    }
                }
            }
        }
        (Side::Right, Trans::NoTrans) => {
            // B := alpha * B * A
            if upper {
                for j in (0..n).rev() {
                    let mut temp = alpha;
                    if nonunit {
                        temp = temp * a[j + j * lda];
                    }
                    for i in 0..m {
                        b[i + j * ldb] = temp * b[i + j * ldb];
                    }
                    for k in 0..j {
                        let akj = a[k + j * lda];
                        if !akj.is_zero() {
                            let t = alpha * akj;
                            for i in 0..m {
                                let bik = b[i + k * ldb];
                                b[i + j * ldb] += t * bik;
                            }
                        }
                    }
                }
            } else {
                for j in 0..n {
                    let mut temp = alpha;
                    if nonunit {
                        temp = temp * a[j + j * lda];
                    }
                    for i in 0..m {
                        b[i + j * ldb] = temp * b[i + j * ldb];
                    }
                    for k in j + 1..n {
                        let akj = a[k + j * lda];
                        if !akj.is_zero() {
                            let t = alpha * akj;
                            for i in 0..m {
                                let bik = b[i + k * ldb];
                                b[i + j * ldb] += t * bik;
                            }
                        }
                    }
                }
            }
        }
        (Side::Right, _) => {
            // B := alpha * B * op(A), op in {T, H}
            if upper {
                for k in 0..n {
                    for j in 0..k {
                        let t = opel(transa, a[j + k * lda]);
                        if !t.is_zero() {
                            let t = alpha * t;
                            for i in 0..m {
                                let bik = b[i + k * ldb];
                                b[i + j * ldb] += t * bik;
                            }
                        }
                    }
                    let mut temp = alpha;
                    if nonunit {
                        temp = temp * opel(transa, a[k + k * lda]);
                    }
                    if !temp.is_one() {
                        for i in 0..m {
                            b[i + k * ldb] = temp * b[i + k * ldb];
                        }
                    }
                }
            } else {
                for k in (0..n).rev() {
                    for j in k + 1..n {
                        let t = opel(transa, a[j + k * lda]);
                        if !t.is_zero() {
                            let t = alpha * t;
                            for i in 0..m {
                                let bik = b[i + k * ldb];
                                b[i + j * ldb] += t * bik;
                            }
                        }
                    }
                    let mut temp = alpha;
                    if nonunit {
                        temp = temp * opel(transa, a[k + k * lda]);
                    }
                    if !temp.is_one() {
                        for i in 0..m {
                            b[i + k * ldb] = temp * b[i + k * ldb];
                        }
                    }
                }
            }
        }
    }
}
