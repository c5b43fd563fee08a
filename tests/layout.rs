//! Layout translation: round trips, offset submatrices, views, band
//! storage and LASET region semantics.

mod common;

use common::*;
use proptest::prelude::*;
use tessera::{
    ccrb2cm_async, ccrb2cm_band_async, cm2ccrb_async, cm2ccrb_band_async, Complex64, Desc,
    Request, Sequence, Uplo,
};

/// Translating in and back out reproduces the input exactly.
#[test]
fn round_trip_with_edge_tiles() {
    let rt = runtime(4, 2);
    let mut rng = seeded(4001);
    let (m, n, lda) = (10, 7, 12);
    let a = rand_f64(lda, n, &mut rng);

    let desc: Desc<f64> = Desc::general(4, 4, m, n, 0, 0, m, n).unwrap();
    let seq = Sequence::new();
    let req = Request::new();
    let mut out = vec![0.0f64; lda * n];
    rt.region(|reg| {
        cm2ccrb_async(reg, &a, lda, &desc, &seq, &req);
        ccrb2cm_async(reg, &desc, &mut out, lda, &seq, &req);
    });
    seq.status().unwrap();

    for j in 0..n {
        for i in 0..m {
            assert_eq!(out[i + j * lda], a[i + j * lda]);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Round trip over random shapes and tile sizes, including
    /// fractional origins: the descriptor's submatrix starts at
    /// (i, j) inside the tile grid and the user pointer at the
    /// tile-aligned corner.
    #[test]
    fn round_trip_offset_submatrices(
        nb in 2usize..5,
        i in 0usize..7,
        j in 0usize..7,
        m in 1usize..12,
        n in 1usize..12,
    ) {
        let rt = runtime(nb, 1);
        let mut rng = seeded(4002 + (nb + i + j + m + n) as u64);
        let (lm, ln) = (i + m + 3, j + n + 2);
        let full = rand_f64(lm, ln, &mut rng);

        let desc: Desc<f64> = Desc::general(nb, nb, lm, ln, i, j, m, n).unwrap();
        let row0 = (i / nb) * nb;
        let col0 = (j / nb) * nb;
        let src = &full[col0 * lm + row0..];

        let mut out = vec![f64::NAN; lm * ln];
        let seq = Sequence::new();
        let req = Request::new();
        rt.region(|reg| {
            cm2ccrb_async(reg, src, lm, &desc, &seq, &req);
        });
        seq.status().unwrap();

        let seq = Sequence::new();
        let dst = &mut out[col0 * lm + row0..];
        rt.region(|reg| {
            ccrb2cm_async(reg, &desc, dst, lm, &seq, &req);
        });
        seq.status().unwrap();

        // exactly the submatrix elements came back
        for jj in 0..n {
            for ii in 0..m {
                let idx = (i + ii) + (j + jj) * lm;
                prop_assert_eq!(out[idx], full[idx]);
            }
        }
    }
}

/// Reading through a view yields the same elements as the parent
/// region.
#[test]
fn view_reads_match_parent_region() {
    let rt = runtime(4, 2);
    let mut rng = seeded(4003);
    let n = 12;
    let a = rand_f64(n, n, &mut rng);

    let desc: Desc<f64> = Desc::general(4, 4, n, n, 0, 0, n, n).unwrap();
    let seq = Sequence::new();
    let req = Request::new();
    rt.region(|reg| {
        cm2ccrb_async(reg, &a, n, &desc, &seq, &req);
    });
    seq.status().unwrap();

    let (vi, vj, vm, vn) = (4, 8, 8, 4);
    let view = desc.view(vi, vj, vm, vn).unwrap();
    let mut out = vec![0.0f64; vm * vn];
    let seq = Sequence::new();
    rt.region(|reg| {
        ccrb2cm_async(reg, &view, &mut out, vm, &seq, &req);
    });
    seq.status().unwrap();

    for j in 0..vn {
        for i in 0..vm {
            assert_eq!(out[i + j * vm], a[(vi + i) + (vj + j) * n]);
        }
    }
}

/// Upper band, m = n = 8, nb = 3, ku = 2: the banded region survives
/// the round trip bit-for-bit; entries outside the band are not
/// required to match.
#[test]
fn band_round_trip_upper() {
    let rt = runtime(3, 1);
    let (n, ku) = (8usize, 2usize);
    let ldab = ku + 1;
    let mut ab = vec![0.0f64; ldab * n];
    for j in 0..n {
        for i in j.saturating_sub(ku)..=j {
            ab[ku + i - j + j * ldab] = (1 + i + 100 * j) as f64;
        }
    }

    let desc: Desc<f64> =
        Desc::general_band(Uplo::Upper, 3, 3, n, n, 0, 0, n, n, 0, ku).unwrap();
    let seq = Sequence::new();
    let req = Request::new();
    let mut out = vec![0.0f64; ldab * n];
    rt.region(|reg| {
        cm2ccrb_band_async(reg, Uplo::Upper, &ab, ldab, &desc, &seq, &req);
        ccrb2cm_band_async(reg, Uplo::Upper, &desc, &mut out, ldab, &seq, &req);
    });
    seq.status().unwrap();

    for j in 0..n {
        for i in j.saturating_sub(ku)..=j {
            let idx = ku + i - j + j * ldab;
            assert_eq!(out[idx].to_bits(), ab[idx].to_bits());
        }
    }
}

/// General band round trip with both sub- and superdiagonals.
#[test]
fn band_round_trip_general() {
    let rt = runtime(3, 1);
    let (m, n, kl, ku) = (9usize, 8usize, 2usize, 1usize);
    let ldab = kl + ku + 1;
    let mut ab = vec![0.0f64; ldab * n];
    for j in 0..n {
        for i in j.saturating_sub(ku)..(j + kl + 1).min(m) {
            ab[ku + i - j + j * ldab] = (3 + 7 * i + 31 * j) as f64;
        }
    }

    let desc: Desc<f64> =
        Desc::general_band(Uplo::General, 3, 3, m, n, 0, 0, m, n, kl, ku).unwrap();
    let seq = Sequence::new();
    let req = Request::new();
    let mut out = vec![0.0f64; ldab * n];
    rt.region(|reg| {
        cm2ccrb_band_async(reg, Uplo::General, &ab, ldab, &desc, &seq, &req);
        ccrb2cm_band_async(reg, Uplo::General, &desc, &mut out, ldab, &seq, &req);
    });
    seq.status().unwrap();

    for j in 0..n {
        for i in j.saturating_sub(ku)..(j + kl + 1).min(m) {
            let idx = ku + i - j + j * ldab;
            assert_eq!(out[idx].to_bits(), ab[idx].to_bits());
        }
    }
}

/// LASET Upper, m = 5, n = 7, nb = 3: diagonal gets beta, the strict
/// upper triangle alpha, and the strict lower triangle keeps the
/// seeded input.
#[test]
fn laset_upper_complex() {
    let rt = runtime(3, 1);
    let mut rng = seeded(4004);
    let (m, n) = (5, 7);
    let alpha = Complex64::new(1.234, 5.678);
    let beta = Complex64::new(2.345, 6.789);
    let a0 = rand_c64(m, n, &mut rng);

    let mut a = a0.clone();
    rt.laset(Uplo::Upper, m, n, alpha, beta, &mut a, m).unwrap();

    for j in 0..n {
        for i in 0..m {
            let v = a[i + j * m];
            if i == j {
                assert_eq!(v, beta);
            } else if i < j {
                assert_eq!(v, alpha);
            } else {
                assert_eq!(v, a0[i + j * m]);
            }
        }
    }
}

/// LASET General fills everything.
#[test]
fn laset_general() {
    let rt = runtime(3, 1);
    let (m, n) = (7, 4);
    let mut a = vec![9.0f64; m * n];
    rt.laset(Uplo::General, m, n, 0.5, -1.0, &mut a, m).unwrap();
    for j in 0..n {
        for i in 0..m {
            let v = a[i + j * m];
            assert_eq!(v, if i == j { -1.0 } else { 0.5 });
        }
    }
}
