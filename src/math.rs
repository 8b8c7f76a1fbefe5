use num_complex::Complex64;
use sparsetools::csr::CSR;
use std::f64::consts::PI;

pub const J: Complex64 = Complex64 { re: 0.0, im: 1.0 };

#[macro_export]
macro_rules! cmplx {
    () => {
        num_complex::Complex64::new(0.0, 0.0)
    };
    ($arg1:expr) => {
        num_complex::Complex64::new($arg1, 0.0)
    };
    ($arg1:expr, $arg2:expr) => {
        num_complex::Complex64::new($arg1, $arg2)
    };
}

pub fn deg_to_rad(deg: f64) -> f64 {
    deg * PI / 180.0
}

pub fn rad_to_deg(rad: f64) -> f64 {
    rad * 180.0 / PI
}

/// Sparse diagonal matrix from a complex vector.
pub(crate) fn diag(v: &[Complex64]) -> CSR<usize, Complex64> {
    CSR::with_diagonal(v.to_vec())
}

/// Unit-magnitude voltages, `V ./ abs(V)`.
pub(crate) fn v_norm(v: &[Complex64]) -> Vec<Complex64> {
    v.iter().map(|v| v / v.norm()).collect()
}

/// Element-wise product of two complex vectors.
pub(crate) fn mul_vec(a: &[Complex64], b: &[Complex64]) -> Vec<Complex64> {
    a.iter().zip(b).map(|(a, b)| a * b).collect()
}

/// Complex conjugate of each element.
pub(crate) fn conj_vec(a: &[Complex64]) -> Vec<Complex64> {
    a.iter().map(|a| a.conj()).collect()
}

#[cfg(test)]
pub(crate) mod dense {
    use num_complex::Complex64;
    use sparsetools::csr::CSR;

    /// Dense copy of a complex sparse matrix, duplicate entries summed.
    pub fn to_dense(m: &CSR<usize, Complex64>) -> Vec<Vec<Complex64>> {
        let mut d = vec![vec![Complex64::default(); m.cols()]; m.rows()];
        for i in 0..m.rows() {
            for k in m.rowptr()[i]..m.rowptr()[i + 1] {
                d[i][m.colidx()[k]] += m.values()[k];
            }
        }
        d
    }

    /// Dense copy of a real sparse matrix, duplicate entries summed.
    pub fn to_dense_f64(m: &CSR<usize, f64>) -> Vec<Vec<f64>> {
        let mut d = vec![vec![0.0; m.cols()]; m.rows()];
        for i in 0..m.rows() {
            for k in m.rowptr()[i]..m.rowptr()[i + 1] {
                d[i][m.colidx()[k]] += m.values()[k];
            }
        }
        d
    }

    pub fn assert_close(a: Complex64, b: Complex64, eps: f64) {
        approx::assert_abs_diff_eq!(a.re, b.re, epsilon = eps);
        approx::assert_abs_diff_eq!(a.im, b.im, epsilon = eps);
    }

    pub fn assert_dense_close(a: &[Vec<Complex64>], b: &[Vec<Complex64>], eps: f64) {
        assert_eq!(a.len(), b.len());
        for (ra, rb) in a.iter().zip(b) {
            assert_eq!(ra.len(), rb.len());
            for (&x, &y) in ra.iter().zip(rb) {
                assert_close(x, y, eps);
            }
        }
    }

    pub fn from_dense(d: &[Vec<Complex64>]) -> CSR<usize, Complex64> {
        let cols = d.first().map_or(0, |r| r.len());
        let mut m = sparsetools::coo::Coo::with_size(d.len(), cols);
        for (i, row) in d.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                if v != Complex64::default() {
                    m.push(i, j, v);
                }
            }
        }
        m.to_csr()
    }

    /// A non-flat voltage profile for the six bus test case.
    pub fn sample_v6() -> Vec<Complex64> {
        vec![
            Complex64::new(1.05, 0.0),
            Complex64::from_polar(1.05, -0.05),
            Complex64::from_polar(1.07, -0.06),
            Complex64::from_polar(0.99, -0.07),
            Complex64::from_polar(0.98, -0.08),
            Complex64::from_polar(1.0, -0.1),
        ]
    }

    /// Compares polar derivatives against central differences of `f`.
    pub fn check_polar(
        f: impl Fn(&[Complex64]) -> Vec<Complex64>,
        v: &[Complex64],
        d_va: &CSR<usize, Complex64>,
        d_vm: &CSR<usize, Complex64>,
        eps: f64,
    ) {
        let h = 1e-6;
        let (d_va, d_vm) = (to_dense(d_va), to_dense(d_vm));
        for k in 0..v.len() {
            let at = |vk: Complex64| {
                let mut vp = v.to_vec();
                vp[k] = vk;
                f(&vp)
            };
            let (vm, va) = (v[k].norm(), v[k].arg());
            let a_up = at(Complex64::from_polar(vm, va + h));
            let a_dn = at(Complex64::from_polar(vm, va - h));
            let m_up = at(Complex64::from_polar(vm + h, va));
            let m_dn = at(Complex64::from_polar(vm - h, va));
            for i in 0..a_up.len() {
                assert_close((a_up[i] - a_dn[i]) / (2.0 * h), d_va[i][k], eps);
                assert_close((m_up[i] - m_dn[i]) / (2.0 * h), d_vm[i][k], eps);
            }
        }
    }

    pub fn transpose<T: Copy>(a: &[Vec<T>]) -> Vec<Vec<T>> {
        if a.is_empty() {
            return Vec::new();
        }
        (0..a[0].len())
            .map(|j| a.iter().map(|row| row[j]).collect())
            .collect()
    }
}
