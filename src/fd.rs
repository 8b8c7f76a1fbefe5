use crate::case::Case;
use crate::error::Result;
use crate::order::Order;
use crate::ybus::{make_ybus_with, YbusOverrides};
use num_complex::Complex64;
use sparsetools::csr::{CCSR, CSR};

/// Fast-decoupled variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FdMethod {
    /// Resistance ignored in B prime.
    XB,
    /// Resistance ignored in B double prime.
    BX,
}

/// Builds the two matrices B prime and B double prime used in the fast
/// decoupled power flow.
pub fn make_b(
    case: &Case,
    order: &Order,
    method: FdMethod,
) -> Result<(CSR<usize, f64>, CSR<usize, f64>)> {
    // Form Bp (B prime).
    let ovr_p = YbusOverrides {
        zero_bus_shunt_b: true, // zero out shunts at buses
        zero_line_charging: true,
        unit_tap: true, // cancel out taps
        zero_resistance: method == FdMethod::XB,
        zero_shift: false,
    };
    let (y_p, _, _) = make_ybus_with(case, order, &ovr_p)?;

    // Form Bpp (B double prime).
    let ovr_pp = YbusOverrides {
        zero_bus_shunt_b: true,
        zero_line_charging: false,
        unit_tap: false,
        zero_resistance: method == FdMethod::BX,
        zero_shift: true, // zero out phase shifters
    };
    let (y_pp, _, _) = make_ybus_with(case, order, &ovr_pp)?;

    let b_p = neg_imag(y_p);
    let b_pp = neg_imag(y_pp);

    log::trace!("Bp:\n{}", b_p.to_table());
    log::trace!("Bpp:\n{}", b_pp.to_table());

    Ok((b_p, b_pp))
}

/// `-imag(Y)`, since `Re(j * (a + jb)) = -b`.
fn neg_imag(y: CSR<usize, Complex64>) -> CSR<usize, f64> {
    (y * Complex64::i()).real()
}
