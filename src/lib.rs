mod bus_types;
mod case;
mod cases;
mod d2_abr_dv2;
mod d2_ibr_dv2;
mod d2_sbr_dv2;
mod d2_sbus_dv2;
mod d_abr_dv;
mod d_ibr_dv;
mod d_sbr_dv;
mod d_sbus_dv;
mod dc;
mod error;
mod fd;
mod jac;
mod opf;
mod order;
mod pfsoln;
mod sbus;
mod ybus;

pub mod debug;
pub mod math;

pub use bus_types::*;
pub use case::*;
pub use cases::*;
pub use d2_abr_dv2::*;
pub use d2_ibr_dv2::*;
pub use d2_sbr_dv2::*;
pub use d2_sbus_dv2::*;
pub use d_abr_dv::*;
pub use d_ibr_dv::*;
pub use d_sbr_dv::*;
pub use d_sbus_dv::*;
pub use dc::*;
pub use error::*;
pub use fd::*;
pub use jac::*;
pub use opf::*;
pub use order::*;
pub use pfsoln::*;
pub use sbus::*;
pub use ybus::*;
