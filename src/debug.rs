use crate::case::Case;
use crate::math::rad_to_deg;
use num_complex::Complex64;
use pretty_dtoa::{dtoa, FmtFloatConfig};
use std::fmt::Write;

const FLOAT_CONFIG: FmtFloatConfig = FmtFloatConfig::default()
    .add_point_zero(false)
    .max_significant_digits(9);

fn fmt_f64(f: f64) -> String {
    dtoa(f, FLOAT_CONFIG)
}

fn format_vec<T>(v: &[T], f: impl Fn(&T) -> String) -> String {
    let a: Vec<String> = v.iter().map(f).collect();
    format!("[{}]", a.join(", "))
}

pub fn format_f64_vec(v: &[f64]) -> String {
    format_vec(v, |f| fmt_f64(*f))
}

fn format_rect(z: &Complex64) -> String {
    format!(
        "{}{}j{}",
        fmt_f64(z.re),
        if z.im.signum() < 0.0 { "-" } else { "+" },
        fmt_f64(z.im.abs())
    )
}

pub fn format_rect_vec(v: &[Complex64]) -> String {
    format_vec(v, format_rect)
}

fn format_polar(z: &Complex64) -> String {
    format!(
        "{}\u{2220}{}\u{00B0}",
        fmt_f64(z.norm()),
        fmt_f64(rad_to_deg(z.arg()))
    )
}

pub fn format_polar_vec(v: &[Complex64]) -> String {
    format_vec(v, format_polar)
}

/// Tabulates bus voltages, generator output and branch flows of a case.
pub fn format_solution(case: &Case) -> String {
    let mut s = String::new();

    let _ = writeln!(s, "{:>6} {:>10} {:>10}", "bus", "vm", "va");
    for (id, b) in case.buses() {
        let _ = writeln!(s, "{:>6} {:>10} {:>10}", id, fmt_f64(b.vm), fmt_f64(b.va));
    }

    let _ = writeln!(s, "\n{:>6} {:>6} {:>10} {:>10}", "gen", "bus", "pg", "qg");
    for (i, g) in case.gens().iter().enumerate() {
        let _ = writeln!(
            s,
            "{:>6} {:>6} {:>10} {:>10}",
            i,
            g.bus,
            fmt_f64(g.pg),
            fmt_f64(g.qg)
        );
    }

    let _ = writeln!(
        s,
        "\n{:>6} {:>6} {:>6} {:>10} {:>10} {:>10} {:>10}",
        "branch", "from", "to", "pf", "qf", "pt", "qt"
    );
    for (l, br) in case.branches().iter().enumerate() {
        let _ = writeln!(
            s,
            "{:>6} {:>6} {:>6} {:>10} {:>10} {:>10} {:>10}",
            l,
            br.from_bus,
            br.to_bus,
            fmt_f64(br.pf),
            fmt_f64(br.qf),
            fmt_f64(br.pt),
            fmt_f64(br.qt)
        );
    }
    s
}
