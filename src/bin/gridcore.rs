use anyhow::{format_err, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use gridcore::debug::{format_f64_vec, format_polar_vec, format_solution};
use gridcore::{
    angle_difference_limits, angle_reference_bounds, branch_flow_limits, bus_types, case6ww,
    make_b, make_b_dc, make_jac, make_v0, make_ybus, pfsoln, power_mismatch, Case, FdMethod,
    Order, PfSolnOpt, QgSplit,
};

/// Network matrices and power flow sensitivities.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bus and branch admittance matrices
    Ybus(CaseArgs),

    /// Fast-decoupled B prime and B double prime matrices
    Fdpf(FdpfArgs),

    /// DC power flow B matrices and phase shift injections
    Dc(CaseArgs),

    /// DC optimal power flow constraint matrices and bounds
    Opf(CaseArgs),

    /// Power flow Jacobian
    Jac(JacArgs),

    /// Branch flows and generator output at the case voltages
    Flows(FlowsArgs),
}

#[derive(Copy, Clone, ValueEnum)]
enum BuiltinCase {
    Case6ww,
}

#[derive(Args)]
struct CaseArgs {
    /// Built-in test case.
    #[arg(long, value_enum, default_value_t = BuiltinCase::Case6ww)]
    case: BuiltinCase,
}

#[derive(Args)]
struct FdpfArgs {
    #[command(flatten)]
    case: CaseArgs,

    /// Fast-decoupled variant.
    #[arg(long, value_enum, default_value_t = FdMethod::XB)]
    method: FdMethod,
}

#[derive(Args)]
struct JacArgs {
    #[command(flatten)]
    case: CaseArgs,

    /// Sensitivities of all bus injections w.r.t all voltages.
    #[arg(long, default_value_t = false)]
    full: bool,
}

#[derive(Args)]
struct FlowsArgs {
    #[command(flatten)]
    case: CaseArgs,

    /// Reactive power sharing between generators at the same bus.
    #[arg(long, value_enum, default_value_t = QgSplit::Total)]
    qg_split: QgSplit,
}

fn main() {
    env_logger::Builder::from_default_env()
        .format_level(false)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match execute(&cli) {
        Ok(_) => {
            std::process::exit(0);
        }
        Err(err) => {
            eprintln!("error: {}", err);
            std::process::exit(2);
        }
    }
}

fn load(args: &CaseArgs) -> Result<Case> {
    let case = match args.case {
        BuiltinCase::Case6ww => case6ww()?,
    };
    log::info!("case: {}", case.name);
    Ok(case)
}

fn execute(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Ybus(args) => {
            let case = load(args)?;
            let order = Order::new(&case)?;
            let (y_bus, y_f, y_t) = make_ybus(&case, &order)?;
            println!("Ybus:\n{}", y_bus.to_table());
            println!("Yf:\n{}", y_f.to_table());
            println!("Yt:\n{}", y_t.to_table());
        }
        Commands::Fdpf(args) => {
            let case = load(&args.case)?;
            let order = Order::new(&case)?;
            let (b_p, b_pp) = make_b(&case, &order, args.method)?;
            println!("Bp:\n{}", b_p.to_table());
            println!("Bpp:\n{}", b_pp.to_table());
        }
        Commands::Dc(args) => {
            let case = load(args)?;
            let order = Order::new(&case)?;
            let (b_bus, b_f, pbusinj, pfinj) = make_b_dc(&case, &order)?;
            println!("Bbus:\n{}", b_bus.to_table());
            println!("Bf:\n{}", b_f.to_table());
            println!("Pbusinj: {}", format_f64_vec(&pbusinj));
            println!("Pfinj: {}", format_f64_vec(&pfinj));
        }
        Commands::Opf(args) => {
            let case = load(args)?;
            let order = Order::new(&case)?;
            let (b_bus, b_f, pbusinj, pfinj) = make_b_dc(&case, &order)?;

            let (a_mis, b_mis) = power_mismatch(&case, &order, &b_bus, &pbusinj)?;
            println!("Amis:\n{}", a_mis.to_table());
            println!("bmis: {}", format_f64_vec(&b_mis));

            let (il, a_f, upf, upt) = branch_flow_limits(&case, &order, &b_f, &pfinj)?;
            println!("il: {:?}", il);
            println!("Af:\n{}", a_f.to_table());
            println!("upf: {}", format_f64_vec(&upf));
            println!("upt: {}", format_f64_vec(&upt));

            let (iang, a_ang, lang, uang) = angle_difference_limits(&case, &order);
            println!("iang: {:?}", iang);
            if !iang.is_empty() {
                println!("Aang:\n{}", a_ang.to_table());
                println!("lang: {}", format_f64_vec(&lang));
                println!("uang: {}", format_f64_vec(&uang));
            }

            let (va_l, va_u) = angle_reference_bounds(&case, &order)?;
            println!("Val: {}", format_f64_vec(&va_l));
            println!("Vau: {}", format_f64_vec(&va_u));
        }
        Commands::Jac(args) => {
            let case = load(&args.case)?;
            let order = Order::new(&case)?;
            let (y_bus, _, _) = make_ybus(&case, &order)?;
            let (refbus, pv, pq) = bus_types(&case, &order)?;
            if refbus.is_empty() {
                return Err(format_err!("case has no reference bus"));
            }
            let v = make_v0(&case, &order)?;
            let jac = make_jac(&y_bus, &v, &refbus, &pv, &pq, args.full)?;
            println!("V: {}", format_polar_vec(&v));
            println!("J:\n{}", jac.to_table());
        }
        Commands::Flows(args) => {
            let mut case = load(&args.case)?;
            let order = Order::new(&case)?;
            let (y_bus, y_f, y_t) = make_ybus(&case, &order)?;
            let v = make_v0(&case, &order)?;
            let opt = PfSolnOpt {
                qg_split: args.qg_split,
            };
            pfsoln(&mut case, &order, &y_bus, &y_f, &y_t, &v, &opt)?;
            print!("{}", format_solution(&case));
        }
    }

    Ok(())
}
