use clap::Parser;
use stock_cutter::alns;
use stock_cutter::column_generation::DEFAULT_ITERATIONS;
use stock_cutter::job::{Backend, Cut, CutJob, CutPlan};
use stock_cutter::render;
use stock_cutter::solver::{DEFAULT_MAX_EXACT_UNITS, Model};
use tracing::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelChoice {
    ColumnGeneration,
    Exact,
    Auto,
    Alns,
}

#[derive(Parser)]
#[command(
    name = "stock_cutter",
    about = "1D cutting stock optimizer for bars, pipes and boards"
)]
struct Cli {
    /// Stock length (e.g. 6000)
    #[arg(long)]
    stock: f64,

    /// Cuts as LEN:qty (e.g. 1200:4 850.5:2)
    #[arg(long = "cuts", num_args = 1..)]
    cuts: Vec<String>,

    /// Blade kerf consumed by every cut (default: 0)
    #[arg(long, default_value_t = 0.0)]
    kerf: f64,

    /// Model: cg, exact, auto, or alns
    #[arg(long, default_value = "cg", value_parser = parse_model)]
    model: ModelChoice,

    /// Pricing rounds for column generation
    #[arg(long, default_value_t = DEFAULT_ITERATIONS)]
    iterations: usize,

    /// Iterations of the alns heuristic
    #[arg(long, default_value_t = alns::DEFAULT_ITERATIONS)]
    alns_iterations: usize,

    /// Seed of the alns heuristic
    #[arg(long, default_value_t = alns::DEFAULT_SEED)]
    seed: u64,

    /// Largest instance (by unit upper bound) that auto sends to the exact model
    #[arg(long, default_value_t = DEFAULT_MAX_EXACT_UNITS)]
    max_exact_units: usize,

    /// Show an ASCII bar of each stick
    #[arg(long)]
    layout: bool,

    /// Print the plan as JSON
    #[arg(long)]
    json: bool,

    /// Log solver progress to stderr
    #[arg(long)]
    verbose: bool,
}

impl Cli {
    fn backend(&self) -> Backend {
        match self.model {
            ModelChoice::ColumnGeneration => Backend::Lp(Model::ColumnGeneration {
                iterations: self.iterations,
            }),
            ModelChoice::Exact => Backend::Lp(Model::Exact),
            ModelChoice::Auto => Backend::Lp(Model::Auto {
                iterations: self.iterations,
                max_exact_units: self.max_exact_units,
            }),
            ModelChoice::Alns => Backend::Alns {
                iterations: self.alns_iterations,
                seed: self.seed,
            },
        }
    }
}

fn parse_model(s: &str) -> Result<ModelChoice, String> {
    match s {
        "cg" => Ok(ModelChoice::ColumnGeneration),
        "exact" => Ok(ModelChoice::Exact),
        "auto" => Ok(ModelChoice::Auto),
        "alns" => Ok(ModelChoice::Alns),
        _ => Err(format!(
            "invalid model '{}', expected: cg, exact, auto, or alns",
            s
        )),
    }
}

fn parse_cut(s: &str) -> Result<Cut, String> {
    let (length, qty) = s
        .split_once(':')
        .ok_or_else(|| format!("invalid cut '{}', expected LEN:qty", s))?;
    let length = length
        .parse::<f64>()
        .map_err(|_| format!("invalid length in '{}'", s))?;
    let qty = qty
        .parse::<u32>()
        .map_err(|_| format!("invalid quantity in '{}'", s))?;
    Ok(Cut::new(length, qty))
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn print_plan(plan: &CutPlan, layout: bool) {
    for (i, stick) in plan.sticks.iter().enumerate() {
        let cuts: Vec<String> = stick.cuts.iter().map(|c| c.to_string()).collect();
        println!(
            "Stick {}: {} ({:.1}% used, {} remaining)",
            i + 1,
            cuts.join(" + "),
            stick.usage_percent(plan.stock_length),
            stick.remaining,
        );
        if layout {
            print!("{}", render::render_stick(plan.stock_length, &stick.cuts));
        }
    }
    println!();

    println!(
        "Summary: {} stick{} used, {:.1}% waste ({})",
        plan.stick_count(),
        if plan.stick_count() == 1 { "" } else { "s" },
        plan.waste_percent(),
        plan.status,
    );
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_max_level(level)
        .init();

    let cuts: Vec<Cut> = cli
        .cuts
        .iter()
        .map(|c| parse_cut(c))
        .collect::<Result<Vec<_>, _>>()
        .unwrap_or_else(|e| fail(e));

    let job = CutJob::new(cli.stock, cli.kerf, cuts).backend(cli.backend());
    let plan = job.plan().unwrap_or_else(|e| fail(e));

    if !plan.status.is_success() {
        fail(format_args!("no cutting plan found ({})", plan.status));
    }

    if cli.json {
        match serde_json::to_string_pretty(&plan) {
            Ok(json) => println!("{}", json),
            Err(e) => fail(e),
        }
    } else {
        print_plan(&plan, cli.layout);
    }
}
