//! Reachable states of the dining philosophers.
//!
//! Run with:
//! ```bash
//! cargo run --release --example philosophers -- 20 --saturate
//! ```

use clap::Parser;
use log::info;

use sdd_rs::config::SddConfig;
use sdd_rs::function::UserFunction;
use sdd_rs::order::{Order, OrderBuilder};
use sdd_rs::reference::Hom;
use sdd_rs::sdd::Manager;
use sdd_rs::values::ValueSet;

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Number of philosophers.
    #[arg(value_name = "INT", default_value = "10")]
    n: u32,

    /// Rewrite the transition relation for saturation.
    #[clap(long)]
    saturate: bool,

    /// Group the places of each philosopher in a hierarchical level.
    #[clap(long)]
    hierarchical: bool,

    /// Operation cache size (in bits, so the actual size is `2^size` entries).
    #[clap(long, value_name = "INT", default_value = "16")]
    cache_bits: usize,

    /// Write the resulting diagram in DOT format to this file.
    #[clap(long, value_name = "FILE")]
    dot: Option<std::path::PathBuf>,
}

fn consume() -> UserFunction {
    UserFunction::from_fn("consume", false, true, |values: &ValueSet| {
        values.iter().filter(|&v| v > 0).map(|v| v - 1).collect()
    })
}

fn produce() -> UserFunction {
    UserFunction::from_fn("produce", false, true, |values: &ValueSet| {
        values.iter().map(|v| v + 1).collect()
    })
}

/// Places: `think(i) = i`, `eat(i) = n + i`, `fork(i) = 2n + i`.
fn build_order(n: u32, hierarchical: bool) -> color_eyre::Result<Order> {
    let mut builder = OrderBuilder::new();
    for i in (0..n).rev() {
        if hierarchical {
            let mut inner = OrderBuilder::new();
            inner.push(2 * n + i).push(n + i).push(i);
            builder.push_nested(3 * n + i, inner);
        } else {
            builder.push(2 * n + i).push(n + i).push(i);
        }
    }
    Ok(builder.build()?)
}

fn transition(mgr: &Manager, order: &Order, steps: &[(u32, UserFunction)]) -> color_eyre::Result<Hom> {
    let mut res = mgr.identity();
    for (id, f) in steps {
        let h = mgr.function(order, *id, f.clone())?;
        res = mgr.composition(h, res);
    }
    Ok(res)
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let mgr = Manager::with_config(SddConfig::default().with_cache_bits(args.cache_bits))?;
    let n = args.n;
    let order = build_order(n, args.hierarchical)?;
    println!("order = {}", order);

    let mut ops = Vec::new();
    for i in 0..n {
        let (eat, left, right) = (n + i, 2 * n + i, 2 * n + (i + 1) % n);
        ops.push(transition(
            &mgr,
            &order,
            &[(i, consume()), (left, consume()), (right, consume()), (eat, produce())],
        )?);
        ops.push(transition(
            &mgr,
            &order,
            &[(eat, consume()), (i, produce()), (left, produce()), (right, produce())],
        )?);
    }

    let mut reach = mgr.fixpoint(mgr.sum(&order, &ops)?);
    if args.saturate {
        reach = mgr.rewrite(&order, reach);
    }
    info!("reach = {}", mgr.hom_to_string(reach));

    let initial = mgr.create_with(&order, |id| ValueSet::singleton(if id >= n && id < 2 * n { 0 } else { 1 }));
    let time_apply = std::time::Instant::now();
    let states = mgr.apply(&order, reach, initial)?;
    println!("Generated state space in {:.3} s", time_apply.elapsed().as_secs_f64());

    println!("states: {}", mgr.size(states));
    println!("nodes: {:?}", mgr.node_count(states));
    println!("stats: {:?}", mgr.stats());

    if let Some(path) = &args.dot {
        std::fs::write(path, mgr.to_dot(&[states])?)?;
        println!("Wrote {}", path.display());
    }

    mgr.deinit();

    let time_total = time_total.elapsed();
    println!("Done in {:.3} s", time_total.as_secs_f64());

    Ok(())
}
