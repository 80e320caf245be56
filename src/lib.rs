#[macro_use]
extern crate log;

use std::io::Write;
use std::{fs, io, path};

use crate::sat::{dimacs, SolveRes, Stats};
use crate::sat::cdcl::{BranchingRule, Settings, Solver};

pub mod sat;
pub(crate) mod util;


pub struct RunOptions {
    pub cnf_path: path::PathBuf,
    /// One solver run per entry, in order.
    pub heuristics: Vec<BranchingRule>,
    pub stats_path: Option<path::PathBuf>,
    pub settings: Settings,
}


/// Parse the problem once, then run a fresh solver per requested heuristic.
pub fn run(options: RunOptions) -> io::Result<()> {
    let initial_time = time::precise_time_s();
    let formula = dimacs::parse_file(&options.cnf_path)?;
    let parse_time = time::precise_time_s() - initial_time;

    info!("============================[ Problem Statistics ]=============================");
    info!("|  Number of variables:  {:12}                                         |", formula.num_vars);
    info!("|  Number of clauses:    {:12}                                         |", formula.clauses.len());
    info!("|  Parse time:           {:12.2} s                                       |", parse_time);
    info!("===============================================================================");
    info!("Running {} heuristic(s)", options.heuristics.len());

    for &rule in options.heuristics.iter() {
        run_one(&formula, rule, &options)?;
    }

    Ok(())
}

fn run_one(formula: &dimacs::Formula, rule: BranchingRule, options: &RunOptions) -> io::Result<()> {
    info!("===============================[ {:^8} ]=====================================", rule.name());

    let settings = Settings {
        heuristic: rule,
        ..options.settings
    };
    let mut solver = Solver::new(formula.num_vars, settings);
    for index in 0..formula.clauses.len() {
        solver.add_clause(&formula.lits_of(index));
    }

    let solve_start = time::precise_time_s();
    let result = solver.solve();
    let solve_time = time::precise_time_s() - solve_start;

    let stats = solver.stats();
    match result {
        SolveRes::SAT(ref model) => {
            assert!(dimacs::check_model(formula, model), "SELF-CHECK FAILED");
            let stdout = io::stdout();
            let mut out = stdout.lock();
            dimacs::write_model(&mut out, model)?;
            writeln!(out, "SATISFIABLE")?;
        }
        SolveRes::UnSAT => {
            println!("UNSATISFIABLE");
        }
        SolveRes::Interrupted => {
            println!("INDETERMINATE");
        }
    }

    print_stats(&stats, solve_time);
    info!(
        "RESULT,heuristic={},seed={},instance={},solved={},time_s={:.3}",
        rule.name(),
        options.settings.seed,
        options.cnf_path.display(),
        match result {
            SolveRes::Interrupted => 0,
            _ => 1,
        },
        solve_time
    );

    if let Some(ref stats_path) = options.stats_path {
        export_stats_csv(
            stats_path,
            rule,
            options.settings.seed,
            &options.cnf_path,
            result.verdict(),
            solve_time,
            &stats,
        )?;
    }

    Ok(())
}

fn print_stats(stats: &Stats, solve_time: f64) {
    info!("restarts              : {:<12}", stats.restarts);
    info!("conflicts             : {:<12}   ({:.0} /sec)", stats.conflicts, (stats.conflicts as f64) / solve_time);
    info!("decisions             : {:<12}   ({:.0} /sec)", stats.decisions, (stats.decisions as f64) / solve_time);
    info!("propagations          : {:<12}   ({:.0} /sec)", stats.propagations, (stats.propagations as f64) / solve_time);
    info!("learnt clauses        : {:<12}   ({} reductions)", stats.learnts_added, stats.reduces);
    info!("clause inspections    : {:<12}   ({} watch moves)", stats.clause_inspections, stats.watch_moves);
    info!("BCP time              : {} ms", stats.t_bcp_ms);
    info!("analyze time          : {} ms", stats.t_analyze_ms);
    if let Some(mem_used) = util::mem_used_peak() {
        info!("Memory used           : {:.2} MB", (mem_used as f64) / 1024.0);
    }
    info!("CPU time              : {:.3} s", solve_time);
    info!("");
}

/// Append one row per run; the header is written when the file appears.
fn export_stats_csv(
    path: &path::Path,
    rule: BranchingRule,
    seed: u64,
    instance: &path::Path,
    verdict: &str,
    solve_time: f64,
    stats: &Stats,
) -> io::Result<()> {
    let fresh = !path.exists();
    let mut file = fs::OpenOptions::new().create(true).append(true).open(path)?;
    if fresh {
        writeln!(
            file,
            "heuristic,seed,instance,verdict,time_s,decisions,conflicts,propagations,\
             learnts,restarts,reduces,bcp_ms,analyze_ms"
        )?;
    }
    writeln!(
        file,
        "{},{},{},{},{:.3},{},{},{},{},{},{},{},{}",
        rule.name(),
        seed,
        instance.display(),
        verdict,
        solve_time,
        stats.decisions,
        stats.conflicts,
        stats.propagations,
        stats.learnts_added,
        stats.restarts,
        stats.reduces,
        stats.t_bcp_ms,
        stats.t_analyze_ms
    )?;
    Ok(())
}
