extern crate clap;
extern crate env_logger;
extern crate log;

use std::io::Write;
use std::{path, process};

use ternsat::RunOptions;
use ternsat::sat::cdcl::{BranchingRule, Settings};


fn main() {
    let ls012 = ["0", "1", "2"];
    let matches = clap::App::new("ternsat")
        .version(clap::crate_version!())
        .about("CDCL SAT solver with selectable branching heuristics")
        .arg(clap::Arg::with_name("cnf").long("cnf").takes_value(true).default_value("problem.cnf").help("DIMACS CNF input file (gzip accepted)"))
        .arg(clap::Arg::with_name("heuristic").long("heuristic").takes_value(true).multiple(true).help("Branching heuristic: vsids, jw or random; repeatable or comma-separated, one run each"))
        .arg(clap::Arg::with_name("seed").long("seed").takes_value(true).help("PRNG seed for the random heuristic; 0 = unseeded"))
        .arg(clap::Arg::with_name("stats").long("stats").takes_value(true).help("Append a CSV statistics row per run to this file"))
        .arg(clap::Arg::with_name("verb").long("verb").takes_value(true).possible_values(&ls012).help("Verbosity level (0=silent, 1=some, 2=more)"))
        .arg(clap::Arg::with_name("var-decay").long("var-decay").takes_value(true).help("The variable activity decay factor"))
        .arg(clap::Arg::with_name("cla-decay").long("cla-decay").takes_value(true).help("The clause activity decay factor"))
        .arg(clap::Arg::with_name("rfirst").long("rfirst").takes_value(true).help("The base restart interval"))
        .get_matches();

    {
        let mut builder = env_logger::Builder::new();
        builder.format(|buf, record| writeln!(buf, "{}", record.args()));
        builder.filter(
            None,
            matches
                .value_of("verb")
                .map(|v| match v {
                    "1" => log::LevelFilter::Info,
                    "2" => log::LevelFilter::Trace,
                    _ => log::LevelFilter::Off,
                })
                .unwrap_or(log::LevelFilter::Info),
        );
        builder.init();
    }

    let settings = {
        let mut s = Settings::default();

        for x in matches.value_of("seed").and_then(|s| s.parse().ok()).iter() {
            s.seed = *x;
        }

        for x in matches.value_of("var-decay").and_then(|s| s.parse().ok()).iter() {
            if 0.0 < *x && *x < 1.0 {
                s.var_decay = *x;
            }
        }

        for x in matches.value_of("cla-decay").and_then(|s| s.parse().ok()).iter() {
            if 0.0 < *x && *x < 1.0 {
                s.clause_decay = *x;
            }
        }

        for x in matches.value_of("rfirst").and_then(|s| s.parse().ok()).iter() {
            if 0.0 < *x {
                s.restart_base = *x;
            }
        }

        s
    };

    let heuristics = {
        let mut heuristics = Vec::new();
        if let Some(values) = matches.values_of("heuristic") {
            for value in values {
                for token in value.split(',').filter(|t| !t.is_empty()) {
                    match token.parse::<BranchingRule>() {
                        Ok(rule) => heuristics.push(rule),
                        Err(msg) => {
                            eprintln!("Error: {}", msg);
                            process::exit(1);
                        }
                    }
                }
            }
        }
        if heuristics.is_empty() {
            heuristics.push(BranchingRule::Vsids);
        }
        heuristics
    };

    let options = RunOptions {
        cnf_path: path::PathBuf::from(matches.value_of("cnf").unwrap()),
        heuristics,
        stats_path: matches.value_of("stats").map(path::PathBuf::from),
        settings,
    };

    if let Err(e) = ternsat::run(options) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
