pub mod cdcl;
pub mod dimacs;
pub mod formula;


/// Per-run counters. The millisecond accumulators cover the two hot phases
/// and are maintained by scoped guards, so every exit path pays in.
#[derive(Default, Debug, Clone)]
pub struct Stats {
    pub decisions: u64,
    pub conflicts: u64,
    pub propagations: u64,
    pub learnts_added: u64,
    pub clause_inspections: u64,
    pub watch_moves: u64,
    pub restarts: u64,
    pub reduces: u64,
    pub t_bcp_ms: u64,
    pub t_analyze_ms: u64,
}


pub enum SolveRes {
    SAT(Vec<bool>),
    UnSAT,
    Interrupted,
}

impl SolveRes {
    pub fn verdict(&self) -> &'static str {
        match *self {
            SolveRes::SAT(_) => "SAT",
            SolveRes::UnSAT => "UNSAT",
            SolveRes::Interrupted => "INDET",
        }
    }
}
