use std::str;

use crate::sat::formula::{Lit, Var, VarHeap, VarVec};
use crate::sat::formula::assignment::Assignment;
use crate::util::Random;


#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum BranchingRule {
    Vsids,
    JeroslowWang,
    Random,
}

impl BranchingRule {
    pub fn name(&self) -> &'static str {
        match *self {
            BranchingRule::Vsids => "vsids",
            BranchingRule::JeroslowWang => "jw",
            BranchingRule::Random => "random",
        }
    }
}

impl str::FromStr for BranchingRule {
    type Err = String;

    fn from_str(s: &str) -> Result<BranchingRule, String> {
        match s.to_ascii_lowercase().as_str() {
            "vsids" => Ok(BranchingRule::Vsids),
            "jw" | "jeroslow" | "jeroslow_wang" => Ok(BranchingRule::JeroslowWang),
            "random" => Ok(BranchingRule::Random),
            _ => Err(format!("unknown heuristic '{}'", s)),
        }
    }
}


enum Strategy {
    Vsids {
        activity: VarVec<f64>,
        var_inc: f64,
        var_decay: f64,
        queue: VarHeap,
    },
    JeroslowWang {
        pos: VarVec<f64>,
        neg: VarVec<f64>,
    },
    Random {
        rand: Random,
    },
}


/// Branching strategy state behind a shared picking interface. All three
/// strategies defer to the saved phase of the chosen variable when one
/// exists; only when the variable was never assigned does the strategy's
/// recommended polarity apply.
pub struct DecisionHeuristic {
    n_vars: usize,
    strategy: Strategy,
}

impl DecisionHeuristic {
    pub fn new(rule: BranchingRule, n_vars: usize, var_decay: f64, seed: u64) -> DecisionHeuristic {
        let strategy = match rule {
            BranchingRule::Vsids => {
                assert!(0.0 < var_decay && var_decay < 1.0);
                let activity = VarVec::filled(n_vars);
                let mut queue = VarHeap::new();
                {
                    let act = &activity;
                    queue.heapify_from(
                        (0..n_vars).map(Var::from_index).collect(),
                        |a, b| act[*a] > act[*b],
                    );
                }
                Strategy::Vsids {
                    activity,
                    var_inc: 1.0,
                    var_decay,
                    queue,
                }
            }

            BranchingRule::JeroslowWang => Strategy::JeroslowWang {
                pos: VarVec::filled(n_vars),
                neg: VarVec::filled(n_vars),
            },

            BranchingRule::Random => Strategy::Random {
                rand: Random::new(seed),
            },
        };

        DecisionHeuristic { n_vars, strategy }
    }

    /// Fold a freshly attached clause into the static scores.
    pub fn on_new_clause(&mut self, lits: &[Lit]) {
        if let Strategy::JeroslowWang { pos, neg } = &mut self.strategy {
            let weight = 0.5f64.powi(lits.len() as i32);
            for &lit in lits {
                if lit.is_neg() {
                    neg[lit.var()] += weight;
                } else {
                    pos[lit.var()] += weight;
                }
            }
        }
    }

    /// Bump a variable met during conflict analysis and sift it up,
    /// inserting it into the queue when absent.
    pub fn bump(&mut self, v: Var) {
        if let Strategy::Vsids {
            activity,
            var_inc,
            queue,
            ..
        } = &mut self.strategy
        {
            activity[v] += *var_inc;
            if activity[v] > 1e100 {
                for act in activity.iter_mut() {
                    *act *= 1e-100;
                }
                *var_inc *= 1e-100;
            }

            let act = &*activity;
            if !queue.update(&v, |a, b| act[*a] > act[*b]) {
                queue.insert(v, |a, b| act[*a] > act[*b]);
            }
        }
    }

    pub fn decay(&mut self) {
        if let Strategy::Vsids {
            var_inc, var_decay, ..
        } = &mut self.strategy
        {
            *var_inc /= *var_decay;
        }
    }

    /// A variable became unassigned by backtracking.
    pub fn on_unassign(&mut self, v: Var) {
        if let Strategy::Vsids {
            activity, queue, ..
        } = &mut self.strategy
        {
            let act = &*activity;
            queue.insert(v, |a, b| act[*a] > act[*b]);
        }
    }

    /// Pick the next decision literal, or `None` when every variable is
    /// assigned.
    pub fn pick(&mut self, assigns: &Assignment) -> Option<Lit> {
        let suggestion = match &mut self.strategy {
            Strategy::Vsids { activity, queue, .. } => {
                // Assigned entries are dropped; an unassigned top is
                // returned while staying in the queue.
                loop {
                    match queue.peek() {
                        None => break None,
                        Some(v) if assigns.is_undef(v) => break Some((v, false)),
                        Some(_) => {
                            let act = &*activity;
                            queue.pop(|a, b| act[*a] > act[*b]);
                        }
                    }
                }
            }

            Strategy::JeroslowWang { pos, neg } => {
                let mut best: Option<(Var, f64, f64, f64)> = None;
                for index in 0..self.n_vars {
                    let v = Var::from_index(index);
                    if !assigns.is_undef(v) {
                        continue;
                    }
                    let (p, n) = (pos[v], neg[v]);
                    let sum = p + n;
                    let mx = p.max(n);
                    let better = match best {
                        None => true,
                        Some((_, bsum, bmx, bp)) => {
                            sum > bsum
                                || (sum == bsum && (mx > bmx || (mx == bmx && p > bp)))
                        }
                    };
                    if better {
                        best = Some((v, sum, mx, p));
                    }
                }
                best.map(|(v, _, _, p)| (v, neg[v] > p))
            }

            Strategy::Random { rand } => {
                let unassigned = (0..self.n_vars)
                    .map(Var::from_index)
                    .filter(|&v| assigns.is_undef(v))
                    .count();
                if unassigned == 0 {
                    None
                } else {
                    let k = rand.irand(unassigned);
                    (0..self.n_vars)
                        .map(Var::from_index)
                        .filter(|&v| assigns.is_undef(v))
                        .nth(k)
                        .map(|v| (v, false))
                }
            }
        };

        // A stale suggestion falls back to the first unassigned variable.
        let (v, rec_neg) = match suggestion {
            Some((v, rec_neg)) if assigns.is_undef(v) => (v, rec_neg),
            _ => {
                let v = (0..self.n_vars)
                    .map(Var::from_index)
                    .find(|&v| assigns.is_undef(v))?;
                (v, false)
            }
        };

        let neg = match assigns.saved_phase(v) {
            Some(phase) => !phase,
            None => rec_neg,
        };
        Some(v.lit(neg))
    }
}
