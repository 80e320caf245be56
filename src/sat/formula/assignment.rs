use std::{cmp, fmt};
use super::{Lit, Var};
use super::clause::ClauseRef;


#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[repr(u8)]
pub enum LitVal {
    Undef,
    False,
    True,
}


struct VarLine {
    value: LitVal,
    reason: Option<ClauseRef>,
    level: usize,
    phase: Option<bool>,
}


/// Tri-state assignment plus the trail: every assigned variable has a trail
/// entry carrying its decision level and reason (`None` marks a decision).
/// `qhead` is the propagation cursor into the trail; it is clamped on
/// backtrack. The saved phase survives backtracking by design of the
/// phase-saving policy: it is written on every assignment and never cleared.
pub struct Assignment {
    lines: Vec<VarLine>,
    trail: Vec<Lit>,
    lim: Vec<usize>,
    qhead: usize,
}

impl Assignment {
    pub fn with_vars(n: usize) -> Assignment {
        let mut lines = Vec::with_capacity(n);
        for _ in 0..n {
            lines.push(VarLine {
                value: LitVal::Undef,
                reason: None,
                level: 0,
                phase: None,
            });
        }
        Assignment {
            lines,
            trail: Vec::new(),
            lim: Vec::new(),
            qhead: 0,
        }
    }


    #[inline]
    pub fn number_of_vars(&self) -> usize {
        self.lines.len()
    }

    #[inline]
    pub fn number_of_assigns(&self) -> usize {
        self.trail.len()
    }

    #[inline]
    pub fn decision_level(&self) -> usize {
        self.lim.len()
    }

    #[inline]
    pub fn is_ground_level(&self) -> bool {
        self.lim.is_empty()
    }

    #[inline]
    pub fn new_decision_level(&mut self) {
        self.lim.push(self.trail.len());
    }


    #[inline]
    pub fn assign_lit(&mut self, lit: Lit, reason: Option<ClauseRef>) {
        let level = self.lim.len();
        let line = &mut self.lines[lit.var().index()];
        assert!(line.value == LitVal::Undef);
        line.value = if lit.is_neg() { LitVal::False } else { LitVal::True };
        line.reason = reason;
        line.level = level;
        line.phase = Some(!lit.is_neg());
        self.trail.push(lit);
    }

    /// Pop every trail entry above `target_level`, newest first, invoking
    /// `f` on each popped literal.
    pub fn rewind_until_level<F: FnMut(Lit)>(&mut self, target_level: usize, mut f: F) {
        while self.lim.len() > target_level {
            let bottom = self.lim.pop().unwrap();
            while self.trail.len() > bottom {
                let lit = self.trail.pop().unwrap();
                f(lit);

                let line = &mut self.lines[lit.var().index()];
                line.value = LitVal::Undef;
                line.reason = None;
                line.level = 0;
            }
        }

        self.qhead = cmp::min(self.qhead, self.trail.len());
    }


    #[inline]
    pub fn dequeue(&mut self) -> Option<Lit> {
        if self.qhead < self.trail.len() {
            let p = self.trail[self.qhead];
            self.qhead += 1;
            Some(p)
        } else {
            None
        }
    }

    #[inline]
    pub fn assign_at(&self, index: usize) -> Lit {
        self.trail[index]
    }

    #[inline]
    pub fn trail(&self) -> &[Lit] {
        &self.trail
    }


    #[inline]
    pub fn value_of(&self, v: Var) -> LitVal {
        self.lines[v.index()].value
    }

    #[inline]
    pub fn of_lit(&self, lit: Lit) -> LitVal {
        match self.lines[lit.var().index()].value {
            LitVal::Undef => LitVal::Undef,
            value if lit.is_neg() => {
                if value == LitVal::True {
                    LitVal::False
                } else {
                    LitVal::True
                }
            }
            value => value,
        }
    }

    #[inline]
    pub fn is_undef(&self, v: Var) -> bool {
        self.lines[v.index()].value == LitVal::Undef
    }

    #[inline]
    pub fn is_true(&self, lit: Lit) -> bool {
        self.of_lit(lit) == LitVal::True
    }

    #[inline]
    pub fn is_false(&self, lit: Lit) -> bool {
        self.of_lit(lit) == LitVal::False
    }

    /// Level of the variable's current assignment; 0 when unassigned.
    #[inline]
    pub fn level_of(&self, v: Var) -> usize {
        self.lines[v.index()].level
    }

    /// Reason of the variable's current assignment; `None` for a decision
    /// and for unassigned variables.
    #[inline]
    pub fn reason_of(&self, v: Var) -> Option<ClauseRef> {
        self.lines[v.index()].reason
    }

    #[inline]
    pub fn saved_phase(&self, v: Var) -> Option<bool> {
        self.lines[v.index()].phase
    }
}

impl fmt::Debug for Assignment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for level in 0..1 + self.lim.len() {
            let l = if level > 0 { self.lim[level - 1] } else { 0 };
            let r = if level < self.lim.len() {
                self.lim[level]
            } else {
                self.trail.len()
            };

            if r > l {
                write!(f, "[{}:", level)?;
                for lit in self.trail[l..r].iter() {
                    write!(f, " {:?}", lit)?;
                }
                write!(f, " ]")?;
            }
        }

        Ok(())
    }
}


/// Number of distinct decision levels among the literals of a clause, with
/// unassigned variables counting at level 0. A unit clause gets 1.
pub fn clause_lbd(assigns: &Assignment, lits: &[Lit]) -> usize {
    let mut levels: Vec<usize> = lits.iter().map(|&l| assigns.level_of(l.var())).collect();
    levels.sort_unstable();
    levels.dedup();
    levels.len()
}


/// Read the model off a fully assigned formula.
pub fn extract_model(assigns: &Assignment) -> Vec<bool> {
    (0..assigns.number_of_vars())
        .map(|index| match assigns.value_of(Var::from_index(index)) {
            LitVal::True => true,
            LitVal::False => false,
            LitVal::Undef => panic!("model requested with unassigned variables"),
        })
        .collect()
}
