use std::fmt;
use super::Lit;
use super::assignment::Assignment;


/// Stable handle into a `ClauseStore` slot. Handles to live clauses stay
/// valid across reductions; only deleted clauses give up their slot.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub struct ClauseRef(usize);

impl ClauseRef {
    #[inline]
    fn slot(&self) -> usize {
        self.0
    }
}


/// A disjunction of literals. The literal order is kept exactly as the
/// clause was given; the watched literals are named by slot index instead
/// of being swapped to the front.
pub struct Clause {
    lits: Box<[Lit]>,
    w0: usize,
    w1: usize,
    learnt: bool,
    lbd: usize,
    activity: f64,
}

impl Clause {
    fn new(lits: Box<[Lit]>, learnt: bool, lbd: usize) -> Clause {
        assert!(!lits.is_empty(), "empty clauses are never stored");
        let w1 = if lits.len() > 1 { 1 } else { 0 };
        Clause {
            lits,
            w0: 0,
            w1,
            learnt,
            lbd,
            activity: 0.0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lits.len()
    }

    #[inline]
    pub fn lits(&self) -> &[Lit] {
        &self.lits
    }

    #[inline]
    pub fn lit(&self, slot: usize) -> Lit {
        self.lits[slot]
    }

    #[inline]
    pub fn is_learnt(&self) -> bool {
        self.learnt
    }

    #[inline]
    pub fn lbd(&self) -> usize {
        self.lbd
    }

    #[inline]
    pub fn activity(&self) -> f64 {
        self.activity
    }

    /// The two watched slots. Equal for a unit clause, distinct otherwise.
    #[inline]
    pub fn watch_slots(&self) -> (usize, usize) {
        (self.w0, self.w1)
    }

    /// Repoint watch 0 or 1 at `slot`.
    #[inline]
    pub fn set_watch(&mut self, watch: usize, slot: usize) {
        debug_assert!(slot < self.lits.len());
        if watch == 0 {
            self.w0 = slot;
        } else {
            self.w1 = slot;
        }
        debug_assert!(self.lits.len() == 1 || self.w0 != self.w1);
    }
}

impl fmt::Debug for Clause {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(")?;
        let mut first = true;
        for lit in self.lits.iter() {
            if first {
                first = false;
            } else {
                write!(f, " ")?;
            }
            write!(f, "{:?}", lit)?;
        }
        write!(f, ")")
    }
}


/// Arena of clauses with tombstoned slots and a free list. Watch lists and
/// trail reasons hold `ClauseRef`s into it; deleting a clause never moves
/// the survivors.
pub struct ClauseStore {
    slots: Vec<Option<Clause>>,
    free: Vec<usize>,
    learnts: Vec<ClauseRef>,
    clause_inc: f64,
    clause_decay: f64,
    num_input: usize,
    num_learnt: usize,
}

impl ClauseStore {
    pub fn new(clause_decay: f64) -> ClauseStore {
        assert!(0.0 < clause_decay && clause_decay < 1.0);
        ClauseStore {
            slots: Vec::new(),
            free: Vec::new(),
            learnts: Vec::new(),
            clause_inc: 1.0,
            clause_decay,
            num_input: 0,
            num_learnt: 0,
        }
    }

    pub fn num_input(&self) -> usize {
        self.num_input
    }

    pub fn num_learnt(&self) -> usize {
        self.num_learnt
    }

    pub fn learnt_refs(&self) -> &[ClauseRef] {
        &self.learnts
    }

    pub fn alloc(&mut self, lits: Box<[Lit]>, learnt: bool, lbd: usize) -> ClauseRef {
        let clause = Clause::new(lits, learnt, lbd);
        let cr = match self.free.pop() {
            Some(slot) => {
                debug_assert!(self.slots[slot].is_none());
                self.slots[slot] = Some(clause);
                ClauseRef(slot)
            }
            None => {
                self.slots.push(Some(clause));
                ClauseRef(self.slots.len() - 1)
            }
        };
        if learnt {
            self.learnts.push(cr);
            self.num_learnt += 1;
        } else {
            self.num_input += 1;
        }
        cr
    }

    #[inline]
    pub fn view(&self, cr: ClauseRef) -> &Clause {
        self.slots[cr.slot()].as_ref().expect("reference to a deleted clause")
    }

    #[inline]
    pub fn edit(&mut self, cr: ClauseRef) -> &mut Clause {
        self.slots[cr.slot()].as_mut().expect("reference to a deleted clause")
    }

    pub fn bump(&mut self, cr: ClauseRef) {
        let inc = self.clause_inc;
        let new = {
            let c = self.edit(cr);
            c.activity += inc;
            c.activity
        };

        if new > 1e100 {
            for clause in self.slots.iter_mut().flatten() {
                clause.activity *= 1e-100;
            }
            self.clause_inc *= 1e-100;
        }
    }

    pub fn decay(&mut self) {
        self.clause_inc /= self.clause_decay;
    }

    /// Delete the worse half of the deletable learnt clauses. Deletable:
    /// learnt, longer than binary, LBD above 2 and not currently the reason
    /// of an assignment. Ranking, worst first: higher LBD, then lower
    /// activity, then larger size. `notify` sees each clause before its
    /// slot is freed so the caller can detach it from the watch lists.
    pub fn reduce<F: FnMut(&Clause, ClauseRef)>(
        &mut self,
        assigns: &Assignment,
        mut notify: F,
    ) -> usize {
        let mut cands: Vec<ClauseRef> = self
            .learnts
            .iter()
            .copied()
            .filter(|&cr| {
                let c = self.view(cr);
                debug_assert!(c.is_learnt());
                c.len() > 2 && c.lbd() > 2 && !is_locked(assigns, c, cr)
            })
            .collect();

        cands.sort_by(|&rx, &ry| {
            let x = self.view(rx);
            let y = self.view(ry);
            y.lbd()
                .cmp(&x.lbd())
                .then(x.activity().partial_cmp(&y.activity()).unwrap())
                .then(y.len().cmp(&x.len()))
        });
        cands.truncate(cands.len() / 2);

        for &cr in cands.iter() {
            notify(self.view(cr), cr);
            self.slots[cr.slot()] = None;
            self.free.push(cr.slot());
            self.num_learnt -= 1;
        }

        let slots = &self.slots;
        self.learnts.retain(|cr| slots[cr.slot()].is_some());

        cands.len()
    }
}

/// A clause is locked while it is the reason of a standing assignment. The
/// propagating literal of a clause is always one of its watched literals,
/// and that watch cannot move while the literal stays true.
fn is_locked(assigns: &Assignment, c: &Clause, cr: ClauseRef) -> bool {
    let (s0, s1) = c.watch_slots();
    for &lit in [c.lit(s0), c.lit(s1)].iter() {
        if assigns.is_true(lit) && assigns.reason_of(lit.var()) == Some(cr) {
            return true;
        }
    }
    false
}
