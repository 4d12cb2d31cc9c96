//! Bisection search for the extreme feasible value of a trim parameter.
//!
//! This is a feasibility-boundary search, not a root find: each evaluation
//! either trims or it does not, and the bracket shrinks around the boundary
//! between the two regions.

use thiserror::Error;

use crate::oracle::{Oracle, OracleError};
use crate::problem::{TrimOutcome, TrimProblem, TrimSolution, WarmStart};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Feasible region abuts `lo`; push toward `hi`.
    Maximize,
    /// Feasible region abuts `hi`; push toward `lo`.
    Minimize,
}

#[derive(Debug, Error)]
pub enum SolverError {
    #[error("no feasible solution in [{lo}, {hi}] after {evaluations} evaluations")]
    NoFeasibleSolution {
        lo: f64,
        hi: f64,
        evaluations: usize,
    },
    #[error(transparent)]
    Oracle(#[from] OracleError),
}

#[derive(Debug, Clone)]
pub struct BinarySolution {
    /// Last surviving feasible parameter value.
    pub value: f64,
    pub solution: TrimSolution,
    pub iterations: usize,
}

#[derive(Debug, Clone)]
pub struct BinarySearch {
    pub direction: Direction,
    pub guess: f64,
    pub lo: f64,
    pub hi: f64,
    pub tol: f64,
    pub max_iter: usize,
}

impl BinarySearch {
    /// Locate the extreme feasible value of the problem's parameter.
    ///
    /// The initial guess is evaluated first, then bracket midpoints. A
    /// successful trim advances the feasible bound to the evaluated point
    /// and becomes the current best; a divergent one pulls the opposite
    /// bound in. Stops when the bracket is narrower than `tol` or the
    /// iteration cap is hit. The last successful solve leaves its snapshot
    /// and warm start in the returned solution.
    pub fn solve<O: Oracle>(
        &self,
        problem: &TrimProblem,
        fdm: &mut O,
        mut warm: Option<WarmStart>,
    ) -> Result<BinarySolution, SolverError> {
        let mut lo = self.lo;
        let mut hi = self.hi;
        let mut best: Option<(f64, TrimSolution)> = None;
        let mut evaluations = 0usize;
        let mut x = self.guess.clamp(lo, hi);

        loop {
            evaluations += 1;
            problem.configure(fdm, x)?;
            match problem.solve(fdm, warm.as_ref())? {
                TrimOutcome::Trimmed(solution) => {
                    warm = Some(solution.warm);
                    match self.direction {
                        Direction::Maximize => lo = x,
                        Direction::Minimize => hi = x,
                    }
                    best = Some((x, solution));
                }
                TrimOutcome::Diverged => match self.direction {
                    Direction::Maximize => hi = x,
                    Direction::Minimize => lo = x,
                },
            }

            if hi - lo < self.tol || evaluations >= self.max_iter {
                break;
            }
            x = 0.5 * (lo + hi);
        }

        match best {
            Some((value, solution)) => Ok(BinarySolution {
                value,
                solution,
                iterations: evaluations,
            }),
            None => Err(SolverError::NoFeasibleSolution {
                lo: self.lo,
                hi: self.hi,
                evaluations,
            }),
        }
    }
}
