use crate::quark::StringTable;

use super::model::Model;

/// Per-call decoding lattice.
///
/// Transition scores stay in the model; the lattice only holds what depends
/// on the input sequence.
#[derive(Debug)]
pub(crate) struct Lattice {
    /// The total number of distinct labels (L).
    pub num_labels: usize,
    /// The number of items (T) in the sequence.
    pub num_items: usize,
    /**
     * State scores.
     *  This is a [T][L] matrix whose element [t][l] presents the log emission
     *  probability of the item #t under label #l.
     */
    pub state: Vec<f64>,
    /**
     * Viterbi scores.
     *  This is a [T][L] matrix whose element [t][l] presents the best log
     *  probability of a path starting at START and arriving at (t, l).
     */
    pub best: Vec<f64>,
    /**
     * Backward edges.
     *  This is a [T][L] matrix whose element [t][j] represents the label #i
     *  that yields the maximum score to arrive at (t, j).
     */
    pub backward_edge: Vec<usize>,
}

impl Lattice {
    /// Builds the lattice of an observation sequence given as emission columns.
    pub fn new<M: Model + ?Sized>(model: &M, columns: &[usize]) -> Self {
        let L = model.labels().len();
        let T = columns.len();
        let mut state = vec![0.0; T * L];
        for (t, &column) in columns.iter().enumerate() {
            for j in 0..L {
                state[L * t + j] = model.log_emission(j, column);
            }
        }
        Self {
            num_labels: L,
            num_items: T,
            state,
            best: vec![f64::NEG_INFINITY; T * L],
            backward_edge: vec![0; T * L],
        }
    }

    /// Fills the lattice and writes the best path into `labels`, returning its log probability.
    ///
    /// Labels are scanned in id order and only a strictly greater score replaces
    /// the current best, so the lowest label id wins every tie. When all
    /// candidates have probability zero, label #0 is chosen.
    pub fn viterbi<M: Model + ?Sized>(&mut self, model: &M, labels: &mut [usize]) -> f64 {
        let T = self.num_items;
        let L = self.num_labels;
        debug_assert_eq!(labels.len(), T);
        let start = model.start();

        /* Compute the scores at (0, *). */
        for j in 0..L {
            self.best[j] = model.log_transition(start, j) + self.state[j];
        }

        /* Compute the scores at (t, *). */
        for t in 1..T {
            for j in 0..L {
                let mut max_score = f64::NEG_INFINITY;
                let mut argmax_score = 0;
                for i in 0..L {
                    /* Transit from (t-1, i) to (t, j). */
                    let score = self.best[L * (t - 1) + i] + model.log_transition(i, j);
                    if max_score < score {
                        max_score = score;
                        argmax_score = i;
                    }
                }
                /* Backward link (#t, #j) -> (#t-1, #i). */
                self.backward_edge[L * t + j] = argmax_score;
                /* Add the state score on (t, j). */
                self.best[L * t + j] = max_score + self.state[L * t + j];
            }
        }

        /* Find the node (#T-1, #i) with the maximum score. */
        let mut max_score = f64::NEG_INFINITY;
        let mut last = 0;
        for i in 0..L {
            let score = self.best[L * (T - 1) + i];
            if max_score < score {
                max_score = score;
                last = i;
            }
        }
        self.backtrack(last, labels);
        max_score
    }

    /// Tags labels by tracing the backward links from `last` at item #T-1.
    pub fn backtrack(&self, last: usize, labels: &mut [usize]) {
        let T = self.num_items;
        let L = self.num_labels;
        labels[T - 1] = last;
        for t in (0..T - 1).rev() {
            labels[t] = self.backward_edge[L * (t + 1) + labels[t + 1]];
        }
    }

    /// Joint log probability of the sequence and the label path `labels`.
    pub fn score<M: Model + ?Sized>(&self, model: &M, labels: &[usize]) -> f64 {
        let L = self.num_labels;
        let mut prev = model.start();
        let mut r = 0.0;
        for (t, &j) in labels.iter().enumerate() {
            r += model.log_transition(prev, j) + self.state[L * t + j];
            prev = j;
        }
        r
    }

    /// Log probability of the sequence summed over all label paths (forward algorithm).
    pub fn lognorm<M: Model + ?Sized>(&self, model: &M) -> f64 {
        let T = self.num_items;
        let L = self.num_labels;
        let start = model.start();

        let mut alpha: Vec<f64> = (0..L).map(|j| model.log_transition(start, j) + self.state[j]).collect();
        let mut row = vec![0.0; L];
        let mut work = vec![0.0; L];
        for t in 1..T {
            for j in 0..L {
                for i in 0..L {
                    work[i] = alpha[i] + model.log_transition(i, j);
                }
                row[j] = log_sum_exp(&work) + self.state[L * t + j];
            }
            std::mem::swap(&mut alpha, &mut row);
        }
        log_sum_exp(&alpha)
    }
}

fn log_sum_exp(v: &[f64]) -> f64 {
    let max = v.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == f64::NEG_INFINITY {
        return max;
    }
    max + v.iter().map(|x| (x - max).exp()).sum::<f64>().ln()
}
