//! LBG codebook training
//!
//! The codebook grows from the centroid of all blocks by repeated binary
//! splitting, with one assign/refine pass after every split, and is then
//! refined by Lloyd iteration until the codewords stop changing.

use crate::distance::{centroid, distance};
use crate::search::{CodewordSearch, LinearSearch};
use crate::{Block, Result, VqConfig, VqError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

/// Statistics from one training run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Split rounds performed
    pub split_rounds: usize,
    /// Lloyd iterations in the convergence phase
    pub iterations: usize,
    /// Whether the codewords reached a fixed point before the iteration cap
    pub converged: bool,
    /// Sum of squared distances between blocks and their codewords
    pub distortion: f64,
    /// Distortion per sample
    pub mse: f64,
    /// Cluster size distribution (min, max, mean)
    pub usage_distribution: (usize, usize, f64),
}

/// Result of training: codewords plus the cluster each block ended up in
#[derive(Debug, Clone)]
pub struct TrainedCodebook {
    /// Codewords in index order
    pub codewords: Vec<Block>,
    /// `assignment[i]` is the codeword index of block `i`
    pub assignment: Vec<usize>,
    /// Training statistics
    pub stats: TrainingStats,
}

impl TrainedCodebook {
    /// Number of blocks assigned to each codeword
    pub fn cluster_sizes(&self) -> Vec<usize> {
        let mut counts = vec![0usize; self.codewords.len()];
        for &c in &self.assignment {
            if let Some(count) = counts.get_mut(c) {
                *count += 1;
            }
        }
        counts
    }
}

/// Linde-Buzo-Gray codebook trainer
#[derive(Debug, Clone)]
pub struct LbgTrainer<S = LinearSearch> {
    num_codewords: usize,
    max_iterations: usize,
    parallel: bool,
    search: S,
}

impl LbgTrainer<LinearSearch> {
    /// Create a trainer using linear nearest-codeword search
    pub fn new(num_codewords: usize, max_iterations: usize) -> Self {
        Self {
            num_codewords,
            max_iterations,
            parallel: false,
            search: LinearSearch,
        }
    }

    /// Create a trainer from a compression config
    pub fn from_config(config: &VqConfig) -> Self {
        Self::new(config.num_codewords, config.max_iterations).parallel(config.parallel)
    }
}

impl<S: CodewordSearch> LbgTrainer<S> {
    /// Swap the nearest-codeword search
    pub fn with_search<T: CodewordSearch>(self, search: T) -> LbgTrainer<T> {
        LbgTrainer {
            num_codewords: self.num_codewords,
            max_iterations: self.max_iterations,
            parallel: self.parallel,
            search,
        }
    }

    /// Run nearest-codeword search on the rayon pool
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Largest codebook the index width of `num_codewords` can address
    fn capacity(&self) -> usize {
        self.num_codewords.max(1).next_power_of_two()
    }

    /// Train a codebook on `blocks`
    pub fn train(&self, blocks: &[Block]) -> Result<TrainedCodebook> {
        if self.num_codewords == 0 {
            return Err(VqError::InvalidConfig(
                "num_codewords must be at least 1".into(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(VqError::InvalidConfig(
                "max_iterations must be at least 1".into(),
            ));
        }
        if blocks.is_empty() {
            return Err(VqError::dimensions("no blocks to train on"));
        }

        let capacity = self.capacity();
        let mut codewords = vec![centroid(blocks)?];
        let mut assignment = vec![0usize; blocks.len()];
        let mut stats = TrainingStats::default();

        // Split phase
        while codewords.len() < self.num_codewords {
            let before = codewords.len();
            let selected = self.select_for_split(&codewords, &assignment, blocks, capacity);
            let children = split(&codewords, &selected);

            let (next, next_assignment) = self.refine(&children, blocks)?;
            stats.split_rounds += 1;

            debug!(
                round = stats.split_rounds,
                before,
                children = children.len(),
                after = next.len(),
                "split round"
            );

            let grew = next.len() > before;
            codewords = next;
            assignment = next_assignment;

            if !grew {
                warn!(
                    size = codewords.len(),
                    target = self.num_codewords,
                    "split produced no new clusters, stopping early"
                );
                break;
            }
        }

        // Convergence phase
        for _ in 0..self.max_iterations {
            stats.iterations += 1;
            let (next, next_assignment) = self.refine(&codewords, blocks)?;

            let unchanged = next == codewords;
            trace!(
                iteration = stats.iterations,
                size = next.len(),
                unchanged,
                "lloyd iteration"
            );

            codewords = next;
            assignment = next_assignment;

            if unchanged {
                stats.converged = true;
                break;
            }
        }

        if !stats.converged {
            warn!(
                max_iterations = self.max_iterations,
                "codebook did not converge before the iteration cap"
            );
            assignment = self.search.assign(&codewords, blocks, self.parallel)?;
        }

        stats.distortion = total_distortion(&codewords, &assignment, blocks);
        let samples = blocks.len() * blocks[0].data().len();
        stats.mse = if samples > 0 {
            stats.distortion / samples as f64
        } else {
            0.0
        };

        let mut trained = TrainedCodebook {
            codewords,
            assignment,
            stats,
        };
        let sizes = trained.cluster_sizes();
        let min = sizes.iter().copied().min().unwrap_or(0);
        let max = sizes.iter().copied().max().unwrap_or(0);
        let mean = blocks.len() as f64 / sizes.len().max(1) as f64;
        trained.stats.usage_distribution = (min, max, mean);

        info!(
            blocks = blocks.len(),
            codewords = trained.codewords.len(),
            target = self.num_codewords,
            split_rounds = trained.stats.split_rounds,
            iterations = trained.stats.iterations,
            converged = trained.stats.converged,
            mse = trained.stats.mse,
            "trained codebook"
        );

        Ok(trained)
    }

    /// One Lloyd pass: assign every block to its nearest codeword, then
    /// replace each codeword with the centroid of its cluster.
    ///
    /// Codewords that receive no blocks are dropped; the survivors keep
    /// their relative order and the returned assignment is renumbered to
    /// match.
    fn refine(&self, codewords: &[Block], blocks: &[Block]) -> Result<(Vec<Block>, Vec<usize>)> {
        let assignment = self.search.assign(codewords, blocks, self.parallel)?;

        let mut members: Vec<Vec<&Block>> = vec![Vec::new(); codewords.len()];
        for (block, &c) in blocks.iter().zip(assignment.iter()) {
            members[c].push(block);
        }

        let mut remap = vec![usize::MAX; codewords.len()];
        let mut next = Vec::with_capacity(codewords.len());
        for (i, cluster) in members.iter().enumerate() {
            if cluster.is_empty() {
                continue;
            }
            remap[i] = next.len();
            next.push(centroid(cluster.iter().copied())?);
        }

        if next.len() < codewords.len() {
            debug!(
                dropped = codewords.len() - next.len(),
                "dropped empty clusters"
            );
        }

        let assignment = assignment.into_iter().map(|c| remap[c]).collect();
        Ok((next, assignment))
    }

    /// Decide which codewords to split this round.
    ///
    /// All of them while the doubled codebook fits in `capacity`; otherwise
    /// only the clusters with the highest distortion, so the codebook never
    /// outgrows its index width.
    fn select_for_split(
        &self,
        codewords: &[Block],
        assignment: &[usize],
        blocks: &[Block],
        capacity: usize,
    ) -> Vec<bool> {
        let room = capacity.saturating_sub(codewords.len());
        if room >= codewords.len() {
            return vec![true; codewords.len()];
        }

        let mut cluster_distortion = vec![0.0f64; codewords.len()];
        for (block, &c) in blocks.iter().zip(assignment.iter()) {
            cluster_distortion[c] += distance(block, &codewords[c]);
        }

        let mut order: Vec<usize> = (0..codewords.len()).collect();
        order.sort_by(|&a, &b| {
            cluster_distortion[b]
                .total_cmp(&cluster_distortion[a])
                .then(a.cmp(&b))
        });

        let mut selected = vec![false; codewords.len()];
        for &i in order.iter().take(room) {
            selected[i] = true;
        }
        selected
    }
}

/// Replace every selected codeword with its two children, `floor(v) - 1`
/// and `ceil(v) + 1` cell by cell, where the -1/+1 nudge only applies to
/// cells that are already integral. Unselected codewords pass through.
pub fn split(codewords: &[Block], selected: &[bool]) -> Vec<Block> {
    let mut children = Vec::with_capacity(codewords.len() * 2);

    for (codeword, &split_it) in codewords.iter().zip(selected.iter()) {
        if !split_it {
            children.push(codeword.clone());
            continue;
        }

        let (height, width) = codeword.shape();
        let mut low = Block::zeros(height, width);
        let mut high = Block::zeros(height, width);

        for ((l, h), &v) in low
            .data_mut()
            .iter_mut()
            .zip(high.data_mut().iter_mut())
            .zip(codeword.data().iter())
        {
            let mut f = v.floor();
            let mut c = v.ceil();
            if f == c {
                f -= 1.0;
                c += 1.0;
            }
            *l = f;
            *h = c;
        }

        children.push(low);
        children.push(high);
    }

    children
}

/// Sum of squared distances from each block to its assigned codeword
fn total_distortion(codewords: &[Block], assignment: &[usize], blocks: &[Block]) -> f64 {
    blocks
        .iter()
        .zip(assignment.iter())
        .filter_map(|(block, &c)| codewords.get(c).map(|cw| distance(block, cw)))
        .sum()
}
