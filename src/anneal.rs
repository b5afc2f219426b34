// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rand::Rng;

use crate::validate;
use crate::{
    Block, CostModel, Design, Evaluation, FloorplanError, Normalization, Perturbation, Snapshot,
};

/// Options controlling the annealing schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnealOptions {
    /// Starting temperature. Default: 1000.
    pub initial_temperature: f64,
    /// Multiplicative cooling factor applied after every iteration. Default:
    /// 0.99.
    pub cooling_rate: f64,
    /// Number of perturbations to try. Default: 100000.
    pub iterations: usize,
    /// Emit progress every this many iterations; 0 disables. Default: 10000.
    pub report_interval: usize,
    /// Random perturbations per block used to estimate the normalization
    /// constants. Default: 10.
    pub samples_per_block: usize,
    /// Stop early once this much wall-clock time has elapsed. Default: none.
    pub time_limit: Option<Duration>,
}

impl Default for AnnealOptions {
    fn default() -> Self {
        AnnealOptions {
            initial_temperature: 1000.0,
            cooling_rate: 0.99,
            iterations: 100_000,
            report_interval: 10_000,
            samples_per_block: 10,
            time_limit: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnealState {
    Initial,
    Iterating,
    Terminated,
}

/// Counters accumulated over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub iterations: usize,
    pub accepted: usize,
    /// Iterations whose perturbed state was feasible, accepted or not.
    pub feasible: usize,
    /// Iterations where the chosen operator found nothing to change.
    pub noops: usize,
    pub cancelled: bool,
}

impl SearchStats {
    pub fn acceptance_rate(&self) -> f64 {
        ratio(self.accepted, self.iterations)
    }

    pub fn feasibility_rate(&self) -> f64 {
        ratio(self.feasible, self.iterations)
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Probability of moving from a state of cost `current` to one of cost
/// `new` at the given temperature.
pub fn acceptance_probability(new: f64, current: f64, temperature: f64) -> f64 {
    if new <= current {
        1.0
    } else if temperature <= 0.0 {
        0.0
    } else {
        (-(new - current) / temperature).exp()
    }
}

/// Metropolis rule: `draw` is a uniform sample from `[0, 1)`.
pub fn accept(new: f64, current: f64, temperature: f64, draw: f64) -> bool {
    new <= current || draw < acceptance_probability(new, current, temperature)
}

/// What happened during one call to [`Annealer::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub perturbation: Perturbation,
    pub applied: bool,
    pub cost: f64,
    pub feasible: bool,
    pub accepted: bool,
    pub new_best: bool,
}

/// Final placement handed to the report writer.
#[derive(Debug, Clone)]
pub struct FloorplanResult {
    pub cost: f64,
    pub wirelength: i64,
    pub area: i64,
    pub width: i64,
    pub height: i64,
    pub runtime: Duration,
    /// `false` if no feasible placement was seen and this is the last
    /// current state instead.
    pub feasible: bool,
    pub blocks: Vec<Block>,
    pub stats: SearchStats,
}

/// Simulated-annealing search over B*-tree shapes.
pub struct Annealer<'a, R: Rng> {
    design: &'a Design,
    options: AnnealOptions,
    model: CostModel,
    rng: R,
    state: AnnealState,
    current: Snapshot,
    current_eval: Evaluation,
    current_feasible: bool,
    best: Option<(Snapshot, Evaluation)>,
    temperature: f64,
    stats: SearchStats,
    cancel: Option<Arc<AtomicBool>>,
    started: Instant,
}

impl<'a, R: Rng> Annealer<'a, R> {
    /// Builds and packs the initial tree and estimates the normalization
    /// constants.
    pub fn new(
        design: &'a Design,
        alpha: f64,
        options: AnnealOptions,
        mut rng: R,
    ) -> Result<Self, FloorplanError> {
        let started = Instant::now();
        // reject a bad alpha before spending time on sampling
        CostModel::new(alpha, Normalization::default())?;

        let mut current = Snapshot::new(design.blocks().to_vec());
        current.pack();

        let samples = options.samples_per_block * design.blocks().len();
        let norm = Normalization::sample(design, &mut current, samples, &mut rng);
        let model = CostModel::new(alpha, norm)?;

        let current_eval = model.evaluate(design, &current.blocks);
        let current_feasible = validate::is_feasible(&current.blocks, &design.outline());
        let best = current_feasible.then(|| (current.clone(), current_eval));
        log::debug!(
            "Initial floorplan: cost {:.4}, {}x{}, feasible {}",
            current_eval.cost,
            current_eval.width,
            current_eval.height,
            current_feasible
        );

        Ok(Annealer {
            design,
            temperature: options.initial_temperature,
            options,
            model,
            rng,
            state: AnnealState::Initial,
            current,
            current_eval,
            current_feasible,
            best,
            stats: SearchStats::default(),
            cancel: None,
            started,
        })
    }

    /// Stops the run at the next iteration boundary once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn state(&self) -> AnnealState {
        self.state
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn normalization(&self) -> Normalization {
        self.model.normalization()
    }

    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    pub fn current_evaluation(&self) -> Evaluation {
        self.current_eval
    }

    pub fn best(&self) -> Option<(&Snapshot, Evaluation)> {
        self.best.as_ref().map(|(s, e)| (s, *e))
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    fn should_stop(&self) -> bool {
        if self.stats.iterations >= self.options.iterations {
            return true;
        }
        if let Some(flag) = &self.cancel
            && flag.load(Ordering::Relaxed)
        {
            log::info!("Search cancelled after {} iterations", self.stats.iterations);
            return true;
        }
        if let Some(limit) = self.options.time_limit
            && self.started.elapsed() >= limit
        {
            log::info!(
                "Time limit of {:.1}s reached after {} iterations",
                limit.as_secs_f64(),
                self.stats.iterations
            );
            return true;
        }
        false
    }

    /// Runs one perturb/evaluate/accept iteration and cools the temperature.
    pub fn step(&mut self) -> StepOutcome {
        self.state = AnnealState::Iterating;

        let previous = self.current.clone();
        let perturbation = Perturbation::random(&mut self.rng);
        let applied = perturbation.apply(
            &mut self.current.tree,
            &mut self.current.blocks,
            &mut self.rng,
        );
        self.current.pack();
        debug_assert!(validate::tree_consistent(&self.current.tree));

        let eval = self.model.evaluate(self.design, &self.current.blocks);
        let feasible = validate::is_feasible(&self.current.blocks, &self.design.outline());
        let draw = self.rng.random::<f64>();
        let accepted = accept(eval.cost, self.current_eval.cost, self.temperature, draw);

        let mut new_best = false;
        if accepted {
            self.current_eval = eval;
            self.current_feasible = feasible;
            self.stats.accepted += 1;
            if feasible && self.best.as_ref().is_none_or(|(_, b)| eval.cost < b.cost) {
                self.best = Some((self.current.clone(), eval));
                new_best = true;
            }
        } else {
            self.current = previous;
        }

        if !applied {
            self.stats.noops += 1;
        }
        if feasible {
            self.stats.feasible += 1;
        }
        self.stats.iterations += 1;
        self.temperature *= self.options.cooling_rate;

        if self.options.report_interval > 0
            && self.stats.iterations % self.options.report_interval == 0
        {
            self.log_progress();
        }

        StepOutcome {
            perturbation,
            applied,
            cost: eval.cost,
            feasible,
            accepted,
            new_best,
        }
    }

    fn log_progress(&self) {
        let best = match &self.best {
            Some((_, e)) => format!("{:.4}", e.cost),
            None => "none".to_string(),
        };
        log::info!(
            "iter {:>8}: cost {:.4}, best {}, feasible {}, T {:.3e}, accept {:.1}%, feasible {:.1}%",
            self.stats.iterations,
            self.current_eval.cost,
            best,
            self.current_feasible,
            self.temperature,
            100.0 * self.stats.acceptance_rate(),
            100.0 * self.stats.feasibility_rate()
        );
    }

    /// Iterates until the budget is spent (or the run is cancelled) and
    /// returns the best feasible floorplan, or the last one if none was
    /// feasible.
    pub fn run(mut self) -> FloorplanResult {
        log::debug!(
            "Annealing {} blocks: T0 {}, r {}, {} iterations",
            self.current.blocks.len(),
            self.options.initial_temperature,
            self.options.cooling_rate,
            self.options.iterations
        );
        while !self.should_stop() {
            self.step();
        }
        self.stats.cancelled = self.stats.iterations < self.options.iterations;
        self.finish()
    }

    fn finish(mut self) -> FloorplanResult {
        self.state = AnnealState::Terminated;
        let runtime = self.started.elapsed();
        let stats = self.stats;
        log::info!(
            "Finished {} iterations in {:.3}s ({:.1}% accepted, {:.1}% feasible)",
            stats.iterations,
            runtime.as_secs_f64(),
            100.0 * stats.acceptance_rate(),
            100.0 * stats.feasibility_rate()
        );

        let (snapshot, eval, feasible) = match self.best.take() {
            Some((snapshot, eval)) => (snapshot, eval, true),
            None => {
                log::warn!("No feasible floorplan found; reporting the last state");
                validate::report_violations(&self.current.blocks, &self.design.outline());
                (self.current, self.current_eval, false)
            }
        };

        FloorplanResult {
            cost: eval.cost,
            wirelength: eval.wirelength,
            area: eval.area,
            width: eval.width,
            height: eval.height,
            runtime,
            feasible,
            blocks: snapshot.blocks,
            stats,
        }
    }
}

/// Anneals `design` with the given trade-off between area (`alpha = 1`) and
/// wirelength (`alpha = 0`).
pub fn floorplan<R: Rng>(
    design: &Design,
    alpha: f64,
    options: AnnealOptions,
    rng: R,
) -> Result<FloorplanResult, FloorplanError> {
    Ok(Annealer::new(design, alpha, options, rng)?.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Outline, Terminal};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn design() -> Design {
        let blocks = vec![
            Block::new("a", 4, 2).unwrap(),
            Block::new("b", 2, 2).unwrap(),
            Block::new("c", 3, 3).unwrap(),
            Block::new("d", 1, 5).unwrap(),
            Block::new("e", 2, 3).unwrap(),
        ];
        let terminals = vec![Terminal::new("p", 0, 12), Terminal::new("q", 12, 0)];
        let mut design = Design::new(Outline::new(12, 12), blocks, terminals);
        design.connect(&["a", "p", "d"]);
        design.connect(&["b", "q"]);
        design.connect(&["c", "e", "a"]);
        design
    }

    #[test]
    fn test_accept_downhill() {
        assert!(accept(1.0, 2.0, 1.0, 0.999));
        assert!(accept(2.0, 2.0, 0.0, 0.999));
    }

    #[test]
    fn test_accept_uphill_cold() {
        assert_eq!(acceptance_probability(3.0, 2.0, 0.0), 0.0);
        assert!(!accept(3.0, 2.0, 0.0, 0.0));
        assert!(acceptance_probability(3.0, 2.0, 1e-6) < 1e-100);
    }

    #[test]
    fn test_accept_uphill_hot() {
        let p = acceptance_probability(3.0, 2.0, 1.0);
        assert!((p - (-1.0f64).exp()).abs() < 1e-12);
        assert!(accept(3.0, 2.0, 1.0, p - 1e-9));
        assert!(!accept(3.0, 2.0, 1.0, p + 1e-9));
    }

    #[test]
    fn test_step_rolls_back_rejections() {
        let d = design();
        let mut annealer = Annealer::new(
            &d,
            0.5,
            AnnealOptions::default(),
            StdRng::seed_from_u64(9),
        )
        .unwrap();
        assert_eq!(annealer.state(), AnnealState::Initial);
        for _ in 0..300 {
            let before = annealer.current().clone();
            let outcome = annealer.step();
            annealer.current().tree.check_consistency().unwrap();
            if !outcome.accepted {
                assert_eq!(annealer.current(), &before);
            }
        }
        assert_eq!(annealer.state(), AnnealState::Iterating);
        assert_eq!(annealer.stats().iterations, 300);
    }

    #[test]
    fn test_step_never_rejects_downhill() {
        let d = design();
        let options = AnnealOptions {
            initial_temperature: 1e-9,
            ..AnnealOptions::default()
        };
        let mut annealer = Annealer::new(&d, 0.5, options, StdRng::seed_from_u64(5)).unwrap();
        for _ in 0..500 {
            let before = annealer.current_evaluation().cost;
            let outcome = annealer.step();
            if outcome.cost <= before {
                assert!(outcome.accepted);
            } else {
                // frozen: uphill moves are all but impossible
                assert!(!outcome.accepted);
            }
        }
    }

    #[test]
    fn test_temperature_decays() {
        let d = design();
        let options = AnnealOptions {
            initial_temperature: 10.0,
            cooling_rate: 0.5,
            ..AnnealOptions::default()
        };
        let mut annealer = Annealer::new(&d, 0.5, options, StdRng::seed_from_u64(2)).unwrap();
        annealer.step();
        annealer.step();
        assert_eq!(annealer.temperature(), 2.5);
    }

    #[test]
    fn test_best_is_feasible_and_monotone() {
        let d = design();
        let mut annealer =
            Annealer::new(&d, 0.5, AnnealOptions::default(), StdRng::seed_from_u64(4)).unwrap();
        let mut last_best = f64::INFINITY;
        for _ in 0..2000 {
            annealer.step();
            if let Some((snapshot, eval)) = annealer.best() {
                assert!(validate::is_feasible(&snapshot.blocks, &d.outline()));
                assert!(eval.cost <= last_best);
                last_best = eval.cost;
            }
        }
    }

    #[test]
    fn test_cancel_flag_stops_run() {
        let d = design();
        let flag = Arc::new(AtomicBool::new(true));
        let result = Annealer::new(&d, 0.5, AnnealOptions::default(), StdRng::seed_from_u64(1))
            .unwrap()
            .with_cancel_flag(flag)
            .run();
        assert_eq!(result.stats.iterations, 0);
        assert!(result.stats.cancelled);
    }

    #[test]
    fn test_bad_alpha() {
        let d = design();
        let err = Annealer::new(&d, 2.0, AnnealOptions::default(), StdRng::seed_from_u64(1));
        assert!(matches!(err, Err(FloorplanError::InvalidAlpha(_))));
    }
}
