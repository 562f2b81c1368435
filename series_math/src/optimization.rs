//! Bounded Nelder-Mead simplex minimisation
//!
//! Used to estimate model coefficients by minimising a conditional sum of
//! squares. Convergence is judged relative to the magnitude of the
//! objective so that the same settings work for series on any scale.
//!
//! A simplex that runs out of iterations is often stuck in a degenerate
//! shape rather than far from the optimum, so a run that fails to converge
//! is restarted from a fresh simplex around its best vertex.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Configuration for Nelder-Mead optimisation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations
    pub max_iter: usize,
    /// Relative tolerance on the spread of objective values in the simplex
    pub tolerance: f64,
    /// Reflection coefficient
    pub alpha: f64,
    /// Expansion coefficient
    pub gamma: f64,
    /// Contraction coefficient
    pub rho: f64,
    /// Shrink coefficient
    pub sigma: f64,
    /// Initial simplex step, relative to the magnitude of each coordinate
    pub initial_step: f64,
    /// Fresh simplices built around the best vertex after a run hits `max_iter`
    pub max_restarts: usize,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 10_000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.05,
            max_restarts: 3,
        }
    }
}

/// Outcome of a Nelder-Mead run
#[derive(Debug, Clone, PartialEq)]
pub struct NelderMeadResult {
    /// Best point found
    pub optimal_point: Vec<f64>,
    /// Objective value at the best point
    pub optimal_value: f64,
    /// Number of iterations performed, summed over restarts
    pub iterations: usize,
    /// Restarts used after the first run
    pub restarts: usize,
    /// Whether the last simplex met the tolerance before `max_iter`
    pub converged: bool,
}

/// Minimise `objective` starting from `initial`.
///
/// `bounds`, when given, must hold one `(min, max)` pair per coordinate;
/// every trial point is clamped into the box before evaluation.
/// Non-finite objective values are treated as `f64::MAX`. Each run gets
/// `max_iter` iterations and up to `max_restarts` restarts follow a run
/// that did not converge.
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> Result<NelderMeadResult>
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    if n == 0 {
        return Err(MathError::InvalidInput(
            "Nelder-Mead needs at least one parameter".to_string(),
        ));
    }
    if let Some(b) = bounds {
        if b.len() != n {
            return Err(MathError::InvalidInput(format!(
                "Expected {} bounds, got {}",
                n,
                b.len()
            )));
        }
        if b.iter().any(|(lo, hi)| lo > hi) {
            return Err(MathError::InvalidInput(
                "Lower bound exceeds upper bound".to_string(),
            ));
        }
    }

    let eval = |point: &[f64]| {
        let value = objective(point);
        if value.is_finite() {
            value
        } else {
            f64::MAX
        }
    };

    let mut result = run_simplex(&eval, &apply_bounds(initial, bounds), bounds, &config);
    while !result.converged && result.restarts < config.max_restarts {
        let restart = run_simplex(&eval, &result.optimal_point, bounds, &config);
        // Keep the better point; a restart never loses ground.
        let (optimal_point, optimal_value) = if restart.optimal_value <= result.optimal_value {
            (restart.optimal_point, restart.optimal_value)
        } else {
            (result.optimal_point, result.optimal_value)
        };
        result = NelderMeadResult {
            optimal_point,
            optimal_value,
            iterations: result.iterations + restart.iterations,
            restarts: result.restarts + 1,
            converged: restart.converged,
        };
    }

    Ok(result)
}

/// One simplex run from a fresh simplex around `start`
fn run_simplex<E>(
    eval: &E,
    start: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: &NelderMeadConfig,
) -> NelderMeadResult
where
    E: Fn(&[f64]) -> f64,
{
    let n = start.len();
    let mut simplex: Vec<Vec<f64>> = Vec::with_capacity(n + 1);
    simplex.push(start.to_vec());
    for i in 0..n {
        let mut vertex = start.to_vec();
        let step = if vertex[i].abs() > 1e-10 {
            config.initial_step * vertex[i].abs()
        } else {
            config.initial_step
        };
        vertex[i] += step;
        // Step the other way if the bound swallowed the move.
        if bounds.map_or(false, |b| vertex[i] > b[i].1) {
            vertex[i] = start[i] - step;
        }
        simplex.push(apply_bounds(&vertex, bounds));
    }

    let mut values: Vec<f64> = simplex.iter().map(|v| eval(v)).collect();
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        let mut order: Vec<usize> = (0..=n).collect();
        order.sort_by(|&a, &b| values[a].partial_cmp(&values[b]).unwrap_or(Ordering::Equal));

        let best = order[0];
        let worst = order[n];
        let second_worst = order[n - 1];

        let spread = (values[worst] - values[best]).abs();
        let scale = values[worst].abs() + values[best].abs() + f64::MIN_POSITIVE;
        if 2.0 * spread <= config.tolerance * scale {
            converged = true;
            break;
        }

        let centroid = compute_centroid(&simplex, worst);
        let diameter = simplex
            .iter()
            .map(|v| euclidean_distance(v, &centroid))
            .fold(0.0, f64::max);
        let magnitude = 1.0 + centroid.iter().map(|c| c.abs()).fold(0.0, f64::max);
        if diameter <= config.tolerance * magnitude {
            converged = true;
            break;
        }

        iterations += 1;

        let reflected = apply_bounds(&towards(&centroid, &simplex[worst], -config.alpha), bounds);
        let reflected_value = eval(&reflected);

        if reflected_value < values[best] {
            let expanded = apply_bounds(&towards(&centroid, &reflected, config.gamma), bounds);
            let expanded_value = eval(&expanded);
            if expanded_value < reflected_value {
                simplex[worst] = expanded;
                values[worst] = expanded_value;
            } else {
                simplex[worst] = reflected;
                values[worst] = reflected_value;
            }
            continue;
        }

        if reflected_value < values[second_worst] {
            simplex[worst] = reflected;
            values[worst] = reflected_value;
            continue;
        }

        let (contracted, threshold) = if reflected_value < values[worst] {
            (towards(&centroid, &reflected, config.rho), reflected_value)
        } else {
            (towards(&centroid, &simplex[worst], config.rho), values[worst])
        };
        let contracted = apply_bounds(&contracted, bounds);
        let contracted_value = eval(&contracted);
        if contracted_value < threshold {
            simplex[worst] = contracted;
            values[worst] = contracted_value;
            continue;
        }

        let anchor = simplex[best].clone();
        for i in 0..=n {
            if i != best {
                simplex[i] = apply_bounds(&towards(&anchor, &simplex[i], config.sigma), bounds);
                values[i] = eval(&simplex[i]);
            }
        }
    }

    let best = values
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(Ordering::Equal))
        .map(|(i, _)| i)
        .unwrap_or(0);

    NelderMeadResult {
        optimal_point: simplex[best].clone(),
        optimal_value: values[best],
        iterations,
        restarts: 0,
        converged,
    }
}

/// Centroid of every vertex except `exclude`
fn compute_centroid(simplex: &[Vec<f64>], exclude: usize) -> Vec<f64> {
    let n = simplex[0].len();
    let count = (simplex.len() - 1) as f64;
    let mut centroid = vec![0.0; n];

    for (i, vertex) in simplex.iter().enumerate() {
        if i != exclude {
            for (c, v) in centroid.iter_mut().zip(vertex) {
                *c += v;
            }
        }
    }

    centroid.iter_mut().for_each(|c| *c /= count);
    centroid
}

/// `origin + factor * (point - origin)`
fn towards(origin: &[f64], point: &[f64], factor: f64) -> Vec<f64> {
    origin
        .iter()
        .zip(point)
        .map(|(o, p)| o + factor * (p - o))
        .collect()
}

fn apply_bounds(point: &[f64], bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    match bounds {
        None => point.to_vec(),
        Some(b) => point
            .iter()
            .zip(b)
            .map(|(x, (lo, hi))| x.clamp(*lo, *hi))
            .collect(),
    }
}

fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}
