//! ARIMA models for time series forecasting
//!
//! Coefficients are estimated by conditional sum of squares (CSS): the
//! series is differenced `d` times, the first `max(p, q)` values are taken
//! as given with zero pre-sample innovations, and the squared one-step
//! errors of the rest are minimised with a bounded Nelder-Mead simplex.
//! The Gaussian likelihood at the optimum gives the information criteria,
//! and a numerical Hessian of the objective gives the standard errors.
//!
//! A constant (the process mean) is estimated only when `d == 0`; once the
//! series is differenced the model has no constant.
//!
//! The optimisation runs on the differenced series divided by its scale,
//! so the same simplex settings behave alike for prices in cents or in
//! thousands. AR and MA coefficients are scale free; the constant, the
//! innovation variance and the residuals are mapped back afterwards.

use crate::data::TimeSeriesRow;
use crate::error::{ForecastError, Result};
use crate::models::{ForecastModel, ModelForecast, TrainedForecastModel};
use crate::order::ModelOrderSpec;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use series_math::{difference, integrate, invert_matrix, nelder_mead, numerical_hessian, NelderMeadConfig};
use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::PI;
use std::fmt;

/// Coverage of the prediction intervals and coefficient confidence intervals
pub const CONFIDENCE_LEVEL: f64 = 0.95;

/// Bound on each AR and MA coefficient during the search
const COEFFICIENT_BOUND: f64 = 0.99;

/// Relative step for the numerical Hessian
const HESSIAN_STEP: f64 = 1e-4;

/// Settings for the coefficient search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Simplex iterations before the fit is declared non-convergent
    pub max_iter: usize,
    /// Relative tolerance on the objective
    pub tolerance: f64,
    /// Fresh simplices tried from the best point once `max_iter` runs out
    pub max_restarts: usize,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            max_iter: 10_000,
            tolerance: 1e-8,
            max_restarts: 3,
        }
    }
}

/// ARIMA model (AutoRegressive Integrated Moving Average)
#[derive(Debug, Clone)]
pub struct ArimaModel {
    name: String,
    order: ModelOrderSpec,
    config: EstimatorConfig,
}

/// One estimated parameter with its standard error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub value: f64,
    /// NaN when the covariance matrix could not be estimated
    pub std_err: f64,
}

impl Parameter {
    fn new(name: String, value: f64, std_err: f64) -> Self {
        Self {
            name,
            value,
            std_err,
        }
    }

    pub fn z_score(&self) -> f64 {
        self.value / self.std_err
    }
}

/// Trained ARIMA model
#[derive(Debug, Clone)]
pub struct TrainedArimaModel {
    name: String,
    order: ModelOrderSpec,
    /// Process mean, present only when `d == 0`
    constant: Option<f64>,
    ar_coefficients: Vec<f64>,
    ma_coefficients: Vec<f64>,
    /// Innovation variance
    sigma2: f64,
    /// In-sample values, ascending
    history: Vec<f64>,
    /// History differenced `d` times
    differenced: Vec<f64>,
    /// One-step errors on the differenced scale; zero for conditioning values
    residuals: Vec<f64>,
    parameters: Vec<Parameter>,
    log_likelihood: f64,
    /// Number of residuals the likelihood is based on
    nobs: usize,
    iterations: usize,
    sample: (NaiveDate, NaiveDate),
}

impl ArimaModel {
    /// Create a new ARIMA model with default estimator settings
    pub fn new(order: ModelOrderSpec) -> Self {
        Self::with_config(order, EstimatorConfig::default())
    }

    /// Create a new ARIMA model with explicit estimator settings
    pub fn with_config(order: ModelOrderSpec, config: EstimatorConfig) -> Self {
        Self {
            name: order.to_string(),
            order,
            config,
        }
    }

    pub fn order(&self) -> ModelOrderSpec {
        self.order
    }

    fn has_constant(&self) -> bool {
        self.order.d() == 0
    }

    /// Number of estimated mean-equation parameters
    pub fn num_params(&self) -> usize {
        self.order.p() + self.order.q() + usize::from(self.has_constant())
    }

    /// Fewest in-sample rows that leave more residuals than parameters.
    ///
    /// Differencing consumes `d` rows and conditioning consumes `max(p, q)`;
    /// at least `num_params() + 1` residuals must remain.
    pub fn minimum_observations(&self) -> usize {
        self.order.d() + self.order.p().max(self.order.q()) + self.num_params() + 1
    }

    fn parameter_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.num_params());
        if self.has_constant() {
            names.push("const".to_string());
        }
        names.extend((1..=self.order.p()).map(|i| format!("ar.L{}", i)));
        names.extend((1..=self.order.q()).map(|i| format!("ma.L{}", i)));
        names
    }
}

/// Split a flat parameter vector into (mean, ar, ma)
fn unpack(params: &[f64], has_constant: bool, p: usize) -> (f64, &[f64], &[f64]) {
    let offset = usize::from(has_constant);
    let mean = if has_constant { params[0] } else { 0.0 };
    (mean, &params[offset..offset + p], &params[offset + p..])
}

/// One-step errors of the ARMA recursion on `series`
fn arma_residuals(series: &[f64], mean: f64, ar: &[f64], ma: &[f64]) -> Vec<f64> {
    let start = ar.len().max(ma.len());
    let mut residuals = vec![0.0; series.len()];

    for t in start..series.len() {
        let mut pred = mean;
        for (i, phi) in ar.iter().enumerate() {
            pred += phi * (series[t - 1 - i] - mean);
        }
        for (j, theta) in ma.iter().enumerate() {
            pred += theta * residuals[t - 1 - j];
        }
        residuals[t] = series[t] - pred;
    }

    residuals
}

fn conditional_sum_of_squares(series: &[f64], mean: f64, ar: &[f64], ma: &[f64]) -> f64 {
    let start = ar.len().max(ma.len());
    arma_residuals(series, mean, ar, ma)[start..]
        .iter()
        .map(|e| e * e)
        .sum()
}

/// MA(infinity) weights of the integrated model, used for interval widths
fn psi_weights(ar: &[f64], ma: &[f64], d: usize, count: usize) -> Vec<f64> {
    // AR polynomial 1 - phi_1 B - ... multiplied by (1 - B)^d.
    let mut poly = Vec::with_capacity(ar.len() + 1);
    poly.push(1.0);
    poly.extend(ar.iter().map(|phi| -phi));
    for _ in 0..d {
        let mut next = vec![0.0; poly.len() + 1];
        for (i, c) in poly.iter().enumerate() {
            next[i] += c;
            next[i + 1] -= c;
        }
        poly = next;
    }
    let phi_star: Vec<f64> = poly[1..].iter().map(|c| -c).collect();

    let mut psi = Vec::with_capacity(count);
    for j in 0..count {
        if j == 0 {
            psi.push(1.0);
            continue;
        }
        let mut value = ma.get(j - 1).copied().unwrap_or(0.0);
        for i in 1..=j.min(phi_star.len()) {
            value += phi_star[i - 1] * psi[j - i];
        }
        psi.push(value);
    }
    psi
}

fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| ForecastError::FitError(e.to_string()))
}

impl ForecastModel for ArimaModel {
    type Trained = TrainedArimaModel;

    fn train(&self, rows: &[TimeSeriesRow]) -> Result<TrainedArimaModel> {
        let (p, d, q) = self.order.as_tuple();
        let needed = self.minimum_observations();
        if rows.len() < needed {
            return Err(ForecastError::InsufficientData {
                order: self.name.clone(),
                needed,
                got: rows.len(),
            });
        }

        let history: Vec<f64> = rows.iter().map(|row| row.value).collect();
        if history.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::FitError(
                "In-sample values contain missing or non-finite entries".to_string(),
            ));
        }

        let has_constant = self.has_constant();
        let differenced = difference(&history, d);

        let center = if has_constant {
            series_math::mean(&differenced)?
        } else {
            0.0
        };
        let spread = (differenced.iter().map(|v| (v - center).powi(2)).sum::<f64>()
            / differenced.len() as f64)
            .sqrt();
        let scale = if spread.is_finite() && spread > 0.0 {
            spread
        } else {
            1.0
        };
        let scaled: Vec<f64> = differenced.iter().map(|v| (v - center) / scale).collect();

        let objective = |params: &[f64]| {
            let (mean, ar, ma) = unpack(params, has_constant, p);
            conditional_sum_of_squares(&scaled, mean, ar, ma)
        };

        let k = self.num_params();
        let (params, iterations) = if p == 0 && q == 0 {
            // The mean of the centered series is zero, and without a constant
            // there is nothing to estimate.
            (vec![0.0; k], 0)
        } else {
            let mut initial = Vec::with_capacity(k);
            let mut bounds = Vec::with_capacity(k);
            if has_constant {
                initial.push(0.0);
                bounds.push((f64::NEG_INFINITY, f64::INFINITY));
            }
            for lags in [p, q] {
                for i in 0..lags {
                    initial.push(0.1 / (i + 1) as f64);
                    bounds.push((-COEFFICIENT_BOUND, COEFFICIENT_BOUND));
                }
            }

            let config = NelderMeadConfig {
                max_iter: self.config.max_iter,
                tolerance: self.config.tolerance,
                max_restarts: self.config.max_restarts,
                ..Default::default()
            };
            let _span = tracing::debug_span!("nelder_mead", order = %self.name, params = k).entered();
            let result = nelder_mead(objective, &initial, Some(bounds.as_slice()), config)?;

            if !result.optimal_value.is_finite() || result.optimal_value >= f64::MAX {
                return Err(ForecastError::FitError(format!(
                    "{} produced a non-finite sum of squares",
                    self.name
                )));
            }
            if !result.converged {
                return Err(ForecastError::FitError(format!(
                    "{} did not converge after {} iterations and {} restarts",
                    self.name, result.iterations, result.restarts
                )));
            }
            tracing::debug!(
                iterations = result.iterations,
                restarts = result.restarts,
                css = result.optimal_value,
                "simplex converged"
            );
            (result.optimal_point, result.iterations)
        };

        let (mean_scaled, ar, ma) = unpack(&params, has_constant, p);
        let start = p.max(q);
        let nobs = scaled.len() - start;
        let css_scaled = conditional_sum_of_squares(&scaled, mean_scaled, ar, ma);
        let sigma2_scaled = css_scaled / nobs as f64;

        // Information matrix of the concentrated Gaussian likelihood is
        // H_css / (2 sigma^2); its inverse is the coefficient covariance.
        let std_errs_scaled: Vec<f64> = if k == 0 {
            Vec::new()
        } else {
            let hessian = numerical_hessian(objective, &params, HESSIAN_STEP);
            let information: Vec<Vec<f64>> = hessian
                .iter()
                .map(|row| row.iter().map(|h| h / (2.0 * sigma2_scaled)).collect())
                .collect();
            match invert_matrix(&information) {
                Ok(covariance) => (0..k)
                    .map(|i| {
                        let var = covariance[i][i];
                        if var.is_finite() && var > 0.0 {
                            var.sqrt()
                        } else {
                            f64::NAN
                        }
                    })
                    .collect(),
                Err(_) => vec![f64::NAN; k],
            }
        };

        let constant = has_constant.then(|| center + scale * mean_scaled);
        let sigma2 = sigma2_scaled * scale * scale;
        let residuals: Vec<f64> = arma_residuals(&scaled, mean_scaled, ar, ma)
            .into_iter()
            .map(|e| e * scale)
            .collect();
        let log_likelihood = -0.5 * nobs as f64 * ((2.0 * PI * sigma2).ln() + 1.0);

        let mut parameters: Vec<Parameter> = self
            .parameter_names()
            .into_iter()
            .zip(params.iter().zip(&std_errs_scaled))
            .map(|(name, (value, se))| {
                if name == "const" {
                    Parameter::new(name, center + scale * value, scale * se)
                } else {
                    Parameter::new(name, *value, *se)
                }
            })
            .collect();
        parameters.push(Parameter::new(
            "sigma2".to_string(),
            sigma2,
            sigma2 * (2.0 / nobs as f64).sqrt(),
        ));

        let sample = (rows[0].date, rows[rows.len() - 1].date);

        Ok(TrainedArimaModel {
            name: self.name.clone(),
            order: self.order,
            constant,
            ar_coefficients: ar.to_vec(),
            ma_coefficients: ma.to_vec(),
            sigma2,
            history,
            differenced,
            residuals,
            parameters,
            log_likelihood,
            nobs,
            iterations,
            sample,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedArimaModel {
    pub fn order(&self) -> ModelOrderSpec {
        self.order
    }

    pub fn constant(&self) -> Option<f64> {
        self.constant
    }

    pub fn ar_coefficients(&self) -> &[f64] {
        &self.ar_coefficients
    }

    pub fn ma_coefficients(&self) -> &[f64] {
        &self.ma_coefficients
    }

    pub fn sigma2(&self) -> f64 {
        self.sigma2
    }

    /// Estimated parameters, including `sigma2` last
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Parameter count used by the information criteria, including sigma2
    fn df_model(&self) -> f64 {
        self.parameters.len() as f64
    }

    pub fn aic(&self) -> f64 {
        -2.0 * self.log_likelihood + 2.0 * self.df_model()
    }

    pub fn bic(&self) -> f64 {
        -2.0 * self.log_likelihood + self.df_model() * (self.nobs as f64).ln()
    }

    pub fn hqic(&self) -> f64 {
        -2.0 * self.log_likelihood + 2.0 * self.df_model() * (self.nobs as f64).ln().ln()
    }

    /// Fit report
    pub fn diagnostics(&self) -> ArimaSummary<'_> {
        ArimaSummary { model: self }
    }
}

impl TrainedForecastModel for TrainedArimaModel {
    fn forecast(&self, horizon: usize) -> Result<ModelForecast> {
        if horizon == 0 {
            return ModelForecast::new(Vec::new(), 0);
        }

        let mean = self.constant.unwrap_or(0.0);
        let mut extended = self.differenced.clone();
        let mut errors = self.residuals.clone();

        for _ in 0..horizon {
            let t = extended.len();
            let mut pred = mean;
            for (i, phi) in self.ar_coefficients.iter().enumerate() {
                if t > i {
                    pred += phi * (extended[t - 1 - i] - mean);
                }
            }
            for (j, theta) in self.ma_coefficients.iter().enumerate() {
                if t > j {
                    pred += theta * errors[t - 1 - j];
                }
            }
            extended.push(pred);
            // Future innovations have zero expectation.
            errors.push(0.0);
        }

        let forecast_diff = &extended[self.differenced.len()..];
        let values = integrate(forecast_diff, &self.history, self.order.d());

        let z = standard_normal()?.inverse_cdf(0.5 + CONFIDENCE_LEVEL / 2.0);
        let psi = psi_weights(
            &self.ar_coefficients,
            &self.ma_coefficients,
            self.order.d(),
            horizon,
        );
        let mut cumulative = 0.0;
        let intervals = values
            .iter()
            .zip(&psi)
            .map(|(value, weight)| {
                cumulative += weight * weight;
                let half_width = z * (self.sigma2 * cumulative).sqrt();
                (value - half_width, value + half_width)
            })
            .collect();

        ModelForecast::new_with_intervals(values, horizon, intervals)
    }

    fn fitted_values(&self) -> Vec<f64> {
        let d = self.order.d();
        let start = self.order.p().max(self.order.q());
        let mut fitted = vec![f64::NAN; self.history.len()];
        for (t, error) in self.residuals.iter().enumerate().skip(start) {
            // A level error equals the error on the differenced scale.
            fitted[t + d] = self.history[t + d] - error;
        }
        fitted
    }

    fn summary(&self) -> String {
        self.diagnostics().to_string()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Text report of a fitted model: header statistics and a coefficient table
#[derive(Debug, Clone, Copy)]
pub struct ArimaSummary<'a> {
    model: &'a TrainedArimaModel,
}

impl fmt::Display for ArimaSummary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.model;
        let rule = "=".repeat(78);
        let thin = "-".repeat(78);

        writeln!(f, "{:^78}", "ARIMA Results")?;
        writeln!(f, "{}", rule)?;
        writeln!(
            f,
            "{:<20}{:>18}   {:<20}{:>17}",
            "Dep. Variable:", "close", "No. Observations:", m.history.len()
        )?;
        writeln!(
            f,
            "{:<20}{:>18}   {:<20}{:>17.3}",
            "Model:", m.name, "Log Likelihood", m.log_likelihood
        )?;
        writeln!(
            f,
            "{:<20}{:>18}   {:<20}{:>17.3}",
            "Method:", "css", "AIC", m.aic()
        )?;
        writeln!(
            f,
            "{:<20}{:>18}   {:<20}{:>17.3}",
            "Sample:", m.sample.0.to_string(), "BIC", m.bic()
        )?;
        writeln!(
            f,
            "{:<20}{:>18}   {:<20}{:>17.3}",
            "", format!("- {}", m.sample.1), "HQIC", m.hqic()
        )?;
        writeln!(
            f,
            "{:<20}{:>18}   {:<20}{:>17}",
            "Residuals used:", m.nobs, "Iterations:", m.iterations
        )?;
        writeln!(f, "{}", rule)?;

        let lower_label = format!("[{:.3}", (1.0 - CONFIDENCE_LEVEL) / 2.0);
        let upper_label = format!("{:.3}]", 0.5 + CONFIDENCE_LEVEL / 2.0);
        writeln!(
            f,
            "{:<10}{:>12}{:>11}{:>11}{:>11}{:>11}{:>12}",
            "", "coef", "std err", "z", "P>|z|", lower_label, upper_label
        )?;
        writeln!(f, "{}", thin)?;

        let normal = standard_normal().map_err(|_| fmt::Error)?;
        let z_crit = normal.inverse_cdf(0.5 + CONFIDENCE_LEVEL / 2.0);
        let mut missing_std_err = false;
        for param in &m.parameters {
            let z = param.z_score();
            let p_value = 2.0 * (1.0 - normal.cdf(z.abs()));
            missing_std_err |= param.std_err.is_nan();
            writeln!(
                f,
                "{:<10}{:>12.4}{:>11.3}{:>11.3}{:>11.3}{:>11.3}{:>12.3}",
                param.name,
                param.value,
                param.std_err,
                z,
                p_value,
                param.value - z_crit * param.std_err,
                param.value + z_crit * param.std_err
            )?;
        }
        writeln!(f, "{}", rule)?;

        if missing_std_err {
            writeln!(f, "Warnings:")?;
            writeln!(
                f,
                "[1] Covariance matrix is singular or near-singular; some standard errors are unavailable."
            )?;
        }
        Ok(())
    }
}
