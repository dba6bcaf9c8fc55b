//! Objective configuration and the run protocol of a flux balance model
//!
//! Depending on the objective style a run is one or two solves:
//!
//! * `MAXIMIZE/MINIMIZE_OBJECTIVE_FLUX` solve the standard problem once.
//! * `MAXIMIZE/MINIMIZE_TOTAL_FLUX` first maximize the objective reaction, then
//!   fix it at its optimum and maximize/minimize the plain sum of all fluxes.
//!   These styles leave every objective coefficient at 1 after the run; call
//!   [`FbaModel::set_objective_reaction`] or [`FbaModel::set_objective_style`]
//!   to get the single reaction objective back.
//! * The four `*_OBJECTIVE_*_TOTAL` styles optimize the objective on the standard
//!   problem, then fix the objective reaction at its optimum and
//!   minimize/maximize the sum of absolute fluxes on the absolute flux problem.
use crate::metabolic_model::model::{check_length, FbaModel, FbaSolution, ModelError, Network};
use crate::optimize::objective::{ObjectiveSense, ObjectiveStyle};
use crate::optimize::solvers::{solver_for, LinearSolver, SolverMethod};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Outcome of one run, the solution is present only for a successful run
type RunOutcome = (OptimizationStatus, Option<FbaSolution>);

impl Network {
    /// Objective becomes the flux through `reaction` alone
    pub(crate) fn set_objective_reaction(&mut self, reaction: usize) -> Result<(), ModelError> {
        if reaction >= self.reactions.len() {
            return Err(ModelError::Params(format!(
                "objective reaction {} is out of range for {} reactions",
                reaction,
                self.reactions.len()
            )));
        }
        self.objective_reaction = Some(reaction);
        self.objective_coefficients.iter_mut().for_each(|c| *c = 0.);
        self.objective_coefficients[reaction] = 1.;
        Ok(())
    }

    fn set_objective_style(&mut self, style: ObjectiveStyle) -> Result<(), ModelError> {
        if style.is_experimental() {
            log::warn!("Objective style {} is experimental", style);
        }
        self.objective_style = style;
        if !style.is_total_flux() {
            if let Some(reaction) = self.objective_reaction {
                self.set_objective_reaction(reaction)?;
            }
        }
        Ok(())
    }

    fn require_objective_reaction(&self) -> Result<usize, ModelError> {
        self.objective_reaction.ok_or_else(|| {
            ModelError::Params(format!(
                "objective style {} needs an objective reaction",
                self.objective_style
            ))
        })
    }

    pub(crate) fn run(&mut self, solver: &dyn LinearSolver) -> Result<OptimizationStatus, ModelError> {
        self.status = OptimizationStatus::Unoptimized;
        self.solution = None;
        let style = self.objective_style;
        log::debug!("Running {} with {}", style, solver.name());
        let (status, solution) = match style.total_flux_sense() {
            None => self.run_objective_flux(solver, style.objective_sense())?,
            Some(sense) if style.is_total_flux() => self.run_total_flux(solver, sense)?,
            Some(sense) => self.run_absolute_flux(solver, style.objective_sense(), sense)?,
        };
        if !status.is_success() {
            log::warn!("Run with style {} ended with status {:?}", style, status);
        }
        self.status = status;
        self.solution = solution;
        Ok(status)
    }

    fn solve_standard(
        &mut self,
        solver: &dyn LinearSolver,
        sense: ObjectiveSense,
    ) -> Result<ProblemSolution, ModelError> {
        self.materialize()?;
        self.standard.update_objective_sense(sense);
        Ok(solver.solve(&self.standard)?)
    }

    /// Current bounds of a reaction, written back after a phase fixed them
    fn restore_column(&mut self, reaction: usize, absolute: bool) -> Result<(), ModelError> {
        let lower = self.reactions[reaction].lower_bound;
        let upper = self.reactions[reaction].upper_bound;
        let problem = if absolute {
            &mut self.msa
        } else {
            &mut self.standard
        };
        problem.update_variable_bounds(reaction, lower, upper)?;
        Ok(())
    }

    fn run_objective_flux(
        &mut self,
        solver: &dyn LinearSolver,
        sense: ObjectiveSense,
    ) -> Result<RunOutcome, ModelError> {
        let solution = self.solve_standard(solver, sense)?;
        Ok(self.collect(solution, false))
    }

    fn run_total_flux(
        &mut self,
        solver: &dyn LinearSolver,
        sense: ObjectiveSense,
    ) -> Result<RunOutcome, ModelError> {
        let reaction = self.require_objective_reaction()?;
        self.set_objective_reaction(reaction)?;
        let first = self.solve_standard(solver, ObjectiveSense::Maximize)?;
        let Some(optimum) = optimum_of(&first, reaction) else {
            return Ok((first.status, None));
        };
        log::debug!("Objective optimum {}, fixing reaction {}", optimum, reaction);

        self.objective_coefficients = vec![1.; self.reactions.len()];
        self.materialize()?;
        self.standard.update_objective_sense(sense);
        self.standard
            .update_variable_bounds(reaction, optimum, optimum)?;
        let second = solver.solve(&self.standard);
        self.restore_column(reaction, false)?;
        Ok(self.collect(second?, false))
    }

    fn run_absolute_flux(
        &mut self,
        solver: &dyn LinearSolver,
        objective_sense: ObjectiveSense,
        total_sense: ObjectiveSense,
    ) -> Result<RunOutcome, ModelError> {
        let reaction = self.require_objective_reaction()?;
        let first = self.solve_standard(solver, objective_sense)?;
        let Some(optimum) = optimum_of(&first, reaction) else {
            return Ok((first.status, None));
        };
        log::debug!("Objective optimum {}, fixing reaction {}", optimum, reaction);

        // Flux columns of the absolute flux problem were materialized with the
        // standard problem
        self.msa.update_variable_bounds(reaction, optimum, optimum)?;
        self.msa.update_objective_sense(total_sense);
        self.msa.set_presolve(false);
        let second = solver.solve(&self.msa);
        self.restore_column(reaction, true)?;
        Ok(self.collect(second?, true))
    }

    fn collect(&self, solution: ProblemSolution, absolute: bool) -> RunOutcome {
        let n = self.reactions.len();
        match (solution.status.is_success(), solution.objective_value, solution.variable_values) {
            (true, Some(objective_value), Some(values)) => {
                let absolute_fluxes = absolute.then(|| values[n..2 * n].to_vec());
                let fluxes = values[..n].to_vec();
                (
                    solution.status,
                    Some(FbaSolution {
                        status: solution.status,
                        objective_value,
                        fluxes,
                        absolute_fluxes,
                    }),
                )
            }
            _ => (solution.status, None),
        }
    }
}

/// Flux through `reaction` at the optimum of a first phase
fn optimum_of(solution: &ProblemSolution, reaction: usize) -> Option<f64> {
    if !solution.status.is_success() {
        return None;
    }
    solution
        .variable_values
        .as_ref()
        .and_then(|values| values.get(reaction).copied())
}

impl FbaModel {
    // region Objective
    /// Use the flux through `reaction` as the objective
    pub fn set_objective_reaction(&mut self, reaction: usize) -> Result<(), ModelError> {
        self.network_mut()?.set_objective_reaction(reaction)
    }

    pub fn objective_reaction(&self) -> Option<usize> {
        self.network.as_ref().and_then(|n| n.objective_reaction)
    }

    /// Change the objective style
    ///
    /// Except for the total flux styles, this re-derives the objective
    /// coefficients from the objective reaction, discarding custom coefficients.
    pub fn set_objective_style(&mut self, style: ObjectiveStyle) -> Result<(), ModelError> {
        self.network_mut()?.set_objective_style(style)
    }

    pub fn objective_style(&self) -> ObjectiveStyle {
        self.network
            .as_ref()
            .map(|n| n.objective_style)
            .unwrap_or_default()
    }

    /// Replace the objective with an arbitrary linear combination of fluxes
    ///
    /// The objective reaction is kept, and still determines which flux the two
    /// phase styles fix.
    pub fn set_objective_coefficients(&mut self, coefficients: &[f64]) -> Result<(), ModelError> {
        let network = self.network_mut()?;
        check_length(
            "objective coefficients",
            network.reactions.len(),
            coefficients.len(),
        )?;
        if let Some(i) = coefficients.iter().position(|c| !c.is_finite()) {
            return Err(ModelError::Params(format!(
                "objective coefficient {} is not finite",
                i
            )));
        }
        network.objective_coefficients = coefficients.to_vec();
        Ok(())
    }

    pub fn objective_coefficients(&self) -> Vec<f64> {
        self.network
            .as_ref()
            .map(|n| n.objective_coefficients.clone())
            .unwrap_or_default()
    }
    // endregion Objective

    // region Solver
    /// Select the numerical method, failing if no backend for it was compiled in
    pub fn set_solver_method(&mut self, method: SolverMethod) -> Result<(), ModelError> {
        let settings = self.settings;
        let network = self.network_mut()?;
        solver_for(method, settings)?;
        network.solver_method = method;
        Ok(())
    }

    pub fn solver_method(&self) -> Option<SolverMethod> {
        self.network.as_ref().map(|n| n.solver_method)
    }

    /// Optimize the model following its objective style
    ///
    /// Solver outcomes are returned as the status, a failed solve is not an
    /// error. After a run that did not succeed every result accessor returns
    /// None.
    pub fn run(&mut self) -> Result<OptimizationStatus, ModelError> {
        let settings = self.settings;
        let network = self.network_mut()?;
        let solver = solver_for(network.solver_method, settings)?;
        network.run(solver.as_ref())
    }
    // endregion Solver

    // region Results
    /// Status of the last run, `Unoptimized` before the first one
    pub fn status(&self) -> OptimizationStatus {
        self.network
            .as_ref()
            .map_or(OptimizationStatus::Unoptimized, |n| n.status)
    }

    pub fn solution(&self) -> Option<&FbaSolution> {
        self.network.as_ref().and_then(|n| n.solution.as_ref())
    }

    pub fn fluxes(&self) -> Option<&[f64]> {
        self.solution().map(|s| s.fluxes.as_slice())
    }

    /// Fluxes through the exchange reactions, in exchange order
    pub fn exchange_fluxes(&self) -> Option<Vec<f64>> {
        let fluxes = self.fluxes()?;
        Some(
            self.exchange_reactions()
                .iter()
                .map(|e| fluxes[e.reaction])
                .collect(),
        )
    }

    /// Objective value of the final solve of the last run
    pub fn objective_solution(&self) -> Option<f64> {
        self.solution().map(|s| s.objective_value)
    }

    /// Flux through the objective reaction in the last run
    pub fn objective_flux_solution(&self) -> Option<f64> {
        let reaction = self.objective_reaction()?;
        self.fluxes().map(|fluxes| fluxes[reaction])
    }

    /// Values of the absolute value dummies, after a run with an absolute flux style
    pub fn absolute_fluxes(&self) -> Option<&[f64]> {
        self.solution()?.absolute_fluxes.as_deref()
    }

    /// Sum of the absolute fluxes of the last run
    pub fn total_absolute_flux(&self) -> Option<f64> {
        self.fluxes().map(|fluxes| fluxes.iter().map(|v| v.abs()).sum())
    }
    // endregion Results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::definition::ModelDefinition;
    use crate::metabolic_model::model::tests::chain_model;
    use crate::metabolic_model::model::{MODEL_NOT_INITIALIZED, PARAMS_ERROR};

    const TOL: f64 = 1e-6;

    fn assert_close(found: f64, expected: f64) {
        assert!(
            (found - expected).abs() < TOL,
            "expected {}, found {}",
            expected,
            found
        );
    }

    /// Uptake of A, a reversible A <-> B pair forming a loop, secretion of B
    fn loop_model() -> FbaModel {
        let mut definition = ModelDefinition::new(
            2,
            4,
            &[
                (0, 0, 1.),
                (0, 1, -1.),
                (0, 2, 1.),
                (1, 1, 1.),
                (1, 2, -1.),
                (1, 3, -1.),
            ],
        );
        definition.lower_bounds = vec![0., -1000., -1000., 0.];
        definition.upper_bounds = vec![10., 1000., 1000., 1000.];
        definition.objective = vec![(3, 1.)];
        definition.exchange_reactions = vec![0, 3];
        FbaModel::from_definition(&definition).unwrap()
    }

    #[test]
    fn maximize_objective_flux() {
        let mut model = chain_model();
        assert_eq!(model.status(), OptimizationStatus::Unoptimized);
        assert!(model.fluxes().is_none());
        let status = model.run().unwrap();
        assert_eq!(status.code(), 0);
        assert_close(model.objective_solution().unwrap(), 10.);
        assert_close(model.objective_flux_solution().unwrap(), 10.);
        for flux in model.fluxes().unwrap() {
            assert_close(*flux, 10.);
        }
        let exchange = model.exchange_fluxes().unwrap();
        assert_eq!(exchange.len(), 2);
        assert_close(exchange[0], 10.);
        assert_close(exchange[1], 10.);
        assert_close(model.total_absolute_flux().unwrap(), 40.);
        assert!(model.absolute_fluxes().is_none());
    }

    #[test]
    fn minimize_objective_flux() {
        let mut model = chain_model();
        model
            .set_objective_style(ObjectiveStyle::MinimizeObjectiveFlux)
            .unwrap();
        assert!(model.run().unwrap().is_success());
        assert_close(model.objective_solution().unwrap(), 0.);
    }

    #[test]
    fn toy_network_with_custom_coefficients() {
        let mut definition = ModelDefinition::new(1, 2, &[(0, 0, 1.), (0, 1, -1.)]);
        definition.lower_bounds = vec![0., 0.];
        definition.upper_bounds = vec![0.5, 0.5];
        let mut model = FbaModel::from_definition(&definition).unwrap();
        model.set_objective_coefficients(&[0., 1.]).unwrap();
        assert!(model.run().unwrap().is_success());
        assert_close(model.objective_solution().unwrap(), 0.5);
        let fluxes = model.fluxes().unwrap();
        assert_close(fluxes[1], 0.5);
        // S v = 0 ties both reactions together
        assert_close(fluxes[0], 0.5);
        // No objective reaction was ever named
        assert!(model.objective_flux_solution().is_none());
    }

    #[test]
    fn total_flux_styles() {
        for style in [ObjectiveStyle::MinimizeTotalFlux, ObjectiveStyle::MaximizeTotalFlux] {
            let mut model = chain_model();
            model.set_objective_style(style).unwrap();
            assert!(model.run().unwrap().is_success());
            // The chain forces every flux to follow the objective
            assert_close(model.objective_solution().unwrap(), 40.);
            assert_close(model.objective_flux_solution().unwrap(), 10.);
            // Coefficients are left summing all fluxes
            assert_eq!(model.objective_coefficients(), vec![1.; 4]);
            // The fixed objective reaction gets its bounds back
            assert_eq!(model.lower_bounds()[3], 0.);
            assert_eq!(
                model.standard_problem().unwrap().variable_bounds(3),
                Some((0., 1000.))
            );
        }
    }

    #[test]
    fn total_flux_minimizes_loop() {
        let mut model = loop_model();
        model
            .set_objective_style(ObjectiveStyle::MinimizeTotalFlux)
            .unwrap();
        assert!(model.run().unwrap().is_success());
        assert_close(model.objective_flux_solution().unwrap(), 10.);
        // Plain sum: R1 - R2 = 10 so R1 + R2 is smallest with R1 = 10 + R2, R2 = -1000
        let fluxes = model.fluxes().unwrap();
        assert_close(fluxes[1] - fluxes[2], 10.);
        assert_close(fluxes[2], -1000.);
    }

    #[test]
    fn absolute_flux_dominance() {
        let mut model = loop_model();
        model
            .set_objective_style(ObjectiveStyle::MaxObjectiveMinTotal)
            .unwrap();
        assert!(model.run().unwrap().is_success());
        let fluxes = model.fluxes().unwrap().to_vec();
        let dummies = model.absolute_fluxes().unwrap().to_vec();
        assert_eq!(dummies.len(), fluxes.len());
        for (v, d) in fluxes.iter().zip(&dummies) {
            assert!(*d >= v.abs() - TOL);
            assert_close(*d, v.abs());
        }
        assert_close(model.objective_flux_solution().unwrap(), 10.);
        assert_close(model.objective_solution().unwrap(), 30.);
        assert_close(model.total_absolute_flux().unwrap(), 30.);
        // The fixed column of the absolute flux problem is restored
        assert_eq!(
            model.msa_problem().unwrap().variable_bounds(3),
            Some((0., 1000.))
        );
        assert!(!model.msa_problem().unwrap().presolve());
    }

    #[test]
    fn min_objective_min_total() {
        let mut model = loop_model();
        model
            .set_objective_style(ObjectiveStyle::MinObjectiveMinTotal)
            .unwrap();
        assert!(model.run().unwrap().is_success());
        assert_close(model.objective_flux_solution().unwrap(), 0.);
        assert_close(model.objective_solution().unwrap(), 0.);
    }

    #[test]
    fn max_total_styles_are_unbounded() {
        let mut model = chain_model();
        model
            .set_objective_style(ObjectiveStyle::MaxObjectiveMaxTotal)
            .unwrap();
        let status = model.run().unwrap();
        assert!(!status.is_success());
        assert!(model.fluxes().is_none());
    }

    #[test]
    fn style_is_idempotent() {
        let mut model = chain_model();
        model.set_objective_coefficients(&[1., 2., 3., 4.]).unwrap();
        model
            .set_objective_style(ObjectiveStyle::MaxObjectiveMinTotal)
            .unwrap();
        let once = model.objective_coefficients();
        model
            .set_objective_style(ObjectiveStyle::MaxObjectiveMinTotal)
            .unwrap();
        assert_eq!(model.objective_coefficients(), once);
        assert_eq!(once, vec![0., 0., 0., 1.]);

        // Total flux styles keep whatever coefficients are there
        model.set_objective_coefficients(&[1., 2., 3., 4.]).unwrap();
        model
            .set_objective_style(ObjectiveStyle::MaximizeTotalFlux)
            .unwrap();
        assert_eq!(model.objective_coefficients(), vec![1., 2., 3., 4.]);
    }

    #[test]
    fn failed_run_clears_results() {
        let mut model = chain_model();
        model.run().unwrap();
        assert!(model.fluxes().is_some());
        model.set_reaction_bounds(3, 20., 1000.).unwrap();
        let status = model.run().unwrap();
        assert_eq!(status, OptimizationStatus::Infeasible);
        assert_ne!(status.code(), 0);
        assert!(model.fluxes().is_none());
        assert!(model.exchange_fluxes().is_none());
        assert!(model.objective_solution().is_none());
        assert!(model.objective_flux_solution().is_none());
    }

    #[test]
    fn failed_first_phase_stops_the_run() {
        let mut model = chain_model();
        model.set_reaction_bounds(3, 20., 1000.).unwrap();
        model
            .set_objective_style(ObjectiveStyle::MaxObjectiveMinTotal)
            .unwrap();
        assert_eq!(model.run().unwrap(), OptimizationStatus::Infeasible);
        assert!(model.absolute_fluxes().is_none());
    }

    #[test]
    fn objective_reaction_validation() {
        let mut model = chain_model();
        assert_eq!(model.set_objective_reaction(4).unwrap_err().code(), PARAMS_ERROR);
        model.set_objective_reaction(2).unwrap();
        assert_eq!(model.objective_reaction(), Some(2));
        assert_eq!(model.objective_coefficients(), vec![0., 0., 1., 0.]);
        assert!(model.set_objective_coefficients(&[1.]).is_err());
        assert!(model
            .set_objective_coefficients(&[1., f64::NAN, 0., 0.])
            .is_err());

        let mut empty = FbaModel::new_empty();
        assert_eq!(
            empty.set_objective_reaction(0).unwrap_err().code(),
            MODEL_NOT_INITIALIZED
        );
        assert_eq!(empty.run().unwrap_err(), ModelError::ModelNotInitialized);
    }

    #[test]
    fn two_phase_styles_need_objective_reaction() {
        let definition = ModelDefinition::new(1, 2, &[(0, 0, 1.), (0, 1, -1.)]);
        let mut model = FbaModel::from_definition(&definition).unwrap();
        model
            .set_objective_style(ObjectiveStyle::MinimizeTotalFlux)
            .unwrap();
        assert!(matches!(model.run(), Err(ModelError::Params(_))));
    }

    #[test]
    fn interior_point() {
        let mut model = loop_model();
        model.set_solver_method(SolverMethod::InteriorPoint).unwrap();
        assert_eq!(model.solver_method(), Some(SolverMethod::InteriorPoint));
        assert!(model.run().unwrap().is_success());
        assert!((model.objective_solution().unwrap() - 10.).abs() < 1e-4);
    }

    #[test]
    fn clones_are_independent() {
        let mut model = chain_model();
        let mut copy = model.clone();
        copy.set_exchange_upper_bounds(&[5., 1000.]).unwrap();
        model.run().unwrap();
        copy.run().unwrap();
        assert_close(model.objective_solution().unwrap(), 10.);
        assert_close(copy.objective_solution().unwrap(), 5.);
        assert_eq!(model.exchange_upper_bounds(), vec![10., 1000.]);
    }
}
