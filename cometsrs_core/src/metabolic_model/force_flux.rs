//! Runs with a temporary coupling between two reaction fluxes
use std::ops::{Deref, DerefMut};

use crate::metabolic_model::model::{FbaModel, ModelError, Network};
use crate::optimize::solvers::solver_for;
use crate::optimize::OptimizationStatus;

/// Id of the coupling row while it is part of the problems
pub const FORCE_FLUX_ROW: &str = "force_flux";

/// Holds the coupling row in both problems, removing it when dropped
struct ForceFluxRow<'a> {
    network: &'a mut Network,
}

impl<'a> ForceFluxRow<'a> {
    /// Add `x1 - alpha * x2 >= 0` to the standard and the absolute flux problem
    fn add(network: &'a mut Network, x1: usize, x2: usize, alpha: f64) -> Result<Self, ModelError> {
        let terms: Vec<(usize, f64)> = if x1 == x2 {
            vec![(x1, 1. - alpha)]
        } else {
            vec![(x1, 1.), (x2, -alpha)]
        }
        .into_iter()
        .filter(|&(_, c)| c != 0.)
        .collect();
        network
            .standard
            .add_new_inequality_constraint(FORCE_FLUX_ROW, &terms, 0., f64::INFINITY)?;
        // The guard exists before the second row goes in, so a failure there
        // still removes the first one
        let guard = ForceFluxRow { network };
        guard
            .network
            .msa
            .add_new_inequality_constraint(FORCE_FLUX_ROW, &terms, 0., f64::INFINITY)?;
        Ok(guard)
    }
}

impl Deref for ForceFluxRow<'_> {
    type Target = Network;

    fn deref(&self) -> &Network {
        self.network
    }
}

impl DerefMut for ForceFluxRow<'_> {
    fn deref_mut(&mut self) -> &mut Network {
        self.network
    }
}

impl Drop for ForceFluxRow<'_> {
    fn drop(&mut self) {
        self.network.standard.remove_constraint(FORCE_FLUX_ROW);
        self.network.msa.remove_constraint(FORCE_FLUX_ROW);
    }
}

impl FbaModel {
    /// Run the model while forcing `flux[x1] >= alpha * flux[x2]`
    ///
    /// The coupling row only exists for the duration of this call, the row
    /// counts of both problems are the same before and after.
    pub fn run_force_flux(
        &mut self,
        x1: usize,
        x2: usize,
        alpha: f64,
    ) -> Result<OptimizationStatus, ModelError> {
        let settings = self.settings;
        let network = self.network_mut()?;
        let n = network.reactions.len();
        if x1 >= n || x2 >= n {
            return Err(ModelError::Params(format!(
                "force flux reactions ({}, {}) are out of range for {} reactions",
                x1, x2, n
            )));
        }
        if !alpha.is_finite() {
            return Err(ModelError::Params(format!("alpha {} is not finite", alpha)));
        }
        let solver = solver_for(network.solver_method, settings)?;
        let mut coupled = ForceFluxRow::add(network, x1, x2, alpha)?;
        log::debug!("Forcing flux {} >= {} * flux {}", x1, alpha, x2);
        coupled.run(solver.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::model::tests::chain_model;
    use crate::optimize::objective::ObjectiveStyle;

    fn row_counts(model: &FbaModel) -> (usize, usize) {
        (
            model.standard_problem().unwrap().num_constraints(),
            model.msa_problem().unwrap().num_constraints(),
        )
    }

    #[test]
    fn non_binding_coupling_keeps_optimum() {
        let mut model = chain_model();
        model.run().unwrap();
        let free = model.objective_solution().unwrap();
        let objective = model.objective_reaction().unwrap();
        let status = model.run_force_flux(objective, objective, 1.).unwrap();
        assert!(status.is_success());
        assert!((model.objective_solution().unwrap() - free).abs() < 1e-9);
    }

    #[test]
    fn binding_coupling() {
        // Two parallel routes from A to B, the second forced to carry twice the first
        let definition = {
            let mut d = crate::metabolic_model::definition::ModelDefinition::new(
                2,
                4,
                &[
                    (0, 0, 1.),
                    (0, 1, -1.),
                    (0, 2, -1.),
                    (1, 1, 1.),
                    (1, 2, 1.),
                    (1, 3, -1.),
                ],
            );
            d.lower_bounds = vec![0.; 4];
            d.upper_bounds = vec![9., 1000., 1000., 1000.];
            d.objective = vec![(3, 1.)];
            d
        };
        let mut model = FbaModel::from_definition(&definition).unwrap();
        let before = row_counts(&model);
        // R1 free, and R2 >= 2 * R1
        let status = model.run_force_flux(2, 1, 2.).unwrap();
        assert!(status.is_success());
        let fluxes = model.fluxes().unwrap();
        assert!((model.objective_solution().unwrap() - 9.).abs() < 1e-9);
        assert!(fluxes[2] >= 2. * fluxes[1] - 1e-9);
        assert_eq!(row_counts(&model), before);
    }

    #[test]
    fn row_counts_are_unchanged() {
        let mut model = chain_model();
        let before = row_counts(&model);
        for style in ObjectiveStyle::ALL {
            model.set_objective_style(style).unwrap();
            for _ in 0..3 {
                model.run_force_flux(0, 3, 0.5).unwrap();
                assert_eq!(row_counts(&model), before);
            }
        }
        assert!(model
            .standard_problem()
            .unwrap()
            .constraint(FORCE_FLUX_ROW)
            .is_none());
    }

    #[test]
    fn row_removed_when_run_fails() {
        let mut model = chain_model();
        let before = row_counts(&model);
        // Two phase style without an objective reaction is a configuration error
        model.network_mut().unwrap().objective_reaction = None;
        model
            .set_objective_style(ObjectiveStyle::MinimizeTotalFlux)
            .unwrap();
        assert!(model.run_force_flux(0, 1, 1.).is_err());
        assert_eq!(row_counts(&model), before);
    }

    #[test]
    fn infeasible_coupling() {
        let mut model = chain_model();
        // Every flux of the chain is equal, so R1 >= 2 * R2 only holds at zero
        model.set_reaction_bounds(3, 1., 1000.).unwrap();
        let status = model.run_force_flux(1, 2, 2.).unwrap();
        assert_eq!(status, OptimizationStatus::Infeasible);
        assert!(model.fluxes().is_none());
    }

    #[test]
    fn invalid_arguments() {
        let mut model = chain_model();
        assert!(model.run_force_flux(4, 0, 1.).is_err());
        assert!(model.run_force_flux(0, 1, f64::NAN).is_err());
        assert!(FbaModel::new_empty().run_force_flux(0, 0, 1.).is_err());
    }
}
