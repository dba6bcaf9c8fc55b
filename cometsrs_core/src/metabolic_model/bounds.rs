//! Flux bounds of a model, for all reactions and for the exchange reactions
//!
//! Bounds are validated as a whole before any of them is applied, so a failed
//! call leaves the model unchanged. Exchange scoped calls are indexed by the
//! position of the reaction in the exchange list.
use crate::metabolic_model::model::{check_bounds, check_length, FbaModel, ModelError, Network};

impl Network {
    fn current_bounds(&self) -> (Vec<f64>, Vec<f64>) {
        self.reactions
            .iter()
            .map(|r| (r.lower_bound, r.upper_bound))
            .unzip()
    }

    fn exchange_bounds(&self) -> (Vec<f64>, Vec<f64>) {
        self.exchanges
            .iter()
            .map(|e| {
                let reaction = &self.reactions[e.reaction];
                (reaction.lower_bound, reaction.upper_bound)
            })
            .unzip()
    }

    fn apply_bounds(&mut self, lower: &[f64], upper: &[f64]) -> Result<(), ModelError> {
        check_length("lower bounds", self.reactions.len(), lower.len())?;
        check_bounds(lower, upper)?;
        for (reaction, (&lb, &ub)) in self.reactions.iter_mut().zip(lower.iter().zip(upper)) {
            reaction.lower_bound = lb;
            reaction.upper_bound = ub;
        }
        Ok(())
    }

    fn apply_exchange_bounds(&mut self, lower: &[f64], upper: &[f64]) -> Result<(), ModelError> {
        check_length("exchange lower bounds", self.exchanges.len(), lower.len())?;
        check_bounds(lower, upper)?;
        for (exchange, (&lb, &ub)) in self.exchanges.iter().zip(lower.iter().zip(upper)) {
            let reaction = &mut self.reactions[exchange.reaction];
            reaction.lower_bound = lb;
            reaction.upper_bound = ub;
        }
        Ok(())
    }
}

impl FbaModel {
    // region All Reactions
    /// Current lower bounds of all reactions
    pub fn lower_bounds(&self) -> Vec<f64> {
        self.reactions().iter().map(|r| r.lower_bound).collect()
    }

    /// Current upper bounds of all reactions
    pub fn upper_bounds(&self) -> Vec<f64> {
        self.reactions().iter().map(|r| r.upper_bound).collect()
    }

    /// Set the current bounds of all reactions
    ///
    /// # Examples
    /// ```rust
    /// use cometsrs_core::metabolic_model::definition::ModelDefinition;
    /// use cometsrs_core::metabolic_model::model::FbaModel;
    /// let definition = ModelDefinition::new(1, 2, &[(0, 0, 1.), (0, 1, -1.)]);
    /// let mut model = FbaModel::from_definition(&definition).unwrap();
    /// model.set_bounds(&[0., -1.], &[5., 1.]).unwrap();
    /// assert_eq!(model.lower_bounds(), vec![0., -1.]);
    /// assert!(model.set_bounds(&[2., 0.], &[1., 1.]).is_err());
    /// ```
    pub fn set_bounds(&mut self, lower: &[f64], upper: &[f64]) -> Result<(), ModelError> {
        self.network_mut()?.apply_bounds(lower, upper)
    }

    /// Set the current lower bounds of all reactions, keeping the upper bounds
    pub fn set_lower_bounds(&mut self, lower: &[f64]) -> Result<(), ModelError> {
        let network = self.network_mut()?;
        let (_, upper) = network.current_bounds();
        network.apply_bounds(lower, &upper)
    }

    /// Set the current upper bounds of all reactions, keeping the lower bounds
    pub fn set_upper_bounds(&mut self, upper: &[f64]) -> Result<(), ModelError> {
        let network = self.network_mut()?;
        let (lower, _) = network.current_bounds();
        network.apply_bounds(&lower, upper)
    }

    /// Set the current bounds of a single reaction
    pub fn set_reaction_bounds(
        &mut self,
        reaction: usize,
        lower: f64,
        upper: f64,
    ) -> Result<(), ModelError> {
        let network = self.network_mut()?;
        let num_reactions = network.reactions.len();
        let target = network.reactions.get_mut(reaction).ok_or_else(|| {
            ModelError::Params(format!(
                "reaction {} is out of range for {} reactions",
                reaction, num_reactions
            ))
        })?;
        check_bounds(&[lower], &[upper])?;
        target.lower_bound = lower;
        target.upper_bound = upper;
        Ok(())
    }
    // endregion All Reactions

    // region Base Bounds
    pub fn base_lower_bounds(&self) -> Vec<f64> {
        self.reactions().iter().map(|r| r.base_lower_bound).collect()
    }

    pub fn base_upper_bounds(&self) -> Vec<f64> {
        self.reactions().iter().map(|r| r.base_upper_bound).collect()
    }

    /// Set the base bounds of all reactions, the current bounds are left alone
    pub fn set_base_bounds(&mut self, lower: &[f64], upper: &[f64]) -> Result<(), ModelError> {
        let network = self.network_mut()?;
        check_length("lower bounds", network.reactions.len(), lower.len())?;
        check_bounds(lower, upper)?;
        for (reaction, (&lb, &ub)) in network.reactions.iter_mut().zip(lower.iter().zip(upper)) {
            reaction.base_lower_bound = lb;
            reaction.base_upper_bound = ub;
        }
        Ok(())
    }

    /// Restore the current bounds of every reaction to its base bounds
    pub fn reset_bounds(&mut self) -> Result<(), ModelError> {
        self.network_mut()?
            .reactions
            .iter_mut()
            .for_each(|r| r.reset_bounds());
        Ok(())
    }
    // endregion Base Bounds

    // region Exchange Reactions
    pub fn exchange_lower_bounds(&self) -> Vec<f64> {
        self.network
            .as_ref()
            .map(|n| n.exchange_bounds().0)
            .unwrap_or_default()
    }

    pub fn exchange_upper_bounds(&self) -> Vec<f64> {
        self.network
            .as_ref()
            .map(|n| n.exchange_bounds().1)
            .unwrap_or_default()
    }

    /// Set the bounds of the exchange reactions
    pub fn set_exchange_bounds(&mut self, lower: &[f64], upper: &[f64]) -> Result<(), ModelError> {
        self.network_mut()?.apply_exchange_bounds(lower, upper)
    }

    pub fn set_exchange_lower_bounds(&mut self, lower: &[f64]) -> Result<(), ModelError> {
        let network = self.network_mut()?;
        let (_, upper) = network.exchange_bounds();
        network.apply_exchange_bounds(lower, &upper)
    }

    pub fn set_exchange_upper_bounds(&mut self, upper: &[f64]) -> Result<(), ModelError> {
        let network = self.network_mut()?;
        let (lower, _) = network.exchange_bounds();
        network.apply_exchange_bounds(&lower, upper)
    }

    /// Set the availability of the exchanged metabolites
    ///
    /// `media` holds the new lower bound of every exchange reaction; uptake is
    /// negative flux through an outward oriented exchange reaction, so `-10`
    /// allows an uptake of up to 10.
    pub fn set_media_conditions(&mut self, media: &[f64]) -> Result<(), ModelError> {
        self.set_exchange_lower_bounds(media)
    }

    /// Maximum uptake allowed through every exchange reaction, the negated lower bounds
    pub fn media_conditions(&self) -> Vec<f64> {
        self.exchange_lower_bounds().into_iter().map(|lb| -lb).collect()
    }
    // endregion Exchange Reactions
}

#[cfg(test)]
mod tests {
    use crate::metabolic_model::model::tests::chain_model;
    use crate::metabolic_model::model::{FbaModel, ModelError, MODEL_NOT_INITIALIZED, PARAMS_ERROR};

    #[test]
    fn bounds_round_trip() {
        let mut model = chain_model();
        let lower = vec![-3., -2.5, 0., 1.];
        let upper = vec![-3., 4., f64::INFINITY, 1.];
        model.set_bounds(&lower, &upper).unwrap();
        assert_eq!(model.lower_bounds(), lower);
        assert_eq!(model.upper_bounds(), upper);
        // Base bounds are not touched by current bound changes
        assert_eq!(model.base_lower_bounds(), vec![0., 0., 0., 0.]);
    }

    #[test]
    fn invalid_bounds_leave_model_unchanged() {
        let mut model = chain_model();
        let before = (model.lower_bounds(), model.upper_bounds());
        let err = model
            .set_bounds(&[0., 0., 5., 0.], &[1., 1., 4., 1.])
            .unwrap_err();
        assert_eq!(err.code(), PARAMS_ERROR);
        assert!(model.set_bounds(&[0., 0.], &[1., 1.]).is_err());
        assert!(model.set_bounds(&[0., 0., 0., 0.], &[1., 1., 1.]).is_err());
        assert!(model
            .set_bounds(&[0., f64::NAN, 0., 0.], &[1., 1., 1., 1.])
            .is_err());
        assert!(model.set_upper_bounds(&[-1., 1., 1., 1.]).is_err());
        assert_eq!((model.lower_bounds(), model.upper_bounds()), before);
    }

    #[test]
    fn single_reaction_bounds() {
        let mut model = chain_model();
        model.set_reaction_bounds(2, -1., 1.).unwrap();
        assert_eq!(model.lower_bounds()[2], -1.);
        assert_eq!(model.upper_bounds()[2], 1.);
        assert!(model.set_reaction_bounds(4, 0., 1.).is_err());
        assert!(model.set_reaction_bounds(2, 1., 0.).is_err());
    }

    #[test]
    fn reset_to_base() {
        let mut model = chain_model();
        model.set_lower_bounds(&[-1., -1., -1., -1.]).unwrap();
        model.reset_bounds().unwrap();
        assert_eq!(model.lower_bounds(), model.base_lower_bounds());

        model
            .set_base_bounds(&[1., 1., 1., 1.], &[2., 2., 2., 2.])
            .unwrap();
        assert_eq!(model.lower_bounds(), vec![0., 0., 0., 0.]);
        model.reset_bounds().unwrap();
        assert_eq!(model.lower_bounds(), vec![1., 1., 1., 1.]);
        assert_eq!(model.upper_bounds(), vec![2., 2., 2., 2.]);
    }

    #[test]
    fn exchange_bounds_map_to_reactions() {
        let mut model = chain_model();
        model.set_exchange_bounds(&[-5., -1.], &[5., 1.]).unwrap();
        assert_eq!(model.lower_bounds(), vec![-5., 0., 0., -1.]);
        assert_eq!(model.upper_bounds(), vec![5., 1000., 1000., 1.]);
        model.set_exchange_upper_bounds(&[0., 0.]).unwrap();
        assert_eq!(model.exchange_upper_bounds(), vec![0., 0.]);
        assert!(model.set_exchange_lower_bounds(&[1., 0.]).is_err());
        assert!(model.set_exchange_lower_bounds(&[0.]).is_err());
    }

    #[test]
    fn media_round_trip() {
        let mut model = chain_model();
        model.set_exchange_upper_bounds(&[0., 1000.]).unwrap();
        model.set_media_conditions(&[-10., 0.]).unwrap();
        assert_eq!(model.lower_bounds()[0], -10.);
        assert_eq!(model.media_conditions(), vec![10., 0.]);
    }

    #[test]
    fn uninitialized() {
        let mut model = FbaModel::new_empty();
        assert_eq!(
            model.set_bounds(&[], &[]).unwrap_err(),
            ModelError::ModelNotInitialized
        );
        assert_eq!(
            model.set_media_conditions(&[-1.]).unwrap_err().code(),
            MODEL_NOT_INITIALIZED
        );
        assert_eq!(model.reset_bounds().unwrap_err().code(), MODEL_NOT_INITIALIZED);
        assert!(model.lower_bounds().is_empty());
        assert!(model.media_conditions().is_empty());
    }
}
