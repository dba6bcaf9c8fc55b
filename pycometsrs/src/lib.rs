use std::str::FromStr;

use cometsrs_core::metabolic_model::model::FbaModel;
use cometsrs_core::optimize::objective::ObjectiveStyle;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

fn value_error<E: std::fmt::Display>(err: E) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// A flux balance model of a single species
#[pyclass(name = "FbaModel")]
#[derive(Clone)]
struct PyFbaModel {
    inner: FbaModel,
}

#[pymethods]
impl PyFbaModel {
    /// Read a model from a model file
    #[staticmethod]
    fn from_file(path: &str) -> PyResult<Self> {
        let inner = FbaModel::from_model_file(path).map_err(value_error)?;
        Ok(PyFbaModel { inner })
    }

    /// Run the model, returning the integer status code (0 on success)
    fn run(&mut self) -> PyResult<i32> {
        let status = self.inner.run().map_err(value_error)?;
        Ok(status.code())
    }

    fn fluxes(&self) -> Option<Vec<f64>> {
        self.inner.fluxes().map(<[f64]>::to_vec)
    }

    fn exchange_fluxes(&self) -> Option<Vec<f64>> {
        self.inner.exchange_fluxes()
    }

    fn objective_solution(&self) -> Option<f64> {
        self.inner.objective_solution()
    }

    fn set_media_conditions(&mut self, media: Vec<f64>) -> PyResult<()> {
        self.inner.set_media_conditions(&media).map_err(value_error)
    }

    fn media_conditions(&self) -> Vec<f64> {
        self.inner.media_conditions()
    }

    fn set_objective_style(&mut self, style: &str) -> PyResult<()> {
        let style = ObjectiveStyle::from_str(style).map_err(value_error)?;
        self.inner.set_objective_style(style).map_err(value_error)
    }

    fn objective_style(&self) -> String {
        self.inner.objective_style().to_string()
    }

    fn reaction_names(&self) -> Vec<String> {
        self.inner.reaction_names()
    }

    fn exchange_reaction_names(&self) -> Vec<String> {
        self.inner.exchange_reaction_names()
    }

    /// Independent copy of this model
    fn copy(&self) -> Self {
        self.clone()
    }
}

/// A Python module implemented in Rust. The name of this function must match
/// the `lib.name` setting in the `Cargo.toml`, else Python will not be able to
/// import the module.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyFbaModel>()?;
    Ok(())
}
