//! Implicit time integrators for DAE models.

use crate::error::{SimError, SimResult};
use crate::model::DaeModel;
use kps_solver::{NewtonConfig, SolverResult, newton_solve};
use nalgebra::DVector;

/// Trait for time integrators.
pub trait Integrator {
    /// Advance `(y, yd)` at `t` by `dt`, returning the new state and its
    /// derivative.
    fn step<M: DaeModel>(
        &self,
        model: &mut M,
        t: f64,
        y: &[f64],
        yd: &[f64],
        dt: f64,
    ) -> SimResult<(Vec<f64>, Vec<f64>)>;
}

/// Backward Euler: solve `F(t + h, y1, (y1 - y0) / h) = 0` for `y1`.
///
/// The Newton iteration starts from the explicit predictor `y0 + h * yd0`
/// and uses a finite-difference Jacobian of the whole residual.
#[derive(Clone, Debug, Default)]
pub struct ImplicitEuler {
    pub newton: NewtonConfig,
}

impl Integrator for ImplicitEuler {
    fn step<M: DaeModel>(
        &self,
        model: &mut M,
        t: f64,
        y: &[f64],
        yd: &[f64],
        dt: f64,
    ) -> SimResult<(Vec<f64>, Vec<f64>)> {
        let n = model.dimension();
        if y.len() != n || yd.len() != n {
            return Err(SimError::InvalidArg {
                what: "state length does not match the model dimension",
            });
        }

        let t1 = t + dt;
        let y0 = DVector::from_column_slice(y);
        let predictor = &y0 + dt * DVector::from_column_slice(yd);
        let derivative = |y1: &DVector<f64>| (y1 - &y0) / dt;

        let mut res = vec![0.0; n];
        let solution = {
            let model = &mut *model;
            let res = &mut res;
            let equations = |y1: &DVector<f64>| -> SolverResult<DVector<f64>> {
                let yd1 = derivative(y1);
                model.residual(t1, y1.as_slice(), yd1.as_slice(), res.as_mut_slice())?;
                Ok(DVector::from_column_slice(res.as_slice()))
            };
            newton_solve(predictor, equations, &self.newton)?
        };

        let yd1 = derivative(&solution.x);
        // Leave the model holding the accepted state.
        model.residual(t1, solution.x.as_slice(), yd1.as_slice(), &mut res)?;

        Ok((
            solution.x.as_slice().to_vec(),
            yd1.as_slice().to_vec(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kps_model::ModelResult;

    /// y' = -y
    struct Decay;

    impl DaeModel for Decay {
        type Output = ();

        fn dimension(&self) -> usize {
            1
        }

        fn residual(&mut self, _t: f64, y: &[f64], yd: &[f64], res: &mut [f64]) -> ModelResult<()> {
            res[0] = yd[0] + y[0];
            Ok(())
        }

        fn output(&self) {}
    }

    #[test]
    fn backward_euler_matches_closed_form() {
        let dt = 0.1;
        let (y1, yd1) = ImplicitEuler::default()
            .step(&mut Decay, 0.0, &[1.0], &[-1.0], dt)
            .unwrap();
        let expected = 1.0 / (1.0 + dt);
        assert!((y1[0] - expected).abs() < 1e-6);
        assert!((yd1[0] + expected).abs() < 1e-5);
    }

    #[test]
    fn dimension_mismatch_is_rejected() {
        let err = ImplicitEuler::default()
            .step(&mut Decay, 0.0, &[1.0, 2.0], &[0.0, 0.0], 0.1)
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidArg { .. }));
    }
}
