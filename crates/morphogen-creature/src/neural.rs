//! Recurrent neural controller for creatures
//!
//! A minimal gated recurrent unit. The whole parameter set is one flat `f32`
//! buffer owned by the genome; the controller only keeps view descriptors into
//! it and owns its working state (input, gates, hidden state).

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::linalg::{self, Activation, LinalgError, MatrixView, VectorView};

/// Errors raised by controller construction and stepping
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrainError {
    /// Parameter buffer is smaller than the configuration requires
    #[error("parameter buffer holds {available} values, controller needs {required}")]
    InsufficientBufferSize { required: usize, available: usize },
    #[error("controller expects {expected} inputs, got {actual}")]
    InputSizeMismatch { expected: usize, actual: usize },
    #[error(transparent)]
    Linalg(#[from] LinalgError),
}

/// Controller dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BrainConfig {
    pub input_size: usize,
    pub hidden_size: usize,
    pub output_size: usize,
}

impl BrainConfig {
    pub fn new(input_size: usize, hidden_size: usize, output_size: usize) -> Self {
        Self {
            input_size,
            hidden_size,
            output_size,
        }
    }

    /// Recurrent state width. Outputs are the first `output_size` state units.
    pub fn state_size(&self) -> usize {
        self.output_size + self.hidden_size
    }

    /// Number of parameters: two biases, two input matrices, two state matrices
    pub fn required_parameter_size(&self) -> usize {
        let s = self.state_size();
        let i = self.input_size;
        2 * s + 2 * i * s + 2 * s * s
    }
}

/// Offsets of the six parameter blocks inside the flat buffer
///
/// Packed in this order: forget bias, candidate bias, input→forget,
/// input→candidate, state→forget, state→candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterLayout {
    pub bias_forget: VectorView,
    pub bias_candidate: VectorView,
    pub input_forget: MatrixView,
    pub input_candidate: MatrixView,
    pub state_forget: MatrixView,
    pub state_candidate: MatrixView,
}

impl ParameterLayout {
    /// Bind all blocks against a buffer of `buffer_len` values
    pub fn new(config: &BrainConfig, buffer_len: usize) -> Result<Self, BrainError> {
        let required = config.required_parameter_size();
        if buffer_len < required {
            return Err(BrainError::InsufficientBufferSize {
                required,
                available: buffer_len,
            });
        }

        let s = config.state_size();
        let i = config.input_size;

        let bias_forget = VectorView::new(0, s, buffer_len)?;
        let bias_candidate = VectorView::new(bias_forget.end(), s, buffer_len)?;
        let input_forget = MatrixView::new(bias_candidate.end(), s, i, buffer_len)?;
        let input_candidate = MatrixView::new(input_forget.end(), s, i, buffer_len)?;
        let state_forget = MatrixView::new(input_candidate.end(), s, s, buffer_len)?;
        let state_candidate = MatrixView::new(state_forget.end(), s, s, buffer_len)?;
        debug_assert_eq!(state_candidate.end(), required);

        Ok(Self {
            bias_forget,
            bias_candidate,
            input_forget,
            input_candidate,
            state_forget,
            state_candidate,
        })
    }

    /// One past the last parameter used
    pub fn end(&self) -> usize {
        self.state_candidate.end()
    }
}

/// GRU-style controller
///
/// ```text
/// f  = sigmoid(Wf·x + Uf·h + bf)
/// hc = tanh(Wh·x + Uh·(f⊙h) + bh)
/// h  = (1 - f)⊙h + f⊙hc
/// ```
#[derive(Debug, Clone)]
pub struct GruController {
    config: BrainConfig,
    layout: ParameterLayout,
    input: Array1<f32>,
    forget: Array1<f32>,
    hidden: Array1<f32>,
    candidate: Array1<f32>,
    // Scratch for the two matrix-vector products of each gate
    scratch: Array1<f32>,
}

impl GruController {
    /// Bind a controller to a parameter buffer
    ///
    /// Fails if `params` is smaller than `config.required_parameter_size()`.
    pub fn new(config: BrainConfig, params: &[f32]) -> Result<Self, BrainError> {
        let layout = ParameterLayout::new(&config, params.len())?;
        let s = config.state_size();

        Ok(Self {
            config,
            layout,
            input: Array1::zeros(config.input_size),
            forget: Array1::zeros(s),
            hidden: Array1::zeros(s),
            candidate: Array1::zeros(s),
            scratch: Array1::zeros(s),
        })
    }

    pub fn config(&self) -> &BrainConfig {
        &self.config
    }

    pub fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    pub fn input_size(&self) -> usize {
        self.config.input_size
    }

    pub fn hidden_size(&self) -> usize {
        self.config.hidden_size
    }

    pub fn output_size(&self) -> usize {
        self.config.output_size
    }

    pub fn parameter_count(&self) -> usize {
        self.config.required_parameter_size()
    }

    /// Copy the next input vector into the controller
    pub fn set_input(&mut self, values: &[f32]) -> Result<(), BrainError> {
        if values.len() != self.config.input_size {
            return Err(BrainError::InputSizeMismatch {
                expected: self.config.input_size,
                actual: values.len(),
            });
        }
        self.input
            .iter_mut()
            .zip(values)
            .for_each(|(dst, &src)| *dst = src);
        Ok(())
    }

    /// Advance the hidden state by one step using `params`
    ///
    /// `params` must be the buffer this controller was bound to (or one with
    /// the same layout); a buffer that shrank in the meantime is rejected.
    pub fn step(&mut self, params: &[f32]) -> Result<(), BrainError> {
        if params.len() < self.layout.end() {
            return Err(BrainError::InsufficientBufferSize {
                required: self.layout.end(),
                available: params.len(),
            });
        }
        let layout = self.layout;

        // Forget gate: f = sigmoid(Wf·x + Uf·h + bf)
        linalg::mat_vec_into(
            layout.input_forget.view(params)?,
            self.input.view(),
            self.forget.view_mut(),
        )?;
        linalg::mat_vec_into(
            layout.state_forget.view(params)?,
            self.hidden.view(),
            self.scratch.view_mut(),
        )?;
        self.forget += &self.scratch;
        self.forget += &layout.bias_forget.view(params)?;
        Activation::Sigmoid.apply(self.forget.view_mut());

        // Candidate: hc = tanh(Wh·x + Uh·(f⊙h) + bh)
        let gated = &self.forget * &self.hidden;
        linalg::mat_vec_into(
            layout.input_candidate.view(params)?,
            self.input.view(),
            self.candidate.view_mut(),
        )?;
        linalg::mat_vec_into(
            layout.state_candidate.view(params)?,
            gated.view(),
            self.scratch.view_mut(),
        )?;
        self.candidate += &self.scratch;
        self.candidate += &layout.bias_candidate.view(params)?;
        Activation::Tanh.apply(self.candidate.view_mut());

        // h = (1 - f)⊙h + f⊙hc
        ndarray::Zip::from(&mut self.hidden)
            .and(&self.forget)
            .and(&self.candidate)
            .for_each(|h, &f, &hc| *h = (1.0 - f) * *h + f * hc);

        Ok(())
    }

    /// Input vector of the last `set_input`
    pub fn input(&self) -> &[f32] {
        self.input.as_slice().unwrap_or(&[])
    }

    /// First `output_size` units of the hidden state
    pub fn output(&self) -> &[f32] {
        // Array1::zeros is always contiguous
        let state = self.hidden.as_slice().unwrap_or(&[]);
        &state[..self.config.output_size.min(state.len())]
    }

    /// Full hidden state (outputs followed by private units)
    pub fn hidden_state(&self) -> &Array1<f32> {
        &self.hidden
    }

    /// Zero the hidden state
    pub fn reset(&mut self) {
        self.hidden.fill(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn random_params(config: &BrainConfig, range: f32, seed: u64) -> Vec<f32> {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        (0..config.required_parameter_size())
            .map(|_| rng.random_range(-range..=range))
            .collect()
    }

    #[test]
    fn test_required_size_matches_blocks() {
        for (i, h, o) in [(1, 0, 1), (3, 2, 2), (10, 8, 5), (7, 16, 9)] {
            let config = BrainConfig::new(i, h, o);
            let s = o + h;
            let blocks = s + s + i * s + i * s + s * s + s * s;
            assert_eq!(config.required_parameter_size(), blocks);

            let layout = ParameterLayout::new(&config, blocks).unwrap();
            assert_eq!(layout.end(), blocks);
        }
    }

    #[test]
    fn test_layout_block_order() {
        let config = BrainConfig::new(2, 1, 2);
        let layout = ParameterLayout::new(&config, config.required_parameter_size()).unwrap();

        // state size 3, input size 2
        assert_eq!(layout.bias_forget.offset(), 0);
        assert_eq!(layout.bias_candidate.offset(), 3);
        assert_eq!(layout.input_forget.offset(), 6);
        assert_eq!(layout.input_candidate.offset(), 12);
        assert_eq!(layout.state_forget.offset(), 18);
        assert_eq!(layout.state_candidate.offset(), 27);
        assert_eq!(layout.end(), 36);
    }

    #[test]
    fn test_exact_buffer_accepted_short_buffer_rejected() {
        for (i, h, o) in [(1, 0, 1), (4, 3, 2), (9, 12, 6)] {
            let config = BrainConfig::new(i, h, o);
            let required = config.required_parameter_size();

            assert!(GruController::new(config, &vec![0.0; required]).is_ok());
            assert_eq!(
                GruController::new(config, &vec![0.0; required - 1]).unwrap_err(),
                BrainError::InsufficientBufferSize {
                    required,
                    available: required - 1
                }
            );
        }
    }

    #[test]
    fn test_zero_parameters_keep_zero_state() {
        let config = BrainConfig::new(5, 4, 3);
        let params = vec![0.0; config.required_parameter_size()];
        let mut brain = GruController::new(config, &params).unwrap();

        brain.set_input(&[1.0, -2.0, 3.0, 0.5, 9.0]).unwrap();
        brain.step(&params).unwrap();

        // sigmoid(0) = 0.5, tanh(0) = 0, so h = 0.5*0 + 0.5*0
        assert_eq!(brain.output().len(), 3);
        for &o in brain.output() {
            assert!(o.abs() < 1e-6);
        }
        for &f in brain.forget.iter() {
            assert!((f - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_output_bounded_under_extreme_inputs() {
        let config = BrainConfig::new(6, 5, 4);
        let params = random_params(&config, 4.0, 7);
        let mut brain = GruController::new(config, &params).unwrap();

        let inputs = [1e6_f32, -1e6, 3.0e4, -0.5, 0.0, 1e-3];
        for _ in 0..200 {
            brain.set_input(&inputs).unwrap();
            brain.step(&params).unwrap();
            for &o in brain.output() {
                assert!(o.is_finite());
                assert!((-1.0..=1.0).contains(&o));
            }
        }
    }

    #[test]
    fn test_input_size_mismatch() {
        let config = BrainConfig::new(3, 2, 1);
        let params = vec![0.0; config.required_parameter_size()];
        let mut brain = GruController::new(config, &params).unwrap();

        assert_eq!(
            brain.set_input(&[1.0, 2.0]),
            Err(BrainError::InputSizeMismatch {
                expected: 3,
                actual: 2
            })
        );
    }

    #[test]
    fn test_params_are_read_through_not_copied() {
        let config = BrainConfig::new(1, 0, 1);
        let mut params = vec![0.0; config.required_parameter_size()];
        let mut brain = GruController::new(config, &params).unwrap();

        brain.step(&params).unwrap();
        assert!(brain.output()[0].abs() < 1e-6);

        // Raising the forget bias and candidate bias after binding must take effect
        let layout = *brain.layout();
        layout.bias_forget.set(&mut params, 0, 20.0).unwrap();
        layout.bias_candidate.set(&mut params, 0, 20.0).unwrap();
        brain.step(&params).unwrap();
        assert!(brain.output()[0] > 0.99);
    }

    #[test]
    fn test_step_rejects_shrunk_buffer() {
        let config = BrainConfig::new(2, 2, 2);
        let params = vec![0.0; config.required_parameter_size()];
        let mut brain = GruController::new(config, &params).unwrap();
        assert!(matches!(
            brain.step(&params[..params.len() - 1]),
            Err(BrainError::InsufficientBufferSize { .. })
        ));
    }

    #[test]
    fn test_reset_zeroes_hidden_state() {
        let config = BrainConfig::new(2, 3, 2);
        let params = random_params(&config, 1.0, 3);
        let mut brain = GruController::new(config, &params).unwrap();

        brain.set_input(&[0.7, -0.3]).unwrap();
        for _ in 0..5 {
            brain.step(&params).unwrap();
        }
        assert!(brain.hidden_state().iter().any(|h| h.abs() > 0.0));

        brain.reset();
        assert!(brain.hidden_state().iter().all(|&h| h == 0.0));
    }

    #[test]
    fn test_step_deterministic() {
        let config = BrainConfig::new(4, 3, 2);
        let params = random_params(&config, 1.0, 11);
        let mut a = GruController::new(config, &params).unwrap();
        let mut b = GruController::new(config, &params).unwrap();

        for t in 0..10 {
            let x = [t as f32 * 0.1, 0.2, -0.3, 1.0];
            a.set_input(&x).unwrap();
            b.set_input(&x).unwrap();
            a.step(&params).unwrap();
            b.step(&params).unwrap();
        }
        assert_eq!(a.output(), b.output());
    }
}
