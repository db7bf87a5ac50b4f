//! Inference runtime seam and the bundled candle runtime.
//!
//! The bundled artifact is a safetensors file holding a feed-forward network.
//! Layer `i` is stored as `layer{i}.weight` with shape `[out, in]` and
//! `layer{i}.bias` with shape `[out]`. Its activation is read from the
//! `layer{i}.activation` metadata entry and defaults to linear.

use std::str::FromStr;

use candle_core::{DType, Device, Tensor};
use safetensors::SafeTensors;

use crate::error::RuntimeError;

/// A loaded model that maps a dense input vector to a dense output vector.
///
/// Implementations are used by one caller at a time; the engine holds them
/// behind a lock.
pub trait InferenceRuntime: Send {
    /// Input width the artifact declares, if it declares one.
    fn input_len(&self) -> Option<usize>;

    /// Run one forward pass.
    fn run(&mut self, input: &[f32]) -> Result<Vec<f32>, RuntimeError>;
}

/// Turns a serialized artifact into a runtime.
pub trait ModelLoader: Send + Sync {
    fn load(&self, bytes: &[u8]) -> Result<Box<dyn InferenceRuntime>, RuntimeError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    #[default]
    Linear,
    Relu,
    Tanh,
    Sigmoid,
}

impl Activation {
    fn apply(self, x: Tensor) -> candle_core::Result<Tensor> {
        match self {
            Self::Linear => Ok(x),
            Self::Relu => x.relu(),
            Self::Tanh => x.tanh(),
            // 1 / (1 + e^-x)
            Self::Sigmoid => x.neg()?.exp()?.affine(1.0, 1.0)?.recip(),
        }
    }
}

impl FromStr for Activation {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linear" | "" => Ok(Self::Linear),
            "relu" => Ok(Self::Relu),
            "tanh" => Ok(Self::Tanh),
            "sigmoid" => Ok(Self::Sigmoid),
            other => Err(RuntimeError::InvalidModel(format!(
                "unknown activation '{}'",
                other
            ))),
        }
    }
}

fn map_candle(e: candle_core::Error) -> RuntimeError {
    RuntimeError::Other(format!("tensor operation failed: {}", e))
}

fn invalid(message: impl Into<String>) -> RuntimeError {
    RuntimeError::InvalidModel(message.into())
}

/// Fully connected layer: `y = act(x @ W^T + b)`.
#[derive(Debug)]
struct DenseLayer {
    /// Transposed at load time, `[in, out]`
    weight_t: Tensor,
    bias: Tensor,
    activation: Activation,
}

impl DenseLayer {
    fn forward(&self, x: &Tensor) -> candle_core::Result<Tensor> {
        let y = x.matmul(&self.weight_t)?.broadcast_add(&self.bias)?;
        self.activation.apply(y)
    }
}

/// Feed-forward network evaluated with candle on the CPU.
#[derive(Debug)]
pub struct TensorNetwork {
    input_len: usize,
    layers: Vec<DenseLayer>,
    device: Device,
}

impl TensorNetwork {
    /// Parse a safetensors artifact. Layer shapes must chain from the first
    /// layer's input width down to one output.
    pub fn from_safetensors(bytes: &[u8]) -> Result<Self, RuntimeError> {
        let tensors = SafeTensors::deserialize(bytes).map_err(|e| invalid(e.to_string()))?;
        let (_, metadata) =
            SafeTensors::read_metadata(bytes).map_err(|e| invalid(e.to_string()))?;
        let metadata = metadata.metadata().clone().unwrap_or_default();

        let device = Device::Cpu;
        let mut layers: Vec<DenseLayer> = Vec::new();
        let mut input_len = 0;
        let mut width: Option<usize> = None;

        while let Ok(weight) = tensors.tensor(&format!("layer{}.weight", layers.len())) {
            let index = layers.len();
            let bias = tensors
                .tensor(&format!("layer{}.bias", index))
                .map_err(|_| invalid(format!("layer {} has no bias", index)))?;

            if weight.dtype() != safetensors::Dtype::F32 || bias.dtype() != safetensors::Dtype::F32 {
                return Err(invalid(format!("layer {}: tensors must be F32", index)));
            }
            let &[rows, cols] = weight.shape() else {
                return Err(invalid(format!(
                    "layer {}: weight shape {:?} is not 2-D",
                    index,
                    weight.shape()
                )));
            };
            if bias.shape() != [rows] {
                return Err(invalid(format!(
                    "layer {}: bias shape {:?}, expected [{}]",
                    index,
                    bias.shape(),
                    rows
                )));
            }
            match width {
                None => input_len = cols,
                Some(previous) if previous != cols => {
                    return Err(invalid(format!(
                        "layer {}: expected {} inputs, weight has {}",
                        index, previous, cols
                    )));
                }
                Some(_) => {}
            }
            width = Some(rows);

            let activation = metadata
                .get(&format!("layer{}.activation", index))
                .map(|name| name.parse::<Activation>())
                .transpose()?
                .unwrap_or_default();

            let weight_t = Tensor::from_raw_buffer(weight.data(), DType::F32, &[rows, cols], &device)
                .and_then(|w| w.t()?.contiguous())
                .map_err(|e| invalid(e.to_string()))?;
            let bias = Tensor::from_raw_buffer(bias.data(), DType::F32, &[rows], &device)
                .map_err(|e| invalid(e.to_string()))?;

            layers.push(DenseLayer {
                weight_t,
                bias,
                activation,
            });
        }

        match width {
            None => Err(invalid("network has no layers")),
            Some(1) => Ok(Self {
                input_len,
                layers,
                device,
            }),
            Some(outputs) => Err(invalid(format!(
                "network has {} outputs, expected 1",
                outputs
            ))),
        }
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }
}

impl InferenceRuntime for TensorNetwork {
    fn input_len(&self) -> Option<usize> {
        Some(self.input_len)
    }

    fn run(&mut self, input: &[f32]) -> Result<Vec<f32>, RuntimeError> {
        if input.len() != self.input_len {
            return Err(RuntimeError::InputShape {
                expected: self.input_len,
                actual: input.len(),
            });
        }

        let mut hidden =
            Tensor::from_slice(input, (1, self.input_len), &self.device).map_err(map_candle)?;
        for layer in &self.layers {
            hidden = layer.forward(&hidden).map_err(map_candle)?;
        }
        let output: Vec<f32> = hidden
            .flatten_all()
            .and_then(|t| t.to_vec1())
            .map_err(map_candle)?;

        if output.iter().any(|v| !v.is_finite()) {
            return Err(RuntimeError::NonFinite);
        }
        Ok(output)
    }
}

/// Loads [`TensorNetwork`] artifacts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafetensorsModelLoader;

impl ModelLoader for SafetensorsModelLoader {
    fn load(&self, bytes: &[u8]) -> Result<Box<dyn InferenceRuntime>, RuntimeError> {
        let network = TensorNetwork::from_safetensors(bytes)?;
        tracing::debug!(
            "Loaded tensor network: {} inputs, {} layers",
            network.input_len,
            network.layer_count()
        );
        Ok(Box::new(network))
    }
}
