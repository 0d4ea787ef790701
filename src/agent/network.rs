use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fully connected layer, weights laid out as (inputs, outputs)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    pub weights: Array2<f32>,
    pub bias: Array1<f32>,
}

impl Layer {
    /// Xavier uniform initialization, zero bias
    pub fn new(inputs: usize, outputs: usize, rng: &mut impl Rng) -> Self {
        let limit = (6. / (inputs + outputs) as f32).sqrt();
        let weights = Array2::from_shape_fn((inputs, outputs), |_| rng.gen_range(-limit..limit));

        Self {
            weights,
            bias: Array1::zeros(outputs),
        }
    }

    pub fn inputs(&self) -> usize {
        self.weights.nrows()
    }

    pub fn outputs(&self) -> usize {
        self.weights.ncols()
    }

    fn forward(&self, input: &ArrayView1<f32>) -> Array1<f32> {
        input.dot(&self.weights) + &self.bias
    }
}

/// Multi-layer perceptron mapping an observation to one value per action.
/// ReLU between layers, linear output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QNetwork {
    layers: Vec<Layer>,
}

impl QNetwork {
    pub fn new(sizes: &[usize], rng: &mut impl Rng) -> Self {
        let layers = sizes
            .windows(2)
            .map(|pair| Layer::new(pair[0], pair[1], rng))
            .collect();

        Self { layers }
    }

    pub fn from_layers(layers: Vec<Layer>) -> Self {
        Self { layers }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map_or(0, Layer::inputs)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map_or(0, Layer::outputs)
    }

    /// Layers chain: every layer takes what the previous one gives
    pub fn is_consistent(&self) -> bool {
        !self.layers.is_empty()
            && self
                .layers
                .windows(2)
                .all(|pair| pair[0].outputs() == pair[1].inputs())
            && self
                .layers
                .iter()
                .all(|layer| layer.bias.len() == layer.outputs())
    }

    pub fn forward(&self, input: &[f32]) -> Array1<f32> {
        self.forward_with_inputs(input).0
    }

    /// Also returns the input each layer saw, which backpropagation needs
    pub fn forward_with_inputs(&self, input: &[f32]) -> (Array1<f32>, Vec<Array1<f32>>) {
        let mut layer_inputs = Vec::with_capacity(self.layers.len());
        let mut activation = Array1::from(input.to_vec());

        for (index, layer) in self.layers.iter().enumerate() {
            let mut output = layer.forward(&activation.view());
            if index + 1 < self.layers.len() {
                output.mapv_inplace(|x| x.max(0.));
            }
            layer_inputs.push(activation);
            activation = output;
        }

        (activation, layer_inputs)
    }

    /// Accumulates the gradients of a loss with respect to every parameter, given
    /// the loss gradient at the output.
    pub fn backward(
        &self,
        layer_inputs: &[Array1<f32>],
        output_grad: Array1<f32>,
        grads: &mut Gradients,
    ) {
        let mut grad = output_grad;

        for index in (0..self.layers.len()).rev() {
            let input = &layer_inputs[index];
            let outer = input
                .view()
                .insert_axis(Axis(1))
                .dot(&grad.view().insert_axis(Axis(0)));

            grads.weights[index] += &outer;
            grads.bias[index] += &grad;

            if index > 0 {
                let mut previous = self.layers[index].weights.dot(&grad);
                // ReLU passes gradient only where it was active
                previous.zip_mut_with(input, |g, activation| {
                    if *activation <= 0. {
                        *g = 0.
                    }
                });
                grad = previous;
            }
        }
    }

    /// Plain gradient descent on averaged gradients, clipped to `max_norm`
    pub fn apply_gradients(&mut self, grads: &Gradients, learning_rate: f32, samples: usize, max_norm: f32) {
        if samples == 0 {
            return;
        }

        let mut scale = 1. / samples as f32;
        let norm = grads.norm() * scale;
        if norm > max_norm && norm > 0. {
            scale *= max_norm / norm;
        }

        for (index, layer) in self.layers.iter_mut().enumerate() {
            layer
                .weights
                .scaled_add(-learning_rate * scale, &grads.weights[index]);
            layer.bias.scaled_add(-learning_rate * scale, &grads.bias[index]);
        }
    }
}

/// Summed parameter gradients, shaped like the network
#[derive(Debug, Clone)]
pub struct Gradients {
    weights: Vec<Array2<f32>>,
    bias: Vec<Array1<f32>>,
}

impl Gradients {
    pub fn zeros_like(network: &QNetwork) -> Self {
        Self {
            weights: network
                .layers
                .iter()
                .map(|layer| Array2::zeros(layer.weights.raw_dim()))
                .collect(),
            bias: network
                .layers
                .iter()
                .map(|layer| Array1::zeros(layer.bias.raw_dim()))
                .collect(),
        }
    }

    pub fn norm(&self) -> f32 {
        let weights: f32 = self.weights.iter().map(|w| w.iter().map(|x| x * x).sum::<f32>()).sum();
        let bias: f32 = self.bias.iter().map(|b| b.iter().map(|x| x * x).sum::<f32>()).sum();
        (weights + bias).sqrt()
    }
}
