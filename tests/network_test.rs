//! End-to-end forward/backward and persistence tests over a small network.

use graphite_nn::{
    Activation, ActivationFunction, Layer, LayerKind, Linear, Loss, MseLoss, Network, Tensor,
};
use rand::{rngs::StdRng, SeedableRng};

fn two_layer_tanh_network(seed: u64) -> Network {
    let mut rng = StdRng::seed_from_u64(seed);
    Network::new(vec![
        LayerKind::Linear(Linear::new(2, 3, &mut rng)),
        LayerKind::Activation(Activation::new(ActivationFunction::Tanh)),
        LayerKind::Linear(Linear::new(3, 1, &mut rng)),
    ])
}

fn batch_input() -> Tensor {
    Tensor::from_rows(vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ])
    .unwrap()
}

#[test]
fn full_training_step_populates_every_gradient() {
    let mut network = two_layer_tanh_network(1);
    let input = batch_input();

    let predicted = network.forward(&input).unwrap();
    assert_eq!(predicted.shape(), &[4, 1]);

    let target = Tensor::from_rows(vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]]).unwrap();
    let loss_grad = MseLoss.grad(&predicted, &target).unwrap();
    assert_eq!(loss_grad.shape(), &[4, 1]);

    let input_grad = network.backward(&loss_grad).unwrap();
    assert_eq!(input_grad.shape(), &[4, 2]);

    for (index, expected_weight_shape, expected_bias_shape) in
        [(0usize, [2usize, 3usize], [3usize]), (2, [3, 1], [1])]
    {
        let LayerKind::Linear(layer) = &network.layers[index] else {
            panic!("layer {index} should be linear");
        };
        let weight_grad = layer.weight_grad.as_ref().expect("weight grad populated");
        let bias_grad = layer.bias_grad.as_ref().expect("bias grad populated");
        assert_eq!(weight_grad.shape(), expected_weight_shape);
        assert_eq!(bias_grad.shape(), expected_bias_shape);
        assert!(!weight_grad.is_empty());
        assert!(!bias_grad.is_empty());
    }

    // Two Linear layers expose two (parameter, gradient) pairs each; the
    // activation layer exposes none.
    assert_eq!(network.params_and_grads().len(), 4);
}

#[test]
fn loss_decreases_under_plain_gradient_steps() {
    // The network produces gradients; the update rule lives out here.
    let mut network = two_layer_tanh_network(2);
    let input = batch_input();
    let target = Tensor::from_rows(vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]]).unwrap();

    let mut first_loss = None;
    let mut last_loss = 0.0;
    for _ in 0..200 {
        let predicted = network.forward(&input).unwrap();
        last_loss = MseLoss.loss(&predicted, &target).unwrap();
        first_loss.get_or_insert(last_loss);

        let loss_grad = MseLoss.grad(&predicted, &target).unwrap();
        network.backward(&loss_grad).unwrap();
        for (param, grad) in network.params_and_grads() {
            *param = param.sub(&(grad * 0.1)).unwrap();
        }
    }
    assert!(last_loss < first_loss.unwrap());
}

#[test]
fn backward_without_forward_fails_for_a_whole_network() {
    let mut network = two_layer_tanh_network(3);
    let grad = Tensor::from_rows(vec![vec![1.0]]).unwrap();
    assert!(network.backward(&grad).is_err());
}

#[test]
fn save_and_load_round_trip_preserves_behavior() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    let path = path.to_str().unwrap();

    let mut network = two_layer_tanh_network(4);
    let input = batch_input();
    let before = network.forward(&input).unwrap();

    network.save_json(path).unwrap();
    let mut reloaded = Network::load_json(path).unwrap();
    let after = reloaded.forward(&input).unwrap();

    assert_eq!(before.shape(), after.shape());
    for (b, a) in before.data().iter().zip(after.data()) {
        assert!((b - a).abs() < 1e-12);
    }

    // Transient state is not persisted: the reloaded network is idle.
    let grad = Tensor::zeros(&[4, 1]);
    let mut untouched = Network::load_json(path).unwrap();
    assert!(untouched.backward(&grad).is_err());
}
