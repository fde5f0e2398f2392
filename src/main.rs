// This binary crate is intentionally minimal.
// All neural network logic lives in the library (src/lib.rs and its modules).
fn main() {
    println!("graphite-nn: a from-scratch feed-forward neural network toolkit in Rust.");
    println!("Use the library crate: tensors, Linear/Activation layers, MSE/MAE/cross-entropy losses.");
}
