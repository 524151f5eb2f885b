//! Train a single affine layer on one sample and watch the loss fall.
//!
//! Run with gate-level tracing:
//!
//! ```text
//! RUST_LOG=trace cargo run --example train_affine
//! ```

use tensorgate_core::{Error, Tensor};
use tensorgate_graph::{affine_pipeline, train, TrainConfig};

fn main() -> Result<(), Error> {
    env_logger::init();

    let mut pipeline = affine_pipeline(&TrainConfig::new(5, 0.1))?;
    let sample = Tensor::vector(vec![2.0, -3.0, 4.0, 5.0, 1.0]);

    let history = train(&mut pipeline, &sample, 10)?;
    for (epoch, loss) in history.iter().enumerate() {
        println!("epoch {epoch}: loss {loss}");
    }
    if let Some(weights) = pipeline.weights() {
        println!("weights: {weights:?}");
    }
    Ok(())
}
