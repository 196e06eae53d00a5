use log::info;
use ndarray::Array4;
use rand::{SeedableRng, rngs::StdRng};
use restoration_models::models::ModelSpec;

fn main() -> restoration_models::Result<()> {
    env_logger::init();

    let specs = [
        ModelSpec::Fsrcnn {
            input_shape: (16, 16, 1),
            upscale: 3,
        },
        ModelSpec::Ircnn {
            input_shape: (16, 16, 3),
        },
    ];

    let mut rng = StdRng::seed_from_u64(7);
    for spec in &specs {
        info!("building {spec:?}");
        let model = spec.build()?;
        let params = model.init_params(&mut rng)?;

        let (h, w, c) = spec.input_shape();
        let x = Array4::zeros((1, h, w, c));
        let y = model.forward(&params, x.view())?;

        println!(
            "{spec:?}: {} layers, {} parameters, output {:?}",
            model.layers().len(),
            params.len(),
            y.dim()
        );
    }

    Ok(())
}
