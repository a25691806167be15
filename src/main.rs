mod cli;

use burn::{
    config::Config,
    module::Module,
    tensor::{Distribution, Tensor},
};
use clap::Parser;
use log::info;
use segnet::{Mode, SegNetConfig, monte_carlo};

use crate::cli::Args;

#[cfg(feature = "wgpu")]
type AppBackend = burn::backend::Wgpu;
#[cfg(not(feature = "wgpu"))]
type AppBackend = burn::backend::NdArray;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => SegNetConfig::load(path)?,
        None => SegNetConfig::variant(args.in_channels, args.out_channels, args.variant),
    };
    if let Some(path) = &args.save_config {
        config.save(path)?;
        info!("config written to {}", path.display());
    }

    let device = Default::default();
    let model = config.init::<AppBackend>(&device)?;
    println!("{model}");
    println!("parameters: {}", model.num_params());

    let Some(side) = args.probe else {
        return Ok(());
    };
    let images = Tensor::<AppBackend, 4>::random(
        [1, config.in_channels, side, side],
        Distribution::Default,
        &device,
    );

    let t = std::time::Instant::now();
    let output = model.forward(images.clone(), Mode::Eval)?;
    info!("forward {:?} -> {:?} in {:?}", images.dims(), output.dims(), t.elapsed());

    if args.samples > 0 {
        let t = std::time::Instant::now();
        let prediction = monte_carlo(&model, images, args.samples)?;
        info!("{} samples in {:?}", prediction.samples, t.elapsed());
        println!(
            "mean entropy: {:.4}, max variance: {:.6}",
            prediction.entropy.mean().into_scalar(),
            prediction.variance.max().into_scalar()
        );
    }

    Ok(())
}
