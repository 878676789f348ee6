pub mod crossover;
pub mod cv;
pub mod data;
pub mod distance;
pub mod error;
pub mod experiment;
pub mod fitness;
pub mod ga;
pub mod gene;
pub mod param;
pub mod population;
pub mod selection;
pub mod utils;

use data::Dataset;
use error::Result;
use experiment::Experiment;
use param::Param;

use log::debug;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

pub use cv::run_two_fold;

/// Load both datasets named in `param` and run the two-fold protocol on them
pub fn run(param: &Param, running: Arc<AtomicBool>) -> Result<Experiment> {
    let dataset_a = load_dataset(&param.data.dataset_a, param)?;
    let dataset_b = load_dataset(&param.data.dataset_b, param)?;

    crate::cinfo!(
        param.general.display_colorful,
        "Prototype search by genetic algorithm ({:?} selection, {:?} crossover)\n-----------------------------------------------------",
        param.ga.selection,
        param.ga.crossover
    );

    run_two_fold(&dataset_a, &dataset_b, param, running)
}

fn load_dataset(path: &str, param: &Param) -> Result<Dataset> {
    let data = Dataset::load(path)?;
    data.check_block_classes(param.data.enforce_block_classes)?;
    debug!("{:?}", data);
    crate::cinfo!(
        param.general.display_colorful,
        "\x1b[2;97m{}: {} rows, {} blocks\x1b[0m",
        data.name,
        data.len(),
        data.block_count()
    );
    Ok(data)
}
