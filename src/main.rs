// A small example showing how the presentation layer drives the
// pipeline: train once at startup, then classify raw text inputs.
use petal::pipeline;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    petal::logging::init();

    let pipeline = pipeline::train()?;
    println!(
        "trained from {:?}; species: {:?}",
        pipeline.dataset_source(),
        pipeline.species()
    );

    let measurements = [
        ["5.1", "3.5", "1.4", "0.2"],
        ["6.2", "2.9", "4.3", "1.3"],
        ["7.7", "3.8", "6.7", "2.2"],
        ["abc", "3.5", "1.4", "0.2"],
    ];
    for raw in measurements {
        match pipeline.predict_species(raw) {
            Ok(species) => println!("{raw:?} -> {species}"),
            Err(err) => println!("{raw:?} -> {err}"),
        }
    }
    Ok(())
}
