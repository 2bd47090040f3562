use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::process::exit;
use tracing::error;
use tsplib_reader::checks::tour_check::{
    TourCheckError, check_instance_and_tours, check_instance_only, check_tours,
};
use tsplib_reader::instance::Instance;
use tsplib_reader::weights::EdgeWeightResolver;

/// Reads a TSPLIB instance and optionally evaluates the tours of a tour file on it
#[derive(Parser)]
#[command(version)]
pub struct Arguments {
    /// Instance file (.tsp, .atsp, .hcp, .sop, .vrp, .tour)
    pub instance: PathBuf,

    /// Tour file whose tours are checked and evaluated
    pub tour: Option<PathBuf>,

    /// Do not log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Treat warnings as errors
    #[arg(short, long)]
    pub paranoid: bool,

    /// Print a JSON summary instead of text
    #[arg(short, long)]
    pub json: bool,

    /// Include content digests of the instance and the tours
    #[cfg(feature = "with_digest")]
    #[arg(short, long)]
    pub digest: bool,
}

fn read(args: &Arguments) -> Result<(Instance, Vec<Vec<usize>>, Vec<i64>), TourCheckError> {
    if let Some(tour_path) = args.tour.as_ref() {
        return check_instance_and_tours(&args.instance, tour_path, args.paranoid);
    }

    let instance = check_instance_only(&args.instance, args.paranoid)?;
    let tours = instance.tours().to_vec();

    // tours of a plain tour file cannot be evaluated without an instance
    let values = if !tours.is_empty() && EdgeWeightResolver::new(&instance).is_ok() {
        check_tours(&instance, &tours)?
    } else {
        Vec::new()
    };

    Ok((instance, tours, values))
}

fn keyword(value: Option<impl ToString>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

fn report(args: &Arguments) -> Result<(), TourCheckError> {
    let (instance, tours, values) = read(args)?;

    #[cfg(feature = "with_digest")]
    let digests = args.digest.then(|| {
        use tsplib_reader::digest::{digest_instance, digest_tour};
        let symmetric = !instance.problem_type().is_some_and(|t| t.is_asymmetric());
        (
            digest_instance(&instance),
            tours
                .iter()
                .map(|t| digest_tour(t, symmetric))
                .collect::<Vec<_>>(),
        )
    });

    if args.json {
        #[allow(unused_mut)]
        let mut summary = json!({
            "name": instance.name(),
            "type": instance.problem_type().map(|t| t.as_str()),
            "dimension": instance.dimension(),
            "edge_weight_type": instance.edge_weight_type().map(|t| t.as_str()),
            "edge_weight_format": instance.edge_weight_format().map(|f| f.as_str()),
            "tours": tours.len(),
            "tour_values": values,
        });

        #[cfg(feature = "with_digest")]
        if let Some((instance_digest, tour_digests)) = &digests {
            summary["instance_digest"] = json!(instance_digest);
            summary["tour_digests"] = json!(tour_digests);
        }

        println!("{summary}");
        return Ok(());
    }

    println!("Name: {}", instance.name().unwrap_or("-"));
    println!("Type: {}", keyword(instance.problem_type()));
    println!("Dimension: {}", instance.dimension());
    println!("Edge weight type: {}", keyword(instance.edge_weight_type()));
    println!("Edge weight format: {}", keyword(instance.edge_weight_format()));
    println!("Tours: {}", tours.len());
    for (i, value) in values.iter().enumerate() {
        println!("Tour {} value: {value}", i + 1);
    }

    #[cfg(feature = "with_digest")]
    if let Some((instance_digest, tour_digests)) = &digests {
        println!("Instance digest: {instance_digest}");
        for (i, digest) in tour_digests.iter().enumerate() {
            println!("Tour {} digest: {digest}", i + 1);
        }
    }

    Ok(())
}

fn main() {
    let args = Arguments::parse();

    if !args.quiet {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_max_level(tracing::Level::INFO)
            .without_time()
            .init();
    }

    if let Err(e) = report(&args) {
        error!("{e}");
        exit(1)
    }
}
