use argh::FromArgs;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::PathBuf;

use rigid_3d::{transforms, PointSet, RigidTransform};
use rigid_icp::{IcpConvergenceCriteria, IcpEngine, Termination};

#[derive(FromArgs)]
/// Register a randomly displaced synthetic shape back onto itself with ICP
struct Args {
    /// number of points sampled on the shape
    #[argh(option, default = "500")]
    num_points: usize,

    /// maximum rotation angle per axis in radians
    #[argh(option, default = "std::f64::consts::FRAC_PI_2")]
    max_angle: f64,

    /// maximum translation per axis
    #[argh(option, default = "4.0")]
    max_translation: f64,

    /// seed for the random displacement
    #[argh(option)]
    seed: Option<u64>,

    /// path to a JSON file with the convergence criteria
    #[argh(option)]
    config: Option<PathBuf>,

    /// maximum number of iterations, overrides the config file
    #[argh(option)]
    max_iterations: Option<usize>,

    /// convergence tolerance, overrides the config file
    #[argh(option)]
    tolerance: Option<f64>,
}

/// Apply a random rigid transform, returning the moved set and the transform used.
fn random_transform(
    points: &PointSet,
    max_angle: f64,
    max_translation: f64,
    rng: &mut impl Rng,
) -> Result<(PointSet, RigidTransform), Box<dyn std::error::Error>> {
    let mut angle = || rng.random_range(-max_angle..=max_angle);
    let rotation = transforms::euler_to_rotation_matrix(angle(), angle(), angle());

    let mut offset = || rng.random_range(-max_translation..=max_translation);
    let translation = [offset(), offset(), offset()];

    let transform = RigidTransform::new(rotation, translation);
    Ok((points.transformed(&transform)?, transform))
}

/// Sample points on an ellipsoid with a bump so that the shape has no symmetry.
fn sample_shape(num_points: usize, rng: &mut impl Rng) -> Result<PointSet, Box<dyn std::error::Error>> {
    let points = (0..num_points)
        .map(|_| {
            let theta = rng.random_range(0.0..std::f64::consts::TAU);
            let z: f64 = rng.random_range(-1.0..=1.0);
            let r = (1.0 - z * z).sqrt();
            let bump = 1.0 + 0.4 * (-(theta - 1.0).powi(2) * 4.0).exp() * (z + 1.0);
            [3.0 * r * theta.cos() * bump, 2.0 * r * theta.sin(), 1.2 * z]
        })
        .collect::<Vec<_>>();

    Ok(PointSet::new(points, None)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let mut criteria = match &args.config {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => IcpConvergenceCriteria::default(),
    };
    if let Some(max_iterations) = args.max_iterations {
        criteria.max_iterations = max_iterations;
    }
    if let Some(tolerance) = args.tolerance {
        criteria.tolerance = tolerance;
    }

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let target = sample_shape(args.num_points, &mut rng)?;
    let (source, applied) =
        random_transform(&target, args.max_angle, args.max_translation, &mut rng)?;

    println!("Source: #{} points", source.len());
    println!("Target: #{} points", target.len());
    println!(
        "Applied displacement: angle {:.4} rad, translation {:.4}",
        applied.rotation_angle(),
        applied.translation_norm()
    );

    let mut engine = IcpEngine::new(&source, &target, criteria)?;
    for state in engine.by_ref() {
        let state = state?;
        println!(
            "Iteration {:>3} | mean error {:.6}{}",
            state.iteration,
            state.error,
            if state.converged { " | converged" } else { "" }
        );
    }

    match engine.termination() {
        Some(Termination::Converged) => println!("ICP converged"),
        Some(Termination::MaxIterExhausted) => {
            println!("ICP stopped after {} iterations", engine.iterations())
        }
        other => println!("ICP stopped: {:?}", other),
    }

    // the registration should undo the displacement
    let residual = applied.then(engine.transform());
    println!("Recovered transform: {:?}", engine.transform());
    println!(
        "Residual: angle {:.6} rad, translation {:.6}",
        residual.rotation_angle(),
        residual.translation_norm()
    );

    Ok(())
}
